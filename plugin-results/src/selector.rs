// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deciding which files in a results directory get processed.

use crate::plugin::DEFAULT_ERROR_FILE;
use camino::Utf8Path;
use std::fs::FileType;

/// The extension passed to [`FileSelector::file_or_extension`] to match every file.
pub const ANY_EXTENSION: &str = "*";

/// A predicate over files visited while walking a directory.
///
/// Directories never match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSelector {
    /// Matches files whose base name is in `files`, or, if `files` is empty, whose base name is
    /// `default_file`.
    NameOrDefault {
        /// Explicitly requested file names.
        files: Vec<String>,

        /// The file name to match if no names were requested.
        default_file: String,
    },

    /// Matches files whose base name is in `files`, or, if `files` is empty, whose path ends with
    /// `extension`. An extension of [`ANY_EXTENSION`] matches every file.
    NameOrExtension {
        /// Explicitly requested file names.
        files: Vec<String>,

        /// The suffix to match if no names were requested.
        extension: String,
    },
}

impl FileSelector {
    /// Selects the given files, or `default_file` if none are given.
    pub fn file_or_default(
        files: impl IntoIterator<Item = impl Into<String>>,
        default_file: impl Into<String>,
    ) -> Self {
        Self::NameOrDefault {
            files: files.into_iter().map(Into::into).collect(),
            default_file: default_file.into(),
        }
    }

    /// Selects the given files, or every file ending with `extension` if none are given.
    pub fn file_or_extension(
        files: impl IntoIterator<Item = impl Into<String>>,
        extension: impl Into<String>,
    ) -> Self {
        Self::NameOrExtension {
            files: files.into_iter().map(Into::into).collect(),
            extension: extension.into(),
        }
    }

    /// Selects the given files, or every file if none are given.
    pub fn file_or_any(files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::file_or_extension(files, ANY_EXTENSION)
    }

    /// Selects the error reports written into a plugin's errors directory.
    pub fn error_files() -> Self {
        Self::file_or_extension([DEFAULT_ERROR_FILE], "")
    }

    /// Returns true if the file at `path` should be processed.
    pub fn matches(&self, path: &Utf8Path, file_type: FileType) -> bool {
        if file_type.is_dir() {
            return false;
        }

        let file_name = path.file_name().unwrap_or_default();
        match self {
            Self::NameOrDefault {
                files,
                default_file,
            } => {
                if files.is_empty() {
                    file_name == default_file
                } else {
                    files.iter().any(|f| f == file_name)
                }
            }
            Self::NameOrExtension { files, extension } => {
                if files.is_empty() {
                    // A plain suffix match on the path, not an extension comparison.
                    extension == ANY_EXTENSION || path.as_str().ends_with(extension.as_str())
                } else {
                    files.iter().any(|f| f == file_name)
                }
            }
        }
    }
}
