// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-file processors.
//!
//! A processor turns one result file into an [`Item`]. Processors are plain functions of the
//! plugin directory (used to compute relative paths for metadata) and the file being processed.
//! They always return a best-effort item, even if the file could not be read or parsed.

mod error_report;
mod junit;
mod manual;
mod raw;

pub use error_report::process_error_file;
pub use junit::process_junit_file;
pub use manual::process_manual_file;
pub use raw::process_raw_file;

use crate::{errors::ProcessFileError, item::Item};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::error;

/// The signature shared by all file processors.
pub type FileProcessor = fn(&Utf8Path, &Utf8Path) -> ProcessedFile;

/// The output of a file processor.
#[derive(Debug)]
#[must_use]
pub struct ProcessedFile {
    /// The item produced for the file. Populated as far as possible even if `error` is set.
    pub item: Item,

    /// The error encountered while processing the file, if any.
    pub error: Option<ProcessFileError>,
}

impl ProcessedFile {
    /// Creates a new `ProcessedFile` for a file that was processed without errors.
    pub fn ok(item: Item) -> Self {
        Self { item, error: None }
    }

    /// Creates a new `ProcessedFile` for a file that was only partially processed.
    pub fn partial(item: Item, error: ProcessFileError) -> Self {
        Self {
            item,
            error: Some(error),
        }
    }
}

/// Returns `file` relative to `plugin_dir`, or `file` itself if no relative path exists.
pub(crate) fn relative_path(plugin_dir: &Utf8Path, file: &Utf8Path) -> Utf8PathBuf {
    match pathdiff::diff_utf8_paths(file, plugin_dir) {
        Some(rel_path) => rel_path,
        None => {
            error!("error making path `{file}` relative to `{plugin_dir}`");
            file.to_owned()
        }
    }
}

/// Returns the base name of `file`, for use as an item name.
pub(crate) fn base_name(file: &Utf8Path) -> String {
    file.file_name().unwrap_or(file.as_str()).to_owned()
}
