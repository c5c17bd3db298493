// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by plugin-results.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::io;
use thiserror::Error;

pub use display_error_chain::DisplayErrorChain;

/// An error that occurred while processing a single result file.
///
/// File processors always produce a best-effort [`Item`](crate::Item) alongside this error, so
/// these errors are logged rather than propagated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessFileError {
    /// The file could not be opened or read.
    #[error("opening file `{path}`")]
    Open {
        /// The file that was being processed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The file did not contain a JSON object.
    #[error("decoding file `{path}`")]
    Json {
        /// The file that was being processed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The file did not contain a valid result document.
    #[error("decoding file `{path}`")]
    Yaml {
        /// The file that was being processed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_yaml::Error,
    },

    /// The file was not a well-formed JUnit report.
    #[error("parsing JUnit report `{path}`")]
    Junit {
        /// The file that was being processed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },
}

/// An error that occurred while listing or walking a results or errors directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessDirError {
    /// The node subdirectories of a location could not be listed.
    #[error("reading directory `{dir}`")]
    ReadDir {
        /// The directory being listed.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The root of a walk could not be read.
    #[error("walking directory `{dir}`")]
    Walk {
        /// The directory being walked.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: walkdir::Error,
    },
}

impl ProcessDirError {
    /// Returns true if this error indicates that the directory does not exist.
    pub fn is_not_found(&self) -> bool {
        let io_error = match self {
            Self::ReadDir { error, .. } => Some(error),
            Self::Walk { error, .. } => error.io_error(),
        };
        io_error.is_some_and(|error| error.kind() == io::ErrorKind::NotFound)
    }
}

/// An error returned by [`post_process_plugin`](crate::post_process_plugin), with the plugin and
/// directory that were being processed.
#[derive(Debug, Error)]
#[error("processing plugin `{plugin}`, directory `{dir}`")]
pub struct PostProcessError {
    plugin: String,
    dir: Utf8PathBuf,
    #[source]
    error: ProcessDirError,
}

impl PostProcessError {
    pub(crate) fn new(
        plugin: impl Into<String>,
        dir: impl Into<Utf8PathBuf>,
        error: ProcessDirError,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            dir: dir.into(),
            error,
        }
    }
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse plugin-results config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing the config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// A plugin was configured with an empty name.
    #[error("plugin names must not be empty")]
    EmptyPluginName,
}

/// An error that occurred while writing a post-processed results file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteResultsError {
    /// The tree could not be serialized.
    #[error("serializing results for plugin `{plugin}`")]
    Serialize {
        /// The plugin whose results were being written.
        plugin: String,

        /// The underlying error.
        #[source]
        error: serde_yaml::Error,
    },

    /// The directory for the results file could not be created.
    #[error("creating directory `{path}`")]
    CreateDir {
        /// The directory being created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The results file could not be written.
    #[error("writing results file `{path}`")]
    Write {
        /// The file being written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<io::Error>,
    },
}

/// An error that occurred while reading a post-processed results file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadResultsError {
    /// The results file could not be read.
    #[error("reading results file `{path}`")]
    Read {
        /// The file being read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The results file was not a valid result document.
    #[error("decoding results file `{path}`")]
    Decode {
        /// The file being read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_yaml::Error,
    },
}
