// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ResultsExitCode,
    output::{NO_HEADING_TARGET, StderrStyles},
};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use plugin_results::errors::{
    ConfigParseError, ProcessDirError, ReadResultsError, WriteResultsError,
};
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error that causes plugin-results to exit with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("error discovering plugins")]
    DiscoverPluginsError {
        results_dir: Utf8PathBuf,
        #[source]
        err: ProcessDirError,
    },
    #[error("error writing results")]
    WriteResultsError {
        #[from]
        err: WriteResultsError,
    },
    #[error("error reading results")]
    ReadResultsError {
        #[from]
        err: ReadResultsError,
    },
    #[error("node not found")]
    NodeNotFound { plugin: String, node: String },
    #[error("error serializing output")]
    SerializeJsonError {
        #[source]
        err: serde_json::Error,
    },
    #[error("error serializing output")]
    SerializeYamlError {
        #[source]
        err: serde_yaml::Error,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::DiscoverPluginsError { .. } => {
                ResultsExitCode::SETUP_ERROR
            }
            Self::WriteResultsError { .. } => ResultsExitCode::WRITE_RESULTS_FAILED,
            Self::ReadResultsError { .. } => ResultsExitCode::READ_RESULTS_FAILED,
            Self::NodeNotFound { .. } => ResultsExitCode::NODE_NOT_FOUND,
            Self::SerializeJsonError { .. }
            | Self::SerializeYamlError { .. }
            | Self::WriteOutputError { .. } => ResultsExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::DiscoverPluginsError { results_dir, err } => {
                error!(
                    "failed to list plugins under `{}`",
                    results_dir.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::WriteResultsError { err } => {
                error!("failed to write results");
                Some(err as &dyn Error)
            }
            Self::ReadResultsError { err } => {
                error!("failed to read results (has `postprocess` been run?)");
                Some(err as &dyn Error)
            }
            Self::NodeNotFound { plugin, node } => {
                error!(
                    "node `{}` not found in results for plugin `{}`",
                    node.style(styles.bold),
                    plugin.style(styles.bold),
                );
                None
            }
            Self::SerializeJsonError { err } => {
                error!("failed to serialize output as JSON");
                Some(err as &dyn Error)
            }
            Self::SerializeYamlError { err } => {
                error!("failed to serialize output as YAML");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
