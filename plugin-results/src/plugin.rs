// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Describing the plugins whose output is post-processed.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// The directory, under the results root, containing one directory per plugin.
pub const PLUGINS_DIR: &str = "plugins";

/// The directory, under a plugin directory, containing the plugin's own output.
pub const RESULTS_DIR: &str = "results";

/// The directory, under a plugin directory, containing error reports captured while the plugin
/// ran.
pub const ERRORS_DIR: &str = "errors";

/// The file name used for captured error reports.
pub const DEFAULT_ERROR_FILE: &str = "error.json";

/// The file name of a finished result document.
///
/// Plugins using the [`ResultFormat::Manual`] format write this file themselves; post-processing
/// writes it for every other plugin.
pub const POST_PROCESSED_RESULTS_FILE: &str = "sonobuoy_results.yaml";

/// The declared format of a plugin's results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResultFormat {
    /// JUnit XML reports.
    Junit,

    /// Kubernetes end-to-end results, which are JUnit XML reports.
    E2e,

    /// Arbitrary files; each file becomes one leaf.
    #[default]
    Raw,

    /// A finished result document supplied by the plugin.
    Manual,

    /// A format this crate does not recognize. Processed like [`ResultFormat::Raw`].
    Other(String),
}

impl ResultFormat {
    /// Parses a result format. Unrecognized names produce [`ResultFormat::Other`].
    pub fn new(name: &str) -> Self {
        match name {
            "junit" => Self::Junit,
            "e2e" => Self::E2e,
            "raw" => Self::Raw,
            "manual" => Self::Manual,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the name of this format.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Junit => "junit",
            Self::E2e => "e2e",
            Self::Raw => "raw",
            Self::Manual => "manual",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResultFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

/// How a plugin is run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginDriver {
    /// The plugin runs once; its results are directly under the results directory.
    #[default]
    #[serde(alias = "Job")]
    Job,

    /// The plugin runs once per cluster node; its results are in one subdirectory per node.
    #[serde(alias = "DaemonSet")]
    DaemonSet,
}

/// The information post-processing needs about a plugin.
pub trait PluginDescriptor {
    /// The name of the plugin, which is also the name of its directory.
    fn name(&self) -> &str;

    /// The declared format of the plugin's results.
    fn result_format(&self) -> &ResultFormat;

    /// The result files the plugin asked to be processed. If empty, a format-specific default is
    /// used.
    fn result_files(&self) -> &[String];

    /// Returns true if the plugin's results are replicated per node.
    fn is_multi_node(&self) -> bool;

    /// Returns the directory holding this plugin's output under the given results root.
    fn plugin_dir(&self, base_dir: &Utf8Path) -> Utf8PathBuf {
        base_dir.join(PLUGINS_DIR).join(self.name())
    }
}

/// A plugin description, usually read from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginSpec {
    name: String,
    result_format: ResultFormat,
    result_files: Vec<String>,
    driver: PluginDriver,
}

impl PluginSpec {
    /// Creates a new plugin description with no explicit result files.
    pub fn new(name: impl Into<String>, result_format: ResultFormat, driver: PluginDriver) -> Self {
        Self {
            name: name.into(),
            result_format,
            result_files: Vec::new(),
            driver,
        }
    }

    /// Sets the result files to process.
    pub fn with_result_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.result_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the driver for this plugin.
    pub fn driver(&self) -> PluginDriver {
        self.driver
    }
}

impl PluginDescriptor for PluginSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn result_format(&self) -> &ResultFormat {
        &self.result_format
    }

    fn result_files(&self) -> &[String] {
        &self.result_files
    }

    fn is_multi_node(&self) -> bool {
        self.driver == PluginDriver::DaemonSet
    }
}
