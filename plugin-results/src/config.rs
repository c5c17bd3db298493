// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for post-processing.
//!
//! The configuration describes the format and driver of each plugin. It is read from
//! `.config/plugin-results.toml` under the results directory, layered on top of a default config
//! embedded in this crate.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind, ProcessDirError},
    plugin::{PLUGINS_DIR, PluginDriver, PluginSpec, ResultFormat},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{
    Config, ConfigBuilder, ConfigError, File, FileFormat, FileSourceFile, builder::DefaultState,
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    io,
};
use tracing::{debug, warn};

/// Handles warnings produced while reading configuration.
///
/// The default implementation, [`DefaultConfigWarnings`], logs them. Tests can collect them
/// instead.
pub trait ConfigWarnings {
    /// Called when a config file contains keys that aren't recognized.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        results_dir: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Logs configuration warnings using `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        results_dir: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push_str("\n  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file
                .strip_prefix(results_dir)
                .unwrap_or(config_file),
        );
    }
}

/// Plugin configuration for a results directory.
#[derive(Clone, Debug)]
pub struct ResultsConfig {
    results_dir: Utf8PathBuf,
    plugins: BTreeMap<String, PluginSpec>,
}

impl ResultsConfig {
    /// The default location of the config within the results directory.
    pub const CONFIG_PATH: &'static str = ".config/plugin-results.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config for `results_dir`.
    ///
    /// If `config_file` is `None`, [`Self::CONFIG_PATH`] under `results_dir` is read if it exists.
    /// If `config_file` is specified, it must exist.
    pub fn from_sources(
        results_dir: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let results_dir = results_dir.into();

        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = results_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let plugins = Self::read_from_source(&results_dir, &config_file, source, warnings)?;
        Ok(Self {
            results_dir,
            plugins,
        })
    }

    /// Returns the config that only contains the defaults, for `results_dir`.
    pub fn default_config(results_dir: impl Into<Utf8PathBuf>) -> Self {
        let results_dir = results_dir.into();
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .unwrap_or_else(|error| {
                warn!("default config is invalid, ignoring it: {error}");
                (ResultsConfigDeserialize::default(), BTreeSet::new())
            });
        let plugins = config
            .plugins
            .into_iter()
            .map(|(name, plugin)| (name.clone(), plugin.into_spec(name)))
            .collect();
        Self {
            results_dir,
            plugins,
        }
    }

    /// Returns the results directory this config applies to.
    pub fn results_dir(&self) -> &Utf8Path {
        &self.results_dir
    }

    /// Returns the configured plugin with this name, if any.
    pub fn configured_plugin(&self, name: &str) -> Option<&PluginSpec> {
        self.plugins.get(name)
    }

    /// Returns the description for a plugin, falling back to the defaults (raw results, run as a
    /// job) if the plugin isn't configured.
    pub fn plugin(&self, name: &str) -> PluginSpec {
        match self.configured_plugin(name) {
            Some(spec) => spec.clone(),
            None => {
                debug!("plugin {name} is not configured, using defaults");
                PluginSpec::new(name, ResultFormat::default(), PluginDriver::default())
            }
        }
    }

    /// Lists the plugins that have a directory under the results directory, sorted by name.
    ///
    /// Returns an empty list if there is no plugins directory.
    pub fn discover_plugins(&self) -> Result<Vec<PluginSpec>, ProcessDirError> {
        let plugins_dir = self.results_dir.join(PLUGINS_DIR);
        let read_dir_error = |error: io::Error| ProcessDirError::ReadDir {
            dir: plugins_dir.clone(),
            error,
        };

        let entries = match plugins_dir.read_dir_utf8() {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(read_dir_error(error)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(read_dir_error)?;
            if entry.file_type().map_err(read_dir_error)?.is_dir() {
                names.push(entry.file_name().to_owned());
            }
        }
        names.sort_unstable();

        Ok(names.iter().map(|name| self.plugin(name)).collect())
    }

    // ---
    // Helper methods
    // ---

    fn read_from_source(
        results_dir: &Utf8Path,
        config_file: &Utf8Path,
        source: File<FileSourceFile, FileFormat>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<BTreeMap<String, PluginSpec>, ConfigParseError> {
        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(config_file, results_dir, &unknown);
        }

        let mut plugins = BTreeMap::new();
        for (name, plugin) in config.plugins {
            if name.is_empty() {
                return Err(ConfigParseError::new(
                    config_file,
                    ConfigParseErrorKind::EmptyPluginName,
                ));
            }
            plugins.insert(name.clone(), plugin.into_spec(name));
        }

        Ok(plugins)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ResultsConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: ResultsConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already tracks the key, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ResultsConfigDeserialize {
    #[serde(default)]
    plugins: BTreeMap<String, PluginConfigDeserialize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PluginConfigDeserialize {
    #[serde(default)]
    result_format: ResultFormat,
    #[serde(default)]
    result_files: Vec<String>,
    #[serde(default)]
    driver: PluginDriver,
}

impl PluginConfigDeserialize {
    fn into_spec(self, name: String) -> PluginSpec {
        PluginSpec::new(name, self.result_format, self.driver).with_result_files(self.result_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginDescriptor;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestConfigWarnings {
        unknown: Vec<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl ConfigWarnings for TestConfigWarnings {
        fn unknown_config_keys(
            &mut self,
            config_file: &Utf8Path,
            _results_dir: &Utf8Path,
            unknown: &BTreeSet<String>,
        ) {
            self.unknown.push((config_file.to_owned(), unknown.clone()));
        }
    }

    fn results_dir_with_config(contents: &str) -> Utf8TempDir {
        let dir = camino_tempfile::tempdir().unwrap();
        let config_path = dir.path().join(ResultsConfig::CONFIG_PATH);
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(config_path, contents).unwrap();
        dir
    }

    #[test]
    fn default_config_is_valid() {
        let dir = camino_tempfile::tempdir().unwrap();
        let mut warnings = TestConfigWarnings::default();
        let config = ResultsConfig::from_sources(dir.path(), None, &mut warnings)
            .expect("default config is valid");
        assert!(warnings.unknown.is_empty());

        let e2e = config.configured_plugin("e2e").expect("e2e is configured");
        assert_eq!(e2e.result_format(), &ResultFormat::E2e);
        assert!(!e2e.is_multi_node());
        let logs = config
            .configured_plugin("systemd-logs")
            .expect("systemd-logs is configured");
        assert!(logs.is_multi_node());

        let defaults = ResultsConfig::default_config(dir.path());
        for name in ["e2e", "systemd-logs"] {
            assert_eq!(defaults.configured_plugin(name), config.configured_plugin(name));
        }
    }

    #[test]
    fn plugins_are_read_and_merged() {
        let dir = results_dir_with_config(indoc! {r#"
            [plugins.e2e]
            result-files = ["junit_01.xml"]

            [plugins.node-checks]
            result-format = "manual"
            driver = "daemonset"

            [plugins.custom]
            result-format = "tap"
        "#});
        let mut warnings = TestConfigWarnings::default();
        let config = ResultsConfig::from_sources(dir.path(), None, &mut warnings).unwrap();
        assert!(warnings.unknown.is_empty());

        let e2e = config.plugin("e2e");
        assert_eq!(e2e.result_format(), &ResultFormat::E2e, "merged with default");
        assert_eq!(e2e.result_files(), ["junit_01.xml".to_owned()]);

        let checks = config.plugin("node-checks");
        assert_eq!(checks.result_format(), &ResultFormat::Manual);
        assert_eq!(checks.driver(), PluginDriver::DaemonSet);

        let custom = config.plugin("custom");
        assert_eq!(custom.result_format(), &ResultFormat::Other("tap".to_owned()));
        assert_eq!(custom.driver(), PluginDriver::Job);

        let unconfigured = config.plugin("unconfigured");
        assert_eq!(unconfigured.result_format(), &ResultFormat::Raw);
        assert!(!unconfigured.is_multi_node());
    }

    #[test]
    fn unknown_keys_are_reported() {
        let dir = results_dir_with_config(indoc! {r#"
            [plugins.e2e]
            result-format = "junit"
            timeout = 30
        "#});
        let mut warnings = TestConfigWarnings::default();
        ResultsConfig::from_sources(dir.path(), None, &mut warnings).unwrap();

        assert_eq!(warnings.unknown.len(), 1);
        let (config_file, unknown) = &warnings.unknown[0];
        assert_eq!(config_file, &dir.path().join(ResultsConfig::CONFIG_PATH));
        assert_eq!(
            unknown,
            &maplit::btreeset! {"plugins.e2e.timeout".to_owned()}
        );
    }

    #[test]
    fn invalid_driver_is_an_error() {
        let dir = results_dir_with_config(indoc! {r#"
            [plugins.e2e]
            driver = "cronjob"
        "#});
        let error = ResultsConfig::from_sources(dir.path(), None, &mut DefaultConfigWarnings)
            .unwrap_err();

        assert_eq!(
            error.config_file(),
            &dir.path().join(ResultsConfig::CONFIG_PATH)
        );
        match error.kind() {
            ConfigParseErrorKind::DeserializeError(error) => {
                assert_eq!(error.path().to_string(), "plugins.e2e.driver");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn explicit_config_file_is_required() {
        let dir = camino_tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let error = ResultsConfig::from_sources(dir.path(), Some(&missing), &mut DefaultConfigWarnings)
            .unwrap_err();

        assert_eq!(error.config_file(), &missing);
        assert!(matches!(
            error.kind(),
            ConfigParseErrorKind::BuildError(_)
        ));
    }

    #[test]
    fn discover_plugins() {
        let dir = camino_tempfile::tempdir().unwrap();
        for plugin in ["systemd-logs", "e2e", "my-plugin"] {
            std::fs::create_dir_all(dir.path().join("plugins").join(plugin)).unwrap();
        }
        std::fs::write(dir.path().join("plugins/stray-file"), "").unwrap();

        let config = ResultsConfig::default_config(dir.path());
        let plugins = config.discover_plugins().unwrap();

        let names: Vec<_> = plugins.iter().map(|plugin| plugin.name()).collect();
        assert_eq!(names, vec!["e2e", "my-plugin", "systemd-logs"]);
        assert_eq!(plugins[0].result_format(), &ResultFormat::E2e);
        assert_eq!(plugins[1].result_format(), &ResultFormat::Raw);
        assert!(plugins[2].is_multi_node());
    }

    #[test]
    fn discover_plugins_without_plugins_dir() {
        let dir = camino_tempfile::tempdir().unwrap();
        let config = ResultsConfig::default_config(dir.path());
        assert!(config.discover_plugins().unwrap().is_empty());
    }
}
