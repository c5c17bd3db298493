// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, ResultsExitCode,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter, StdoutStyles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use plugin_results::{
    Item, Status,
    config::{DefaultConfigWarnings, ResultsConfig},
    errors::DisplayErrorChain,
    plugin::{PluginDescriptor, PluginSpec},
    post_process_plugin,
    store::{read_results, write_results},
    summary::{Summary, detailed_leaves},
};
use std::io::Write;
use tracing::{debug, info, warn};

/// Post-process the output of diagnostic plugins into result trees, and inspect them.
#[derive(Debug, Parser)]
#[command(version, name = "plugin-results", styles = crate::output::clap_styles::style())]
pub struct PluginResultsApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl PluginResultsApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Postprocess(opts) => opts.exec(output, output_writer),
            Command::Show(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the result tree for each plugin and write it to the plugin's results file
    ///
    /// Plugins are described by `.config/plugin-results.toml` in the results directory. Plugins
    /// found on disk that aren't configured are processed as raw results.
    Postprocess(PostprocessOpts),

    /// Print a previously post-processed result tree
    Show(ShowOpts),
}

#[derive(Debug, Args)]
struct PostprocessOpts {
    /// The results directory, containing a `plugins` directory
    #[arg(long, value_name = "DIR")]
    dir: Utf8PathBuf,

    /// Config file [default: <DIR>/.config/plugin-results.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Only process these plugins (can be specified multiple times)
    #[arg(long = "plugin", value_name = "NAME")]
    plugins: Vec<String>,

    /// Don't write results files, only print summaries
    #[arg(long)]
    no_write: bool,
}

impl PostprocessOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = ResultsConfig::from_sources(
            &self.dir,
            self.config_file.as_deref(),
            &mut DefaultConfigWarnings,
        )?;

        let plugins: Vec<PluginSpec> = if self.plugins.is_empty() {
            config
                .discover_plugins()
                .map_err(|err| ExpectedError::DiscoverPluginsError {
                    results_dir: config.results_dir().to_owned(),
                    err,
                })?
        } else {
            self.plugins.iter().map(|name| config.plugin(name)).collect()
        };

        if plugins.is_empty() {
            info!("no plugins found under `{}`", self.dir);
            return Ok(ResultsExitCode::OK);
        }

        let styles = output.stdout_styles();
        let mut writer = output_writer.stdout_writer();
        let mut any_errors = false;

        for plugin in &plugins {
            let results = post_process_plugin(plugin, &self.dir);
            for error in &results.errors {
                warn!("{}", DisplayErrorChain::new(error));
            }
            any_errors |= !results.is_complete();

            if self.no_write {
                debug!("not writing results for plugin {}", plugin.name());
            } else {
                let path = write_results(&self.dir, &results.item)?;
                debug!("results for plugin {} written to `{path}`", plugin.name());
            }

            write_summary_line(&results.item, &styles, &mut writer)?;
        }

        writer.flush().map_err(ExpectedError::write_output_error)?;

        if any_errors {
            warn!("some directories could not be processed, results may be incomplete");
            Ok(ResultsExitCode::PROCESSING_ERRORS)
        } else {
            Ok(ResultsExitCode::OK)
        }
    }
}

fn write_summary_line(item: &Item, styles: &StdoutStyles, writer: &mut impl Write) -> Result<()> {
    let summary = Summary::new(item);
    let status_style = match &summary.status {
        Status::Passed => styles.pass,
        status if status.is_failure() => styles.fail,
        _ => styles.other,
    };
    writeln!(
        writer,
        "{}: {} ({} total, {} passed, {} failed)",
        summary.name.style(styles.name),
        summary.status.style(status_style),
        summary.total,
        summary.count(&Status::Passed),
        summary.failures.len(),
    )
    .map_err(ExpectedError::write_output_error)
}

#[derive(Debug, Args)]
struct ShowOpts {
    /// The results directory, containing a `plugins` directory
    #[arg(long, value_name = "DIR")]
    dir: Utf8PathBuf,

    /// The plugin to show
    #[arg(long, value_name = "NAME")]
    plugin: String,

    /// What to print
    #[arg(long, value_enum, default_value_t)]
    mode: ShowMode,

    /// Only show the subtree with this name, typically a node
    #[arg(long, value_name = "NAME")]
    node: Option<String>,

    /// Output format for `--mode dump`
    #[arg(long, value_enum, default_value_t)]
    format: DumpFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ShowMode {
    /// Counts of statuses and a list of failures
    #[default]
    Report,

    /// One JSON object per leaf, with the names of its ancestors
    Detailed,

    /// The full tree
    Dump,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    #[default]
    Yaml,
    Json,
}

impl ShowOpts {
    fn exec(self, _output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let tree = read_results(&self.dir, &self.plugin)?;
        let item = self.select_subtree(&tree)?;

        let mut writer = output_writer.stdout_writer();
        match self.mode {
            ShowMode::Report => {
                write!(writer, "{}", Summary::new(item))
                    .map_err(ExpectedError::write_output_error)?;
            }
            ShowMode::Detailed => {
                for leaf in detailed_leaves(item) {
                    serde_json::to_writer(&mut writer, &leaf)
                        .map_err(|err| ExpectedError::SerializeJsonError { err })?;
                    writeln!(writer).map_err(ExpectedError::write_output_error)?;
                }
            }
            ShowMode::Dump => match self.format {
                DumpFormat::Yaml => {
                    serde_yaml::to_writer(&mut writer, item)
                        .map_err(|err| ExpectedError::SerializeYamlError { err })?;
                }
                DumpFormat::Json => {
                    serde_json::to_writer_pretty(&mut writer, item)
                        .map_err(|err| ExpectedError::SerializeJsonError { err })?;
                    writeln!(writer).map_err(ExpectedError::write_output_error)?;
                }
            },
        }

        writer.flush().map_err(ExpectedError::write_output_error)?;
        Ok(ResultsExitCode::OK)
    }

    fn select_subtree<'a>(&self, tree: &'a Item) -> Result<&'a Item> {
        let Some(node) = &self.node else {
            return Ok(tree);
        };
        tree.get_subtree_by_name(node)
            .ok_or_else(|| ExpectedError::NodeNotFound {
                plugin: self.plugin.clone(),
                node: node.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use clap::CommandFactory;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static REPORT: &str = indoc! {r#"
        <testsuite name="conformance">
          <testcase name="passes"/>
          <testcase name="fails"><failure message="boom"/></testcase>
        </testsuite>
    "#};

    fn write(dir: &Utf8TempDir, rel: &str, contents: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn run(args: &[&str]) -> (Result<i32>, String) {
        let app = PluginResultsApp::try_parse_from(
            std::iter::once("plugin-results").chain(args.iter().copied()),
        )
        .unwrap();
        let output = OutputContext {
            color: Color::Never,
        };
        let mut writer = OutputWriter::Test { stdout: Vec::new() };
        let result = app.exec(output, &mut writer);
        let OutputWriter::Test { stdout } = writer else {
            panic!("writer is a test writer");
        };
        (result, String::from_utf8(stdout).unwrap())
    }

    #[test]
    fn verify_app() {
        PluginResultsApp::command().debug_assert();
    }

    #[test]
    fn postprocess_then_show() {
        let dir = camino_tempfile::tempdir().unwrap();
        write(&dir, "plugins/e2e/results/junit_01.xml", REPORT);
        write(&dir, "plugins/logs/results/node.log", "log line");

        let (result, stdout) = run(&["postprocess", "--dir", dir.path().as_str()]);
        assert_eq!(result.unwrap(), ResultsExitCode::OK);
        assert_eq!(
            stdout,
            "e2e: failed (2 total, 1 passed, 1 failed)\n\
             logs: unknown (1 total, 0 passed, 0 failed)\n"
        );
        assert!(dir.path().join("plugins/e2e/sonobuoy_results.yaml").is_file());

        let (result, stdout) = run(&["show", "--dir", dir.path().as_str(), "--plugin", "e2e"]);
        assert_eq!(result.unwrap(), ResultsExitCode::OK);
        assert_eq!(
            stdout,
            indoc! {"
                Plugin: e2e
                Status: failed
                Total: 2
                Passed: 1
                Failed: 1
                Skipped: 0

                Failed tests:
                  fails
                    boom
            "}
        );

        let (result, stdout) = run(&[
            "show",
            "--dir",
            dir.path().as_str(),
            "--plugin",
            "e2e",
            "--mode",
            "detailed",
            "--node",
            "conformance",
        ]);
        assert_eq!(result.unwrap(), ResultsExitCode::OK);
        let lines: Vec<serde_json::Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["name"], "fails");
        assert_eq!(lines[1]["status"], "failed");
        assert_eq!(lines[1]["path"], serde_json::json!(["conformance"]));
    }

    #[test]
    fn postprocess_without_writing() {
        let dir = camino_tempfile::tempdir().unwrap();
        write(&dir, "plugins/e2e/results/junit_01.xml", REPORT);

        let (result, _) = run(&[
            "postprocess",
            "--dir",
            dir.path().as_str(),
            "--plugin",
            "e2e",
            "--no-write",
        ]);
        assert_eq!(result.unwrap(), ResultsExitCode::OK);
        assert!(!dir.path().join("plugins/e2e/sonobuoy_results.yaml").exists());
    }

    #[test]
    fn postprocess_with_unreadable_directory() {
        let dir = camino_tempfile::tempdir().unwrap();
        // systemd-logs runs per node by default, so its results directory must be listable.
        write(&dir, "plugins/systemd-logs/results", "");

        let (result, stdout) = run(&["postprocess", "--dir", dir.path().as_str()]);
        assert_eq!(result.unwrap(), ResultsExitCode::PROCESSING_ERRORS);
        assert_eq!(stdout, "systemd-logs: unknown (0 total, 0 passed, 0 failed)\n");
    }

    #[test]
    fn show_errors() {
        let dir = camino_tempfile::tempdir().unwrap();
        write(&dir, "plugins/e2e/results/junit_01.xml", REPORT);

        let (result, _) = run(&["show", "--dir", dir.path().as_str(), "--plugin", "e2e"]);
        let error = result.unwrap_err();
        assert_eq!(error.process_exit_code(), ResultsExitCode::READ_RESULTS_FAILED);

        run(&["postprocess", "--dir", dir.path().as_str()]).0.unwrap();
        let (result, _) = run(&[
            "show",
            "--dir",
            dir.path().as_str(),
            "--plugin",
            "e2e",
            "--node",
            "node-9",
        ]);
        let error = result.unwrap_err();
        assert!(matches!(error, ExpectedError::NodeNotFound { .. }));
        assert_eq!(error.process_exit_code(), ResultsExitCode::NODE_NOT_FOUND);
    }

    #[test]
    fn invalid_config_is_a_setup_error() {
        let dir = camino_tempfile::tempdir().unwrap();
        write(&dir, ".config/plugin-results.toml", "[plugins.e2e]\ndriver = 3\n");

        let (result, _) = run(&["postprocess", "--dir", dir.path().as_str()]);
        assert_eq!(
            result.unwrap_err().process_exit_code(),
            ResultsExitCode::SETUP_ERROR
        );
    }
}
