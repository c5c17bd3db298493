// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for post-processing plugin output directories.

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use plugin_results::{
    Item, Status,
    config::{DefaultConfigWarnings, ResultsConfig},
    plugin::{PluginDescriptor, PluginDriver, PluginSpec, ResultFormat},
    post_process_plugin,
    store::{read_results, write_results},
    summary::Summary,
};
use pretty_assertions::assert_eq;

struct ResultsDir {
    dir: Utf8TempDir,
}

impl ResultsDir {
    fn new() -> Self {
        Self {
            dir: camino_tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Utf8Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }
}

fn names(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

static ONE_FAILURE_REPORT: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <testsuites>
      <testsuite name="Kubernetes e2e suite" tests="2" failures="1">
        <testcase name="[sig-apps] Deployment should roll out" time="12.3">
          <failure message="timed out waiting for rollout">deployment_test.go:42</failure>
        </testcase>
        <testcase name="[sig-node] Pods should be scheduled" time="1.2"/>
      </testsuite>
    </testsuites>
"#};

#[test]
fn junit_failure_rolls_up_through_node() {
    let results = ResultsDir::new();
    results.write("plugins/e2e/results/node-1/junit_01.xml", ONE_FAILURE_REPORT);
    let plugin = PluginSpec::new("e2e", ResultFormat::Junit, PluginDriver::DaemonSet);

    let processed = post_process_plugin(&plugin, results.path());

    assert!(processed.is_complete());
    let tree = &processed.item;
    assert_eq!(tree.status, Some(Status::Failed));
    assert_eq!(tree.type_tag(), Some("summary"));

    let node = &tree.items[0];
    assert_eq!(node.name, "node-1");
    assert_eq!(node.type_tag(), Some("node"));
    assert_eq!(node.status, Some(Status::Failed));

    // Rollup resolves every level below the plugin too.
    let file = &node.items[0];
    assert_eq!(file.name, "junit_01.xml");
    assert_eq!(file.metadata["file"], "results/node-1/junit_01.xml");
    assert_eq!(file.status, Some(Status::Failed));
    let suite = &file.items[0];
    assert_eq!(suite.status, Some(Status::Failed));
    let statuses: Vec<_> = suite.items.iter().map(|case| case.status.clone()).collect();
    assert_eq!(statuses, vec![Some(Status::Failed), Some(Status::Passed)]);
    assert_eq!(
        suite.items[0].details["failure"],
        "timed out waiting for rollout\ndeployment_test.go:42"
    );
}

#[test]
fn manual_results_for_single_run_plugin() {
    let results = ResultsDir::new();
    results.write(
        "plugins/checks/results/sonobuoy_results.yaml",
        indoc! {"
            name: checks
            status: passed
            items:
              - name: dns
                status: passed
              - name: ntp
                status: passed
              - name: disk
                status: passed
        "},
    );
    let plugin = PluginSpec::new("checks", ResultFormat::Manual, PluginDriver::Job);

    let processed = post_process_plugin(&plugin, results.path());

    assert!(processed.is_complete());
    assert_eq!(processed.item.status, Some(Status::Passed));
    let document = &processed.item.items[0];
    assert_eq!(document.metadata["type"], "file");
    assert_eq!(names(&document.items), vec!["dns", "ntp", "disk"]);
}

#[test]
fn manual_results_without_top_level_status() {
    let results = ResultsDir::new();
    results.write(
        "plugins/checks/results/sonobuoy_results.yaml",
        indoc! {"
            items:
              - name: dns
                status: passed
              - name: ntp
                status: passed
              - name: disk
                status: passed
        "},
    );
    let plugin = PluginSpec::new("checks", ResultFormat::Manual, PluginDriver::Job);

    let processed = post_process_plugin(&plugin, results.path());

    assert_eq!(processed.item.items[0].status, Some(Status::Passed));
    assert_eq!(processed.item.status, Some(Status::Passed));
}

#[test]
fn timeout_error_forces_failure() {
    let results = ResultsDir::new();
    results
        .write("plugins/e2e/results/output.log", "some output")
        .write(
            "plugins/e2e/errors/error.json",
            r#"{"error":"pod timeout exceeded"}"#,
        );
    let plugin = PluginSpec::new("e2e", ResultFormat::Raw, PluginDriver::Job);

    let processed = post_process_plugin(&plugin, results.path());

    assert!(processed.is_complete());
    let tree = &processed.item;
    assert_eq!(names(&tree.items), vec!["output.log", "pod timeout exceeded"]);
    let error = &tree.items[1];
    assert_eq!(error.status, Some(Status::Timeout));
    assert_eq!(error.metadata["file"], "errors/error.json");
    assert_eq!(tree.status, Some(Status::Failed));
}

#[test]
fn aborted_plugin_is_not_a_pass() {
    let results = ResultsDir::new();
    std::fs::create_dir_all(results.path().join("plugins/e2e/results")).unwrap();
    let plugin = PluginSpec::new("e2e", ResultFormat::Junit, PluginDriver::Job);

    let processed = post_process_plugin(&plugin, results.path());

    assert!(processed.is_complete());
    assert!(processed.item.items.is_empty());
    assert_eq!(processed.item.status, Some(Status::Unknown));
}

#[test]
fn malformed_files_still_contribute_items() {
    let results = ResultsDir::new();
    results
        .write("plugins/e2e/results/a.xml", ONE_FAILURE_REPORT)
        .write(
            "plugins/e2e/results/b.xml",
            r#"<testsuite><testcase name="a"></testsuite>"#,
        )
        .write("plugins/e2e/results/notes.txt", "not a report");
    let plugin = PluginSpec::new("e2e", ResultFormat::Junit, PluginDriver::Job);

    let processed = post_process_plugin(&plugin, results.path());

    assert!(processed.is_complete(), "per-file errors are only logged");
    assert_eq!(names(&processed.item.items), vec!["a.xml", "b.xml"]);
    let broken = &processed.item.items[1];
    assert_eq!(broken.status, Some(Status::Unknown));
    assert!(broken.metadata.contains_key("error"));
}

#[test]
fn configured_plugins_round_trip_through_store() {
    let results = ResultsDir::new();
    results
        .write(
            ".config/plugin-results.toml",
            indoc! {r#"
                [plugins.node-checks]
                result-format = "junit"
                driver = "daemonset"
                result-files = ["checks.xml"]
            "#},
        )
        .write("plugins/node-checks/results/node-a/checks.xml", ONE_FAILURE_REPORT)
        .write("plugins/node-checks/results/node-a/ignored.xml", ONE_FAILURE_REPORT)
        .write(
            "plugins/node-checks/errors/node-b/error.json",
            r#"{"error":"container exited","exit-code":1}"#,
        )
        .write("plugins/extra/results/dump.tar.gz", "");

    let config =
        ResultsConfig::from_sources(results.path(), None, &mut DefaultConfigWarnings).unwrap();
    let plugins = config.discover_plugins().unwrap();
    let plugin_names: Vec<_> = plugins.iter().map(|plugin| plugin.name()).collect();
    assert_eq!(plugin_names, vec!["extra", "node-checks"]);

    for plugin in &plugins {
        let processed = post_process_plugin(plugin, results.path());
        assert!(processed.is_complete());
        write_results(results.path(), &processed.item).unwrap();
        assert_eq!(
            read_results(results.path(), plugin.name()).unwrap(),
            processed.item
        );
    }

    let extra = read_results(results.path(), "extra").unwrap();
    assert_eq!(extra.status, Some(Status::Unknown));
    assert_eq!(names(&extra.items), vec!["dump.tar.gz"]);

    let checks = read_results(results.path(), "node-checks").unwrap();
    assert_eq!(names(&checks.items), vec!["node-a", "node-b"]);
    assert_eq!(names(&checks.items[0].items), vec!["checks.xml"]);
    assert_eq!(checks.items[1].status, Some(Status::Failed));
    assert_eq!(checks.items[1].items[0].details["exit-code"], "1");

    let summary = Summary::new(&checks);
    assert_eq!(summary.status, Status::Failed);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.count(&Status::Failed), 2);
    assert_eq!(summary.count(&Status::Passed), 1);
}
