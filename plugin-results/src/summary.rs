// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summaries and reports over result trees.

use crate::item::{
    Item, METADATA_ERROR_KEY, METADATA_FILE_KEY, METADATA_TYPE_NODE, METADATA_TYPE_SUMMARY, Status,
};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// Detail keys checked, in order, for the message of a failed leaf.
const FAILURE_MESSAGE_KEYS: [&str; 2] = ["failure", "error"];

/// Counts of leaf statuses in a result tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// The name of the root of the tree.
    pub name: String,

    /// The status of the root of the tree.
    pub status: Status,

    /// The number of leaves.
    pub total: usize,

    /// The number of leaves per status label.
    pub counts: BTreeMap<String, usize>,

    /// The leaves that failed or timed out, in tree order.
    pub failures: Vec<FailedLeaf>,
}

/// A failed leaf, as listed in a [`Summary`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedLeaf {
    /// The name of the leaf.
    pub name: String,

    /// The status of the leaf.
    pub status: Status,

    /// The failure or error message recorded for the leaf, if any.
    pub message: Option<String>,
}

impl Summary {
    /// Summarizes the tree rooted at `item`.
    ///
    /// A plugin or node branch that has no children has no leaves, at any depth.
    pub fn new(item: &Item) -> Self {
        let mut counts = BTreeMap::new();
        let mut failures = Vec::new();
        let mut total = 0;

        for leaf in item.leaves().filter(|leaf| !is_empty_branch(leaf)) {
            total += 1;
            let status = leaf.status_or_unknown();
            *counts.entry(status.as_str().to_owned()).or_default() += 1;
            if status.is_failure() {
                failures.push(FailedLeaf {
                    name: leaf.name.clone(),
                    message: failure_message(leaf),
                    status,
                });
            }
        }

        Self {
            name: item.name.clone(),
            status: item.status_or_unknown(),
            total,
            counts,
            failures,
        }
    }

    /// Returns the number of leaves with this status.
    pub fn count(&self, status: &Status) -> usize {
        self.counts.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// A plugin or node branch with nothing under it, as opposed to an actual result.
fn is_empty_branch(item: &Item) -> bool {
    item.items.is_empty()
        && matches!(
            item.type_tag(),
            Some(METADATA_TYPE_SUMMARY | METADATA_TYPE_NODE)
        )
}

fn failure_message(leaf: &Item) -> Option<String> {
    FAILURE_MESSAGE_KEYS
        .iter()
        .find_map(|key| leaf.details.get(*key))
        .or_else(|| leaf.metadata.get(METADATA_ERROR_KEY))
        .filter(|message| !message.is_empty())
        .cloned()
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plugin: {}", self.name)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Total: {}", self.total)?;

        // The well-known counts are always shown, others only if present.
        let shown = [Status::Passed, Status::Failed, Status::Skipped];
        for status in &shown {
            writeln!(f, "{}: {}", capitalize(status.as_str()), self.count(status))?;
        }
        for (label, count) in &self.counts {
            if !shown.iter().any(|status| status.as_str() == label) {
                writeln!(f, "{}: {count}", capitalize(label))?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed tests:")?;
            for failure in &self.failures {
                writeln!(f, "  {}", failure.name)?;
                if let Some(message) = &failure.message {
                    for line in message.lines() {
                        writeln!(f, "    {line}")?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A leaf together with the names of its ancestors, for line-oriented output.
#[derive(Clone, Debug, Serialize)]
pub struct DetailedLeaf<'a> {
    /// The names of the ancestors of the leaf, starting with the root.
    pub path: Vec<&'a str>,

    /// The name of the leaf.
    pub name: &'a str,

    /// The status of the leaf, or an empty string if unset.
    pub status: &'a str,

    /// The file the leaf was produced from, if recorded on the leaf or an ancestor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<&'a str>,

    /// The details of the leaf.
    #[serde(skip_serializing_if = "no_details")]
    pub details: &'a BTreeMap<String, String>,
}

fn no_details(details: &&BTreeMap<String, String>) -> bool {
    details.is_empty()
}

/// Returns every leaf of the tree rooted at `item` with its ancestry, in pre-order.
///
/// Empty plugin and node branches are skipped, as in [`Summary::new`].
pub fn detailed_leaves(item: &Item) -> Vec<DetailedLeaf<'_>> {
    fn visit<'a>(
        item: &'a Item,
        path: &mut Vec<&'a str>,
        file: Option<&'a str>,
        out: &mut Vec<DetailedLeaf<'a>>,
    ) {
        let file = item
            .metadata
            .get(METADATA_FILE_KEY)
            .map(String::as_str)
            .or(file);
        if item.items.is_empty() {
            if is_empty_branch(item) {
                return;
            }
            out.push(DetailedLeaf {
                path: path.clone(),
                name: &item.name,
                status: item.status.as_ref().map_or("", Status::as_str),
                file,
                details: &item.details,
            });
            return;
        }

        path.push(&item.name);
        for child in &item.items {
            visit(child, path, file, out);
        }
        path.pop();
    }

    let mut out = Vec::new();
    visit(item, &mut Vec::new(), None, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::METADATA_TYPE_FILE;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn sample_plugin() -> Item {
        let mut failed = Item::leaf("volumes", Status::Failed);
        failed.set_detail("failure", "expected 1\ngot 2");
        let mut file = Item::branch(
            "junit.xml",
            METADATA_TYPE_FILE,
            vec![
                Item::leaf("pods", Status::Passed),
                failed,
                Item::leaf("flaky", Status::Skipped),
            ],
        );
        file.set_metadata(METADATA_FILE_KEY, "results/node-1/junit.xml");
        let node = Item::branch("node-1", METADATA_TYPE_NODE, vec![file]);

        let mut timeout = Item::leaf("pod timeout exceeded", Status::Timeout);
        timeout.set_detail("error", "pod timeout exceeded");
        let errors = Item::branch("node-2", METADATA_TYPE_NODE, vec![timeout]);

        let mut plugin = Item::branch("e2e", METADATA_TYPE_SUMMARY, vec![node, errors]);
        plugin.status = Some(Status::Failed);
        plugin
    }

    #[test]
    fn summary_counts() {
        let summary = Summary::new(&sample_plugin());

        assert_eq!(summary.status, Status::Failed);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(&Status::Passed), 1);
        assert_eq!(summary.count(&Status::Failed), 1);
        assert_eq!(summary.count(&Status::Timeout), 1);
        assert_eq!(summary.count(&Status::Unknown), 0);
        assert_eq!(
            summary.failures,
            vec![
                FailedLeaf {
                    name: "volumes".to_owned(),
                    status: Status::Failed,
                    message: Some("expected 1\ngot 2".to_owned()),
                },
                FailedLeaf {
                    name: "pod timeout exceeded".to_owned(),
                    status: Status::Timeout,
                    message: Some("pod timeout exceeded".to_owned()),
                },
            ]
        );
    }

    #[test]
    fn summary_report() {
        let summary = Summary::new(&sample_plugin());
        assert_eq!(
            summary.to_string(),
            indoc! {"
                Plugin: e2e
                Status: failed
                Total: 4
                Passed: 1
                Failed: 1
                Skipped: 1
                Timeout: 1

                Failed tests:
                  volumes
                    expected 1
                    got 2
                  pod timeout exceeded
                    pod timeout exceeded
            "}
        );
    }

    #[test]
    fn empty_plugin_has_no_leaves() {
        let mut plugin = Item::branch("e2e", METADATA_TYPE_SUMMARY, vec![]);
        plugin.status = Some(Status::Unknown);

        let summary = Summary::new(&plugin);
        assert_eq!(summary.total, 0);
        assert!(summary.counts.is_empty());

        // A bare leaf is its own only leaf.
        let summary = Summary::new(&Item::leaf("raw.log", Status::Unknown));
        assert_eq!(summary.total, 1);
        assert_eq!(summary.count(&Status::Unknown), 1);
    }

    #[test]
    fn empty_nodes_are_not_counted() {
        let node_a = Item::branch(
            "node-a",
            METADATA_TYPE_NODE,
            vec![Item::leaf("dns", Status::Passed)],
        );
        let node_b = Item::branch("node-b", METADATA_TYPE_NODE, vec![]);
        let mut plugin = Item::branch("checks", METADATA_TYPE_SUMMARY, vec![node_a, node_b]);
        plugin.status = Some(Status::Passed);

        let summary = Summary::new(&plugin);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.count(&Status::Passed), 1);
        assert_eq!(summary.count(&Status::Unknown), 0);
        assert!(!summary.to_string().contains("Unknown"));

        let leaves = detailed_leaves(&plugin);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].path, vec!["checks", "node-a"]);
        assert_eq!(leaves[0].name, "dns");
    }

    #[test]
    fn detailed_leaves_carry_ancestry() {
        let plugin = sample_plugin();
        let leaves = detailed_leaves(&plugin);

        assert_eq!(leaves.len(), 4);
        assert_eq!(leaves[1].path, vec!["e2e", "node-1", "junit.xml"]);
        assert_eq!(leaves[1].name, "volumes");
        assert_eq!(leaves[1].status, "failed");
        assert_eq!(leaves[1].file, Some("results/node-1/junit.xml"));
        assert_eq!(leaves[3].path, vec!["e2e", "node-2"]);
        assert_eq!(leaves[3].file, None);

        assert_eq!(
            serde_json::to_string(&leaves[0]).unwrap(),
            r#"{"path":["e2e","node-1","junit.xml"],"name":"pods","status":"passed","file":"results/node-1/junit.xml"}"#
        );
    }
}
