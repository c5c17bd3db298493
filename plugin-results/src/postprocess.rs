// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing a single plugin's output into one result tree.

use crate::{
    aggregate::{aggregate_status, manual_results_aggregation},
    errors::{PostProcessError, ProcessDirError},
    item::{Item, METADATA_TYPE_SUMMARY},
    plugin::{ERRORS_DIR, POST_PROCESSED_RESULTS_FILE, PluginDescriptor, RESULTS_DIR, ResultFormat},
    processors::{
        FileProcessor, process_error_file, process_junit_file, process_manual_file,
        process_raw_file,
    },
    selector::FileSelector,
    walk::{process_dir, process_nodes},
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

/// The extension of JUnit reports, used when a plugin doesn't name its result files.
const JUNIT_EXTENSION: &str = ".xml";

/// The output of [`post_process_plugin`].
#[derive(Debug)]
pub struct PluginResults {
    /// The plugin-level tree, tagged as a summary.
    pub item: Item,

    /// Directory-level errors encountered while building the tree.
    ///
    /// Errors for individual files are logged and not included here.
    pub errors: Vec<PostProcessError>,
}

impl PluginResults {
    /// Returns true if the tree was built without directory-level errors.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Returns the file selector and processor used for a result format.
///
/// `files` is the plugin's explicit list of result files; when empty, a format-specific default is
/// used instead.
pub fn select_processor(format: &ResultFormat, files: &[String]) -> (FileSelector, FileProcessor) {
    match format {
        ResultFormat::Junit | ResultFormat::E2e => (
            FileSelector::file_or_extension(files.iter().cloned(), JUNIT_EXTENSION),
            process_junit_file,
        ),
        ResultFormat::Manual => (
            FileSelector::file_or_default(files.iter().cloned(), POST_PROCESSED_RESULTS_FILE),
            process_manual_file,
        ),
        ResultFormat::Raw | ResultFormat::Other(_) => (
            FileSelector::file_or_any(files.iter().cloned()),
            process_raw_file,
        ),
    }
}

/// Builds the result tree for one plugin from its output under `base_dir`.
///
/// The returned item is named after the plugin and its children are the items for the results
/// directory followed by the items for the errors directory. For multi-node plugins each of these
/// is a node branch. The status of the tree is set by automatic rollup, or by manual aggregation
/// for [`ResultFormat::Manual`].
///
/// Missing results or errors directories are not errors. A partial tree is always returned along
/// with any directory-level errors.
pub fn post_process_plugin<P>(plugin: &P, base_dir: &Utf8Path) -> PluginResults
where
    P: PluginDescriptor + ?Sized,
{
    let name = plugin.name();
    let format = plugin.result_format();
    let plugin_dir = plugin.plugin_dir(base_dir);
    let results_dir = plugin_dir.join(RESULTS_DIR);
    let errors_dir = plugin_dir.join(ERRORS_DIR);

    let (selector, processor) = select_processor(format, plugin.result_files());
    let error_selector = FileSelector::error_files();
    debug!(
        "post-processing plugin {name} (format {format}, multi-node: {})",
        plugin.is_multi_node()
    );

    let mut errors = Vec::new();
    let mut collect = |dir: &Utf8PathBuf, result: Result<Vec<Item>, ProcessDirError>| match result
    {
        Ok(items) => items,
        Err(error) => {
            errors.push(PostProcessError::new(name, dir.clone(), error));
            Vec::new()
        }
    };

    let (results, error_items) = if plugin.is_multi_node() {
        let results = process_nodes(name, &plugin_dir, &results_dir, processor, &selector);
        let results = collect(&results_dir, results);
        let error_items = process_nodes(
            name,
            &plugin_dir,
            &errors_dir,
            process_error_file,
            &error_selector,
        );
        (results, collect(&errors_dir, error_items))
    } else {
        let results = process_dir(&plugin_dir, &results_dir, processor, &selector);
        let results = collect(&results_dir, ignore_not_found(results));
        let error_items = process_dir(&plugin_dir, &errors_dir, process_error_file, &error_selector);
        (results, collect(&errors_dir, ignore_not_found(error_items)))
    };

    let mut item = Item::branch(name, METADATA_TYPE_SUMMARY, results);
    item.items.extend(error_items);

    let status = if *format == ResultFormat::Manual {
        if plugin.is_multi_node() {
            // Each node is labelled from its direct children only; the plugin label is computed
            // over every node's children together.
            for node in &mut item.items {
                node.status = Some(manual_results_aggregation(&node.items));
            }
            manual_results_aggregation(item.items.iter().flat_map(|node| &node.items))
        } else {
            manual_results_aggregation(&item.items)
        }
    } else {
        aggregate_status(&mut item.items)
    };
    item.status = Some(status);

    PluginResults { item, errors }
}

fn ignore_not_found(
    result: Result<Vec<Item>, ProcessDirError>,
) -> Result<Vec<Item>, ProcessDirError> {
    match result {
        Err(error) if error.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}
