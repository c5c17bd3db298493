// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Walking results and errors directories.

use crate::{
    errors::{DisplayErrorChain, ProcessDirError},
    item::{Item, METADATA_TYPE_NODE},
    processors::ProcessedFile,
    selector::FileSelector,
};
use camino::Utf8Path;
use std::io;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Walks every file under `dir`, processing each file accepted by `selector`.
///
/// Files are visited in lexical order, and one item is returned per processed file, in that order.
/// `plugin_dir` is passed on to the processor so it can record paths relative to the plugin.
///
/// A processing error for a single file is logged, and the partial item for that file is still
/// returned. Entries below `dir` that can't be read are logged and skipped. Only a failure to read
/// `dir` itself is returned as an error; use [`ProcessDirError::is_not_found`] to tell a missing
/// directory apart from other failures.
pub fn process_dir<P>(
    plugin_dir: &Utf8Path,
    dir: &Utf8Path,
    processor: P,
    selector: &FileSelector,
) -> Result<Vec<Item>, ProcessDirError>
where
    P: Fn(&Utf8Path, &Utf8Path) -> ProcessedFile,
{
    let mut results = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) if error.depth() == 0 => {
                return Err(ProcessDirError::Walk {
                    dir: dir.to_owned(),
                    error,
                });
            }
            Err(error) => {
                warn!("skipping unreadable entry under `{dir}`: {error}");
                continue;
            }
        };

        let Some(path) = Utf8Path::from_path(entry.path()) else {
            warn!(
                "skipping non-UTF-8 path under `{dir}`: {}",
                entry.path().display()
            );
            continue;
        };

        if selector.matches(path, entry.file_type()) {
            debug!("processing file `{path}`");
            let ProcessedFile { item, error } = processor(plugin_dir, path);
            if let Some(error) = error {
                error!("error processing file `{path}`: {}", DisplayErrorChain::new(&error));
            }
            results.push(item);
        }
    }

    Ok(results)
}

/// Runs [`process_dir`] over every node subdirectory of `dir`.
///
/// Each node's items are wrapped in a branch named after the node directory and tagged as a node.
/// Non-directory entries are ignored. Errors while walking a single node are logged and don't
/// prevent other nodes from being processed.
///
/// A missing `dir` produces no nodes. Any other failure to list `dir` is returned.
pub fn process_nodes<P>(
    plugin: &str,
    plugin_dir: &Utf8Path,
    dir: &Utf8Path,
    processor: P,
    selector: &FileSelector,
) -> Result<Vec<Item>, ProcessDirError>
where
    P: Fn(&Utf8Path, &Utf8Path) -> ProcessedFile,
{
    let read_dir_error = |error: io::Error| ProcessDirError::ReadDir {
        dir: dir.to_owned(),
        error,
    };

    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(read_dir_error(error)),
    };

    let mut node_dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(read_dir_error)?;
        if entry.file_type().map_err(read_dir_error)?.is_dir() {
            node_dirs.push(entry.file_name().to_owned());
        }
    }
    node_dirs.sort_unstable();

    let mut results = Vec::with_capacity(node_dirs.len());
    for node_name in node_dirs {
        let items = match process_dir(plugin_dir, &dir.join(&node_name), &processor, selector) {
            Ok(items) => items,
            Err(error) => {
                warn!(
                    "error processing results entries for node {node_name}, plugin {plugin}: {}",
                    DisplayErrorChain::new(&error)
                );
                Vec::new()
            }
        };
        results.push(Item::branch(node_name, METADATA_TYPE_NODE, items));
    }

    Ok(results)
}
