// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ProcessedFile, base_name, relative_path};
use crate::{
    aggregate::manual_results_aggregation,
    errors::ProcessFileError,
    item::{
        Item, METADATA_ERROR_KEY, METADATA_FILE_KEY, METADATA_TYPE_FILE, METADATA_TYPE_KEY,
        Status,
    },
};
use camino::Utf8Path;
use std::io::BufReader;

/// Processes a result document written by the plugin itself.
///
/// The document is taken as-is, apart from recording the file it came from. A document with no
/// top-level status is given the manual aggregation of its children.
pub fn process_manual_file(plugin_dir: &Utf8Path, file: &Utf8Path) -> ProcessedFile {
    let rel_path = relative_path(plugin_dir, file);

    let decoded = fs_err::File::open(file)
        .map_err(|error| ProcessFileError::Open {
            path: file.to_owned(),
            error,
        })
        .and_then(|infile| {
            serde_yaml::from_reader::<_, Item>(BufReader::new(infile)).map_err(|error| {
                ProcessFileError::Yaml {
                    path: file.to_owned(),
                    error,
                }
            })
        });

    match decoded {
        Ok(mut item) => {
            if item.status.is_none() {
                item.status = Some(manual_results_aggregation(&item.items));
            }
            item.set_metadata(METADATA_FILE_KEY, rel_path)
                .set_metadata(METADATA_TYPE_KEY, METADATA_TYPE_FILE);
            ProcessedFile::ok(item)
        }
        Err(error) => {
            let mut item = Item::leaf(base_name(file), Status::Unknown);
            item.set_metadata(METADATA_FILE_KEY, rel_path)
                .set_metadata(METADATA_ERROR_KEY, error_message(&error));
            ProcessedFile::partial(item, error)
        }
    }
}

fn error_message(error: &ProcessFileError) -> String {
    match error {
        ProcessFileError::Open { error, .. } => error.to_string(),
        ProcessFileError::Yaml { error, .. } => error.to_string(),
        other => other.to_string(),
    }
}
