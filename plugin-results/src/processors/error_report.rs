// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ProcessedFile, base_name, relative_path};
use crate::{
    errors::ProcessFileError,
    item::{Item, METADATA_ERROR_KEY, METADATA_FILE_KEY, Status},
};
use camino::Utf8Path;
use serde::Deserialize;
use serde_json::{Deserializer, Map, Value};
use std::io::BufReader;

/// The detail key holding the captured error message.
const ERROR_DETAIL_KEY: &str = "error";

/// Processes an error report captured in a plugin's errors directory.
///
/// The report is a JSON object whose top-level keys are copied into the details of a failed leaf.
/// If the report has a non-empty `error` entry, it becomes the name of the leaf, and if that
/// message mentions a timeout the leaf is marked as [`Status::Timeout`].
pub fn process_error_file(plugin_dir: &Utf8Path, file: &Utf8Path) -> ProcessedFile {
    let mut item = Item::leaf(base_name(file), Status::Failed);
    item.set_metadata(METADATA_FILE_KEY, relative_path(plugin_dir, file));

    let infile = match fs_err::File::open(file) {
        Ok(infile) => infile,
        Err(error) => {
            item.set_metadata(METADATA_ERROR_KEY, error.to_string());
            item.status = Some(Status::Unknown);
            return ProcessedFile::partial(
                item,
                ProcessFileError::Open {
                    path: file.to_owned(),
                    error,
                },
            );
        }
    };

    // Only the first value is read; anything written after it is ignored.
    let mut deserializer = Deserializer::from_reader(BufReader::new(infile));
    let report = match Map::<String, Value>::deserialize(&mut deserializer) {
        Ok(report) => report,
        Err(error) => {
            return ProcessedFile::partial(
                item,
                ProcessFileError::Json {
                    path: file.to_owned(),
                    error,
                },
            );
        }
    };

    for (key, value) in report {
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        item.details.insert(key, value);
    }

    // Surface the message as the name: "error.json" tells the reader nothing.
    if let Some(message) = item.details.get(ERROR_DETAIL_KEY).filter(|m| !m.is_empty()) {
        item.name = message.clone();
        if is_timeout_message(message) {
            item.status = Some(Status::Timeout);
        }
    }

    ProcessedFile::ok(item)
}

/// Returns true if an error message means the plugin timed out before reporting results.
fn is_timeout_message(message: &str) -> bool {
    message.contains("timeout")
}
