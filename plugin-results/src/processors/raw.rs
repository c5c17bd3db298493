// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ProcessedFile, base_name, relative_path};
use crate::item::{Item, METADATA_FILE_KEY, METADATA_TYPE_FILE, METADATA_TYPE_KEY, Status};
use camino::Utf8Path;

/// Processes a file whose contents are not interpreted.
///
/// Each file becomes a leaf with an unknown status that records where the file can be found.
pub fn process_raw_file(plugin_dir: &Utf8Path, file: &Utf8Path) -> ProcessedFile {
    let mut item = Item::leaf(base_name(file), Status::Unknown);
    item.set_metadata(METADATA_FILE_KEY, relative_path(plugin_dir, file))
        .set_metadata(METADATA_TYPE_KEY, METADATA_TYPE_FILE);
    ProcessedFile::ok(item)
}
