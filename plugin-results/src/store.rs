// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading and writing post-processed results files.

use crate::{
    errors::{ReadResultsError, WriteResultsError},
    item::Item,
    plugin::{PLUGINS_DIR, POST_PROCESSED_RESULTS_FILE},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use tracing::debug;

/// Returns the path of the post-processed results file for `plugin` under `base_dir`.
pub fn results_file_path(base_dir: &Utf8Path, plugin: &str) -> Utf8PathBuf {
    base_dir
        .join(PLUGINS_DIR)
        .join(plugin)
        .join(POST_PROCESSED_RESULTS_FILE)
}

/// Writes the tree for a plugin to its post-processed results file, replacing any existing file.
///
/// The plugin name is taken from the root of `item`. Returns the path that was written.
pub fn write_results(base_dir: &Utf8Path, item: &Item) -> Result<Utf8PathBuf, WriteResultsError> {
    let path = results_file_path(base_dir, &item.name);
    let contents = serde_yaml::to_string(item).map_err(|error| WriteResultsError::Serialize {
        plugin: item.name.clone(),
        error,
    })?;

    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent).map_err(|error| WriteResultsError::CreateDir {
            path: parent.to_owned(),
            error,
        })?;
    }

    atomicwrites::AtomicFile::new(&path, atomicwrites::AllowOverwrite)
        .write(|file| file.write_all(contents.as_bytes()))
        .map_err(|error| WriteResultsError::Write {
            path: path.clone(),
            error,
        })?;

    debug!("wrote results for plugin {} to `{path}`", item.name);
    Ok(path)
}

/// Reads the post-processed results file for `plugin` under `base_dir`.
pub fn read_results(base_dir: &Utf8Path, plugin: &str) -> Result<Item, ReadResultsError> {
    let path = results_file_path(base_dir, plugin);
    let contents = fs_err::read_to_string(&path).map_err(|error| ReadResultsError::Read {
        path: path.clone(),
        error,
    })?;
    serde_yaml::from_str(&contents).map_err(|error| ReadResultsError::Decode { path, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{METADATA_TYPE_NODE, METADATA_TYPE_SUMMARY, Status};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_then_read() {
        let dir = camino_tempfile::tempdir().unwrap();
        let mut leaf = Item::leaf("[sig-storage] volumes", Status::Failed);
        leaf.set_detail("failure", "timed out");
        let mut node = Item::branch("node-1", METADATA_TYPE_NODE, vec![leaf]);
        node.status = Some(Status::Failed);
        let mut plugin = Item::branch("e2e", METADATA_TYPE_SUMMARY, vec![node]);
        plugin.status = Some(Status::Failed);

        let path = write_results(dir.path(), &plugin).unwrap();
        assert_eq!(path, dir.path().join("plugins/e2e/sonobuoy_results.yaml"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            indoc! {r#"
                name: e2e
                status: failed
                meta:
                  type: summary
                items:
                - name: node-1
                  status: failed
                  meta:
                    type: node
                  items:
                  - name: '[sig-storage] volumes'
                    status: failed
                    details:
                      failure: timed out
            "#}
        );

        assert_eq!(read_results(dir.path(), "e2e").unwrap(), plugin);
    }

    #[test]
    fn unset_status_is_written_as_empty() {
        let dir = camino_tempfile::tempdir().unwrap();
        let plugin = Item::new("pending");

        write_results(dir.path(), &plugin).unwrap();
        let contents =
            std::fs::read_to_string(results_file_path(dir.path(), "pending")).unwrap();
        assert_eq!(contents, "name: pending\nstatus: ''\n");
        assert_eq!(read_results(dir.path(), "pending").unwrap().status, None);
    }

    #[test]
    fn read_errors() {
        let dir = camino_tempfile::tempdir().unwrap();
        assert!(matches!(
            read_results(dir.path(), "missing"),
            Err(ReadResultsError::Read { .. })
        ));

        let path = results_file_path(dir.path(), "broken");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "items: [unterminated").unwrap();
        assert!(matches!(
            read_results(dir.path(), "broken"),
            Err(ReadResultsError::Decode { .. })
        ));
    }
}
