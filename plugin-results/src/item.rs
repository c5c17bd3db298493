// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The result tree produced by post-processing.
//!
//! Every plugin, node, file, suite and test case is represented as an [`Item`]. Branch items carry
//! their children in [`Item::items`]; leaves carry their facts in [`Item::details`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt};

/// Metadata key recording the path of the file an item was produced from, relative to the plugin
/// directory.
pub const METADATA_FILE_KEY: &str = "file";

/// Metadata key describing what kind of entry in the tree an item is.
pub const METADATA_TYPE_KEY: &str = "type";

/// Metadata key recording an error that prevented an item from being fully populated.
pub const METADATA_ERROR_KEY: &str = "error";

/// `type` metadata value for per-node branches.
pub const METADATA_TYPE_NODE: &str = "node";

/// `type` metadata value for items representing a single result file.
pub const METADATA_TYPE_FILE: &str = "file";

/// `type` metadata value for the plugin-level summary item.
pub const METADATA_TYPE_SUMMARY: &str = "summary";

/// The status of an [`Item`].
///
/// The well-known statuses take part in automatic rollup. Plugins that supply their own results
/// may also use arbitrary labels, which are carried through as [`Status::Custom`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The test or check passed.
    Passed,

    /// The test or check failed.
    Failed,

    /// The test or check was skipped.
    Skipped,

    /// No status could be determined.
    Unknown,

    /// The plugin did not report results in time. Treated as a failure during rollup.
    Timeout,

    /// A label supplied by the plugin itself.
    Custom(String),
}

impl Status {
    /// Parses a status label, returning `None` for an empty (unset) label.
    pub fn from_label(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        let status = match label.as_str() {
            "" => return None,
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            "unknown" => Self::Unknown,
            "timeout" => Self::Timeout,
            _ => Self::Custom(label),
        };
        Some(status)
    }

    /// Returns the label for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
            Self::Timeout => "timeout",
            Self::Custom(label) => label,
        }
    }

    /// Returns true if this status is one of the failure modes ([`Status::Failed`] or
    /// [`Status::Timeout`]).
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Timeout)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The central format for plugin results.
///
/// Items are created by file processors (leaves) or by post-processing (node and summary
/// branches). The status of a branch is only meaningful once aggregation has run over it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// A human-readable identifier: a test, file, node or plugin name, or an error message.
    #[serde(default)]
    pub name: String,

    /// The status of this item. `None` means the status is unset; it is serialized as an empty
    /// string.
    #[serde(
        default,
        serialize_with = "serialize_status",
        deserialize_with = "deserialize_status"
    )]
    pub status: Option<Status>,

    /// Structural tags (see the `METADATA_*` constants) and source information.
    #[serde(
        rename = "meta",
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "deserialize_string_map"
    )]
    pub metadata: BTreeMap<String, String>,

    /// Arbitrary leaf-level facts such as error text, counts or timestamps.
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "deserialize_string_map"
    )]
    pub details: BTreeMap<String, String>,

    /// Child items, in the order they were produced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
}

impl Item {
    /// Creates a new item with the given name and no status.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a new leaf with the given name and status.
    pub fn leaf(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status: Some(status),
            ..Default::default()
        }
    }

    /// Creates a new branch with the given name, `type` metadata and children.
    pub fn branch(name: impl Into<String>, type_tag: &str, items: Vec<Item>) -> Self {
        let mut item = Self::new(name);
        item.set_metadata(METADATA_TYPE_KEY, type_tag);
        item.items = items;
        item
    }

    /// Sets a metadata value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets a detail value.
    pub fn set_detail(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the `type` metadata of this item, if any.
    pub fn type_tag(&self) -> Option<&str> {
        self.metadata.get(METADATA_TYPE_KEY).map(String::as_str)
    }

    /// Returns the status of this item, treating an unset status as [`Status::Unknown`].
    pub fn status_or_unknown(&self) -> Status {
        self.status.clone().unwrap_or(Status::Unknown)
    }

    /// Returns true if this item has children.
    pub fn is_branch(&self) -> bool {
        !self.items.is_empty()
    }

    /// Returns true if the item has no name, status, children or metadata.
    ///
    /// Details are deliberately not considered.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.status.is_none()
            && self.items.is_empty()
            && self.metadata.is_empty()
    }

    /// Returns the first item, in pre-order, whose name is `name`.
    ///
    /// The root itself is considered, and an empty `name` always returns the root.
    pub fn get_subtree_by_name(&self, name: &str) -> Option<&Item> {
        if name.is_empty() || self.name == name {
            return Some(self);
        }
        self.items
            .iter()
            .find_map(|item| item.get_subtree_by_name(name))
    }

    /// Returns an iterator over the leaves of this tree, in pre-order.
    ///
    /// A tree with no children is its own only leaf.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }
}

/// Iterator over the leaves of an [`Item`] tree, returned by [`Item::leaves`].
#[derive(Clone, Debug)]
pub struct Leaves<'a> {
    stack: Vec<&'a Item>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(item) = self.stack.pop() {
            if item.items.is_empty() {
                return Some(item);
            }
            self.stack.extend(item.items.iter().rev());
        }
        None
    }
}

#[allow(clippy::ref_option)]
fn serialize_status<S: Serializer>(
    status: &Option<Status>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_ref().map_or("", Status::as_str))
}

fn deserialize_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Status>, D::Error> {
    let label = Option::<Scalar>::deserialize(deserializer)?;
    Ok(label.and_then(|label| Status::from_label(label.into_string())))
}

fn deserialize_string_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let map = Option::<BTreeMap<String, Scalar>>::deserialize(deserializer)?;
    Ok(map
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into_string()))
        .collect())
}

/// Hand-written result documents often contain numbers or booleans where strings are expected.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Null(()),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Null(()) => String::new(),
        }
    }
}
