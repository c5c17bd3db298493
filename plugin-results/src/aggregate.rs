// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling up child statuses into a parent status.
//!
//! There are two policies:
//!
//! * [`aggregate_status`] is the automatic rollup used for most result formats: failures bubble
//!   up through every level of the tree.
//! * [`manual_results_aggregation`] is used for plugins that supply their own result documents.
//!   It only produces a label for the wrapping summary and leaves the supplied statuses alone.

use crate::item::{Item, Status};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Computes the status of a parent from its children.
///
/// Branch children are resolved first, depth-first, and their `status` fields are overwritten
/// with the result. Children with no status are set to [`Status::Unknown`]. Then:
///
/// * if any child has a failure status (failed or timeout), the result is [`Status::Failed`];
/// * otherwise, if any child is unknown, the result is [`Status::Unknown`];
/// * otherwise the result is [`Status::Passed`].
///
/// With no children at all the result is [`Status::Unknown`], so that a plugin which produced
/// nothing is not reported as passing.
pub fn aggregate_status(items: &mut [Item]) -> Status {
    if items.is_empty() {
        return Status::Unknown;
    }

    let mut failed_found = false;
    let mut unknown_found = false;
    // Every child must be resolved, so don't return early.
    for item in items.iter_mut() {
        if item.is_branch() {
            item.status = Some(aggregate_status(&mut item.items));
        }

        let status = item.status.get_or_insert(Status::Unknown);
        if status.is_failure() {
            failed_found = true;
        } else if *status == Status::Unknown {
            unknown_found = true;
        }
    }

    if failed_found {
        Status::Failed
    } else if unknown_found {
        Status::Unknown
    } else {
        Status::Passed
    }
}

/// Computes a summary label for plugin-supplied results.
///
/// Grandchildren are not looked at and failures get no special treatment. If every item has the
/// same status, that status is returned as-is (custom labels included). Otherwise a digest of
/// the counts is returned, sorted by label, e.g. `"custom msg: 1, failed: 2, passed: 3"`.
///
/// With no items the result is [`Status::Unknown`].
pub fn manual_results_aggregation<'a>(items: impl IntoIterator<Item = &'a Item>) -> Status {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for item in items {
        let label = item.status.as_ref().map_or("unknown", Status::as_str);
        *counts.entry(label.to_owned()).or_default() += 1;
    }

    let mut labels = counts.keys();
    match (labels.next(), labels.next()) {
        (None, _) => Status::Unknown,
        (Some(only), None) => Status::from_label(only.as_str()).unwrap_or(Status::Unknown),
        _ => Status::Custom(
            counts
                .iter()
                .map(|(label, count)| format!("{label}: {count}"))
                .join(", "),
        ),
    }
}
