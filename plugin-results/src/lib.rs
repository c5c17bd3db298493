// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Post-processing of diagnostic plugin output into a single result tree per plugin.
//!
//! Plugins write their output under `<results-dir>/plugins/<name>/results`, and any errors
//! captured while they ran under `<results-dir>/plugins/<name>/errors`. Plugins that run once per
//! cluster node have one subdirectory per node in each of these.
//!
//! [`post_process_plugin`] walks these directories, turns every eligible file into an [`Item`]
//! using a processor chosen by the plugin's declared [`ResultFormat`](plugin::ResultFormat), and
//! rolls the statuses of the items up into a status for the plugin as a whole. The resulting tree
//! can be written to, and read back from, the plugin's `sonobuoy_results.yaml` with the
//! functions in [`store`].

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod item;
pub mod plugin;
mod postprocess;
pub mod processors;
pub mod selector;
pub mod store;
pub mod summary;
pub mod walk;

pub use item::{Item, Status};
pub use postprocess::{PluginResults, post_process_plugin, select_processor};
