// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for post-processing diagnostic plugin results.
//!
//! `plugin-results postprocess` builds a result tree for every plugin under a results directory
//! and writes it next to the plugin's output; `plugin-results show` prints a tree written
//! earlier.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::ResultsExitCode;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
