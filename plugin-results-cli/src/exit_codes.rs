// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `plugin-results` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ResultsExitCode {}

impl ResultsExitCode {
    /// No errors occurred and plugin-results exited normally.
    pub const OK: i32 = 0;

    /// Post-processing completed, but some results or errors directories could not be read. The
    /// trees that were written may be incomplete.
    pub const PROCESSING_ERRORS: i32 = 3;

    /// The node passed to `show --node` does not exist in the results tree.
    pub const NODE_NOT_FOUND: i32 = 4;

    /// A post-processed results file could not be read.
    pub const READ_RESULTS_FAILED: i32 = 5;

    /// A post-processed results file could not be written.
    pub const WRITE_RESULTS_FAILED: i32 = 6;

    /// A user issue happened while setting up a plugin-results invocation, such as an invalid
    /// config file.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
