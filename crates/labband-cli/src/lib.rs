//! Library components of the `labband` command-line harness.

pub mod logging;
pub mod settings;
