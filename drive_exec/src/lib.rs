//! # Drive library.
//!
//! This library allows other crates in the workspace, and the integration
//! tests, to access items defined inside the drive crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// PID controller - turns an error signal into a weighted correction
pub mod pid_ctrl;

/// Drive control module - converts cross track error into steering and throttle demands
pub mod drive_ctrl;

/// Telemetry replay - feeds recorded telemetry through drive control
pub mod replay;
