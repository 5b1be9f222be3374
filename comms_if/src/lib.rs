//! # Communications interface crate.
//!
//! Provides the message definitions exchanged between the drive software and
//! whatever transport carries them. Framing and sockets are not handled here,
//! only the decoded messages.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telemetry received from the vehicle
pub mod tlm;

/// Demands sent back to the vehicle
pub mod dems;
