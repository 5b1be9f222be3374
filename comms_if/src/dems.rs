//! # Drive demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands issued to the vehicle for one tick.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum DriveDems {
    /// Closed loop steering and throttle.
    Steer {
        /// Normalised steering command in [-1, 1].
        steering_angle: f64,

        /// Throttle command.
        throttle: f64,
    },

    /// Hand control back to the driver, sent when the vehicle provided no
    /// telemetry.
    Manual,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Serialise the demands into a single-line JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
