//! Drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Params {

    // ---- STEERING CONTROLLER ----

    /// Steering controller proportional gain
    pub k_p: f64,

    /// Steering controller integral gain
    pub k_i: f64,

    /// Steering controller derivative gain
    pub k_d: f64,

    /// The cross track error the controller steers towards.
    ///
    /// Units: same as the telemetry CTE
    #[serde(default)]
    pub target_cte: f64,

    // ---- THROTTLE POLICY ----

    /// Absolute CTE above which the high error throttle is used.
    pub high_err_threshold: f64,

    /// Absolute CTE above which (up to `high_err_threshold`) the mid error
    /// throttle is used.
    pub mid_err_threshold: f64,

    /// Throttle demand when the error is high
    pub high_err_throttle: f64,

    /// Throttle demand when the error is between the two thresholds
    pub mid_err_throttle: f64,

    /// Throttle demand when the error is low
    pub low_err_throttle: f64
}

impl Default for Params {
    /// The reference tuning.
    fn default() -> Self {
        Self {
            k_p: 0.17,
            k_i: 0.00008,
            k_d: 1.1,
            target_cte: 0.0,
            high_err_threshold: 0.8,
            mid_err_threshold: 0.3,
            high_err_throttle: 0.05,
            mid_err_throttle: 0.1,
            low_err_throttle: 0.2
        }
    }
}
