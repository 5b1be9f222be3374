//! # Drive control module
//!
//! Drive control keeps the vehicle on its target path by steering against the
//! cross track error (CTE). Each tick the CTE sample is passed through a
//! `PidController`, and the steering demand is the target CTE minus the
//! controller's total error, saturated to the actuator range of [-1, 1].
//!
//! Throttle is chosen from three tiers using the magnitude of the raw CTE
//! sample (not the controller output): the further off the path the vehicle
//! is the slower it drives.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use state::*;
use util::{archive::ArchiveError, maths::clamp, params::LoadError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum steering demand.
pub const MIN_STEER_DEM: f64 = -1.0;

/// Maximum steering demand.
pub const MAX_STEER_DEM: f64 = 1.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not set up the archives: {0}")]
    ArchiveInitError(ArchiveError),
}

/// The throttle tier selected for a tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum ThrottleTier {
    Low,
    Mid,
    High
}

impl Default for ThrottleTier {
    fn default() -> Self {
        ThrottleTier::Low
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the steering demand from the controller's total error.
///
/// Returns the demand and whether it had to be saturated. A NaN total error
/// gives a NaN demand, which is not reported as saturated.
pub fn calc_steer(total_error: f64, target_cte: f64) -> (f64, bool) {
    let raw = target_cte - total_error;
    let dem = clamp(&raw, &MIN_STEER_DEM, &MAX_STEER_DEM);

    (dem, dem != raw && !raw.is_nan())
}

/// Select the throttle demand from the raw CTE sample.
///
/// Both thresholds are strict, a CTE exactly on a threshold falls into the
/// lower tier.
pub fn calc_throttle(cte: f64, params: &Params) -> (f64, ThrottleTier) {
    let abs_cte = cte.abs();

    if abs_cte > params.high_err_threshold {
        (params.high_err_throttle, ThrottleTier::High)
    }
    else if abs_cte > params.mid_err_threshold {
        (params.mid_err_throttle, ThrottleTier::Mid)
    }
    else {
        (params.low_err_throttle, ThrottleTier::Low)
    }
}
