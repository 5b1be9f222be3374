//! # Telemetry replay
//!
//! Drives `DriveCtrl` from a recorded telemetry stream. The stream holds one
//! JSON event per line: a telemetry object, or `null`/`{}` for a cycle where
//! the vehicle sent no data. For every event one line of JSON demands is
//! written to the sink, in order.
//!
//! Blank lines are ignored. Lines that can't be parsed are logged and skipped
//! without stepping the controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io::{BufRead, Write};
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use comms_if::{dems::DriveDems, tlm::TlmEvent};
use util::{archive::ArchiveError, module::State};

use crate::drive_ctrl::{DriveCtrl, DriveCtrlError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Counters describing a completed replay.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Number of telemetry samples the controller acted on
    pub num_ticks: u64,

    /// Number of manual events
    pub num_manual: u64,

    /// Number of ticks where the steering demand was saturated
    pub num_steer_limited: u64,

    /// Number of lines which could not be parsed
    pub num_skipped: u64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Could not read from the telemetry source: {0}")]
    ReadError(std::io::Error),

    #[error("Could not write demands to the sink: {0}")]
    WriteError(std::io::Error),

    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("DriveCtrl processing failed: {0}")]
    ProcError(DriveCtrlError),

    #[error("Could not archive the cycle: {0}")]
    ArchiveError(ArchiveError)
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Replay every event in `source` through `drive_ctrl`, writing the demands
/// to `sink`.
///
/// `on_cycle` is called after each processed event, with the module holding
/// that cycle's report.
pub fn run_replay<R, W, F>(
    source: R,
    drive_ctrl: &mut DriveCtrl,
    sink: &mut W,
    mut on_cycle: F
) -> Result<ReplaySummary, ReplayError>
where
    R: BufRead,
    W: Write,
    F: FnMut(&mut DriveCtrl) -> Result<(), ReplayError>
{
    let mut summary = ReplaySummary::default();

    // Split on raw bytes so one corrupt line doesn't end the replay
    for (i, line) in source.split(b'\n').enumerate() {
        let line = line.map_err(ReplayError::ReadError)?;

        let line = match std::str::from_utf8(&line) {
            Ok(l) => l,
            Err(e) => {
                warn!("Skipping line {}: not valid UTF-8 ({})", i + 1, e);
                summary.num_skipped += 1;
                continue
            }
        };

        if line.trim().is_empty() {
            continue
        }

        let event = match TlmEvent::from_json(line) {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping line {}: {}", i + 1, e);
                summary.num_skipped += 1;
                continue
            }
        };

        let (dems, report) = drive_ctrl.proc(&event)
            .map_err(ReplayError::ProcError)?;

        match dems {
            DriveDems::Manual => summary.num_manual += 1,
            DriveDems::Steer { .. } => summary.num_ticks += 1
        }
        if report.steer_limited {
            summary.num_steer_limited += 1;
        }

        let json = dems.to_json().map_err(ReplayError::SerializationError)?;
        writeln!(sink, "{}", json).map_err(ReplayError::WriteError)?;

        on_cycle(drive_ctrl)?;
    }

    sink.flush().map_err(ReplayError::WriteError)?;

    info!(
        "Replay complete: {} ticks, {} manual, {} steering limited, {} skipped",
        summary.num_ticks,
        summary.num_manual,
        summary.num_steer_limited,
        summary.num_skipped
    );

    Ok(summary)
}
