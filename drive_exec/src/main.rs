//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and DriveCtrl
//!     - Replay loop, once per telemetry event:
//!         - Telemetry decoding
//!         - Drive control processing
//!         - Demand output
//!         - Archiving
//!     - Save the final controller state and exit the session
//!
//! # Modules
//!
//! All modules (e.g. `drive_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use structopt::StructOpt;

// Internal
use drive_lib::{
    drive_ctrl::DriveCtrl,
    replay::{run_replay, ReplayError}
};
use util::{
    archive::Archived,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Steer a vehicle along its path from recorded cross track error telemetry.
#[derive(Debug, StructOpt)]
#[structopt(name = "drive_exec")]
struct Opt {
    /// Parameter file for DriveCtrl, relative to the params directory.
    #[structopt(long, default_value = "drive_ctrl.toml")]
    params: String,

    /// Seconds between cycles. If not given the telemetry is replayed as fast
    /// as possible.
    #[structopt(long)]
    period_s: Option<f64>,

    /// Write the demands to this file instead of stdout.
    #[structopt(long, parse(from_os_str))]
    out: Option<PathBuf>,

    /// Telemetry file holding one JSON event per line.
    #[structopt(parse(from_os_str))]
    tlm_path: PathBuf
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("CTE Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    let period = parse_period(opt.period_s)?;

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut drive_ctrl = DriveCtrl::default();
    drive_ctrl.init(opt.params.clone(), &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");
    info!("    Params: {:?}", drive_ctrl.params());

    info!("Module initialisation complete\n");

    // ---- OPEN TELEMETRY AND OUTPUT ----

    let source = BufReader::new(
        File::open(&opt.tlm_path)
            .wrap_err_with(|| format!("Could not open telemetry file {:?}", opt.tlm_path))?
    );

    let mut sink: Box<dyn Write> = match opt.out {
        Some(ref p) => Box::new(BufWriter::new(
            File::create(p)
                .wrap_err_with(|| format!("Could not create output file {:?}", p))?
        )),
        None => Box::new(io::stdout())
    };

    // ---- MAIN LOOP ----

    info!("Begining replay of {:?}\n", opt.tlm_path);

    let mut cycle_start_instant = Instant::now();

    let summary = run_replay(source, &mut drive_ctrl, &mut sink, |dc| {
        dc.write().map_err(ReplayError::ArchiveError)?;

        // Hold the cycle until the period has elapsed
        if let Some(p) = period {
            let cycle_dur = Instant::now() - cycle_start_instant;
            if cycle_dur < p {
                thread::sleep(p - cycle_dur);
            }
        }
        cycle_start_instant = Instant::now();

        Ok(())
    }).wrap_err("Replay failed")?;

    // ---- SHUTDOWN ----

    info!("    Final controller state: {:?}", drive_ctrl.pid());

    session.save("drive_ctrl/final_state.json", drive_ctrl.snapshot());
    session.save("replay_summary.json", summary);

    session.exit();

    Ok(())
}

/// Convert the optional cycle period into a duration.
///
/// Negative, NaN and too large periods are rejected rather than panicking.
fn parse_period(period_s: Option<f64>) -> Result<Option<Duration>, Report> {
    match period_s {
        Some(p) => Duration::try_from_secs_f64(p)
            .map(Some)
            .map_err(|e| eyre!(
                "Expected a non-negative cycle period, found {} ({})", p, e
            )),
        None => Ok(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period(None).unwrap(), None);
        assert_eq!(parse_period(Some(0.0)).unwrap(), Some(Duration::from_secs(0)));
        assert_eq!(parse_period(Some(0.5)).unwrap(), Some(Duration::from_millis(500)));

        assert!(parse_period(Some(-1.0)).is_err());
        assert!(parse_period(Some(f64::NAN)).is_err());
        assert!(parse_period(Some(f64::INFINITY)).is_err());
        assert!(parse_period(Some(1e20)).is_err());
    }
}
