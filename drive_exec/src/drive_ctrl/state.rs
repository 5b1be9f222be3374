//! Drive control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::*;
use crate::pid_ctrl::PidController;
use comms_if::{dems::DriveDems, tlm::TlmEvent};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    params: Params,

    /// The steering controller, owned exclusively by this module
    pid: PidController,

    /// Number of cycles processed so far, including manual ones
    num_cycles: u64,

    report: StatusReport,
    arch_report: Archiver,
    arch_pid: Archiver
}

/// The status report for one cycle of drive control.
#[derive(Debug, Default, Copy, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    /// Index of the cycle this report belongs to
    pub cycle: u64,

    /// True if the vehicle provided no telemetry this cycle
    pub manual: bool,

    /// The raw CTE sample
    pub cte: f64,

    /// Vehicle speed reported alongside the sample
    pub speed: f64,

    /// Output of the steering controller
    pub total_error: f64,

    /// The steering demand issued
    pub steer_dem: f64,

    /// The throttle demand issued
    pub throttle_dem: f64,

    /// If true the steering demand was saturated
    pub steer_limited: bool,

    /// The throttle tier selected from the CTE
    pub throttle_tier: ThrottleTier
}

/// A snapshot of the module, written at the end of a session.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub num_cycles: u64,
    pub params: Params,
    pub pid: PidController
}

/// Archive row for the controller's internal state
#[derive(Serialize)]
struct PidRecord {
    cycle: u64,
    k_p: f64,
    k_i: f64,
    k_d: f64,
    error_p: f64,
    error_i: f64,
    error_d: f64,
    total_error: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Create the module from already loaded parameters, without any
    /// archiving.
    pub fn new(params: Params) -> Self {
        let pid = PidController::new(params.k_p, params.k_i, params.k_d);

        Self {
            params,
            pid,
            ..Default::default()
        }
    }

    /// The parameters the module was built with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The steering controller.
    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            num_cycles: self.num_cycles,
            params: self.params.clone(),
            pid: self.pid
        }
    }
}

impl State for DriveCtrl {
    type InitData = String;
    type InitError = DriveCtrlError;

    type InputData = TlmEvent;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the path to the parameter file, relative to the
    /// params directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters and rebuild the controller from them
        let params: Params = params::load(&init_data)
            .map_err(DriveCtrlError::ParamLoadError)?;
        *self = Self::new(params);

        // Initialise the archivers
        self.arch_report = Archiver::from_path(
            session, "drive_ctrl/status_report.csv"
        ).map_err(DriveCtrlError::ArchiveInitError)?;
        self.arch_pid = Archiver::from_path(
            session, "drive_ctrl/pid_state.csv"
        ).map_err(DriveCtrlError::ArchiveInitError)?;

        Ok(())
    }

    /// Process one tick of drive control.
    ///
    /// Manual events leave the controller untouched.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport {
            cycle: self.num_cycles,
            ..Default::default()
        };
        self.num_cycles += 1;

        let tlm = match input_data {
            TlmEvent::Telemetry(t) => t,
            TlmEvent::Manual => {
                self.report.manual = true;
                debug!("No telemetry, requesting manual control");
                return Ok((DriveDems::Manual, self.report))
            }
        };

        // Step the controller
        self.pid.update_error(tlm.cte);
        let total_error = self.pid.total_error();

        // Calculate the demands
        let (steer_dem, steer_limited) = calc_steer(
            total_error, self.params.target_cte
        );
        let (throttle_dem, throttle_tier) = calc_throttle(tlm.cte, &self.params);

        debug!(
            "CTE: {} Steering Value: {} Throttle Value: {} Speed: {}",
            tlm.cte, steer_dem, throttle_dem, tlm.speed
        );

        self.report.cte = tlm.cte;
        self.report.speed = tlm.speed;
        self.report.total_error = total_error;
        self.report.steer_dem = steer_dem;
        self.report.throttle_dem = throttle_dem;
        self.report.steer_limited = steer_limited;
        self.report.throttle_tier = throttle_tier;

        Ok((
            DriveDems::Steer {
                steering_angle: steer_dem,
                throttle: throttle_dem
            },
            self.report
        ))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), util::archive::ArchiveError> {
        self.arch_report.serialise(self.report)?;
        self.arch_pid.serialise(PidRecord {
            cycle: self.report.cycle,
            k_p: self.pid.gains().0,
            k_i: self.pid.gains().1,
            k_d: self.pid.gains().2,
            error_p: self.pid.error_p(),
            error_i: self.pid.error_i(),
            error_d: self.pid.error_d(),
            total_error: self.pid.total_error()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tlm::Telemetry;

    const EPS: f64 = 1e-12;

    fn tlm(cte: f64) -> TlmEvent {
        TlmEvent::Telemetry(Telemetry {
            cte,
            speed: 10.0,
            steering_angle: 0.0
        })
    }

    #[test]
    fn test_reference_tick() {
        let mut dc = DriveCtrl::new(Params::default());

        let (dems, report) = dc.proc(&tlm(1.0)).unwrap();

        // Total error is 1.27008, which saturates the steering
        assert!((report.total_error - 1.27008).abs() < EPS);
        assert_eq!(
            dems,
            DriveDems::Steer { steering_angle: -1.0, throttle: 0.05 }
        );
        assert!(report.steer_limited);
        assert_eq!(report.throttle_tier, ThrottleTier::High);
        assert_eq!(report.cycle, 0);
        assert!(!report.manual);
    }

    #[test]
    fn test_steer_follows_controller() {
        let params = Params {
            k_p: 1.0,
            k_i: 0.0,
            k_d: 0.0,
            ..Default::default()
        };
        let mut dc = DriveCtrl::new(params);

        let (dems, report) = dc.proc(&tlm(0.5)).unwrap();
        assert_eq!(dems, DriveDems::Steer { steering_angle: -0.5, throttle: 0.1 });
        assert!(!report.steer_limited);

        let (dems, _) = dc.proc(&tlm(-0.1)).unwrap();
        assert_eq!(dems, DriveDems::Steer { steering_angle: 0.1, throttle: 0.2 });

        let (dems, report) = dc.proc(&tlm(-2.0)).unwrap();
        assert_eq!(dems, DriveDems::Steer { steering_angle: 1.0, throttle: 0.05 });
        assert!(report.steer_limited);
        assert_eq!(report.cycle, 2);
        assert_eq!(dc.num_cycles(), 3);
    }

    #[test]
    fn test_manual_leaves_controller_untouched() {
        let mut dc = DriveCtrl::new(Params::default());
        dc.proc(&tlm(0.4)).unwrap();
        let before = *dc.pid();

        let (dems, report) = dc.proc(&TlmEvent::Manual).unwrap();
        assert_eq!(dems, DriveDems::Manual);
        assert!(report.manual);
        assert_eq!(report.cycle, 1);
        assert_eq!(*dc.pid(), before);

        // The derivative is still taken against the last real sample
        dc.proc(&tlm(0.6)).unwrap();
        assert!((dc.pid().error_d() - 0.2).abs() < EPS);
    }

    #[test]
    fn test_snapshot() {
        let mut dc = DriveCtrl::new(Params::default());
        dc.proc(&tlm(0.2)).unwrap();
        dc.proc(&tlm(0.3)).unwrap();

        let snap = dc.snapshot();
        assert_eq!(snap.num_cycles, 2);
        assert_eq!(snap.params, Params::default());
        assert_eq!(&snap.params, dc.params());
        assert!((snap.pid.error_i() - 0.5).abs() < EPS);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["pid"]["k_p"], 0.17);
    }

    #[test]
    fn test_write_without_init() {
        let mut dc = DriveCtrl::new(Params::default());
        dc.proc(&tlm(0.2)).unwrap();
        assert!(dc.write().is_err());
    }
}
