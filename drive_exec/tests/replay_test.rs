//! Integration tests for replaying telemetry through drive control.

use std::io::Cursor;

use comms_if::dems::DriveDems;
use drive_lib::{
    drive_ctrl::{DriveCtrl, Params},
    replay::{run_replay, ReplayError, ReplaySummary},
};

const EPS: f64 = 1e-12;

fn parse_dems(out: &[u8]) -> Vec<DriveDems> {
    String::from_utf8(out.to_vec())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_mixed_stream() {
    let tlm = r#"{"cte":"0.1","speed":"5.0","steering_angle":"0.0"}

null
{"cte": 0.5}
this is not telemetry
{}
{"cte":"-2.0","speed":"6.5"}
"#;

    let mut drive_ctrl = DriveCtrl::new(Params::default());
    let mut out = Vec::new();
    let mut num_callbacks = 0;

    let summary = run_replay(Cursor::new(tlm), &mut drive_ctrl, &mut out, |_| {
        num_callbacks += 1;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        summary,
        ReplaySummary {
            num_ticks: 3,
            num_manual: 2,
            num_steer_limited: 1,
            num_skipped: 1
        }
    );
    assert_eq!(num_callbacks, 5);
    assert_eq!(drive_ctrl.num_cycles(), 5);

    let dems = parse_dems(&out);
    assert_eq!(dems.len(), 5);

    // First tick: total error = (0.17 + 0.00008 + 1.1) * 0.1
    match dems[0] {
        DriveDems::Steer { steering_angle, throttle } => {
            assert!((steering_angle + 0.127008).abs() < EPS);
            assert_eq!(throttle, 0.2);
        }
        d => panic!("Expected steer demands, got {:?}", d),
    }

    assert_eq!(dems[1], DriveDems::Manual);

    // Second tick: p = 0.5, i = 0.6, d = 0.4
    match dems[2] {
        DriveDems::Steer { steering_angle, throttle } => {
            let total = 0.17 * 0.5 + 0.00008 * 0.6 + 1.1 * 0.4;
            assert!((steering_angle + total).abs() < EPS);
            assert_eq!(throttle, 0.1);
        }
        d => panic!("Expected steer demands, got {:?}", d),
    }

    assert_eq!(dems[3], DriveDems::Manual);

    // Final tick swings hard the other way and saturates
    assert_eq!(
        dems[4],
        DriveDems::Steer {
            steering_angle: 1.0,
            throttle: 0.05
        }
    );

    let pid = drive_ctrl.pid();
    assert_eq!(pid.error_p(), -2.0);
    assert!((pid.error_i() - (-1.4)).abs() < EPS);
    assert!((pid.error_d() - (-2.5)).abs() < EPS);
}

#[test]
fn test_empty_stream() {
    let mut drive_ctrl = DriveCtrl::new(Params::default());
    let mut out = Vec::new();

    let summary = run_replay(Cursor::new(""), &mut drive_ctrl, &mut out, |_| Ok(())).unwrap();

    assert_eq!(summary, ReplaySummary::default());
    assert!(out.is_empty());
    assert_eq!(drive_ctrl.pid().total_error(), 0.0);
}

#[test]
fn test_callback_error_stops_replay() {
    let tlm = "{\"cte\": 0.1}\n{\"cte\": 0.2}\n";

    let mut drive_ctrl = DriveCtrl::new(Params::default());
    let mut out = Vec::new();

    // Archiving without a session fails, which must abort the replay
    let result = run_replay(Cursor::new(tlm), &mut drive_ctrl, &mut out, |dc| {
        use util::archive::Archived;
        dc.write().map_err(ReplayError::ArchiveError)
    });

    assert!(matches!(result, Err(ReplayError::ArchiveError(_))));
    assert_eq!(drive_ctrl.num_cycles(), 1);
    assert_eq!(parse_dems(&out).len(), 1);
}

#[test]
fn test_corrupt_lines_are_skipped() {
    let mut tlm = b"{\"cte\":0.1}\n".to_vec();
    tlm.extend_from_slice(b"\xff\xfe\n");
    tlm.extend_from_slice(b"[0.5]\n");
    tlm.extend_from_slice(b"{\"cte\":0.2}\r\n");

    let mut drive_ctrl = DriveCtrl::new(Params::default());
    let mut out = Vec::new();

    let summary = run_replay(Cursor::new(tlm), &mut drive_ctrl, &mut out, |_| Ok(())).unwrap();

    assert_eq!(
        summary,
        ReplaySummary {
            num_ticks: 2,
            num_manual: 0,
            num_steer_limited: 0,
            num_skipped: 2
        }
    );
    assert_eq!(drive_ctrl.num_cycles(), 2);
    assert_eq!(parse_dems(&out).len(), 2);

    // Only the two valid samples reached the controller
    let pid = drive_ctrl.pid();
    assert_eq!(pid.error_p(), 0.2);
    assert!((pid.error_i() - 0.3).abs() < EPS);
    assert!((pid.error_d() - 0.1).abs() < EPS);
}
