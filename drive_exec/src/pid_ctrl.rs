//! # PID controller
//!
//! Converts a stream of error samples (one per tick) into a gain-weighted
//! correction. There is no notion of time in this controller, each call to
//! `update_error` is one tick, so the integral is a plain sum of samples and
//! the derivative a plain difference between consecutive samples.
//!
//! No anti-windup is applied, the integral accumulator grows without bound
//! under a persistent bias until `reset` is called.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// The most recent error sample
    error_p: f64,

    /// Sum of every error sample since creation or the last reset
    error_i: f64,

    /// Difference between the most recent sample and the one before it
    error_d: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    ///
    /// Gains are not validated, any sign or magnitude is accepted.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            error_p: 0f64,
            error_i: 0f64,
            error_d: 0f64
        }
    }

    /// Update the error terms with a new sample.
    pub fn update_error(&mut self, error: f64) {
        // The order here matters: the derivative must be taken against the
        // previous sample, which is still held in `error_p`.
        self.error_i += error;
        self.error_d = error - self.error_p;
        self.error_p = error;
    }

    /// Get the weighted sum of the error terms.
    pub fn total_error(&self) -> f64 {
        self.k_p * self.error_p
        + self.k_i * self.error_i
        + self.k_d * self.error_d
    }

    /// Change the gains, keeping the accumulated error terms.
    pub fn retune(&mut self, k_p: f64, k_i: f64, k_d: f64) {
        self.k_p = k_p;
        self.k_i = k_i;
        self.k_d = k_d;
    }

    /// Clear the accumulated error terms, keeping the gains.
    pub fn reset(&mut self) {
        self.error_p = 0f64;
        self.error_i = 0f64;
        self.error_d = 0f64;
    }

    /// The `(k_p, k_i, k_d)` gains.
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.k_p, self.k_i, self.k_d)
    }

    pub fn error_p(&self) -> f64 {
        self.error_p
    }

    pub fn error_i(&self) -> f64 {
        self.error_i
    }

    pub fn error_d(&self) -> f64 {
        self.error_d
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-12;

    fn run(gains: (f64, f64, f64), samples: &[f64]) -> PidController {
        let mut pid = PidController::new(gains.0, gains.1, gains.2);
        for s in samples {
            pid.update_error(*s);
        }
        pid
    }

    #[test]
    fn test_new_is_zeroed() {
        let pid = PidController::new(0.17, 0.00008, 1.1);
        assert_eq!(pid.gains(), (0.17, 0.00008, 1.1));
        assert_eq!(pid.error_p(), 0.0);
        assert_eq!(pid.error_i(), 0.0);
        assert_eq!(pid.error_d(), 0.0);
        assert_eq!(pid.total_error(), 0.0);
    }

    #[test]
    fn test_zero_gains() {
        let pid = run((0.0, 0.0, 0.0), &[0.5, -3.0, 12.0, 1e6]);
        assert_eq!(pid.total_error(), 0.0);
    }

    #[test]
    fn test_single_update() {
        let (k_p, k_i, k_d) = (0.3, 0.02, 2.0);
        let c = 0.7;
        let pid = run((k_p, k_i, k_d), &[c]);

        assert_eq!(pid.error_p(), c);
        assert_eq!(pid.error_i(), c);
        assert_eq!(pid.error_d(), c);
        assert!((pid.total_error() - (k_p + k_i + k_d) * c).abs() < EPS);
    }

    #[test]
    fn test_two_updates() {
        let pid = run((1.0, 1.0, 1.0), &[0.4, -0.1]);

        assert_eq!(pid.error_p(), -0.1);
        assert!((pid.error_i() - 0.3).abs() < EPS);
        assert!((pid.error_d() - (-0.5)).abs() < EPS);
    }

    #[test]
    fn test_integral_never_resets_itself() {
        let mut pid = PidController::new(0.0, 1.0, 0.0);
        let mut last = 0f64;

        for s in &[0.1, 0.5, 0.0, 2.0, 0.3] {
            pid.update_error(*s);
            assert!(pid.error_i().abs() >= last.abs());
            last = pid.error_i();
        }

        let mut pid = PidController::new(0.0, 1.0, 0.0);
        let mut last = 0f64;
        for s in &[-0.1, -0.5, -2.0] {
            pid.update_error(*s);
            assert!(pid.error_i().abs() >= last.abs());
            last = pid.error_i();
        }
    }

    #[test]
    fn test_proportional_only() {
        let pid = run((1.0, 0.0, 0.0), &[0.5]);
        assert!((pid.total_error() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_integral_only() {
        let pid = run((0.0, 1.0, 0.0), &[0.2, 0.3]);
        assert!((pid.total_error() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_derivative_only() {
        let pid = run((0.0, 0.0, 1.0), &[0.2, 0.5]);
        assert!((pid.total_error() - 0.3).abs() < EPS);
    }

    #[test]
    fn test_reference_tuning() {
        let pid = run((0.17, 0.00008, 1.1), &[1.0]);
        assert!((pid.total_error() - 1.27008).abs() < EPS);
    }

    #[test]
    fn test_non_finite_propagates() {
        let pid = run((1.0, 1.0, 1.0), &[f64::NAN]);
        assert!(pid.total_error().is_nan());

        let pid = run((1.0, 0.0, 0.0), &[f64::INFINITY]);
        assert_eq!(pid.total_error(), f64::INFINITY);
    }

    #[test]
    fn test_reset_and_retune() {
        let mut pid = run((1.0, 1.0, 1.0), &[0.2, 0.4]);

        pid.retune(0.0, 2.0, 0.0);
        assert_eq!(pid.gains(), (0.0, 2.0, 0.0));
        assert!((pid.total_error() - 1.2).abs() < EPS);

        pid.reset();
        assert_eq!(pid.gains(), (0.0, 2.0, 0.0));
        assert_eq!(pid.total_error(), 0.0);

        // After a reset the derivative is taken against zero again
        pid.retune(0.0, 0.0, 1.0);
        pid.update_error(0.25);
        assert_eq!(pid.error_d(), 0.25);
    }
}
