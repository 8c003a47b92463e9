//! Generic PID (Proportional–Integral–Derivative) controller.
//!
//! The controller computes a corrective output from an error signal.  The
//! caller supplies the error and elapsed time and receives the output, which
//! it can turn into any motion command.  Path followers use it to steer on
//! heading error.
//!
//! # Example
//!
//! ```rust
//! use pilot_hal::pid::PidController;
//!
//! let mut pid = PidController::new(1.0, 0.1, 0.05);
//! pid.set_output_limits(-1.0, 1.0);
//!
//! let output = pid.update(0.5, 0.1); // error = 0.5 rad, dt = 100 ms
//! assert!(output > 0.0);
//! ```

/// A tunable PID controller for closed-loop feedback control.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    last_error: Option<f64>,
    output_min: f64,
    output_max: f64,
}

impl PidController {
    /// Create a new controller with the given gains.
    ///
    /// Output is unclamped by default.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            last_error: None,
            output_min: f64::NEG_INFINITY,
            output_max: f64::INFINITY,
        }
    }

    /// Update the proportional, integral, and derivative gains.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Clamp the controller output to `[min, max]`.
    ///
    /// Integral wind-up is also clamped to this range.
    pub fn set_output_limits(&mut self, min: f64, max: f64) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Compute the next controller output for `error` (set-point minus
    /// measurement).
    ///
    /// Returns `0.0` without updating internal state if `dt` is not positive.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return 0.0;
        }

        let p = self.kp * error;

        self.integral += error * dt;
        let i = (self.ki * self.integral).clamp(self.output_min, self.output_max);
        // Back-calculate so the accumulator never winds up past the limits.
        if self.ki.abs() > f64::EPSILON {
            self.integral = i / self.ki;
        }

        let d = match self.last_error {
            Some(prev) => self.kd * (error - prev) / dt,
            None => 0.0,
        };
        self.last_error = Some(error);

        (p + i + d).clamp(self.output_min, self.output_max)
    }

    /// Reset internal state (integral accumulator and derivative memory).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
    }
}
