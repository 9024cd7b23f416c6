//! Heading hold: keeps the frame on a yaw setpoint while driving, by feeding a turn
//! correction into the coupled arcade mix.
//!
//! Yaw is counter-clockwise positive and a positive turn command turns clockwise, so a
//! right-hand stick lowers the setpoint.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{driver::HeadingSensor, error::ConfigurationError};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingHoldConfig {
    /// Turn command per degree (straight hold) or per degree/sec (teleop damping).
    pub align_gain: f64,
    /// Degrees of setpoint change per tick at full turn stick.
    pub stick_to_yaw_rate: f64,
    /// Drift trims. Positive values add counter-clockwise correction when going forward;
    /// the velocity trim multiplies in/s so it stays small.
    pub yaw_correct_velocity: f64,
    pub yaw_correct_accel: f64,
}

impl Default for HeadingHoldConfig {
    fn default() -> Self {
        Self {
            align_gain: 0.04,
            stick_to_yaw_rate: 0.3,
            yaw_correct_velocity: 0.0,
            yaw_correct_accel: 0.0,
        }
    }
}

impl HeadingHoldConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_fraction("align_gain", self.align_gain)?;
        ConfigurationError::check_positive("stick_to_yaw_rate", self.stick_to_yaw_rate)?;
        if !self.yaw_correct_velocity.is_finite() {
            return Err(ConfigurationError::NonFinite { field: "yaw_correct_velocity" });
        }
        if !self.yaw_correct_accel.is_finite() {
            return Err(ConfigurationError::NonFinite { field: "yaw_correct_accel" });
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HoldOutput {
    /// No drive input this tick; the caller should zero the motors.
    Idle,
    /// Turn command to feed into the coupled arcade mix.
    Turn(f64),
}

pub struct HeadingHold {
    config: HeadingHoldConfig,
    yaw_setpoint: f64,
    armed: bool,
}

impl HeadingHold {
    pub fn new(config: HeadingHoldConfig) -> Self {
        Self { config, yaw_setpoint: 0.0, armed: false }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Captures the current yaw as the setpoint. Only the first call after [`disarm`] takes
    /// effect; later calls keep the setpoint already being held.
    ///
    /// [`disarm`]: HeadingHold::disarm
    pub fn arm<S: HeadingSensor>(&mut self, sensor: &S) {
        if self.armed {
            return;
        }
        self.yaw_setpoint = sensor.yaw_deg();
        self.armed = true;
        debug!("heading hold armed at {:.2} deg", self.yaw_setpoint);
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn drift_correction(&self, forward_velocity_ips: f64, forward_current: f64) -> f64 {
        self.config.yaw_correct_velocity * forward_velocity_ips
            + self.config.yaw_correct_accel * forward_current
    }

    /// Setpoint-tracking error as the teleop path computes it. The teleop output is driven by
    /// yaw rate alone, so this is only published.
    pub fn setpoint_error<S: HeadingSensor>(&self, sensor: &S) -> f64 {
        -self.config.align_gain * (self.yaw_setpoint - sensor.yaw_deg())
    }

    /// One teleop tick with shaped sticks. Moves the setpoint with the turn stick and damps
    /// the frame's rotation rate.
    pub fn tick<S: HeadingSensor>(
        &mut self,
        forward: f64,
        turn: f64,
        sensor: &S,
        drift: f64,
    ) -> HoldOutput {
        if forward == 0.0 && turn == 0.0 {
            return HoldOutput::Idle;
        }
        self.yaw_setpoint += -self.config.stick_to_yaw_rate * turn;
        let correction = self.config.align_gain * sensor.yaw_rate_deg_per_sec();
        HoldOutput::Turn(correction + drift)
    }

    /// Autonomous straight-line hold on the armed setpoint.
    pub fn hold_straight<S: HeadingSensor>(&self, forward: f64, sensor: &S, drift: f64) -> HoldOutput {
        if forward == 0.0 {
            return HoldOutput::Idle;
        }
        let error = self.config.align_gain * (self.yaw_setpoint - sensor.yaw_deg());
        HoldOutput::Turn(error + drift)
    }
}
