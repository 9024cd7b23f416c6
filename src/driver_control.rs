use log::debug;

use super::chassis::Chassis;
use crate::{
    drive_mode::{DriveCommand, coupled_arcade},
    driver::{HeadingSensor, MotorController},
    error::DriverError,
    heading::HoldOutput,
    telemetry::Telemetry,
    utils::shape_axis,
};

impl<M: MotorController, S: HeadingSensor, T: Telemetry> Chassis<M, S, T> {
    pub fn low_sensitivity(&self) -> bool {
        self.low_sensitivity
    }

    pub fn set_low_sensitivity(&mut self, enabled: bool) {
        self.low_sensitivity = enabled;
    }

    /// One teleop tick in the selected drive style. `forward` and `turn` are raw stick axes in
    /// [-1,1], positive forward and right.
    pub fn drive(&mut self, forward: f64, turn: f64) -> Result<(), DriverError> {
        let mut speed = self.config.forward_scale.rescale(forward);
        let mut turn = self.config.turn_scale.rescale(turn);
        self.telemetry.put_number("drive/speed_factor", speed);
        self.telemetry.put_number("drive/turn_factor", turn);

        if self.low_sensitivity {
            speed *= self.config.low_sensitivity_gain;
            turn *= self.config.low_sensitivity_gain;
        }

        let command = self.modes.compute(speed, turn);
        debug!("drive {:?}: {speed:.3} {turn:.3} -> {command:?}", self.modes.style());
        self.apply(command)
    }

    /// Closed-loop velocity drive: `vel` in in/s, `omega` in rad/s.
    pub fn velocity_drive(&mut self, vel: f64, omega: f64) -> Result<(), DriverError> {
        let (left, right) = self.modes.velocity_targets(vel, omega);
        self.telemetry.put_number("drive/left_velocity_target", left);
        self.telemetry.put_number("drive/right_velocity_target", right);
        self.apply(DriveCommand::velocity(left, right))
    }

    /// Arms the heading hold when alignment driving starts and releases it when it ends.
    pub fn set_align_drive(&mut self, start: bool) {
        if start {
            self.heading.arm(&self.imu);
        } else {
            self.heading.disarm();
        }
    }

    /// Teleop drive with heading hold. The turn stick nudges the held heading instead of
    /// steering directly; with both sticks centred the drive stops.
    pub fn align_drive(&mut self, forward: f64, turn: f64) -> Result<(), DriverError> {
        let forward = if self.low_sensitivity {
            forward * self.config.low_sensitivity_gain
        } else {
            forward
        };
        let forward = shape_axis(forward);
        let turn = shape_axis(turn);

        let drift = self.heading.drift_correction(self.forward_velocity_ips(), self.forward_current());
        match self.heading.tick(forward, turn, &self.imu, drift) {
            HoldOutput::Idle => self.stop(),
            HoldOutput::Turn(correction) => {
                self.telemetry.put_number("drive/imu_error", correction);
                let (left, right) = coupled_arcade(forward, correction);
                self.apply(DriveCommand::percent(left, right))
            }
        }
    }
}
