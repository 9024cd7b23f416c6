use log::warn;

use super::chassis::Chassis;
use crate::{
    drive_mode::{DriveCommand, coupled_arcade},
    driver::{HeadingSensor, MotorController},
    error::DriverError,
    heading::HoldOutput,
    motor_group::Side,
    telemetry::Telemetry,
};

impl<M: MotorController, S: HeadingSensor, T: Telemetry> Chassis<M, S, T> {
    /// Stops the drive and zeroes both encoders so the next move is relative to here.
    /// Releases the heading hold.
    pub fn reset_motion(&mut self) -> Result<(), DriverError> {
        self.heading.disarm();
        let stopped = self.stop();
        let left = self.left.reset_position();
        let right = self.right.reset_position();
        stopped.and(left).and(right)
    }

    /// Scales the motion-profile cruise velocity to a fraction of the tuned value.
    pub fn set_motion_velocity(&mut self, fraction: f64) -> Result<(), DriverError> {
        let cruise = fraction.clamp(0.0, 1.0) * self.config.tuning.cruise_velocity_ticks_per_100ms;
        let left = self.left.set_cruise_velocity(cruise);
        let right = self.right.set_cruise_velocity(cruise);
        left.and(right)
    }

    /// Starts a straight move of `inches` from the last [`Chassis::reset_motion`]. Poll
    /// [`Chassis::is_move_complete`] with a timeout of your own.
    pub fn move_inches(&mut self, inches: f64) -> Result<(), DriverError> {
        let target = self.goals.linear_target_ticks(inches) as f64;
        self.apply(DriveCommand::motion_profile(target, target))
    }

    /// Starts an in-place turn, counter-clockwise for positive `degrees`. The next
    /// [`Chassis::auto_straight`] holds the heading the turn ends on.
    pub fn turn_degrees(&mut self, degrees: f64) -> Result<(), DriverError> {
        self.heading.disarm();
        let target = self.goals.rotation_target_ticks(degrees) as f64;
        self.apply(DriveCommand::motion_profile(target, -target))
    }

    /// Holds both sides at an absolute encoder position.
    pub fn lock_drive(&mut self, ticks: f64) -> Result<(), DriverError> {
        self.apply(DriveCommand::motion_profile(ticks, ticks))
    }

    /// False while either encoder can't be read.
    pub fn is_move_complete(&self, inches: f64) -> bool {
        match self.encoder_pair() {
            Some((left, right)) => {
                self.goals.is_linear_move_complete(inches, self.config.move_tolerance_ticks, left, right)
            }
            None => false,
        }
    }

    pub fn is_turn_complete(&self, degrees: f64) -> bool {
        match self.encoder_pair() {
            Some((left, right)) => {
                self.goals.is_rotation_complete(degrees, self.config.rotation_tolerance_ticks, left, right)
            }
            None => false,
        }
    }

    fn encoder_pair(&self) -> Option<(i32, i32)> {
        let read = |side: Side| match self.position_ticks(side) {
            Ok(ticks) => Some(ticks),
            Err(e) => {
                warn!("{side} drive: position read failed, goal unconfirmed: {e}");
                None
            }
        };
        let left = read(Side::Left);
        let right = read(Side::Right);
        Some((left?, right?))
    }

    /// Drives straight on the heading captured when the hold was armed. Arms it on the
    /// first call after a turn or [`Chassis::reset_motion`]; zero `forward` stops.
    pub fn auto_straight(&mut self, forward: f64) -> Result<(), DriverError> {
        self.heading.arm(&self.imu);
        let drift = self.heading.drift_correction(self.forward_velocity_ips(), self.forward_current());
        match self.heading.hold_straight(forward, &self.imu, drift) {
            HoldOutput::Idle => self.stop(),
            HoldOutput::Turn(correction) => {
                self.telemetry.put_number("drive/imu_error", correction);
                let (left, right) = coupled_arcade(forward, correction);
                self.apply(DriveCommand::percent(left, right))
            }
        }
    }

    /// Open-loop turn in place, positive clockwise.
    pub fn auto_turn(&mut self, turn: f64) -> Result<(), DriverError> {
        self.heading.disarm();
        let (left, right) = coupled_arcade(0.0, turn);
        self.apply(DriveCommand::percent(left, right))
    }
}
