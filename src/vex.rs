//! V5 smart motor and inertial sensor adapters.
//!
//! V5 motors have no follower mode and run their closed loops in firmware, so gain slots are
//! ignored and a grouped side repeats the master command to its rear motor.

use vexide::{
    devices::smart::{imu::InertialSensor, motor::MotorError},
    prelude::*,
};

use crate::{
    driver::{ControlMode, HeadingSensor, MotorController, MotorSettings, NeutralMode},
    error::DriverError,
};

const MAX_VOLTAGE: f64 = 12.0;

pub struct VexMotor {
    motor: Motor,
    id: u8,
    ticks_per_rev: f64,
    brake_mode: BrakeMode,
    cruise_rpm: i32,
    percent: f64,
}

impl VexMotor {
    /// `ticks_per_rev` must match the drive geometry so positions read back in the same
    /// native ticks the drive commands.
    pub fn new(motor: Motor, ticks_per_rev: u32) -> Self {
        let id = motor.port_number();
        Self {
            motor,
            id,
            ticks_per_rev: ticks_per_rev as f64,
            brake_mode: BrakeMode::Brake,
            cruise_rpm: 0,
            percent: 0.0,
        }
    }

    fn ticks_to_rpm(&self, ticks_per_100ms: f64) -> f64 {
        ticks_per_100ms / self.ticks_per_rev * 600.0
    }

    fn error(&self, e: MotorError) -> DriverError {
        match e {
            MotorError::Busy => DriverError::Timeout { id: self.id },
            _ => DriverError::Disconnected { id: self.id },
        }
    }
}

impl MotorController for VexMotor {
    const HARDWARE_FOLLOWER: bool = false;

    fn id(&self) -> u8 {
        self.id
    }

    fn configure(&mut self, settings: &MotorSettings) -> Result<(), DriverError> {
        let direction = if settings.inverted { Direction::Reverse } else { Direction::Forward };
        self.motor.set_direction(direction).map_err(|e| self.error(e))?;
        self.cruise_rpm = self.ticks_to_rpm(settings.cruise_velocity_ticks_per_100ms) as i32;
        Ok(())
    }

    fn set_mode(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        let result = match mode {
            ControlMode::PercentOutput(fraction) if fraction == 0.0 => self.motor.brake(self.brake_mode),
            ControlMode::PercentOutput(fraction) => self.motor.set_voltage(fraction * MAX_VOLTAGE),
            ControlMode::Velocity(ticks) => {
                let rpm = self.ticks_to_rpm(ticks);
                self.motor.set_velocity(rpm as i32)
            }
            ControlMode::MotionProfile(ticks) => self.motor.set_position_target(
                Position::from_revolutions(ticks / self.ticks_per_rev),
                self.cruise_rpm,
            ),
            ControlMode::Follower(_) => return Err(DriverError::Unsupported { id: self.id, mode }),
        };
        result.map_err(|e| self.error(e))?;
        self.percent = match mode {
            ControlMode::PercentOutput(fraction) => fraction,
            _ => 0.0,
        };
        Ok(())
    }

    fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), DriverError> {
        self.brake_mode = match mode {
            NeutralMode::Coast => BrakeMode::Coast,
            NeutralMode::Brake => BrakeMode::Brake,
        };
        Ok(())
    }

    fn set_cruise_velocity(&mut self, ticks_per_100ms: f64) -> Result<(), DriverError> {
        self.cruise_rpm = self.ticks_to_rpm(ticks_per_100ms) as i32;
        Ok(())
    }

    fn reset_position(&mut self) -> Result<(), DriverError> {
        self.motor.reset_position().map_err(|e| self.error(e))
    }

    fn position_ticks(&self) -> Result<i32, DriverError> {
        let position = self.motor.position().map_err(|e| self.error(e))?;
        Ok((position.as_revolutions() * self.ticks_per_rev) as i32)
    }

    fn velocity_ticks_per_100ms(&self) -> Result<i32, DriverError> {
        let rpm = self.motor.velocity().map_err(|e| self.error(e))? as f64;
        Ok((rpm / 600.0 * self.ticks_per_rev) as i32)
    }

    fn output_current(&self) -> Result<f64, DriverError> {
        self.motor.current().map_err(|e| self.error(e))
    }

    fn output_voltage(&self) -> Result<f64, DriverError> {
        self.motor.voltage().map_err(|e| self.error(e))
    }

    fn output_percent(&self) -> f64 {
        self.percent
    }
}

/// The V5 inertial sensor reads clockwise positive; the drive wants counter-clockwise.
impl HeadingSensor for InertialSensor {
    fn yaw_deg(&self) -> f64 {
        -self.rotation().unwrap_or_default()
    }

    fn yaw_rate_deg_per_sec(&self) -> f64 {
        self.gyro_rate().map(|rate| -rate.z).unwrap_or_default()
    }
}
