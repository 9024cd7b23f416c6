//! In-memory drivers for exercising the drive logic without hardware.

use alloc::vec::Vec;

use crate::{
    driver::{ControlMode, HeadingSensor, MotorController, MotorSettings, NeutralMode},
    error::DriverError,
    telemetry::Telemetry,
};

/// A controller with a hardware follower mode. Records every mode it is sent.
#[derive(Debug, Clone)]
pub struct MockMotor {
    pub id: u8,
    pub mode: ControlMode,
    pub commands: Vec<ControlMode>,
    pub settings: Option<MotorSettings>,
    pub neutral_mode: Option<NeutralMode>,
    pub cruise_velocity: Option<f64>,
    pub position_resets: usize,
    pub position: i32,
    pub velocity: i32,
    pub current: f64,
    pub voltage: f64,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MockMotor {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            mode: ControlMode::NEUTRAL,
            commands: Vec::new(),
            settings: None,
            neutral_mode: None,
            cruise_velocity: None,
            position_resets: 0,
            position: 0,
            velocity: 0,
            current: 0.0,
            voltage: 0.0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// How many times this controller was told to follow another.
    pub fn follow_calls(&self) -> usize {
        self.commands.iter().filter(|m| m.is_follower()).count()
    }

    fn write(&self) -> Result<(), DriverError> {
        if self.fail_writes {
            return Err(DriverError::Timeout { id: self.id });
        }
        Ok(())
    }

    fn read(&self) -> Result<(), DriverError> {
        if self.fail_reads {
            return Err(DriverError::StaleReading { id: self.id });
        }
        Ok(())
    }
}

impl MotorController for MockMotor {
    fn id(&self) -> u8 {
        self.id
    }

    fn configure(&mut self, settings: &MotorSettings) -> Result<(), DriverError> {
        self.write()?;
        self.settings = Some(*settings);
        Ok(())
    }

    fn set_mode(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        self.write()?;
        self.mode = mode;
        self.commands.push(mode);
        Ok(())
    }

    fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), DriverError> {
        self.write()?;
        self.neutral_mode = Some(mode);
        Ok(())
    }

    fn set_cruise_velocity(&mut self, ticks_per_100ms: f64) -> Result<(), DriverError> {
        self.write()?;
        self.cruise_velocity = Some(ticks_per_100ms);
        Ok(())
    }

    fn reset_position(&mut self) -> Result<(), DriverError> {
        self.write()?;
        self.position = 0;
        self.position_resets += 1;
        Ok(())
    }

    fn position_ticks(&self) -> Result<i32, DriverError> {
        self.read()?;
        Ok(self.position)
    }

    fn velocity_ticks_per_100ms(&self) -> Result<i32, DriverError> {
        self.read()?;
        Ok(self.velocity)
    }

    fn output_current(&self) -> Result<f64, DriverError> {
        self.read()?;
        Ok(self.current)
    }

    fn output_voltage(&self) -> Result<f64, DriverError> {
        self.read()?;
        Ok(self.voltage)
    }

    fn output_percent(&self) -> f64 {
        match self.mode {
            ControlMode::PercentOutput(fraction) => fraction,
            _ => 0.0,
        }
    }
}

/// A controller without a follower mode, like a V5 smart motor.
#[derive(Debug, Clone)]
pub struct SoftMotor(pub MockMotor);

impl SoftMotor {
    pub fn new(id: u8) -> Self {
        Self(MockMotor::new(id))
    }
}

impl MotorController for SoftMotor {
    const HARDWARE_FOLLOWER: bool = false;

    fn id(&self) -> u8 {
        self.0.id
    }
    fn configure(&mut self, settings: &MotorSettings) -> Result<(), DriverError> {
        self.0.configure(settings)
    }
    fn set_mode(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        if mode.is_follower() {
            return Err(DriverError::Unsupported { id: self.0.id, mode });
        }
        self.0.set_mode(mode)
    }
    fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), DriverError> {
        self.0.set_neutral_mode(mode)
    }
    fn set_cruise_velocity(&mut self, ticks_per_100ms: f64) -> Result<(), DriverError> {
        self.0.set_cruise_velocity(ticks_per_100ms)
    }
    fn reset_position(&mut self) -> Result<(), DriverError> {
        self.0.reset_position()
    }
    fn position_ticks(&self) -> Result<i32, DriverError> {
        self.0.position_ticks()
    }
    fn velocity_ticks_per_100ms(&self) -> Result<i32, DriverError> {
        self.0.velocity_ticks_per_100ms()
    }
    fn output_current(&self) -> Result<f64, DriverError> {
        self.0.output_current()
    }
    fn output_voltage(&self) -> Result<f64, DriverError> {
        self.0.output_voltage()
    }
    fn output_percent(&self) -> f64 {
        self.0.output_percent()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockImu {
    pub yaw: f64,
    pub yaw_rate: f64,
}

impl HeadingSensor for MockImu {
    fn yaw_deg(&self) -> f64 {
        self.yaw
    }

    fn yaw_rate_deg_per_sec(&self) -> f64 {
        self.yaw_rate
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    pub numbers: Vec<(&'static str, f64)>,
    pub bools: Vec<(&'static str, bool)>,
}

impl RecordingTelemetry {
    pub fn number(&self, key: &str) -> Option<f64> {
        self.numbers.iter().rev().find(|(k, _)| *k == key).map(|&(_, v)| v)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.bools.iter().rev().find(|(k, _)| *k == key).map(|&(_, v)| v)
    }
}

impl Telemetry for RecordingTelemetry {
    fn put_number(&mut self, key: &'static str, value: f64) {
        self.numbers.push((key, value));
    }

    fn put_bool(&mut self, key: &'static str, value: bool) {
        self.bools.push((key, value));
    }
}
