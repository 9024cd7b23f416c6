use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// The command a single motor endpoint is running.
///
/// Exactly one mode is active per endpoint. Setpoints are in controller-native units:
/// a fraction of full output, ticks per 100 ms, or absolute ticks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ControlMode {
    PercentOutput(f64),
    Velocity(f64),
    MotionProfile(f64),
    /// Mirror the output of the controller with this id.
    Follower(u8),
}

impl ControlMode {
    pub const NEUTRAL: Self = Self::PercentOutput(0.0);

    pub fn is_follower(&self) -> bool {
        matches!(self, Self::Follower(_))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeutralMode {
    Coast,
    #[default]
    Brake,
}

/// One closed-loop gain slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kf: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub izone: f64,
}

/// Startup configuration for one endpoint. Opaque to the control core past the point where it
/// is handed to [`MotorController::configure`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotorSettings {
    pub inverted: bool,
    /// Flip the sensor reading so that forward motion counts up. Only meaningful on the
    /// sensored (front) endpoint.
    pub sensor_phase: bool,
    pub neutral_deadband: f64,
    pub open_loop_ramp_secs: f64,
    pub closed_loop_ramp_secs: f64,
    pub motion_gains: Gains,
    pub velocity_gains: Gains,
    pub cruise_velocity_ticks_per_100ms: f64,
    pub acceleration_ticks_per_100ms_per_sec: f64,
}

/// A motor controller on the drive bus.
///
/// Commands are fire-and-forget: an `Ok` means the frame was queued, not that the motor has
/// reached the setpoint.
pub trait MotorController {
    /// Whether the controller can mirror another controller in hardware. When it cannot, a
    /// grouped side repeats the master command to it every tick instead.
    const HARDWARE_FOLLOWER: bool = true;

    fn id(&self) -> u8;

    /// Applied once, before the first command.
    fn configure(&mut self, settings: &MotorSettings) -> Result<(), DriverError>;

    fn set_mode(&mut self, mode: ControlMode) -> Result<(), DriverError>;

    fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), DriverError>;

    fn set_cruise_velocity(&mut self, ticks_per_100ms: f64) -> Result<(), DriverError>;

    fn reset_position(&mut self) -> Result<(), DriverError>;

    fn position_ticks(&self) -> Result<i32, DriverError>;

    fn velocity_ticks_per_100ms(&self) -> Result<i32, DriverError>;

    /// Magnitude only.
    fn output_current(&self) -> Result<f64, DriverError>;

    fn output_voltage(&self) -> Result<f64, DriverError>;

    /// The fraction of full output the controller is applying, as seen by a simulator.
    fn output_percent(&self) -> f64;
}

/// Absolute orientation source. Yaw is counter-clockwise positive, viewed from above.
pub trait HeadingSensor {
    fn yaw_deg(&self) -> f64;

    fn yaw_rate_deg_per_sec(&self) -> f64;
}
