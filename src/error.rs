use snafu::Snafu;

use crate::driver::ControlMode;

/// Failures reported by a motor-controller driver.
///
/// Reads that fail are treated as "not yet confirmed" by the callers in this crate; writes
/// are handed back so the control loop can try again on the next period.
#[derive(Debug, Clone, Copy, PartialEq, Snafu)]
pub enum DriverError {
    /// The controller did not answer on the bus.
    #[snafu(display("motor controller {id} is disconnected"))]
    Disconnected { id: u8 },

    /// The bus did not acknowledge the frame in time.
    #[snafu(display("motor controller {id} timed out"))]
    Timeout { id: u8 },

    /// The last status frame is older than the control period.
    #[snafu(display("motor controller {id} returned a stale reading"))]
    StaleReading { id: u8 },

    /// The controller cannot run the requested mode.
    #[snafu(display("motor controller {id} does not support {mode:?}"))]
    Unsupported { id: u8, mode: ControlMode },
}

/// Invalid drivetrain constants, detected when the configuration is built.
#[derive(Debug, Clone, Copy, PartialEq, Snafu)]
pub enum ConfigurationError {
    #[snafu(display("{field} must be strictly positive, got {value}"))]
    NonPositive { field: &'static str, value: f64 },

    #[snafu(display("{field} must be finite"))]
    NonFinite { field: &'static str },

    #[snafu(display("{field} must lie in [0, 1], got {value}"))]
    OutOfRange { field: &'static str, value: f64 },
}

impl ConfigurationError {
    pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<f64, Self> {
        if !value.is_finite() {
            return Err(Self::NonFinite { field });
        }
        if value <= 0.0 {
            return Err(Self::NonPositive { field, value });
        }
        Ok(value)
    }

    pub(crate) fn check_fraction(field: &'static str, value: f64) -> Result<f64, Self> {
        if !value.is_finite() {
            return Err(Self::NonFinite { field });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(Self::OutOfRange { field, value });
        }
        Ok(value)
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{source}"), context(false))]
    Driver { source: DriverError },

    #[snafu(display("invalid drivetrain configuration: {source}"), context(false))]
    Configuration { source: ConfigurationError },
}
