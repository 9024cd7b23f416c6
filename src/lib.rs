//! Differential drive control: drive styles, per-side motor grouping, heading hold and
//! closed-loop move completion for a two-sided drivetrain with two motors per side.
//!
//! A [`Chassis`] is built once by whatever owns the robot and driven from a single control
//! loop. Hardware comes in through [`MotorController`] and [`HeadingSensor`]; dashboard
//! output goes out through [`Telemetry`].

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod autonomous;
pub mod chassis;
pub mod config;
pub mod drive_mode;
pub mod driver;
pub mod driver_control;
pub mod error;
pub mod goal;
pub mod heading;
pub mod motor_group;
pub mod telemetry;
pub mod units;
pub mod utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "vexide")]
pub mod vex;

pub use chassis::{Chassis, ChassisArgs, DiagnosticsReport};
pub use config::{ChassisConfig, DriveGeometry, DriveTuning, SideConfig};
pub use drive_mode::{DriveCommand, DriveStyle};
pub use driver::{ControlMode, HeadingSensor, MotorController, NeutralMode};
pub use error::{ConfigurationError, DriverError, Error};
pub use motor_group::{End, MotorGroup, Side, Topology};
pub use telemetry::Telemetry;
pub use units::UnitConverter;
