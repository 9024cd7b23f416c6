//! One side of the drivetrain: a sensored front (master) controller and a rear (slave)
//! controller behind a single command surface.
//!
//! In [`Topology::Grouped`] the rear follows the front, so only the front is commanded each
//! tick. [`Topology::Independent`] is required whenever the rear has to run its own closed
//! loop. Topology changes are debounced so a tick that asks for the topology already in place
//! sends nothing on the bus.

use core::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::{DriveTuning, SideConfig},
    driver::{ControlMode, MotorController, MotorSettings, NeutralMode},
    error::DriverError,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    Grouped,
    Independent,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum End {
    Front,
    Rear,
}

pub struct MotorGroup<M: MotorController> {
    side: Side,
    front: M,
    rear: M,
    topology: Topology,
    // last command the front accepted, repeated to the rear on drivers without a follower mode
    front_mode: ControlMode,
    rear_mode: ControlMode,
}

impl<M: MotorController> MotorGroup<M> {
    /// Configures both controllers from the side's record and links the rear to the front.
    pub fn new(
        side: Side,
        mut front: M,
        mut rear: M,
        config: &SideConfig,
        tuning: &DriveTuning,
        neutral_mode: NeutralMode,
    ) -> Result<Self, DriverError> {
        let settings = config.motor_settings(tuning);
        front.configure(&settings)?;
        // the rear carries no sensor
        rear.configure(&MotorSettings { sensor_phase: false, ..settings })?;
        front.set_neutral_mode(neutral_mode)?;
        rear.set_neutral_mode(neutral_mode)?;

        let mut group = Self {
            side,
            front,
            rear,
            topology: Topology::Grouped,
            front_mode: ControlMode::NEUTRAL,
            rear_mode: ControlMode::NEUTRAL,
        };
        group.link_rear(ControlMode::NEUTRAL)?;
        group.front.set_mode(ControlMode::NEUTRAL)?;
        Ok(group)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn front(&self) -> &M {
        &self.front
    }

    pub fn rear(&self) -> &M {
        &self.rear
    }

    #[cfg(test)]
    pub(crate) fn front_mut(&mut self) -> &mut M {
        &mut self.front
    }

    #[cfg(test)]
    pub(crate) fn rear_mut(&mut self) -> &mut M {
        &mut self.rear
    }

    /// `master` is what a software follower repeats.
    fn link_rear(&mut self, master: ControlMode) -> Result<(), DriverError> {
        let mode = if M::HARDWARE_FOLLOWER {
            ControlMode::Follower(self.front.id())
        } else {
            master
        };
        self.set_rear(mode)
    }

    fn set_rear(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        self.rear.set_mode(mode)?;
        self.rear_mode = mode;
        Ok(())
    }

    /// The mode last accepted by an endpoint.
    pub fn mode(&self, end: End) -> ControlMode {
        match end {
            End::Front => self.front_mode,
            End::Rear => self.rear_mode,
        }
    }

    /// No-op when the side is already in `required`. Entering Independent leaves the rear
    /// holding its last state until it is commanded explicitly.
    pub fn set_topology(&mut self, required: Topology) -> Result<(), DriverError> {
        if self.topology == required {
            return Ok(());
        }
        if required == Topology::Grouped {
            self.link_rear(self.front_mode)?;
        }
        info!("{} drive: {:?} -> {:?}", self.side, self.topology, required);
        self.topology = required;
        Ok(())
    }

    /// Commands the master. A grouped rear needs nothing more; an independent rear must be
    /// commanded through [`MotorGroup::command_rear`].
    pub fn command(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        self.front.set_mode(mode)?;
        self.front_mode = mode;
        if self.topology == Topology::Grouped && !M::HARDWARE_FOLLOWER {
            self.set_rear(mode)?;
        }
        Ok(())
    }

    pub fn command_rear(&mut self, mode: ControlMode) -> Result<(), DriverError> {
        if self.topology == Topology::Grouped {
            warn!("{} drive: rear command {:?} ignored while grouped", self.side, mode);
            return Ok(());
        }
        self.set_rear(mode)
    }

    /// Safe stop: neutral output with the follower link re-established, from any prior mode.
    pub fn zero(&mut self) -> Result<(), DriverError> {
        let linked = self.link_rear(ControlMode::NEUTRAL);
        if self.topology != Topology::Grouped {
            info!("{} drive: {:?} -> {:?}", self.side, self.topology, Topology::Grouped);
        }
        self.topology = Topology::Grouped;
        // stop the master even if the relink was rejected
        self.front.set_mode(ControlMode::NEUTRAL)?;
        self.front_mode = ControlMode::NEUTRAL;
        linked
    }

    pub fn position_ticks(&self) -> Result<i32, DriverError> {
        self.front.position_ticks()
    }

    pub fn velocity_ticks_per_100ms(&self) -> Result<i32, DriverError> {
        self.front.velocity_ticks_per_100ms()
    }

    /// Mean current of both controllers, signed by the direction of the applied voltage.
    pub fn output_current_signed(&self) -> Result<f64, DriverError> {
        let front = signed_current(&self.front)?;
        let rear = signed_current(&self.rear)?;
        Ok((front + rear) / 2.0)
    }

    pub fn output_percent(&self, end: End) -> f64 {
        match end {
            End::Front => self.front.output_percent(),
            End::Rear if self.topology == Topology::Grouped => self.front.output_percent(),
            End::Rear => self.rear.output_percent(),
        }
    }

    pub fn reset_position(&mut self) -> Result<(), DriverError> {
        self.front.reset_position()
    }

    pub fn set_cruise_velocity(&mut self, ticks_per_100ms: f64) -> Result<(), DriverError> {
        self.front.set_cruise_velocity(ticks_per_100ms)
    }

    pub fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), DriverError> {
        self.front.set_neutral_mode(mode)?;
        self.rear.set_neutral_mode(mode)
    }
}

fn signed_current<M: MotorController>(motor: &M) -> Result<f64, DriverError> {
    let current = motor.output_current()?;
    let voltage = motor.output_voltage()?;
    Ok(if voltage > 0.0 {
        current
    } else if voltage < 0.0 {
        -current
    } else {
        0.0
    })
}
