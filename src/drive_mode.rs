use log::info;
use serde::{Deserialize, Serialize};

use crate::{driver::ControlMode, motor_group::Topology, units::UnitConverter};

/// Driving style, selected from outside and read once per tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveStyle {
    #[default]
    StandardArcade,
    CoupledArcade,
    Velocity,
}

impl DriveStyle {
    pub fn topology(self) -> Topology {
        match self {
            Self::StandardArcade | Self::CoupledArcade => Topology::Grouped,
            // asymmetric closed-loop targets can't go through a follower
            Self::Velocity => Topology::Independent,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SideCommand {
    pub front: ControlMode,
    /// Only set for independent topologies.
    pub rear: Option<ControlMode>,
}

impl SideCommand {
    fn grouped(mode: ControlMode) -> Self {
        Self { front: mode, rear: None }
    }

    fn independent(mode: ControlMode) -> Self {
        Self { front: mode, rear: Some(mode) }
    }
}

/// Everything one tick sends to the two sides.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DriveCommand {
    pub topology: Topology,
    pub left: SideCommand,
    pub right: SideCommand,
}

impl DriveCommand {
    /// Output fractions, clamped to the legal [-1,1] range.
    pub fn percent(left: f64, right: f64) -> Self {
        Self {
            topology: Topology::Grouped,
            left: SideCommand::grouped(ControlMode::PercentOutput(left.clamp(-1.0, 1.0))),
            right: SideCommand::grouped(ControlMode::PercentOutput(right.clamp(-1.0, 1.0))),
        }
    }

    /// Position targets for both masters; the rears follow.
    pub fn motion_profile(left_ticks: f64, right_ticks: f64) -> Self {
        Self {
            topology: Topology::Grouped,
            left: SideCommand::grouped(ControlMode::MotionProfile(left_ticks)),
            right: SideCommand::grouped(ControlMode::MotionProfile(right_ticks)),
        }
    }

    pub fn velocity(left_ticks_per_100ms: f64, right_ticks_per_100ms: f64) -> Self {
        Self {
            topology: Topology::Independent,
            left: SideCommand::independent(ControlMode::Velocity(left_ticks_per_100ms)),
            right: SideCommand::independent(ControlMode::Velocity(right_ticks_per_100ms)),
        }
    }
}

// The mixers return raw side outputs; `DriveCommand::percent` clamps them.

/// Arcade mix with a fixed steering gain of one. Inputs arrive already shaped, so nothing is
/// squared here.
pub fn standard_arcade(speed: f64, turn: f64) -> (f64, f64) {
    let speed = speed.clamp(-1.0, 1.0);
    let turn = turn.clamp(-1.0, 1.0);
    (speed + turn, speed - turn)
}

/// Arcade mix whose steering authority shrinks linearly with speed, down to half at full
/// speed, so fast driving can't whip into a wheel-slipping turn.
///
/// Positive `turn` turns right (clockwise viewed from above).
pub fn coupled_arcade(speed: f64, turn: f64) -> (f64, f64) {
    let max_steer = 1.0 - libm::fabs(speed) / 2.0;
    let steer = max_steer * turn;
    (speed + steer, speed - steer)
}

pub struct DriveModeController {
    style: DriveStyle,
    converter: UnitConverter,
    max_velocity_ips: f64,
    max_omega_rad_per_sec: f64,
}

impl DriveModeController {
    pub fn new(
        converter: UnitConverter,
        style: DriveStyle,
        max_velocity_ips: f64,
        max_omega_rad_per_sec: f64,
    ) -> Self {
        Self { style, converter, max_velocity_ips, max_omega_rad_per_sec }
    }

    pub fn style(&self) -> DriveStyle {
        self.style
    }

    pub fn select(&mut self, style: DriveStyle) {
        if style != self.style {
            info!("drive style: {:?} -> {:?}", self.style, style);
            self.style = style;
        }
    }

    /// Per-side commands for one tick of the active style. `speed` and `turn` are shaped
    /// stick fractions; the velocity style scales them to full-stick velocity and turn rate.
    pub fn compute(&self, speed: f64, turn: f64) -> DriveCommand {
        match self.style {
            DriveStyle::StandardArcade => {
                let (left, right) = standard_arcade(speed, turn);
                DriveCommand::percent(left, right)
            }
            DriveStyle::CoupledArcade => {
                let (left, right) = coupled_arcade(speed, turn);
                DriveCommand::percent(left, right)
            }
            DriveStyle::Velocity => {
                self.velocity(speed * self.max_velocity_ips, turn * self.max_omega_rad_per_sec)
            }
        }
    }

    /// Per-side wheel speeds in ticks per 100 ms for a body velocity in in/s and a turn rate
    /// in rad/s.
    pub fn velocity_targets(&self, vel: f64, omega: f64) -> (f64, f64) {
        let half_track = self.converter.geometry().track_width() / 2.0;
        let v_left = vel + omega * half_track;
        let v_right = vel - omega * half_track;
        (
            self.converter.ips_to_ticks_per_100ms(v_left),
            self.converter.ips_to_ticks_per_100ms(v_right),
        )
    }

    pub fn velocity(&self, vel: f64, omega: f64) -> DriveCommand {
        let (left, right) = self.velocity_targets(vel, omega);
        DriveCommand::velocity(left, right)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::DriveGeometry;

    fn controller(style: DriveStyle) -> DriveModeController {
        let geometry = DriveGeometry::from_parts(19.63, 24.25, 8192, 4, 0.0343).unwrap();
        DriveModeController::new(UnitConverter::new(geometry), style, 120.0, 6.0)
    }

    const SAMPLES: [f64; 9] = [-1.0, -0.75, -0.5, -0.1, 0.0, 0.1, 0.5, 0.75, 1.0];

    #[test]
    fn coupled_straight_line() {
        for speed in SAMPLES {
            assert_eq!(coupled_arcade(speed, 0.0), (speed, speed));
        }
    }

    #[test]
    fn coupled_steering_is_bounded() {
        for speed in SAMPLES {
            for turn in SAMPLES {
                let (left, right) = coupled_arcade(speed, turn);
                let bound = 2.0 * turn.abs() * (1.0 - speed.abs() / 2.0);
                assert!((left - right).abs() <= bound + 1e-12, "speed {speed} turn {turn}");
            }
        }
    }

    #[test]
    fn coupled_steering_halves_at_full_speed() {
        for turn in SAMPLES {
            let (l0, r0) = coupled_arcade(0.0, turn);
            let (l1, r1) = coupled_arcade(1.0, turn);
            let (l2, r2) = coupled_arcade(-1.0, turn);
            assert_relative_eq!(l1 - r1, (l0 - r0) / 2.0, epsilon = 1e-12);
            assert_relative_eq!(l2 - r2, (l0 - r0) / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn percent_commands_are_clamped() {
        let (left, right) = coupled_arcade(1.0, 0.4);
        assert_relative_eq!(left, 1.2, epsilon = 1e-12);
        let cmd = DriveCommand::percent(left, right);
        assert_eq!(cmd.left.front, ControlMode::PercentOutput(1.0));
        assert_eq!(cmd.right.front, ControlMode::PercentOutput(right));
    }

    #[test]
    fn standard_arcade_sums() {
        assert_eq!(standard_arcade(0.5, 0.25), (0.75, 0.25));
        assert_eq!(standard_arcade(0.0, -1.0), (-1.0, 1.0));
        let (left, right) = standard_arcade(0.8, 0.5);
        assert_relative_eq!(left, 1.3, epsilon = 1e-12);
        assert_relative_eq!(right, 0.3, epsilon = 1e-12);
        // inputs outside the stick range are clamped first
        assert_eq!(standard_arcade(2.0, 0.0), (1.0, 1.0));
    }

    #[test]
    fn arcade_styles_stay_grouped() {
        for style in [DriveStyle::StandardArcade, DriveStyle::CoupledArcade] {
            let cmd = controller(style).compute(0.5, 0.2);
            assert_eq!(cmd.topology, Topology::Grouped);
            assert_eq!(cmd.left.rear, None);
            assert_eq!(cmd.right.rear, None);
        }
    }

    #[test]
    fn velocity_straight_is_symmetric() {
        let c = controller(DriveStyle::Velocity);
        let (left, right) = c.velocity_targets(12.0, 0.0);
        assert_eq!(left, right);
        assert_relative_eq!(left, 12.0 / 19.63 / 10.0 * 8192.0, epsilon = 1e-9);
    }

    #[test]
    fn velocity_spin_is_antisymmetric() {
        let c = controller(DriveStyle::Velocity);
        let (left, right) = c.velocity_targets(0.0, 1.0);
        assert_relative_eq!(left, -right, epsilon = 1e-9);
        assert_relative_eq!(left, 24.25 / 2.0 / 19.63 / 10.0 * 8192.0, epsilon = 1e-9);
    }

    #[test]
    fn velocity_commands_every_endpoint() {
        let cmd = controller(DriveStyle::Velocity).velocity(12.0, 0.5);
        assert_eq!(cmd.topology, Topology::Independent);
        assert_eq!(cmd.left.rear, Some(cmd.left.front));
        assert_eq!(cmd.right.rear, Some(cmd.right.front));
    }

    #[test]
    fn velocity_style_scales_sticks() {
        let c = controller(DriveStyle::Velocity);
        assert_eq!(c.compute(0.5, -0.25), c.velocity(60.0, -1.5));
    }

    #[test]
    fn selecting_the_same_style_is_quiet() {
        let mut c = controller(DriveStyle::CoupledArcade);
        c.select(DriveStyle::CoupledArcade);
        assert_eq!(c.style(), DriveStyle::CoupledArcade);
        c.select(DriveStyle::Velocity);
        assert_eq!(c.style(), DriveStyle::Velocity);
        assert_eq!(c.style().topology(), Topology::Independent);
    }
}
