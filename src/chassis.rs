use log::{debug, warn};

use crate::{
    config::ChassisConfig,
    drive_mode::{DriveCommand, DriveModeController, DriveStyle, SideCommand},
    driver::{ControlMode, HeadingSensor, MotorController},
    error::{DriverError, Error},
    goal::GoalTracker,
    heading::HeadingHold,
    motor_group::{End, MotorGroup, Side, Topology},
    telemetry::Telemetry,
    units::UnitConverter,
};

pub struct ChassisArgs<M: MotorController, S: HeadingSensor, T: Telemetry = ()> {
    pub left_front: M,
    pub left_rear: M,
    pub right_front: M,
    pub right_rear: M,
    pub imu: S,
    pub telemetry: T,
    pub config: ChassisConfig,
}

/// The drivetrain. Owns both sides, the heading sensor and the telemetry sink; every call
/// into it must come from the one task running the control loop.
pub struct Chassis<M: MotorController, S: HeadingSensor, T: Telemetry = ()> {
    pub(crate) left: MotorGroup<M>,
    pub(crate) right: MotorGroup<M>,
    pub(crate) imu: S,
    pub(crate) telemetry: T,
    pub(crate) config: ChassisConfig,
    pub(crate) converter: UnitConverter,
    pub(crate) modes: DriveModeController,
    pub(crate) heading: HeadingHold,
    pub(crate) goals: GoalTracker,
    pub(crate) low_sensitivity: bool,
}

/// Which endpoints drew the minimum test current during the last diagnostics run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub left_front: bool,
    pub left_rear: bool,
    pub right_front: bool,
    pub right_rear: bool,
}

impl DiagnosticsReport {
    pub fn passed(&self) -> bool {
        self.left_front && self.left_rear && self.right_front && self.right_rear
    }
}

impl<M: MotorController, S: HeadingSensor, T: Telemetry> Chassis<M, S, T> {
    /// Validates the configuration, then configures all four controllers and leaves both sides
    /// grouped and stopped.
    pub fn new(args: ChassisArgs<M, S, T>) -> Result<Self, Error> {
        let config = args.config;
        config.validate()?;

        let left = MotorGroup::new(
            Side::Left,
            args.left_front,
            args.left_rear,
            &config.left,
            &config.tuning,
            config.neutral_mode,
        )?;
        let right = MotorGroup::new(
            Side::Right,
            args.right_front,
            args.right_rear,
            &config.right,
            &config.tuning,
            config.neutral_mode,
        )?;

        let converter = UnitConverter::new(config.geometry);
        Ok(Self {
            left,
            right,
            imu: args.imu,
            telemetry: args.telemetry,
            converter,
            modes: DriveModeController::new(
                converter,
                DriveStyle::default(),
                config.max_velocity_ips,
                config.max_omega_rad_per_sec,
            ),
            heading: HeadingHold::new(config.heading),
            goals: GoalTracker::new(converter),
            low_sensitivity: false,
            config,
        })
    }

    pub fn config(&self) -> &ChassisConfig {
        &self.config
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    pub fn side(&self, side: Side) -> &MotorGroup<M> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[cfg(test)]
    pub(crate) fn side_mut(&mut self, side: Side) -> &mut MotorGroup<M> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn imu(&self) -> &S {
        &self.imu
    }

    pub fn imu_mut(&mut self) -> &mut S {
        &mut self.imu
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn drive_style(&self) -> DriveStyle {
        self.modes.style()
    }

    /// Takes effect on the next drive tick.
    pub fn set_drive_style(&mut self, style: DriveStyle) {
        self.modes.select(style);
    }

    /// Sends one tick's commands to both sides. Both sides are always attempted; the first
    /// failure is returned.
    pub fn apply(&mut self, command: DriveCommand) -> Result<(), DriverError> {
        let left = apply_side(&mut self.left, command.topology, command.left);
        let right = apply_side(&mut self.right, command.topology, command.right);
        left.and(right)
    }

    /// Neutral output on every endpoint with both rears linked again. Safe from any mode.
    pub fn stop(&mut self) -> Result<(), DriverError> {
        let left = self.left.zero();
        let right = self.right.zero();
        left.and(right)
    }

    /// Grouped only when both sides are. A side whose relink failed keeps the drive
    /// reported as Independent; [`MotorGroup::topology`] gives each side on its own.
    pub fn topology(&self) -> Topology {
        match (self.left.topology(), self.right.topology()) {
            (Topology::Grouped, Topology::Grouped) => Topology::Grouped,
            _ => Topology::Independent,
        }
    }

    pub fn control_mode(&self, side: Side, end: End) -> ControlMode {
        self.side(side).mode(end)
    }

    /// Output fraction of one endpoint, for a simulator.
    pub fn output_percent(&self, side: Side, end: End) -> f64 {
        self.side(side).output_percent(end)
    }

    pub fn position_ticks(&self, side: Side) -> Result<i32, DriverError> {
        self.side(side).position_ticks()
    }

    /// Encoder counts, with the quadrature edges divided out.
    pub fn position_counts(&self, side: Side) -> Result<f64, DriverError> {
        Ok(self.converter.ticks_to_counts(self.position_ticks(side)? as f64))
    }

    pub fn position_inches(&self, side: Side) -> Result<f64, DriverError> {
        Ok(self.converter.ticks_to_inches(self.position_ticks(side)? as f64))
    }

    /// Mean wheel speed of both sides in in/s. A side whose read fails counts as stopped.
    pub fn forward_velocity_ips(&self) -> f64 {
        let left = self.degraded(Side::Left, "velocity", |g| {
            g.velocity_ticks_per_100ms().map(f64::from)
        });
        let right = self.degraded(Side::Right, "velocity", |g| {
            g.velocity_ticks_per_100ms().map(f64::from)
        });
        self.converter.ticks_per_100ms_to_ips((left + right) / 2.0)
    }

    /// Mean signed current of all four endpoints, a stand-in for forward acceleration.
    pub fn forward_current(&self) -> f64 {
        let left = self.degraded(Side::Left, "current", |g| g.output_current_signed());
        let right = self.degraded(Side::Right, "current", |g| g.output_current_signed());
        (left + right) / 2.0
    }

    fn degraded(
        &self,
        side: Side,
        what: &str,
        read: impl FnOnce(&MotorGroup<M>) -> Result<f64, DriverError>,
    ) -> f64 {
        match read(self.side(side)) {
            Ok(value) => value,
            Err(e) => {
                warn!("{side} drive: {what} read failed: {e}");
                0.0
            }
        }
    }

    /// Publishes the drivetrain state. Reads that fail are skipped for this period.
    pub fn periodic(&mut self) {
        for side in [Side::Left, Side::Right] {
            let (ticks_key, inches_key) = match side {
                Side::Left => ("drive/left_ticks", "drive/left_inches"),
                Side::Right => ("drive/right_ticks", "drive/right_inches"),
            };
            match self.position_ticks(side) {
                Ok(ticks) => {
                    let inches = self.converter.ticks_to_inches(ticks as f64);
                    self.telemetry.put_number(ticks_key, ticks as f64);
                    self.telemetry.put_number(inches_key, inches);
                }
                Err(e) => debug!("{side} drive: position unavailable: {e}"),
            }
        }

        let velocity = self.forward_velocity_ips();
        let current = self.forward_current();
        let yaw = self.imu.yaw_deg();
        let heading_error = self.heading.setpoint_error(&self.imu);
        let grouped = self.topology() == Topology::Grouped;
        self.telemetry.put_number("drive/forward_velocity_ips", velocity);
        self.telemetry.put_number("drive/forward_current", current);
        self.telemetry.put_number("drive/yaw_deg", yaw);
        self.telemetry.put_number("drive/heading_error", heading_error);
        self.telemetry.put_bool("drive/heading_armed", self.heading.is_armed());
        self.telemetry.put_bool("drive/grouped", grouped);
        self.telemetry.put_bool("drive/low_sensitivity", self.low_sensitivity);
    }

    /// Runs every endpoint on its own at the test output: right front forward, right rear
    /// reverse, left front reverse, left rear forward. [`Chassis::stop`] ends the run.
    pub fn diagnostics_execute(&mut self) -> Result<(), DriverError> {
        let p = self.config.motor_test_percent;
        let right = run_independent(&mut self.right, p, -p);
        let left = run_independent(&mut self.left, -p, p);
        right.and(left)
    }

    /// Checks each endpoint drew at least the minimum test current. Call while
    /// [`Chassis::diagnostics_execute`] is driving the motors.
    pub fn diagnostics_check(&mut self) -> DiagnosticsReport {
        let min = self.config.diagnostics_min_current;
        let report = DiagnosticsReport {
            left_front: draws(self.left.front(), min),
            left_rear: draws(self.left.rear(), min),
            right_front: draws(self.right.front(), min),
            right_rear: draws(self.right.rear(), min),
        };
        self.telemetry.put_bool("drive/diagnostics_ok", report.passed());
        if !report.passed() {
            warn!("drive diagnostics failed: {report:?}");
        }
        report
    }
}

fn apply_side<M: MotorController>(
    group: &mut MotorGroup<M>,
    topology: Topology,
    command: SideCommand,
) -> Result<(), DriverError> {
    group.set_topology(topology)?;
    group.command(command.front)?;
    if let Some(rear) = command.rear {
        group.command_rear(rear)?;
    }
    Ok(())
}

fn run_independent<M: MotorController>(
    group: &mut MotorGroup<M>,
    front: f64,
    rear: f64,
) -> Result<(), DriverError> {
    group.set_topology(Topology::Independent)?;
    group.command(ControlMode::PercentOutput(front))?;
    group.command_rear(ControlMode::PercentOutput(rear))
}

fn draws<M: MotorController>(motor: &M, min_current: f64) -> bool {
    match motor.output_current() {
        Ok(current) => current >= min_current,
        Err(e) => {
            warn!("motor {}: current read failed: {e}", motor.id());
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        config::DriveGeometry,
        mock::{MockImu, MockMotor, RecordingTelemetry, SoftMotor},
    };

    pub(crate) type TestChassis = Chassis<MockMotor, MockImu, RecordingTelemetry>;

    pub(crate) fn config() -> ChassisConfig {
        ChassisConfig {
            geometry: DriveGeometry::from_parts(19.63, 24.25, 8192, 4, 0.0343).unwrap(),
            ..Default::default()
        }
    }

    pub(crate) fn chassis_with(config: ChassisConfig) -> TestChassis {
        Chassis::new(ChassisArgs {
            left_front: MockMotor::new(1),
            left_rear: MockMotor::new(2),
            right_front: MockMotor::new(3),
            right_rear: MockMotor::new(4),
            imu: MockImu::default(),
            telemetry: RecordingTelemetry::default(),
            config,
        })
        .unwrap()
    }

    pub(crate) fn chassis() -> TestChassis {
        chassis_with(config())
    }

    #[test]
    fn construction_configures_each_side() {
        let c = chassis();
        assert!(!c.side(Side::Left).front().settings.unwrap().inverted);
        assert!(c.side(Side::Right).front().settings.unwrap().inverted);
        assert!(c.side(Side::Right).rear().settings.unwrap().inverted);
        assert_eq!(c.side(Side::Left).rear().mode, ControlMode::Follower(1));
        assert_eq!(c.side(Side::Right).rear().mode, ControlMode::Follower(3));
        assert_eq!(c.topology(), Topology::Grouped);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Chassis::new(ChassisArgs {
            left_front: MockMotor::new(1),
            left_rear: MockMotor::new(2),
            right_front: MockMotor::new(3),
            right_rear: MockMotor::new(4),
            imu: MockImu::default(),
            telemetry: (),
            config: ChassisConfig { low_sensitivity_gain: 1.5, ..config() },
        });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn construction_surfaces_driver_failures() {
        let mut rear = MockMotor::new(4);
        rear.fail_writes = true;
        let result = Chassis::new(ChassisArgs {
            left_front: MockMotor::new(1),
            left_rear: MockMotor::new(2),
            right_front: MockMotor::new(3),
            right_rear: rear,
            imu: MockImu::default(),
            telemetry: (),
            config: config(),
        });
        assert!(matches!(
            result,
            Err(Error::Driver { source: DriverError::Timeout { id: 4 } })
        ));
    }

    #[test]
    fn stop_from_every_mode() {
        let commands = [
            DriveCommand::percent(0.7, -0.3),
            DriveCommand::velocity(400.0, -250.0),
            DriveCommand::motion_profile(9000.0, -9000.0),
        ];
        for command in commands {
            let mut c = chassis();
            c.apply(command).unwrap();
            c.stop().unwrap();
            for side in [Side::Left, Side::Right] {
                let group = c.side(side);
                assert_eq!(group.topology(), Topology::Grouped);
                assert_eq!(group.front().mode, ControlMode::NEUTRAL);
                assert!(group.rear().mode.is_follower());
            }
        }
    }

    #[test]
    fn write_failures_are_reported_but_both_sides_are_tried() {
        let mut c = chassis();
        c.side_mut(Side::Left).front_mut().fail_writes = true;
        assert_eq!(c.apply(DriveCommand::percent(0.5, 0.5)), Err(DriverError::Timeout { id: 1 }));
        assert_eq!(c.side(Side::Right).front().mode, ControlMode::PercentOutput(0.5));

        // next tick goes through once the bus recovers
        c.side_mut(Side::Left).front_mut().fail_writes = false;
        c.apply(DriveCommand::percent(0.5, 0.5)).unwrap();
        assert_eq!(c.side(Side::Left).front().mode, ControlMode::PercentOutput(0.5));
    }

    #[test]
    fn failed_stop_reports_the_mode_still_running() {
        let mut c = chassis();
        c.apply(DriveCommand::percent(0.7, 0.7)).unwrap();
        c.side_mut(Side::Left).front_mut().fail_writes = true;
        assert_eq!(c.stop(), Err(DriverError::Timeout { id: 1 }));
        assert_eq!(c.control_mode(Side::Left, End::Front), ControlMode::PercentOutput(0.7));
        assert_eq!(c.control_mode(Side::Right, End::Front), ControlMode::NEUTRAL);
    }

    #[test]
    fn topology_is_grouped_only_when_both_sides_are() {
        let mut c = chassis();
        c.apply(DriveCommand::velocity(300.0, 300.0)).unwrap();
        c.side_mut(Side::Right).rear_mut().fail_writes = true;
        assert_eq!(
            c.apply(DriveCommand::percent(0.2, 0.2)),
            Err(DriverError::Timeout { id: 4 })
        );
        assert_eq!(c.side(Side::Left).topology(), Topology::Grouped);
        assert_eq!(c.side(Side::Right).topology(), Topology::Independent);
        assert_eq!(c.topology(), Topology::Independent);

        c.periodic();
        assert_eq!(c.telemetry().flag("drive/grouped"), Some(false));
    }

    #[test]
    fn position_getters() {
        let mut c = chassis();
        c.side_mut(Side::Left).front_mut().position = 8192;
        c.side_mut(Side::Right).front_mut().position = -4096;
        assert_eq!(c.position_ticks(Side::Left), Ok(8192));
        assert_eq!(c.position_counts(Side::Left), Ok(2048.0));
        assert_relative_eq!(c.position_inches(Side::Left).unwrap(), 19.63, epsilon = 1e-9);
        assert_relative_eq!(c.position_inches(Side::Right).unwrap(), -9.815, epsilon = 1e-9);
    }

    #[test]
    fn forward_velocity_and_current_degrade_on_read_failure() {
        let mut c = chassis();
        c.side_mut(Side::Left).front_mut().velocity = 8192;
        c.side_mut(Side::Right).front_mut().velocity = 8192;
        // one revolution per 100 ms
        assert_relative_eq!(c.forward_velocity_ips(), 196.3, epsilon = 1e-9);

        c.side_mut(Side::Right).front_mut().fail_reads = true;
        assert_relative_eq!(c.forward_velocity_ips(), 98.15, epsilon = 1e-9);

        for side in [Side::Left, Side::Right] {
            let g = c.side_mut(side);
            g.front_mut().current = 4.0;
            g.front_mut().voltage = 6.0;
            g.rear_mut().current = 2.0;
            g.rear_mut().voltage = 6.0;
        }
        assert_relative_eq!(c.forward_current(), 1.5);
        c.side_mut(Side::Right).front_mut().fail_reads = false;
        assert_relative_eq!(c.forward_current(), 3.0);
    }

    #[test]
    fn periodic_publishes_state() {
        let mut c = chassis();
        c.side_mut(Side::Left).front_mut().position = 8192;
        c.side_mut(Side::Right).front_mut().fail_reads = true;
        c.periodic();
        let t = c.telemetry();
        assert_eq!(t.number("drive/left_ticks"), Some(8192.0));
        assert_eq!(t.number("drive/right_ticks"), None);
        assert_eq!(t.flag("drive/grouped"), Some(true));
        assert_eq!(t.flag("drive/heading_armed"), Some(false));
    }

    #[test]
    fn simulator_sees_output_fractions() {
        let mut c = chassis();
        c.apply(DriveCommand::percent(0.4, -0.2)).unwrap();
        assert_eq!(c.output_percent(Side::Left, End::Front), 0.4);
        assert_eq!(c.output_percent(Side::Left, End::Rear), 0.4);
        assert_eq!(c.output_percent(Side::Right, End::Rear), -0.2);
        assert_eq!(c.control_mode(Side::Right, End::Rear), ControlMode::Follower(3));
    }

    #[test]
    fn diagnostics_drive_each_endpoint() {
        let mut c = chassis();
        c.diagnostics_execute().unwrap();
        assert_eq!(c.topology(), Topology::Independent);
        assert_eq!(c.control_mode(Side::Right, End::Front), ControlMode::PercentOutput(0.25));
        assert_eq!(c.control_mode(Side::Right, End::Rear), ControlMode::PercentOutput(-0.25));
        assert_eq!(c.control_mode(Side::Left, End::Front), ControlMode::PercentOutput(-0.25));
        assert_eq!(c.control_mode(Side::Left, End::Rear), ControlMode::PercentOutput(0.25));

        for side in [Side::Left, Side::Right] {
            c.side_mut(side).front_mut().current = 1.2;
            c.side_mut(side).rear_mut().current = 1.1;
        }
        c.side_mut(Side::Left).rear_mut().current = 0.1;
        let report = c.diagnostics_check();
        assert!(!report.passed());
        assert!(!report.left_rear);
        assert!(report.left_front && report.right_front && report.right_rear);
        assert_eq!(c.telemetry().flag("drive/diagnostics_ok"), Some(false));

        c.stop().unwrap();
        assert_eq!(c.topology(), Topology::Grouped);
    }

    #[test]
    fn chassis_runs_on_controllers_without_a_follower() {
        let mut c = Chassis::new(ChassisArgs {
            left_front: SoftMotor::new(1),
            left_rear: SoftMotor::new(2),
            right_front: SoftMotor::new(3),
            right_rear: SoftMotor::new(4),
            imu: MockImu::default(),
            telemetry: (),
            config: config(),
        })
        .unwrap();
        c.apply(DriveCommand::percent(0.3, 0.6)).unwrap();
        assert_eq!(c.side(Side::Left).rear().0.mode, ControlMode::PercentOutput(0.3));
        assert_eq!(c.side(Side::Right).rear().0.mode, ControlMode::PercentOutput(0.6));
        c.stop().unwrap();
        assert_eq!(c.side(Side::Right).rear().0.mode, ControlMode::NEUTRAL);
    }
}
