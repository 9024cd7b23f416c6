use core::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{
    driver::{Gains, MotorSettings, NeutralMode},
    error::ConfigurationError,
    heading::HeadingHoldConfig,
    utils::JoystickScale,
};

/// Fixed drivetrain dimensions. Every value is strictly positive; there is no way to build or
/// deserialize one that is not.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeometry", into = "RawGeometry")]
pub struct DriveGeometry {
    wheel_circumference: f64,
    track_width: f64,
    ticks_per_rev: u32,
    edges_per_count: u32,
    wheel_revs_per_frame_degree: f64,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
struct RawGeometry {
    wheel_circumference: f64,
    track_width: f64,
    ticks_per_rev: u32,
    #[serde(default = "RawGeometry::quadrature")]
    edges_per_count: u32,
    #[serde(default)]
    wheel_revs_per_frame_degree: Option<f64>,
}
impl RawGeometry {
    fn quadrature() -> u32 {
        4
    }
}

impl TryFrom<RawGeometry> for DriveGeometry {
    type Error = ConfigurationError;

    fn try_from(raw: RawGeometry) -> Result<Self, Self::Error> {
        let revs = match raw.wheel_revs_per_frame_degree {
            Some(revs) => revs,
            None => frame_degree_revs(raw.track_width, raw.wheel_circumference),
        };
        DriveGeometry::from_parts(
            raw.wheel_circumference,
            raw.track_width,
            raw.ticks_per_rev,
            raw.edges_per_count,
            revs,
        )
    }
}

impl From<DriveGeometry> for RawGeometry {
    fn from(g: DriveGeometry) -> Self {
        Self {
            wheel_circumference: g.wheel_circumference,
            track_width: g.track_width,
            ticks_per_rev: g.ticks_per_rev,
            edges_per_count: g.edges_per_count,
            wheel_revs_per_frame_degree: Some(g.wheel_revs_per_frame_degree),
        }
    }
}

// one degree of frame rotation moves each wheel 1/360 of the turning circle
fn frame_degree_revs(track_width: f64, wheel_circumference: f64) -> f64 {
    (PI * track_width / 360.0) / wheel_circumference
}

impl DriveGeometry {
    /// Builds the geometry from wheel diameter and encoder resolution, deriving circumference
    /// and the frame-rotation constant.
    pub fn new(
        wheel_diameter: f64,
        track_width: f64,
        counts_per_rev: u32,
        edges_per_count: u32,
    ) -> Result<Self, ConfigurationError> {
        let wheel_diameter = ConfigurationError::check_positive("wheel_diameter", wheel_diameter)?;
        let circumference = wheel_diameter * PI;
        Self::from_parts(
            circumference,
            track_width,
            counts_per_rev.saturating_mul(edges_per_count),
            edges_per_count,
            frame_degree_revs(track_width, circumference),
        )
    }

    pub fn from_parts(
        wheel_circumference: f64,
        track_width: f64,
        ticks_per_rev: u32,
        edges_per_count: u32,
        wheel_revs_per_frame_degree: f64,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            wheel_circumference: ConfigurationError::check_positive(
                "wheel_circumference",
                wheel_circumference,
            )?,
            track_width: ConfigurationError::check_positive("track_width", track_width)?,
            ticks_per_rev: ConfigurationError::check_positive("ticks_per_rev", ticks_per_rev as f64)?
                as u32,
            edges_per_count: ConfigurationError::check_positive(
                "edges_per_count",
                edges_per_count as f64,
            )? as u32,
            wheel_revs_per_frame_degree: ConfigurationError::check_positive(
                "wheel_revs_per_frame_degree",
                wheel_revs_per_frame_degree,
            )?,
        })
    }

    // 6.25in wheels, 24.25in track, 2048 count quadrature encoders
    const fn reference() -> Self {
        const CIRCUMFERENCE: f64 = 6.25 * PI;
        const TRACK: f64 = 24.25;
        Self {
            wheel_circumference: CIRCUMFERENCE,
            track_width: TRACK,
            ticks_per_rev: 8192,
            edges_per_count: 4,
            wheel_revs_per_frame_degree: (PI * TRACK / 360.0) / CIRCUMFERENCE,
        }
    }

    pub fn wheel_circumference(&self) -> f64 {
        self.wheel_circumference
    }
    pub fn track_width(&self) -> f64 {
        self.track_width
    }
    pub fn ticks_per_rev(&self) -> u32 {
        self.ticks_per_rev
    }
    pub fn edges_per_count(&self) -> u32 {
        self.edges_per_count
    }
    pub fn wheel_revs_per_frame_degree(&self) -> f64 {
        self.wheel_revs_per_frame_degree
    }
}

impl Default for DriveGeometry {
    fn default() -> Self {
        Self::reference()
    }
}

/// The per-side wiring differences. Everything else is shared through [`DriveTuning`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SideConfig {
    pub inverted: bool,
    pub sensor_phase: bool,
    pub neutral_deadband: f64,
}

impl SideConfig {
    pub fn motor_settings(&self, tuning: &DriveTuning) -> MotorSettings {
        MotorSettings {
            inverted: self.inverted,
            sensor_phase: self.sensor_phase,
            neutral_deadband: self.neutral_deadband,
            open_loop_ramp_secs: tuning.open_loop_ramp_secs,
            closed_loop_ramp_secs: tuning.closed_loop_ramp_secs,
            motion_gains: tuning.motion_gains,
            velocity_gains: tuning.velocity_gains,
            cruise_velocity_ticks_per_100ms: tuning.cruise_velocity_ticks_per_100ms,
            acceleration_ticks_per_100ms_per_sec: tuning.acceleration_ticks_per_100ms_per_sec,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriveTuning {
    pub open_loop_ramp_secs: f64,
    pub closed_loop_ramp_secs: f64,
    pub motion_gains: Gains,
    pub velocity_gains: Gains,
    pub cruise_velocity_ticks_per_100ms: f64,
    pub acceleration_ticks_per_100ms_per_sec: f64,
}

impl Default for DriveTuning {
    fn default() -> Self {
        // kf = 1023 / free-speed ticks per 100ms, kp = 0.1 * 1023 / observed error
        Self {
            open_loop_ramp_secs: 0.25,
            closed_loop_ramp_secs: 0.0,
            motion_gains: Gains { kf: 0.35, kp: 0.4, ki: 0.0, kd: 4.0, izone: 0.0 },
            velocity_gains: Gains { kf: 0.35, kp: 0.1, ki: 0.0, kd: 0.0, izone: 0.0 },
            cruise_velocity_ticks_per_100ms: 2200.0,
            acceleration_ticks_per_100ms_per_sec: 2200.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub geometry: DriveGeometry,
    pub left: SideConfig,
    pub right: SideConfig,
    pub tuning: DriveTuning,
    pub heading: HeadingHoldConfig,
    pub neutral_mode: NeutralMode,

    pub forward_scale: JoystickScale,
    pub turn_scale: JoystickScale,
    pub low_sensitivity_gain: f64,

    // full stick in the velocity style
    pub max_velocity_ips: f64,
    pub max_omega_rad_per_sec: f64,

    pub move_tolerance_ticks: i32,
    pub rotation_tolerance_ticks: i32,

    pub motor_test_percent: f64,
    pub diagnostics_min_current: f64,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        let side = SideConfig { inverted: false, sensor_phase: false, neutral_deadband: 0.04 };
        Self {
            geometry: DriveGeometry::reference(),
            left: side,
            right: SideConfig { inverted: true, ..side },
            tuning: DriveTuning::default(),
            heading: HeadingHoldConfig::default(),
            neutral_mode: NeutralMode::Brake,
            forward_scale: JoystickScale::Linear,
            turn_scale: JoystickScale::Square,
            low_sensitivity_gain: 0.6,
            max_velocity_ips: 120.0,
            max_omega_rad_per_sec: 6.0,
            // 0.125 inch of travel, about 0.6 degrees of frame rotation
            move_tolerance_ticks: 52,
            rotation_tolerance_ticks: 52,
            motor_test_percent: 0.25,
            diagnostics_min_current: 0.5,
        }
    }
}

impl ChassisConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ConfigurationError::check_fraction("low_sensitivity_gain", self.low_sensitivity_gain)?;
        ConfigurationError::check_fraction("motor_test_percent", self.motor_test_percent)?;
        ConfigurationError::check_positive("max_velocity_ips", self.max_velocity_ips)?;
        ConfigurationError::check_positive("max_omega_rad_per_sec", self.max_omega_rad_per_sec)?;
        ConfigurationError::check_positive("move_tolerance_ticks", self.move_tolerance_ticks as f64)?;
        ConfigurationError::check_positive(
            "rotation_tolerance_ticks",
            self.rotation_tolerance_ticks as f64,
        )?;
        self.heading.validate()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn derives_circumference_and_rotation_constant() {
        let g = DriveGeometry::new(6.25, 24.25, 2048, 4).unwrap();
        assert_eq!(g.ticks_per_rev(), 8192);
        assert_relative_eq!(g.wheel_circumference(), 19.634954, epsilon = 1e-5);
        // a full frame turn spins each wheel track/diameter times
        assert_relative_eq!(g.wheel_revs_per_frame_degree() * 360.0, 24.25 / 6.25, epsilon = 1e-9);
        assert_eq!(g, DriveGeometry::default());
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(matches!(
            DriveGeometry::new(0.0, 24.25, 2048, 4),
            Err(ConfigurationError::NonPositive { field: "wheel_diameter", .. })
        ));
        assert!(matches!(
            DriveGeometry::from_parts(19.63, -1.0, 8192, 4, 0.1),
            Err(ConfigurationError::NonPositive { field: "track_width", .. })
        ));
        assert!(matches!(
            DriveGeometry::from_parts(19.63, 24.25, 0, 4, 0.1),
            Err(ConfigurationError::NonPositive { field: "ticks_per_rev", .. })
        ));
    }

    #[test]
    fn geometry_loads_from_json() {
        let g: DriveGeometry = serde_json::from_str(
            r#"{ "wheel_circumference": 19.63, "track_width": 24.25, "ticks_per_rev": 8192 }"#,
        )
        .unwrap();
        assert_eq!(g.edges_per_count(), 4);
        assert_relative_eq!(
            g.wheel_revs_per_frame_degree(),
            (PI * 24.25 / 360.0) / 19.63,
            epsilon = 1e-12
        );

        let bad = serde_json::from_str::<DriveGeometry>(
            r#"{ "wheel_circumference": 0.0, "track_width": 24.25, "ticks_per_rev": 8192 }"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: ChassisConfig =
            serde_json::from_str(r#"{ "low_sensitivity_gain": 0.5, "turn_scale": "Cube" }"#).unwrap();
        assert_eq!(config.low_sensitivity_gain, 0.5);
        assert_eq!(config.turn_scale, JoystickScale::Cube);
        assert_eq!(config.geometry, DriveGeometry::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_tolerance_matches_an_eighth_inch() {
        let config = ChassisConfig::default();
        let g = config.geometry;
        let ticks = 0.125 / g.wheel_circumference() * g.ticks_per_rev() as f64;
        assert_eq!(config.move_tolerance_ticks, ticks as i32);
    }

    #[test]
    fn validate_catches_out_of_range_gain() {
        let config = ChassisConfig { low_sensitivity_gain: 1.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigurationError::OutOfRange { .. })));
    }

    #[test]
    fn sides_share_tuning() {
        let config = ChassisConfig::default();
        let left = config.left.motor_settings(&config.tuning);
        let right = config.right.motor_settings(&config.tuning);
        assert!(!left.inverted);
        assert!(right.inverted);
        assert_eq!(left.motion_gains, right.motion_gains);
    }
}
