use core::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

const SHAPE_DEADZONE: f64 = 0.05;

/// Response curve applied to a raw stick axis. Every curve maps [-1,1] onto itself and keeps
/// the sign of the input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoystickScale {
    #[default]
    Linear,
    Square,
    Cube,
    Sine,
}

impl JoystickScale {
    pub fn rescale(self, x: f64) -> f64 {
        let x = x.clamp(-1.0, 1.0);
        match self {
            Self::Linear => x,
            Self::Square => libm::copysign(x * x, x),
            Self::Cube => x * x * x,
            Self::Sine => libm::sin(FRAC_PI_2 * x),
        }
    }
}

pub fn deadzone(x: f64, band: f64) -> f64 {
    if libm::fabs(x) < band { 0.0 } else { x }
}

/// Deadzone then sign-preserving square, for the heading-hold sticks.
pub fn shape_axis(x: f64) -> f64 {
    let x = deadzone(x, SHAPE_DEADZONE);
    libm::copysign(x * x, x)
}
