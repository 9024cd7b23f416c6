use crate::units::UnitConverter;

/// Tolerance checks for closed-loop moves. Each check is a pure function of the encoder
/// readings passed in; polling cadence and timeouts belong to the caller, since a jammed
/// mechanism never reaches its goal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GoalTracker {
    converter: UnitConverter,
}

impl GoalTracker {
    pub const fn new(converter: UnitConverter) -> Self {
        Self { converter }
    }

    /// Target for a linear move, truncated to whole ticks the way it is commanded.
    pub fn linear_target_ticks(&self, inches: f64) -> i32 {
        self.converter.inches_to_ticks(inches) as i32
    }

    /// Left-side target for an in-place rotation; the right side runs the negation.
    pub fn rotation_target_ticks(&self, degrees: f64) -> i32 {
        self.converter.degrees_to_ticks(degrees) as i32
    }

    pub fn is_linear_move_complete(
        &self,
        target_inches: f64,
        tolerance_ticks: i32,
        left_ticks: i32,
        right_ticks: i32,
    ) -> bool {
        let target = self.linear_target_ticks(target_inches);
        within(left_ticks, target, tolerance_ticks) && within(right_ticks, target, tolerance_ticks)
    }

    pub fn is_rotation_complete(
        &self,
        target_degrees: f64,
        tolerance_ticks: i32,
        left_ticks: i32,
        right_ticks: i32,
    ) -> bool {
        let target = self.rotation_target_ticks(target_degrees);
        within(left_ticks, target, tolerance_ticks) && within(right_ticks, -target, tolerance_ticks)
    }
}

fn within(actual: i32, target: i32, tolerance: i32) -> bool {
    (i64::from(actual) - i64::from(target)).abs() <= i64::from(tolerance)
}
