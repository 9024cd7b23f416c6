use crate::config::DriveGeometry;

/// Conversions between physical units (inches, degrees, inches/sec) and the native encoder
/// units of the drive controllers (ticks, ticks per 100 ms).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UnitConverter {
    geometry: DriveGeometry,
}

impl UnitConverter {
    pub const fn new(geometry: DriveGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &DriveGeometry {
        &self.geometry
    }

    fn ticks_per_rev(&self) -> f64 {
        self.geometry.ticks_per_rev() as f64
    }

    pub fn inches_to_ticks(&self, inches: f64) -> f64 {
        (inches / self.geometry.wheel_circumference()) * self.ticks_per_rev()
    }

    pub fn ticks_to_inches(&self, ticks: f64) -> f64 {
        ticks / self.ticks_per_rev() * self.geometry.wheel_circumference()
    }

    /// Wheel travel, in ticks, that rotates the frame by `degrees` when the sides run in
    /// opposite directions.
    pub fn degrees_to_ticks(&self, degrees: f64) -> f64 {
        degrees * self.geometry.wheel_revs_per_frame_degree() * self.ticks_per_rev()
    }

    pub fn ticks_to_degrees(&self, ticks: f64) -> f64 {
        ticks / self.ticks_per_rev() / self.geometry.wheel_revs_per_frame_degree()
    }

    pub fn ips_to_ticks_per_100ms(&self, ips: f64) -> f64 {
        // in/s -> rev/s -> rev/100ms -> ticks/100ms
        let revs_per_sec = ips / self.geometry.wheel_circumference();
        revs_per_sec / 10.0 * self.ticks_per_rev()
    }

    pub fn ticks_per_100ms_to_ips(&self, ticks_per_100ms: f64) -> f64 {
        ticks_per_100ms / self.ticks_per_rev() * 10.0 * self.geometry.wheel_circumference()
    }

    /// Encoder counts (one per full quadrature cycle) from native edge ticks.
    pub fn ticks_to_counts(&self, ticks: f64) -> f64 {
        ticks / self.geometry.edges_per_count() as f64
    }
}

impl From<DriveGeometry> for UnitConverter {
    fn from(geometry: DriveGeometry) -> Self {
        Self::new(geometry)
    }
}
