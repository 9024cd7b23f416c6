/// Write-only sink for dashboard values. Publishing is best-effort and nothing is ever read
/// back into the control path.
pub trait Telemetry {
    fn put_number(&mut self, key: &'static str, value: f64);

    fn put_bool(&mut self, key: &'static str, value: bool);
}

/// Discards everything.
impl Telemetry for () {
    fn put_number(&mut self, _key: &'static str, _value: f64) {}

    fn put_bool(&mut self, _key: &'static str, _value: bool) {}
}

impl<T: Telemetry + ?Sized> Telemetry for &mut T {
    fn put_number(&mut self, key: &'static str, value: f64) {
        (**self).put_number(key, value);
    }

    fn put_bool(&mut self, key: &'static str, value: bool) {
        (**self).put_bool(key, value);
    }
}
