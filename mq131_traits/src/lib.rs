pub mod clock;

pub use clock::{Clock, MonotonicClock, VirtualClock};

/// Heater control line of the sensor (active = heater powered).
pub trait DigitalOutput {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Voltage across the load resistor as a fraction of the reference voltage.
///
/// Implementations return a value in `[0.0, 1.0]`.
pub trait AnalogInput {
    fn read_normalized(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set(active)
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_normalized(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_normalized()
    }
}
