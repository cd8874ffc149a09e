//! One-shot reading of the load-resistor divider.

use mq131_traits::AnalogInput;
use tracing::{trace, warn};

use crate::config::SensorConfig;
use crate::error::{Report, Result, SensorError};
use crate::hw_error::map_hw_error;

/// A single reading of the sensing element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Voltage across RL as a fraction of the supply.
    pub normalized: f32,
    /// `normalized` scaled back to ADC counts
    pub counts: u32,
    pub load_voltage: f32,
    /// Sensor resistance in ohms; 0 when the divider reads 0 V.
    pub rs_ohms: f32,
}

/// Converts divider readings into sensor resistance.
#[derive(Debug, Clone, Copy)]
pub struct AnalogSampler {
    load_resistance_ohms: f32,
    supply_voltage: f32,
    adc_max_count: u16,
}

impl AnalogSampler {
    pub fn new(cfg: &SensorConfig) -> Self {
        Self {
            load_resistance_ohms: cfg.load_resistance_ohms,
            supply_voltage: cfg.supply_voltage,
            adc_max_count: cfg.adc_max_count,
        }
    }

    pub fn load_resistance_ohms(&self) -> f32 {
        self.load_resistance_ohms
    }

    /// Rs = (1/n - 1) * RL. A reading of exactly 0 yields 0 ohms.
    #[inline]
    pub fn resistance_from_normalized(&self, n: f32) -> f32 {
        if n == 0.0 {
            return 0.0;
        }
        (1.0 / n - 1.0) * self.load_resistance_ohms
    }

    pub fn sample_from_normalized(&self, n: f32) -> Sample {
        let counts = (n * f32::from(self.adc_max_count)).round() as u32;
        Sample {
            normalized: n,
            counts,
            load_voltage: n * self.supply_voltage,
            rs_ohms: self.resistance_from_normalized(n),
        }
    }

    pub fn read(&self, input: &mut dyn AnalogInput) -> Result<Sample> {
        let raw = input
            .read_normalized()
            .map_err(|e| Report::new(map_hw_error(&*e)))?;
        if raw.is_nan() {
            return Err(Report::new(SensorError::HardwareFault(
                "analog input returned NaN".into(),
            )));
        }
        let n = if (0.0..=1.0).contains(&raw) {
            raw
        } else {
            warn!(raw, "analog reading outside [0, 1], clamping");
            raw.clamp(0.0, 1.0)
        };
        let sample = self.sample_from_normalized(n);
        trace!(
            normalized = n,
            counts = sample.counts,
            rs_ohms = sample.rs_ohms,
            "sensor read"
        );
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::SeqAnalog;

    fn sampler(rl: f32) -> AnalogSampler {
        AnalogSampler::new(&SensorConfig {
            load_resistance_ohms: rl,
            ..SensorConfig::default()
        })
    }

    #[test]
    fn zero_reading_is_zero_ohms() {
        assert_eq!(sampler(1e6).resistance_from_normalized(0.0), 0.0);
    }

    #[test]
    fn half_scale_equals_load_resistance() {
        assert_eq!(sampler(10_000.0).resistance_from_normalized(0.5), 10_000.0);
    }

    #[test]
    fn diagnostics_follow_the_reading() {
        let s = sampler(1e6).sample_from_normalized(0.5);
        assert_eq!(s.counts, 512);
        assert_eq!(s.load_voltage, 2.5);
    }

    #[test]
    fn out_of_range_readings_are_clamped() {
        let s = sampler(1e6);
        let mut input = SeqAnalog::new(vec![1.5]);
        let sample = s.read(&mut input).unwrap();
        assert_eq!(sample.normalized, 1.0);
        assert_eq!(sample.rs_ohms, 0.0);
    }

    #[test]
    fn nan_is_a_fault() {
        let s = sampler(1e6);
        let mut input = SeqAnalog::new(vec![f32::NAN]);
        let err = s.read(&mut input).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SensorError>(),
            Some(SensorError::HardwareFault(_))
        ));
    }
}
