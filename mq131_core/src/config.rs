//! Electrical configuration of the measuring circuit.

use crate::error::BuildError;
use crate::variant::SensorVariant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    pub variant: SensorVariant,
    /// RL in ohms
    pub load_resistance_ohms: f32,
    /// Divider supply, only used for diagnostics
    pub supply_voltage: f32,
    pub adc_max_count: u16,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            variant: SensorVariant::LowConcentration,
            load_resistance_ohms: 1_000_000.0,
            supply_voltage: 5.0,
            adc_max_count: 1023,
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> Result<(), BuildError> {
        if !(self.load_resistance_ohms.is_finite() && self.load_resistance_ohms > 0.0) {
            return Err(BuildError::InvalidConfig("load resistance must be > 0"));
        }
        if !(self.supply_voltage.is_finite() && self.supply_voltage > 0.0) {
            return Err(BuildError::InvalidConfig("supply voltage must be > 0"));
        }
        if self.adc_max_count == 0 {
            return Err(BuildError::InvalidConfig("adc_max_count must be >= 1"));
        }
        Ok(())
    }
}
