//! Ambient temperature/humidity and the resistance correction they imply.

use crate::error::SensorError;

/// Ambient conditions the sensor is operating in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    pub temperature_c: i8,
    pub humidity_pct: u8,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature_c: 20,
            humidity_pct: 65,
        }
    }
}

impl Environment {
    /// Conditions under which the correction ratio is exactly 1.
    pub const REFERENCE: Self = Self {
        temperature_c: 20,
        humidity_pct: 60,
    };

    pub fn new(temperature_c: i8, humidity_pct: u8) -> Result<Self, SensorError> {
        if humidity_pct > 100 {
            return Err(SensorError::InvalidValue(format!(
                "humidity {humidity_pct}% is outside [0, 100]"
            )));
        }
        Ok(Self {
            temperature_c,
            humidity_pct,
        })
    }

    /// Factor applied to Rs/R0 to compensate for temperature and humidity.
    ///
    /// Piecewise linear in temperature, one line per humidity band:
    /// above 75 %, above 50 % up to 75 %, and 50 % or below.
    pub fn correction_ratio(&self) -> f32 {
        if *self == Self::REFERENCE {
            return 1.0;
        }
        let t = f64::from(self.temperature_c);
        let ratio = match self.humidity_pct {
            h if h > 75 => -0.0141 * t + 1.5623,
            h if h > 50 => -0.0119 * t + 1.3261,
            _ => -0.0103 * t + 1.1507,
        };
        ratio as f32
    }
}
