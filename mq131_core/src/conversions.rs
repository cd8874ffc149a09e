//! `From` implementations bridging `mq131_config` types to `mq131_core` types.

use crate::builder::Mq131Builder;
use crate::config::SensorConfig;
use crate::environment::Environment;
use crate::units::Unit;
use crate::variant::SensorVariant;

// ── Variant / Unit ───────────────────────────────────────────────────────────

impl From<mq131_config::Variant> for SensorVariant {
    fn from(v: mq131_config::Variant) -> Self {
        match v {
            mq131_config::Variant::LowConcentration => Self::LowConcentration,
            mq131_config::Variant::HighConcentration => Self::HighConcentration,
            mq131_config::Variant::SnO2LowConcentration => Self::SnO2LowConcentration,
        }
    }
}

impl From<mq131_config::Unit> for Unit {
    fn from(u: mq131_config::Unit) -> Self {
        match u {
            mq131_config::Unit::Ppm => Self::Ppm,
            mq131_config::Unit::Ppb => Self::Ppb,
            mq131_config::Unit::MgM3 => Self::MgM3,
            mq131_config::Unit::UgM3 => Self::UgM3,
        }
    }
}

// ── SensorConfig ─────────────────────────────────────────────────────────────

impl From<&mq131_config::SensorCfg> for SensorConfig {
    fn from(c: &mq131_config::SensorCfg) -> Self {
        Self {
            variant: c.variant.into(),
            load_resistance_ohms: c.load_resistance_ohms,
            supply_voltage: c.supply_voltage,
            adc_max_count: c.adc_max_count,
        }
    }
}

// ── Environment ──────────────────────────────────────────────────────────────

/// Field copy only; humidity is range-checked by `Config::validate`.
impl From<&mq131_config::Environment> for Environment {
    fn from(c: &mq131_config::Environment) -> Self {
        Self {
            temperature_c: c.temperature_c,
            humidity_pct: c.humidity_pct,
        }
    }
}

// ── Builder helpers ──────────────────────────────────────────────────────────

impl<H, A> Mq131Builder<H, A> {
    /// Apply the electrical and ambient sections of a loaded config.
    pub fn with_app_config(self, cfg: &mq131_config::Config) -> Self {
        self.with_config(SensorConfig::from(&cfg.sensor))
            .with_environment(cfg.environment.temperature_c, cfg.environment.humidity_pct)
            .with_persisted_calibration(cfg.calibration.as_ref())
    }

    /// Restore values saved from an earlier calibration; missing fields keep
    /// the variant defaults.
    pub fn with_persisted_calibration(
        self,
        cal: Option<&mq131_config::PersistedCalibration>,
    ) -> Self {
        let Some(cal) = cal else {
            return self;
        };
        let mut b = self;
        if let Some(r0) = cal.r0_ohms {
            b = b.with_r0(r0);
        }
        if let Some(secs) = cal.preheat_secs {
            b = b.with_preheat_secs(secs);
        }
        if let Some(n) = cal.stable_cycles {
            b = b.with_stable_cycles(n);
        }
        b
    }
}
