//! Type-state builder for `Mq131`.
//!
//! `build()` becomes available once both the heater output and the analog
//! input are provided. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use mq131_traits::{AnalogInput, Clock, DigitalOutput, MonotonicClock};
use tracing::debug;

use crate::calibration::CalibrationState;
use crate::config::SensorConfig;
use crate::environment::Environment;
use crate::error::{BuildError, Result};
use crate::heater::HeaterController;
use crate::logger::Logger;
use crate::sensor::Mq131;
use crate::variant::SensorVariant;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Mq131`. All values are validated on `build()`.
pub struct Mq131Builder<H, A> {
    heater: Option<Box<dyn DigitalOutput + Send>>,
    analog: Option<Box<dyn AnalogInput + Send>>,
    config: SensorConfig,
    r0_ohms: Option<f32>,
    preheat_secs: Option<u32>,
    stable_cycles: Option<u8>,
    environment: Option<(i8, u8)>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    logger: Option<Arc<dyn Logger + Send + Sync>>,
    _h: PhantomData<H>,
    _a: PhantomData<A>,
}

impl Default for Mq131Builder<Missing, Missing> {
    fn default() -> Self {
        Self {
            heater: None,
            analog: None,
            config: SensorConfig::default(),
            r0_ohms: None,
            preheat_secs: None,
            stable_cycles: None,
            environment: None,
            clock: None,
            logger: None,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

impl<H, A> Mq131Builder<H, A> {
    /// Fallible build available in any type-state; reports missing pieces.
    pub fn try_build(self) -> Result<Mq131> {
        let heater = self
            .heater
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHeater))?;
        let analog = self
            .analog
            .ok_or_else(|| eyre::Report::new(BuildError::MissingAnalog))?;

        // ── Validation ───────────────────────────────────────────────────────
        self.config.validate().map_err(eyre::Report::new)?;
        let defaults = CalibrationState::defaults_for(self.config.variant);
        let r0_ohms = self.r0_ohms.unwrap_or(defaults.r0_ohms);
        if !(r0_ohms.is_finite() && r0_ohms > 0.0) {
            return Err(invalid("R0 must be > 0"));
        }
        let preheat_secs = self.preheat_secs.unwrap_or(defaults.preheat_secs);
        if preheat_secs == 0 {
            return Err(invalid("pre-heat duration must be >= 1 s"));
        }
        let stable_cycles = self
            .stable_cycles
            .unwrap_or(self.config.variant.profile().default_stable_cycles);
        if stable_cycles == 0 {
            return Err(invalid("stable cycles must be >= 1"));
        }
        let environment = match self.environment {
            Some((t, h)) => {
                Environment::new(t, h).map_err(|_| invalid("humidity must be in [0, 100]"))?
            }
            None => Environment::default(),
        };

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let mut heater = HeaterController::new(heater, clock);
        // heater starts low
        heater.stop()?;

        debug!(
            variant = %self.config.variant,
            r0_ohms,
            preheat_secs,
            stable_cycles,
            "mq131 built"
        );
        Ok(Mq131::from_parts(
            self.config,
            heater,
            analog,
            CalibrationState {
                r0_ohms,
                preheat_secs,
            },
            environment,
            stable_cycles,
            self.logger,
        ))
    }

    fn retype<H2, A2>(self) -> Mq131Builder<H2, A2> {
        Mq131Builder {
            heater: self.heater,
            analog: self.analog,
            config: self.config,
            r0_ohms: self.r0_ohms,
            preheat_secs: self.preheat_secs,
            stable_cycles: self.stable_cycles,
            environment: self.environment,
            clock: self.clock,
            logger: self.logger,
            _h: PhantomData,
            _a: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<H, A> Mq131Builder<H, A> {
    pub fn with_variant(mut self, variant: SensorVariant) -> Self {
        self.config.variant = variant;
        self
    }
    pub fn with_load_resistance(mut self, ohms: f32) -> Self {
        self.config.load_resistance_ohms = ohms;
        self
    }
    /// Replace the whole electrical configuration, variant included.
    pub fn with_config(mut self, config: SensorConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_r0(mut self, r0_ohms: f32) -> Self {
        self.r0_ohms = Some(r0_ohms);
        self
    }
    pub fn with_preheat_secs(mut self, secs: u32) -> Self {
        self.preheat_secs = Some(secs);
        self
    }
    pub fn with_stable_cycles(mut self, cycles: u8) -> Self {
        self.stable_cycles = Some(cycles);
        self
    }
    pub fn with_environment(mut self, temperature_c: i8, humidity_pct: u8) -> Self {
        self.environment = Some((temperature_c, humidity_pct));
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }
    pub fn with_logger(mut self, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        self.logger = Some(logger);
        self
    }
}

// Setters that advance type-state
impl<A> Mq131Builder<Missing, A> {
    pub fn with_heater(
        mut self,
        heater: impl DigitalOutput + Send + 'static,
    ) -> Mq131Builder<Set, A> {
        self.heater = Some(Box::new(heater));
        self.retype()
    }
}

impl<H> Mq131Builder<H, Missing> {
    pub fn with_analog(
        mut self,
        analog: impl AnalogInput + Send + 'static,
    ) -> Mq131Builder<H, Set> {
        self.analog = Some(Box::new(analog));
        self.retype()
    }
}

impl Mq131Builder<Set, Set> {
    pub fn build(self) -> Result<Mq131> {
        self.try_build()
    }
}
