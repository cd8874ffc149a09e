//! The MQ131 driver facade.

use std::sync::Arc;

use mq131_traits::{AnalogInput, Clock};
use tracing::{info, warn};

use crate::builder::{Missing, Mq131Builder};
use crate::calibration::{CalibrationState, Calibrator};
use crate::cancel::CycleGuard;
use crate::concentration::ConcentrationModel;
use crate::config::SensorConfig;
use crate::environment::Environment;
use crate::error::{Report, Result, SensorError};
use crate::gas::Gas;
use crate::heater::{HeaterController, HeaterState};
use crate::logger::Logger;
use crate::sampler::{AnalogSampler, Sample};
use crate::units::Unit;
use crate::variant::SensorVariant;

/// A stored sample together with the pre-heat it was taken under.
#[derive(Debug, Clone, Copy)]
struct LastSample {
    sample: Sample,
    preheat_secs: u32,
}

/// Snapshot of the latest measurement for one gas, expressed in one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub gas: Gas,
    pub rs_ohms: f32,
    pub r0_ohms: f32,
    /// Environment-corrected Rs/R0 fed to the gas curve
    pub ratio: f32,
    pub value: f32,
    pub unit: Unit,
    pub counts: u32,
    pub load_voltage: f32,
    /// Pre-heat the sample was taken with
    pub preheat_secs: u32,
}

pub struct Mq131 {
    pub(crate) config: SensorConfig,
    pub(crate) heater: HeaterController,
    pub(crate) input: Box<dyn AnalogInput + Send>,
    pub(crate) sampler: AnalogSampler,
    pub(crate) model: ConcentrationModel,
    pub(crate) calibration: CalibrationState,
    pub(crate) environment: Environment,
    pub(crate) stable_cycles: u8,
    pub(crate) logger: Option<Arc<dyn Logger + Send + Sync>>,
    last_sample: Option<LastSample>,
}

impl core::fmt::Debug for Mq131 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mq131")
            .field("variant", &self.config.variant)
            .field("r0_ohms", &self.calibration.r0_ohms)
            .field("preheat_secs", &self.calibration.preheat_secs)
            .field("environment", &self.environment)
            .field("heater", &self.heater.state())
            .finish_non_exhaustive()
    }
}

impl Mq131 {
    /// Start building a sensor.
    pub fn builder() -> Mq131Builder<Missing, Missing> {
        Mq131Builder::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        config: SensorConfig,
        heater: HeaterController,
        input: Box<dyn AnalogInput + Send>,
        calibration: CalibrationState,
        environment: Environment,
        stable_cycles: u8,
        logger: Option<Arc<dyn Logger + Send + Sync>>,
    ) -> Self {
        Self {
            sampler: AnalogSampler::new(&config),
            model: ConcentrationModel::new(config.variant),
            config,
            heater,
            input,
            calibration,
            environment,
            stable_cycles,
            logger,
            last_sample: None,
        }
    }

    pub fn variant(&self) -> SensorVariant {
        self.config.variant
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn heater_state(&self) -> HeaterState {
        self.heater.state()
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.heater.clock().clone()
    }

    /// Heat for the current pre-heat duration, read once, store and return Rs.
    pub fn take_sample(&mut self) -> Result<f32> {
        self.take_sample_guarded(&CycleGuard::unbounded())
            .map(|s| s.rs_ohms)
    }

    /// Like `take_sample` but abortable through `guard`.
    ///
    /// On cancellation or deadline the heater is switched off and the
    /// previously stored sample is kept.
    pub fn take_sample_guarded(&mut self, guard: &CycleGuard) -> Result<Sample> {
        let required = self.calibration.preheat_secs;
        info!(variant = %self.config.variant, preheat_secs = required, "heat/read cycle");
        let sample =
            self.heater
                .run_blocking_cycle(required, &self.sampler, &mut *self.input, guard)?;
        self.last_sample = Some(LastSample {
            sample,
            preheat_secs: required,
        });
        info!(rs_ohms = sample.rs_ohms, counts = sample.counts, "sample stored");
        Ok(sample)
    }

    /// Read the divider once without touching the heater or the stored sample.
    pub fn probe(&mut self) -> Result<Sample> {
        self.sampler.read(&mut *self.input)
    }

    /// Stored sample, if one exists and was taken with at least the current pre-heat.
    pub fn last_sample(&self) -> Option<Sample> {
        self.fresh_sample().map(|s| s.sample)
    }

    fn fresh_sample(&self) -> Option<LastSample> {
        self.last_sample
            .filter(|s| s.preheat_secs >= self.calibration.preheat_secs)
    }

    /// Environment-corrected Rs/R0 of the stored sample.
    pub fn ratio(&self) -> Option<f32> {
        self.last_sample()
            .map(|s| self.model.ratio(s.rs_ohms, self.calibration.r0_ohms, &self.environment))
    }

    /// Ozone concentration of the stored sample in `unit`, or 0 without one.
    pub fn concentration(&self, unit: Unit) -> f32 {
        self.gas_concentration(Gas::Ozone, unit)
    }

    /// Concentration of `gas` for the stored sample in `unit`, or 0 without one.
    pub fn gas_concentration(&self, gas: Gas, unit: Unit) -> f32 {
        self.reading_for(gas, unit).map_or(0.0, |r| r.value)
    }

    pub fn reading(&self, unit: Unit) -> Option<Reading> {
        self.reading_for(Gas::Ozone, unit)
    }

    pub fn reading_for(&self, gas: Gas, unit: Unit) -> Option<Reading> {
        let LastSample {
            sample,
            preheat_secs,
        } = self.fresh_sample()?;
        let r0 = self.calibration.r0_ohms;
        let env = &self.environment;
        Some(Reading {
            gas,
            rs_ohms: sample.rs_ohms,
            r0_ohms: r0,
            ratio: self.model.ratio_for(gas, sample.rs_ohms, r0, env),
            value: self
                .model
                .evaluate_for(gas, sample.rs_ohms, r0, env, unit),
            unit,
            counts: sample.counts,
            load_voltage: sample.load_voltage,
            preheat_secs,
        })
    }

    /// Find R0 and the pre-heat duration in clean air, then adopt them.
    pub fn calibrate(&mut self) -> Result<CalibrationState> {
        self.calibrate_guarded(&CycleGuard::unbounded())
    }

    /// Like `calibrate` but abortable through `guard`.
    ///
    /// Any failure leaves R0 and the pre-heat duration unchanged.
    pub fn calibrate_guarded(&mut self, guard: &CycleGuard) -> Result<CalibrationState> {
        let calibrator = Calibrator::new(self.stable_cycles);
        let state = calibrator.run(
            &mut self.heater,
            &self.sampler,
            &mut *self.input,
            guard,
            self.logger.as_deref(),
        )?;
        self.calibration = state;
        Ok(state)
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }

    pub fn r0(&self) -> f32 {
        self.calibration.r0_ohms
    }

    pub fn set_r0(&mut self, r0_ohms: f32) -> Result<()> {
        if !(r0_ohms.is_finite() && r0_ohms > 0.0) {
            return Err(Report::new(SensorError::InvalidValue(format!(
                "R0 must be a positive number of ohms, got {r0_ohms}"
            ))));
        }
        self.calibration.r0_ohms = r0_ohms;
        Ok(())
    }

    pub fn preheat_secs(&self) -> u32 {
        self.calibration.preheat_secs
    }

    /// Change the pre-heat duration. Raising it invalidates the stored sample.
    pub fn set_preheat_secs(&mut self, secs: u32) -> Result<()> {
        if secs == 0 {
            return Err(Report::new(SensorError::InvalidValue(
                "pre-heat duration must be >= 1 s".into(),
            )));
        }
        self.calibration.preheat_secs = secs;
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn set_environment(&mut self, temperature_c: i8, humidity_pct: u8) -> Result<()> {
        self.environment = Environment::new(temperature_c, humidity_pct).map_err(Report::new)?;
        Ok(())
    }

    pub fn stable_cycles(&self) -> u8 {
        self.stable_cycles
    }

    pub fn set_stable_cycles(&mut self, cycles: u8) -> Result<()> {
        if cycles == 0 {
            return Err(Report::new(SensorError::InvalidValue(
                "stable cycles must be >= 1".into(),
            )));
        }
        self.stable_cycles = cycles;
        Ok(())
    }

    /// Switch the heater off (best-effort).
    pub fn heater_off(&mut self) -> Result<()> {
        self.heater.stop()
    }
}

impl Drop for Mq131 {
    fn drop(&mut self) {
        if matches!(self.heater.state(), HeaterState::Heating { .. })
            && let Err(e) = self.heater.stop()
        {
            warn!(error = %e, "failed to switch heater off on drop");
        }
    }
}
