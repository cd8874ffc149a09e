//! Baseline (R0) calibration in clean air.
//!
//! The heater stays on while the sensor is read once per second. Each reading
//! is truncated to whole ohms and compared with the last two distinct values
//! seen. Calibration ends once the reading has matched one of them for more
//! than `stable_cycles` consecutive seconds. The most recent distinct value
//! becomes R0 and the elapsed seconds become the new pre-heat duration.

use std::time::Duration;

use mq131_traits::{AnalogInput, Clock};
use tracing::{debug, info, warn};

use crate::cancel::CycleGuard;
use crate::error::{Report, Result, SensorError};
use crate::heater::HeaterController;
use crate::logger::Logger;
use crate::sampler::AnalogSampler;
use crate::variant::SensorVariant;

/// Baseline resistance and the warm-up it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    pub r0_ohms: f32,
    pub preheat_secs: u32,
}

impl CalibrationState {
    pub fn defaults_for(variant: SensorVariant) -> Self {
        let p = variant.profile();
        Self {
            r0_ohms: p.default_r0_ohms,
            preheat_secs: p.default_preheat_secs,
        }
    }
}

/// Two-deep memory of distinct readings plus the current run length.
#[derive(Debug, Clone, Default)]
pub struct StabilityWindow {
    last: f32,
    last_last: f32,
    in_row: u32,
    seconds: u32,
}

impl StabilityWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reading taken one second after the previous one.
    pub fn observe(&mut self, rs_ohms: f32) {
        let v = rs_ohms as u32;
        if v != self.last as u32 && v != self.last_last as u32 {
            self.last_last = self.last;
            self.last = rs_ohms;
            self.in_row = 0;
        } else {
            self.in_row += 1;
        }
        self.seconds += 1;
    }

    pub fn is_stable(&self, stable_cycles: u8) -> bool {
        self.in_row > u32::from(stable_cycles)
    }

    /// Most recent distinct reading.
    pub fn baseline(&self) -> f32 {
        self.last
    }

    pub fn run_length(&self) -> u32 {
        self.in_row
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Calibrator {
    stable_cycles: u8,
}

impl Calibrator {
    pub fn new(stable_cycles: u8) -> Self {
        Self {
            stable_cycles: stable_cycles.max(1),
        }
    }

    pub fn stable_cycles(&self) -> u8 {
        self.stable_cycles
    }

    /// Run a full calibration. The heater is off again when this returns.
    pub fn run(
        &self,
        heater: &mut HeaterController,
        sampler: &AnalogSampler,
        input: &mut dyn AnalogInput,
        guard: &CycleGuard,
        logger: Option<&(dyn Logger + Send + Sync)>,
    ) -> Result<CalibrationState> {
        guard.check(0).map_err(Report::new)?;
        let clock = heater.clock().clone();
        heater.start()?;
        let started = clock.now();
        info!(stable_cycles = self.stable_cycles, "calibration started");
        if let Some(l) = logger {
            l.info(&format!(
                "calibration started (needs {} stable seconds)",
                self.stable_cycles
            ));
        }

        let outcome = self.converge(sampler, input, guard, &*clock, started, logger);
        if let Err(e) = heater.stop() {
            warn!(error = %e, "failed to switch heater off after calibration");
            if outcome.is_ok() {
                return Err(e);
            }
        }
        let window = outcome?;

        let r0 = window.baseline();
        if !(r0.is_finite() && r0 > 0.0) {
            warn!(r0, "calibration converged on a degenerate baseline");
            return Err(Report::new(SensorError::DegenerateCalibration(r0)));
        }
        let state = CalibrationState {
            r0_ohms: r0,
            preheat_secs: window.seconds(),
        };
        info!(
            r0_ohms = state.r0_ohms,
            preheat_secs = state.preheat_secs,
            "calibration done"
        );
        if let Some(l) = logger {
            l.info(&format!(
                "calibration done: R0 = {:.2} ohms, pre-heat = {} s",
                state.r0_ohms, state.preheat_secs
            ));
        }
        Ok(state)
    }

    fn converge(
        &self,
        sampler: &AnalogSampler,
        input: &mut dyn AnalogInput,
        guard: &CycleGuard,
        clock: &(dyn Clock + Send + Sync),
        started: std::time::Instant,
        logger: Option<&(dyn Logger + Send + Sync)>,
    ) -> Result<StabilityWindow> {
        let mut window = StabilityWindow::new();
        while !window.is_stable(self.stable_cycles) {
            guard.check(clock.secs_since(started)).map_err(Report::new)?;
            let sample = sampler.read(input)?;
            window.observe(sample.rs_ohms);
            debug!(
                second = window.seconds(),
                rs_ohms = sample.rs_ohms,
                run = window.run_length(),
                "calibration step"
            );
            if let Some(l) = logger {
                l.info(&format!(
                    "t={}s rs={:.2} ohms stable={}/{}",
                    window.seconds(),
                    sample.rs_ohms,
                    window.run_length(),
                    self.stable_cycles
                ));
            }
            clock.sleep(Duration::from_secs(1));
        }
        Ok(window)
    }
}
