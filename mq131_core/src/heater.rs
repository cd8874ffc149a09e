//! Heater line control and the blocking heat/read cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mq131_traits::{AnalogInput, Clock, DigitalOutput};
use tracing::{debug, trace, warn};

use crate::cancel::CycleGuard;
use crate::error::{Report, Result, SensorError};
use crate::hw_error::map_hw_error;
use crate::sampler::{AnalogSampler, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterState {
    Off,
    Heating { since: Instant },
}

pub struct HeaterController {
    output: Box<dyn DigitalOutput + Send>,
    state: HeaterState,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for HeaterController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeaterController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl HeaterController {
    pub fn new(output: Box<dyn DigitalOutput + Send>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            output,
            state: HeaterState::Off,
            clock,
        }
    }

    pub fn state(&self) -> HeaterState {
        self.state
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Drive the heater high and restart the warm-up timer.
    pub fn start(&mut self) -> Result<()> {
        self.output
            .set(true)
            .map_err(|e| Report::new(map_hw_error(&*e)))?;
        self.state = HeaterState::Heating {
            since: self.clock.now(),
        };
        debug!("heater on");
        Ok(())
    }

    /// Drive the heater low.
    pub fn stop(&mut self) -> Result<()> {
        self.output
            .set(false)
            .map_err(|e| Report::new(map_hw_error(&*e)))?;
        self.state = HeaterState::Off;
        debug!("heater off");
        Ok(())
    }

    /// Whole seconds since the heater was switched on.
    pub fn heated_secs(&self) -> Option<u64> {
        match self.state {
            HeaterState::Off => None,
            HeaterState::Heating { since } => Some(self.clock.secs_since(since)),
        }
    }

    /// True once the heater has been on for `required_secs`. A zero
    /// requirement is never satisfied.
    pub fn is_ready(&self, required_secs: u32) -> bool {
        required_secs > 0
            && self
                .heated_secs()
                .is_some_and(|s| s >= u64::from(required_secs))
    }

    /// Poll once per second until the heater has been on for `required_secs`.
    pub fn wait_until_ready(&mut self, required_secs: u32, guard: &CycleGuard) -> Result<()> {
        if required_secs == 0 {
            return Err(Report::new(SensorError::InvalidValue(
                "pre-heat duration must be >= 1 s".into(),
            )));
        }
        loop {
            let Some(elapsed) = self.heated_secs() else {
                return Err(Report::new(SensorError::State(
                    "heater is off while waiting for pre-heat".into(),
                )));
            };
            if elapsed >= u64::from(required_secs) {
                return Ok(());
            }
            guard.check(elapsed).map_err(Report::new)?;
            trace!(elapsed, required_secs, "pre-heating");
            self.clock.sleep(Duration::from_secs(1));
        }
    }

    /// Heat for `required_secs`, read once, then switch the heater off.
    ///
    /// The heater is driven low on every exit path.
    pub fn run_blocking_cycle(
        &mut self,
        required_secs: u32,
        sampler: &AnalogSampler,
        input: &mut dyn AnalogInput,
        guard: &CycleGuard,
    ) -> Result<Sample> {
        if required_secs == 0 {
            return Err(Report::new(SensorError::InvalidValue(
                "pre-heat duration must be >= 1 s".into(),
            )));
        }
        guard.check(0).map_err(Report::new)?;
        self.start()?;
        let outcome = self
            .wait_until_ready(required_secs, guard)
            .and_then(|()| sampler.read(input));
        match outcome {
            Ok(sample) => {
                self.stop()?;
                Ok(sample)
            }
            Err(e) => {
                if let Err(stop_err) = self.stop() {
                    warn!(error = %stop_err, "failed to switch heater off after aborted cycle");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::config::SensorConfig;
    use crate::mocks::{SeqAnalog, SpyHeater};
    use mq131_traits::VirtualClock;

    fn controller(clock: &VirtualClock) -> (HeaterController, SpyHeater) {
        let spy = SpyHeater::new();
        let ctl = HeaterController::new(Box::new(spy.clone()), Arc::new(clock.clone()));
        (ctl, spy)
    }

    #[test]
    fn ready_only_after_required_seconds() {
        let clock = VirtualClock::new();
        let (mut ctl, spy) = controller(&clock);
        assert!(!ctl.is_ready(3));
        ctl.start().unwrap();
        assert!(spy.is_on());
        clock.sleep(Duration::from_secs(2));
        assert!(!ctl.is_ready(3));
        clock.sleep(Duration::from_secs(1));
        assert!(ctl.is_ready(3));
        ctl.stop().unwrap();
        assert_eq!(ctl.state(), HeaterState::Off);
        assert!(!ctl.is_ready(3));
    }

    #[test]
    fn zero_requirement_is_rejected() {
        let clock = VirtualClock::new();
        let (mut ctl, _spy) = controller(&clock);
        ctl.start().unwrap();
        assert!(!ctl.is_ready(0));
        let err = ctl
            .wait_until_ready(0, &CycleGuard::unbounded())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SensorError>(),
            Some(SensorError::InvalidValue(_))
        ));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn cycle_waits_then_switches_off() {
        let clock = VirtualClock::new();
        let (mut ctl, spy) = controller(&clock);
        let sampler = AnalogSampler::new(&SensorConfig::default());
        let mut input = SeqAnalog::new(vec![0.5]);
        let sample = ctl
            .run_blocking_cycle(5, &sampler, &mut input, &CycleGuard::unbounded())
            .unwrap();
        assert_eq!(sample.rs_ohms, 1_000_000.0);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
        assert_eq!(spy.transitions(), vec![true, false]);
    }

    #[test]
    fn cancelled_cycle_leaves_heater_off() {
        let clock = VirtualClock::new();
        let (mut ctl, spy) = controller(&clock);
        let sampler = AnalogSampler::new(&SensorConfig::default());
        let mut input = SeqAnalog::new(vec![0.5]);
        let token = CancelToken::new();
        token.cancel();
        let guard = CycleGuard::unbounded().with_cancel(token);
        let err = ctl
            .run_blocking_cycle(5, &sampler, &mut input, &guard)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<SensorError>(), Some(&SensorError::Cancelled));
        assert!(!spy.is_on());
    }

    #[test]
    fn deadline_aborts_preheat() {
        let clock = VirtualClock::new();
        let (mut ctl, spy) = controller(&clock);
        let sampler = AnalogSampler::new(&SensorConfig::default());
        let mut input = SeqAnalog::new(vec![0.5]);
        let guard = CycleGuard::unbounded().with_deadline_secs(3);
        let err = ctl
            .run_blocking_cycle(80, &sampler, &mut input, &guard)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SensorError>(),
            Some(&SensorError::DeadlineExceeded(3))
        );
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
        assert_eq!(spy.transitions(), vec![true, false]);
        assert_eq!(input.reads(), 0);
    }
}
