pub mod error;
pub mod mcp3008;

use mq131_traits::{AnalogInput, Clock, DigitalOutput};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::HwError;

/// Parameters of the simulated MQ131 warm-up behaviour.
///
/// With the heater off the element sits at `cold_ohms`. Once powered, its
/// resistance decays exponentially towards `settled_ohms * ozone_ratio` with
/// time constant `tau_secs`. Readings are quantized to `adc_max_count` steps
/// like a real converter would.
#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    pub load_resistance_ohms: f32,
    pub cold_ohms: f32,
    pub settled_ohms: f32,
    pub tau_secs: f32,
    /// Rs/R0 shift caused by ozone (1.0 = clean air).
    pub ozone_ratio: f32,
    pub adc_max_count: u16,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            load_resistance_ohms: 1_000_000.0,
            cold_ohms: 2_000_000.0,
            settled_ohms: 20_000.0,
            tau_secs: 8.0,
            ozone_ratio: 1.0,
            adc_max_count: mcp3008::MAX_COUNT,
        }
    }
}

type HeatedSince = Arc<Mutex<Option<Instant>>>;

/// Build a simulated heater and sensor that share one thermal state.
pub fn simulated_pair<C>(clock: C, params: SimParams) -> (SimulatedHeater<C>, SimulatedMq131<C>)
where
    C: Clock + Clone,
{
    let since: HeatedSince = Arc::new(Mutex::new(None));
    let heater = SimulatedHeater {
        clock: clock.clone(),
        since: since.clone(),
    };
    let sensor = SimulatedMq131 {
        clock,
        since,
        params,
        fault: None,
    };
    (heater, sensor)
}

/// Simulated heater line
pub struct SimulatedHeater<C: Clock> {
    clock: C,
    since: HeatedSince,
}

impl<C: Clock> SimulatedHeater<C> {
    pub fn is_on(&self) -> bool {
        self.since.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}

impl<C: Clock> DigitalOutput for SimulatedHeater<C> {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut since = self
            .since
            .lock()
            .map_err(|_| HwError::Gpio("simulated heater state poisoned".into()))?;
        if active {
            if since.is_none() {
                *since = Some(self.clock.now());
            }
        } else {
            *since = None;
        }
        tracing::trace!(active, "heater (simulated)");
        Ok(())
    }
}

/// Fault injected into the simulated sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFault {
    /// Every read times out.
    Timeout,
    /// The divider output is stuck at 0 V.
    Disconnected,
}

/// Simulated MQ131 behind a load resistor and ADC
pub struct SimulatedMq131<C: Clock> {
    clock: C,
    since: HeatedSince,
    params: SimParams,
    fault: Option<SimFault>,
}

impl<C: Clock> SimulatedMq131<C> {
    pub fn with_fault(mut self, fault: SimFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Noise-free element resistance at the current instant.
    pub fn resistance_now(&self) -> f32 {
        let p = &self.params;
        let heated_for = self
            .since
            .lock()
            .ok()
            .and_then(|g| *g)
            .map(|t0| self.clock.now().saturating_duration_since(t0).as_secs_f32());
        match heated_for {
            None => p.cold_ohms,
            Some(t) => {
                let target = p.settled_ohms * p.ozone_ratio;
                target + (p.cold_ohms - target) * (-t / p.tau_secs.max(f32::EPSILON)).exp()
            }
        }
    }
}

impl<C: Clock> AnalogInput for SimulatedMq131<C> {
    fn read_normalized(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        match self.fault {
            Some(SimFault::Timeout) => return Err(Box::new(HwError::Timeout)),
            Some(SimFault::Disconnected) => return Ok(0.0),
            None => {}
        }
        let rl = self.params.load_resistance_ohms;
        let rs = self.resistance_now();
        let max = f32::from(self.params.adc_max_count.max(1));
        let counts = (rl / (rl + rs) * max).round();
        tracing::trace!(rs, counts, "mq131 read (simulated)");
        Ok(counts / max)
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareHeater {
    pin: rppal::gpio::OutputPin,
}

#[cfg(feature = "hardware")]
impl HardwareHeater {
    pub fn new(pin: u8) -> Result<Self, HwError> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        // heater off until a cycle starts
        pin.set_low();
        Ok(Self { pin })
    }
}

#[cfg(feature = "hardware")]
impl DigitalOutput for HardwareHeater {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if active {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        tracing::debug!(active, "heater");
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareAnalog {
    adc: mcp3008::Mcp3008,
    max_count: u16,
}

#[cfg(feature = "hardware")]
impl HardwareAnalog {
    pub fn new(bus: u8, slave_select: u8, channel: u8, max_count: u16) -> Result<Self, HwError> {
        let adc = mcp3008::Mcp3008::new(bus, slave_select, channel, 1_000_000)?;
        Ok(Self {
            adc,
            max_count: max_count.max(1),
        })
    }
}

#[cfg(feature = "hardware")]
impl AnalogInput for HardwareAnalog {
    fn read_normalized(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        match self.adc.read_counts() {
            Ok(counts) => {
                let n = (f32::from(counts) / f32::from(self.max_count)).clamp(0.0, 1.0);
                tracing::debug!(counts, normalized = n, "adc sample");
                Ok(n)
            }
            Err(e) => {
                tracing::error!("ADC read error: {}", e);
                Err(Box::new(e))
            }
        }
    }
}
