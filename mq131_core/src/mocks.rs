//! Test and helper mocks for mq131_core

use std::sync::{Arc, Mutex};

use mq131_traits::{AnalogInput, DigitalOutput};

/// Heater output that records every level it is driven to.
///
/// Clones share the same record, so a test can keep one handle while the
/// sensor owns the other.
#[derive(Debug, Clone, Default)]
pub struct SpyHeater {
    log: Arc<Mutex<Vec<bool>>>,
}

impl SpyHeater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<bool> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn is_on(&self) -> bool {
        self.transitions().last().copied().unwrap_or(false)
    }
}

impl DigitalOutput for SpyHeater {
    fn set(&mut self, active: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log
            .lock()
            .map_err(|_| std::io::Error::other("spy heater poisoned"))?
            .push(active);
        Ok(())
    }
}

/// Replays normalized readings in order, repeating the last one forever.
#[derive(Debug, Clone)]
pub struct SeqAnalog {
    seq: Vec<f32>,
    idx: usize,
    reads: Arc<Mutex<usize>>,
}

impl SeqAnalog {
    pub fn new(seq: Vec<f32>) -> Self {
        Self {
            seq,
            idx: 0,
            reads: Arc::new(Mutex::new(0)),
        }
    }

    /// Readings that make the divider report the given resistances.
    pub fn from_resistances(rs_ohms: &[f32], load_resistance_ohms: f32) -> Self {
        Self::new(
            rs_ohms
                .iter()
                .map(|rs| load_resistance_ohms / (load_resistance_ohms + rs))
                .collect(),
        )
    }

    /// Number of reads served so far, shared between clones.
    pub fn reads(&self) -> usize {
        self.reads.lock().map(|g| *g).unwrap_or(0)
    }
}

impl AnalogInput for SeqAnalog {
    fn read_normalized(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let v = match self.seq.get(self.idx) {
            Some(v) => {
                self.idx += 1;
                *v
            }
            None => *self
                .seq
                .last()
                .ok_or_else(|| std::io::Error::other("empty sequence"))?,
        };
        if let Ok(mut n) = self.reads.lock() {
            *n += 1;
        }
        Ok(v)
    }
}

/// Analog input that fails every read with the given message.
#[derive(Debug, Clone)]
pub struct FailingAnalog(pub &'static str);

impl AnalogInput for FailingAnalog {
    fn read_normalized(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other(self.0)))
    }
}
