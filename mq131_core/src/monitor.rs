//! Periodic background measurement.
//!
//! Spawns a thread that owns the `Mq131`, runs one heat/read cycle per
//! interval and publishes readings over a bounded channel.
//!
//! Each `Monitor` spawns exactly one thread; dropping the `Monitor` cancels
//! the running cycle and joins the thread.
use std::time::Duration;

use crossbeam_channel as xch;
use tracing::{debug, info, trace, warn};

use crate::cancel::{CancelToken, CycleGuard};
use crate::error::SensorError;
use crate::gas::Gas;
use crate::sensor::{Mq131, Reading};
use crate::units::Unit;

#[derive(Debug, Clone, Copy)]
pub struct MonitorCfg {
    /// Idle time between the end of one cycle and the start of the next
    pub interval: Duration,
    pub gas: Gas,
    pub unit: Unit,
    /// Per-cycle deadline in seconds (0 = none)
    pub max_cycle_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Reading { seq: u64, reading: Reading },
    /// The worker stopped after this error. Always delivered unless the
    /// monitor is cancelled or dropped while the channel is full.
    Failed(SensorError),
}

const CHANNEL_DEPTH: usize = 16;
/// Re-check cancellation this often while the final event waits for room.
const FINAL_SEND_POLL: Duration = Duration::from_millis(100);

pub struct Monitor {
    rx: xch::Receiver<MonitorEvent>,
    cancel: CancelToken,
    join_handle: Option<std::thread::JoinHandle<Mq131>>,
}

impl Monitor {
    pub fn spawn(sensor: Mq131, cfg: MonitorCfg) -> Self {
        let (tx, rx) = xch::bounded(CHANNEL_DEPTH);
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let join_handle = std::thread::spawn(move || run(sensor, &cfg, &token, &tx));
        Self {
            rx,
            cancel,
            join_handle: Some(join_handle),
        }
    }

    pub fn events(&self) -> &xch::Receiver<MonitorEvent> {
        &self.rx
    }

    /// Most recent pending event, discarding older ones.
    pub fn latest(&self) -> Option<MonitorEvent> {
        self.rx.try_iter().last()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Stop the worker and take the sensor back (heater off).
    pub fn stop(mut self) -> Option<Mq131> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Mq131> {
        self.cancel.cancel();
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(sensor) => {
                trace!("monitor thread joined");
                Some(sensor)
            }
            Err(e) => {
                warn!(?e, "monitor thread panicked during shutdown");
                None
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run(
    mut sensor: Mq131,
    cfg: &MonitorCfg,
    token: &CancelToken,
    tx: &xch::Sender<MonitorEvent>,
) -> Mq131 {
    let clock = sensor.clock();
    let mut seq = 0u64;
    info!(
        interval_s = cfg.interval.as_secs(),
        gas = %cfg.gas,
        unit = %cfg.unit,
        "monitor started"
    );
    'outer: loop {
        let guard = CycleGuard::unbounded()
            .with_cancel(token.clone())
            .with_deadline_secs(cfg.max_cycle_secs);
        match sensor.take_sample_guarded(&guard) {
            Ok(_) => {
                let Some(reading) = sensor.reading_for(cfg.gas, cfg.unit) else {
                    continue;
                };
                seq += 1;
                match tx.try_send(MonitorEvent::Reading { seq, reading }) {
                    Ok(()) => {}
                    Err(xch::TrySendError::Full(_)) => {
                        debug!(seq, "monitor consumer lagging, reading dropped");
                    }
                    Err(xch::TrySendError::Disconnected(_)) => {
                        debug!("monitor consumer disconnected, exiting thread");
                        break;
                    }
                }
            }
            Err(e) => {
                let err = e
                    .downcast_ref::<SensorError>()
                    .cloned()
                    .unwrap_or_else(|| SensorError::Hardware(e.to_string()));
                if err == SensorError::Cancelled {
                    debug!("monitor cycle cancelled");
                    break;
                }
                warn!(error = %err, "monitor cycle failed");
                send_final(tx, token, MonitorEvent::Failed(err));
                break;
            }
        }

        let mut idle = Duration::ZERO;
        while idle < cfg.interval {
            if token.is_cancelled() {
                break 'outer;
            }
            let step = (cfg.interval - idle).min(Duration::from_secs(1));
            clock.sleep(step);
            idle += step;
        }
        if token.is_cancelled() {
            break;
        }
    }
    trace!("monitor thread exiting");
    sensor
}

/// Readings may be dropped under back-pressure; the terminal event waits for
/// room until the consumer reads it, cancels or disconnects.
fn send_final(tx: &xch::Sender<MonitorEvent>, token: &CancelToken, mut event: MonitorEvent) {
    loop {
        match tx.send_timeout(event, FINAL_SEND_POLL) {
            Ok(()) => return,
            Err(xch::SendTimeoutError::Timeout(back)) => {
                if token.is_cancelled() {
                    warn!("monitor cancelled before its final event was read");
                    return;
                }
                event = back;
            }
            Err(xch::SendTimeoutError::Disconnected(_)) => {
                debug!("monitor consumer disconnected before final event");
                return;
            }
        }
    }
}
