//! Sensor assembly from config and the command implementations.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use mq131_config::Config;
use mq131_core::{
    CalibrationState, CancelToken, CycleGuard, FileLogger, Gas, Logger, Monitor, MonitorCfg,
    MonitorEvent, Mq131, Reading, Report, Result, SensorError, Unit,
};
use mq131_traits::{AnalogInput, Clock, DigitalOutput};
use serde_json::json;

/// Options that override the config for a single `sample` run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleOverrides {
    pub gas: Gas,
    pub unit: Option<Unit>,
    pub temperature: Option<i8>,
    pub humidity: Option<u8>,
    pub r0: Option<f32>,
    pub preheat_secs: Option<u32>,
}

fn assemble(
    cfg: &Config,
    heater: impl DigitalOutput + Send + 'static,
    analog: impl AnalogInput + Send + 'static,
    clock: impl Clock + Send + Sync + 'static,
) -> Result<Mq131> {
    let mut builder = Mq131::builder()
        .with_heater(heater)
        .with_analog(analog)
        .with_app_config(cfg)
        .with_clock(clock);
    if let Some(path) = cfg.logging.progress_file.as_deref() {
        let logger: Arc<dyn Logger + Send + Sync> = Arc::new(FileLogger::new(path));
        builder = builder.with_logger(logger);
    }
    builder.build()
}

/// Open the real heater pin and ADC.
#[cfg(feature = "hardware")]
pub fn open_sensor(cfg: &Config) -> Result<Mq131> {
    let heater = mq131_hardware::HardwareHeater::new(cfg.pins.heater).wrap_err("open heater pin")?;
    let analog = mq131_hardware::HardwareAnalog::new(
        cfg.pins.spi_bus,
        cfg.pins.spi_cs,
        cfg.pins.adc_channel,
        cfg.sensor.adc_max_count,
    )
    .wrap_err("open adc")?;
    tracing::info!(
        heater_pin = cfg.pins.heater,
        adc_channel = cfg.pins.adc_channel,
        "hardware opened"
    );
    assemble(cfg, heater, analog, mq131_traits::MonotonicClock::new())
}

/// Build the simulated rig described by `[simulation]`.
///
/// `MQ131_SIM_FAULT=timeout|disconnected` injects an ADC fault.
#[cfg(not(feature = "hardware"))]
pub fn open_sensor(cfg: &Config) -> Result<Mq131> {
    use mq131_hardware::{SimFault, SimParams, simulated_pair};

    let params = SimParams {
        load_resistance_ohms: cfg.sensor.load_resistance_ohms,
        cold_ohms: cfg.simulation.cold_ohms,
        settled_ohms: cfg.simulation.settled_ohms,
        tau_secs: cfg.simulation.tau_secs,
        ozone_ratio: cfg.simulation.ozone_ratio,
        adc_max_count: cfg.sensor.adc_max_count,
    };
    let fault = match std::env::var("MQ131_SIM_FAULT").ok().as_deref() {
        None | Some("") => None,
        Some("timeout") => Some(SimFault::Timeout),
        Some("disconnected") => Some(SimFault::Disconnected),
        Some(other) => eyre::bail!("MQ131_SIM_FAULT must be timeout or disconnected, got {other}"),
    };
    tracing::info!(virtual_clock = cfg.simulation.virtual_clock, ?fault, "using simulated sensor");

    fn with_clock<C: Clock + Clone + Send + Sync + 'static>(
        cfg: &Config,
        clock: C,
        params: SimParams,
        fault: Option<SimFault>,
    ) -> Result<Mq131> {
        let (heater, analog) = simulated_pair(clock.clone(), params);
        match fault {
            Some(f) => assemble(cfg, heater, analog.with_fault(f), clock),
            None => assemble(cfg, heater, analog, clock),
        }
    }

    if cfg.simulation.virtual_clock {
        with_clock(cfg, mq131_traits::VirtualClock::new(), params, fault)
    } else {
        with_clock(cfg, mq131_traits::MonotonicClock::new(), params, fault)
    }
}

fn reading_json(r: &Reading) -> serde_json::Value {
    json!({
        "gas": r.gas.as_str(),
        "value": r.value,
        "unit": r.unit.as_str(),
        "rs_ohms": r.rs_ohms,
        "r0_ohms": r.r0_ohms,
        "ratio": r.ratio,
        "counts": r.counts,
        "load_voltage": r.load_voltage,
        "preheat_secs": r.preheat_secs,
    })
}

fn reading_line(r: &Reading) -> String {
    format!(
        "{}: {:.3} {} (Rs={:.1} ohm, R0={:.1} ohm, Rs/R0={:.4}, adc={})",
        r.gas, r.value, r.unit, r.rs_ohms, r.r0_ohms, r.ratio, r.counts
    )
}

pub fn run_sample(
    cfg: &Config,
    mut sensor: Mq131,
    overrides: SampleOverrides,
    cancel: &CancelToken,
    json: bool,
) -> Result<Reading> {
    if let Some(r0) = overrides.r0 {
        sensor.set_r0(r0)?;
    }
    if overrides.temperature.is_some() || overrides.humidity.is_some() {
        let env = sensor.environment();
        sensor.set_environment(
            overrides.temperature.unwrap_or(env.temperature_c),
            overrides.humidity.unwrap_or(env.humidity_pct),
        )?;
    }
    if let Some(secs) = overrides.preheat_secs {
        sensor.set_preheat_secs(secs)?;
    }
    let unit = overrides.unit.unwrap_or_else(|| cfg.monitor.unit.into());

    if !json {
        println!(
            "Pre-heating {} sensor for {} s...",
            sensor.variant(),
            sensor.preheat_secs()
        );
    }
    let guard = CycleGuard::unbounded()
        .with_cancel(cancel.clone())
        .with_deadline_secs(cfg.limits.max_cycle_secs);
    sensor
        .take_sample_guarded(&guard)
        .wrap_err("sample cycle")?;
    let reading = sensor.reading_for(overrides.gas, unit).ok_or_else(|| {
        Report::new(SensorError::State("no sample stored after cycle".into()))
    })?;

    if json {
        println!("{}", reading_json(&reading));
    } else {
        println!("{}", reading_line(&reading));
    }
    Ok(reading)
}

pub fn run_calibrate(
    cfg: &Config,
    mut sensor: Mq131,
    stable_cycles: Option<u8>,
    max_secs: Option<u64>,
    cancel: &CancelToken,
    json: bool,
) -> Result<CalibrationState> {
    if let Some(n) = stable_cycles {
        sensor.set_stable_cycles(n)?;
    }
    let limit = max_secs.unwrap_or(cfg.limits.max_calibration_secs);
    if !json {
        println!(
            "Calibrating in clean air (needs {} stable seconds{})...",
            sensor.stable_cycles(),
            if limit > 0 {
                format!(", limit {limit} s")
            } else {
                String::new()
            }
        );
    }
    let guard = CycleGuard::unbounded()
        .with_cancel(cancel.clone())
        .with_deadline_secs(limit);
    let state = sensor.calibrate_guarded(&guard).wrap_err("calibration")?;

    if json {
        println!(
            "{}",
            json!({ "r0_ohms": state.r0_ohms, "preheat_secs": state.preheat_secs })
        );
    } else {
        println!(
            "Calibration complete: R0 = {:.2} ohm, pre-heat = {} s",
            state.r0_ohms, state.preheat_secs
        );
        println!("Add to your config to reuse it:");
        println!("[calibration]");
        println!("r0_ohms = {:.2}", state.r0_ohms);
        println!("preheat_secs = {}", state.preheat_secs);
    }
    Ok(state)
}

/// Options of the `monitor` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorOptions {
    pub gas: Gas,
    pub unit: Option<Unit>,
    pub interval_secs: Option<u64>,
    pub count: Option<u64>,
}

pub fn run_monitor(
    cfg: &Config,
    sensor: Mq131,
    opts: MonitorOptions,
    cancel: &CancelToken,
    json: bool,
) -> Result<u64> {
    let count = opts.count;
    let mcfg = MonitorCfg {
        interval: Duration::from_secs(opts.interval_secs.unwrap_or(cfg.monitor.interval_secs)),
        gas: opts.gas,
        unit: opts.unit.unwrap_or_else(|| cfg.monitor.unit.into()),
        max_cycle_secs: cfg.limits.max_cycle_secs,
    };
    let monitor = Monitor::spawn(sensor, mcfg);
    let mut printed = 0u64;
    let outcome = loop {
        if cancel.is_cancelled() {
            tracing::info!("monitor interrupted");
            break Ok(printed);
        }
        match monitor.events().recv_timeout(Duration::from_millis(200)) {
            Ok(MonitorEvent::Reading { seq, reading }) => {
                if json {
                    let mut v = reading_json(&reading);
                    v["seq"] = json!(seq);
                    println!("{v}");
                } else {
                    println!("#{seq} {}", reading_line(&reading));
                }
                printed += 1;
                if count.is_some_and(|c| printed >= c) {
                    break Ok(printed);
                }
            }
            Ok(MonitorEvent::Failed(e)) => break Err(Report::new(e).wrap_err("monitor cycle")),
            Err(e) if e.is_timeout() => {}
            // the worker only hangs up on its own after a failure or a cancel
            Err(_) if cancel.is_cancelled() => break Ok(printed),
            Err(_) => {
                break Err(Report::new(SensorError::State(
                    "monitor worker stopped without reporting a reading or error".into(),
                )));
            }
        }
    };
    // heater is switched off when the worker hands the sensor back
    let _sensor = monitor.stop();
    outcome
}

pub fn run_self_check(cfg: &Config, mut sensor: Mq131, json: bool) -> Result<()> {
    let sample = sensor.probe().wrap_err("probe analog input")?;
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "variant": sensor.variant().to_string(),
                "heater_pin": cfg.pins.heater,
                "adc_channel": cfg.pins.adc_channel,
                "counts": sample.counts,
                "load_voltage": sample.load_voltage,
                "r0_ohms": sensor.r0(),
                "preheat_secs": sensor.preheat_secs(),
            })
        );
    } else {
        println!(
            "self-check OK: {} sensor, heater pin {}, adc channel {}, cold reading {} counts ({:.3} V)",
            sensor.variant(),
            cfg.pins.heater,
            cfg.pins.adc_channel,
            sample.counts,
            sample.load_voltage
        );
    }
    Ok(())
}
