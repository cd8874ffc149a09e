//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use mq131_core::{Gas, Unit};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "mq131", version, about = "MQ131 ozone sensor CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/mq131.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace) [default: [logging] level, else warn]
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one heat/read cycle and print the gas concentration
    Sample {
        /// Gas to report: o3, nox or cl2
        #[arg(long, value_name = "GAS", default_value = "o3")]
        gas: Gas,
        /// Output unit: ppm, ppb, mg/m3 or ug/m3 (default: [monitor] unit)
        #[arg(long, value_name = "UNIT")]
        unit: Option<Unit>,
        /// Ambient temperature in °C (overrides [environment])
        #[arg(long, value_name = "C", allow_hyphen_values = true)]
        temperature: Option<i8>,
        /// Relative humidity in % (overrides [environment])
        #[arg(long, value_name = "PCT")]
        humidity: Option<u8>,
        /// Baseline resistance in ohms (overrides [calibration])
        #[arg(long, value_name = "OHMS")]
        r0: Option<f32>,
        /// Heater warm-up before the read (overrides [calibration])
        #[arg(long, value_name = "SECS")]
        preheat_secs: Option<u32>,
    },
    /// Find R0 and the pre-heat duration in clean air
    Calibrate {
        /// Consecutive stable seconds required (overrides [calibration])
        #[arg(long, value_name = "N")]
        stable_cycles: Option<u8>,
        /// Give up after this many seconds (overrides [limits], 0 = never)
        #[arg(long, value_name = "SECS")]
        max_secs: Option<u64>,
    },
    /// Measure periodically until interrupted
    Monitor {
        /// Gas to report: o3, nox or cl2
        #[arg(long, value_name = "GAS", default_value = "o3")]
        gas: Gas,
        /// Output unit (default: [monitor] unit)
        #[arg(long, value_name = "UNIT")]
        unit: Option<Unit>,
        /// Idle seconds between cycles (overrides [monitor])
        #[arg(long, value_name = "SECS")]
        interval_secs: Option<u64>,
        /// Stop after this many readings
        #[arg(long, value_name = "N")]
        count: Option<u64>,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
