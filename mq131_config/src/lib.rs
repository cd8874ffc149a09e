#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the MQ131 ozone sensor tools.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Unknown sensor variants or units are rejected at parse time, so a bad
//!   config never reaches the sensor.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// BCM GPIO driving the heater transistor
    pub heater: u8,
    /// MCP3008 input the load resistor is wired to (0..=7)
    pub adc_channel: u8,
    #[serde(default)]
    pub spi_bus: u8,
    #[serde(default)]
    pub spi_cs: u8,
}

/// MQ131 hardware sub-type.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    LowConcentration,
    HighConcentration,
    #[serde(alias = "sno2_low_concentration")]
    SnO2LowConcentration,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Ppm,
    #[default]
    Ppb,
    MgM3,
    UgM3,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    pub variant: Variant,
    pub load_resistance_ohms: f32,
    pub supply_voltage: f32,
    /// Largest raw count of the ADC (1023 for a 10-bit converter)
    pub adc_max_count: u16,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            variant: Variant::LowConcentration,
            load_resistance_ohms: 1_000_000.0,
            supply_voltage: 5.0,
            adc_max_count: 1023,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub temperature_c: i8,
    pub humidity_pct: u8,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature_c: 20,
            humidity_pct: 65,
        }
    }
}

/// Values restored from an earlier calibration run, plus the stability
/// threshold override used by `calibrate`.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct PersistedCalibration {
    pub r0_ohms: Option<f32>,
    pub preheat_secs: Option<u32>,
    /// Consecutive stable seconds required before calibration ends
    pub stable_cycles: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Limits {
    /// Abort a single heat/read cycle after this many seconds (0 = no limit)
    pub max_cycle_secs: u64,
    /// Abort calibration after this many seconds (0 = no limit)
    pub max_calibration_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    /// Idle time between two heat/read cycles
    pub interval_secs: u64,
    pub unit: Unit,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            unit: Unit::Ppb,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
    /// Append calibration progress lines to this file
    pub progress_file: Option<String>,
}

/// Simulated sensor used when the `hardware` feature is off.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Run the simulation on a virtual clock (cycles complete instantly)
    pub virtual_clock: bool,
    pub cold_ohms: f32,
    pub settled_ohms: f32,
    pub tau_secs: f32,
    pub ozone_ratio: f32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            virtual_clock: false,
            cold_ohms: 2_000_000.0,
            settled_ohms: 20_000.0,
            tau_secs: 8.0,
            ozone_ratio: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub monitor: MonitorCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub simulation: Simulation,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn finite_positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.adc_channel > 7 {
            eyre::bail!("pins.adc_channel must be in 0..=7");
        }
        if self.pins.spi_bus > 2 {
            eyre::bail!("pins.spi_bus must be in 0..=2");
        }
        if self.pins.spi_cs > 2 {
            eyre::bail!("pins.spi_cs must be in 0..=2");
        }

        // Sensor
        if !finite_positive(self.sensor.load_resistance_ohms) {
            eyre::bail!("sensor.load_resistance_ohms must be > 0");
        }
        if !finite_positive(self.sensor.supply_voltage) {
            eyre::bail!("sensor.supply_voltage must be > 0");
        }
        if self.sensor.adc_max_count == 0 {
            eyre::bail!("sensor.adc_max_count must be >= 1");
        }

        // Environment
        if self.environment.humidity_pct > 100 {
            eyre::bail!("environment.humidity_pct must be in [0, 100]");
        }

        // Calibration
        if let Some(cal) = &self.calibration {
            if let Some(r0) = cal.r0_ohms
                && !finite_positive(r0)
            {
                eyre::bail!("calibration.r0_ohms must be > 0");
            }
            if cal.preheat_secs == Some(0) {
                eyre::bail!("calibration.preheat_secs must be >= 1");
            }
            if cal.stable_cycles == Some(0) {
                eyre::bail!("calibration.stable_cycles must be >= 1");
            }
        }

        // Monitor
        if self.monitor.interval_secs > 24 * 60 * 60 {
            eyre::bail!("monitor.interval_secs is unreasonably large (>24h)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Simulation
        if !finite_positive(self.simulation.cold_ohms)
            || !finite_positive(self.simulation.settled_ohms)
        {
            eyre::bail!("simulation resistances must be > 0");
        }
        if !finite_positive(self.simulation.tau_secs) {
            eyre::bail!("simulation.tau_secs must be > 0");
        }
        if !finite_positive(self.simulation.ozone_ratio) {
            eyre::bail!("simulation.ozone_ratio must be > 0");
        }

        Ok(())
    }
}
