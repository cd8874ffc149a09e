#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! MQ131 ozone sensor driver (hardware-agnostic).
//!
//! All hardware interactions go through `mq131_traits::DigitalOutput` (the
//! heater line) and `mq131_traits::AnalogInput` (the load-resistor divider).
//!
//! ## Architecture
//!
//! - **Heater**: on/off control and the blocking heat/read cycle (`heater`)
//! - **Sampling**: divider reading to sensor resistance Rs (`sampler`)
//! - **Calibration**: clean-air search for R0 and pre-heat time (`calibration`)
//! - **Concentration**: Rs/R0 through the variant's ozone curve or the fixed
//!   NOx/Cl2 curves (`concentration`, `variant`, `gas`, `environment`, `units`)
//! - **Monitor**: periodic measurement on a background thread (`monitor`)
//!
//! Long operations accept a `CycleGuard` so callers can cancel them or bound
//! their duration; the heater is switched off on every exit path.

pub mod builder;
pub mod calibration;
pub mod cancel;
pub mod concentration;
pub mod config;
pub mod conversions;
pub mod environment;
pub mod error;
pub mod gas;
pub mod heater;
pub mod hw_error;
pub mod logger;
pub mod mocks;
pub mod monitor;
pub mod sampler;
pub mod sensor;
pub mod units;
pub mod variant;

pub use builder::{Missing, Mq131Builder, Set};
pub use calibration::{CalibrationState, Calibrator, StabilityWindow};
pub use cancel::{CancelToken, CycleGuard};
pub use concentration::ConcentrationModel;
pub use config::SensorConfig;
pub use environment::Environment;
pub use error::{BuildError, Report, Result, SensorError};
pub use gas::{Gas, GasCurve};
pub use heater::{HeaterController, HeaterState};
pub use logger::{FileLogger, Logger, MemoryLogger};
pub use monitor::{Monitor, MonitorCfg, MonitorEvent};
pub use sampler::{AnalogSampler, Sample};
pub use sensor::{Mq131, Reading};
pub use units::{Unit, convert, convert_with_molar_mass};
pub use variant::{SensorVariant, VariantProfile};
