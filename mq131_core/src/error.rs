use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("cycle cancelled")]
    Cancelled,
    #[error("deadline exceeded after {0} s")]
    DeadlineExceeded(u64),
    #[error("calibration converged on a degenerate baseline ({0} ohms)")]
    DegenerateCalibration(f32),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing heater output")]
    MissingHeater,
    #[error("missing analog input")]
    MissingAnalog,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
