//! Human-readable error descriptions and structured JSON error formatting.

use mq131_core::error::{BuildError, SensorError};

/// Stable name of a typed error, used as the JSON `reason`.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(se) = err.downcast_ref::<SensorError>() {
        return match se {
            SensorError::Hardware(_) => "Hardware",
            SensorError::HardwareFault(_) => "HardwareFault",
            SensorError::Timeout => "Timeout",
            SensorError::Cancelled => "Cancelled",
            SensorError::DeadlineExceeded(_) => "DeadlineExceeded",
            SensorError::DegenerateCalibration(_) => "DegenerateCalibration",
            SensorError::InvalidValue(_) => "InvalidValue",
            SensorError::State(_) => "State",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    "Error"
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingHeater => {
                "What happened: No heater output was provided to the sensor.\nLikely causes: The heater GPIO failed to initialize or was not wired into the builder.\nHow to fix: Check [pins] heater and pass the output via with_heater(...).".to_string()
            }
            BuildError::MissingAnalog => {
                "What happened: No analog input was provided to the sensor.\nLikely causes: The ADC failed to initialize or was not wired into the builder.\nHow to fix: Check [pins] adc_channel/spi_bus/spi_cs and pass the input via with_analog(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the flag, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SensorError>() {
        return match se {
            SensorError::Timeout => "What happened: The ADC read timed out.\nLikely causes: MCP3008 not powered, SPI disabled, or wrong chip select.\nHow to fix: Enable SPI, verify wiring and [pins] spi_bus/spi_cs.".to_string(),
            SensorError::Cancelled => "What happened: The operation was interrupted.\nLikely causes: Ctrl-C was pressed.\nHow to fix: Rerun the command; the heater has been switched off.".to_string(),
            SensorError::DeadlineExceeded(secs) => format!(
                "What happened: The deadline of {secs} s was exceeded.\nLikely causes: The sensor did not settle (drafts, varying ozone) or the limit is too tight.\nHow to fix: Calibrate in still, clean air or raise [limits] / --max-secs."
            ),
            SensorError::DegenerateCalibration(r0) => format!(
                "What happened: Calibration settled on an unusable baseline ({r0} ohms).\nLikely causes: Divider output stuck at full scale; sensor shorted or load resistor missing.\nHow to fix: Check the MQ131 module wiring and [sensor] load_resistance_ohms, then recalibrate."
            ),
            SensorError::Hardware(_) | SensorError::HardwareFault(_) => format!(
                "What happened: {se}.\nLikely causes: Wiring, power, or permission problem on the GPIO/SPI bus.\nHow to fix: Verify wiring and that the process may access /dev/gpiomem and /dev/spidev*."
            ),
            SensorError::InvalidValue(_) | SensorError::State(_) => format!(
                "What happened: {se}.\nLikely causes: An out-of-range value on the command line.\nHow to fix: Check the flags and rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: The config file could not be read ({msg}).\nLikely causes: Wrong path or missing file.\nHow to fix: Pass --config <FILE> pointing at a valid TOML file."
        );
    }

    if lower.contains("open heater") || lower.contains("open adc") {
        return "What happened: Failed to initialize hardware.\nLikely causes: Incorrect pin numbers, SPI not enabled, or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO and SPI.".to_string();
    }

    if lower.contains("invalid configuration")
        || lower.contains("must be")
        || (lower.contains("pins") && lower.contains("missing"))
    {
        return format!(
            "What happened: Configuration is invalid or incomplete ({msg}).\nLikely causes: Missing [pins] (heater, adc_channel) or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<SensorError>() {
        Some(SensorError::Hardware(_) | SensorError::HardwareFault(_) | SensorError::Timeout) => 3,
        Some(SensorError::DeadlineExceeded(_)) => 4,
        Some(SensorError::DegenerateCalibration(_)) => 5,
        Some(SensorError::Cancelled) => 130,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let msg = humanize(err);
    let details = match err.downcast_ref::<SensorError>() {
        Some(SensorError::DeadlineExceeded(secs)) => Some(json!({ "deadline_secs": secs })),
        Some(SensorError::DegenerateCalibration(r0)) => Some(json!({ "r0_ohms": r0 })),
        _ => None,
    };

    match details {
        Some(d) => json!({ "reason": reason, "details": d, "message": msg }),
        None => json!({ "reason": reason, "message": msg }),
    }
    .to_string()
}
