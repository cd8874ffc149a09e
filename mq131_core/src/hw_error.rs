//! Maps `Box<dyn Error>` from trait boundaries to typed `SensorError`.
//!
//! The traits in `mq131_traits` use `Box<dyn Error + Send + Sync>` so any
//! GPIO/ADC backend can plug in; this module converts those to our typed error
//! enum, with an optional feature-gated path for `mq131_hardware::HwError`.

use crate::error::SensorError;

/// Map a trait-boundary error to a typed `SensorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SensorError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<mq131_hardware::error::HwError>() {
            return match hw {
                mq131_hardware::error::HwError::Timeout => SensorError::Timeout,
                other => SensorError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        SensorError::Timeout
    } else {
        SensorError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_strings_map_to_timeout() {
        let e = std::io::Error::other("ADC timeout on channel 0");
        assert_eq!(map_hw_error(&e), SensorError::Timeout);
    }

    #[test]
    fn other_errors_keep_their_message() {
        let e = std::io::Error::other("bus fault");
        assert_eq!(map_hw_error(&e), SensorError::Hardware("bus fault".into()));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hardware_errors_are_downcast() {
        use mq131_hardware::error::HwError;
        assert_eq!(map_hw_error(&HwError::Timeout), SensorError::Timeout);
        assert_eq!(
            map_hw_error(&HwError::Gpio("pin busy".into())),
            SensorError::HardwareFault("gpio error: pin busy".into())
        );
    }
}
