#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<mq131_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // anything that validates must map into core types
        let sensor = mq131_core::SensorConfig::from(&cfg.sensor);
        assert!(sensor.validate().is_ok());
        let _ = mq131_core::Environment::from(&cfg.environment).correction_ratio();
    }
});
