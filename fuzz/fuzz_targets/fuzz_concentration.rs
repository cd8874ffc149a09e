#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use mq131_core::{
    AnalogSampler, ConcentrationModel, Environment, SensorConfig, SensorVariant, StabilityWindow,
    Unit, convert,
};

#[derive(Debug, Arbitrary)]
struct Input {
    variant: u8,
    readings: Vec<f32>,
    r0_ohms: f32,
    temperature_c: i8,
    humidity_pct: u8,
    threshold: u8,
}

fuzz_target!(|input: Input| {
    let variant = SensorVariant::ALL[usize::from(input.variant) % SensorVariant::ALL.len()];
    let sampler = AnalogSampler::new(&SensorConfig {
        variant,
        ..SensorConfig::default()
    });
    let model = ConcentrationModel::new(variant);
    let env = Environment::new(input.temperature_c, input.humidity_pct.min(100))
        .unwrap_or_default();
    let mut window = StabilityWindow::new();

    for n in input.readings.iter().take(512) {
        if !(0.0..=1.0).contains(n) {
            continue;
        }
        let sample = sampler.sample_from_normalized(*n);
        assert!(sample.rs_ohms >= 0.0);
        window.observe(sample.rs_ohms);
        if input.r0_ohms.is_finite() && input.r0_ohms > 0.0 {
            for unit in Unit::ALL {
                let v = model.evaluate(sample.rs_ohms, input.r0_ohms, &env, unit);
                assert_eq!(convert(v, unit, unit).to_bits(), v.to_bits());
            }
        }
        if window.is_stable(input.threshold.max(1)) {
            break;
        }
    }
});
