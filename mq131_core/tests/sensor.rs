use std::time::Duration;

use mq131_core::mocks::{FailingAnalog, SeqAnalog, SpyHeater};
use mq131_core::{Gas, HeaterState, Mq131, SensorError, SensorVariant, Unit};
use mq131_hardware::{SimFault, SimParams, simulated_pair};
use mq131_traits::VirtualClock;
use rstest::rstest;

fn sensor_with(
    variant: SensorVariant,
    analog: SeqAnalog,
    clock: &VirtualClock,
    spy: &SpyHeater,
) -> Mq131 {
    Mq131::builder()
        .with_heater(spy.clone())
        .with_analog(analog)
        .with_variant(variant)
        .with_clock(clock.clone())
        .build()
        .expect("build")
}

fn sensor_err(err: &eyre::Report) -> Option<&SensorError> {
    err.downcast_ref::<SensorError>()
}

#[rstest]
fn concentration_is_zero_before_any_sample(
    #[values(
        SensorVariant::LowConcentration,
        SensorVariant::HighConcentration,
        SensorVariant::SnO2LowConcentration
    )]
    variant: SensorVariant,
    #[values(Unit::Ppm, Unit::Ppb, Unit::MgM3, Unit::UgM3)] unit: Unit,
) {
    let clock = VirtualClock::new();
    let s = sensor_with(variant, SeqAnalog::new(vec![0.5]), &clock, &SpyHeater::new());
    assert_eq!(s.concentration(unit), 0.0);
    assert!(s.reading(unit).is_none());
}

#[test]
fn reference_point_for_low_concentration() {
    let clock = VirtualClock::new();
    let analog = SeqAnalog::from_resistances(&[110_470.6], 1_000_000.0);
    let mut s = sensor_with(
        SensorVariant::LowConcentration,
        analog,
        &clock,
        &SpyHeater::new(),
    );
    s.set_r0(110_470.6).unwrap();
    s.set_environment(20, 60).unwrap();
    let rs = s.take_sample().unwrap();
    assert!((rs - 110_470.6).abs() < 1.0, "rs={rs}");

    // R0 equal to the stored Rs gives a ratio of exactly one
    s.set_r0(rs).unwrap();
    assert_eq!(s.ratio(), Some(1.0));
    assert!((s.concentration(Unit::Ppb) - 9.4783).abs() < 1e-4);
    assert!((s.concentration(Unit::Ppm) - 0.009_478_3).abs() < 1e-7);
}

#[test]
fn take_sample_blocks_for_preheat_and_switches_heater_off() {
    let clock = VirtualClock::new();
    let spy = SpyHeater::new();
    let mut s = sensor_with(
        SensorVariant::HighConcentration,
        SeqAnalog::new(vec![0.25]),
        &clock,
        &spy,
    );
    assert_eq!(s.preheat_secs(), 80);
    s.take_sample().unwrap();
    assert_eq!(clock.elapsed(), Duration::from_secs(80));
    assert_eq!(spy.transitions(), vec![false, true, false]);
    assert_eq!(s.heater_state(), HeaterState::Off);
    assert_eq!(s.last_sample().unwrap().rs_ohms, 3_000_000.0);
}

#[test]
fn longer_preheat_invalidates_stored_sample() {
    let clock = VirtualClock::new();
    let mut s = sensor_with(
        SensorVariant::LowConcentration,
        SeqAnalog::new(vec![0.5]),
        &clock,
        &SpyHeater::new(),
    );
    s.set_preheat_secs(10).unwrap();
    s.take_sample().unwrap();
    assert!(s.concentration(Unit::Ppb) > 0.0);

    s.set_preheat_secs(5).unwrap();
    assert!(s.last_sample().is_some());

    s.set_preheat_secs(11).unwrap();
    assert!(s.last_sample().is_none());
    assert_eq!(s.concentration(Unit::Ppb), 0.0);

    s.take_sample().unwrap();
    assert!(s.concentration(Unit::Ppb) > 0.0);
}

#[test]
fn reading_reports_the_preheat_the_sample_was_taken_with() {
    let clock = VirtualClock::new();
    let mut s = sensor_with(
        SensorVariant::LowConcentration,
        SeqAnalog::new(vec![0.5]),
        &clock,
        &SpyHeater::new(),
    );
    s.set_preheat_secs(10).unwrap();
    s.take_sample().unwrap();
    s.set_preheat_secs(4).unwrap();
    let r = s.reading(Unit::Ppb).expect("sample still valid");
    assert_eq!(r.preheat_secs, 10);
    assert_eq!(s.preheat_secs(), 4);
}

#[rstest]
#[case(Gas::NitrogenOxides, 456.23)]
#[case(Gas::Chlorine, 48.313)]
fn cross_gases_share_the_stored_sample(#[case] gas: Gas, #[case] at_unit_ratio_ppm: f32) {
    let clock = VirtualClock::new();
    let mut s = sensor_with(
        SensorVariant::SnO2LowConcentration,
        SeqAnalog::new(vec![0.5]),
        &clock,
        &SpyHeater::new(),
    );
    assert_eq!(s.gas_concentration(gas, Unit::Ppm), 0.0);
    s.set_environment(20, 60).unwrap();
    s.set_preheat_secs(2).unwrap();
    let rs = s.take_sample().unwrap();
    s.set_r0(rs).unwrap();

    let r = s.reading_for(gas, Unit::Ppm).expect("reading");
    assert_eq!(r.gas, gas);
    assert_eq!(r.ratio, 1.0);
    assert!((r.value - at_unit_ratio_ppm).abs() < 1e-3, "{gas}: {}", r.value);
    // ozone on this variant still goes through its pre-scale
    assert!((s.ratio().unwrap() - 12.15).abs() < 1e-5);
    assert_eq!(s.reading(Unit::Ppb).map(|r| r.gas), Some(Gas::Ozone));
}

#[test]
fn setters_reject_invalid_values_and_keep_state() {
    let clock = VirtualClock::new();
    let mut s = sensor_with(
        SensorVariant::LowConcentration,
        SeqAnalog::new(vec![0.5]),
        &clock,
        &SpyHeater::new(),
    );
    assert_eq!(s.r0(), 1917.22);
    assert!(s.set_preheat_secs(0).is_err());
    assert!(s.set_r0(0.0).is_err());
    assert!(s.set_r0(-5.0).is_err());
    assert!(s.set_r0(f32::NAN).is_err());
    assert!(s.set_environment(25, 101).is_err());
    assert!(s.set_stable_cycles(0).is_err());
    assert_eq!(s.preheat_secs(), 80);
    assert_eq!(s.r0(), 1917.22);
    assert_eq!(s.environment().humidity_pct, 65);
    assert_eq!(s.stable_cycles(), 15);
}

#[test]
fn builder_rejects_bad_values() {
    let build = |b: mq131_core::Mq131Builder<mq131_core::Set, mq131_core::Set>| {
        b.build().expect_err("should reject")
    };
    let base = || {
        Mq131::builder()
            .with_heater(SpyHeater::new())
            .with_analog(SeqAnalog::new(vec![0.5]))
    };
    assert!(format!("{}", build(base().with_load_resistance(0.0))).contains("load resistance"));
    assert!(format!("{}", build(base().with_r0(-1.0))).contains("R0"));
    assert!(format!("{}", build(base().with_preheat_secs(0))).contains("pre-heat"));
    assert!(format!("{}", build(base().with_environment(20, 120))).contains("humidity"));
}

#[test]
fn read_failure_keeps_previous_sample_and_heater_off() {
    let clock = VirtualClock::new();
    let spy = SpyHeater::new();
    let mut s = Mq131::builder()
        .with_heater(spy.clone())
        .with_analog(FailingAnalog("spi bus stuck"))
        .with_clock(clock.clone())
        .with_preheat_secs(3)
        .build()
        .unwrap();
    let err = s.take_sample().unwrap_err();
    assert_eq!(
        sensor_err(&err),
        Some(&SensorError::Hardware("spi bus stuck".into()))
    );
    assert!(!spy.is_on());
    assert!(s.last_sample().is_none());
}

#[test]
fn adc_timeout_is_typed() {
    let clock = VirtualClock::new();
    let (heater, analog) = simulated_pair(clock.clone(), SimParams::default());
    let mut s = Mq131::builder()
        .with_heater(heater)
        .with_analog(analog.with_fault(SimFault::Timeout))
        .with_clock(clock)
        .with_preheat_secs(2)
        .build()
        .unwrap();
    let err = s.take_sample().unwrap_err();
    assert_eq!(sensor_err(&err), Some(&SensorError::Timeout));
}

#[test]
fn disconnected_sensor_reads_zero_ohms() {
    let clock = VirtualClock::new();
    let (heater, analog) = simulated_pair(clock.clone(), SimParams::default());
    let mut s = Mq131::builder()
        .with_heater(heater)
        .with_analog(analog.with_fault(SimFault::Disconnected))
        .with_clock(clock)
        .with_preheat_secs(2)
        .build()
        .unwrap();
    assert_eq!(s.take_sample().unwrap(), 0.0);
}

#[test]
fn simulated_rig_calibrates_and_measures() {
    let clock = VirtualClock::new();
    let params = SimParams::default();
    let (heater, analog) = simulated_pair(clock.clone(), params);
    let mut s = Mq131::builder()
        .with_heater(heater)
        .with_analog(analog)
        .with_clock(clock.clone())
        .with_load_resistance(params.load_resistance_ohms)
        .with_environment(20, 60)
        .build()
        .unwrap();
    let cal = s.calibrate().unwrap();
    assert!(
        (cal.r0_ohms - params.settled_ohms).abs() < params.settled_ohms * 0.05,
        "r0={}",
        cal.r0_ohms
    );
    assert!(cal.preheat_secs > 15);
    assert_eq!(s.preheat_secs(), cal.preheat_secs);

    s.take_sample().unwrap();
    let ratio = s.ratio().unwrap();
    assert!((ratio - 1.0).abs() < 0.05, "ratio={ratio}");
    let ppb = s.concentration(Unit::Ppb);
    assert!((ppb - 9.4783).abs() < 1.5, "ppb={ppb}");
}
