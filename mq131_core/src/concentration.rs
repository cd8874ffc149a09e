//! Rs/R0 ratio to gas concentration.

use crate::environment::Environment;
use crate::gas::{Gas, GasCurve};
use crate::units::{Unit, convert_with_molar_mass};
use crate::variant::{SensorVariant, VariantProfile};

/// Power-law response curves of one sensor variant.
///
/// The plain `ratio`/`native`/`evaluate` methods are for ozone; the `*_for`
/// forms take the gas explicitly.
#[derive(Debug, Clone, Copy)]
pub struct ConcentrationModel {
    profile: &'static VariantProfile,
}

impl ConcentrationModel {
    pub fn new(variant: SensorVariant) -> Self {
        Self {
            profile: variant.profile(),
        }
    }

    pub fn profile(&self) -> &'static VariantProfile {
        self.profile
    }

    pub fn curve(&self, gas: Gas) -> GasCurve {
        match gas.fixed_curve() {
            Some(curve) => *curve,
            None => self.profile.ozone_curve(),
        }
    }

    /// Environment-corrected ozone Rs/R0, scaled by the variant's pre-scale factor.
    pub fn ratio(&self, rs_ohms: f32, r0_ohms: f32, env: &Environment) -> f32 {
        self.ratio_for(Gas::Ozone, rs_ohms, r0_ohms, env)
    }

    pub fn ratio_for(&self, gas: Gas, rs_ohms: f32, r0_ohms: f32, env: &Environment) -> f32 {
        let ratio = self.curve(gas).pre_scale * f64::from(rs_ohms) / f64::from(r0_ohms)
            * f64::from(env.correction_ratio());
        ratio as f32
    }

    /// Ozone concentration in the variant's native unit for a corrected ratio.
    pub fn native(&self, ratio: f32) -> f32 {
        self.native_for(Gas::Ozone, ratio)
    }

    pub fn native_for(&self, gas: Gas, ratio: f32) -> f32 {
        let curve = self.curve(gas);
        (curve.a * f64::from(ratio).powf(curve.b)) as f32
    }

    /// Ozone concentration for a measured Rs, expressed in `unit`.
    pub fn evaluate(&self, rs_ohms: f32, r0_ohms: f32, env: &Environment, unit: Unit) -> f32 {
        self.evaluate_for(Gas::Ozone, rs_ohms, r0_ohms, env, unit)
    }

    pub fn evaluate_for(
        &self,
        gas: Gas,
        rs_ohms: f32,
        r0_ohms: f32,
        env: &Environment,
        unit: Unit,
    ) -> f32 {
        let native = self.native_for(gas, self.ratio_for(gas, rs_ohms, r0_ohms, env));
        convert_with_molar_mass(native, self.curve(gas).native_unit, unit, gas.molar_mass_g())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_ratio_yields_curve_coefficient() {
        for v in SensorVariant::ALL {
            let m = ConcentrationModel::new(v);
            assert!((m.native(1.0) as f64 - v.profile().a).abs() < 1e-5);
        }
    }

    #[test]
    fn equal_rs_and_r0_at_reference_conditions() {
        let m = ConcentrationModel::new(SensorVariant::LowConcentration);
        let r = 110_470.6;
        assert_eq!(m.ratio(r, r, &Environment::REFERENCE), 1.0);
        let ppb = m.evaluate(r, r, &Environment::REFERENCE, Unit::Ppb);
        assert!((ppb - 9.4783).abs() < 1e-4);
        let ppm = m.evaluate(r, r, &Environment::REFERENCE, Unit::Ppm);
        assert!((ppm - 0.009_478_3).abs() < 1e-7);
    }

    #[test]
    fn sno2_applies_pre_scale() {
        let m = ConcentrationModel::new(SensorVariant::SnO2LowConcentration);
        let ratio = m.ratio(100.0, 1215.0, &Environment::REFERENCE);
        assert!((ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn low_variant_rises_with_resistance() {
        let m = ConcentrationModel::new(SensorVariant::LowConcentration);
        let env = Environment::REFERENCE;
        let a = m.evaluate(1000.0, 1000.0, &env, Unit::Ppb);
        let b = m.evaluate(2000.0, 1000.0, &env, Unit::Ppb);
        assert!(b > a);
    }

    #[test]
    fn cross_gases_ignore_variant_and_pre_scale() {
        let env = Environment::REFERENCE;
        for v in SensorVariant::ALL {
            let m = ConcentrationModel::new(v);
            assert_eq!(m.ratio_for(Gas::NitrogenOxides, 500.0, 500.0, &env), 1.0);
            let nox = m.evaluate_for(Gas::NitrogenOxides, 500.0, 500.0, &env, Unit::Ppm);
            assert!((nox - 456.23).abs() < 1e-3, "{v}: {nox}");
            let cl2 = m.evaluate_for(Gas::Chlorine, 500.0, 500.0, &env, Unit::Ppm);
            assert!((cl2 - 48.313).abs() < 1e-4, "{v}: {cl2}");
        }
    }

    #[test]
    fn cross_gases_fall_with_resistance() {
        let m = ConcentrationModel::new(SensorVariant::LowConcentration);
        let env = Environment::REFERENCE;
        let at = |rs| m.evaluate_for(Gas::Chlorine, rs, 1000.0, &env, Unit::Ppm);
        // 2^-1.179
        assert!((at(2000.0) / at(1000.0) - 0.441_658).abs() < 1e-4);
    }

    #[test]
    fn cross_gas_mass_units_use_their_own_molar_mass() {
        let m = ConcentrationModel::new(SensorVariant::HighConcentration);
        let env = Environment::REFERENCE;
        let ppm = m.evaluate_for(Gas::Chlorine, 1000.0, 1000.0, &env, Unit::Ppm);
        let mg = m.evaluate_for(Gas::Chlorine, 1000.0, 1000.0, &env, Unit::MgM3);
        assert!((mg / ppm - 3.122_088).abs() < 1e-4);
    }
}
