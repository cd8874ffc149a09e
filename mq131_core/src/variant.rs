//! MQ131 sub-types and their response curves.
//!
//! Every per-variant constant lives in one table so that supporting a new
//! sensor revision means adding one enum variant and one table row.

use crate::gas::GasCurve;
use crate::units::Unit;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SensorVariant {
    /// Black-bakelite low-concentration sensor, 10 ppb to 2 ppm.
    #[default]
    LowConcentration,
    /// Metal-cap high-concentration sensor, 10 ppm to 1000 ppm.
    HighConcentration,
    /// Winsen SnO2 low-concentration sensor (blue board).
    SnO2LowConcentration,
}

/// Curve and default calibration of one sensor variant.
///
/// Concentration in `native_unit` is `a * ratio^b` where
/// `ratio = pre_scale * Rs / R0 * correction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantProfile {
    pub name: &'static str,
    pub a: f64,
    pub b: f64,
    pub native_unit: Unit,
    pub pre_scale: f64,
    pub default_r0_ohms: f32,
    pub default_preheat_secs: u32,
    pub default_stable_cycles: u8,
}

const PROFILES: [VariantProfile; 3] = [
    VariantProfile {
        name: "low_concentration",
        a: 9.4783,
        b: 2.3348,
        native_unit: Unit::Ppb,
        pre_scale: 1.0,
        default_r0_ohms: 1917.22,
        default_preheat_secs: 80,
        default_stable_cycles: 15,
    },
    VariantProfile {
        name: "high_concentration",
        a: 8.1399,
        b: 2.3297,
        native_unit: Unit::Ppm,
        pre_scale: 1.0,
        default_r0_ohms: 235.0,
        default_preheat_secs: 80,
        default_stable_cycles: 15,
    },
    VariantProfile {
        name: "sn_o2_low_concentration",
        a: 26.941,
        b: -1.16,
        native_unit: Unit::Ppb,
        pre_scale: 12.15,
        default_r0_ohms: 1917.22,
        default_preheat_secs: 80,
        default_stable_cycles: 15,
    },
];

impl VariantProfile {
    /// Ozone response of this variant.
    pub const fn ozone_curve(&self) -> GasCurve {
        GasCurve {
            a: self.a,
            b: self.b,
            native_unit: self.native_unit,
            pre_scale: self.pre_scale,
        }
    }
}

impl SensorVariant {
    pub const ALL: [Self; 3] = [
        Self::LowConcentration,
        Self::HighConcentration,
        Self::SnO2LowConcentration,
    ];

    pub fn profile(self) -> &'static VariantProfile {
        &PROFILES[self as usize]
    }
}

impl fmt::Display for SensorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}
