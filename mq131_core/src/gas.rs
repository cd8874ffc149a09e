//! Gases the MQ131 responds to.
//!
//! Ozone is the target gas and its curve depends on the sensor variant (see
//! `variant`). NOx and Cl2 are cross-sensitivities with one fixed curve each,
//! evaluated on the environment-corrected Rs/R0 without any variant pre-scale.

use std::fmt;
use std::str::FromStr;

use crate::units::{O3_MOLAR_MASS, Unit};

/// Molar mass of NO2, the reference species for NOx, in g/mol.
pub const NO2_MOLAR_MASS: f64 = 46.0055;
/// Molar mass of Cl2 in g/mol.
pub const CL2_MOLAR_MASS: f64 = 70.906;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gas {
    #[default]
    Ozone,
    /// Nitrogen oxides, reported as NO2 for mass units.
    NitrogenOxides,
    Chlorine,
}

/// Power law `a * ratio^b` in `native_unit`, with `ratio = pre_scale * Rs / R0 * correction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasCurve {
    pub a: f64,
    pub b: f64,
    pub native_unit: Unit,
    pub pre_scale: f64,
}

const NOX_CURVE: GasCurve = GasCurve {
    a: 456.23,
    b: -2.204,
    native_unit: Unit::Ppm,
    pre_scale: 1.0,
};

const CL2_CURVE: GasCurve = GasCurve {
    a: 48.313,
    b: -1.179,
    native_unit: Unit::Ppm,
    pre_scale: 1.0,
};

impl Gas {
    pub const ALL: [Self; 3] = [Self::Ozone, Self::NitrogenOxides, Self::Chlorine];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ozone => "ozone",
            Self::NitrogenOxides => "nox",
            Self::Chlorine => "cl2",
        }
    }

    pub const fn molar_mass_g(self) -> f64 {
        match self {
            Self::Ozone => O3_MOLAR_MASS,
            Self::NitrogenOxides => NO2_MOLAR_MASS,
            Self::Chlorine => CL2_MOLAR_MASS,
        }
    }

    /// Variant-independent curve; `None` for ozone.
    pub const fn fixed_curve(self) -> Option<&'static GasCurve> {
        match self {
            Self::Ozone => None,
            Self::NitrogenOxides => Some(&NOX_CURVE),
            Self::Chlorine => Some(&CL2_CURVE),
        }
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gas {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ozone" | "o3" => Ok(Self::Ozone),
            "nox" | "no2" => Ok(Self::NitrogenOxides),
            "cl2" | "chlorine" => Ok(Self::Chlorine),
            other => Err(format!("unknown gas '{other}' (expected o3, nox or cl2)")),
        }
    }
}
