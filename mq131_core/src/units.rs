//! Concentration units and the conversions between them.
//!
//! Mass concentrations are taken at 0 °C and 1 atm, where one mole of gas
//! occupies 22.71108 L. `convert` assumes ozone (48 g/mol); other gases go
//! through `convert_with_molar_mass`.

use std::fmt;
use std::str::FromStr;

/// Molar mass of O3 in g/mol.
pub const O3_MOLAR_MASS: f64 = 48.0;
/// Molar volume of an ideal gas in L/mol.
pub const MOLAR_VOLUME_L: f64 = 22.711_08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Ppm,
    Ppb,
    MgM3,
    UgM3,
}

impl Unit {
    pub const ALL: [Self; 4] = [Self::Ppm, Self::Ppb, Self::MgM3, Self::UgM3];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ppm => "ppm",
            Self::Ppb => "ppb",
            Self::MgM3 => "mg/m3",
            Self::UgM3 => "ug/m3",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppm" => Ok(Self::Ppm),
            "ppb" => Ok(Self::Ppb),
            "mg/m3" | "mg_m3" | "mgm3" => Ok(Self::MgM3),
            "ug/m3" | "ug_m3" | "ugm3" | "µg/m3" => Ok(Self::UgM3),
            other => Err(format!(
                "unknown unit '{other}' (expected ppm, ppb, mg/m3 or ug/m3)"
            )),
        }
    }
}

/// Convert an ozone concentration `value` expressed in `from` into `to`.
///
/// Mixed-unit conversions are routed through the target's natural base:
/// ppm for mg/m³ and ppb for µg/m³. Same-unit conversion returns the input
/// untouched.
pub fn convert(value: f32, from: Unit, to: Unit) -> f32 {
    convert_with_molar_mass(value, from, to, O3_MOLAR_MASS)
}

/// Like `convert` for a gas of the given molar mass (g/mol).
pub fn convert_with_molar_mass(value: f32, from: Unit, to: Unit, molar_mass_g: f64) -> f32 {
    if from == to {
        return value;
    }
    let v = f64::from(value);
    let out = match to {
        Unit::Ppm => v / 1000.0,
        Unit::Ppb => v * 1000.0,
        Unit::MgM3 => {
            let ppm = if from == Unit::Ppm { v } else { v / 1000.0 };
            ppm * molar_mass_g / MOLAR_VOLUME_L
        }
        Unit::UgM3 => {
            let ppb = if from == Unit::Ppb { v } else { v * 1000.0 };
            ppb * molar_mass_g / MOLAR_VOLUME_L
        }
    };
    out as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * b.abs().max(1.0)
    }

    #[test]
    fn identity_is_exact() {
        for u in Unit::ALL {
            assert_eq!(convert(123.456, u, u), 123.456);
        }
    }

    #[test]
    fn ppb_to_ppm_and_back() {
        assert!(close(convert(1000.0, Unit::Ppb, Unit::Ppm), 1.0));
        assert!(close(convert(1.0, Unit::Ppm, Unit::Ppb), 1000.0));
    }

    #[test]
    fn mass_concentrations() {
        // 1 ppm of O3 is about 2.1135 mg/m3
        assert!(close(convert(1.0, Unit::Ppm, Unit::MgM3), 2.113_501));
        assert!(close(convert(1000.0, Unit::Ppb, Unit::MgM3), 2.113_501));
        assert!(close(convert(1.0, Unit::Ppb, Unit::UgM3), 2.113_501));
        assert!(close(convert(1.0, Unit::Ppm, Unit::UgM3), 2113.501));
    }

    #[test]
    fn mass_factor_follows_molar_mass() {
        // 1 ppm of Cl2 (70.906 g/mol) is about 3.1221 mg/m3
        assert!(close(
            convert_with_molar_mass(1.0, Unit::Ppm, Unit::MgM3, 70.906),
            3.122_088
        ));
        assert_eq!(
            convert_with_molar_mass(2.5, Unit::Ppb, Unit::UgM3, O3_MOLAR_MASS),
            convert(2.5, Unit::Ppb, Unit::UgM3)
        );
    }

    #[test]
    fn parses_unit_names() {
        assert_eq!("PPB".parse::<Unit>().unwrap(), Unit::Ppb);
        assert_eq!("mg/m3".parse::<Unit>().unwrap(), Unit::MgM3);
        assert_eq!("ug_m3".parse::<Unit>().unwrap(), Unit::UgM3);
        assert!("percent".parse::<Unit>().is_err());
    }
}
