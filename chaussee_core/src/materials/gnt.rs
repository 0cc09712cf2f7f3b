//! Unbound granular material (GNT) categories.
//!
//! The category of a GNT layer is keyed by the modulus of the supporting
//! platform. Each category carries a modulus ratio `K` (between a GNT layer
//! and the course below it) and a modulus cap `Emax`. Thick bituminous
//! structures only admit CG1.
//!
//! Inputs outside the domain of the tables are errors: there is no default
//! category to fall back to, so the caller decides whether to block the
//! computation or ask for another platform modulus.
//!
//! # Example
//! ```
//! use chaussee_core::materials::GntCategory;
//!
//! let category = GntCategory::from_platform_modulus(650.0).unwrap();
//! assert_eq!(category, GntCategory::CG1);
//!
//! let params = category.parameters(true).unwrap();
//! assert_eq!(params.k, 3.0);
//! assert_eq!(params.e_max_mpa, 360.0);
//!
//! assert!(GntCategory::CG2.parameters(true).is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Lowest platform modulus with a GNT category (MPa)
pub const MIN_PLATFORM_MODULUS_MPA: f64 = 100.0;
/// Highest platform modulus with a GNT category (MPa)
pub const MAX_PLATFORM_MODULUS_MPA: f64 = 700.0;

/// GNT category keyed by platform modulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GntCategory {
    /// Platform modulus in [500, 700] MPa
    CG1,
    /// Platform modulus in [300, 500) MPa
    CG2,
    /// Platform modulus in [100, 300) MPa
    CG3,
}

/// Modulus ratio and cap for a GNT category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GntParameters {
    /// Ratio between the GNT modulus and the modulus of the course below
    pub k: f64,
    /// Upper bound of the GNT modulus (MPa)
    pub e_max_mpa: f64,
}

impl GntCategory {
    /// All categories, best platform first
    pub const ALL: [GntCategory; 3] = [GntCategory::CG1, GntCategory::CG2, GntCategory::CG3];

    /// Classify a platform modulus.
    ///
    /// Fails with [`CalcError::InvalidRange`] outside [100, 700] MPa.
    pub fn from_platform_modulus(platform_modulus_mpa: f64) -> CalcResult<Self> {
        let m = platform_modulus_mpa;
        if (500.0..=MAX_PLATFORM_MODULUS_MPA).contains(&m) {
            Ok(GntCategory::CG1)
        } else if (300.0..500.0).contains(&m) {
            Ok(GntCategory::CG2)
        } else if (MIN_PLATFORM_MODULUS_MPA..300.0).contains(&m) {
            Ok(GntCategory::CG3)
        } else {
            Err(CalcError::invalid_range(
                "platform_modulus_mpa",
                m,
                MIN_PLATFORM_MODULUS_MPA,
                MAX_PLATFORM_MODULUS_MPA,
            ))
        }
    }

    /// Modulus ratio and cap for this category.
    ///
    /// Thick bituminous structures only define parameters for CG1; any other
    /// category fails with [`CalcError::UnsupportedCategory`].
    pub fn parameters(self, thick_bituminous: bool) -> CalcResult<GntParameters> {
        if thick_bituminous {
            return match self {
                GntCategory::CG1 => Ok(GntParameters { k: 3.0, e_max_mpa: 360.0 }),
                other => Err(CalcError::unsupported_category(
                    other.to_string(),
                    "only CG1 is allowed for thick bituminous structures",
                )),
            };
        }

        let params = match self {
            GntCategory::CG1 => GntParameters { k: 3.0, e_max_mpa: 600.0 },
            GntCategory::CG2 => GntParameters { k: 2.5, e_max_mpa: 400.0 },
            GntCategory::CG3 => GntParameters { k: 2.0, e_max_mpa: 200.0 },
        };
        Ok(params)
    }

    /// Platform modulus interval covered by this category, as text
    pub fn platform_range_label(&self) -> &'static str {
        match self {
            GntCategory::CG1 => "500-700 MPa",
            GntCategory::CG2 => "300-500 MPa",
            GntCategory::CG3 => "100-300 MPa",
        }
    }
}

impl std::fmt::Display for GntCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            GntCategory::CG1 => "CG1",
            GntCategory::CG2 => "CG2",
            GntCategory::CG3 => "CG3",
        };
        write!(f, "{}", code)
    }
}

impl GntParameters {
    /// Resolve category and parameters in one step from a platform modulus.
    pub fn for_platform(platform_modulus_mpa: f64, thick_bituminous: bool) -> CalcResult<Self> {
        GntCategory::from_platform_modulus(platform_modulus_mpa)?.parameters(thick_bituminous)
    }
}
