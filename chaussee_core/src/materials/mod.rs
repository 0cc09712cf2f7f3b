//! # Materials
//!
//! Material families recognised by NF P98-086 and the unbound granular
//! material (GNT) category lookups.
//!
//! The family of a layer drives every normative range (modulus, Poisson,
//! part of the thickness rules) and both correction coefficients.
//!
//! ## Example
//!
//! ```rust
//! use chaussee_core::materials::MaterialFamily;
//!
//! let family = MaterialFamily::BituminousConcrete;
//! assert_eq!(family.code(), "BB");
//! assert_eq!(family.to_string(), "Bituminous concrete");
//! ```

pub mod gnt;

pub use gnt::{GntCategory, GntParameters};

use serde::{Deserialize, Serialize};

/// Material family of a pavement course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MaterialFamily {
    /// GNT - unbound granular material and soils
    #[default]
    UnboundGranular,
    /// MTLH - materials treated with hydraulic binders
    HydraulicBinder,
    /// BB - bituminous concrete
    BituminousConcrete,
    /// BC - cement concrete
    CementConcrete,
    /// Material picked from the user library, no normative constraint
    LibraryDefined,
}

impl MaterialFamily {
    /// All families in display order
    pub const ALL: [MaterialFamily; 5] = [
        MaterialFamily::UnboundGranular,
        MaterialFamily::HydraulicBinder,
        MaterialFamily::BituminousConcrete,
        MaterialFamily::CementConcrete,
        MaterialFamily::LibraryDefined,
    ];

    /// Short code used in the French standard
    pub fn code(&self) -> &'static str {
        match self {
            MaterialFamily::UnboundGranular => "GNT",
            MaterialFamily::HydraulicBinder => "MTLH",
            MaterialFamily::BituminousConcrete => "BB",
            MaterialFamily::CementConcrete => "BC",
            MaterialFamily::LibraryDefined => "LIB",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            MaterialFamily::UnboundGranular => "Unbound granular",
            MaterialFamily::HydraulicBinder => "Hydraulic binder",
            MaterialFamily::BituminousConcrete => "Bituminous concrete",
            MaterialFamily::CementConcrete => "Cement concrete",
            MaterialFamily::LibraryDefined => "Library material",
        }
    }

    /// Library materials carry user-supplied properties and are exempt
    /// from the Poisson norm check.
    pub fn is_library_defined(&self) -> bool {
        matches!(self, MaterialFamily::LibraryDefined)
    }
}

impl std::fmt::Display for MaterialFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
