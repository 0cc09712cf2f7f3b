//! Normative ranges for thickness, modulus and Poisson ratio.
//!
//! All functions here are pure: the same inputs always give the same range.
//! The validation engine combines them with the layer's dimensioning mode
//! to decide whether a value is kept, flagged or clamped.
//!
//! ```text
//! Thickness precedence
//!   1. ThickBituminous structure, Wearing role   -> [0.12, 0.35]
//!   2. Automatic mode, Foundation role, GNT      -> [0.15, +inf)
//!   3. by role: Wearing [0.02, 0.08], Base [0.10, 0.35],
//!               Foundation [0.15, 0.35], Platform [0, +inf)
//! ```

use crate::materials::MaterialFamily;

use super::{DimensioningMode, LayerRole, StructureType};

/// Thickness given to the platform, treated as semi-infinite (m)
pub const PLATFORM_THICKNESS_M: f64 = 10_000_000.0;

/// Tolerance when comparing a Poisson ratio with its expected value
pub const POISSON_TOLERANCE: f64 = 0.001;

/// Closed interval `[min, max]`; `max` may be `f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRange {
    pub min: f64,
    pub max: f64,
}

impl NormRange {
    pub const fn new(min: f64, max: f64) -> Self {
        NormRange { min, max }
    }

    /// Range with a lower bound only
    pub const fn at_least(min: f64) -> Self {
        NormRange { min, max: f64::INFINITY }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Nearest value inside the range
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn is_capped(&self) -> bool {
        self.max.is_finite()
    }

    /// Same range with the minimum neutralised to zero
    pub fn without_minimum(&self) -> Self {
        NormRange { min: 0.0, max: self.max }
    }

    /// Human-readable form, e.g. `0.020-0.080 m` or `>= 0.150 m`
    pub fn label(&self, decimals: usize, unit: &str) -> String {
        if self.is_capped() {
            format!("{:.*}-{:.*} {}", decimals, self.min, decimals, self.max, unit)
        } else {
            format!(">= {:.*} {}", decimals, self.min, unit)
        }
    }
}

/// Thickness range in meters for a course.
pub fn thickness_range(
    role: LayerRole,
    family: MaterialFamily,
    structure_type: StructureType,
    mode: DimensioningMode,
) -> NormRange {
    if structure_type == StructureType::ThickBituminous && role == LayerRole::Wearing {
        return NormRange::new(0.12, 0.35);
    }

    if mode == DimensioningMode::Automatic
        && role == LayerRole::Foundation
        && family == MaterialFamily::UnboundGranular
    {
        return NormRange::at_least(0.15);
    }

    match role {
        LayerRole::Wearing => NormRange::new(0.02, 0.08),
        LayerRole::Base => NormRange::new(0.10, 0.35),
        LayerRole::Foundation => NormRange::new(0.15, 0.35),
        LayerRole::Platform => NormRange::at_least(0.0),
    }
}

/// Whether the minimum thickness of this course is waived.
///
/// In Expert mode the thinnest foundation sub-layer of a flexible or thick
/// bituminous structure has no minimum thickness.
pub fn thickness_exemption_applies(
    role: LayerRole,
    structure_type: StructureType,
    mode: DimensioningMode,
    is_smallest_foundation: bool,
) -> bool {
    mode == DimensioningMode::Expert
        && role == LayerRole::Foundation
        && matches!(structure_type, StructureType::Flexible | StructureType::ThickBituminous)
        && is_smallest_foundation
}

/// Modulus range in MPa for a material family.
pub fn modulus_range(family: MaterialFamily) -> NormRange {
    match family {
        MaterialFamily::UnboundGranular => NormRange::new(100.0, 1_000.0),
        MaterialFamily::HydraulicBinder => NormRange::new(3_000.0, 32_000.0),
        MaterialFamily::BituminousConcrete => NormRange::new(3_000.0, 18_000.0),
        MaterialFamily::CementConcrete => NormRange::new(18_000.0, 40_000.0),
        MaterialFamily::LibraryDefined => NormRange::new(1.0, 100_000.0),
    }
}

/// Poisson ratio the standard prescribes for a family.
///
/// Library materials have no prescribed value: the current one is returned.
pub fn expected_poisson(family: MaterialFamily, current: f64) -> f64 {
    match family {
        MaterialFamily::UnboundGranular | MaterialFamily::BituminousConcrete => 0.35,
        MaterialFamily::HydraulicBinder | MaterialFamily::CementConcrete => 0.25,
        MaterialFamily::LibraryDefined => current,
    }
}

/// Whether a Poisson ratio conforms for a family
pub fn poisson_conforms(family: MaterialFamily, value: f64) -> bool {
    family.is_library_defined() || (value - expected_poisson(family, value)).abs() <= POISSON_TOLERANCE
}
