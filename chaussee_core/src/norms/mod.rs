//! # NF P98-086 Normative Vocabulary
//!
//! Classification enums shared by the range policy, the coefficient
//! calculator and the layer validation engine, plus traceable section
//! references into the standard.
//!
//! ## Overview
//!
//! | Concept           | Drives                                           |
//! |-------------------|--------------------------------------------------|
//! | [`LayerRole`]     | thickness range, ks, kd (platform short-circuit) |
//! | [`StructureType`] | thick-bituminous wearing range, exemption rule   |
//! | [`DimensioningMode`] | keep-with-warning vs clamp                    |
//! | [`InterfaceType`] | bonding with the course below                    |
//!
//! ## Reference
//!
//! NF P98-086, Dimensionnement structurel des chaussées routières

pub mod coefficients;
pub mod ranges;

pub use coefficients::{kd, ks};
pub use ranges::{
    expected_poisson, modulus_range, thickness_exemption_applies, thickness_range, NormRange,
    PLATFORM_THICKNESS_M,
};

use serde::{Deserialize, Serialize};

use crate::text::fold_accents;

// ============================================================================
// NF P98-086 Section References
// ============================================================================

/// Section references quoted in correction notes and reports.
pub mod nf_ref {
    /// The standard itself
    pub const STANDARD: &str = "NF P98-086";
    /// Structural coefficient ks
    pub const KS: &str = "NF P98-086 §6.2.2";
    /// Deformation coefficient kd
    pub const KD: &str = "NF P98-086 §6.2.3";
    /// Thickness adjustment of kd
    pub const KD_THICKNESS: &str = "NF P98-086 §6.2.3.2";
    /// Interface conditions between courses
    pub const INTERFACES: &str = "NF P98-086 §8.5.1.3";
    /// Flexible structures
    pub const FLEXIBLE: &str = "NF P98-086 §3.1.11";
    /// Thick bituminous structures
    pub const THICK_BITUMINOUS: &str = "NF P98-086 §3.1.12";
    /// Semi-rigid structures
    pub const SEMI_RIGID: &str = "NF P98-086 §3.1.13";
    /// Rigid structures
    pub const RIGID: &str = "NF P98-086 §3.1.16";
}

/// Functional position of a course in the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LayerRole {
    /// Surface course (couche de roulement)
    Wearing,
    /// Base course (couche de base)
    Base,
    /// Foundation course (couche de fondation)
    #[default]
    Foundation,
    /// Supporting platform, semi-infinite
    Platform,
}

impl LayerRole {
    /// All roles from top to bottom
    pub const ALL: [LayerRole; 4] = [
        LayerRole::Wearing,
        LayerRole::Base,
        LayerRole::Foundation,
        LayerRole::Platform,
    ];

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LayerRole::Wearing => "Wearing",
            LayerRole::Base => "Base",
            LayerRole::Foundation => "Foundation",
            LayerRole::Platform => "Platform",
        }
    }

    pub fn is_platform(&self) -> bool {
        matches!(self, LayerRole::Platform)
    }

    /// Base and foundation courses together form the "assises"
    pub fn is_structural_course(&self) -> bool {
        matches!(self, LayerRole::Base | LayerRole::Foundation)
    }
}

impl std::fmt::Display for LayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Pavement structure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StructureType {
    /// Chaussée souple
    #[default]
    Flexible,
    /// Chaussée bitumineuse épaisse
    ThickBituminous,
    /// Chaussée semi-rigide
    SemiRigid,
    /// Chaussée mixte
    Composite,
    /// Chaussée inverse
    Inverted,
    /// Chaussée rigide
    Rigid,
    /// Anything the standard has no dedicated rules for
    Other,
}

impl StructureType {
    /// All structure types for UI selection
    pub const ALL: [StructureType; 7] = [
        StructureType::Flexible,
        StructureType::ThickBituminous,
        StructureType::SemiRigid,
        StructureType::Composite,
        StructureType::Inverted,
        StructureType::Rigid,
        StructureType::Other,
    ];

    /// Parse a structure type label.
    ///
    /// Case-insensitive and trim-normalised; accepts the French labels of the
    /// standard ("Souple", "Bitumineuse épaisse", ...) as well as the English
    /// names. Unknown labels map to [`StructureType::Other`].
    ///
    /// ```
    /// use chaussee_core::norms::StructureType;
    ///
    /// assert_eq!(StructureType::parse("  BITUMINEUSE ÉPAISSE "), StructureType::ThickBituminous);
    /// assert_eq!(StructureType::parse("souple"), StructureType::Flexible);
    /// assert_eq!(StructureType::parse("gravel road"), StructureType::Other);
    /// ```
    pub fn parse(label: &str) -> Self {
        let key: String = fold_accents(label.trim())
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        match key.as_str() {
            "souple" | "flexible" => StructureType::Flexible,
            "bitumineuseepaisse" | "thickbituminous" => StructureType::ThickBituminous,
            "semirigide" | "semirigid" => StructureType::SemiRigid,
            "mixte" | "composite" => StructureType::Composite,
            "inverse" | "inversee" | "inverted" => StructureType::Inverted,
            "rigide" | "rigid" => StructureType::Rigid,
            _ => StructureType::Other,
        }
    }

    /// French label as used in the standard
    pub fn french_label(&self) -> &'static str {
        match self {
            StructureType::Flexible => "Souple",
            StructureType::ThickBituminous => "Bitumineuse épaisse",
            StructureType::SemiRigid => "Semi-rigide",
            StructureType::Composite => "Mixte",
            StructureType::Inverted => "Inversée",
            StructureType::Rigid => "Rigide",
            StructureType::Other => "Autre",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            StructureType::Flexible => "Flexible",
            StructureType::ThickBituminous => "Thick bituminous",
            StructureType::SemiRigid => "Semi-rigid",
            StructureType::Composite => "Composite",
            StructureType::Inverted => "Inverted",
            StructureType::Rigid => "Rigid",
            StructureType::Other => "Other",
        }
    }
}

impl From<&str> for StructureType {
    fn from(label: &str) -> Self {
        StructureType::parse(label)
    }
}

impl std::fmt::Display for StructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How out-of-norm values are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DimensioningMode {
    /// Values are kept as entered; deviations raise warnings
    #[default]
    Expert,
    /// Deviations are clamped to the nearest normative bound
    Automatic,
}

impl DimensioningMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            DimensioningMode::Expert => "Expert",
            DimensioningMode::Automatic => "Automatic",
        }
    }
}

impl std::fmt::Display for DimensioningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Bonding condition between a course and the course below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InterfaceType {
    /// Collée
    #[default]
    Bonded,
    /// Semi-collée
    SemiBonded,
    /// Décollée
    Unbonded,
}

impl InterfaceType {
    pub const ALL: [InterfaceType; 3] = [
        InterfaceType::Bonded,
        InterfaceType::SemiBonded,
        InterfaceType::Unbonded,
    ];

    /// Integer code expected by the external mechanical engine
    pub fn engine_code(&self) -> i32 {
        match self {
            InterfaceType::Bonded => 0,
            InterfaceType::SemiBonded => 1,
            InterfaceType::Unbonded => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InterfaceType::Bonded => "Bonded",
            InterfaceType::SemiBonded => "Semi-bonded",
            InterfaceType::Unbonded => "Unbonded",
        }
    }
}

impl std::fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
