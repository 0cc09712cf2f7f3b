//! # Pavement Layer
//!
//! One course of a pavement structure. The plain attributes (role, family,
//! thickness, modulus, Poisson ratio, interface, mode) are persisted; the
//! per-field validation state and messages are rebuilt by
//! [`ValidationEngine::revalidate`] after loading.
//!
//! Range-checked fields are private: every mutation goes through the
//! [`ValidationEngine`], which applies the normative ranges and the
//! Expert/Automatic correction policy. The coefficients ks and kd are never
//! stored and are recomputed on every read.
//!
//! ## Example
//!
//! ```
//! use chaussee_core::layer::{Layer, LayerField, StructureSnapshot, ValidationEngine};
//! use chaussee_core::materials::MaterialFamily;
//! use chaussee_core::norms::{DimensioningMode, LayerRole, StructureType};
//!
//! let ctx = StructureSnapshot::new(StructureType::Flexible, None);
//! let mut engine = ValidationEngine::new();
//! let mut layer = Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BBSG");
//!
//! engine.set_mode(&mut layer, DimensioningMode::Automatic, &ctx);
//! let outcome = engine.set_modulus(&mut layer, 500.0);
//!
//! assert_eq!(layer.modulus_mpa(), 3000.0);
//! assert!(layer.correction_note().contains("3000"));
//! assert!(!outcome.notifications.is_empty());
//! assert!(!layer.is_out_of_norm(LayerField::Modulus));
//! ```

pub mod validation;

pub use validation::{
    CorrectionDecision, CorrectionHandler, CorrectionRequest, FieldOutcome, LayerOutcome,
    Notification, NotificationSink, Severity, StructureContext, StructureSnapshot, TracingSink,
    ValidationEngine,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::materials::MaterialFamily;
use crate::norms::{
    self, thickness_exemption_applies, thickness_range, DimensioningMode, InterfaceType, LayerRole,
    NormRange, PLATFORM_THICKNESS_M,
};

/// Range-checked field of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerField {
    Thickness,
    Modulus,
    Poisson,
}

impl LayerField {
    pub const ALL: [LayerField; 3] = [LayerField::Thickness, LayerField::Modulus, LayerField::Poisson];

    fn index(self) -> usize {
        match self {
            LayerField::Thickness => 0,
            LayerField::Modulus => 1,
            LayerField::Poisson => 2,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LayerField::Thickness => "Thickness",
            LayerField::Modulus => "Modulus",
            LayerField::Poisson => "Poisson ratio",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            LayerField::Thickness => "m",
            LayerField::Modulus => "MPa",
            LayerField::Poisson => "",
        }
    }

    /// Decimals used when the value is shown to the user
    pub fn decimals(&self) -> usize {
        match self {
            LayerField::Thickness => 3,
            LayerField::Modulus => 0,
            LayerField::Poisson => 2,
        }
    }

    /// Value with unit, e.g. `0.040 m` or `3000 MPa`
    pub fn format_value(&self, value: f64) -> String {
        let number = format!("{:.*}", self.decimals(), value);
        if self.unit().is_empty() {
            number
        } else {
            format!("{} {}", number, self.unit())
        }
    }
}

impl std::fmt::Display for LayerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Validation state of one range-checked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldState {
    /// Value inside its normative range
    #[default]
    Conforming,
    /// Expert mode kept a value outside its range
    OutOfNormKept,
    /// Value was clamped, automatically or by an accepted correction
    AutoCorrected,
}

/// One pavement course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Position in the structure, 1 = top
    pub order: usize,
    role: LayerRole,
    family: MaterialFamily,
    /// Free-text material name
    pub material_name: String,
    thickness_m: f64,
    modulus_mpa: f64,
    poisson: f64,
    /// Bonding with the course below; `None` only for the platform
    pub interface_with_below: Option<InterfaceType>,
    mode: DimensioningMode,
    /// Correction note per field, kept until the field conforms again
    #[serde(default)]
    notes: BTreeMap<LayerField, String>,
    #[serde(skip)]
    states: [FieldState; 3],
    #[serde(skip)]
    errors: BTreeMap<LayerField, Vec<String>>,
}

impl Layer {
    /// Create a layer with the conventional defaults for its family.
    ///
    /// Thickness starts at the lower bound of the role's range (the sentinel
    /// for a platform), modulus at the lower bound of the family range and
    /// Poisson at the prescribed value. The layer is in Expert mode.
    pub fn new(
        order: usize,
        role: LayerRole,
        family: MaterialFamily,
        material_name: impl Into<String>,
    ) -> Self {
        let default_range = thickness_range(
            role,
            family,
            Default::default(),
            DimensioningMode::Expert,
        );
        let thickness_m = if role.is_platform() {
            PLATFORM_THICKNESS_M
        } else {
            default_range.min
        };

        Layer {
            order,
            role,
            family,
            material_name: material_name.into(),
            thickness_m,
            modulus_mpa: norms::modulus_range(family).min,
            poisson: norms::expected_poisson(family, 0.35),
            interface_with_below: if role.is_platform() { None } else { Some(InterfaceType::Bonded) },
            mode: DimensioningMode::Expert,
            notes: BTreeMap::new(),
            states: [FieldState::Conforming; 3],
            errors: BTreeMap::new(),
        }
    }

    /// Set raw values without validation.
    ///
    /// Meant for building a layer before handing it to
    /// [`ValidationEngine::revalidate`]; negative and NaN inputs still
    /// become 0 and a platform keeps its sentinel thickness.
    pub fn with_values(mut self, thickness_m: f64, modulus_mpa: f64, poisson: f64) -> Self {
        self.thickness_m = if self.role.is_platform() {
            PLATFORM_THICKNESS_M
        } else {
            sanitize(thickness_m)
        };
        self.modulus_mpa = sanitize(modulus_mpa);
        self.poisson = sanitize(poisson);
        self
    }

    pub fn with_interface(mut self, interface: InterfaceType) -> Self {
        if !self.role.is_platform() {
            self.interface_with_below = Some(interface);
        }
        self
    }

    pub fn with_mode(mut self, mode: DimensioningMode) -> Self {
        self.mode = mode;
        self
    }

    // ------------------------------------------------------------------
    // Plain accessors
    // ------------------------------------------------------------------

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn family(&self) -> MaterialFamily {
        self.family
    }

    pub fn thickness_m(&self) -> f64 {
        self.thickness_m
    }

    pub fn modulus_mpa(&self) -> f64 {
        self.modulus_mpa
    }

    pub fn poisson(&self) -> f64 {
        self.poisson
    }

    pub fn mode(&self) -> DimensioningMode {
        self.mode
    }

    pub fn is_platform(&self) -> bool {
        self.role.is_platform()
    }

    pub fn value(&self, field: LayerField) -> f64 {
        match field {
            LayerField::Thickness => self.thickness_m,
            LayerField::Modulus => self.modulus_mpa,
            LayerField::Poisson => self.poisson,
        }
    }

    pub fn state(&self, field: LayerField) -> FieldState {
        self.states[field.index()]
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    /// Structural coefficient, recomputed on every call
    pub fn ks(&self) -> f64 {
        norms::ks(self.role, self.family)
    }

    /// Deformation coefficient, recomputed on every call
    pub fn kd(&self) -> f64 {
        norms::kd(self.role, self.family, self.thickness_m)
    }

    /// Effective thickness range, with the smallest-foundation exemption
    pub fn thickness_range(&self, ctx: &dyn StructureContext) -> NormRange {
        let range = thickness_range(self.role, self.family, ctx.structure_type(), self.mode);
        let exempt = thickness_exemption_applies(
            self.role,
            ctx.structure_type(),
            self.mode,
            ctx.is_smallest_foundation(self),
        );
        if exempt {
            range.without_minimum()
        } else {
            range
        }
    }

    pub fn modulus_range(&self) -> NormRange {
        norms::modulus_range(self.family)
    }

    /// Thickness as shown to the user; the platform is semi-infinite
    pub fn thickness_display(&self) -> String {
        if self.is_platform() {
            "∞".to_string()
        } else {
            format!("{:.3}", self.thickness_m)
        }
    }

    pub fn modulus_display(&self) -> String {
        format!("{:.0}", self.modulus_mpa)
    }

    pub fn poisson_display(&self) -> String {
        format!("{:.2}", self.poisson)
    }

    // ------------------------------------------------------------------
    // Validation results
    // ------------------------------------------------------------------

    /// True iff the field holds a value kept out of norm in Expert mode
    pub fn is_out_of_norm(&self, field: LayerField) -> bool {
        self.state(field) == FieldState::OutOfNormKept
    }

    pub fn is_thickness_out_of_norm(&self) -> bool {
        self.is_out_of_norm(LayerField::Thickness)
    }

    pub fn is_modulus_out_of_norm(&self) -> bool {
        self.is_out_of_norm(LayerField::Modulus)
    }

    pub fn is_poisson_out_of_norm(&self) -> bool {
        self.is_out_of_norm(LayerField::Poisson)
    }

    /// Warning text shown next to an out-of-norm field
    pub fn out_of_norm_tooltip(&self, field: LayerField) -> Option<String> {
        if !self.is_out_of_norm(field) {
            return None;
        }
        self.errors_for(field).first().cloned()
    }

    /// All correction notes, joined in field order
    pub fn correction_note(&self) -> String {
        self.notes.values().cloned().collect::<Vec<_>>().join("\n")
    }

    pub fn has_correction(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|messages| !messages.is_empty())
    }

    pub fn errors_for(&self, field: LayerField) -> &[String] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every validation message with the field it belongs to
    pub fn all_errors(&self) -> Vec<(LayerField, String)> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| (*field, m.clone())))
            .collect()
    }

    // ------------------------------------------------------------------
    // Engine-only mutation
    // ------------------------------------------------------------------

    fn store(&mut self, field: LayerField, value: f64) {
        match field {
            LayerField::Thickness => self.thickness_m = value,
            LayerField::Modulus => self.modulus_mpa = value,
            LayerField::Poisson => self.poisson = value,
        }
    }

    fn set_state(&mut self, field: LayerField, state: FieldState) {
        self.states[field.index()] = state;
    }

    fn clear_field(&mut self, field: LayerField) {
        self.notes.remove(&field);
        self.errors.remove(&field);
    }
}

/// Negative and NaN inputs are treated as 0.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_defaults() {
        let layer = Layer::new(2, LayerRole::Base, MaterialFamily::UnboundGranular, "GNT");
        assert_eq!(layer.thickness_m(), 0.10);
        assert_eq!(layer.modulus_mpa(), 100.0);
        assert_eq!(layer.poisson(), 0.35);
        assert_eq!(layer.mode(), DimensioningMode::Expert);
        assert_eq!(layer.interface_with_below, Some(InterfaceType::Bonded));
        assert!(!layer.has_errors());
        assert!(!layer.has_correction());
    }

    #[test]
    fn test_platform_defaults() {
        let layer = Layer::new(4, LayerRole::Platform, MaterialFamily::UnboundGranular, "Plateforme")
            .with_values(0.25, 50.0, 0.35);
        assert_eq!(layer.thickness_m(), PLATFORM_THICKNESS_M);
        assert_eq!(layer.thickness_display(), "∞");
        assert_eq!(layer.interface_with_below, None);
        assert!(!layer.is_thickness_out_of_norm());
    }

    #[test]
    fn test_with_values_sanitizes() {
        let layer = Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB")
            .with_values(-0.1, f64::NAN, -1.0);
        assert_eq!(layer.thickness_m(), 0.0);
        assert_eq!(layer.modulus_mpa(), 0.0);
        assert_eq!(layer.poisson(), 0.0);
    }

    #[test]
    fn test_coefficients_follow_thickness() {
        let thin = Layer::new(2, LayerRole::Base, MaterialFamily::UnboundGranular, "GNT")
            .with_values(0.12, 800.0, 0.35);
        let thick = thin.clone().with_values(0.32, 800.0, 0.35);
        assert_eq!(thin.ks(), 1.0);
        assert_eq!(thin.kd(), 2.2);
        assert_eq!(thick.kd(), 1.8);
    }

    #[test]
    fn test_displays() {
        let layer = Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB")
            .with_values(0.04, 5000.0, 0.35);
        assert_eq!(layer.thickness_display(), "0.040");
        assert_eq!(layer.modulus_display(), "5000");
        assert_eq!(layer.poisson_display(), "0.35");
    }

    #[test]
    fn test_serde_skips_validation_state() {
        let mut layer = Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB");
        layer.set_state(LayerField::Modulus, FieldState::OutOfNormKept);
        layer.errors.insert(LayerField::Modulus, vec!["out".into()]);
        layer.notes.insert(LayerField::Thickness, "adjusted".into());

        let json = serde_json::to_string(&layer).unwrap();
        assert!(!json.contains("states"));
        let restored: Layer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(LayerField::Modulus), FieldState::Conforming);
        assert!(!restored.has_errors());
        assert_eq!(restored.correction_note(), "adjusted");
    }

    #[test]
    fn test_field_formatting() {
        assert_eq!(LayerField::Thickness.format_value(0.04), "0.040 m");
        assert_eq!(LayerField::Modulus.format_value(3000.0), "3000 MPa");
        assert_eq!(LayerField::Poisson.format_value(0.25), "0.25");
    }
}
