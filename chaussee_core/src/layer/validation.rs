//! # Layer Validation Engine
//!
//! Applies the normative ranges to a [`Layer`] and resolves every anomaly
//! to one of three field states:
//!
//! | Mode      | In range     | Out of range                              |
//! |-----------|--------------|-------------------------------------------|
//! | Expert    | `Conforming` | `OutOfNormKept`, warned once per field    |
//! | Automatic | `Conforming` | clamped to nearest bound, `AutoCorrected` |
//!
//! In Expert mode a direct thickness assignment may be handed to an
//! interactive [`CorrectionHandler`] which decides to apply the clamp, keep
//! the value or cancel the edit. Re-validation after a role, family or mode
//! change never consults the handler.
//!
//! Every mutator returns its notifications and also forwards them to the
//! engine's [`NotificationSink`] (by default, `tracing` events).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{sanitize, FieldState, Layer, LayerField};
use crate::materials::MaterialFamily;
use crate::norms::{
    nf_ref, ranges::poisson_conforms, thickness_range, DimensioningMode, InterfaceType, LayerRole,
    NormRange, StructureType, PLATFORM_THICKNESS_M,
};

// ============================================================================
// Collaborators
// ============================================================================

/// Structure-level facts a layer cannot know on its own.
pub trait StructureContext {
    fn structure_type(&self) -> StructureType;

    /// Whether `layer` is the thinnest foundation sub-layer
    fn is_smallest_foundation(&self, layer: &Layer) -> bool;
}

/// Owned copy of the structure facts, taken before a layer is borrowed
/// mutably.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StructureSnapshot {
    pub structure_type: StructureType,
    /// Order of the thinnest foundation layer, if any
    pub smallest_foundation: Option<usize>,
}

impl StructureSnapshot {
    pub fn new(structure_type: StructureType, smallest_foundation: Option<usize>) -> Self {
        StructureSnapshot { structure_type, smallest_foundation }
    }
}

impl StructureContext for StructureSnapshot {
    fn structure_type(&self) -> StructureType {
        self.structure_type
    }

    fn is_smallest_foundation(&self, layer: &Layer) -> bool {
        self.smallest_foundation == Some(layer.order)
    }
}

/// Out-of-norm thickness submitted to the interactive handler
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRequest {
    pub order: usize,
    pub field: LayerField,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Answer of the interactive handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionDecision {
    /// Clamp to the nearest bound
    Apply,
    /// Keep the value as entered
    Keep,
    /// Restore the previous value
    Cancel,
}

/// Synchronous strategy consulted for out-of-norm thickness in Expert mode.
pub trait CorrectionHandler {
    fn decide(&mut self, request: &CorrectionRequest) -> CorrectionDecision;
}

impl<F> CorrectionHandler for F
where
    F: FnMut(&CorrectionRequest) -> CorrectionDecision,
{
    fn decide(&mut self, request: &CorrectionRequest) -> CorrectionDecision {
        self(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Message for the user about a validation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// Layer position the event is about
    pub order: usize,
    pub field: LayerField,
}

/// Receives every notification the engine emits.
pub trait NotificationSink {
    fn notify(&mut self, notification: &Notification);
}

impl<F> NotificationSink for F
where
    F: FnMut(&Notification),
{
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Default sink: one `tracing` event per notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&mut self, n: &Notification) {
        match n.severity {
            Severity::Info | Severity::Success => {
                info!(layer = n.order, field = %n.field, "{}", n.message)
            }
            Severity::Warning => warn!(layer = n.order, field = %n.field, "{}", n.message),
            Severity::Error => error!(layer = n.order, field = %n.field, "{}", n.message),
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of validating one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    pub field: LayerField,
    /// Value before the call
    pub previous: f64,
    /// Value after the call
    pub value: f64,
    pub state: FieldState,
    pub notifications: Vec<Notification>,
}

impl FieldOutcome {
    fn unchanged(layer: &Layer, field: LayerField) -> Self {
        FieldOutcome {
            field,
            previous: layer.value(field),
            value: layer.value(field),
            state: layer.state(field),
            notifications: Vec::new(),
        }
    }

    /// Whether the stored value differs from the one before the call
    pub fn changed(&self) -> bool {
        self.previous.to_bits() != self.value.to_bits()
    }

    pub fn was_corrected(&self) -> bool {
        self.state == FieldState::AutoCorrected && self.changed()
    }
}

/// Result of re-validating a whole layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerOutcome {
    pub order: usize,
    pub fields: Vec<FieldOutcome>,
}

impl LayerOutcome {
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.fields.iter().flat_map(|f| f.notifications.iter())
    }

    pub fn field(&self, field: LayerField) -> Option<&FieldOutcome> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn has_notifications(&self) -> bool {
        self.notifications().next().is_some()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Per-layer validation and correction policy.
///
/// Holds the optional interactive handler, the notification sink and the
/// set of (layer position, field) pairs already warned about in Expert
/// mode. That set must be cleared with [`reset_warnings`](Self::reset_warnings)
/// whenever positions are reassigned or a structure is reloaded.
pub struct ValidationEngine {
    handler: Option<Box<dyn CorrectionHandler + Send>>,
    sink: Box<dyn NotificationSink + Send>,
    warned: HashSet<(usize, LayerField)>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("interactive", &self.handler.is_some())
            .field("warned", &self.warned.len())
            .finish()
    }
}

impl ValidationEngine {
    /// Non-interactive engine logging through `tracing`
    pub fn new() -> Self {
        ValidationEngine {
            handler: None,
            sink: Box::new(TracingSink),
            warned: HashSet::new(),
        }
    }

    pub fn with_handler(mut self, handler: impl CorrectionHandler + Send + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_sink(mut self, sink: impl NotificationSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn set_handler(&mut self, handler: Option<Box<dyn CorrectionHandler + Send>>) {
        self.handler = handler;
    }

    pub fn is_interactive(&self) -> bool {
        self.handler.is_some()
    }

    /// Forget which fields were already warned about
    pub fn reset_warnings(&mut self) {
        self.warned.clear();
    }

    // ------------------------------------------------------------------
    // Field assignment
    // ------------------------------------------------------------------

    /// Assign a thickness (m). The platform keeps its sentinel.
    pub fn set_thickness(
        &mut self,
        layer: &mut Layer,
        value: f64,
        ctx: &dyn StructureContext,
    ) -> FieldOutcome {
        let field = LayerField::Thickness;
        let value = sanitize(value);
        if layer.is_platform() || value.to_bits() == layer.thickness_m.to_bits() {
            return FieldOutcome::unchanged(layer, field);
        }

        let previous = (layer.thickness_m, layer.state(field));
        layer.store(field, value);
        let range = layer.thickness_range(ctx);
        let conforms = range.contains(value);
        self.apply(layer, field, range, conforms, previous, true)
    }

    /// Assign a modulus (MPa)
    pub fn set_modulus(&mut self, layer: &mut Layer, value: f64) -> FieldOutcome {
        let field = LayerField::Modulus;
        let value = sanitize(value);
        if value.to_bits() == layer.modulus_mpa.to_bits() {
            return FieldOutcome::unchanged(layer, field);
        }

        let previous = (layer.modulus_mpa, layer.state(field));
        layer.store(field, value);
        let range = layer.modulus_range();
        let conforms = range.contains(value);
        self.apply(layer, field, range, conforms, previous, false)
    }

    /// Assign a Poisson ratio
    pub fn set_poisson(&mut self, layer: &mut Layer, value: f64) -> FieldOutcome {
        let field = LayerField::Poisson;
        let value = sanitize(value);
        if value.to_bits() == layer.poisson.to_bits() {
            return FieldOutcome::unchanged(layer, field);
        }

        let previous = (layer.poisson, layer.state(field));
        layer.store(field, value);
        self.validate_poisson(layer, previous)
    }

    // ------------------------------------------------------------------
    // Whole-layer changes
    // ------------------------------------------------------------------

    /// Change the role and re-validate the layer.
    ///
    /// Becoming the platform pins the thickness to the sentinel and drops
    /// the interface. Leaving it restores the lower bound of the new range
    /// and a bonded interface.
    pub fn set_role(
        &mut self,
        layer: &mut Layer,
        role: LayerRole,
        ctx: &dyn StructureContext,
    ) -> LayerOutcome {
        if layer.role == role {
            return LayerOutcome { order: layer.order, fields: Vec::new() };
        }

        let was_platform = layer.role.is_platform();
        debug!(layer = layer.order, from = %layer.role, to = %role, "layer role changed");
        layer.role = role;

        if role.is_platform() {
            layer.interface_with_below = None;
        } else if was_platform {
            let range = thickness_range(role, layer.family, ctx.structure_type(), layer.mode);
            layer.thickness_m = range.min;
            layer.interface_with_below = Some(InterfaceType::Bonded);
        }

        self.revalidate(layer, ctx)
    }

    /// Change the material family and re-validate the layer
    pub fn set_family(
        &mut self,
        layer: &mut Layer,
        family: MaterialFamily,
        ctx: &dyn StructureContext,
    ) -> LayerOutcome {
        if layer.family == family {
            return LayerOutcome { order: layer.order, fields: Vec::new() };
        }
        debug!(layer = layer.order, from = %layer.family, to = %family, "layer family changed");
        layer.family = family;
        self.revalidate(layer, ctx)
    }

    /// Switch Expert/Automatic and re-validate from the stored values
    pub fn set_mode(
        &mut self,
        layer: &mut Layer,
        mode: DimensioningMode,
        ctx: &dyn StructureContext,
    ) -> LayerOutcome {
        if layer.mode == mode {
            return LayerOutcome { order: layer.order, fields: Vec::new() };
        }
        debug!(layer = layer.order, %mode, "dimensioning mode changed");
        layer.mode = mode;
        self.revalidate(layer, ctx)
    }

    /// Re-validate all three fields without consulting the handler.
    pub fn revalidate(&mut self, layer: &mut Layer, ctx: &dyn StructureContext) -> LayerOutcome {
        let mut fields = Vec::with_capacity(3);

        let thickness = LayerField::Thickness;
        let previous = (layer.thickness_m, layer.state(thickness));
        if layer.is_platform() {
            layer.thickness_m = PLATFORM_THICKNESS_M;
            layer.interface_with_below = None;
            fields.push(self.conform(layer, thickness, previous.0));
        } else {
            let range = layer.thickness_range(ctx);
            let conforms = range.contains(layer.thickness_m);
            fields.push(self.apply(layer, thickness, range, conforms, previous, false));
        }

        let modulus = LayerField::Modulus;
        let previous = (layer.modulus_mpa, layer.state(modulus));
        let range = layer.modulus_range();
        let conforms = range.contains(layer.modulus_mpa);
        fields.push(self.apply(layer, modulus, range, conforms, previous, false));

        let previous = (layer.poisson, layer.state(LayerField::Poisson));
        fields.push(self.validate_poisson(layer, previous));

        LayerOutcome { order: layer.order, fields }
    }

    // ------------------------------------------------------------------
    // Policy
    // ------------------------------------------------------------------

    fn validate_poisson(&mut self, layer: &mut Layer, previous: (f64, FieldState)) -> FieldOutcome {
        let field = LayerField::Poisson;
        if layer.family.is_library_defined() {
            return self.conform(layer, field, previous.0);
        }
        let expected = crate::norms::expected_poisson(layer.family, layer.poisson);
        let conforms = poisson_conforms(layer.family, layer.poisson);
        self.apply(layer, field, NormRange::new(expected, expected), conforms, previous, false)
    }

    /// Resolve a stored value against its range.
    ///
    /// `interactive` is true only for a direct thickness assignment.
    fn apply(
        &mut self,
        layer: &mut Layer,
        field: LayerField,
        range: NormRange,
        conforms: bool,
        previous: (f64, FieldState),
        interactive: bool,
    ) -> FieldOutcome {
        if conforms {
            return self.conform(layer, field, previous.0);
        }

        if layer.mode == DimensioningMode::Automatic {
            return self.clamp(layer, field, range, previous.0, Severity::Warning);
        }

        let decision = match self.handler.as_mut() {
            Some(handler) if interactive && field == LayerField::Thickness => {
                let request = CorrectionRequest {
                    order: layer.order,
                    field,
                    value: layer.value(field),
                    min: range.min,
                    max: range.max,
                };
                handler.decide(&request)
            }
            _ => CorrectionDecision::Keep,
        };

        match decision {
            CorrectionDecision::Apply => self.clamp(layer, field, range, previous.0, Severity::Success),
            CorrectionDecision::Keep => self.keep(layer, field, range, previous.0),
            CorrectionDecision::Cancel => self.cancel(layer, field, previous),
        }
    }

    fn conform(&mut self, layer: &mut Layer, field: LayerField, previous: f64) -> FieldOutcome {
        layer.set_state(field, FieldState::Conforming);
        layer.clear_field(field);
        self.outcome(layer, field, previous, Vec::new())
    }

    fn clamp(
        &mut self,
        layer: &mut Layer,
        field: LayerField,
        range: NormRange,
        previous: f64,
        severity: Severity,
    ) -> FieldOutcome {
        let entered = layer.value(field);
        let corrected = range.clamp(entered);
        let bound = if entered < range.min { "min." } else { "max." };

        layer.store(field, corrected);
        layer.set_state(field, FieldState::AutoCorrected);

        let note = format!(
            "{} adjusted to {} ({} {} for {})",
            field,
            field.format_value(corrected),
            bound,
            nf_ref::STANDARD,
            layer.family
        );
        layer.notes.insert(field, note.clone());
        layer.errors.insert(field, vec![note]);

        let message = match severity {
            Severity::Success => format!(
                "Correction applied to layer {}: {} {} -> {}",
                layer.order,
                field,
                field.format_value(entered),
                field.format_value(corrected)
            ),
            _ => format!(
                "{} of layer {} ({}, {}) adjusted from {} to {}",
                field,
                layer.order,
                layer.family,
                layer.role,
                field.format_value(entered),
                field.format_value(corrected)
            ),
        };
        let notification = self.emit(layer, field, severity, message);
        self.outcome(layer, field, previous, vec![notification])
    }

    fn keep(&mut self, layer: &mut Layer, field: LayerField, range: NormRange, previous: f64) -> FieldOutcome {
        layer.set_state(field, FieldState::OutOfNormKept);
        layer.notes.remove(&field);

        let expected = if field == LayerField::Poisson {
            format!("expected {}", field.format_value(range.min))
        } else {
            format!("range {}", range.label(field.decimals(), field.unit()))
        };
        let message = format!(
            "{} {} outside {} {} for {} ({})",
            field,
            field.format_value(layer.value(field)),
            nf_ref::STANDARD,
            expected,
            layer.family,
            layer.role
        );
        layer.errors.insert(field, vec![message.clone()]);

        let mut notifications = Vec::new();
        if self.warned.insert((layer.order, field)) {
            let text = format!("Layer {}: {} kept by user", layer.order, message);
            notifications.push(self.emit(layer, field, Severity::Warning, text));
        }
        self.outcome(layer, field, previous, notifications)
    }

    fn cancel(&mut self, layer: &mut Layer, field: LayerField, previous: (f64, FieldState)) -> FieldOutcome {
        let rejected = layer.value(field);
        layer.store(field, previous.0);
        layer.set_state(field, previous.1);

        let message = format!(
            "Layer {}: {} {} discarded, {} restored",
            layer.order,
            field,
            field.format_value(rejected),
            field.format_value(previous.0)
        );
        let notification = self.emit(layer, field, Severity::Info, message);
        self.outcome(layer, field, previous.0, vec![notification])
    }

    fn emit(&mut self, layer: &Layer, field: LayerField, severity: Severity, message: String) -> Notification {
        let notification = Notification { severity, message, order: layer.order, field };
        self.sink.notify(&notification);
        notification
    }

    fn outcome(
        &self,
        layer: &Layer,
        field: LayerField,
        previous: f64,
        notifications: Vec<Notification>,
    ) -> FieldOutcome {
        FieldOutcome {
            field,
            previous,
            value: layer.value(field),
            state: layer.state(field),
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn flexible() -> StructureSnapshot {
        StructureSnapshot::new(StructureType::Flexible, None)
    }

    fn wearing_bb() -> Layer {
        Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BBSG")
            .with_values(0.04, 5000.0, 0.35)
    }

    #[test]
    fn test_in_range_assignment_conforms() {
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb();
        let out = engine.set_thickness(&mut layer, 0.06, &flexible());
        assert_eq!(layer.thickness_m(), 0.06);
        assert_eq!(out.state, FieldState::Conforming);
        assert!(out.notifications.is_empty());
    }

    #[test]
    fn test_same_value_is_noop() {
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb();
        let out = engine.set_modulus(&mut layer, 5000.0);
        assert!(!out.changed());
        assert!(out.notifications.is_empty());
        assert!(!layer.has_correction());
    }

    #[test]
    fn test_expert_keeps_and_warns_once() {
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb();

        let first = engine.set_modulus(&mut layer, 20000.0);
        assert_eq!(layer.modulus_mpa(), 20000.0);
        assert!(layer.is_modulus_out_of_norm());
        assert_eq!(first.notifications.len(), 1);
        assert_eq!(first.notifications[0].severity, Severity::Warning);

        let second = engine.set_modulus(&mut layer, 21000.0);
        assert!(second.notifications.is_empty());
        assert!(layer.is_modulus_out_of_norm());
        assert!(layer.out_of_norm_tooltip(LayerField::Modulus).unwrap().contains("3000-18000 MPa"));

        engine.reset_warnings();
        let third = engine.set_modulus(&mut layer, 22000.0);
        assert_eq!(third.notifications.len(), 1);
    }

    #[test]
    fn test_back_in_range_clears_messages() {
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb();
        engine.set_modulus(&mut layer, 20000.0);
        assert!(layer.has_errors());
        engine.set_modulus(&mut layer, 6000.0);
        assert!(!layer.has_errors());
        assert!(!layer.is_modulus_out_of_norm());
    }

    #[test]
    fn test_automatic_clamps_with_note() {
        let ctx = flexible();
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb();
        engine.set_mode(&mut layer, DimensioningMode::Automatic, &ctx);

        let out = engine.set_modulus(&mut layer, 500.0);
        assert_eq!(layer.modulus_mpa(), 3000.0);
        assert_eq!(out.state, FieldState::AutoCorrected);
        assert!(out.was_corrected());
        assert!(layer.correction_note().contains("3000"));
        assert_eq!(out.notifications[0].severity, Severity::Warning);
        assert!(out.notifications[0].message.contains("500 MPa to 3000 MPa"));
        assert!(!layer.is_modulus_out_of_norm());
    }

    #[test]
    fn test_note_disappears_when_all_fields_conform() {
        let ctx = flexible();
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb().with_mode(DimensioningMode::Automatic);

        engine.set_modulus(&mut layer, 500.0);
        engine.set_thickness(&mut layer, 0.20, &ctx);
        assert_eq!(layer.thickness_m(), 0.08);
        assert!(layer.correction_note().contains("0.080 m"));
        assert!(layer.correction_note().contains("3000"));

        engine.set_thickness(&mut layer, 0.05, &ctx);
        assert!(!layer.correction_note().contains("0.080"));
        assert!(layer.has_correction());

        engine.set_modulus(&mut layer, 4000.0);
        assert!(!layer.has_correction());
        assert_eq!(layer.correction_note(), "");
    }

    #[test]
    fn test_negative_input_becomes_zero() {
        let mut engine = ValidationEngine::new();
        let mut layer = wearing_bb();
        engine.set_poisson(&mut layer, -0.3);
        assert_eq!(layer.poisson(), 0.0);
        assert!(layer.is_poisson_out_of_norm());
    }

    #[test]
    fn test_automatic_poisson_snaps_to_expected() {
        let mut engine = ValidationEngine::new();
        let mut layer = Layer::new(2, LayerRole::Base, MaterialFamily::HydraulicBinder, "GC")
            .with_values(0.20, 23000.0, 0.25)
            .with_mode(DimensioningMode::Automatic);
        engine.set_poisson(&mut layer, 0.30);
        assert_eq!(layer.poisson(), 0.25);
    }

    #[test]
    fn test_library_poisson_always_conforms() {
        let mut engine = ValidationEngine::new();
        let mut layer = Layer::new(2, LayerRole::Base, MaterialFamily::LibraryDefined, "Custom")
            .with_values(0.20, 5000.0, 0.30);
        let out = engine.set_poisson(&mut layer, 0.45);
        assert_eq!(out.state, FieldState::Conforming);
        assert_eq!(layer.poisson(), 0.45);
    }

    #[test]
    fn test_handler_apply() {
        let mut engine = ValidationEngine::new().with_handler(|req: &CorrectionRequest| {
            assert_eq!(req.min, 0.02);
            assert_eq!(req.max, 0.08);
            CorrectionDecision::Apply
        });
        let mut layer = wearing_bb();
        let out = engine.set_thickness(&mut layer, 0.15, &flexible());
        assert_eq!(layer.thickness_m(), 0.08);
        assert_eq!(out.state, FieldState::AutoCorrected);
        assert_eq!(out.notifications[0].severity, Severity::Success);
        assert!(layer.has_correction());
    }

    #[test]
    fn test_handler_keep() {
        let mut engine = ValidationEngine::new().with_handler(|_: &CorrectionRequest| CorrectionDecision::Keep);
        let mut layer = wearing_bb();
        engine.set_thickness(&mut layer, 0.15, &flexible());
        assert_eq!(layer.thickness_m(), 0.15);
        assert!(layer.is_thickness_out_of_norm());
    }

    #[test]
    fn test_handler_cancel_restores_previous() {
        let mut engine = ValidationEngine::new().with_handler(|_: &CorrectionRequest| CorrectionDecision::Cancel);
        let mut layer = wearing_bb();
        let out = engine.set_thickness(&mut layer, 0.15, &flexible());
        assert_eq!(layer.thickness_m(), 0.04);
        assert_eq!(layer.state(LayerField::Thickness), FieldState::Conforming);
        assert_eq!(out.notifications[0].severity, Severity::Info);
    }

    #[test]
    fn test_handler_not_used_for_modulus_or_revalidation() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let mut engine = ValidationEngine::new().with_handler(move |_: &CorrectionRequest| {
            *counter.lock().unwrap() += 1;
            CorrectionDecision::Apply
        });
        let ctx = flexible();
        let mut layer = wearing_bb().with_values(0.20, 5000.0, 0.35);

        engine.set_modulus(&mut layer, 20000.0);
        engine.revalidate(&mut layer, &ctx);
        engine.set_family(&mut layer, MaterialFamily::HydraulicBinder, &ctx);
        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(layer.is_thickness_out_of_norm());
    }

    #[test]
    fn test_platform_role_pins_thickness() {
        let mut engine = ValidationEngine::new();
        let ctx = flexible();
        let mut layer = Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT")
            .with_values(0.25, 120.0, 0.35);

        engine.set_role(&mut layer, LayerRole::Platform, &ctx);
        assert_eq!(layer.thickness_m(), PLATFORM_THICKNESS_M);
        assert!(!layer.is_thickness_out_of_norm());
        assert_eq!(layer.interface_with_below, None);

        let out = engine.set_thickness(&mut layer, 0.30, &ctx);
        assert!(!out.changed());
        assert_eq!(layer.thickness_m(), PLATFORM_THICKNESS_M);

        engine.set_role(&mut layer, LayerRole::Base, &ctx);
        assert_eq!(layer.thickness_m(), 0.10);
        assert_eq!(layer.interface_with_below, Some(InterfaceType::Bonded));
    }

    #[test]
    fn test_mode_switch_keeps_raw_values_until_automatic() {
        let mut engine = ValidationEngine::new();
        let ctx = flexible();
        let mut layer = wearing_bb();
        engine.set_thickness(&mut layer, 0.10, &ctx);
        assert_eq!(layer.thickness_m(), 0.10);
        assert!(layer.is_thickness_out_of_norm());

        let out = engine.set_mode(&mut layer, DimensioningMode::Automatic, &ctx);
        assert_eq!(layer.thickness_m(), 0.08);
        assert!(out.field(LayerField::Thickness).unwrap().was_corrected());
        assert!(!layer.is_thickness_out_of_norm());
    }

    #[test]
    fn test_smallest_foundation_exemption() {
        let mut engine = ValidationEngine::new();
        let exempt = StructureSnapshot::new(StructureType::Flexible, Some(3));
        let mut layer = Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT")
            .with_values(0.30, 600.0, 0.35);

        engine.set_thickness(&mut layer, 0.08, &exempt);
        assert!(!layer.is_thickness_out_of_norm());

        let semi_rigid = StructureSnapshot::new(StructureType::SemiRigid, Some(3));
        engine.revalidate(&mut layer, &semi_rigid);
        assert!(layer.is_thickness_out_of_norm());
    }

    #[test]
    fn test_sink_receives_notifications() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&seen);
        let mut engine = ValidationEngine::new()
            .with_sink(move |n: &Notification| store.lock().unwrap().push(n.severity));
        let mut layer = wearing_bb().with_mode(DimensioningMode::Automatic);
        engine.set_modulus(&mut layer, 100.0);
        assert_eq!(*seen.lock().unwrap(), vec![Severity::Warning]);
    }
}
