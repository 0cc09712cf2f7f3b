//! # Pavement Structure
//!
//! Ordered list of courses, top to bottom, ending with the platform. The
//! structure supplies the context the validation engine needs (structure
//! type, thinnest foundation) and routes every field edit through a
//! [`ValidationEngine`].
//!
//! ## Conventions
//!
//! - Orders run 1..=n from the top; every insertion or removal renumbers
//!   and clears the engine's warn-once set.
//! - New courses are inserted just above the platform.
//! - The thinnest foundation is the `Foundation` layer with the smallest
//!   thickness; ties go to the lowest order.
//!
//! ## Example
//!
//! ```
//! use chaussee_core::layer::ValidationEngine;
//! use chaussee_core::structure::PavementStructure;
//!
//! let mut engine = ValidationEngine::new();
//! let mut structure = PavementStructure::default_flexible(&mut engine);
//! assert_eq!(structure.layers().len(), 4);
//!
//! let order = structure.add_layer(&mut engine).unwrap();
//! assert_eq!(order, 4);
//! assert_eq!(structure.layers().last().unwrap().order, 5);
//!
//! let report = structure.check_composition();
//! assert!(report.errors.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{CalcError, CalcResult};
use crate::layer::{FieldOutcome, Layer, LayerOutcome, StructureSnapshot, ValidationEngine};
use crate::loads::ChargeReference;
use crate::materials::MaterialFamily;
use crate::norms::{nf_ref, DimensioningMode, InterfaceType, LayerRole, StructureType};

/// Default number of equivalent standard axles
pub const DEFAULT_NE: f64 = 80_000.0;

/// Structures at or below this size keep their remaining courses
const MIN_LAYERS_FOR_REMOVAL: usize = 3;

/// A multi-layer pavement resting on its platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PavementStructure {
    layers: Vec<Layer>,
    pub structure_type: StructureType,
    /// Number of equivalent standard axles
    pub ne: f64,
    #[serde(default)]
    pub charge: ChargeReference,
}

impl Default for PavementStructure {
    fn default() -> Self {
        PavementStructure {
            layers: Vec::new(),
            structure_type: StructureType::Flexible,
            ne: DEFAULT_NE,
            charge: ChargeReference::default(),
        }
    }
}

impl PavementStructure {
    /// Build a structure from courses listed top to bottom and validate it.
    pub fn new(structure_type: StructureType, layers: Vec<Layer>, engine: &mut ValidationEngine) -> Self {
        let mut structure = PavementStructure {
            layers,
            structure_type,
            ..Default::default()
        };
        structure.renumber(engine);
        structure.revalidate_all(engine);
        structure
    }

    /// Four-course flexible starter structure
    pub fn default_flexible(engine: &mut ValidationEngine) -> Self {
        let layers = vec![
            Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "EB-BBSG 0/10")
                .with_values(0.04, 5000.0, 0.35),
            Layer::new(2, LayerRole::Base, MaterialFamily::UnboundGranular, "GNT (suppl.)")
                .with_values(0.12, 800.0, 0.35),
            Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT 1")
                .with_values(0.30, 600.0, 0.35),
            Layer::new(4, LayerRole::Platform, MaterialFamily::UnboundGranular, "Plateforme")
                .with_values(0.0, 50.0, 0.35),
        ];
        PavementStructure::new(StructureType::Flexible, layers, engine)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, order: usize) -> CalcResult<&Layer> {
        self.layers
            .iter()
            .find(|l| l.order == order)
            .ok_or(CalcError::LayerNotFound { order })
    }

    pub fn platform(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.is_platform())
    }

    fn index_of(&self, order: usize) -> CalcResult<usize> {
        self.layers
            .iter()
            .position(|l| l.order == order)
            .ok_or(CalcError::LayerNotFound { order })
    }

    fn platform_index(&self) -> CalcResult<usize> {
        self.layers
            .iter()
            .position(|l| l.is_platform())
            .ok_or_else(|| CalcError::invalid_structure("the structure has no platform"))
    }

    /// Order of the thinnest foundation layer
    pub fn smallest_foundation(&self) -> Option<usize> {
        thinnest_foundation(self.layers.iter().map(|l| (l.order, l.role(), l.thickness_m())))
    }

    /// Structure facts handed to the validation engine
    pub fn context(&self) -> StructureSnapshot {
        StructureSnapshot::new(self.structure_type, self.smallest_foundation())
    }

    /// Courses above the platform
    pub fn pavement_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| !l.is_platform())
    }

    /// Total thickness above the platform (m)
    pub fn total_thickness_m(&self) -> f64 {
        self.pavement_layers().map(Layer::thickness_m).sum()
    }

    // ------------------------------------------------------------------
    // Field edits
    // ------------------------------------------------------------------

    /// Edit a thickness.
    ///
    /// The exemption of the thinnest foundation is judged with the new
    /// value. When the edit moves that title to another course, the other
    /// foundation courses are re-validated as well.
    pub fn set_thickness(
        &mut self,
        engine: &mut ValidationEngine,
        order: usize,
        value: f64,
    ) -> CalcResult<FieldOutcome> {
        let idx = self.index_of(order)?;
        let before = self.smallest_foundation();

        let prospective = crate::layer::sanitize(value);
        let smallest = thinnest_foundation(self.layers.iter().map(|l| {
            let t = if l.order == order { prospective } else { l.thickness_m() };
            (l.order, l.role(), t)
        }));
        let ctx = StructureSnapshot::new(self.structure_type, smallest);

        let outcome = engine.set_thickness(&mut self.layers[idx], value, &ctx);

        if self.smallest_foundation() != before {
            self.revalidate_foundations(engine, order);
        }
        Ok(outcome)
    }

    pub fn set_modulus(&mut self, engine: &mut ValidationEngine, order: usize, value: f64) -> CalcResult<FieldOutcome> {
        let idx = self.index_of(order)?;
        Ok(engine.set_modulus(&mut self.layers[idx], value))
    }

    pub fn set_poisson(&mut self, engine: &mut ValidationEngine, order: usize, value: f64) -> CalcResult<FieldOutcome> {
        let idx = self.index_of(order)?;
        Ok(engine.set_poisson(&mut self.layers[idx], value))
    }

    pub fn set_role(
        &mut self,
        engine: &mut ValidationEngine,
        order: usize,
        role: LayerRole,
    ) -> CalcResult<LayerOutcome> {
        let idx = self.index_of(order)?;
        let smallest = thinnest_foundation(self.layers.iter().map(|l| {
            let r = if l.order == order { role } else { l.role() };
            (l.order, r, l.thickness_m())
        }));
        let ctx = StructureSnapshot::new(self.structure_type, smallest);
        let outcome = engine.set_role(&mut self.layers[idx], role, &ctx);
        // leaving the platform resets the thickness, which can move the title
        self.settle_foundations(engine);
        Ok(outcome)
    }

    pub fn set_family(
        &mut self,
        engine: &mut ValidationEngine,
        order: usize,
        family: MaterialFamily,
    ) -> CalcResult<LayerOutcome> {
        let idx = self.index_of(order)?;
        let ctx = self.context();
        Ok(engine.set_family(&mut self.layers[idx], family, &ctx))
    }

    pub fn set_mode(
        &mut self,
        engine: &mut ValidationEngine,
        order: usize,
        mode: DimensioningMode,
    ) -> CalcResult<LayerOutcome> {
        let idx = self.index_of(order)?;
        let ctx = self.context();
        Ok(engine.set_mode(&mut self.layers[idx], mode, &ctx))
    }

    /// Switch every course to the same dimensioning mode
    pub fn set_mode_all(&mut self, engine: &mut ValidationEngine, mode: DimensioningMode) -> Vec<LayerOutcome> {
        let ctx = self.context();
        let outcomes = self
            .layers
            .iter_mut()
            .map(|layer| engine.set_mode(layer, mode, &ctx))
            .collect();
        self.settle_foundations(engine);
        outcomes
    }

    pub fn set_material_name(&mut self, order: usize, name: impl Into<String>) -> CalcResult<()> {
        let idx = self.index_of(order)?;
        self.layers[idx].material_name = name.into();
        Ok(())
    }

    pub fn set_interface(&mut self, order: usize, interface: InterfaceType) -> CalcResult<()> {
        let idx = self.index_of(order)?;
        let layer = &mut self.layers[idx];
        if layer.is_platform() {
            return Err(CalcError::invalid_structure("the platform has no interface below"));
        }
        layer.interface_with_below = Some(interface);
        Ok(())
    }

    /// Change the structure type and re-validate every course
    pub fn set_structure_type(
        &mut self,
        engine: &mut ValidationEngine,
        structure_type: StructureType,
    ) -> Vec<LayerOutcome> {
        if self.structure_type == structure_type {
            return Vec::new();
        }
        info!(from = %self.structure_type, to = %structure_type, "structure type changed");
        self.structure_type = structure_type;
        self.revalidate_all(engine)
    }

    /// Re-validate every course from its stored values
    pub fn revalidate_all(&mut self, engine: &mut ValidationEngine) -> Vec<LayerOutcome> {
        let ctx = self.context();
        let outcomes = self
            .layers
            .iter_mut()
            .map(|layer| engine.revalidate(layer, &ctx))
            .collect();
        self.settle_foundations(engine);
        outcomes
    }

    fn revalidate_foundations(&mut self, engine: &mut ValidationEngine, skip_order: usize) {
        let ctx = self.context();
        for layer in self
            .layers
            .iter_mut()
            .filter(|l| l.role() == LayerRole::Foundation && l.order != skip_order)
        {
            engine.revalidate(layer, &ctx);
        }
    }

    /// Automatic corrections can change which foundation is thinnest
    fn settle_foundations(&mut self, engine: &mut ValidationEngine) {
        let ctx = self.context();
        for layer in self.layers.iter_mut().filter(|l| l.role() == LayerRole::Foundation) {
            engine.revalidate(layer, &ctx);
        }
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Insert a granular base course just above the platform.
    ///
    /// Returns the order of the new course.
    pub fn add_layer(&mut self, engine: &mut ValidationEngine) -> CalcResult<usize> {
        let idx = self.platform_index()?;
        let layer = Layer::new(idx + 1, LayerRole::Base, MaterialFamily::UnboundGranular, "GNT (suppl.)")
            .with_values(0.10, 800.0, 0.35)
            .with_interface(InterfaceType::Bonded);
        self.layers.insert(idx, layer);
        self.renumber(engine);

        let ctx = self.context();
        engine.revalidate(&mut self.layers[idx], &ctx);
        debug!(order = idx + 1, "layer added above platform");
        Ok(idx + 1)
    }

    /// Remove any course but the platform
    pub fn remove_layer(&mut self, engine: &mut ValidationEngine, order: usize) -> CalcResult<Layer> {
        let idx = self.index_of(order)?;
        if self.layers[idx].is_platform() {
            return Err(CalcError::invalid_structure("the platform cannot be removed"));
        }
        let removed = self.layers.remove(idx);
        self.renumber(engine);
        self.revalidate_all(engine);
        debug!(order, material = %removed.material_name, "layer removed");
        Ok(removed)
    }

    /// Remove the course just above the platform.
    ///
    /// Refused when only three courses remain or when that course is a
    /// foundation.
    pub fn remove_top_layer(&mut self, engine: &mut ValidationEngine) -> CalcResult<Layer> {
        if self.layers.len() <= MIN_LAYERS_FOR_REMOVAL {
            return Err(CalcError::invalid_structure(format!(
                "a structure keeps at least {} courses",
                MIN_LAYERS_FOR_REMOVAL
            )));
        }
        let idx = self.platform_index()?;
        if idx == 0 {
            return Err(CalcError::invalid_structure("no course above the platform"));
        }
        if self.layers[idx - 1].role() == LayerRole::Foundation {
            return Err(CalcError::invalid_structure(
                "the course above the platform is a foundation and is kept",
            ));
        }
        let order = self.layers[idx - 1].order;
        self.remove_layer(engine, order)
    }

    /// Reassign orders 1..=n and forget previous warnings
    pub fn renumber(&mut self, engine: &mut ValidationEngine) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.order = i + 1;
        }
        engine.reset_warnings();
    }

    // ------------------------------------------------------------------
    // Normative checks
    // ------------------------------------------------------------------

    /// Set every interface to the condition of NF P98-086 §8.5.1.3.
    ///
    /// Returns one message per adjusted interface.
    pub fn normalize_interfaces(&mut self) -> Vec<String> {
        let mut messages = Vec::new();

        for i in 0..self.layers.len() {
            if self.layers[i].is_platform() {
                self.layers[i].interface_with_below = None;
                continue;
            }
            let Some(lower) = self.layers.get(i + 1) else {
                continue;
            };
            let expected = expected_interface(&self.layers[i], lower);
            let lower_role = lower.role();

            let upper = &mut self.layers[i];
            if upper.interface_with_below != Some(expected) {
                messages.push(format!(
                    "Interface {}/{} set to '{}' ({})",
                    upper.role(),
                    lower_role,
                    expected,
                    nf_ref::INTERFACES
                ));
                upper.interface_with_below = Some(expected);
            }
        }
        messages
    }

    /// Check the composition rules of the structure type.
    pub fn check_composition(&self) -> CompositionReport {
        let mut report = CompositionReport {
            structure_type: self.structure_type,
            ..Default::default()
        };

        let platforms = self.layers.iter().filter(|l| l.is_platform()).count();
        if platforms != 1 {
            report
                .errors
                .push(format!("The structure needs exactly one platform (found {})", platforms));
        } else if !self.layers.last().is_some_and(Layer::is_platform) {
            report.errors.push("The platform must be the lowest course".to_string());
        }

        let courses: Vec<&Layer> = self.pavement_layers().collect();
        match self.structure_type {
            StructureType::Flexible => check_flexible(&courses, &mut report),
            StructureType::SemiRigid => check_semi_rigid(&courses, &mut report),
            StructureType::ThickBituminous => check_thick_bituminous(&courses, &mut report),
            StructureType::Rigid => check_rigid(&courses, &mut report),
            StructureType::Composite | StructureType::Inverted | StructureType::Other => {}
        }

        if !courses.is_empty() {
            let n = courses.len() as f64;
            report.mean_ks = courses.iter().map(|l| l.ks()).sum::<f64>() / n;
            report.mean_kd = courses.iter().map(|l| l.kd()).sum::<f64>() / n;
        }
        report
    }
}

/// Outcome of the composition rules of a structure type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositionReport {
    pub structure_type: StructureType,
    /// Violations of the standard
    pub errors: Vec<String>,
    /// Recommendations not met
    pub warnings: Vec<String>,
    /// Mean ks of the courses above the platform
    pub mean_ks: f64,
    /// Mean kd of the courses above the platform
    pub mean_kd: f64,
}

impl CompositionReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Order of the thinnest foundation among `(order, role, thickness)` rows
fn thinnest_foundation(layers: impl Iterator<Item = (usize, LayerRole, f64)>) -> Option<usize> {
    layers
        .filter(|(_, role, _)| *role == LayerRole::Foundation)
        .fold(None, |best: Option<(usize, f64)>, (o, _, t)| match best {
            Some((order, bt)) if bt < t || (bt == t && order < o) => Some((order, bt)),
            _ => Some((o, t)),
        })
        .map(|(order, _)| order)
}

fn expected_interface(upper: &Layer, lower: &Layer) -> InterfaceType {
    if lower.is_platform() {
        return InterfaceType::Bonded;
    }
    if upper.role() == LayerRole::Base && upper.family() == MaterialFamily::HydraulicBinder {
        return InterfaceType::SemiBonded;
    }
    if upper.role() == LayerRole::Wearing && lower.role() == LayerRole::Base {
        return if lower.family() == MaterialFamily::HydraulicBinder {
            InterfaceType::SemiBonded
        } else {
            InterfaceType::Bonded
        };
    }
    InterfaceType::Bonded
}

fn total_of(courses: &[&Layer], family: MaterialFamily) -> f64 {
    courses
        .iter()
        .filter(|l| l.family() == family)
        .map(|l| l.thickness_m())
        .sum()
}

fn first_with_role<'a>(courses: &[&'a Layer], role: LayerRole) -> Option<&'a Layer> {
    courses.iter().copied().find(|l| l.role() == role)
}

fn check_flexible(courses: &[&Layer], report: &mut CompositionReport) {
    let total_bb = total_of(courses, MaterialFamily::BituminousConcrete);
    let total_gnt = total_of(courses, MaterialFamily::UnboundGranular);

    if total_bb > 0.12 {
        report.errors.push(format!(
            "Flexible structure: bituminous total {:.3} m exceeds 0.12 m ({})",
            total_bb,
            nf_ref::FLEXIBLE
        ));
    }
    if total_gnt < 0.15 {
        report.errors.push(format!(
            "Flexible structure: granular total {:.3} m below 0.15 m ({})",
            total_gnt,
            nf_ref::FLEXIBLE
        ));
    }
    let bound_course = courses.iter().any(|l| {
        l.role().is_structural_course()
            && matches!(l.family(), MaterialFamily::HydraulicBinder | MaterialFamily::CementConcrete)
    });
    if bound_course {
        report.errors.push(format!(
            "Flexible structure: hydraulic binder or cement concrete not allowed in base/foundation ({})",
            nf_ref::FLEXIBLE
        ));
    }
}

fn check_semi_rigid(courses: &[&Layer], report: &mut CompositionReport) {
    let wearing = first_with_role(courses, LayerRole::Wearing);
    if wearing.map(Layer::family) != Some(MaterialFamily::BituminousConcrete) {
        report.errors.push(format!(
            "Semi-rigid structure: wearing course must be bituminous concrete ({})",
            nf_ref::SEMI_RIGID
        ));
    }
    if let Some(w) = wearing.filter(|w| w.thickness_m() < 0.06) {
        report.errors.push(format!(
            "Semi-rigid structure: wearing course {:.3} m below the 0.06 m minimum",
            w.thickness_m()
        ));
    }
    let all_mtlh = courses
        .iter()
        .filter(|l| l.role().is_structural_course())
        .all(|l| l.family() == MaterialFamily::HydraulicBinder);
    if !all_mtlh {
        report.errors.push(format!(
            "Semi-rigid structure: base and foundation must be hydraulic binder ({})",
            nf_ref::SEMI_RIGID
        ));
    }
    let foundation: f64 = courses
        .iter()
        .filter(|l| l.role() == LayerRole::Foundation)
        .map(|l| l.thickness_m())
        .sum();
    if foundation < 0.15 {
        report.warnings.push(format!(
            "Semi-rigid structure: foundation {:.3} m below the recommended 0.15 m",
            foundation
        ));
    }
}

fn check_thick_bituminous(courses: &[&Layer], report: &mut CompositionReport) {
    let bb = Some(MaterialFamily::BituminousConcrete);
    if first_with_role(courses, LayerRole::Wearing).map(Layer::family) != bb {
        report.errors.push(format!(
            "Thick bituminous structure: wearing course must be bituminous concrete ({})",
            nf_ref::THICK_BITUMINOUS
        ));
    }
    if first_with_role(courses, LayerRole::Base).map(Layer::family) != bb {
        report.errors.push(format!(
            "Thick bituminous structure: base course must be bituminous concrete ({})",
            nf_ref::THICK_BITUMINOUS
        ));
    }

    let total: f64 = courses.iter().map(|l| l.thickness_m()).sum();
    let ratio = if total > 0.0 {
        total_of(courses, MaterialFamily::BituminousConcrete) / total
    } else {
        0.0
    };
    if !(0.45..=0.60).contains(&ratio) {
        report.warnings.push(format!(
            "Thick bituminous structure: bituminous/total ratio {:.2} outside the recommended 0.45-0.60",
            ratio
        ));
    }
}

fn check_rigid(courses: &[&Layer], report: &mut CompositionReport) {
    let thickest = courses
        .iter()
        .filter(|l| l.family() == MaterialFamily::CementConcrete)
        .map(|l| l.thickness_m())
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))));

    match thickest {
        None => report.errors.push(format!(
            "Rigid structure: at least one cement concrete course is required ({})",
            nf_ref::RIGID
        )),
        Some(t) if t < 0.12 => report.errors.push(format!(
            "Rigid structure: cement concrete course of at least 0.12 m required (thickest {:.3} m)",
            t
        )),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{FieldState, LayerField, Severity};
    use crate::norms::PLATFORM_THICKNESS_M;

    fn engine() -> ValidationEngine {
        ValidationEngine::new()
    }

    #[test]
    fn test_default_flexible_structure() {
        let mut e = engine();
        let s = PavementStructure::default_flexible(&mut e);
        let orders: Vec<usize> = s.layers().iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
        assert_eq!(s.ne, 80_000.0);
        assert_eq!(s.platform().unwrap().thickness_m(), PLATFORM_THICKNESS_M);
        assert_eq!(s.smallest_foundation(), Some(3));
        assert!(s.pavement_layers().all(|l| !l.has_errors()));
        // 50 MPa lies below the granular modulus range and is kept as entered
        assert!(s.platform().unwrap().is_modulus_out_of_norm());
        assert!((s.total_thickness_m() - 0.46).abs() < 1e-9);
    }

    #[test]
    fn test_smallest_foundation_tie_goes_to_lowest_order() {
        let mut e = engine();
        let layers = vec![
            Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB").with_values(0.06, 5000.0, 0.35),
            Layer::new(2, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT A").with_values(0.20, 400.0, 0.35),
            Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT B").with_values(0.20, 300.0, 0.35),
            Layer::new(4, LayerRole::Platform, MaterialFamily::UnboundGranular, "PF").with_values(0.0, 50.0, 0.35),
        ];
        let s = PavementStructure::new(StructureType::Flexible, layers, &mut e);
        assert_eq!(s.smallest_foundation(), Some(2));
    }

    #[test]
    fn test_thickness_edit_uses_new_smallest_foundation() {
        let mut e = engine();
        let layers = vec![
            Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB").with_values(0.06, 5000.0, 0.35),
            Layer::new(2, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT A").with_values(0.30, 400.0, 0.35),
            Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT B").with_values(0.20, 300.0, 0.35),
            Layer::new(4, LayerRole::Platform, MaterialFamily::UnboundGranular, "PF").with_values(0.0, 50.0, 0.35),
        ];
        let mut s = PavementStructure::new(StructureType::Flexible, layers, &mut e);

        // Layer 2 becomes the thinnest and is exempt from the 0.15 m minimum
        s.set_thickness(&mut e, 2, 0.10).unwrap();
        assert!(!s.layer(2).unwrap().is_out_of_norm(LayerField::Thickness));
        assert_eq!(s.smallest_foundation(), Some(2));
    }

    #[test]
    fn test_role_change_to_thinnest_foundation_is_exempt() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);

        // 0.12 m is below the 0.15 m foundation minimum but thinner than GNT 1
        let outcome = s.set_role(&mut e, 2, LayerRole::Foundation).unwrap();
        assert_eq!(s.smallest_foundation(), Some(2));
        let layer = s.layer(2).unwrap();
        assert_eq!(layer.thickness_m(), 0.12);
        assert_eq!(layer.state(LayerField::Thickness), FieldState::Conforming);
        assert!(!layer.is_out_of_norm(LayerField::Thickness));
        assert!(outcome
            .fields
            .iter()
            .flat_map(|f| f.notifications.iter())
            .all(|n| n.severity != Severity::Warning));

        // GNT 1 loses the title and is judged against the full range again
        assert!(!s.layer(3).unwrap().is_out_of_norm(LayerField::Thickness));
    }

    #[test]
    fn test_unknown_order() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);
        let err = s.set_modulus(&mut e, 9, 100.0).unwrap_err();
        assert_eq!(err, CalcError::LayerNotFound { order: 9 });
    }

    #[test]
    fn test_add_and_remove_layers() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);

        let added = s.add_layer(&mut e).unwrap();
        assert_eq!(added, 4);
        let new_layer = s.layer(4).unwrap();
        assert_eq!(new_layer.role(), LayerRole::Base);
        assert_eq!(new_layer.thickness_m(), 0.10);
        assert_eq!(new_layer.modulus_mpa(), 800.0);
        assert!(s.layer(5).unwrap().is_platform());

        assert!(s.remove_layer(&mut e, 5).is_err());
        let removed = s.remove_top_layer(&mut e).unwrap();
        assert_eq!(removed.material_name, "GNT (suppl.)");
        assert_eq!(s.layers().len(), 4);
    }

    #[test]
    fn test_remove_top_layer_keeps_foundation() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);
        let err = s.remove_top_layer(&mut e).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STRUCTURE");

        s.remove_layer(&mut e, 2).unwrap();
        assert_eq!(s.layers().len(), 3);
        assert!(s.remove_top_layer(&mut e).is_err());
    }

    #[test]
    fn test_renumber_resets_warnings() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);
        let first = s.set_modulus(&mut e, 2, 2000.0).unwrap();
        assert_eq!(first.notifications.len(), 1);

        s.add_layer(&mut e).unwrap();
        let again = s.set_modulus(&mut e, 2, 2500.0).unwrap();
        assert_eq!(again.notifications.len(), 1);
    }

    #[test]
    fn test_structure_type_change_revalidates() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);
        s.set_structure_type(&mut e, StructureType::ThickBituminous);
        // 0.04 m is below the 0.12 m wearing minimum of thick bituminous structures
        assert!(s.layer(1).unwrap().is_thickness_out_of_norm());

        s.set_structure_type(&mut e, StructureType::Flexible);
        assert!(!s.layer(1).unwrap().is_thickness_out_of_norm());
    }

    #[test]
    fn test_mode_all_automatic() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);
        s.set_thickness(&mut e, 2, 0.50).unwrap();
        assert_eq!(s.layer(2).unwrap().thickness_m(), 0.50);

        s.set_mode_all(&mut e, DimensioningMode::Automatic);
        assert_eq!(s.layer(2).unwrap().thickness_m(), 0.35);
        assert!(s.layer(2).unwrap().has_correction());
    }

    #[test]
    fn test_normalize_interfaces() {
        let mut e = engine();
        let layers = vec![
            Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB")
                .with_values(0.08, 5000.0, 0.35)
                .with_interface(InterfaceType::Unbonded),
            Layer::new(2, LayerRole::Base, MaterialFamily::HydraulicBinder, "GC")
                .with_values(0.20, 23000.0, 0.25),
            Layer::new(3, LayerRole::Foundation, MaterialFamily::HydraulicBinder, "GC")
                .with_values(0.20, 23000.0, 0.25)
                .with_interface(InterfaceType::SemiBonded),
            Layer::new(4, LayerRole::Platform, MaterialFamily::UnboundGranular, "PF").with_values(0.0, 50.0, 0.35),
        ];
        let mut s = PavementStructure::new(StructureType::SemiRigid, layers, &mut e);
        let messages = s.normalize_interfaces();

        let interfaces: Vec<_> = s.layers().iter().map(|l| l.interface_with_below).collect();
        assert_eq!(
            interfaces,
            vec![
                Some(InterfaceType::SemiBonded),
                Some(InterfaceType::SemiBonded),
                Some(InterfaceType::Bonded),
                None
            ]
        );
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("§8.5.1.3"));
        assert!(s.normalize_interfaces().is_empty());
    }

    #[test]
    fn test_flexible_composition_errors() {
        let mut e = engine();
        let mut s = PavementStructure::default_flexible(&mut e);
        s.set_family(&mut e, 2, MaterialFamily::HydraulicBinder).unwrap();
        let report = s.check_composition();
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|m| m.contains("hydraulic binder")));
    }

    #[test]
    fn test_default_flexible_composition_and_means() {
        let mut e = engine();
        let s = PavementStructure::default_flexible(&mut e);
        let report = s.check_composition();
        assert!(report.is_valid());
        assert!((report.mean_ks - 1.0).abs() < 1e-12);
        // kd: BB 0.04 -> 1.2, GNT 0.12 -> 2.2, GNT 0.30 -> 1.8
        assert!((report.mean_kd - (1.2 + 2.2 + 1.8) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rigid_requires_thick_cement_course() {
        let mut e = engine();
        let layers = vec![
            Layer::new(1, LayerRole::Wearing, MaterialFamily::CementConcrete, "BC").with_values(0.08, 35000.0, 0.25),
            Layer::new(2, LayerRole::Platform, MaterialFamily::UnboundGranular, "PF").with_values(0.0, 50.0, 0.35),
        ];
        let s = PavementStructure::new(StructureType::Rigid, layers, &mut e);
        let report = s.check_composition();
        assert!(report.errors.iter().any(|m| m.contains("0.12 m")));
    }

    #[test]
    fn test_thick_bituminous_ratio_warning() {
        let mut e = engine();
        let layers = vec![
            Layer::new(1, LayerRole::Wearing, MaterialFamily::BituminousConcrete, "BB").with_values(0.12, 5400.0, 0.35),
            Layer::new(2, LayerRole::Base, MaterialFamily::BituminousConcrete, "GB3").with_values(0.10, 9300.0, 0.35),
            Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT").with_values(0.35, 400.0, 0.35),
            Layer::new(4, LayerRole::Platform, MaterialFamily::UnboundGranular, "PF").with_values(0.0, 50.0, 0.35),
        ];
        let s = PavementStructure::new(StructureType::ThickBituminous, layers, &mut e);
        let report = s.check_composition();
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("0.39"));
    }
}
