//! End-to-end behaviour of the compliance engine through the public API.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use chaussee_core::admissible::{AdmissibleValueRow, FatigueCriterion};
use chaussee_core::layer::{
    CorrectionDecision, CorrectionRequest, FieldState, Layer, LayerField, Notification, Severity,
    StructureSnapshot, ValidationEngine,
};
use chaussee_core::materials::{GntCategory, GntParameters, MaterialFamily};
use chaussee_core::norms::{
    modulus_range, DimensioningMode, LayerRole, StructureType, PLATFORM_THICKNESS_M,
};
use chaussee_core::response::{self, CalculationInput, LayerResponse, PointResponse, ResponseField};
use chaussee_core::structure::PavementStructure;
use chaussee_core::CalcResult;

fn flexible() -> StructureSnapshot {
    StructureSnapshot::new(StructureType::Flexible, None)
}

fn automatic(role: LayerRole, family: MaterialFamily) -> Layer {
    Layer::new(1, role, family, "test").with_mode(DimensioningMode::Automatic)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn automatic_bituminous_modulus_is_raised_to_minimum() {
    let mut engine = ValidationEngine::new();
    let mut layer = automatic(LayerRole::Wearing, MaterialFamily::BituminousConcrete);

    let outcome = engine.set_modulus(&mut layer, 500.0);

    assert_eq!(layer.modulus_mpa(), 3000.0);
    assert_eq!(layer.state(LayerField::Modulus), FieldState::AutoCorrected);
    assert!(layer.correction_note().contains("3000"));
    assert_eq!(outcome.notifications.len(), 1);
    assert_eq!(outcome.notifications[0].severity, Severity::Warning);
}

#[test]
fn automatic_granular_foundation_has_no_thickness_cap() {
    let mut engine = ValidationEngine::new();
    let mut layer = automatic(LayerRole::Foundation, MaterialFamily::UnboundGranular);

    let outcome = engine.set_thickness(&mut layer, 0.40, &flexible());

    assert_eq!(layer.thickness_m(), 0.40);
    assert!(!layer.is_thickness_out_of_norm());
    assert!(outcome.notifications.is_empty());
}

#[test]
fn becoming_platform_pins_thickness() {
    let mut engine = ValidationEngine::new();
    let mut layer = Layer::new(3, LayerRole::Foundation, MaterialFamily::UnboundGranular, "GNT")
        .with_values(0.25, 300.0, 0.35);

    engine.set_role(&mut layer, LayerRole::Platform, &flexible());

    assert_eq!(layer.thickness_m(), PLATFORM_THICKNESS_M);
    assert!(!layer.is_thickness_out_of_norm());
    assert_eq!(layer.thickness_display(), "∞");
    assert!(layer.interface_with_below.is_none());
}

#[test]
fn gnt_category_tables() {
    assert_eq!(GntCategory::from_platform_modulus(650.0).unwrap(), GntCategory::CG1);
    let params = GntParameters::for_platform(650.0, true).unwrap();
    assert_eq!((params.k, params.e_max_mpa), (3.0, 360.0));
    assert!(GntCategory::CG2.parameters(true).is_err());
}

#[test]
fn rutting_row_editable_fields() {
    let row = AdmissibleValueRow::new(4, "PF", FatigueCriterion::EpsiZ);
    assert!(row.can_edit_amplitude());
    assert!(!row.can_edit_epsilon6());
    assert!(!row.can_edit_kd());
}

#[test]
fn interactive_handler_through_structure() {
    let requests: Arc<Mutex<Vec<CorrectionRequest>>> = Arc::default();
    let seen = Arc::clone(&requests);
    let mut engine = ValidationEngine::new().with_handler(move |r: &CorrectionRequest| {
        if let Ok(mut list) = seen.lock() {
            list.push(r.clone());
        }
        CorrectionDecision::Apply
    });

    let mut structure = PavementStructure::default_flexible(&mut engine);
    let outcome = structure.set_thickness(&mut engine, 2, 0.50).unwrap();

    assert_eq!(structure.layer(2).unwrap().thickness_m(), 0.35);
    assert_eq!(outcome.notifications[0].severity, Severity::Success);
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!((requests[0].min, requests[0].max), (0.10, 0.35));

    // Modulus never goes through the handler
    drop(requests);
    structure.set_modulus(&mut engine, 2, 5000.0).unwrap();
    assert!(structure.layer(2).unwrap().is_modulus_out_of_norm());
}

#[test]
fn warnings_reach_the_sink_once() {
    let received: Arc<Mutex<Vec<Notification>>> = Arc::default();
    let sink = Arc::clone(&received);
    let mut engine = ValidationEngine::new().with_sink(move |n: &Notification| {
        if let Ok(mut list) = sink.lock() {
            list.push(n.clone());
        }
    });

    let mut structure = PavementStructure::default_flexible(&mut engine);
    let before = received.lock().unwrap().len();
    structure.set_thickness(&mut engine, 1, 0.12).unwrap();
    structure.set_thickness(&mut engine, 1, 0.15).unwrap();

    let list = received.lock().unwrap();
    assert_eq!(list.len() - before, 1);
    assert!(list[before].message.contains("kept by user"));
    assert!(structure.layer(1).unwrap().errors_for(LayerField::Thickness)[0].contains("0.150"));
}

#[test]
fn structure_to_engine_and_back() {
    let mut engine = ValidationEngine::new();
    let mut structure = PavementStructure::default_flexible(&mut engine);
    structure.ne = 1e6;

    let mut bb = AdmissibleValueRow::new(1, "EB-BBSG 0/10", FatigueCriterion::EpsiT);
    bb.epsilon6 = 100.0;
    bb.compute(structure.ne).unwrap();

    let mut solver = |input: &CalculationInput| -> CalcResult<ResponseField> {
        assert_eq!(input.layer_count(), 4);
        Ok(ResponseField {
            layers: (1..=input.layer_count())
                .map(|order| LayerResponse {
                    order,
                    top: PointResponse::default(),
                    bottom: PointResponse { epsilon_t: 80.0, ..Default::default() },
                })
                .collect(),
            surface_deflection: 55.0,
        })
    };
    let field = response::run(&mut solver, &structure).unwrap();
    let checks = response::verify(&[bb], &field).unwrap();
    assert!(checks[0].passes);
    assert!((checks[0].ratio - 0.8).abs() < 1e-12);
}

// ============================================================================
// Properties
// ============================================================================

fn family() -> impl Strategy<Value = MaterialFamily> {
    prop::sample::select(MaterialFamily::ALL.to_vec())
}

fn role() -> impl Strategy<Value = LayerRole> {
    prop::sample::select(LayerRole::ALL.to_vec())
}

fn structure_type() -> impl Strategy<Value = StructureType> {
    prop::sample::select(StructureType::ALL.to_vec())
}

proptest! {
    #[test]
    fn automatic_values_land_in_range(
        role in role(),
        family in family(),
        st in structure_type(),
        thickness in -1.0f64..2.0,
        modulus in -1_000.0f64..200_000.0,
    ) {
        let mut engine = ValidationEngine::new();
        let ctx = StructureSnapshot::new(st, Some(1));
        let mut layer = Layer::new(1, role, family, "p").with_mode(DimensioningMode::Automatic);

        engine.set_thickness(&mut layer, thickness, &ctx);
        engine.set_modulus(&mut layer, modulus);

        let t = layer.thickness_m();
        if role == LayerRole::Platform {
            prop_assert_eq!(t, PLATFORM_THICKNESS_M);
        } else {
            prop_assert!(layer.thickness_range(&ctx).contains(t));
        }
        prop_assert!(modulus_range(family).contains(layer.modulus_mpa()));
        prop_assert!(!layer.is_thickness_out_of_norm());
        prop_assert!(!layer.is_modulus_out_of_norm());
    }

    #[test]
    fn expert_keeps_entered_values(
        role in role(),
        family in family(),
        thickness in 0.0f64..2.0,
        modulus in 0.0f64..100_000.0,
    ) {
        let mut engine = ValidationEngine::new();
        let ctx = flexible();
        let mut layer = Layer::new(1, role, family, "p");

        engine.set_thickness(&mut layer, thickness, &ctx);
        engine.set_modulus(&mut layer, modulus);

        if role != LayerRole::Platform {
            prop_assert_eq!(layer.thickness_m(), thickness);
        }
        prop_assert_eq!(layer.modulus_mpa(), modulus);
        prop_assert_ne!(layer.state(LayerField::Modulus), FieldState::AutoCorrected);
        prop_assert_eq!(layer.is_modulus_out_of_norm(), !modulus_range(family).contains(modulus));
    }

    #[test]
    fn same_value_assignment_is_idempotent(
        family in family(),
        mode in prop::sample::select(vec![DimensioningMode::Expert, DimensioningMode::Automatic]),
        modulus in 0.0f64..100_000.0,
    ) {
        let mut engine = ValidationEngine::new();
        let mut layer = Layer::new(2, LayerRole::Base, family, "p").with_mode(mode);

        engine.set_modulus(&mut layer, modulus);
        let stored = layer.modulus_mpa();
        let state = layer.state(LayerField::Modulus);
        let note = layer.correction_note();

        let again = engine.set_modulus(&mut layer, stored);
        prop_assert!(again.notifications.is_empty());
        prop_assert!(!again.changed());
        prop_assert_eq!(layer.state(LayerField::Modulus), state);
        prop_assert_eq!(layer.correction_note(), note);
    }
}
