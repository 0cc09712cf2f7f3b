//! # Mechanical Response Seam
//!
//! The multilayer elastic computation itself runs in an external engine.
//! This module prepares its input from a [`PavementStructure`], defines the
//! [`ResponseEngine`] trait the engine is plugged in through, and compares
//! the returned strains and stresses with the admissible values.
//!
//! ## Input arrays
//!
//! | Array          | Length | Content                                 |
//! |----------------|--------|-----------------------------------------|
//! | `thicknesses_m`| n      | top to bottom, platform last (sentinel) |
//! | `moduli_mpa`   | n      |                                         |
//! | `poissons`     | n      |                                         |
//! | `interfaces`   | n - 1  | 0 bonded, 1 semi-bonded, 2 unbonded     |
//!
//! ## Verification
//!
//! | Criterion | Compared at  | Response value |
//! |-----------|--------------|----------------|
//! | `EpsiT`   | course bottom| εt (µdef)      |
//! | `SigmaT`  | course bottom| σt (MPa)       |
//! | `EpsiZ`   | course top   | εz (µdef)      |

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::admissible::{AdmissibleValueRow, FatigueCriterion};
use crate::errors::{CalcError, CalcResult};
use crate::norms::InterfaceType;
use crate::structure::PavementStructure;

/// Highest Poisson ratio the elastic model accepts
pub const MAX_POISSON: f64 = 0.5;

// ============================================================================
// Engine input
// ============================================================================

/// Flat description of a structure and its load for the external engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub thicknesses_m: Vec<f64>,
    pub moduli_mpa: Vec<f64>,
    pub poissons: Vec<f64>,
    /// Interface code under each course except the platform
    pub interfaces: Vec<i32>,
    /// 1 single wheel, 2 twin wheels
    pub load_code: i32,
    pub radius_m: f64,
    pub pressure_mpa: f64,
    pub weight_mn: f64,
    pub wheel_spacing_m: f64,
    pub position_x_m: f64,
    pub position_y_m: f64,
    pub ne: f64,
}

impl CalculationInput {
    /// Check the structure and flatten it into engine arrays.
    ///
    /// ```
    /// use chaussee_core::layer::ValidationEngine;
    /// use chaussee_core::response::CalculationInput;
    /// use chaussee_core::structure::PavementStructure;
    ///
    /// let mut engine = ValidationEngine::new();
    /// let structure = PavementStructure::default_flexible(&mut engine);
    /// let input = CalculationInput::from_structure(&structure).unwrap();
    /// assert_eq!(input.layer_count(), 4);
    /// assert_eq!(input.interfaces, vec![0, 0, 0]);
    /// assert_eq!(input.load_code, 2);
    /// ```
    pub fn from_structure(structure: &PavementStructure) -> CalcResult<Self> {
        let layers = structure.layers();
        if layers.len() < 2 {
            return Err(CalcError::invalid_structure(format!(
                "at least 2 courses are required, found {}",
                layers.len()
            )));
        }

        let platforms = layers.iter().filter(|l| l.is_platform()).count();
        if platforms != 1 {
            return Err(CalcError::invalid_structure(format!(
                "exactly one platform is required, found {}",
                platforms
            )));
        }

        for layer in layers {
            if !(layer.modulus_mpa() > 0.0) {
                return Err(CalcError::invalid_input(
                    format!("layer {} modulus", layer.order),
                    layer.modulus_mpa().to_string(),
                    "modulus must be positive",
                ));
            }
            if !(0.0..=MAX_POISSON).contains(&layer.poisson()) {
                return Err(CalcError::invalid_input(
                    format!("layer {} poisson", layer.order),
                    layer.poisson().to_string(),
                    "Poisson ratio must lie in [0, 0.5]",
                ));
            }
        }

        // Platform last, courses keep their top-to-bottom order
        let mut ordered: Vec<_> = layers.iter().filter(|l| !l.is_platform()).collect();
        ordered.extend(layers.iter().filter(|l| l.is_platform()));

        let interfaces = ordered
            .iter()
            .filter(|l| !l.is_platform())
            .map(|l| l.interface_with_below.unwrap_or_default().engine_code())
            .collect();

        let charge = &structure.charge;
        let input = CalculationInput {
            thicknesses_m: ordered.iter().map(|l| l.thickness_m()).collect(),
            moduli_mpa: ordered.iter().map(|l| l.modulus_mpa()).collect(),
            poissons: ordered.iter().map(|l| l.poisson()).collect(),
            interfaces,
            load_code: charge.load_type().engine_code(),
            radius_m: charge.radius_m(),
            pressure_mpa: charge.pressure_mpa(),
            weight_mn: charge.weight_mn(),
            wheel_spacing_m: charge.wheel_spacing_m(),
            position_x_m: charge.position_x_m(),
            position_y_m: charge.position_y_m(),
            ne: structure.ne,
        };
        debug!(layers = input.layer_count(), load = input.load_code, "engine input prepared");
        Ok(input)
    }

    pub fn layer_count(&self) -> usize {
        self.thicknesses_m.len()
    }

    /// Interface conditions decoded from their engine codes
    pub fn interface_types(&self) -> Vec<InterfaceType> {
        self.interfaces
            .iter()
            .map(|code| match code {
                1 => InterfaceType::SemiBonded,
                2 => InterfaceType::Unbonded,
                _ => InterfaceType::Bonded,
            })
            .collect()
    }
}

// ============================================================================
// Engine output
// ============================================================================

/// Strains and stresses at one depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointResponse {
    /// Horizontal tensile stress (MPa)
    pub sigma_t: f64,
    /// Horizontal tensile strain (µdef)
    pub epsilon_t: f64,
    /// Vertical stress (MPa)
    pub sigma_z: f64,
    /// Vertical strain (µdef)
    pub epsilon_z: f64,
}

/// Response at the top and bottom of one course.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerResponse {
    pub order: usize,
    pub top: PointResponse,
    pub bottom: PointResponse,
}

impl LayerResponse {
    pub fn critical_sigma_t(&self) -> f64 {
        self.top.sigma_t.abs().max(self.bottom.sigma_t.abs())
    }

    pub fn critical_epsilon_t(&self) -> f64 {
        self.top.epsilon_t.abs().max(self.bottom.epsilon_t.abs())
    }

    pub fn critical_sigma_z(&self) -> f64 {
        self.top.sigma_z.abs().max(self.bottom.sigma_z.abs())
    }

    pub fn critical_epsilon_z(&self) -> f64 {
        self.top.epsilon_z.abs().max(self.bottom.epsilon_z.abs())
    }
}

/// Everything the external engine returns for one structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseField {
    pub layers: Vec<LayerResponse>,
    /// Surface deflection under the load (mm/100)
    pub surface_deflection: f64,
}

impl ResponseField {
    pub fn layer(&self, order: usize) -> Option<&LayerResponse> {
        self.layers.iter().find(|l| l.order == order)
    }
}

/// External multilayer elastic solver.
///
/// Closures taking a [`CalculationInput`] implement it directly.
pub trait ResponseEngine {
    fn compute(&mut self, input: &CalculationInput) -> CalcResult<ResponseField>;
}

impl<F> ResponseEngine for F
where
    F: FnMut(&CalculationInput) -> CalcResult<ResponseField>,
{
    fn compute(&mut self, input: &CalculationInput) -> CalcResult<ResponseField> {
        self(input)
    }
}

/// Build the input, run the engine and check the returned field.
pub fn run(engine: &mut dyn ResponseEngine, structure: &PavementStructure) -> CalcResult<ResponseField> {
    let input = CalculationInput::from_structure(structure)?;
    let field = engine.compute(&input)?;
    if field.layers.len() != input.layer_count() {
        return Err(CalcError::calculation_failed(
            "mechanical response",
            format!(
                "engine returned {} course results for {} courses",
                field.layers.len(),
                input.layer_count()
            ),
        ));
    }
    Ok(field)
}

// ============================================================================
// Verification
// ============================================================================

/// Computed response against the admissible value of one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub level: usize,
    pub criterion: FatigueCriterion,
    pub computed: f64,
    pub admissible: f64,
    /// |computed| / admissible
    pub ratio: f64,
    pub passes: bool,
}

/// Compare each row with the response of its course.
///
/// Rows must have a positive admissible value; see
/// [`AdmissibleValueRow::compute`].
pub fn verify(rows: &[AdmissibleValueRow], field: &ResponseField) -> CalcResult<Vec<CriterionCheck>> {
    rows.iter()
        .map(|row| {
            let response = field
                .layer(row.level)
                .ok_or(CalcError::LayerNotFound { order: row.level })?;
            if !(row.admissible_value > 0.0) {
                return Err(CalcError::invalid_input(
                    format!("level {} admissible value", row.level),
                    row.admissible_value.to_string(),
                    "admissible value must be computed before verification",
                ));
            }

            let computed = match row.criterion {
                FatigueCriterion::EpsiT => response.bottom.epsilon_t,
                FatigueCriterion::SigmaT => response.bottom.sigma_t,
                FatigueCriterion::EpsiZ => response.top.epsilon_z,
            };
            let ratio = computed.abs() / row.admissible_value;
            let passes = ratio <= 1.0;
            if !passes {
                warn!(
                    level = row.level,
                    criterion = %row.criterion,
                    computed,
                    admissible = row.admissible_value,
                    "admissible value exceeded"
                );
            }
            Ok(CriterionCheck {
                level: row.level,
                criterion: row.criterion,
                computed,
                admissible: row.admissible_value,
                ratio,
                passes,
            })
        })
        .collect()
}
