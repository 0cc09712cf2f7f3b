//! # Admissible Values
//!
//! One [`AdmissibleValueRow`] per course and level holds the fatigue
//! parameters of that course and, once computed, its admissible value.
//! The active [`FatigueCriterion`] decides which parameters the user may
//! edit; the editable set is derived, never stored.
//!
//! | Criterion | Reference | Editable coefficients     |
//! |-----------|-----------|---------------------------|
//! | `EpsiT`   | ε6        | Sn, Sh, Kc, Kr, Ks, Kθ    |
//! | `SigmaT`  | σ6        | Sn, Sh, Kc, Kr, Ks, Kd    |
//! | `EpsiZ`   | A         | (none)                    |
//!
//! ## Submodules
//!
//! - [`traffic`] - Cumulative heavy traffic over the service life
//! - [`fatigue`] - Admissible strain / stress from the fatigue laws
//!
//! ## Example
//!
//! ```
//! use chaussee_core::admissible::{AdmissibleValueRow, FatigueCriterion};
//!
//! let mut row = AdmissibleValueRow::new(3, "GNT", FatigueCriterion::EpsiZ);
//! assert!(row.can_edit_amplitude());
//! assert!(!row.can_edit_epsilon6());
//! assert!(!row.can_edit_kd());
//! assert_eq!(row.reference_label(), "A");
//!
//! row.set_ktheta_auto(true);
//! row.set_e10c_10hz(7200.0);
//! row.set_eteq_10hz(1800.0);
//! assert_eq!(row.ktheta(), 2.0);
//! ```

pub mod fatigue;
pub mod traffic;

pub use fatigue::{risk_coefficient, standard_normal_fractile};
pub use traffic::{GrowthLaw, TrafficInput};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::layer::Layer;
use crate::materials::MaterialFamily;
use crate::text::normalize_key;

/// Fatigue failure mode checked for a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FatigueCriterion {
    /// Horizontal tensile strain at the bottom of bituminous courses
    #[default]
    EpsiT,
    /// Horizontal tensile stress at the bottom of bound courses
    SigmaT,
    /// Vertical strain at the top of unbound courses and platform
    EpsiZ,
}

impl FatigueCriterion {
    pub const ALL: [FatigueCriterion; 3] = [
        FatigueCriterion::EpsiT,
        FatigueCriterion::SigmaT,
        FatigueCriterion::EpsiZ,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            FatigueCriterion::EpsiT => "EpsiT",
            FatigueCriterion::SigmaT => "SigmaT",
            FatigueCriterion::EpsiZ => "EpsiZ",
        }
    }

    /// Unit of the admissible value
    pub fn unit(&self) -> &'static str {
        match self {
            FatigueCriterion::EpsiT | FatigueCriterion::EpsiZ => "µdef",
            FatigueCriterion::SigmaT => "MPa",
        }
    }

    /// Criterion usually checked for a material family
    pub fn for_family(family: MaterialFamily) -> Self {
        match family {
            MaterialFamily::BituminousConcrete | MaterialFamily::LibraryDefined => FatigueCriterion::EpsiT,
            MaterialFamily::HydraulicBinder | MaterialFamily::CementConcrete => FatigueCriterion::SigmaT,
            MaterialFamily::UnboundGranular => FatigueCriterion::EpsiZ,
        }
    }
}

impl std::str::FromStr for FatigueCriterion {
    type Err = CalcError;

    /// Case-insensitive: "epsit", "SIGMAT" and "EpsiZ" are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        FatigueCriterion::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(key))
            .ok_or_else(|| CalcError::invalid_input("criterion", s, "expected EpsiT, SigmaT or EpsiZ"))
    }
}

impl std::fmt::Display for FatigueCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatigue parameters and admissible value of one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissibleValueRow {
    pub level: usize,
    pub material: String,
    pub criterion: FatigueCriterion,
    /// Risk of failure over the service life (%)
    pub risk_pct: f64,
    /// Number of equivalent load cycles
    pub ne: f64,
    /// Strain at 10⁶ cycles (µdef)
    pub epsilon6: f64,
    /// Stress at 10⁶ cycles (MPa)
    pub sigma6: f64,
    /// Rutting law amplitude A (µdef)
    pub amplitude: f64,
    /// Set once the user typed the amplitude
    #[serde(default)]
    pub amplitude_user_defined: bool,
    /// Standard deviation of the log of fatigue life
    pub sn: f64,
    /// Standard deviation of the layer thickness (cm)
    pub sh: f64,
    /// Slope of the fatigue law
    pub b: f64,
    pub kc: f64,
    pub kr: f64,
    pub ks: f64,
    ktheta: f64,
    pub kd: f64,
    /// Last computed admissible value
    pub admissible_value: f64,
    /// Mean aggressiveness coefficient
    pub cam: f64,
    e10c_10hz: f64,
    eteq_10hz: f64,
    ktheta_auto: bool,
    /// Order of the layer this row was synchronised from
    #[serde(default)]
    pub source_order: Option<usize>,
}

impl Default for AdmissibleValueRow {
    fn default() -> Self {
        AdmissibleValueRow {
            level: 0,
            material: String::new(),
            criterion: FatigueCriterion::EpsiT,
            risk_pct: 10.0,
            ne: 0.0,
            epsilon6: 0.0,
            sigma6: 1.0,
            amplitude: 100.0,
            amplitude_user_defined: false,
            sn: 0.25,
            sh: 2.5,
            b: -0.20,
            kc: 1.0,
            kr: 1.0,
            ks: 1.0,
            ktheta: 1.0,
            kd: 1.0,
            admissible_value: 0.0,
            cam: 0.0,
            e10c_10hz: 0.0,
            eteq_10hz: 0.0,
            ktheta_auto: false,
            source_order: None,
        }
    }
}

impl AdmissibleValueRow {
    pub fn new(level: usize, material: impl Into<String>, criterion: FatigueCriterion) -> Self {
        AdmissibleValueRow {
            level,
            material: material.into(),
            criterion,
            ..Default::default()
        }
    }

    /// Row for a course, with the criterion matching its family
    pub fn for_layer(layer: &Layer) -> Self {
        let mut row = AdmissibleValueRow::new(
            layer.order,
            layer.material_name.clone(),
            FatigueCriterion::for_family(layer.family()),
        );
        row.sync_from_layer(layer);
        row
    }

    // ------------------------------------------------------------------
    // Editable matrix
    // ------------------------------------------------------------------

    pub fn can_edit_epsilon6(&self) -> bool {
        self.criterion == FatigueCriterion::EpsiT
    }

    pub fn can_edit_amplitude(&self) -> bool {
        self.criterion == FatigueCriterion::EpsiZ
    }

    pub fn can_edit_kc(&self) -> bool {
        matches!(self.criterion, FatigueCriterion::EpsiT | FatigueCriterion::SigmaT)
    }

    pub fn can_edit_kr(&self) -> bool {
        self.can_edit_kc()
    }

    pub fn can_edit_ks(&self) -> bool {
        self.can_edit_kc()
    }

    pub fn can_edit_sn(&self) -> bool {
        self.can_edit_kr()
    }

    pub fn can_edit_sh(&self) -> bool {
        self.can_edit_kr()
    }

    pub fn can_edit_ktheta(&self) -> bool {
        self.criterion == FatigueCriterion::EpsiT
    }

    pub fn can_edit_kd(&self) -> bool {
        self.criterion == FatigueCriterion::SigmaT
    }

    /// Header of the reference-value column
    pub fn reference_label(&self) -> &'static str {
        match self.criterion {
            FatigueCriterion::EpsiZ => "A",
            FatigueCriterion::SigmaT => "σ6",
            FatigueCriterion::EpsiT => "ε6",
        }
    }

    /// Reference value matching the active criterion
    pub fn reference_value(&self) -> f64 {
        match self.criterion {
            FatigueCriterion::EpsiT => self.epsilon6,
            FatigueCriterion::SigmaT => self.sigma6,
            FatigueCriterion::EpsiZ => self.amplitude,
        }
    }

    pub fn set_amplitude(&mut self, value: f64) {
        self.amplitude = value;
        self.amplitude_user_defined = true;
    }

    // ------------------------------------------------------------------
    // Ktheta
    // ------------------------------------------------------------------

    /// Effective Kθ: derived from the two moduli when auto-derivation is on
    /// and both are positive, the stored value otherwise.
    pub fn ktheta(&self) -> f64 {
        self.derived_ktheta().unwrap_or(self.ktheta)
    }

    pub fn set_ktheta(&mut self, value: f64) {
        self.ktheta = value;
    }

    pub fn ktheta_auto(&self) -> bool {
        self.ktheta_auto
    }

    /// Toggle auto-derivation; switching off keeps the last derived value.
    pub fn set_ktheta_auto(&mut self, enabled: bool) {
        self.ktheta_auto = enabled;
        self.refresh_ktheta();
    }

    pub fn e10c_10hz(&self) -> f64 {
        self.e10c_10hz
    }

    pub fn eteq_10hz(&self) -> f64 {
        self.eteq_10hz
    }

    /// Modulus at 10 °C and 10 Hz (MPa)
    pub fn set_e10c_10hz(&mut self, value: f64) {
        self.e10c_10hz = value;
        self.refresh_ktheta();
    }

    /// Modulus at the equivalent temperature and 10 Hz (MPa)
    pub fn set_eteq_10hz(&mut self, value: f64) {
        self.eteq_10hz = value;
        self.refresh_ktheta();
    }

    fn derived_ktheta(&self) -> Option<f64> {
        (self.ktheta_auto && self.e10c_10hz > 0.0 && self.eteq_10hz > 0.0)
            .then(|| (self.e10c_10hz / self.eteq_10hz).sqrt())
    }

    fn refresh_ktheta(&mut self) {
        if let Some(value) = self.derived_ktheta() {
            self.ktheta = value;
        }
    }

    // ------------------------------------------------------------------
    // Layer synchronisation
    // ------------------------------------------------------------------

    /// Copy material name and coefficients from the source course
    pub fn sync_from_layer(&mut self, layer: &Layer) {
        self.material = layer.material_name.clone();
        self.ks = layer.ks();
        self.kd = layer.kd();
        self.source_order = Some(layer.order);
    }

    /// Whether this row describes `layer`: same level and same material key
    pub fn matches_layer(&self, layer: &Layer) -> bool {
        self.level == layer.order && normalize_key(&self.material) == normalize_key(&layer.material_name)
    }
}

/// Bind every row to its source course and synchronise it.
///
/// A row binds to the course at its level whose material name matches
/// (ignoring case, accents, spacing and decimal separator); when no name
/// matches, the course at the same level is used. Rows without a course
/// at their level are left unbound. Returns the number of bound rows.
pub fn link_rows(rows: &mut [AdmissibleValueRow], layers: &[Layer]) -> usize {
    let mut linked = 0;
    for row in rows.iter_mut() {
        let source = layers
            .iter()
            .find(|layer| row.matches_layer(layer))
            .or_else(|| layers.iter().find(|layer| layer.order == row.level));

        match source {
            Some(layer) => {
                if normalize_key(&row.material) != normalize_key(&layer.material_name) {
                    debug!(level = row.level, from = %row.material, to = %layer.material_name, "material renamed");
                }
                row.sync_from_layer(layer);
                linked += 1;
            }
            None => row.source_order = None,
        }
    }
    linked
}

/// One row per course, the platform included
pub fn rows_for_layers(layers: &[Layer]) -> Vec<AdmissibleValueRow> {
    layers.iter().map(AdmissibleValueRow::for_layer).collect()
}

/// Compute the admissible value of every row with the same cycle count
pub fn compute_all(rows: &mut [AdmissibleValueRow], ne: f64) -> CalcResult<()> {
    for row in rows.iter_mut() {
        row.compute(ne)?;
    }
    Ok(())
}
