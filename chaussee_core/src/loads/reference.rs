//! Reference load geometry and its normative defaults.

use serde::{Deserialize, Serialize};

/// Default contact radius (m)
pub const DEFAULT_RADIUS_M: f64 = 0.125;
/// Default contact pressure (MPa)
pub const DEFAULT_PRESSURE_MPA: f64 = 0.662;
/// Default wheel load (MN), half of a 13 t axle side
pub const DEFAULT_WEIGHT_MN: f64 = 0.0325;
/// Default center-to-center spacing of twin wheels (m)
pub const DEFAULT_TWIN_SPACING_M: f64 = 0.375;

/// Reference load configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReferenceLoadType {
    /// Jumelage français (13 t axle)
    #[default]
    FrenchTwin,
    /// Any other twin-wheel geometry
    OtherTwin,
    /// Roue isolée
    SingleWheel,
}

impl ReferenceLoadType {
    pub const ALL: [ReferenceLoadType; 3] = [
        ReferenceLoadType::FrenchTwin,
        ReferenceLoadType::OtherTwin,
        ReferenceLoadType::SingleWheel,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceLoadType::FrenchTwin => "French twin wheel",
            ReferenceLoadType::OtherTwin => "Other twin wheel",
            ReferenceLoadType::SingleWheel => "Single wheel",
        }
    }

    pub fn is_twin(&self) -> bool {
        !matches!(self, ReferenceLoadType::SingleWheel)
    }

    /// Load code expected by the external mechanical engine
    pub fn engine_code(&self) -> i32 {
        if self.is_twin() {
            2
        } else {
            1
        }
    }
}

impl std::fmt::Display for ReferenceLoadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Reference wheel-load geometry.
///
/// Changing the load type resets every geometric field to the defaults of
/// the new type; geometric setters never store negative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeReference {
    load_type: ReferenceLoadType,
    radius_m: f64,
    pressure_mpa: f64,
    weight_mn: f64,
    wheel_spacing_m: f64,
    position_x_m: f64,
    position_y_m: f64,
}

impl Default for ChargeReference {
    fn default() -> Self {
        ChargeReference::for_type(ReferenceLoadType::FrenchTwin)
    }
}

impl ChargeReference {
    /// Normative geometry for a load type
    pub fn for_type(load_type: ReferenceLoadType) -> Self {
        ChargeReference {
            load_type,
            radius_m: DEFAULT_RADIUS_M,
            pressure_mpa: DEFAULT_PRESSURE_MPA,
            weight_mn: DEFAULT_WEIGHT_MN,
            wheel_spacing_m: if load_type.is_twin() { DEFAULT_TWIN_SPACING_M } else { 0.0 },
            position_x_m: 0.0,
            position_y_m: 0.0,
        }
    }

    pub fn load_type(&self) -> ReferenceLoadType {
        self.load_type
    }

    /// Change the load type; a different type resets the geometry.
    ///
    /// Returns whether anything changed.
    pub fn set_load_type(&mut self, load_type: ReferenceLoadType) -> bool {
        if self.load_type == load_type {
            return false;
        }
        *self = ChargeReference::for_type(load_type);
        true
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn pressure_mpa(&self) -> f64 {
        self.pressure_mpa
    }

    pub fn weight_mn(&self) -> f64 {
        self.weight_mn
    }

    pub fn wheel_spacing_m(&self) -> f64 {
        self.wheel_spacing_m
    }

    pub fn position_x_m(&self) -> f64 {
        self.position_x_m
    }

    pub fn position_y_m(&self) -> f64 {
        self.position_y_m
    }

    pub fn set_radius_m(&mut self, value: f64) {
        self.radius_m = non_negative(value);
    }

    pub fn set_pressure_mpa(&mut self, value: f64) {
        self.pressure_mpa = non_negative(value);
    }

    pub fn set_weight_mn(&mut self, value: f64) {
        self.weight_mn = non_negative(value);
    }

    pub fn set_wheel_spacing_m(&mut self, value: f64) {
        self.wheel_spacing_m = non_negative(value);
    }

    pub fn set_position(&mut self, x_m: f64, y_m: f64) {
        self.position_x_m = x_m;
        self.position_y_m = y_m;
    }

    /// Wheel spacing only means something for twin wheels
    pub fn is_spacing_applicable(&self) -> bool {
        self.load_type.is_twin()
    }

    pub fn position_x_display(&self) -> String {
        format_position(self.position_x_m)
    }

    /// Twin wheels are computed under each wheel and between them
    pub fn position_y_display(&self) -> String {
        if self.load_type.is_twin() {
            "0 and d/2".to_string()
        } else {
            format_position(self.position_y_m)
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

fn format_position(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{:.3}", value)
    }
}
