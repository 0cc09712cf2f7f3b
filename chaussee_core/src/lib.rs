//! # chaussee_core - Pavement Layer Compliance Engine
//!
//! `chaussee_core` checks the courses of a road pavement against the
//! French design standard NF P98-086 and prepares them for an external
//! multilayer elastic computation. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Normative rules are pure**: ranges and coefficients are functions
//!   of the course description
//! - **Every anomaly has a state**: a field is conforming, kept out of norm
//!   (Expert mode) or auto-corrected (Automatic mode)
//! - **No UI coupling**: user decisions and notifications go through the
//!   [`CorrectionHandler`] and [`NotificationSink`] traits
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use chaussee_core::layer::{FieldState, LayerField, ValidationEngine};
//! use chaussee_core::norms::DimensioningMode;
//! use chaussee_core::structure::PavementStructure;
//!
//! let mut engine = ValidationEngine::new();
//! let mut structure = PavementStructure::default_flexible(&mut engine);
//!
//! // Expert mode keeps an out-of-norm thickness and flags it
//! structure.set_thickness(&mut engine, 1, 0.10).unwrap();
//! assert_eq!(structure.layers()[0].state(LayerField::Thickness), FieldState::OutOfNormKept);
//!
//! // Automatic mode clamps it to the wearing course maximum
//! structure.set_mode(&mut engine, 1, DimensioningMode::Automatic).unwrap();
//! assert_eq!(structure.layers()[0].thickness_m(), 0.08);
//! ```
//!
//! ## Modules
//!
//! - [`norms`] - Normative vocabulary, ranges and ks/kd coefficients
//! - [`materials`] - Material families and GNT parameters
//! - [`layer`] - Course model and validation engine
//! - [`structure`] - Ordered courses, interfaces, composition rules
//! - [`loads`] - Reference load geometry
//! - [`admissible`] - Traffic and fatigue admissible values
//! - [`response`] - External engine input and criterion checks
//! - [`project`] - Project container, metadata, and settings
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`errors`] - Structured error types

pub mod admissible;
pub mod errors;
pub mod file_io;
pub mod layer;
pub mod loads;
pub mod materials;
pub mod norms;
pub mod project;
pub mod response;
pub mod structure;

mod text;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_and_revalidate, load_project, save_project, FileLock};
pub use layer::{
    CorrectionDecision, CorrectionHandler, FieldState, Layer, LayerField, Notification, NotificationSink,
    Severity, ValidationEngine,
};
pub use materials::MaterialFamily;
pub use norms::{DimensioningMode, InterfaceType, LayerRole, StructureType};
pub use project::{Project, ProjectMetadata, ProjectSettings};
pub use structure::{CompositionReport, PavementStructure};
