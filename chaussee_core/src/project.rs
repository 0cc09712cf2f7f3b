//! # Project Data Structures
//!
//! The `Project` struct is the root container of a pavement design.
//! Projects serialize to `.chs` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, id, author, site, timestamps)
//! ├── settings: ProjectSettings (default mode, standard)
//! ├── structure: PavementStructure (courses, load, NE)
//! ├── admissible: Vec<AdmissibleValueRow> (one row per course)
//! └── traffic: Option<TrafficInput>
//! ```
//!
//! Field states and error lists of the courses are not stored: they are
//! rebuilt by [`Project::revalidate`] after loading.
//!
//! ## Example
//!
//! ```rust
//! use chaussee_core::layer::ValidationEngine;
//! use chaussee_core::project::Project;
//!
//! let mut engine = ValidationEngine::new();
//! let project = Project::new("RN 7 widening", "J. Martin", &mut engine);
//! assert_eq!(project.admissible.len(), 4);
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("RN 7 widening"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::admissible::{self, AdmissibleValueRow, TrafficInput};
use crate::errors::CalcResult;
use crate::layer::{LayerOutcome, ValidationEngine};
use crate::norms::{nf_ref, DimensioningMode};
use crate::structure::PavementStructure;

/// Current schema version for .chs files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container, serialized to `.chs` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,
    pub settings: ProjectSettings,
    pub structure: PavementStructure,
    /// Fatigue parameters, one row per course
    #[serde(default)]
    pub admissible: Vec<AdmissibleValueRow>,
    #[serde(default)]
    pub traffic: Option<TrafficInput>,
}

impl Project {
    /// New project with the default flexible structure.
    pub fn new(name: impl Into<String>, author: impl Into<String>, engine: &mut ValidationEngine) -> Self {
        let now = Utc::now();
        let structure = PavementStructure::default_flexible(engine);
        let admissible = admissible::rows_for_layers(structure.layers());
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                name: name.into(),
                author: author.into(),
                location: String::new(),
                description: String::new(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            structure,
            admissible,
            traffic: None,
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Rebuild field states, notes and row links after loading.
    ///
    /// Warnings already given are forgotten first, so every out-of-norm
    /// field of the loaded structure is reported once.
    pub fn revalidate(&mut self, engine: &mut ValidationEngine) -> Vec<LayerOutcome> {
        engine.reset_warnings();
        let outcomes = self.structure.revalidate_all(engine);
        let linked = admissible::link_rows(&mut self.admissible, self.structure.layers());
        info!(
            project = %self.meta.name,
            layers = self.structure.layers().len(),
            rows = linked,
            "project revalidated"
        );
        outcomes
    }

    /// Apply the project's default mode to every course
    pub fn apply_default_mode(&mut self, engine: &mut ValidationEngine) -> Vec<LayerOutcome> {
        let outcomes = self.structure.set_mode_all(engine, self.settings.default_mode);
        self.touch();
        outcomes
    }

    /// Replace the admissible rows by fresh rows built from the courses
    pub fn reset_admissible_rows(&mut self) {
        self.admissible = admissible::rows_for_layers(self.structure.layers());
        self.touch();
    }

    /// Derive NE from the traffic assumptions and a CAM.
    ///
    /// Without traffic assumptions the stored NE is returned unchanged.
    pub fn update_ne_from_traffic(&mut self, cam: f64) -> CalcResult<f64> {
        if let Some(traffic) = &self.traffic {
            self.structure.ne = traffic.equivalent_axles(cam)?;
            for row in &mut self.admissible {
                row.cam = cam;
            }
            self.touch();
        }
        Ok(self.structure.ne)
    }

    /// Link the rows to the courses and compute every admissible value
    pub fn compute_admissible(&mut self) -> CalcResult<()> {
        admissible::link_rows(&mut self.admissible, self.structure.layers());
        admissible::compute_all(&mut self.admissible, self.structure.ne)?;
        self.touch();
        Ok(())
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    pub id: Uuid,

    pub name: String,

    /// Name of the responsible engineer
    pub author: String,

    /// Site or road section
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Project-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Mode applied to every course by `apply_default_mode`
    pub default_mode: DimensioningMode,

    /// Reference standard
    pub standard: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            default_mode: DimensioningMode::Expert,
            standard: nf_ref::STANDARD.to_string(),
        }
    }
}
