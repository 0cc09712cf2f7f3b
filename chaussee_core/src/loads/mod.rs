//! Reference wheel loads
//!
//! The mechanical response of a pavement is computed under a normalised
//! reference load: a twin wheel (the French 13 t axle or another twin
//! geometry) or a single wheel.
//!
//! # Overview
//!
//! - [`ReferenceLoadType`] - Twin or single wheel
//! - [`ChargeReference`] - Wheel geometry, reset to the normative defaults
//!   whenever the load type changes
//!
//! # Example
//!
//! ```
//! use chaussee_core::loads::{ChargeReference, ReferenceLoadType};
//!
//! let mut charge = ChargeReference::default();
//! charge.set_radius_m(0.15);
//!
//! charge.set_load_type(ReferenceLoadType::SingleWheel);
//! assert_eq!(charge.radius_m(), 0.125);
//! assert_eq!(charge.wheel_spacing_m(), 0.0);
//! assert!(!charge.is_spacing_applicable());
//! ```

pub mod reference;

pub use reference::{ChargeReference, ReferenceLoadType};
