//! # Error Types
//!
//! Structured error types for chaussee_core. Layer-field anomalies never
//! surface here: the validation engine always resolves them to a field state
//! (conforming, kept out of norm, or corrected). What remains are the cases
//! where the standard defines no fallback (GNT category lookups), structural
//! preconditions for the external calculation, and file handling.
//!
//! ## Example
//!
//! ```rust
//! use chaussee_core::errors::{CalcError, CalcResult};
//!
//! fn validate_ne(ne: f64) -> CalcResult<()> {
//!     if ne <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "ne",
//!             ne.to_string(),
//!             "Cumulative equivalent axle count must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_ne(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for chaussee_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for normative and calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of domain, wrong sign, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A value falls outside the domain the standard defines parameters for
    #[error("Value {value} for '{field}' is outside the range [{min}, {max}]")]
    InvalidRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A category has no normative parameters in the requested context
    #[error("Unsupported category {category}: {reason}")]
    UnsupportedCategory { category: String, reason: String },

    /// The pavement structure cannot be used as requested
    #[error("Invalid structure: {reason}")]
    InvalidStructure { reason: String },

    /// No layer at the given position
    #[error("Layer not found at position {order}")]
    LayerNotFound { order: usize },

    /// Calculation failed (external engine error, degenerate inputs)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidRange error
    pub fn invalid_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        CalcError::InvalidRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Create an UnsupportedCategory error
    pub fn unsupported_category(category: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::UnsupportedCategory {
            category: category.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidStructure error
    pub fn invalid_structure(reason: impl Into<String>) -> Self {
        CalcError::InvalidStructure {
            reason: reason.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::InvalidRange { .. } => "INVALID_RANGE",
            CalcError::UnsupportedCategory { .. } => "UNSUPPORTED_CATEGORY",
            CalcError::InvalidStructure { .. } => "INVALID_STRUCTURE",
            CalcError::LayerNotFound { .. } => "LAYER_NOT_FOUND",
            CalcError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_range("platform_modulus_mpa", 750.0, 100.0, 700.0);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidRange\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::invalid_structure("no platform").error_code(), "INVALID_STRUCTURE");
        assert_eq!(
            CalcError::unsupported_category("CG2", "thick bituminous").error_code(),
            "UNSUPPORTED_CATEGORY"
        );
        assert_eq!(CalcError::LayerNotFound { order: 7 }.error_code(), "LAYER_NOT_FOUND");
    }

    #[test]
    fn test_only_locks_are_recoverable() {
        assert!(CalcError::file_locked("p.chs", "someone", "now").is_recoverable());
        assert!(!CalcError::invalid_range("x", 1.0, 2.0, 3.0).is_recoverable());
    }

    #[test]
    fn test_display_mentions_bounds() {
        let error = CalcError::invalid_range("platform_modulus_mpa", 50.0, 100.0, 700.0);
        let text = error.to_string();
        assert!(text.contains("50"));
        assert!(text.contains("700"));
    }
}
