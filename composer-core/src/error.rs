//! Error types for editing operations.

use thiserror::Error;

/// Result type for editing operations.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Errors that can occur in editing operations.
///
/// Expected edge cases (a selector that no longer resolves, undo at the
/// start of history) are not errors; they are logged and treated as no-ops.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// A mutation was rejected before it reached history.
    #[error("Invalid mutation: {0}")]
    Validation(#[from] ValidationError),

    /// Project/command serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document parsed but describes an impossible project.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A gesture operation was issued while no gesture was active.
    #[error("No active gesture")]
    NoActiveGesture,

    /// Pointer input of the wrong shape for the active gesture.
    #[error("Gesture mismatch: {0}")]
    GestureMismatch(&'static str),
}

/// Reasons a mutation is rejected at the store boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Width or height is negative.
    #[error("negative size {width}x{height}")]
    NegativeSize {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },

    /// A numeric field is NaN or infinite.
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    /// Video volume outside `[0, 1]`.
    #[error("volume {0} outside [0, 1]")]
    VolumeOutOfRange(f32),

    /// Font size is zero or negative.
    #[error("font size {0} must be positive")]
    InvalidFontSize(f32),

    /// A patch field does not apply to the addressed element kind.
    #[error("field `{field}` does not apply to {kind} elements")]
    UnsupportedField {
        /// Patch field name.
        field: &'static str,
        /// Element kind name.
        kind: &'static str,
    },

    /// Media source reference is empty.
    #[error("media source must not be empty")]
    EmptySource,
}
