//! Error types for motion construction and playback.

use serde::{Deserialize, Serialize};

/// Configuration and runtime errors raised by the motion core.
///
/// Almost every variant is a configuration error surfaced while building an
/// animation; once a controller exists, playback itself does not fail.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionError {
    /// A sequence or animation resolved to no targets at all.
    #[error("No animation targets could be resolved")]
    NoTargets,

    /// A named target/value pair had no sink.
    #[error("Unresolved target: {target}.{value}")]
    UnresolvedTarget { target: String, value: String },

    /// Keyframe list was empty.
    #[error("Keyframe list for '{value}' is empty")]
    EmptyKeyframes { value: String },

    /// A `None` keyframe had no current value to hydrate from.
    #[error("Keyframe {index} of '{value}' needs a current value but none is available")]
    MissingOrigin { value: String, index: usize },

    /// Interpolation input and output ranges differ in length.
    #[error("Interpolation input ({input}) and output ({output}) lengths differ")]
    InterpolationLength { input: usize, output: usize },

    /// Easing name not recognised.
    #[error("Unknown easing: {name}")]
    UnknownEasing { name: String },

    /// Two values cannot be mixed.
    #[error("Cannot mix {from} with {to}: {reason}")]
    IncompatibleValues {
        from: String,
        to: String,
        reason: String,
    },

    /// Sequence segment repeat count above the supported maximum.
    #[error("Repeat count {repeat} is too high, must be less than {max}")]
    RepeatTooHigh { repeat: u32, max: u32 },

    /// Invalid option value.
    #[error("Invalid option '{field}': {reason}")]
    InvalidOption { field: String, reason: String },

    /// Compositor backend failure.
    #[error("Compositor error: {reason}")]
    Compositor { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl MotionError {
    /// Build an [`MotionError::InvalidOption`].
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error can be recovered from locally without aborting the animation.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Compositor { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoTargets | Self::UnresolvedTarget { .. } => "target",
            Self::EmptyKeyframes { .. }
            | Self::MissingOrigin { .. }
            | Self::InterpolationLength { .. }
            | Self::IncompatibleValues { .. } => "keyframes",
            Self::UnknownEasing { .. } => "easing",
            Self::RepeatTooHigh { .. } | Self::InvalidOption { .. } => "options",
            Self::Compositor { .. } => "compositor",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
