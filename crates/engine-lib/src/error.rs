//! Error types shared across the engine

use thiserror::Error;

/// Errors surfaced to callers of the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input is structurally too small to answer the request
    #[error("computation failed: {0}")]
    Computation(String),

    /// The training hook failed
    #[error("retraining failed: {0}")]
    Retraining(String),
}

impl EngineError {
    pub fn computation(message: impl Into<String>) -> Self {
        EngineError::Computation(message.into())
    }
}

/// Result of a predictor that degrades instead of failing
///
/// `Fallback` carries the conservative value handed to the caller and the
/// reason the rule-based path could not be used.
#[derive(Debug, Clone)]
pub enum Estimate<T> {
    Computed(T),
    Fallback { value: T, reason: String },
}

impl<T> Estimate<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Estimate::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Estimate::Computed(_) => None,
            Estimate::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Estimate::Computed(value) | Estimate::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Estimate::Computed(value) | Estimate::Fallback { value, .. } => value,
        }
    }
}
