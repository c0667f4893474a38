//! Error types for component resolution

use crate::{BoxError, ComponentKey};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while registering or resolving components
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No descriptor matches the requested identity
    #[error("Component not found: {key}")]
    NotFound { key: ComponentKey },

    /// The matched factory failed to construct the component
    #[error("Failed to construct component {key}: {cause}")]
    ConstructionFailed {
        key: ComponentKey,
        #[source]
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The factory produced a different concrete type than the one requested
    #[error("Component {key} could not be downcast to {expected}")]
    TypeMismatch {
        key: ComponentKey,
        expected: &'static str,
    },

    /// Container is locked and cannot accept new registrations
    #[error("Container is locked - cannot register new components")]
    Locked,
}

impl DiError {
    /// Create a NotFound error for an identity
    #[inline]
    pub fn not_found(key: ComponentKey) -> Self {
        Self::NotFound { key }
    }

    /// Create a ConstructionFailed error
    #[inline]
    pub fn construction_failed(key: ComponentKey, cause: impl Into<BoxError>) -> Self {
        let cause: BoxError = cause.into();
        Self::ConstructionFailed {
            key,
            cause: Arc::from(cause),
        }
    }

    /// Create a TypeMismatch error
    #[inline]
    pub fn type_mismatch<T: 'static>(key: ComponentKey) -> Self {
        Self::TypeMismatch {
            key,
            expected: std::any::type_name::<T>(),
        }
    }

    /// Whether this error means "nothing registered", as opposed to a
    /// registered component that failed.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Identity the error refers to, if any
    pub fn key(&self) -> Option<&ComponentKey> {
        match self {
            Self::NotFound { key }
            | Self::ConstructionFailed { key, .. }
            | Self::TypeMismatch { key, .. } => Some(key),
            Self::Locked => None,
        }
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    struct Storage;

    #[test]
    fn test_not_found_message() {
        let err = DiError::not_found(ComponentKey::tagged::<Storage>("disk"));
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("Component not found: "));
        assert!(err.to_string().ends_with("Storage[\"disk\"]"));
    }

    #[test]
    fn test_construction_failed_keeps_cause() {
        let err = DiError::construction_failed(ComponentKey::of::<Storage>(), "no space left");
        assert!(!err.is_not_found());
        assert!(err.to_string().ends_with(": no space left"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("no space left"));

        let cloned = err.clone();
        assert_eq!(cloned.key(), Some(&ComponentKey::of::<Storage>()));
    }

    #[test]
    fn test_locked_has_no_key() {
        assert!(DiError::Locked.key().is_none());
    }
}
