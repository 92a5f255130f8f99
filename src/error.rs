//! Capture-level error type wrapping persistence failures.

use std::fmt;

use crate::store::StoreError;

/// Error returned when a capture fails.
///
/// Only genuine backend failures surface here. Policy-disabled events,
/// kinds outside the allow-list, and suppressed no-op updates are silent
/// `Ok(None)` outcomes, not errors.
///
/// The pipeline never retries internally; retry and backoff belong to the
/// storage collaborator or the caller. Callers should treat capture as
/// best-effort relative to the primary write: a capture failure must never
/// roll back the business operation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The persistence collaborator failed to append the record.
    Storage(StoreError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Storage(e) => write!(f, "audit capture failed: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Storage(e) => Some(e),
        }
    }
}

impl From<StoreError> for CaptureError {
    fn from(e: StoreError) -> Self {
        CaptureError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;

    #[test]
    fn display_wraps_the_store_error() {
        let error = CaptureError::from(StoreError::with_message(
            StoreErrorKind::Backend,
            "connection reset",
        ));

        assert_eq!(
            error.to_string(),
            "audit capture failed: store error (backend failure): connection reset"
        );
    }

    #[test]
    fn source_exposes_the_store_error() {
        let error = CaptureError::from(StoreError::new(StoreErrorKind::Closed));
        assert!(std::error::Error::source(&error).is_some());
    }
}
