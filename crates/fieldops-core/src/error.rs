//! # Error Types
//!
//! Domain error types for fieldops-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fieldops-core errors (this file)                                      │
//! │  └── CoreError        - Pure-logic failures (payload shape, parsing)   │
//! │                                                                         │
//! │  fieldops-db errors (separate crate)                                   │
//! │  └── DbError          - Queue store failures                           │
//! │                                                                         │
//! │  fieldops-sync errors (separate crate)                                 │
//! │  ├── RemoteError      - Transport / HTTP-status failures               │
//! │  └── GatewayError     - Offline | Remote | Persistence taxonomy        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Pure domain logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A payload that must be a JSON object was something else.
    ///
    /// Optimistic merges only make sense over objects; arrays and scalars
    /// cannot carry the merged id or the optimistic marker.
    #[error("{context} must be a JSON object, got {found}")]
    PayloadNotAnObject {
        context: &'static str,
        found: &'static str,
    },

    /// A stored queue payload no longer parses as JSON.
    #[error("Queue item {id} has an unreadable payload: {reason}")]
    InvalidPayload { id: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PayloadNotAnObject {
            context: "create payload",
            found: "array",
        };
        assert_eq!(err.to_string(), "create payload must be a JSON object, got array");

        let err = CoreError::InvalidPayload {
            id: "q-1".into(),
            reason: "unexpected end of input".into(),
        };
        assert!(err.to_string().contains("q-1"));
    }
}
