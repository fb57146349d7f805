//! # Entity Inference & Priority Defaults
//!
//! Best-effort classification of a mutation's entity tag from its URL, and
//! the priority policy applied by the gateway's convenience helpers.
//!
//! ## Priority Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Drain Priority Policy                              │
//! │                                                                         │
//! │  PRIORITY_CREATE = 5    ── creates land first, so later updates and    │
//! │                            deletes can reference server-side records   │
//! │  PRIORITY_UPDATE = 10   ── the gateway default for plain mutations     │
//! │  PRIORITY_DELETE = 15   ── destructive operations replay last         │
//! │                                                                         │
//! │  Lower value = delivered first. Within one priority class the queue    │
//! │  preserves insertion order.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::types::Entity;

// =============================================================================
// Priority Defaults
// =============================================================================

/// Priority used by `create_with_offline_support`.
pub const PRIORITY_CREATE: i64 = 5;

/// Priority used by `update_with_offline_support`, and the gateway default.
pub const PRIORITY_UPDATE: i64 = 10;

/// Priority used by `delete_with_offline_support`.
pub const PRIORITY_DELETE: i64 = 15;

/// Default priority when the caller supplies none.
pub const PRIORITY_DEFAULT: i64 = PRIORITY_UPDATE;

// =============================================================================
// Entity Inference
// =============================================================================

/// Known resource segments, checked in order; first match wins.
const SEGMENT_TABLE: [(&str, Entity); 6] = [
    ("/customers", Entity::Customer),
    ("/work-orders", Entity::WorkOrder),
    ("/invoices", Entity::Invoice),
    ("/payments", Entity::Payment),
    ("/prospects", Entity::Prospect),
    ("/activities", Entity::Activity),
];

/// Infers the entity tag from a resource path.
///
/// The path is scanned case-insensitively for known resource segments
/// (`/customers`, `/work-orders`, `/invoices`, `/payments`, `/prospects`,
/// `/activities`). Unknown paths fall back to [`Entity::Customer`].
///
/// This is a best-effort heuristic: a misclassification only affects how
/// the pending-operations view groups the item, never whether it delivers.
///
/// ## Example
/// ```
/// use fieldops_core::{infer_entity, Entity};
///
/// assert_eq!(infer_entity("/work-orders/123/complete"), Entity::WorkOrder);
/// assert_eq!(infer_entity("/unknown-resource"), Entity::Customer);
/// ```
pub fn infer_entity(url: &str) -> Entity {
    let lowered = url.to_ascii_lowercase();

    for (segment, entity) in SEGMENT_TABLE {
        if lowered.contains(segment) {
            return entity;
        }
    }

    Entity::Customer
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_known_segments() {
        assert_eq!(infer_entity("/customers/42"), Entity::Customer);
        assert_eq!(infer_entity("/work-orders/123/complete"), Entity::WorkOrder);
        assert_eq!(infer_entity("/invoices"), Entity::Invoice);
        assert_eq!(infer_entity("/invoices/9/payments"), Entity::Invoice);
        assert_eq!(infer_entity("/prospects/convert"), Entity::Prospect);
        assert_eq!(infer_entity("/activities/log"), Entity::Activity);
    }

    #[test]
    fn test_infer_is_case_insensitive() {
        assert_eq!(infer_entity("/Work-Orders/5"), Entity::WorkOrder);
        assert_eq!(infer_entity("/PAYMENTS/refund"), Entity::Payment);
    }

    #[test]
    fn test_infer_defaults_to_customer() {
        assert_eq!(infer_entity("/unknown-resource"), Entity::Customer);
        assert_eq!(infer_entity(""), Entity::Customer);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(PRIORITY_CREATE < PRIORITY_UPDATE);
        assert!(PRIORITY_UPDATE < PRIORITY_DELETE);
        assert_eq!(PRIORITY_DEFAULT, PRIORITY_UPDATE);
    }
}
