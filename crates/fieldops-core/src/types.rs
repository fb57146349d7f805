//! # Domain Types
//!
//! Core domain types for the offline mutation queue.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   QueueItem     │   │     Entity      │   │  MutationKind   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  Customer       │   │  Create         │       │
//! │  │  entity         │   │  WorkOrder      │   │  Update         │       │
//! │  │  kind           │   │  Invoice        │   │  Delete         │       │
//! │  │  method, url    │   │  Payment        │   └─────────────────┘       │
//! │  │  payload (JSON) │   │  Prospect       │   ┌─────────────────┐       │
//! │  │  priority       │   │  Activity       │   │  HttpMethod     │       │
//! │  │  attempts       │   └─────────────────┘   │  ─────────────  │       │
//! │  │  created_at     │                         │  GET POST PUT   │       │
//! │  └─────────────────┘                         │  PATCH DELETE   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payload Representation
//! Queue payloads are stored as JSON text (the serialized request body),
//! never as re-parsed structures. The drain replays the bytes it was handed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Entity
// =============================================================================

/// Coarse category tag attached to a queued mutation.
///
/// Used for UI grouping and targeted pending-operation queries. Entity tags
/// are never consulted for delivery correctness; a misclassified item still
/// replays against its stored `method`/`url`/`payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    /// A customer record.
    Customer,
    /// A scheduled work order / job.
    WorkOrder,
    /// An invoice.
    Invoice,
    /// A payment against an invoice.
    Payment,
    /// A sales prospect / lead.
    Prospect,
    /// A logged activity (call, note, visit).
    Activity,
}

impl Entity {
    /// All entity tags, in a stable order (used for count reports).
    pub const ALL: [Entity; 6] = [
        Entity::Customer,
        Entity::WorkOrder,
        Entity::Invoice,
        Entity::Payment,
        Entity::Prospect,
        Entity::Activity,
    ];
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Customer => write!(f, "customer"),
            Entity::WorkOrder => write!(f, "workOrder"),
            Entity::Invoice => write!(f, "invoice"),
            Entity::Payment => write!(f, "payment"),
            Entity::Prospect => write!(f, "prospect"),
            Entity::Activity => write!(f, "activity"),
        }
    }
}

// =============================================================================
// Mutation Kind
// =============================================================================

/// The kind of mutation a queue item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// A new record is being created.
    Create,
    /// An existing record is being modified.
    Update,
    /// A record is being removed.
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

// =============================================================================
// HTTP Method
// =============================================================================

/// The HTTP verb a request is issued (or replayed) with.
///
/// Queue items only ever store mutating verbs; `GET` exists here because the
/// gateway forwards reads through the same remote client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Maps this verb to the mutation kind it represents.
    ///
    /// `POST → create`, `PUT | PATCH → update`, `DELETE → delete`.
    /// `GET` carries no mutation and maps to `None`.
    pub fn mutation_kind(self) -> Option<MutationKind> {
        match self {
            HttpMethod::Post => Some(MutationKind::Create),
            HttpMethod::Put | HttpMethod::Patch => Some(MutationKind::Update),
            HttpMethod::Delete => Some(MutationKind::Delete),
            HttpMethod::Get => None,
        }
    }

    /// Returns true for verbs that change remote state.
    pub fn is_mutating(self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

// =============================================================================
// Queue Item
// =============================================================================

/// A deferred mutation awaiting delivery.
///
/// Once enqueued, a queue item is immutable except for its attempt
/// bookkeeping (`attempts`, `last_error`, `attempted_at`, `abandoned_at`).
/// Items leave the store only after a confirmed successful replay, or via
/// abandoned-row purging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QueueItem {
    /// Unique identifier (UUID v4), assigned at enqueue time.
    pub id: String,

    /// Category tag for UI grouping. Not used for delivery correctness.
    pub entity: Entity,

    /// What kind of mutation this is.
    pub kind: MutationKind,

    /// HTTP verb to replay.
    pub method: HttpMethod,

    /// Target resource path.
    pub url: String,

    /// Request body as JSON text. `None` for deletes.
    pub payload: Option<String>,

    /// Drain priority; lower values deliver first.
    pub priority: i64,

    /// Number of failed delivery attempts so far.
    pub attempts: i64,

    /// Error message from the most recent failed attempt.
    pub last_error: Option<String>,

    /// Enqueue time. Tie-breaker within equal priority.
    pub created_at: DateTime<Utc>,

    /// When delivery was last attempted.
    pub attempted_at: Option<DateTime<Utc>>,

    /// When the item was permanently given up on, if ever.
    pub abandoned_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Parses the stored payload back into a JSON value.
    pub fn payload_json(&self) -> CoreResult<Option<Value>> {
        match &self.payload {
            Some(text) => {
                let value = serde_json::from_str(text)
                    .map_err(|e| CoreError::InvalidPayload { id: self.id.clone(), reason: e.to_string() })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// True once the item has been permanently given up on.
    pub fn is_abandoned(&self) -> bool {
        self.abandoned_at.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serde_tags() {
        assert_eq!(serde_json::to_string(&Entity::WorkOrder).unwrap(), "\"workOrder\"");
        assert_eq!(serde_json::to_string(&Entity::Customer).unwrap(), "\"customer\"");
        let parsed: Entity = serde_json::from_str("\"prospect\"").unwrap();
        assert_eq!(parsed, Entity::Prospect);
    }

    #[test]
    fn test_method_mutation_kind() {
        assert_eq!(HttpMethod::Post.mutation_kind(), Some(MutationKind::Create));
        assert_eq!(HttpMethod::Put.mutation_kind(), Some(MutationKind::Update));
        assert_eq!(HttpMethod::Patch.mutation_kind(), Some(MutationKind::Update));
        assert_eq!(HttpMethod::Delete.mutation_kind(), Some(MutationKind::Delete));
        assert_eq!(HttpMethod::Get.mutation_kind(), None);
    }

    #[test]
    fn test_method_display_is_wire_verb() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_payload_json_round_trip() {
        let item = QueueItem {
            id: "q-1".into(),
            entity: Entity::Customer,
            kind: MutationKind::Create,
            method: HttpMethod::Post,
            url: "/customers".into(),
            payload: Some(r#"{"name":"Acme"}"#.into()),
            priority: 5,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            abandoned_at: None,
        };
        let value = item.payload_json().unwrap().unwrap();
        assert_eq!(value["name"], "Acme");
        assert!(!item.is_abandoned());
    }
}
