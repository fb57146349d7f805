//! # fieldops-core: Pure Domain Logic for Fieldops
//!
//! This crate contains the side-effect-free heart of the offline sync layer:
//! the queue record types, the entity/kind inference rules, and the
//! optimistic response synthesis used by the mutation gateway.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Fieldops Layer Cake                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  fieldops-core (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │    types      │   │    infer      │   │   optimistic   │   │   │
//! │  │   │               │   │               │   │                │   │   │
//! │  │   │ QueueItem     │   │ URL → Entity  │   │ create merge   │   │   │
//! │  │   │ Entity        │   │ priorities    │   │ update merge   │   │   │
//! │  │   │ MutationKind  │   │               │   │ delete ack     │   │   │
//! │  │   │ HttpMethod    │   │               │   │                │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       ▲                          ▲                                      │
//! │       │                          │                                      │
//! │  fieldops-db                fieldops-sync                               │
//! │  (queue store)              (gateway + drain)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`types`] - Queue record and category enums
//! - [`infer`] - Entity/kind inference and priority defaults
//! - [`optimistic`] - Optimistic response synthesis
//! - [`error`] - Domain error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod infer;
pub mod optimistic;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use infer::{infer_entity, PRIORITY_CREATE, PRIORITY_DEFAULT, PRIORITY_DELETE, PRIORITY_UPDATE};
pub use optimistic::{optimistic_create, optimistic_delete, optimistic_update, OPTIMISTIC_MARKER};
pub use types::{Entity, HttpMethod, MutationKind, QueueItem};
