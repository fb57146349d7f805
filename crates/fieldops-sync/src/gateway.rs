//! # Offline-Aware Mutation Gateway
//!
//! Routes every call based on the connectivity signal: forward to the remote
//! API while online, defer to the durable queue while offline.
//!
//! ## Routing Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Routing                                    │
//! │                                                                         │
//! │  get(url)                                                              │
//! │    ├── online  → forward, return response                              │
//! │    └── offline → GatewayError::Offline (reads are never queued:        │
//! │                  without a cache there is nothing meaningful to        │
//! │                  return)                                                │
//! │                                                                         │
//! │  post / put / patch / delete (url, data, options)                      │
//! │    ├── online  → forward                                               │
//! │    │             → { data: server response, offline_queued: false }    │
//! │    ├── offline + queue_when_offline = false                            │
//! │    │           → GatewayError::Offline, nothing enqueued               │
//! │    └── offline → build QueueItem (entity/kind inferred if absent),     │
//! │                  persist it, return                                    │
//! │                  { data: optimistic ?? payload,                        │
//! │                    offline_queued: true, queue_id }                    │
//! │                                                                         │
//! │  A successful enqueue NEVER throws: callers treat it as                │
//! │  success-with-caveat and show a "pending sync" indicator.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use fieldops_core::{
    infer_entity, optimistic_create, optimistic_delete, optimistic_update, Entity, HttpMethod,
    MutationKind, QueueItem, PRIORITY_CREATE, PRIORITY_DEFAULT, PRIORITY_DELETE, PRIORITY_UPDATE,
};
use fieldops_db::{Database, NewQueueItem};

use crate::connectivity::ConnectivityProbe;
use crate::error::{GatewayError, SyncResult};
use crate::remote::RemoteApi;

// =============================================================================
// Mutation Outcome
// =============================================================================

/// What a mutating gateway call hands back to its caller.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// Server response while online; optimistic (or echoed) payload when
    /// queued offline.
    pub data: Value,

    /// True when the mutation was deferred instead of delivered.
    pub offline_queued: bool,

    /// Id of the queued item, when deferred.
    pub queue_id: Option<String>,
}

// =============================================================================
// Offline Request Options
// =============================================================================

/// Per-call options for mutating gateway operations.
///
/// ## Defaults
/// - `entity`: inferred from the URL
/// - `kind`: inferred from the HTTP verb
/// - `priority`: the gateway default (10 unless reconfigured)
/// - `queue_when_offline`: `true`
/// - `optimistic_response`: echo the request payload
#[derive(Debug, Clone)]
pub struct OfflineRequestOptions {
    /// Explicit entity tag; inferred from the URL when absent.
    pub entity: Option<Entity>,

    /// Explicit mutation kind; inferred from the HTTP verb when absent.
    pub kind: Option<MutationKind>,

    /// Explicit drain priority; gateway default when absent.
    pub priority: Option<i64>,

    /// Whether this mutation may be deferred while offline.
    /// `false` turns an offline call into a hard [`GatewayError::Offline`].
    pub queue_when_offline: bool,

    /// Pre-built optimistic result returned to the caller on enqueue.
    pub optimistic_response: Option<Value>,
}

impl OfflineRequestOptions {
    /// Creates options with the documented defaults.
    pub fn new() -> Self {
        OfflineRequestOptions {
            entity: None,
            kind: None,
            priority: None,
            queue_when_offline: true,
            optimistic_response: None,
        }
    }

    /// Sets the explicit entity tag.
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Sets the explicit mutation kind.
    pub fn kind(mut self, kind: MutationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the explicit drain priority.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets whether offline queuing is permitted.
    pub fn queue_when_offline(mut self, allow: bool) -> Self {
        self.queue_when_offline = allow;
        self
    }

    /// Sets the optimistic response returned on enqueue.
    pub fn optimistic_response(mut self, response: Value) -> Self {
        self.optimistic_response = Some(response);
        self
    }
}

impl Default for OfflineRequestOptions {
    /// Same defaults as [`new`](Self::new): queuing permitted, everything
    /// else inferred.
    fn default() -> Self {
        OfflineRequestOptions::new()
    }
}

// =============================================================================
// Queue Status
// =============================================================================

/// Summary of the queue for status displays.
#[derive(Debug, Clone, Default)]
pub struct QueueStatus {
    /// Number of entries awaiting delivery.
    pub pending: i64,

    /// Number of permanently abandoned entries.
    pub abandoned: i64,

    /// Most recent delivery error, if any.
    pub last_error: Option<String>,
}

// =============================================================================
// Offline Gateway
// =============================================================================

/// The offline-aware mutation gateway.
///
/// Cheap to clone and share: wraps the pooled database handle and shared
/// remote/connectivity references. The gateway only appends to the queue;
/// the drain processor owns read-then-delete.
#[derive(Clone)]
pub struct OfflineGateway {
    db: Database,
    remote: Arc<dyn RemoteApi>,
    connectivity: Arc<dyn ConnectivityProbe>,
    default_priority: i64,
}

impl OfflineGateway {
    /// Creates a gateway over the given store, remote client, and
    /// connectivity signal.
    pub fn new(
        db: Database,
        remote: Arc<dyn RemoteApi>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        OfflineGateway {
            db,
            remote,
            connectivity,
            default_priority: PRIORITY_DEFAULT,
        }
    }

    /// Overrides the priority assigned when a caller supplies none.
    pub fn with_default_priority(mut self, priority: i64) -> Self {
        self.default_priority = priority;
        self
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a resource.
    ///
    /// Fails fast with [`GatewayError::Offline`] while offline: queuing
    /// reads would require a cache-coherence policy this layer does not
    /// attempt.
    pub async fn get(&self, url: &str) -> SyncResult<Value> {
        if !self.connectivity.is_online() {
            return Err(GatewayError::Offline);
        }

        Ok(self.remote.execute(HttpMethod::Get, url, None).await?)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a resource (`POST`).
    pub async fn post(
        &self,
        url: &str,
        data: Value,
        options: OfflineRequestOptions,
    ) -> SyncResult<MutationOutcome> {
        self.mutate(HttpMethod::Post, url, Some(data), options).await
    }

    /// Replaces a resource (`PUT`).
    pub async fn put(
        &self,
        url: &str,
        data: Value,
        options: OfflineRequestOptions,
    ) -> SyncResult<MutationOutcome> {
        self.mutate(HttpMethod::Put, url, Some(data), options).await
    }

    /// Partially updates a resource (`PATCH`).
    pub async fn patch(
        &self,
        url: &str,
        data: Value,
        options: OfflineRequestOptions,
    ) -> SyncResult<MutationOutcome> {
        self.mutate(HttpMethod::Patch, url, Some(data), options).await
    }

    /// Removes a resource (`DELETE`).
    pub async fn delete(
        &self,
        url: &str,
        options: OfflineRequestOptions,
    ) -> SyncResult<MutationOutcome> {
        self.mutate(HttpMethod::Delete, url, None, options).await
    }

    /// Shared mutation path: forward while online, defer while offline.
    async fn mutate(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<Value>,
        options: OfflineRequestOptions,
    ) -> SyncResult<MutationOutcome> {
        if self.connectivity.is_online() {
            let body = data.as_ref().map(Value::to_string);
            let response = self.remote.execute(method, url, body.as_deref()).await?;

            return Ok(MutationOutcome {
                data: response,
                offline_queued: false,
                queue_id: None,
            });
        }

        if !options.queue_when_offline {
            debug!(url = %url, "Offline and queuing disallowed, rejecting mutation");
            return Err(GatewayError::Offline);
        }

        let entity = options.entity.unwrap_or_else(|| infer_entity(url));
        // get() never reaches this path, so the verb always carries a kind;
        // the fallback only guards against future non-mutating verbs
        let kind = options
            .kind
            .or_else(|| method.mutation_kind())
            .unwrap_or(MutationKind::Update);
        let priority = options.priority.unwrap_or(self.default_priority);
        let payload = data.as_ref().map(Value::to_string);

        let item = self
            .db
            .queue()
            .enqueue(NewQueueItem {
                entity,
                kind,
                method,
                url: url.to_string(),
                payload,
                priority,
            })
            .await?;

        info!(
            queue_id = %item.id,
            entity = %entity,
            kind = %kind,
            priority,
            "Mutation deferred to offline queue"
        );

        let data = options
            .optimistic_response
            .or(data)
            .unwrap_or(Value::Null);

        Ok(MutationOutcome {
            data,
            offline_queued: true,
            queue_id: Some(item.id),
        })
    }

    // =========================================================================
    // Convenience Helpers
    // =========================================================================

    /// Creates a record with offline support.
    ///
    /// Queues at priority 5 so offline creates land before updates and
    /// deletes that may reference them. The optimistic result carries the
    /// caller's temporary id until the server assigns a real one.
    pub async fn create_with_offline_support(
        &self,
        endpoint: &str,
        data: Value,
        entity: Entity,
        temp_id: &str,
    ) -> SyncResult<MutationOutcome> {
        let optimistic = optimistic_create(&data, temp_id)?;

        self.post(
            endpoint,
            data,
            OfflineRequestOptions::new()
                .entity(entity)
                .priority(PRIORITY_CREATE)
                .optimistic_response(optimistic),
        )
        .await
    }

    /// Updates a record with offline support.
    ///
    /// Queues at priority 10. The optimistic result merges the known
    /// current state with the patch, so UI showing the record reflects the
    /// pending change without refetching.
    pub async fn update_with_offline_support(
        &self,
        endpoint: &str,
        id: &str,
        patch: Value,
        entity: Entity,
        current: Option<Value>,
    ) -> SyncResult<MutationOutcome> {
        let optimistic = optimistic_update(current.as_ref(), &patch)?;
        let url = resource_url(endpoint, id);

        self.patch(
            &url,
            patch,
            OfflineRequestOptions::new()
                .entity(entity)
                .priority(PRIORITY_UPDATE)
                .optimistic_response(optimistic),
        )
        .await
    }

    /// Deletes a record with offline support.
    ///
    /// Queues at priority 15 so destructive operations replay last,
    /// minimizing the cost of a delete whose target may not exist on the
    /// server yet.
    pub async fn delete_with_offline_support(
        &self,
        endpoint: &str,
        id: &str,
        entity: Entity,
    ) -> SyncResult<MutationOutcome> {
        let url = resource_url(endpoint, id);

        self.delete(
            &url,
            OfflineRequestOptions::new()
                .entity(entity)
                .priority(PRIORITY_DELETE)
                .optimistic_response(optimistic_delete(id)),
        )
        .await
    }

    // =========================================================================
    // Pending-Operations Introspection
    // =========================================================================

    /// Returns queued items in drain order, optionally filtered by entity.
    pub async fn pending_operations(&self, entity: Option<Entity>) -> SyncResult<Vec<QueueItem>> {
        Ok(self.db.queue().all_pending(entity).await?)
    }

    /// Returns true if any mutation is awaiting delivery.
    pub async fn has_pending_operations(&self, entity: Option<Entity>) -> SyncResult<bool> {
        Ok(!self.pending_operations(entity).await?.is_empty())
    }

    /// Returns pending counts per entity tag, for badge display.
    ///
    /// Entities with nothing pending are absent from the map.
    pub async fn pending_operation_counts(&self) -> SyncResult<HashMap<Entity, i64>> {
        let counts = self.db.queue().count_pending_by_entity().await?;
        Ok(counts.into_iter().collect())
    }

    /// Returns permanently abandoned items for dead-letter inspection.
    pub async fn abandoned_operations(&self) -> SyncResult<Vec<QueueItem>> {
        Ok(self.db.queue().all_abandoned().await?)
    }

    /// Returns a queue summary for status displays.
    pub async fn queue_status(&self) -> SyncResult<QueueStatus> {
        let queue = self.db.queue();

        Ok(QueueStatus {
            pending: queue.count_pending().await?,
            abandoned: queue.count_abandoned().await?,
            last_error: queue.latest_error().await?,
        })
    }
}

/// Joins a collection endpoint with a resource id.
fn resource_url(endpoint: &str, id: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::NetworkStatus;
    use crate::error::RemoteError;
    use async_trait::async_trait;
    use fieldops_db::DbConfig;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted remote that records every call.
    struct StubRemote {
        response: Value,
        calls: Mutex<Vec<(HttpMethod, String, Option<String>)>>,
    }

    impl StubRemote {
        fn new(response: Value) -> Self {
            StubRemote {
                response,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteApi for StubRemote {
        async fn execute(
            &self,
            method: HttpMethod,
            url: &str,
            body: Option<&str>,
        ) -> Result<Value, RemoteError> {
            self.calls
                .lock()
                .unwrap()
                .push((method, url.to_string(), body.map(String::from)));
            Ok(self.response.clone())
        }
    }

    async fn gateway_with(
        online: bool,
        remote: Arc<StubRemote>,
    ) -> (OfflineGateway, Arc<NetworkStatus>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let status = Arc::new(NetworkStatus::new(online));
        let gateway = OfflineGateway::new(db, remote, status.clone());
        (gateway, status)
    }

    #[tokio::test]
    async fn test_offline_post_enqueues_one_create() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote.clone()).await;

        let outcome = gateway
            .post("/customers", json!({"name": "Acme"}), OfflineRequestOptions::new())
            .await
            .unwrap();

        assert!(outcome.offline_queued);
        assert!(outcome.queue_id.is_some());
        assert_eq!(remote.call_count(), 0);

        let pending = gateway.pending_operations(None).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, MutationKind::Create);
        assert_eq!(pending[0].method, HttpMethod::Post);
        assert_eq!(pending[0].url, "/customers");
        assert_eq!(pending[0].payload.as_deref(), Some(r#"{"name":"Acme"}"#));
    }

    #[tokio::test]
    async fn test_online_passthrough_never_touches_queue() {
        let remote = Arc::new(StubRemote::new(json!({"id": 99, "name": "Acme"})));
        let (gateway, _) = gateway_with(true, remote.clone()).await;

        let outcome = gateway
            .post("/customers", json!({"name": "Acme"}), OfflineRequestOptions::new())
            .await
            .unwrap();

        assert!(!outcome.offline_queued);
        assert!(outcome.queue_id.is_none());
        assert_eq!(outcome.data, json!({"id": 99, "name": "Acme"}));
        assert_eq!(remote.call_count(), 1);

        assert!(!gateway.has_pending_operations(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_fails_fast_offline() {
        let remote = Arc::new(StubRemote::new(json!([])));
        let (gateway, _) = gateway_with(false, remote.clone()).await;

        let err = gateway.get("/customers").await.unwrap_err();
        assert!(err.is_offline());
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_entity_inference_from_url() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote).await;

        gateway
            .post("/work-orders/123/complete", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();
        gateway
            .post("/unknown-resource", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();

        let work_orders = gateway.pending_operations(Some(Entity::WorkOrder)).await.unwrap();
        assert_eq!(work_orders.len(), 1);
        assert_eq!(work_orders[0].url, "/work-orders/123/complete");

        // Unknown paths default to customer
        let customers = gateway.pending_operations(Some(Entity::Customer)).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].url, "/unknown-resource");
    }

    #[tokio::test]
    async fn test_disallowed_offline_queuing_rejects_without_row() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote).await;

        let err = gateway
            .delete("/invoices/7", OfflineRequestOptions::new().queue_when_offline(false))
            .await
            .unwrap_err();

        assert!(err.is_offline());
        assert!(!gateway.has_pending_operations(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_helper_merges_optimistically() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote).await;

        let outcome = gateway
            .update_with_offline_support(
                "/customers",
                "42",
                json!({"name": "X"}),
                Entity::Customer,
                Some(json!({"id": 42, "name": "Y", "age": 5})),
            )
            .await
            .unwrap();

        assert!(outcome.offline_queued);
        assert_eq!(outcome.data["id"], 42);
        assert_eq!(outcome.data["name"], "X");
        assert_eq!(outcome.data["age"], 5);
        assert_eq!(outcome.data["_isOptimistic"], true);

        let pending = gateway.pending_operations(None).await.unwrap();
        assert_eq!(pending[0].url, "/customers/42");
        assert_eq!(pending[0].priority, PRIORITY_UPDATE);
        assert_eq!(pending[0].kind, MutationKind::Update);
    }

    #[tokio::test]
    async fn test_create_helper_priority_and_temp_id() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote).await;

        let outcome = gateway
            .create_with_offline_support(
                "/prospects",
                json!({"company": "Initech"}),
                Entity::Prospect,
                "tmp-1",
            )
            .await
            .unwrap();

        assert_eq!(outcome.data["id"], "tmp-1");
        assert_eq!(outcome.data["_isOptimistic"], true);

        let pending = gateway.pending_operations(None).await.unwrap();
        assert_eq!(pending[0].priority, PRIORITY_CREATE);
        assert_eq!(pending[0].entity, Entity::Prospect);
    }

    #[tokio::test]
    async fn test_delete_helper_synthesizes_ack() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote).await;

        let outcome = gateway
            .delete_with_offline_support("/invoices", "inv-9", Entity::Invoice)
            .await
            .unwrap();

        assert_eq!(outcome.data, json!({"success": true, "id": "inv-9"}));

        let pending = gateway.pending_operations(None).await.unwrap();
        assert_eq!(pending[0].priority, PRIORITY_DELETE);
        assert_eq!(pending[0].method, HttpMethod::Delete);
        assert!(pending[0].payload.is_none());
    }

    #[tokio::test]
    async fn test_pending_counts_group_by_entity() {
        let remote = Arc::new(StubRemote::new(json!({})));
        let (gateway, _) = gateway_with(false, remote).await;

        gateway
            .post("/customers", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();
        gateway
            .post("/customers/2", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();
        gateway
            .post("/invoices", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();

        let counts = gateway.pending_operation_counts().await.unwrap();
        assert_eq!(counts.get(&Entity::Customer), Some(&2));
        assert_eq!(counts.get(&Entity::Invoice), Some(&1));
        assert_eq!(counts.get(&Entity::WorkOrder), None);
    }

    #[tokio::test]
    async fn test_reconnect_switches_routing() {
        let remote = Arc::new(StubRemote::new(json!({"ok": true})));
        let (gateway, status) = gateway_with(false, remote.clone()).await;

        gateway
            .post("/customers", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();
        assert_eq!(remote.call_count(), 0);

        status.set_online(true);

        let outcome = gateway
            .post("/customers", json!({}), OfflineRequestOptions::new())
            .await
            .unwrap();
        assert!(!outcome.offline_queued);
        assert_eq!(remote.call_count(), 1);
    }
}
