//! Query cache with tag-based invalidation
//!
//! One slot per endpoint holds the last successful fetch result behind an
//! `Arc`, the set of tags it depends on, a stale flag, and a subscriber
//! count. Invalidation is a fan-out over the tag sets: a mutation names the
//! entity identities it touched and every dependent slot goes stale.
//!
//! Optimistic writes are copy-on-write: `patch` clones the current data,
//! applies the change, and swaps in a new `Arc`, handing the previous `Arc`
//! back as the rollback snapshot. `restore` puts that snapshot back
//! verbatim, so a rolled-back slot is field-for-field identical to its
//! pre-patch contents.
//!
//! Every write is published on a broadcast channel so a presentation layer
//! can re-render the affected views.

use crate::error::{CoreError, CoreResult};
use crate::store::EntityStore;
use dispatch_client::{ClientError, ResourceTransport};
use parking_lot::RwLock;
use shared::{Driver, EntityId, ExpandedOrder, Order, User};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

#[cfg(test)]
mod tests;

/// Cache event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Endpoints and tags
// ============================================================================

/// Entity families used in cache tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Order,
    Contact,
    Location,
    Driver,
    User,
}

/// A label describing which entity identities a cached result depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// The whole collection of a kind
    List(EntityKind),
    /// A single entity
    Item(EntityKind, EntityId),
}

/// One (endpoint, argument) pair the dashboard can query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /orders`, normalized into an [`EntityStore`]
    Orders,
    /// `GET /orders?_expand=...`, kept array-shaped
    ExpandedOrders,
    /// `GET /orders/:id?_expand=...`
    OrderDetail(EntityId),
    /// `GET /drivers`
    Drivers,
    /// `GET /users`, normalized
    Users,
}

impl Endpoint {
    /// Request path on the resource store
    pub fn path(&self) -> String {
        match self {
            Self::Orders => "/orders".to_string(),
            Self::ExpandedOrders => {
                "/orders?_expand=contact&_expand=location&_expand=driver".to_string()
            }
            Self::OrderDetail(id) => {
                format!("/orders/{id}?_expand=contact&_expand=location&_expand=driver")
            }
            Self::Drivers => "/drivers".to_string(),
            Self::Users => "/users".to_string(),
        }
    }

    /// Decode and normalize a raw response for this endpoint
    fn decode(&self, value: serde_json::Value) -> Result<CachedData, serde_json::Error> {
        Ok(match self {
            Self::Orders => {
                let rows: Vec<Order> = serde_json::from_value(value)?;
                CachedData::Orders(EntityStore::from_rows(rows))
            }
            Self::ExpandedOrders => CachedData::ExpandedOrders(serde_json::from_value(value)?),
            Self::OrderDetail(_) => CachedData::OrderDetail(serde_json::from_value(value)?),
            Self::Drivers => CachedData::Drivers(serde_json::from_value(value)?),
            Self::Users => {
                let rows: Vec<User> = serde_json::from_value(value)?;
                CachedData::Users(EntityStore::from_rows(rows))
            }
        })
    }

    /// Tags provided by a result: list endpoints carry one item tag per
    /// returned id plus the collection tag, the detail endpoint its own id.
    /// `/drivers` provides none and refreshes only on explicit re-query.
    fn tags_for(&self, data: &CachedData) -> HashSet<Tag> {
        let mut tags = HashSet::new();
        match (self, data) {
            (Self::Orders, CachedData::Orders(store)) => {
                tags.insert(Tag::List(EntityKind::Order));
                for &id in store.ids() {
                    tags.insert(Tag::Item(EntityKind::Order, id));
                }
            }
            (Self::ExpandedOrders, CachedData::ExpandedOrders(rows)) => {
                tags.insert(Tag::List(EntityKind::Order));
                for row in rows {
                    tags.insert(Tag::Item(EntityKind::Order, row.order.id));
                }
            }
            (Self::OrderDetail(id), _) => {
                tags.insert(Tag::Item(EntityKind::Order, *id));
            }
            (Self::Users, CachedData::Users(store)) => {
                tags.insert(Tag::List(EntityKind::User));
                for &id in store.ids() {
                    tags.insert(Tag::Item(EntityKind::User, id));
                }
            }
            _ => {}
        }
        tags
    }
}

// ============================================================================
// Cached data
// ============================================================================

/// The last successful result of one endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum CachedData {
    Orders(EntityStore<Order>),
    ExpandedOrders(Vec<ExpandedOrder>),
    OrderDetail(ExpandedOrder),
    Drivers(Vec<Driver>),
    Users(EntityStore<User>),
}

impl CachedData {
    pub fn as_orders(&self) -> Option<&EntityStore<Order>> {
        match self {
            Self::Orders(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_expanded_orders(&self) -> Option<&[ExpandedOrder]> {
        match self {
            Self::ExpandedOrders(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_order_detail(&self) -> Option<&ExpandedOrder> {
        match self {
            Self::OrderDetail(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_drivers(&self) -> Option<&[Driver]> {
        match self {
            Self::Drivers(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_users(&self) -> Option<&EntityStore<User>> {
        match self {
            Self::Users(store) => Some(store),
            _ => None,
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Change notification published on every cache write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// Slot data replaced: fetch, optimistic patch, or rollback
    Updated(Endpoint),
    /// Slot marked stale by a tag invalidation
    Invalidated(Endpoint),
}

#[derive(Default)]
struct Slot {
    data: Option<Arc<CachedData>>,
    tags: HashSet<Tag>,
    stale: bool,
    subscribers: usize,
}

/// Per-endpoint cache of the last successful fetch result
pub struct QueryCache {
    transport: Arc<dyn ResourceTransport>,
    slots: RwLock<HashMap<Endpoint, Slot>>,
    event_tx: broadcast::Sender<CacheEvent>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("slots", &self.slots.read().len())
            .finish()
    }
}

impl QueryCache {
    pub fn new(transport: Arc<dyn ResourceTransport>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            slots: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Subscribe to cache change notifications
    pub fn subscribe_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.event_tx.subscribe()
    }

    fn notify(&self, event: CacheEvent) {
        // Send fails when nobody listens; that is fine
        let _ = self.event_tx.send(event);
    }

    /// Return the cached result if present and fresh, else fetch and cache
    pub async fn query(&self, endpoint: Endpoint) -> CoreResult<Arc<CachedData>> {
        if let Some(data) = self.fresh(endpoint) {
            tracing::debug!(endpoint = ?endpoint, "Cache hit");
            return Ok(data);
        }
        self.fetch(endpoint).await
    }

    fn fresh(&self, endpoint: Endpoint) -> Option<Arc<CachedData>> {
        let slots = self.slots.read();
        let slot = slots.get(&endpoint)?;
        if slot.stale {
            return None;
        }
        slot.data.clone()
    }

    /// Current slot contents regardless of staleness, without fetching
    pub fn peek(&self, endpoint: Endpoint) -> Option<Arc<CachedData>> {
        self.slots
            .read()
            .get(&endpoint)
            .and_then(|slot| slot.data.clone())
    }

    async fn fetch(&self, endpoint: Endpoint) -> CoreResult<Arc<CachedData>> {
        let raw = self.transport.get_json(&endpoint.path()).await?;
        let data = endpoint
            .decode(raw)
            .map_err(|e| CoreError::Network(ClientError::Serialization(e)))?;
        let tags = endpoint.tags_for(&data);
        let data = Arc::new(data);
        {
            let mut slots = self.slots.write();
            let slot = slots.entry(endpoint).or_default();
            slot.data = Some(data.clone());
            slot.tags = tags;
            slot.stale = false;
        }
        tracing::debug!(endpoint = ?endpoint, "Cache filled");
        self.notify(CacheEvent::Updated(endpoint));
        Ok(data)
    }

    /// Register an active consumer of an endpoint
    pub fn subscribe(&self, endpoint: Endpoint) {
        self.slots.write().entry(endpoint).or_default().subscribers += 1;
    }

    /// Drop an active consumer
    pub fn unsubscribe(&self, endpoint: Endpoint) {
        if let Some(slot) = self.slots.write().get_mut(&endpoint) {
            slot.subscribers = slot.subscribers.saturating_sub(1);
        }
    }

    /// Mark every slot whose tag set intersects `tags` as stale.
    ///
    /// Returns the stale endpoints that currently have subscribers; the
    /// mutation layer refetches exactly those after a commit.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<Endpoint> {
        let mut invalidated = Vec::new();
        let mut to_refetch = Vec::new();
        {
            let mut slots = self.slots.write();
            for (&endpoint, slot) in slots.iter_mut() {
                if slot.data.is_some() && tags.iter().any(|tag| slot.tags.contains(tag)) {
                    slot.stale = true;
                    invalidated.push(endpoint);
                    if slot.subscribers > 0 {
                        to_refetch.push(endpoint);
                    }
                }
            }
        }
        for &endpoint in &invalidated {
            tracing::debug!(endpoint = ?endpoint, "Slot invalidated");
            self.notify(CacheEvent::Invalidated(endpoint));
        }
        to_refetch
    }

    /// Refetch the given endpoints; a slot keeps its stale data when the
    /// refetch fails.
    pub async fn refetch(&self, endpoints: &[Endpoint]) {
        for &endpoint in endpoints {
            if let Err(error) = self.fetch(endpoint).await {
                tracing::warn!(endpoint = ?endpoint, error = %error, "Refetch failed, keeping stale data");
            }
        }
    }

    /// Copy-on-write optimistic patch.
    ///
    /// Returns the slot's previous contents as the rollback snapshot, or
    /// `None` when the slot held no data (the patch is then a silent no-op).
    pub(crate) fn patch(
        &self,
        endpoint: Endpoint,
        apply: impl FnOnce(&mut CachedData),
    ) -> Option<Arc<CachedData>> {
        let prior = {
            let mut slots = self.slots.write();
            let slot = slots.get_mut(&endpoint)?;
            let prior = slot.data.clone()?;
            let mut next = (*prior).clone();
            apply(&mut next);
            slot.data = Some(Arc::new(next));
            prior
        };
        tracing::debug!(endpoint = ?endpoint, "Optimistic patch applied");
        self.notify(CacheEvent::Updated(endpoint));
        Some(prior)
    }

    /// Put a rollback snapshot back verbatim
    pub(crate) fn restore(&self, endpoint: Endpoint, snapshot: Arc<CachedData>) {
        {
            let mut slots = self.slots.write();
            if let Some(slot) = slots.get_mut(&endpoint) {
                slot.data = Some(snapshot);
            }
        }
        tracing::debug!(endpoint = ?endpoint, "Optimistic patch rolled back");
        self.notify(CacheEvent::Updated(endpoint));
    }
}
