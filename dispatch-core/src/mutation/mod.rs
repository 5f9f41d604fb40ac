//! Mutation pipeline with optimistic cache updates
//!
//! # Write flow
//!
//! ```text
//! mutate(...)
//!     ├─ 1. Validate the input (no network call on failure)
//!     ├─ 2. Take the write lock (apply/rollback stay in call order)
//!     ├─ 3. Apply the optimistic patch, keep the prior snapshot
//!     ├─ 4. Issue the network call
//!     ├─ 5a. Success: drop the snapshots, invalidate tags, refetch
//!     │      stale slots with subscribers
//!     └─ 5b. Failure: restore the snapshots, then surface the error
//! ```
//!
//! The optimistic patch is applied and visible to consumers strictly before
//! the network call is issued; a rollback completes strictly before the
//! failure reaches the caller, so no consumer ever observes a pending
//! optimistic value together with a failure notification.

use crate::cache::{CachedData, Endpoint, EntityKind, QueryCache, Tag};
use crate::error::{CoreError, CoreResult, CreateStep};
use dispatch_client::{ClientError, ResourceTransport};
use serde::de::DeserializeOwned;
use shared::{
    Contact, EntityId, Location, NewContact, NewLocation, NewOrderForm, Order, OrderPatch, User,
    UserPatch,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

#[cfg(test)]
mod tests;

/// Lifecycle of one mutation invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationPhase {
    Pending,
    Committed,
    RolledBack,
}

/// Snapshots taken before optimistic patches, in apply order
struct OptimisticWrite<'a> {
    cache: &'a QueryCache,
    applied: Vec<(Endpoint, Arc<CachedData>)>,
}

impl<'a> OptimisticWrite<'a> {
    fn new(cache: &'a QueryCache) -> Self {
        Self {
            cache,
            applied: Vec::new(),
        }
    }

    /// Apply a patch and remember the prior slot contents. An unpopulated
    /// slot is left untouched and nothing is recorded for it.
    fn apply(&mut self, endpoint: Endpoint, patch: impl FnOnce(&mut CachedData)) {
        if let Some(prior) = self.cache.patch(endpoint, patch) {
            self.applied.push((endpoint, prior));
        }
    }

    /// The optimistic state is confirmed; forget the snapshots
    fn commit(mut self) {
        self.applied.clear();
    }

    /// Restore every snapshot, most recent first
    fn rollback(mut self) {
        while let Some((endpoint, snapshot)) = self.applied.pop() {
            self.cache.restore(endpoint, snapshot);
        }
    }
}

/// Executes writes against the resource store with optimistic cache updates
/// and automatic rollback
pub struct MutationManager {
    cache: Arc<QueryCache>,
    transport: Arc<dyn ResourceTransport>,
    /// Serializes optimistic apply/rollback across invocations
    write_lock: Mutex<()>,
}

impl MutationManager {
    pub fn new(cache: Arc<QueryCache>, transport: Arc<dyn ResourceTransport>) -> Self {
        Self {
            cache,
            transport,
            write_lock: Mutex::new(()),
        }
    }

    async fn post_as<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ClientError> {
        let value = self
            .transport
            .post_json(path, serde_json::to_value(body)?)
            .await?;
        serde_json::from_value(value).map_err(ClientError::from)
    }

    async fn patch_as<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ClientError> {
        let value = self
            .transport
            .patch_json(path, serde_json::to_value(body)?)
            .await?;
        serde_json::from_value(value).map_err(ClientError::from)
    }

    /// Invalidate and immediately refetch the stale slots somebody watches
    async fn invalidate_and_refetch(&self, tags: &[Tag]) {
        let stale = self.cache.invalidate(tags);
        self.cache.refetch(&stale).await;
    }

    // ============ Creates ============

    /// Create a contact. No optimistic patch: the id is store-assigned.
    pub async fn add_contact(&self, input: NewContact) -> CoreResult<Contact> {
        input.validate()?;
        let contact: Contact = self.post_as("/contacts", &input).await?;
        self.invalidate_and_refetch(&[Tag::List(EntityKind::Contact)])
            .await;
        tracing::info!(contact_id = contact.id, "Contact created");
        Ok(contact)
    }

    /// Create a location. No optimistic patch: the id is store-assigned.
    pub async fn add_location(&self, input: NewLocation) -> CoreResult<Location> {
        input.validate()?;
        let location: Location = self.post_as("/locations", &input).await?;
        self.invalidate_and_refetch(&[Tag::List(EntityKind::Location)])
            .await;
        tracing::info!(location_id = location.id, "Location created");
        Ok(location)
    }

    /// Three-step create: contact, then location, then the order referencing
    /// both ids. A failed step aborts the remaining ones; nothing is
    /// invalidated and no optimistic state is committed for the composite.
    pub async fn add_order(&self, form: NewOrderForm) -> CoreResult<Order> {
        form.validate()?;
        let mutation_id = Uuid::new_v4();
        let _guard = self.write_lock.lock().await;
        tracing::debug!(mutation = %mutation_id, phase = ?MutationPhase::Pending, "addOrder started");

        let contact: Contact = self
            .post_as("/contacts", &form.contact)
            .await
            .map_err(|source| CoreError::PartialCreate {
                step: CreateStep::Contact,
                source,
            })?;
        let location: Location = self
            .post_as("/locations", &form.location)
            .await
            .map_err(|source| CoreError::PartialCreate {
                step: CreateStep::Location,
                source,
            })?;
        let body = form.into_order_body(contact.id, location.id);
        let order: Order = self
            .post_as("/orders", &body)
            .await
            .map_err(|source| CoreError::PartialCreate {
                step: CreateStep::Order,
                source,
            })?;

        // The store assigned the id; mirror the new row into the normalized
        // slot so it lists before the refetch lands
        let inserted = order.clone();
        self.cache.patch(Endpoint::Orders, move |data| {
            if let CachedData::Orders(store) = data {
                store.add_one(inserted);
            }
        });

        self.invalidate_and_refetch(&[Tag::List(EntityKind::Order)])
            .await;
        tracing::info!(
            mutation = %mutation_id,
            order_id = order.id,
            phase = ?MutationPhase::Committed,
            "Order created"
        );
        Ok(order)
    }

    // ============ Updates ============

    /// PATCH an order with an optimistic merge into the normalized slot
    pub async fn update_order(&self, id: EntityId, patch: OrderPatch) -> CoreResult<Order> {
        let mutation_id = Uuid::new_v4();
        let _guard = self.write_lock.lock().await;
        tracing::debug!(mutation = %mutation_id, order_id = id, phase = ?MutationPhase::Pending, "updateOrder started");

        let mut write = OptimisticWrite::new(&self.cache);
        let merge = patch.clone();
        write.apply(Endpoint::Orders, move |data| {
            if let CachedData::Orders(store) = data {
                store.update_one(id, |order| merge.apply_to(order));
            }
        });

        match self.patch_as::<Order>(&format!("/orders/{id}"), &patch).await {
            Ok(order) => {
                write.commit();
                self.invalidate_and_refetch(&[Tag::Item(EntityKind::Order, id)])
                    .await;
                tracing::info!(mutation = %mutation_id, order_id = id, phase = ?MutationPhase::Committed, "Order updated");
                Ok(order)
            }
            Err(error) => {
                write.rollback();
                tracing::warn!(
                    mutation = %mutation_id,
                    order_id = id,
                    phase = ?MutationPhase::RolledBack,
                    error = %error,
                    "Order update failed"
                );
                Err(error.into())
            }
        }
    }

    /// Toggle the active flag of an order.
    ///
    /// `current` is the flag as currently rendered by the caller. The
    /// optimistic patch targets the expanded (denormalized) caches the list
    /// and detail views read from, not the normalized store.
    pub async fn change_active(&self, id: EntityId, current: bool) -> CoreResult<Order> {
        let mutation_id = Uuid::new_v4();
        let _guard = self.write_lock.lock().await;
        tracing::debug!(mutation = %mutation_id, order_id = id, phase = ?MutationPhase::Pending, "changeActive started");

        let body = OrderPatch::active(!current);
        let mut write = OptimisticWrite::new(&self.cache);
        let merge = body.clone();
        write.apply(Endpoint::ExpandedOrders, move |data| {
            if let CachedData::ExpandedOrders(rows) = data {
                if let Some(row) = rows.iter_mut().find(|row| row.order.id == id) {
                    merge.apply_to(&mut row.order);
                }
            }
        });
        let merge = body.clone();
        write.apply(Endpoint::OrderDetail(id), move |data| {
            if let CachedData::OrderDetail(row) = data {
                merge.apply_to(&mut row.order);
            }
        });

        match self.patch_as::<Order>(&format!("/orders/{id}"), &body).await {
            Ok(order) => {
                write.commit();
                self.invalidate_and_refetch(&[Tag::Item(EntityKind::Order, id)])
                    .await;
                tracing::info!(
                    mutation = %mutation_id,
                    order_id = id,
                    active = !current,
                    phase = ?MutationPhase::Committed,
                    "Order active flag toggled"
                );
                Ok(order)
            }
            Err(error) => {
                write.rollback();
                tracing::warn!(
                    mutation = %mutation_id,
                    order_id = id,
                    phase = ?MutationPhase::RolledBack,
                    error = %error,
                    "Active toggle failed"
                );
                Err(error.into())
            }
        }
    }

    /// Toggle a user's active flag in the legacy `/users` collection; the
    /// optimistic patch targets the normalized users slot.
    pub async fn change_user_active(&self, id: EntityId, current: bool) -> CoreResult<User> {
        let mutation_id = Uuid::new_v4();
        let _guard = self.write_lock.lock().await;

        let body = UserPatch::active(!current);
        let mut write = OptimisticWrite::new(&self.cache);
        let merge = body.clone();
        write.apply(Endpoint::Users, move |data| {
            if let CachedData::Users(store) = data {
                store.update_one(id, |user| merge.apply_to(user));
            }
        });

        match self.patch_as::<User>(&format!("/users/{id}"), &body).await {
            Ok(user) => {
                write.commit();
                self.invalidate_and_refetch(&[Tag::Item(EntityKind::User, id)])
                    .await;
                tracing::info!(mutation = %mutation_id, user_id = id, phase = ?MutationPhase::Committed, "User active flag toggled");
                Ok(user)
            }
            Err(error) => {
                write.rollback();
                tracing::warn!(mutation = %mutation_id, user_id = id, phase = ?MutationPhase::RolledBack, error = %error, "User toggle failed");
                Err(error.into())
            }
        }
    }

    // ============ Deletes ============

    /// DELETE an order with an optimistic removal from the normalized slot;
    /// a failed call re-inserts the removed entity's last-known snapshot.
    pub async fn delete_order(&self, id: EntityId) -> CoreResult<()> {
        let mutation_id = Uuid::new_v4();
        let _guard = self.write_lock.lock().await;
        tracing::debug!(mutation = %mutation_id, order_id = id, phase = ?MutationPhase::Pending, "deleteOrder started");

        let mut write = OptimisticWrite::new(&self.cache);
        write.apply(Endpoint::Orders, move |data| {
            if let CachedData::Orders(store) = data {
                store.remove_one(id);
            }
        });

        match self.transport.delete_json(&format!("/orders/{id}")).await {
            Ok(_) => {
                write.commit();
                self.invalidate_and_refetch(&[Tag::Item(EntityKind::Order, id)])
                    .await;
                tracing::info!(mutation = %mutation_id, order_id = id, phase = ?MutationPhase::Committed, "Order deleted");
                Ok(())
            }
            Err(error) => {
                write.rollback();
                tracing::warn!(
                    mutation = %mutation_id,
                    order_id = id,
                    phase = ?MutationPhase::RolledBack,
                    error = %error,
                    "Order delete failed"
                );
                Err(error.into())
            }
        }
    }
}
