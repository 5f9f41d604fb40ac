//! Dashboard state facade
//!
//! Wires the transport into the query cache and mutation manager and exposes
//! typed reads. A presentation layer holds one of these plus a
//! [`crate::map::MapSyncBridge`] around its map widget; selector-driven
//! views read `Arc` snapshots through [`QueryCache::peek`] instead.

use crate::cache::{CacheEvent, CachedData, Endpoint, QueryCache};
use crate::config::DashboardConfig;
use crate::error::{CoreError, CoreResult};
use crate::mutation::MutationManager;
use dispatch_client::{ResourceTransport, RestHttpClient};
use shared::{Driver, EntityId, ExpandedOrder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Everything the dashboard holds between the store and the UI
pub struct DashboardState {
    config: DashboardConfig,
    cache: Arc<QueryCache>,
    mutations: MutationManager,
}

impl DashboardState {
    /// Wire the cache and mutation layers over an injected transport
    pub fn initialize(config: DashboardConfig, transport: Arc<dyn ResourceTransport>) -> Self {
        let cache = Arc::new(QueryCache::new(transport.clone()));
        let mutations = MutationManager::new(cache.clone(), transport);
        tracing::info!(base_url = %config.base_url, "Dashboard state initialized");
        Self {
            config,
            cache,
            mutations,
        }
    }

    /// Connect to `config.base_url` over HTTP
    pub fn connect(config: DashboardConfig) -> CoreResult<Self> {
        let client = RestHttpClient::with_timeout(
            &config.base_url,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Ok(Self::initialize(config, Arc::new(client)))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn mutations(&self) -> &MutationManager {
        &self.mutations
    }

    /// Subscribe to cache change notifications
    pub fn subscribe_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe_events()
    }

    // ============ Typed reads ============

    /// Normalized orders snapshot, fetched on first use.
    /// Selector-driven views should hold on to the returned `Arc`.
    pub async fn orders(&self) -> CoreResult<Arc<CachedData>> {
        self.cache.query(Endpoint::Orders).await
    }

    /// Expanded orders with contact, location and driver embedded
    pub async fn expanded_orders(&self) -> CoreResult<Vec<ExpandedOrder>> {
        let data = self.cache.query(Endpoint::ExpandedOrders).await?;
        match data.as_expanded_orders() {
            Some(rows) => Ok(rows.to_vec()),
            None => Err(CoreError::Internal(
                "unexpected cache shape for expanded orders".into(),
            )),
        }
    }

    /// One order with its related rows embedded
    pub async fn order_detail(&self, id: EntityId) -> CoreResult<ExpandedOrder> {
        let data = self.cache.query(Endpoint::OrderDetail(id)).await?;
        match data.as_order_detail() {
            Some(row) => Ok(row.clone()),
            None => Err(CoreError::Internal(
                "unexpected cache shape for order detail".into(),
            )),
        }
    }

    /// All drivers
    pub async fn drivers(&self) -> CoreResult<Vec<Driver>> {
        let data = self.cache.query(Endpoint::Drivers).await?;
        match data.as_drivers() {
            Some(rows) => Ok(rows.to_vec()),
            None => Err(CoreError::Internal(
                "unexpected cache shape for drivers".into(),
            )),
        }
    }

    /// Normalized users snapshot (legacy variant)
    pub async fn users(&self) -> CoreResult<Arc<CachedData>> {
        self.cache.query(Endpoint::Users).await
    }
}
