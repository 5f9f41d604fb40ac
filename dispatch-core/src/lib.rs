//! Client-side cache and synchronization core for the dispatch dashboard
//!
//! This crate owns the state between a REST resource store and a
//! presentation layer:
//!
//! - [`store::EntityStore`]: normalized, id-keyed collections with a
//!   canonical newest-first ordering
//! - [`cache::QueryCache`]: per-endpoint result cache with tag-based
//!   invalidation and change broadcasts
//! - [`mutation::MutationManager`]: writes with optimistic cache patches,
//!   commit/rollback, and a three-step order creation
//! - [`select`]: memoized projections that recompute only when their
//!   declared inputs change
//! - [`map::MapSyncBridge`]: marker reconciliation and camera framing over
//!   an injected map surface
//!
//! # Data flow
//!
//! ```text
//! query(endpoint)
//!     ├─ cache hit  → cached Arc
//!     └─ cache miss → transport → normalize → tag → cache → Arc
//! mutate(...)
//!     ├─ optimistic patch (visible before the network call)
//!     ├─ network call
//!     ├─ ok  → commit, invalidate tags, refetch subscribed slots
//!     └─ err → restore snapshots, surface the error
//! selectors(Arc) → minimal id-list projections, memoized by Arc identity
//! map bridge    → add/move/remove markers, fit bounds
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod map;
pub mod mutation;
pub mod select;
pub mod state;
pub mod store;

pub use cache::{CacheEvent, CachedData, Endpoint, EntityKind, QueryCache, Tag};
pub use config::DashboardConfig;
pub use error::{CoreError, CoreResult, CreateStep};
pub use map::{
    DEFAULT_BOUNDS, FitOptions, LngLat, LngLatBounds, MapStyle, MapSurface, MapSyncBridge,
    MarkerHandle, MarkerSpec, calc_bounds, driver_markers, order_markers,
};
pub use mutation::MutationManager;
pub use select::{
    DriverOrdersSelector, ExpandedOrdersSelector, HighPrioritySelector, OrderSearchSelector,
    UserSearchSelector,
};
pub use state::DashboardState;
pub use store::EntityStore;
