//! Shared domain types for the dispatch dashboard
//!
//! Wire-format structs matching the REST resource store's JSON documents,
//! plus the input and patch types used by the mutation layer.

pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    Contact, Driver, DriverTrack, ExpandedOrder, Load, Location, NewContact, NewLocation,
    NewOrder, NewOrderForm, Order, OrderPatch, OrderType, Priority, TimeWindow, TrackPoint,
    User, UserPatch,
};

/// Entity identifier assigned by the backing store
pub type EntityId = i64;

/// Anything addressable by a store-assigned id
pub trait Keyed {
    fn id(&self) -> EntityId;
}
