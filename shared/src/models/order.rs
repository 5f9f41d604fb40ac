//! Order model and its input/patch companions
//!
//! `Order` mirrors the `/orders` documents one-to-one. `OrderPatch` doubles
//! as the PATCH body (absent fields are skipped on the wire) and as the
//! merge payload for optimistic cache updates.

use super::{Contact, Driver, Location, NewContact, NewLocation};
use crate::{EntityId, Keyed};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Enums
// ============================================================================

/// Order category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OrderType {
    #[default]
    Delivery,
    Pickup,
    Service,
}

/// Dispatch priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

// ============================================================================
// Nested value types
// ============================================================================

/// A single load line on an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    #[serde(default)]
    pub load_number: u32,
    /// Weight in kilograms
    pub weight: f64,
    /// Volume in cubic meters
    pub volume: f64,
}

/// Delivery time window, instants in UTC
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

// ============================================================================
// Order
// ============================================================================

/// A delivery order as stored in `/orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order ID (assigned by the store)
    pub id: EntityId,
    pub order_type: OrderType,
    pub priority: Priority,
    /// Whether the order shows up on the map
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub barcode: String,
    pub location_id: EntityId,
    pub contact_id: EntityId,
    pub driver_id: EntityId,
    /// Scheduled date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Expected on-site duration in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loads: Vec<Load>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<TimeWindow>,
    /// Map pin color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Keyed for Order {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Partial update for an order, also usable as a PATCH body
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loads: Option<Vec<Load>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_windows: Option<Vec<TimeWindow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl OrderPatch {
    /// Merge every present field into `order`
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(order_type) = self.order_type {
            order.order_type = order_type;
        }
        if let Some(priority) = self.priority {
            order.priority = priority;
        }
        if let Some(active) = self.active {
            order.active = active;
        }
        if let Some(notes) = &self.notes {
            order.notes = notes.clone();
        }
        if let Some(barcode) = &self.barcode {
            order.barcode = barcode.clone();
        }
        if let Some(driver_id) = self.driver_id {
            order.driver_id = driver_id;
        }
        if let Some(date) = self.date {
            order.date = Some(date);
        }
        if let Some(duration) = self.duration {
            order.duration = Some(duration);
        }
        if let Some(loads) = &self.loads {
            order.loads = loads.clone();
        }
        if let Some(time_windows) = &self.time_windows {
            order.time_windows = time_windows.clone();
        }
        if let Some(color) = &self.color {
            order.color = Some(color.clone());
        }
    }

    /// Patch that only toggles the active flag
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }
}

// ============================================================================
// Expanded view
// ============================================================================

/// An order with its related rows embedded, as returned by
/// `?_expand=contact&_expand=location&_expand=driver`
///
/// Read-only composite: never mutated locally except through the optimistic
/// patch mechanism in the cache layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedOrder {
    #[serde(flatten)]
    pub order: Order,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
}

impl Keyed for ExpandedOrder {
    fn id(&self) -> EntityId {
        self.order.id
    }
}

// ============================================================================
// Create inputs
// ============================================================================

/// POST body for `/orders` (full object minus the id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_type: OrderType,
    pub priority: Priority,
    pub active: bool,
    pub notes: String,
    pub barcode: String,
    pub location_id: EntityId,
    pub contact_id: EntityId,
    pub driver_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub loads: Vec<Load>,
    pub time_windows: Vec<TimeWindow>,
}

/// Operator input for the three-step order creation
/// (contact, then location, then the order referencing both)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderForm {
    #[validate(nested)]
    pub contact: NewContact,
    #[validate(nested)]
    pub location: NewLocation,
    #[validate(range(min = 1, message = "a driver must be assigned"))]
    pub driver_id: EntityId,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub loads: Vec<Load>,
    #[serde(default)]
    pub time_windows: Vec<TimeWindow>,
}

impl NewOrderForm {
    /// Build the final POST body once the contact and location ids exist.
    /// New orders are always created active.
    pub fn into_order_body(self, contact_id: EntityId, location_id: EntityId) -> NewOrder {
        NewOrder {
            order_type: self.order_type,
            priority: self.priority,
            active: true,
            notes: self.notes,
            barcode: self.barcode,
            location_id,
            contact_id,
            driver_id: self.driver_id,
            date: self.date,
            duration: self.duration,
            loads: self.loads,
            time_windows: self.time_windows,
        }
    }
}
