//! Driver model with optional position telemetry

use crate::{EntityId, Keyed};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A driver as stored in `/drivers`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub vehicle_features: BTreeSet<String>,
    /// Live track telemetry, present while the driver is en route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geojson: Option<DriverTrack>,
}

impl Keyed for Driver {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Current position plus the historical path of a driver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverTrack {
    pub current: TrackPoint,
    #[serde(default)]
    pub path: Vec<TrackPoint>,
    /// Route completion percentage, 0-100
    #[serde(default)]
    pub progress: f64,
}

/// A single telemetry point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
}
