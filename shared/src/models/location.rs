//! Location model

use crate::{EntityId, Keyed};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A delivery location as stored in `/locations`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: EntityId,
    pub location_name: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Keyed for Location {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// POST body for `/locations`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    #[validate(length(min = 1, message = "location name is required"))]
    pub location_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}
