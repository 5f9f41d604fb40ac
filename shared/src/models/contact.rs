//! Contact model

use crate::{EntityId, Keyed};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A contact person as stored in `/contacts`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Keyed for Contact {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// POST body for `/contacts`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[validate(length(min = 1, message = "contact name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
