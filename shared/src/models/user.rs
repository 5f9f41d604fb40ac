//! Legacy user model
//!
//! Earlier dashboard variants listed generic users instead of orders; the
//! `/users` collection is still served and toggled the same way.

use crate::{EntityId, Keyed};
use serde::{Deserialize, Serialize};

/// A user as stored in `/users`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Keyed for User {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Partial update for a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl UserPatch {
    /// Merge every present field into `user`
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(active) = self.active {
            user.active = active;
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
