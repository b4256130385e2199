use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved user, owned and produced by the external user service
pub trait User: Send + Sync + fmt::Debug {
    /// Stable identifier, used as the token subject
    fn id(&self) -> &str;

    /// Identity attribute (email or username)
    fn identity(&self) -> &str;

    /// Display name snapshotted into issued claims
    fn name(&self) -> &str {
        ""
    }

    /// Role identifiers, resolved to abilities by the role service
    fn roles(&self) -> &[String];

    /// Additional attributes captured into the claims at issuance time
    fn extra_claims(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }
}

/// Identity produced by a driver from raw login credentials
pub trait Account: Send + Sync + fmt::Debug {
    /// Identity attribute; an empty value means the login cannot proceed
    fn identity(&self) -> &str;

    fn name(&self) -> &str {
        ""
    }
}

/// Permission grant: an action pattern and an object pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    pub action: String,
    pub object: String,
}

impl Ability {
    pub fn new(action: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            object: object.into(),
        }
    }

    /// Abilities with an empty action or object never match
    pub fn is_eligible(&self) -> bool {
        !self.action.is_empty() && !self.object.is_empty()
    }
}

/// A named, ordered set of abilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub abilities: Vec<Ability>,
}

impl Role {
    pub fn new(id: impl Into<String>, abilities: Vec<Ability>) -> Self {
        Self {
            id: id.into(),
            abilities,
        }
    }
}

/// Minimal account for drivers that only learn an email and a display name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAccount {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl EmailAccount {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: String::new(),
        }
    }
}

impl Account for EmailAccount {
    fn identity(&self) -> &str {
        &self.email
    }

    fn name(&self) -> &str {
        &self.name
    }
}
