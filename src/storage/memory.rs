//! In-memory storage implementation for development and testing
//!
//! This provides complete user, role and token collaborators that keep all
//! data in memory. Suitable for development, testing, or small deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{RoleService, TokenService, UserService};
use crate::auth::token::Token;
use crate::auth::user::{Account, Role, User};
use crate::error::BoxError;

/// Errors raised by the in-memory collaborators
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Duplicate(String),
}

fn is_memory_not_found(err: &BoxError) -> bool {
    matches!(
        err.downcast_ref::<MemoryStoreError>(),
        Some(MemoryStoreError::NotFound(_))
    )
}

/// User record kept by [`MemoryUserService`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: String::new(),
            roles,
            created_at: Utc::now(),
        }
    }
}

impl User for StoredUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn identity(&self) -> &str {
        &self.email
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn roles(&self) -> &[String] {
        &self.roles
    }
}

/// In-memory user service
#[derive(Default)]
pub struct MemoryUserService {
    users: Arc<RwLock<HashMap<String, StoredUser>>>,
    // identity -> user id
    identities: Arc<RwLock<HashMap<String, String>>>,
    default_roles: Vec<String>,
}

impl MemoryUserService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles granted to users created from an account
    pub fn with_default_roles(mut self, roles: Vec<String>) -> Self {
        self.default_roles = roles;
        self
    }

    /// Insert or replace a user record
    pub async fn insert(&self, user: StoredUser) {
        self.identities
            .write()
            .await
            .insert(user.email.clone(), user.id.clone());
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserService for MemoryUserService {
    async fn find_one_by_id(&self, id: &str) -> Result<Box<dyn User>, BoxError> {
        match self.users.read().await.get(id) {
            Some(user) => Ok(Box::new(user.clone())),
            None => Err(MemoryStoreError::NotFound(format!("User {}", id)).into()),
        }
    }

    async fn find_one_by_identity(&self, identity: &str) -> Result<Box<dyn User>, BoxError> {
        let id = self
            .identities
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| MemoryStoreError::NotFound(format!("User {}", identity)))?;

        self.find_one_by_id(&id).await
    }

    async fn create_one_by_account(&self, account: &dyn Account) -> Result<Box<dyn User>, BoxError> {
        let mut identities = self.identities.write().await;
        // A concurrent login may have created the user already
        if let Some(id) = identities.get(account.identity()) {
            if let Some(user) = self.users.read().await.get(id) {
                return Ok(Box::new(user.clone()));
            }
        }

        let mut user = StoredUser::new(
            Uuid::new_v4().to_string(),
            account.identity(),
            self.default_roles.clone(),
        );
        user.name = account.name().to_string();

        identities.insert(user.email.clone(), user.id.clone());
        self.users.write().await.insert(user.id.clone(), user.clone());

        info!("User created: {}", user.id);
        Ok(Box::new(user))
    }

    fn is_not_found(&self, err: &BoxError) -> bool {
        is_memory_not_found(err)
    }
}

/// In-memory role service
#[derive(Default)]
pub struct MemoryRoleService {
    roles: Arc<RwLock<HashMap<String, Role>>>,
}

impl MemoryRoleService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, role: Role) {
        self.roles.write().await.insert(role.id.clone(), role);
    }
}

#[async_trait]
impl RoleService for MemoryRoleService {
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Role>, BoxError> {
        let roles = self.roles.read().await;
        let found: Vec<Role> = ids.iter().filter_map(|id| roles.get(id)).cloned().collect();

        if found.is_empty() {
            return Err(MemoryStoreError::NotFound(format!("Roles {:?}", ids)).into());
        }

        Ok(found)
    }

    fn is_not_found(&self, err: &BoxError) -> bool {
        is_memory_not_found(err)
    }
}

/// In-memory token service
#[derive(Default)]
pub struct MemoryTokenService {
    tokens: Arc<RwLock<HashMap<String, Token>>>,
}

impl MemoryTokenService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenService for MemoryTokenService {
    async fn find_one_by_id(&self, id: &str) -> Result<Token, BoxError> {
        self.tokens
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| MemoryStoreError::NotFound(format!("Token {}", id)).into())
    }

    async fn store(&self, token: &Token) -> Result<(), BoxError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(MemoryStoreError::Duplicate(format!("Token {}", token.id)).into());
        }

        tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    fn is_not_found(&self, err: &BoxError) -> bool {
        is_memory_not_found(err)
    }
}
