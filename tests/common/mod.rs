#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use rusty_gate::auth::token::Token;
use rusty_gate::auth::user::{Ability, Account, EmailAccount, Role};
use rusty_gate::config::GateConfig;
use rusty_gate::drivers::password::{PasswordDriver, PasswordHandler};
use rusty_gate::error::BoxError;
use rusty_gate::storage::memory::{
    MemoryRoleService, MemoryTokenService, MemoryUserService, StoredUser,
};
use rusty_gate::storage::traits::{RoleService, TokenService};
use rusty_gate::storage::Services;
use rusty_gate::Gate;

pub const SECRET: &str = "7c1e0b9d-gate-integration-key-8812";
pub const PASSWORD: &str = "hunter2";

/// Accepts any email as long as the password is right
pub struct StaticPassword;

#[async_trait]
impl PasswordHandler for StaticPassword {
    async fn login(&self, email: &str, password: &str) -> Result<Box<dyn Account>, BoxError> {
        if password != PASSWORD {
            return Err("invalid email or password".into());
        }
        Ok(Box::new(EmailAccount::new(email)))
    }
}

pub struct FailingTokenService;

#[async_trait]
impl TokenService for FailingTokenService {
    async fn find_one_by_id(&self, _id: &str) -> Result<Token, BoxError> {
        Err("token store unavailable".into())
    }

    async fn store(&self, _token: &Token) -> Result<(), BoxError> {
        Err("token store unavailable".into())
    }
}

pub struct FailingRoleService;

#[async_trait]
impl RoleService for FailingRoleService {
    async fn find_by_ids(&self, _ids: &[String]) -> Result<Vec<Role>, BoxError> {
        Err("role store unavailable".into())
    }
}

pub fn config() -> GateConfig {
    GateConfig::hmac(SECRET, Duration::from_secs(3600))
}

pub struct Fixture {
    pub users: Arc<MemoryUserService>,
    pub roles: Arc<MemoryRoleService>,
    pub tokens: Arc<MemoryTokenService>,
}

impl Fixture {
    /// Memory collaborators seeded with an admin role and user
    pub async fn new() -> Self {
        let users = Arc::new(MemoryUserService::new().with_default_roles(vec!["user".to_string()]));
        let roles = Arc::new(MemoryRoleService::new());
        let tokens = Arc::new(MemoryTokenService::new());

        roles
            .insert(Role::new(
                "admin",
                vec![
                    Ability::new("GET", "/api/v1/*"),
                    Ability::new("GET", "*"),
                ],
            ))
            .await;
        roles
            .insert(Role::new("user", vec![Ability::new("GET", "/api/v1/users/*")]))
            .await;

        users
            .insert(StoredUser::new("id:foo@local", "foo@local", vec!["admin".to_string()]))
            .await;

        Self {
            users,
            roles,
            tokens,
        }
    }

    pub fn services(&self) -> Services {
        Services::new(self.users.clone(), self.tokens.clone(), self.roles.clone())
    }

    pub fn gate(&self) -> Gate<PasswordDriver> {
        Gate::new(PasswordDriver::new(StaticPassword), &config(), self.services())
            .expect("valid gate configuration")
    }
}
