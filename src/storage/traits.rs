//! Collaborator interfaces backed by the host application's storage
//!
//! Implementations own users, roles and tokens. Each service reports its own
//! error values and tells the core which of them mean "not found" through
//! `is_not_found`, so distinct backends never share one error identity.

use async_trait::async_trait;

use crate::auth::token::Token;
use crate::auth::user::{Account, Role, User};
use crate::error::BoxError;

/// User lookup and provisioning
#[async_trait]
pub trait UserService: Send + Sync {
    /// Find a user by its stable identifier
    async fn find_one_by_id(&self, id: &str) -> Result<Box<dyn User>, BoxError>;

    /// Find a user by its identity attribute (email or username)
    async fn find_one_by_identity(&self, identity: &str) -> Result<Box<dyn User>, BoxError>;

    /// Create a user from a freshly authenticated account
    async fn create_one_by_account(&self, account: &dyn Account) -> Result<Box<dyn User>, BoxError>;

    /// Whether an error returned by this service means the user does not exist
    fn is_not_found(&self, err: &BoxError) -> bool;
}

/// Role lookup
#[async_trait]
pub trait RoleService: Send + Sync {
    /// Resolve role identifiers; fails when none of them resolve
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Role>, BoxError>;

    fn is_not_found(&self, _err: &BoxError) -> bool {
        false
    }
}

/// Token persistence
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn find_one_by_id(&self, id: &str) -> Result<Token, BoxError>;

    async fn store(&self, token: &Token) -> Result<(), BoxError>;

    fn is_not_found(&self, _err: &BoxError) -> bool {
        false
    }
}
