//! Pluggable login drivers
//!
//! A driver turns raw login credentials into an authenticated account. The
//! orchestrator checks that the driver's required keys are present, then hands
//! the whole map over; format validation belongs to the driver.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::auth::user::Account;
use crate::error::{GateError, Result};

/// Flat string-keyed login input, e.g. `{"email": .., "password": ..}`
pub type Credentials = HashMap<String, String>;

#[async_trait]
pub trait Driver: Send + Sync {
    /// Get the driver name for logging/debugging
    fn name(&self) -> &'static str;

    /// Credential keys that must be present before `resolve` is called
    fn required_credentials(&self) -> &'static [&'static str];

    /// Resolve raw credentials into an account
    async fn resolve(&self, credentials: &Credentials) -> Result<Box<dyn Account>>;

    /// Optional: URL of a consent page to start the login
    fn login_url(&self, _state: &str) -> Result<String> {
        Err(GateError::Unsupported("the driver does not support login URL"))
    }
}

/// Fails with "missing <key>" for the first absent required key
pub fn require_credentials(credentials: &Credentials, keys: &[&str]) -> Result<()> {
    match keys.iter().find(|key| !credentials.contains_key(**key)) {
        Some(key) => Err(GateError::MissingCredential(key.to_string())),
        None => Ok(()),
    }
}
