//! Password-based login driver
//!
//! Expects `email` and `password` credentials and delegates the actual check
//! to a [`PasswordHandler`] supplied by the host application.

use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::driver::{Credentials, Driver};
use crate::auth::user::Account;
use crate::constants::{CREDENTIAL_EMAIL, CREDENTIAL_PASSWORD};
use crate::error::{BoxError, GateError, Result, ResultExt};

/// Verifies an email/password pair and returns the matching account
#[async_trait]
pub trait PasswordHandler: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> std::result::Result<Box<dyn Account>, BoxError>;
}

#[derive(Clone)]
pub struct PasswordDriver {
    handler: Arc<dyn PasswordHandler>,
}

impl PasswordDriver {
    pub fn new(handler: impl PasswordHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl Driver for PasswordDriver {
    fn name(&self) -> &'static str {
        "password"
    }

    fn required_credentials(&self) -> &'static [&'static str] {
        &[CREDENTIAL_EMAIL, CREDENTIAL_PASSWORD]
    }

    async fn resolve(&self, credentials: &Credentials) -> Result<Box<dyn Account>> {
        let email = credentials
            .get(CREDENTIAL_EMAIL)
            .ok_or_else(|| GateError::MissingCredential(CREDENTIAL_EMAIL.to_string()))?;
        let password = credentials
            .get(CREDENTIAL_PASSWORD)
            .ok_or_else(|| GateError::MissingCredential(CREDENTIAL_PASSWORD.to_string()))?;

        self.handler
            .login(email, password)
            .await
            .map_err(GateError::Credentials)
            .context("could not login")
    }
}
