//! Service container handed to the orchestrator
//!
//! Every accessor fails with "invalid ... service" when the collaborator was
//! never configured, so callers never reach an unset dependency.

use std::sync::Arc;

use crate::auth::token::JwtService;
use crate::error::{GateError, Result};
use crate::matcher::Matcher;
use crate::storage::traits::{RoleService, TokenService, UserService};

#[derive(Clone, Default)]
pub struct Services {
    user_service: Option<Arc<dyn UserService>>,
    role_service: Option<Arc<dyn RoleService>>,
    token_service: Option<Arc<dyn TokenService>>,
    jwt_service: Option<Arc<JwtService>>,
    matcher: Option<Arc<Matcher>>,
}

impl Services {
    /// Creates a container holding the three storage collaborators
    pub fn new(
        users: Arc<dyn UserService>,
        tokens: Arc<dyn TokenService>,
        roles: Arc<dyn RoleService>,
    ) -> Self {
        Self {
            user_service: Some(users),
            role_service: Some(roles),
            token_service: Some(tokens),
            jwt_service: None,
            matcher: None,
        }
    }

    pub fn with_user_service(mut self, service: Arc<dyn UserService>) -> Self {
        self.user_service = Some(service);
        self
    }

    pub fn with_role_service(mut self, service: Arc<dyn RoleService>) -> Self {
        self.role_service = Some(service);
        self
    }

    pub fn with_token_service(mut self, service: Arc<dyn TokenService>) -> Self {
        self.token_service = Some(service);
        self
    }

    pub fn with_jwt_service(mut self, service: JwtService) -> Self {
        self.set_jwt_service(service);
        self
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.set_matcher(matcher);
        self
    }

    pub fn set_jwt_service(&mut self, service: JwtService) {
        self.jwt_service = Some(Arc::new(service));
    }

    pub fn set_matcher(&mut self, matcher: Matcher) {
        self.matcher = Some(Arc::new(matcher));
    }

    pub fn user_service(&self) -> Result<&dyn UserService> {
        self.user_service
            .as_deref()
            .ok_or(GateError::InvalidService("user service"))
    }

    pub fn role_service(&self) -> Result<&dyn RoleService> {
        self.role_service
            .as_deref()
            .ok_or(GateError::InvalidService("role service"))
    }

    pub fn token_service(&self) -> Result<&dyn TokenService> {
        self.token_service
            .as_deref()
            .ok_or(GateError::InvalidService("token service"))
    }

    pub fn jwt_service(&self) -> Result<&JwtService> {
        self.jwt_service
            .as_deref()
            .ok_or(GateError::InvalidService("JWT service"))
    }

    pub fn matcher(&self) -> Result<&Matcher> {
        self.matcher
            .as_deref()
            .ok_or(GateError::InvalidService("matcher"))
    }
}
