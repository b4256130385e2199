//! Authentication and authorization orchestrator
//!
//! [`Gate`] binds a login driver to the collaborators in a [`Services`]
//! container. Every driver shares the same flow: login resolves an account and
//! finds or creates its user, tokens are issued then stored, and requests are
//! authenticated from a token and authorized against the user's roles.

use log::{debug, info, warn};

use crate::auth::authorization::{check_abilities, flatten_abilities};
use crate::auth::driver::{require_credentials, Credentials, Driver};
use crate::auth::token::{JwtService, Token};
use crate::auth::user::{Ability, User};
use crate::config::GateConfig;
use crate::error::{BoxError, GateError, Result, ResultExt};
use crate::matcher::Matcher;
use crate::storage::services::Services;
use crate::storage::traits::{RoleService, TokenService, UserService};

pub struct Gate<D> {
    driver: D,
    services: Services,
}

impl<D: Driver> Gate<D> {
    /// Installs a token engine built from `config` and a fresh matcher
    pub fn new(driver: D, config: &GateConfig, mut services: Services) -> Result<Self> {
        let jwt_config = config.jwt_config().context("invalid JWT configuration")?;
        services.set_jwt_service(JwtService::new(jwt_config));
        services.set_matcher(Matcher::new());

        Ok(Self { driver, services })
    }

    /// Uses the container as-is; unset collaborators fail when first needed
    pub fn with_services(driver: D, services: Services) -> Self {
        Self { driver, services }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn user_service(&self) -> Result<&dyn UserService> {
        self.services.user_service()
    }

    pub fn role_service(&self) -> Result<&dyn RoleService> {
        self.services.role_service()
    }

    pub fn token_service(&self) -> Result<&dyn TokenService> {
        self.services.token_service()
    }

    pub fn jwt_service(&self) -> Result<&JwtService> {
        self.services.jwt_service()
    }

    pub fn matcher(&self) -> Result<&Matcher> {
        self.services.matcher()
    }

    /// Resolves credentials through the driver, then finds or creates the user
    pub async fn login(&self, credentials: &Credentials) -> Result<Box<dyn User>> {
        require_credentials(credentials, self.driver.required_credentials())?;

        let account = self.driver.resolve(credentials).await?;
        let service = self.user_service()?;

        let identity = account.identity();
        if identity.is_empty() {
            return Err(GateError::IdentityMissing);
        }

        let user = match service.find_one_by_identity(identity).await {
            Ok(user) => user,
            Err(err) if service.is_not_found(&err) => {
                debug!("No user for {} yet, creating one", identity);
                service
                    .create_one_by_account(account.as_ref())
                    .await
                    .map_err(GateError::Collaborator)
                    .context("could not create the user")?
            }
            Err(err) => {
                warn!("User lookup failed for {}: {}", identity, err);
                return Err(GateError::Collaborator(err).context("could not find the user"));
            }
        };

        info!("Login succeeded with {} driver for user {}", self.driver.name(), user.id());
        Ok(user)
    }

    /// Consent page URL for drivers that support one
    pub fn login_url(&self, state: &str) -> Result<String> {
        self.driver.login_url(state)
    }

    /// Issues a token for the user and stores it; both steps must succeed
    pub async fn issue_jwt(&self, user: &dyn User) -> Result<Token> {
        let service = self.jwt_service()?;

        let claims = service.new_claims(user);
        let token = service.issue(&claims).context("could not issue JWT")?;
        self.store_jwt(&token).await.context("could not store JWT")?;

        info!("Issued token {} for user {}", token.id, token.user_id);
        Ok(token)
    }

    pub async fn store_jwt(&self, token: &Token) -> Result<()> {
        self.token_service()?
            .store(token)
            .await
            .map_err(GateError::Collaborator)
    }

    pub fn parse_jwt(&self, token: &str) -> Result<Token> {
        self.jwt_service()?.parse(token)
    }

    /// Parses the token and resolves the live user behind its subject
    pub async fn authenticate(&self, token: &str) -> Result<Box<dyn User>> {
        let token = self.parse_jwt(token).context("could not parse the token")?;
        self.get_user_from_jwt(&token)
            .await
            .context("could not get the user")
    }

    pub async fn get_user_from_jwt(&self, token: &Token) -> Result<Box<dyn User>> {
        let service = self.user_service()?;
        service
            .find_one_by_id(&token.user_id)
            .await
            .map_err(|err| classify(err, |err| service.is_not_found(err)))
            .context("could not find the user with the given id")
    }

    /// Resolves the user's roles into one flattened ability list
    pub async fn get_user_abilities(&self, user: &dyn User) -> Result<Vec<Ability>> {
        let role_ids = user.roles();
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let service = self.role_service()?;
        let roles = service
            .find_by_ids(role_ids)
            .await
            .map_err(|err| classify(err, |err| service.is_not_found(err)))
            .context("could not fetch roles")?;

        Ok(flatten_abilities(roles))
    }

    /// Allows the request when one of the user's abilities matches it
    pub async fn authorize(&self, user: &dyn User, action: &str, object: &str) -> Result<()> {
        let abilities = self
            .get_user_abilities(user)
            .await
            .context("could not get the abilities")?;
        if abilities.is_empty() {
            warn!("Denied {} {} for user {}: no abilities", action, object, user.id());
            return Err(GateError::NoAbilities);
        }
        let matcher = self.matcher()?;

        check_abilities(matcher, action, object, &abilities).map_err(|err| {
            warn!("Denied {} {} for user {}: {}", action, object, user.id(), err);
            err
        })
    }
}

fn classify(err: BoxError, is_not_found: impl Fn(&BoxError) -> bool) -> GateError {
    if is_not_found(&err) {
        GateError::NotFound(err)
    } else {
        GateError::Collaborator(err)
    }
}
