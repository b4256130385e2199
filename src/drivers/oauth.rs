//! OAuth 2.0 login driver
//!
//! Expects a `code` credential (and an optional `state` for stateful flows).
//! Exchanging the code and calling the provider's user API is the job of the
//! [`OAuthHandler`]; this module only builds consent URLs and decodes the
//! common user payloads.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::auth::driver::{Credentials, Driver};
use crate::auth::user::Account;
use crate::constants::{CREDENTIAL_CODE, CREDENTIAL_STATE};
use crate::error::{BoxError, GateError, Result, ResultExt};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USER_API: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

const FACEBOOK_AUTH_URL: &str = "https://www.facebook.com/v3.2/dialog/oauth";
const FACEBOOK_TOKEN_URL: &str = "https://graph.facebook.com/v3.2/oauth/access_token";
const FACEBOOK_USER_API: &str = "https://graph.facebook.com/v2.11/me?fields=id,name,email";

/// OAuth client registration and provider endpoints
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    /// Endpoint returning the signed-in user's profile
    pub user_api: String,
}

impl OAuthConfig {
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: vec![GOOGLE_EMAIL_SCOPE.to_string()],
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            redirect_uri: redirect_uri.into(),
            user_api: GOOGLE_USER_API.to_string(),
        }
    }

    pub fn facebook(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: vec!["email".to_string()],
            auth_url: FACEBOOK_AUTH_URL.to_string(),
            token_url: FACEBOOK_TOKEN_URL.to_string(),
            redirect_uri: redirect_uri.into(),
            user_api: FACEBOOK_USER_API.to_string(),
        }
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("user_api", &self.user_api)
            .finish()
    }
}

/// Builds the provider's consent page URL
pub trait OAuthProvider: Send + Sync {
    fn auth_code_url(&self, state: &str) -> Result<String>;
}

/// Authorization-code consent URL built straight from an [`OAuthConfig`]
#[derive(Debug, Clone)]
pub struct ConsentPageProvider {
    config: OAuthConfig,
}

impl ConsentPageProvider {
    pub fn new(config: OAuthConfig) -> Self {
        Self { config }
    }
}

impl OAuthProvider for ConsentPageProvider {
    fn auth_code_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_url).map_err(|err| {
            GateError::ConfigError(format!(
                "invalid OAuth authorization URL {}: {}",
                self.config.auth_url, err
            ))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            if !self.config.redirect_uri.is_empty() {
                query.append_pair("redirect_uri", &self.config.redirect_uri);
            }
            query.append_pair("response_type", "code");
            if !self.config.scopes.is_empty() {
                query.append_pair("scope", &self.config.scopes.join(" "));
            }
            if !state.is_empty() {
                query.append_pair("state", state);
            }
        }

        Ok(url.to_string())
    }
}

/// Exchanges an authorization code for the signed-in account
#[async_trait]
pub trait OAuthHandler: Send + Sync {
    async fn login(
        &self,
        config: &OAuthConfig,
        code: &str,
        state: &str,
    ) -> std::result::Result<Box<dyn Account>, BoxError>;
}

#[derive(Clone)]
pub struct OAuthDriver {
    config: OAuthConfig,
    handler: Arc<dyn OAuthHandler>,
    provider: Arc<dyn OAuthProvider>,
}

impl OAuthDriver {
    pub fn new(config: OAuthConfig, handler: impl OAuthHandler + 'static) -> Self {
        let provider = ConsentPageProvider::new(config.clone());
        Self {
            config,
            handler: Arc::new(handler),
            provider: Arc::new(provider),
        }
    }

    pub fn with_provider(mut self, provider: impl OAuthProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl Driver for OAuthDriver {
    fn name(&self) -> &'static str {
        "oauth"
    }

    fn required_credentials(&self) -> &'static [&'static str] {
        &[CREDENTIAL_CODE]
    }

    async fn resolve(&self, credentials: &Credentials) -> Result<Box<dyn Account>> {
        let code = credentials
            .get(CREDENTIAL_CODE)
            .ok_or_else(|| GateError::MissingCredential(CREDENTIAL_CODE.to_string()))?;
        // state is optional because of stateless flows
        let state = credentials
            .get(CREDENTIAL_STATE)
            .map(String::as_str)
            .unwrap_or_default();

        self.handler
            .login(&self.config, code, state)
            .await
            .map_err(GateError::Credentials)
            .context("could not login")
    }

    fn login_url(&self, state: &str) -> Result<String> {
        self.provider.auth_code_url(state)
    }
}

/// Profile returned by the Google user info API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

impl Account for GoogleUser {
    // Unverified addresses are not an identity
    fn identity(&self) -> &str {
        if self.email_verified {
            &self.email
        } else {
            ""
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Profile returned by the Facebook Graph API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Account for FacebookUser {
    fn identity(&self) -> &str {
        &self.email
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Decodes a user info response body into an account
pub fn parse_account<A>(body: &[u8]) -> std::result::Result<Box<dyn Account>, BoxError>
where
    A: Account + DeserializeOwned + 'static,
{
    let account: A = serde_json::from_slice(body)?;
    Ok(Box::new(account))
}
