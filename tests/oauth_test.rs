mod common;

use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

use common::Fixture;
use rusty_gate::auth::driver::{Credentials, Driver};
use rusty_gate::auth::user::{Account, User};
use rusty_gate::drivers::oauth::{
    parse_account, GoogleUser, OAuthConfig, OAuthDriver, OAuthHandler, OAuthProvider,
};
use rusty_gate::error::{BoxError, ErrorKind, GateError, Result};
use rusty_gate::Gate;

/// Serves canned user info bodies keyed by authorization code
struct CannedGoogle;

#[async_trait]
impl OAuthHandler for CannedGoogle {
    async fn login(
        &self,
        config: &OAuthConfig,
        code: &str,
        state: &str,
    ) -> std::result::Result<Box<dyn Account>, BoxError> {
        assert_eq!(config.client_id, "client-id");
        if !state.is_empty() && state != "expected-state" {
            return Err("state mismatch".into());
        }

        let body: &[u8] = match code {
            "verified" => br#"{"name": "Foo", "email": "google@local", "email_verified": true}"#,
            "unverified" => br#"{"name": "Foo", "email": "google@local", "email_verified": false}"#,
            _ => return Err("invalid authorization code".into()),
        };
        parse_account::<GoogleUser>(body)
    }
}

struct FixedProvider;

impl OAuthProvider for FixedProvider {
    fn auth_code_url(&self, state: &str) -> Result<String> {
        Ok(format!("https://sso.local/consent?state={}", state))
    }
}

fn driver() -> OAuthDriver {
    OAuthDriver::new(
        OAuthConfig::google("client-id", "client-secret", "https://app.local/callback"),
        CannedGoogle,
    )
}

fn code(code: &str) -> Credentials {
    let mut credentials = Credentials::new();
    credentials.insert("code".to_string(), code.to_string());
    credentials
}

#[tokio::test]
async fn test_oauth_login_creates_user() {
    let fixture = Fixture::new().await;
    let gate = Gate::new(driver(), &common::config(), fixture.services()).unwrap();

    let user = gate.login(&code("verified")).await.unwrap();
    assert_eq!(user.identity(), "google@local");
    assert_eq!(user.name(), "Foo");

    let again = gate.login(&code("verified")).await.unwrap();
    assert_eq!(again.id(), user.id());
}

#[tokio::test]
async fn test_oauth_login_with_state() {
    let fixture = Fixture::new().await;
    let gate = Gate::new(driver(), &common::config(), fixture.services()).unwrap();

    let mut credentials = code("verified");
    credentials.insert("state".to_string(), "expected-state".to_string());
    assert!(gate.login(&credentials).await.is_ok());

    credentials.insert("state".to_string(), "forged".to_string());
    let err = gate.login(&credentials).await.unwrap_err();
    assert_eq!(err.to_string(), "could not login: state mismatch");
}

#[tokio::test]
async fn test_oauth_unverified_email_has_no_identity() {
    let fixture = Fixture::new().await;
    let gate = Gate::new(driver(), &common::config(), fixture.services()).unwrap();

    let err = gate.login(&code("unverified")).await.unwrap_err();
    assert!(matches!(err, GateError::IdentityMissing));
    assert_eq!(err.kind(), ErrorKind::IdentityMissing);
}

#[tokio::test]
async fn test_oauth_missing_code() {
    let fixture = Fixture::new().await;
    let gate = Gate::new(driver(), &common::config(), fixture.services()).unwrap();

    let err = gate.login(&Credentials::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "missing code");

    let err = gate.login(&code("bogus")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialsInvalid);
}

#[tokio::test]
async fn test_oauth_login_url() {
    let fixture = Fixture::new().await;
    let gate = Gate::new(driver(), &common::config(), fixture.services()).unwrap();

    let url = Url::parse(&gate.login_url("abc").unwrap()).unwrap();
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert_eq!(url.host_str(), Some("accounts.google.com"));
    assert_eq!(query["client_id"], "client-id");
    assert_eq!(query["redirect_uri"], "https://app.local/callback");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["state"], "abc");
}

#[test]
fn test_oauth_custom_provider() {
    let driver = driver().with_provider(FixedProvider);

    assert_eq!(driver.name(), "oauth");
    assert_eq!(driver.required_credentials(), ["code"]);
    assert_eq!(
        driver.login_url("xyz").unwrap(),
        "https://sso.local/consent?state=xyz"
    );
}
