use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::Algorithm;
use std::sync::{Arc, Mutex};

use rusty_gate::auth::token::{JwtConfig, JwtService, KeyMaterial};
use rusty_gate::auth::user::User;
use rusty_gate::error::{ErrorKind, GateError};

const SECRET: &str = "3f9a1c7e-token-engine-test-key-0042";

const RSA_PRIVATE: &[u8] = include_bytes!("fixtures/rsa_private.pem");
const RSA_PUBLIC: &[u8] = include_bytes!("fixtures/rsa_public.pem");
const EC_PRIVATE: &[u8] = include_bytes!("fixtures/ec_private.pem");
const EC_PUBLIC: &[u8] = include_bytes!("fixtures/ec_public.pem");
const ED_PRIVATE: &[u8] = include_bytes!("fixtures/ed_private.pem");
const ED_PUBLIC: &[u8] = include_bytes!("fixtures/ed_public.pem");

#[derive(Debug)]
struct TestUser {
    id: String,
    email: String,
    roles: Vec<String>,
}

impl TestUser {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: format!("{}@local", id),
            roles: vec!["admin".to_string()],
        }
    }
}

impl User for TestUser {
    fn id(&self) -> &str {
        &self.id
    }

    fn identity(&self) -> &str {
        &self.email
    }

    fn name(&self) -> &str {
        "Test User"
    }

    fn roles(&self) -> &[String] {
        &self.roles
    }

    fn extra_claims(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut extra = serde_json::Map::new();
        extra.insert("tenant".to_string(), serde_json::json!("acme"));
        // Reserved names never override the registered claims
        extra.insert("sub".to_string(), serde_json::json!("someone-else"));
        extra
    }
}

fn hmac_service(algorithm: &str) -> JwtService {
    JwtService::new(JwtConfig::hmac(algorithm, SECRET, Duration::hours(1), false).unwrap())
}

fn pem_service(algorithm: Algorithm, signing: KeyMaterial, verifying: KeyMaterial) -> JwtService {
    JwtService::new(JwtConfig::new(algorithm, signing, verifying, Duration::hours(1), false))
}

/// A clock the test can move; returns the service and a handle on the time
fn pinned_clock(service: JwtService) -> (JwtService, Arc<Mutex<DateTime<Utc>>>) {
    let now = Arc::new(Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
    let handle = now.clone();
    let service = service.with_clock(move || *now.lock().unwrap());
    (service, handle)
}

fn round_trip(service: &JwtService) {
    let user = TestUser::new("foo");
    let claims = service.new_claims(&user);
    let token = service.issue(&claims).unwrap();

    assert_eq!(token.id, claims.jti);
    assert_eq!(token.user_id, "foo");

    let parsed = service.parse(&token.value).unwrap();
    assert_eq!(parsed, token);

    let parsed_claims = service.parse_claims(&token.value).unwrap();
    assert_eq!(parsed_claims, claims);
}

#[test]
fn test_hmac_round_trip() {
    for algorithm in ["HS256", "HS384", "HS512"] {
        round_trip(&hmac_service(algorithm));
    }
}

#[test]
fn test_rsa_round_trip() {
    for algorithm in [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512] {
        round_trip(&pem_service(
            algorithm,
            KeyMaterial::RsaPem(RSA_PRIVATE.to_vec()),
            KeyMaterial::RsaPem(RSA_PUBLIC.to_vec()),
        ));
    }
}

#[test]
fn test_rsa_pss_round_trip() {
    for algorithm in [Algorithm::PS256, Algorithm::PS384, Algorithm::PS512] {
        round_trip(&pem_service(
            algorithm,
            KeyMaterial::RsaPem(RSA_PRIVATE.to_vec()),
            KeyMaterial::RsaPem(RSA_PUBLIC.to_vec()),
        ));
    }
}

#[test]
fn test_ecdsa_round_trip() {
    round_trip(&pem_service(
        Algorithm::ES256,
        KeyMaterial::EcPem(EC_PRIVATE.to_vec()),
        KeyMaterial::EcPem(EC_PUBLIC.to_vec()),
    ));
}

#[test]
fn test_eddsa_round_trip() {
    round_trip(&pem_service(
        Algorithm::EdDSA,
        KeyMaterial::EdPem(ED_PRIVATE.to_vec()),
        KeyMaterial::EdPem(ED_PUBLIC.to_vec()),
    ));
}

#[test]
fn test_claims_snapshot_user() {
    let (service, now) = pinned_clock(hmac_service("HS256"));
    let service = service.with_id_generator(|| "claims-1".to_string());

    let claims = service.new_claims(&TestUser::new("foo"));
    let issued_at = *now.lock().unwrap();

    assert_eq!(claims.sub, "foo");
    assert_eq!(claims.jti, "claims-1");
    assert_eq!(claims.email, "foo@local");
    assert_eq!(claims.name, "Test User");
    assert_eq!(claims.roles, vec!["admin".to_string()]);
    assert_eq!(claims.iat, issued_at.timestamp());
    assert_eq!(claims.exp, (issued_at + Duration::hours(1)).timestamp());
    assert_eq!(claims.extra.get("tenant"), Some(&serde_json::json!("acme")));
    assert!(!claims.extra.contains_key("sub"));
}

#[test]
fn test_expiry_follows_service_clock() {
    let (service, now) = pinned_clock(hmac_service("HS256"));
    let token = service.issue(&service.new_claims(&TestUser::new("foo"))).unwrap();
    let issued_at = *now.lock().unwrap();

    // Still valid on the expiry second itself
    *now.lock().unwrap() = issued_at + Duration::hours(1);
    assert!(service.parse(&token.value).is_ok());

    *now.lock().unwrap() = issued_at + Duration::hours(1) + Duration::seconds(1);
    let err = service.parse(&token.value).unwrap_err();
    assert!(matches!(err, GateError::TokenExpired));
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
    assert!(token.is_expired_at(*now.lock().unwrap()));

    *now.lock().unwrap() = issued_at - Duration::seconds(1);
    let err = service.parse(&token.value).unwrap_err();
    assert!(matches!(err, GateError::TokenNotYetValid));
    assert_eq!(err.to_string(), "token used before issued");
}

#[test]
fn test_skip_claims_validation() {
    let config = JwtConfig::hmac("HS256", SECRET, Duration::hours(1), true).unwrap();
    let (service, now) = pinned_clock(JwtService::new(config));
    let token = service.issue(&service.new_claims(&TestUser::new("foo"))).unwrap();

    *now.lock().unwrap() += Duration::days(30);
    let parsed = service.parse(&token.value).unwrap();
    assert_eq!(parsed.user_id, "foo");
}

#[test]
fn test_same_family_algorithm_is_accepted() {
    let hs384 = hmac_service("HS384");
    let token = hs384.issue(&hs384.new_claims(&TestUser::new("foo"))).unwrap();

    let parsed = hmac_service("HS256").parse(&token.value).unwrap();
    assert_eq!(parsed.user_id, "foo");
}

#[test]
fn test_family_mismatch_is_rejected() {
    let rsa = pem_service(
        Algorithm::RS256,
        KeyMaterial::RsaPem(RSA_PRIVATE.to_vec()),
        KeyMaterial::RsaPem(RSA_PUBLIC.to_vec()),
    );
    let token = rsa.issue(&rsa.new_claims(&TestUser::new("foo"))).unwrap();

    let err = hmac_service("HS256").parse(&token.value).unwrap_err();
    assert!(matches!(err.root(), GateError::UnexpectedSigningMethod(_)));
    assert_eq!(err.to_string(), "unexpected signing method: RS256");
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
}

#[test]
fn test_wrong_secret_is_rejected() {
    let service = hmac_service("HS256");
    let token = service.issue(&service.new_claims(&TestUser::new("foo"))).unwrap();

    let other = JwtService::new(
        JwtConfig::hmac("HS256", "another-key-entirely-9b2f", Duration::hours(1), false).unwrap(),
    );
    let err = other.parse(&token.value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
}

#[test]
fn test_tampered_payload_is_rejected() {
    let service = hmac_service("HS256");
    let token = service.issue(&service.new_claims(&TestUser::new("foo"))).unwrap();

    let parts: Vec<&str> = token.value.split('.').collect();
    let mut payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    payload["sub"] = serde_json::json!("admin");
    let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
    let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    let err = service.parse(&forged).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
}

#[test]
fn test_unsigned_token_is_rejected() {
    let service = hmac_service("HS256");
    let token = service.issue(&service.new_claims(&TestUser::new("foo"))).unwrap();
    let payload = token.value.split('.').nth(1).unwrap();

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let unsigned = format!("{}.{}.", header, payload);

    let err = service.parse(&unsigned).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
}

#[test]
fn test_malformed_token() {
    let service = hmac_service("HS256");
    for value in ["", "invalid.token.here", "a.b", "not a token"] {
        let err = service.parse(value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenInvalid, "{:?} was accepted", value);
    }
}

#[test]
fn test_malformed_claims() {
    let service = hmac_service("HS256");
    let header = jsonwebtoken::Header::new(Algorithm::HS256);
    let key = jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes());
    let value = jsonwebtoken::encode(&header, &serde_json::json!({"sub": 42}), &key).unwrap();

    let err = service.parse(&value).unwrap_err();
    assert!(matches!(err.root(), GateError::InvalidClaims));
}

#[test]
fn test_no_algorithm_configured() {
    let service = JwtService::new(JwtConfig::default());
    let claims = service.new_claims(&TestUser::new("foo"));

    let err = service.issue(&claims).unwrap_err();
    assert!(matches!(err, GateError::InvalidSigningMethod));
    assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);

    let err = service.parse("a.b.c").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TokenInvalid);
}

#[test]
fn test_invalid_keys() {
    let garbage = pem_service(
        Algorithm::RS256,
        KeyMaterial::RsaPem(b"not a pem".to_vec()),
        KeyMaterial::RsaPem(RSA_PUBLIC.to_vec()),
    );
    let err = garbage.issue(&garbage.new_claims(&TestUser::new("foo"))).unwrap_err();
    assert!(matches!(err.root(), GateError::InvalidKey));
    assert_eq!(err.to_string(), "could not sign JWT: invalid key");

    // EC key under an RSA algorithm
    let mismatched = pem_service(
        Algorithm::RS256,
        KeyMaterial::EcPem(EC_PRIVATE.to_vec()),
        KeyMaterial::EcPem(EC_PUBLIC.to_vec()),
    );
    let err = mismatched.issue(&mismatched.new_claims(&TestUser::new("foo"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationInvalid);
}
