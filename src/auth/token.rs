//! JSON Web Token issuance and verification
//!
//! A [`JwtService`] signs and verifies tokens for exactly one algorithm family.
//! Key material is checked against that family on every issue and parse, and a
//! token whose header names another family is refused before any signature
//! work happens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::auth::clock::{ClaimsIdGenerator, Clock, RandomIdGenerator, SystemClock};
use crate::auth::user::User;
use crate::error::{GateError, Result};

/// Registered claim names that user-provided attributes may not override
const RESERVED_CLAIMS: &[&str] = &["sub", "exp", "iat", "jti", "name", "email", "roles"];

/// Signing algorithm families; keys are only valid within their own family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    Hmac,
    Rsa,
    RsaPss,
    Ecdsa,
    EdDsa,
}

impl AlgorithmFamily {
    pub fn of(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => Self::Rsa,
            Algorithm::PS256 | Algorithm::PS384 | Algorithm::PS512 => Self::RsaPss,
            Algorithm::ES256 | Algorithm::ES384 => Self::Ecdsa,
            Algorithm::EdDSA => Self::EdDsa,
        }
    }

    /// Every algorithm accepted in a token header for this family
    pub fn algorithms(self) -> &'static [Algorithm] {
        match self {
            Self::Hmac => &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512],
            Self::Rsa => &[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512],
            Self::RsaPss => &[Algorithm::PS256, Algorithm::PS384, Algorithm::PS512],
            Self::Ecdsa => &[Algorithm::ES256, Algorithm::ES384],
            Self::EdDsa => &[Algorithm::EdDSA],
        }
    }
}

/// Raw key bytes tagged with the kind of key they hold
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// Shared secret for HMAC
    Secret(Vec<u8>),
    /// PEM encoded RSA key, used by both RSA and RSA-PSS
    RsaPem(Vec<u8>),
    /// PEM encoded elliptic curve key (PKCS#8 private, SPKI public)
    EcPem(Vec<u8>),
    /// PEM encoded Ed25519 key (PKCS#8 private, SPKI public)
    EdPem(Vec<u8>),
}

impl KeyMaterial {
    pub fn secret(secret: impl AsRef<[u8]>) -> Self {
        Self::Secret(secret.as_ref().to_vec())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "secret",
            Self::RsaPem(_) => "RSA PEM",
            Self::EcPem(_) => "EC PEM",
            Self::EdPem(_) => "Ed25519 PEM",
        }
    }

    pub(crate) fn encoding_key(&self, family: AlgorithmFamily) -> Result<EncodingKey> {
        let key = match (family, self) {
            (AlgorithmFamily::Hmac, Self::Secret(secret)) => Ok(EncodingKey::from_secret(secret)),
            (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Self::RsaPem(pem)) => {
                EncodingKey::from_rsa_pem(pem)
            }
            (AlgorithmFamily::Ecdsa, Self::EcPem(pem)) => EncodingKey::from_ec_pem(pem),
            (AlgorithmFamily::EdDsa, Self::EdPem(pem)) => EncodingKey::from_ed_pem(pem),
            _ => {
                debug!("{} signing key does not fit the {:?} family", self.kind(), family);
                return Err(GateError::InvalidKey);
            }
        };

        key.map_err(|err| {
            debug!("Could not load {} signing key: {}", self.kind(), err);
            GateError::InvalidKey
        })
    }

    pub(crate) fn decoding_key(&self, family: AlgorithmFamily) -> Result<DecodingKey> {
        let key = match (family, self) {
            (AlgorithmFamily::Hmac, Self::Secret(secret)) => Ok(DecodingKey::from_secret(secret)),
            (AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss, Self::RsaPem(pem)) => {
                DecodingKey::from_rsa_pem(pem)
            }
            (AlgorithmFamily::Ecdsa, Self::EcPem(pem)) => DecodingKey::from_ec_pem(pem),
            (AlgorithmFamily::EdDsa, Self::EdPem(pem)) => DecodingKey::from_ed_pem(pem),
            _ => {
                debug!("{} verifying key does not fit the {:?} family", self.kind(), family);
                return Err(GateError::InvalidKey);
            }
        };

        key.map_err(|err| {
            debug!("Could not load {} verifying key: {}", self.kind(), err);
            GateError::InvalidKey
        })
    }
}

// Never print key bytes
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = match self {
            Self::Secret(bytes) | Self::RsaPem(bytes) | Self::EcPem(bytes) | Self::EdPem(bytes) => {
                bytes.len()
            }
        };
        write!(f, "KeyMaterial({}, <redacted {} bytes>)", self.kind(), len)
    }
}

/// Immutable signing configuration of a token engine
#[derive(Debug, Clone)]
pub struct JwtConfig {
    algorithm: Option<Algorithm>,
    signing_key: Option<KeyMaterial>,
    verifying_key: Option<KeyMaterial>,
    expiration: Duration,
    skip_claims_validation: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: None,
            signing_key: None,
            verifying_key: None,
            expiration: Duration::zero(),
            skip_claims_validation: false,
        }
    }
}

impl JwtConfig {
    pub fn new(
        algorithm: Algorithm,
        signing_key: KeyMaterial,
        verifying_key: KeyMaterial,
        expiration: Duration,
        skip_claims_validation: bool,
    ) -> Self {
        Self {
            algorithm: Some(algorithm),
            signing_key: Some(signing_key),
            verifying_key: Some(verifying_key),
            expiration,
            skip_claims_validation,
        }
    }

    /// HMAC configuration sharing one secret for signing and verifying
    pub fn hmac(
        algorithm: &str,
        secret: impl AsRef<[u8]>,
        expiration: Duration,
        skip_claims_validation: bool,
    ) -> Result<Self> {
        let algorithm: Algorithm = algorithm
            .parse()
            .map_err(|_| GateError::InvalidAlgorithm(algorithm.to_string()))?;
        if AlgorithmFamily::of(algorithm) != AlgorithmFamily::Hmac {
            return Err(GateError::InvalidAlgorithm(format!("{:?} is not an HMAC algorithm", algorithm)));
        }

        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(GateError::InvalidKey);
        }

        let key = KeyMaterial::secret(secret);
        Ok(Self::new(algorithm, key.clone(), key, expiration, skip_claims_validation))
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn skip_claims_validation(&self) -> bool {
        self.skip_claims_validation
    }
}

/// JWT claims with a snapshot of the user's attributes at issuance time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (as UTC timestamp)
    pub exp: i64,
    /// Issued at (as UTC timestamp)
    pub iat: i64,
    /// Unique claims identifier
    pub jti: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Caller-defined attributes
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An issued token; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    /// Signed compact serialization
    pub value: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Builds a token whose metadata comes strictly from the claims
    pub fn from_claims(claims: &Claims, value: impl Into<String>) -> Result<Self> {
        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0).ok_or(GateError::InvalidClaims)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(GateError::InvalidClaims)?;

        Ok(Self {
            id: claims.jti.clone(),
            value: value.into(),
            user_id: claims.sub.clone(),
            issued_at,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Issues and parses signed tokens for one signing configuration
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    clock: Arc<dyn Clock>,
    id_generator: Arc<dyn ClaimsIdGenerator>,
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService").field("config", &self.config).finish_non_exhaustive()
    }
}

impl JwtService {
    /// Creates a service using the wall clock and random claims identifiers
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            id_generator: Arc::new(RandomIdGenerator),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_id_generator(mut self, id_generator: impl ClaimsIdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(id_generator);
        self
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Snapshots the user into claims expiring after the configured duration
    pub fn new_claims(&self, user: &dyn User) -> Claims {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.config.expiration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut extra = user.extra_claims();
        extra.retain(|key, _| !RESERVED_CLAIMS.contains(&key.as_str()));

        Claims {
            sub: user.id().to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: self.id_generator.generate(),
            name: user.name().to_string(),
            email: user.identity().to_string(),
            roles: user.roles().to_vec(),
            extra,
        }
    }

    /// Signs the claims with the configured algorithm and key
    pub fn issue(&self, claims: &Claims) -> Result<Token> {
        let algorithm = self.config.algorithm.ok_or(GateError::InvalidSigningMethod)?;
        let key = self
            .config
            .signing_key
            .as_ref()
            .ok_or(GateError::InvalidKey)
            .and_then(|key| key.encoding_key(AlgorithmFamily::of(algorithm)))
            .map_err(|err| err.context("could not sign JWT"))?;

        let value = encode(&Header::new(algorithm), claims, &key).map_err(GateError::Signing)?;
        debug!("Signed JWT {} for subject {} with {:?}", claims.jti, claims.sub, algorithm);

        Token::from_claims(claims, value)
    }

    /// Verifies a token string and rebuilds the token from its claims
    pub fn parse(&self, token: &str) -> Result<Token> {
        let claims = self.parse_claims(token)?;
        Token::from_claims(&claims, token)
    }

    /// Verifies a token string and returns its claims
    pub fn parse_claims(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token)
            .map_err(|err| GateError::Verification(err).context("could not parse JWT"))?;
        let (family, key) = self.verifying_key(header.alg)?;

        // Temporal checks run below against the service clock
        let mut validation = Validation::new(header.alg);
        validation.algorithms = family.algorithms().to_vec();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|err| match err.kind() {
                JwtErrorKind::Json(_) => GateError::InvalidClaims,
                _ => GateError::Verification(err),
            })
            .map_err(|err| err.context("could not parse JWT"))?;

        if !self.config.skip_claims_validation {
            self.validate_times(&data.claims)?;
        }

        Ok(data.claims)
    }

    fn verifying_key(&self, token_algorithm: Algorithm) -> Result<(AlgorithmFamily, DecodingKey)> {
        let algorithm = self.config.algorithm.ok_or(GateError::InvalidSigningMethod)?;
        let family = AlgorithmFamily::of(algorithm);

        if AlgorithmFamily::of(token_algorithm) != family {
            warn!(
                "Rejected JWT signed with {:?}, expected the {:?} family",
                token_algorithm, family
            );
            return Err(GateError::UnexpectedSigningMethod(format!("{:?}", token_algorithm)));
        }

        let key = self
            .config
            .verifying_key
            .as_ref()
            .ok_or(GateError::InvalidKey)?
            .decoding_key(family)?;

        Ok((family, key))
    }

    fn validate_times(&self, claims: &Claims) -> Result<()> {
        let now = self.clock.now().timestamp();

        if now > claims.exp {
            return Err(GateError::TokenExpired);
        }
        if now < claims.iat {
            return Err(GateError::TokenNotYetValid);
        }

        Ok(())
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
