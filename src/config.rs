//! Gate configuration module
//! Handles the signing parameters of the token engine

use crate::auth::token::{AlgorithmFamily, JwtConfig, KeyMaterial};
use crate::constants::{
    DEFAULT_JWT_ALGORITHM, DEFAULT_JWT_EXPIRATION_SECS, ENV_JWT_ALGORITHM, ENV_JWT_EXPIRATION_SECS,
    ENV_JWT_SECRET, ENV_JWT_SECRET_FALLBACK, ENV_JWT_SIGNING_KEY_PATH,
    ENV_JWT_SKIP_CLAIMS_VALIDATION, ENV_JWT_VERIFYING_KEY_PATH, MIN_SECRET_LENGTH,
};
use crate::error::{GateError, Result};
use jsonwebtoken::Algorithm;
use log::debug;
use std::env;
use std::fs;
use std::time::Duration;

/// Token engine configuration parameters
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub jwt_algorithm: Algorithm,
    pub signing_key: KeyMaterial,
    /// Same as the signing key for HMAC
    pub verifying_key: KeyMaterial,
    /// Token lifetime added to the issue time
    pub expiration: Duration,
    /// Skip expiry and issued-at checks on parse
    pub skip_claims_validation: bool,
}

impl GateConfig {
    pub fn new(
        jwt_algorithm: Algorithm,
        signing_key: KeyMaterial,
        verifying_key: KeyMaterial,
        expiration: Duration,
    ) -> Self {
        Self {
            jwt_algorithm,
            signing_key,
            verifying_key,
            expiration,
            skip_claims_validation: false,
        }
    }

    /// HS256 configuration with a shared secret
    pub fn hmac(secret: impl AsRef<[u8]>, expiration: Duration) -> Self {
        let key = KeyMaterial::secret(secret);
        Self::new(Algorithm::HS256, key.clone(), key, expiration)
    }

    pub fn with_skip_claims_validation(mut self, skip: bool) -> Self {
        self.skip_claims_validation = skip;
        self
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str) -> Result<()> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(GateError::ConfigError(format!(
                "JWT secret must be at least {} characters long",
                MIN_SECRET_LENGTH
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(GateError::ConfigError(format!(
                    "JWT secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    pattern
                )));
            }
        }

        // Ensure some complexity
        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GateError::ConfigError(
                "JWT secret should contain mixed characters (letters, numbers, symbols) for security".to_string(),
            ));
        }

        Ok(())
    }

    fn read_pem(var: &str, family: AlgorithmFamily) -> Result<KeyMaterial> {
        let path = env::var(var).map_err(|_| {
            GateError::ConfigError(format!(
                "{} is required for {:?} signing algorithms",
                var, family
            ))
        })?;

        let pem = fs::read(&path).map_err(|err| {
            GateError::ConfigError(format!("could not read key file {}: {}", path, err))
        })?;

        match family {
            AlgorithmFamily::Rsa | AlgorithmFamily::RsaPss => Ok(KeyMaterial::RsaPem(pem)),
            AlgorithmFamily::Ecdsa => Ok(KeyMaterial::EcPem(pem)),
            AlgorithmFamily::EdDsa => Ok(KeyMaterial::EdPem(pem)),
            AlgorithmFamily::Hmac => Err(GateError::InvalidKey),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let algorithm_name =
            env::var(ENV_JWT_ALGORITHM).unwrap_or(DEFAULT_JWT_ALGORITHM.to_string());
        let jwt_algorithm: Algorithm = algorithm_name
            .parse()
            .map_err(|_| GateError::InvalidAlgorithm(algorithm_name.clone()))?;

        let expiration_secs = env::var(ENV_JWT_EXPIRATION_SECS)
            .ok()
            .and_then(|e| e.parse::<u64>().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION_SECS as u64);

        let skip_claims_validation = env::var(ENV_JWT_SKIP_CLAIMS_VALIDATION)
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false); // SECURITY: Default to false

        let family = AlgorithmFamily::of(jwt_algorithm);
        let (signing_key, verifying_key) = match family {
            AlgorithmFamily::Hmac => {
                let secret = env::var(ENV_JWT_SECRET)
                    .or_else(|_| env::var(ENV_JWT_SECRET_FALLBACK))
                    .map_err(|_| {
                        GateError::ConfigError(
                            "JWT_SECRET environment variable is required for HMAC algorithms. \
                             Generate one with: openssl rand -base64 32"
                                .to_string(),
                        )
                    })?;
                Self::validate_secret(&secret)?;

                let key = KeyMaterial::secret(secret);
                (key.clone(), key)
            }
            _ => (
                Self::read_pem(ENV_JWT_SIGNING_KEY_PATH, family)?,
                Self::read_pem(ENV_JWT_VERIFYING_KEY_PATH, family)?,
            ),
        };

        debug!(
            "Loaded gate configuration: {:?}, expiration {}s",
            jwt_algorithm, expiration_secs
        );

        Ok(Self {
            jwt_algorithm,
            signing_key,
            verifying_key,
            expiration: Duration::from_secs(expiration_secs),
            skip_claims_validation,
        })
    }

    /// Builds the immutable configuration of a token engine
    pub fn jwt_config(&self) -> Result<JwtConfig> {
        let expiration = chrono::Duration::from_std(self.expiration).map_err(|_| {
            GateError::ConfigError(format!(
                "JWT expiration of {}s is out of range",
                self.expiration.as_secs()
            ))
        })?;

        if let KeyMaterial::Secret(secret) = &self.signing_key {
            if secret.is_empty() {
                return Err(GateError::InvalidKey);
            }
        }

        // Both keys must load for the configured family
        let family = AlgorithmFamily::of(self.jwt_algorithm);
        self.signing_key.encoding_key(family)?;
        self.verifying_key.decoding_key(family)?;

        Ok(JwtConfig::new(
            self.jwt_algorithm,
            self.signing_key.clone(),
            self.verifying_key.clone(),
            expiration,
            self.skip_claims_validation,
        ))
    }
}
