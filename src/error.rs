use std::sync::PoisonError;

use thiserror::Error;

/// Error type raised by external collaborators (user, role and token services, login handlers)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of every failure the crate can surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unset or misconfigured signing method, key, pattern or collaborator
    ConfigurationInvalid,
    /// The driver rejected the raw login credentials
    CredentialsInvalid,
    /// The resolved account carries no identity attribute
    IdentityMissing,
    /// A user, role or token lookup missed
    NotFound,
    /// Malformed, unverifiable or expired token, or algorithm family mismatch
    TokenInvalid,
    /// The user resolved to zero abilities
    NoAbilities,
    /// Abilities resolved but none matched the request
    Forbidden,
    /// Storage failures and poisoned locks
    Internal,
}

#[derive(Debug, Error)]
pub enum GateError {
    // Configuration errors
    #[error("invalid {0}")]
    InvalidService(&'static str),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("invalid JWT algorithm: {0}")]
    InvalidAlgorithm(String),
    #[error("invalid JWT signing method")]
    InvalidSigningMethod,
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid expression: {0}")]
    InvalidExpression(String),
    #[error("{0}")]
    Unsupported(&'static str),

    // Login errors
    #[error("missing {0}")]
    MissingCredential(String),
    #[error("{0}")]
    Credentials(BoxError),
    #[error("missing account identity")]
    IdentityMissing,

    // Lookup errors
    #[error("{0}")]
    NotFound(BoxError),

    // Token errors
    #[error("could not sign JWT: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("{0}")]
    Verification(#[source] jsonwebtoken::errors::Error),
    #[error("unexpected signing method: {0}")]
    UnexpectedSigningMethod(String),
    #[error("invalid claims")]
    InvalidClaims,
    #[error("token is expired")]
    TokenExpired,
    #[error("token used before issued")]
    TokenNotYetValid,

    // Authorization errors
    #[error("there are no abilities")]
    NoAbilities,
    #[error("forbidden")]
    Forbidden,

    // System errors
    #[error("{0}")]
    Collaborator(BoxError),
    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<GateError>,
    },
}

impl GateError {
    /// Wraps the error with a short message describing the failed step
    pub fn context(self, context: &'static str) -> Self {
        Self::Context {
            context,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping every context layer
    pub fn root(&self) -> &GateError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Context { source, .. } => source.kind(),
            Self::InvalidService(_)
            | Self::ConfigError(_)
            | Self::InvalidAlgorithm(_)
            | Self::InvalidSigningMethod
            | Self::InvalidKey
            | Self::InvalidExpression(_)
            | Self::Unsupported(_) => ErrorKind::ConfigurationInvalid,
            Self::MissingCredential(_) | Self::Credentials(_) => ErrorKind::CredentialsInvalid,
            Self::IdentityMissing => ErrorKind::IdentityMissing,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Verification(_)
            | Self::UnexpectedSigningMethod(_)
            | Self::InvalidClaims
            | Self::TokenExpired
            | Self::TokenNotYetValid => ErrorKind::TokenInvalid,
            Self::NoAbilities => ErrorKind::NoAbilities,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::Signing(_) | Self::Collaborator(_) | Self::Lock(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

// Converting from PoisonError to facilitate poisoned mutex handling
impl<T> From<PoisonError<T>> for GateError {
    fn from(err: PoisonError<T>) -> Self {
        GateError::Lock(format!("Mutex poisoned: {}", err))
    }
}

/// Adds [`GateError::context`] to results crossing a component boundary
pub trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|err| err.context(context))
    }
}

// Generic result type for RustyGate
pub type Result<T> = std::result::Result<T, GateError>;
