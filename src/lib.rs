//! Rusty Gate - A pluggable authentication and authorization core
//!
//! This library issues and verifies JWTs, resolves a user's roles into
//! abilities and checks requested actions against them with glob patterns,
//! whatever driver the user logged in with.

pub mod auth;
pub mod config;
pub mod constants;
pub mod drivers;
pub mod error;
pub mod matcher;
pub mod storage;

// Re-export main components
pub use auth::{
    Ability, Account, Claims, Credentials, Driver, Gate, JwtConfig, JwtService, KeyMaterial, Role,
    Token, User,
};
pub use config::GateConfig;
pub use error::{BoxError, ErrorKind, GateError, Result};
pub use matcher::Matcher;
pub use storage::Services;
