//! Authentication and authorization module

pub mod authorization;
pub mod clock;
pub mod driver;
pub mod gate;
pub mod token;
pub mod user;

// Re-export main components
pub use driver::{Credentials, Driver};
pub use gate::Gate;
pub use token::{AlgorithmFamily, Claims, JwtConfig, JwtService, KeyMaterial, Token};
pub use user::{Ability, Account, EmailAccount, Role, User};
