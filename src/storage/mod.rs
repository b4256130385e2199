//! Collaborator contracts and their in-memory implementations

pub mod memory;
pub mod services;
pub mod traits;

// Re-export the collaborator contracts
pub use services::Services;
pub use traits::{RoleService, TokenService, UserService};
