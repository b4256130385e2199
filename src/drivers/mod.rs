pub mod oauth;
pub mod password;

pub use oauth::{
    parse_account, ConsentPageProvider, FacebookUser, GoogleUser, OAuthConfig, OAuthDriver,
    OAuthHandler, OAuthProvider,
};
pub use password::{PasswordDriver, PasswordHandler};
