// Token defaults
pub const DEFAULT_JWT_ALGORITHM: &str = "HS256";
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 86400;
pub const MIN_SECRET_LENGTH: usize = 32;

// Environment variables read by GateConfig::from_env
pub const ENV_JWT_ALGORITHM: &str = "RUSTY_GATE_JWT_ALGORITHM";
pub const ENV_JWT_SECRET: &str = "RUSTY_GATE_JWT_SECRET";
pub const ENV_JWT_SECRET_FALLBACK: &str = "JWT_SECRET";
pub const ENV_JWT_SIGNING_KEY_PATH: &str = "RUSTY_GATE_JWT_SIGNING_KEY_PATH";
pub const ENV_JWT_VERIFYING_KEY_PATH: &str = "RUSTY_GATE_JWT_VERIFYING_KEY_PATH";
pub const ENV_JWT_EXPIRATION_SECS: &str = "RUSTY_GATE_JWT_EXPIRATION_SECS";
pub const ENV_JWT_SKIP_CLAIMS_VALIDATION: &str = "RUSTY_GATE_JWT_SKIP_CLAIMS_VALIDATION";

// Login credential keys
pub const CREDENTIAL_EMAIL: &str = "email";
pub const CREDENTIAL_PASSWORD: &str = "password";
pub const CREDENTIAL_CODE: &str = "code";
pub const CREDENTIAL_STATE: &str = "state";
