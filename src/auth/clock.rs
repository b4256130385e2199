//! Time and identifier sources used by the token engine
//!
//! Both are per-instance strategies so tests can pin them without touching
//! process-wide state. Closures implement the traits directly.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time for claims issuance and temporal validation
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of unique claims identifiers (`jti`)
pub trait ClaimsIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random 128-bit identifiers rendered as 32 lowercase hex characters
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl ClaimsIdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

impl<F> ClaimsIdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_random_ids_are_hex_and_unique() {
        let generator = RandomIdGenerator;
        let first = generator.generate();
        let second = generator.generate();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_closures_as_strategies() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = move || fixed;
        let ids = || "fixed-id".to_string();

        assert_eq!(Clock::now(&clock), fixed);
        assert_eq!(ClaimsIdGenerator::generate(&ids), "fixed-id");
    }
}
