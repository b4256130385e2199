//! Role-based authorization
//!
//! Roles are flattened into one ordered ability list. A request is allowed as
//! soon as one ability matches both its action and its object.

use log::debug;

use crate::auth::user::{Ability, Role};
use crate::error::{GateError, Result};
use crate::matcher::Matcher;

/// Flattens roles into their abilities, keeping role order then ability order
pub fn flatten_abilities(roles: Vec<Role>) -> Vec<Ability> {
    roles.into_iter().flat_map(|role| role.abilities).collect()
}

/// Checks one ability against a requested action and object
///
/// A pattern error on either side counts as a non-match for this ability only.
pub fn ability_allows(matcher: &Matcher, action: &str, object: &str, ability: &Ability) -> bool {
    if !ability.is_eligible() {
        return false;
    }

    let matches = |subject: &str, pattern: &str| match matcher.is_match(subject, pattern) {
        Ok(matched) => matched,
        Err(err) => {
            debug!("Skipping ability pattern {:?}: {}", pattern, err);
            false
        }
    };

    matches(action, &ability.action) && matches(object, &ability.object)
}

/// Decides a request against a flattened ability list
pub fn check_abilities(
    matcher: &Matcher,
    action: &str,
    object: &str,
    abilities: &[Ability],
) -> Result<()> {
    if abilities.is_empty() {
        return Err(GateError::NoAbilities);
    }

    if abilities
        .iter()
        .any(|ability| ability_allows(matcher, action, object, ability))
    {
        Ok(())
    } else {
        Err(GateError::Forbidden)
    }
}
