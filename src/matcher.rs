//! Glob-like pattern matching with a per-instance expression cache
//!
//! A `*` at the end of a pattern, or right before a `/`, stands for any run of
//! characters (possibly empty). Every other character is handed to the regex
//! engine as-is, so regex metacharacters keep their meaning.

use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{GateError, Result};

const ANY_CHARACTERS: &str = "(.{0,})";

/// Rewrites every `*` that precedes end-of-pattern or a `/` into a catch-all group
pub fn asterisk_parse(pattern: &str) -> String {
    let mut parsed = String::with_capacity(pattern.len() + ANY_CHARACTERS.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '*' && matches!(chars.peek(), None | Some('/')) {
            parsed.push_str(ANY_CHARACTERS);
        } else {
            parsed.push(c);
        }
    }

    parsed
}

/// Matches subjects against patterns, compiling each distinct pattern once
#[derive(Debug, Default)]
pub struct Matcher {
    // pattern -> compiled expression; `None` marks a pattern rejected on every lookup
    expressions: Mutex<HashMap<String, Option<Regex>>>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `subject` matches `pattern` as a whole
    ///
    /// Lookup, compile-on-miss and evaluation all happen under the cache lock.
    /// A pattern that fails to compile is not cached, so the next call reports
    /// the same error again.
    pub fn is_match(&self, subject: &str, pattern: &str) -> Result<bool> {
        let mut expressions = self.expressions.lock()?;

        if !expressions.contains_key(pattern) {
            let expression = Self::compile(pattern)?;
            expressions.insert(pattern.to_owned(), Some(expression));
        }

        match expressions.get(pattern) {
            Some(Some(expression)) => Ok(expression.is_match(subject)),
            _ => Err(GateError::InvalidExpression(pattern.to_owned())),
        }
    }

    /// Marks a pattern as invalid; every later lookup of it fails
    pub fn invalidate(&self, pattern: &str) -> Result<()> {
        self.expressions.lock()?.insert(pattern.to_owned(), None);
        Ok(())
    }

    /// Number of cached patterns, valid or not
    pub fn cache_size(&self) -> Result<usize> {
        Ok(self.expressions.lock()?.len())
    }

    fn compile(pattern: &str) -> Result<Regex> {
        let source = format!("(?s)^(?:{})$", asterisk_parse(pattern));
        Regex::new(&source).map_err(|err| {
            debug!("Could not compile pattern {:?}: {}", pattern, err);
            GateError::InvalidExpression(format!("{}: {}", pattern, err))
        })
    }
}
