use crate::error::{Result, ShellError};
use std::collections::HashMap;
use std::env as stdenv;

/// Session-scoped environment variables.
///
/// Values set here are layered on top of the process environment when a child
/// is spawned; the process-wide environment itself is never written. Lookups
/// fall back to the process environment for keys the session has not set.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    capacity: usize,
}

impl Environment {
    /// Create an empty table holding at most `capacity` variables.
    pub fn new(capacity: usize) -> Self {
        Self {
            vars: HashMap::new(),
            capacity,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in the session table first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a variable.
    ///
    /// Replacing an existing key always succeeds; adding a new one fails once the
    /// table holds `capacity` entries.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) -> Result<()> {
        let key = key.into();
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(ShellError::InvalidArgument(format!(
                "invalid environment variable name {key:?}"
            )));
        }
        if !self.vars.contains_key(&key) && self.vars.len() >= self.capacity {
            return Err(ShellError::CapacityExceeded {
                what: "environment table",
                capacity: self.capacity,
            });
        }
        self.vars.insert(key, val.into());
        Ok(())
    }

    /// Remove a session-level override. Returns the old value if there was one.
    pub fn unset_var(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Session-level overrides, to be applied on top of the inherited environment.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
