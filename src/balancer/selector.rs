//! Hash-based backend selector

use std::sync::Arc;

use super::hash::fnv1a_32;
use crate::config::ConfigError;

/// Pick the backend for `key`
///
/// The index is the FNV-1a hash of `key` modulo the number of backends, in
/// unsigned arithmetic.
///
/// # Panics
///
/// Panics if `backends` is empty. Configuration validation rejects an empty
/// list, and [`HashSelector`] cannot be built from one.
pub fn select<'a>(backends: &'a [String], key: &str) -> &'a str {
    let index = fnv1a_32(key.as_bytes()) as usize % backends.len();
    &backends[index]
}

/// Backend selector over a fixed, non-empty backend list
///
/// Cheap to clone; clones share the list.
#[derive(Debug, Clone)]
pub struct HashSelector {
    backends: Arc<[String]>,
}

impl HashSelector {
    /// Create a selector
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBackends`] if `backends` is empty.
    pub fn new<I, S>(backends: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backends: Arc<[String]> = backends.into_iter().map(Into::into).collect();
        if backends.is_empty() {
            return Err(ConfigError::EmptyBackends);
        }

        Ok(Self { backends })
    }

    /// Backend address for `key`
    #[inline]
    pub fn select(&self, key: &str) -> &str {
        select(&self.backends, key)
    }

    pub fn backends(&self) -> &[String] {
        &self.backends
    }
}
