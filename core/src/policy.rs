//! Named retry policy management.
//!
//! A [`RetryPolicy`] bundles an attempt budget with a [`BackoffPolicy`].
//! Policies can be kept in a local [`PolicyRegistry`] or in the process-wide
//! registry exposed by the `*_global_policy` functions, and applied to an
//! executor with [`RetryExecutor::with_policy`](crate::RetryExecutor::with_policy).

use crate::backoff::BackoffPolicy;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Reusable executor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, `0` for unlimited
    pub max_tries: u32,
    /// Strategy computing the delay between attempts
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts
    pub fn max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Set the backoff strategy
    pub fn backoff(mut self, backoff: impl Into<BackoffPolicy>) -> Self {
        self.backoff = backoff.into();
        self
    }
}

/// In-memory registry for named [`RetryPolicy`] values.
///
/// Lookups are linear; registries are expected to hold a handful of
/// entries.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    entries: Vec<(String, RetryPolicy)>,
}

impl PolicyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a policy under the given name.
    ///
    /// Returns the previously registered policy if one existed.
    pub fn register(&mut self, name: impl Into<String>, policy: RetryPolicy) -> Option<RetryPolicy> {
        let name = name.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing_name, _)| *existing_name == name)
        {
            Some((_, existing)) => Some(std::mem::replace(existing, policy)),
            None => {
                self.entries.push((name, policy));
                None
            }
        }
    }

    /// Retrieve a copy of a policy by name.
    pub fn get(&self, name: &str) -> Option<RetryPolicy> {
        self.entries
            .iter()
            .find(|(existing_name, _)| existing_name == name)
            .map(|(_, policy)| *policy)
    }

    /// Remove a policy by name, returning it when it existed.
    pub fn remove(&mut self, name: &str) -> Option<RetryPolicy> {
        let index = self
            .entries
            .iter()
            .position(|(existing_name, _)| existing_name == name)?;
        Some(self.entries.swap_remove(index).1)
    }

    /// Return all registered policies as `(name, policy)` tuples.
    pub fn all(&self) -> Vec<(String, RetryPolicy)> {
        self.entries.clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn global_registry() -> &'static RwLock<PolicyRegistry> {
    static GLOBAL_POLICIES: OnceLock<RwLock<PolicyRegistry>> = OnceLock::new();
    GLOBAL_POLICIES.get_or_init(|| RwLock::new(PolicyRegistry::new()))
}

/// Register a policy in the global registry.
pub fn register_global_policy(name: impl Into<String>, policy: RetryPolicy) -> Option<RetryPolicy> {
    global_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, policy)
}

/// Fetch a policy from the global registry.
pub fn get_global_policy(name: &str) -> Option<RetryPolicy> {
    global_registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
}

/// Remove a policy from the global registry.
pub fn remove_global_policy(name: &str) -> Option<RetryPolicy> {
    global_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(name)
}

/// List all policies in the global registry.
pub fn list_global_policies() -> Vec<(String, RetryPolicy)> {
    global_registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .all()
}

/// Clear all entries from the global registry.
pub fn clear_global_policies() {
    global_registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
