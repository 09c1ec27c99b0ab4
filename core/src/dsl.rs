//! Helpers running work under a policy from the global registry.

use crate::attempt::Action;
use crate::backoff::BackoffPolicy;
use crate::error::RetryError;
use crate::policy::get_global_policy;
use crate::retry::{CompletionState, RetryExecutor};

/// Errors produced by the DSL helpers.
#[derive(Debug, thiserror::Error)]
pub enum DslError<E> {
    /// Referenced policy name is missing from the global registry.
    #[error("retry policy '{0}' is not registered")]
    PolicyMissing(String),
    /// Underlying retry execution failed.
    #[error("{0}")]
    Execution(RetryError<E>),
}

impl<E> From<RetryError<E>> for DslError<E> {
    fn from(value: RetryError<E>) -> Self {
        DslError::Execution(value)
    }
}

/// Construct a [`RetryExecutor`] configured by a named global policy.
pub fn builder_for_policy<F, E>(
    policy_name: &str,
    action: F,
) -> Result<RetryExecutor<Action<F>, BackoffPolicy>, DslError<E>>
where
    F: FnMut() -> Result<(), E>,
{
    let policy = get_global_policy(policy_name)
        .ok_or_else(|| DslError::PolicyMissing(policy_name.to_string()))?;

    Ok(RetryExecutor::new(Action(action)).with_policy(policy))
}

/// Run an action, blocking, under a named global policy.
pub fn retry_with_policy<F, E>(policy_name: &str, action: F) -> Result<CompletionState, DslError<E>>
where
    F: FnMut() -> Result<(), E>,
{
    Ok(builder_for_policy(policy_name, action)?.run()?)
}
