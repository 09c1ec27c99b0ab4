//! Adapters turning caller-supplied work into a single attempt operation.
//!
//! Every adapter reports `Ok(true)` for success and `Ok(false)` for a clean
//! failure. Errors raised by the work are passed through untouched so the
//! executor remains the only place where they are classified.

use std::convert::Infallible;

/// One unit of retryable work
pub trait Attempt {
    /// Error the work may raise
    type Error;

    /// Run the work once and report whether it succeeded.
    fn attempt(&mut self) -> Result<bool, Self::Error>;
}

/// Work with no result: it succeeded if it did not raise an error.
#[derive(Debug, Clone)]
pub struct Action<F>(pub F);

impl<F, E> Attempt for Action<F>
where
    F: FnMut() -> Result<(), E>,
{
    type Error = E;

    fn attempt(&mut self) -> Result<bool, E> {
        (self.0)().map(|()| true)
    }
}

/// Work that reports its own success as a boolean.
#[derive(Debug, Clone)]
pub struct Check<F>(pub F);

impl<F, E> Attempt for Check<F>
where
    F: FnMut() -> Result<bool, E>,
{
    type Error = E;

    fn attempt(&mut self) -> Result<bool, E> {
        (self.0)()
    }
}

impl Check<()> {
    /// Wrap boolean work that cannot raise errors.
    pub fn infallible<G>(mut work: G) -> Check<impl FnMut() -> Result<bool, Infallible>>
    where
        G: FnMut() -> bool,
    {
        Check(move || Ok(work()))
    }
}

/// Work run for its effect, followed by a separate completion check.
///
/// The predicate is only evaluated when the work returned normally.
#[derive(Debug, Clone)]
pub struct Until<F, P> {
    work: F,
    done: P,
}

impl<F, P> Until<F, P> {
    pub fn new(work: F, done: P) -> Self {
        Self { work, done }
    }
}

impl<F, P, E> Attempt for Until<F, P>
where
    F: FnMut() -> Result<(), E>,
    P: FnMut() -> bool,
{
    type Error = E;

    fn attempt(&mut self) -> Result<bool, E> {
        (self.work)()?;
        Ok((self.done)())
    }
}
