//! Scoring a [`Policy`] on an [`Env`].
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Runs a policy and summarizes how well it did.
pub trait Evaluator<E: Env> {
    /// Returns a [`Record`] with at least the key `Episode return`.
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>;
}
