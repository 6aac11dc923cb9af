//! Decision rules.
use super::Env;

/// Chooses the next action of an [`Env`].
///
/// On a step-based simulator the action is a joint command. On an episodic
/// wrapper it is a whole parameter vector, so a policy there decides once per
/// trajectory rather than once per simulator step.
pub trait Policy<E: Env> {
    /// Returns the action for `obs`. May be stochastic.
    fn sample(&mut self, obs: &E::Obs) -> E::Act;
}
