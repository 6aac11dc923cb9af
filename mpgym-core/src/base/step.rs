//! Transition emitted by [`Env::step`].
use super::Env;

/// Environment-specific payload carried by a [`Step`].
pub trait Info {}

impl Info for () {}

/// Outcome of applying one action.
///
/// `obs` is the observation reached after `act`, `reward` the scalar reward of
/// the transition. For the episodic wrapper one step covers a whole executed
/// trajectory and `reward` is the aggregated trajectory reward.
pub struct Step<E: Env> {
    /// The applied action.
    pub act: E::Act,

    /// Observation after the action.
    pub obs: E::Obs,

    /// Reward of the transition.
    pub reward: f64,

    /// The episode reached a terminal state.
    pub is_terminated: bool,

    /// The episode was cut off, e.g. by a step budget.
    pub is_truncated: bool,

    /// Environment-specific payload.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Bundles the outcome of one action.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f64,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Self {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    /// `true` when no further action is accepted in this episode.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
