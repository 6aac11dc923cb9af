//! Errors of the episodic wrapper.
use thiserror::Error;

/// Errors raised by [`BlackBoxEnv`](crate::BlackBoxEnv) and its collaborators.
///
/// Validation errors are raised before the first simulator step of the
/// offending call. Any error should be treated as the end of the episode.
#[derive(Error, Debug)]
pub enum MpError {
    /// The context was rejected by the task adapter.
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// Wrong number of parameters or duration/delay out of bounds.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// The generator produced a trajectory without a single step.
    #[error("empty trajectory (tau = {tau}, delay = {delay}, dt = {dt})")]
    EmptyTrajectory {
        /// Duration of the movement.
        tau: f64,
        /// Start delay.
        delay: f64,
        /// Simulation time step.
        dt: f64,
    },

    /// Observation length does not match the mask.
    #[error("observation mask covers {mask} components, observation has {obs}")]
    ObservationMask {
        /// Length of the mask.
        mask: usize,
        /// Length of the raw observation.
        obs: usize,
    },

    /// Error propagated from the underlying simulator.
    #[error("simulator fault: {0}")]
    SimulatorFault(#[source] anyhow::Error),

    /// Stepping an episode that already terminated or was truncated.
    #[error("episode finished, reset the environment")]
    EpisodeFinished,

    /// Stepping before the first reset.
    #[error("environment has not been reset")]
    NotReset,

    /// Inconsistent configuration detected while building.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
