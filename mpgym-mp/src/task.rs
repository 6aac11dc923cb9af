//! Per-task adapter.
use crate::{MpError, ObsMask, PhaseConfig};
use anyhow::Result;
use mpgym_core::Env;
use ndarray::{Array1, ArrayView1};

/// Connects a step-based environment to [`BlackBoxEnv`](crate::BlackBoxEnv).
///
/// The adapter knows where the controlled joints live in the simulator
/// state, which observation entries the caller sees, how a context is
/// applied and when a running trajectory should be replaced.
pub trait MpTask {
    /// The low-level environment.
    type Env: Env<Obs = Array1<f64>, Act = Array1<f64>>;

    /// Configuration of the adapter.
    type Config: Clone;

    /// Builds the adapter.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Number of controlled degrees of freedom.
    fn num_dof(&self) -> usize;

    /// Duration of one low-level step in seconds.
    fn dt(&self, env: &Self::Env) -> f64;

    /// Current joint positions.
    fn current_pos(&self, env: &Self::Env) -> Array1<f64>;

    /// Current joint velocities.
    fn current_vel(&self, env: &Self::Env) -> Array1<f64>;

    /// Observation entries exposed to the caller.
    fn active_obs(&self) -> ObsMask;

    /// Whether the running trajectory should be replaced after step `t`.
    ///
    /// Only consulted in replanning mode. Must depend on its arguments only.
    #[allow(unused_variables)]
    fn do_replanning(
        &self,
        pos: ArrayView1<f64>,
        vel: ArrayView1<f64>,
        obs: &Array1<f64>,
        action: &Array1<f64>,
        t: usize,
        last_replan_step: usize,
    ) -> bool {
        false
    }

    /// Hook called with every validated action before trajectory generation.
    ///
    /// May rewrite the action (keeping its layout) and may return a bias added
    /// to every desired position. The call can still be rejected afterwards,
    /// so the simulator is only readable here; state changes belong in
    /// [`on_plan`](MpTask::on_plan).
    #[allow(unused_variables)]
    fn episode_callback(
        &self,
        env: &Self::Env,
        action: Array1<f64>,
        phase: &PhaseConfig,
    ) -> Result<(Array1<f64>, Option<Array1<f64>>), MpError> {
        Ok((action, None))
    }

    /// Called once a plan of `trajectory_length` steps has passed every check,
    /// right before its first step is executed.
    #[allow(unused_variables)]
    fn on_plan(&mut self, env: &mut Self::Env, phase: &PhaseConfig, trajectory_length: usize) {}

    /// Applies `context` to the simulator and returns the raw observation.
    ///
    /// Applying the same context twice must leave the same state.
    #[allow(unused_variables)]
    fn set_context(
        &mut self,
        env: &mut Self::Env,
        context: &[f64],
    ) -> Result<Array1<f64>, MpError> {
        Err(MpError::InvalidContext(
            "this task does not accept a context".into(),
        ))
    }

    /// Aggregates the rewards of one trajectory.
    fn aggregate_rewards(&self, rewards: &[f64]) -> f64 {
        rewards.iter().sum()
    }
}
