//! Episodic wrapper executing movement primitives on a step-based environment.
use crate::{
    Controller, MpConfig, MpError, MpTask, ObsMask, PhaseConfig, TrajectoryGenerator,
};
use anyhow::Result;
use log::{debug, trace};
use mpgym_core::{
    record::{Record, RecordValue},
    Env, Info, Step,
};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// When to replace a running trajectory, independent of the task adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReplanSchedule {
    /// Leave the decision to [`MpTask::do_replanning`].
    Never,

    /// Replan whenever the low-level step count is a multiple of `interval`.
    Every {
        /// Steps between two plans. `0` never fires.
        interval: usize,
    },
}

impl Default for ReplanSchedule {
    fn default() -> Self {
        Self::Never
    }
}

impl ReplanSchedule {
    /// Whether the schedule fires at low-level step `t`.
    pub fn fires(&self, t: usize) -> bool {
        match self {
            Self::Never => false,
            Self::Every { interval } => *interval > 0 && t % interval == 0,
        }
    }
}

/// Configuration of the episode execution in [`BlackBoxEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackBoxConfig {
    /// Allow a trajectory to be cut short by a replanning request.
    pub replanning: bool,

    /// Schedule consulted in addition to the task adapter.
    pub replan_schedule: ReplanSchedule,

    /// Maximum number of plans per episode; `None` is unbounded.
    pub max_planning_times: Option<usize>,

    /// Low-level step budget of an episode; reaching it truncates.
    pub max_episode_steps: Option<usize>,

    /// `2` or more keeps the planned and executed trajectories in
    /// [`BlackBoxInfo`].
    pub verbose: u8,
}

impl Default for BlackBoxConfig {
    fn default() -> Self {
        Self {
            replanning: false,
            replan_schedule: ReplanSchedule::Never,
            max_planning_times: None,
            max_episode_steps: None,
            verbose: 1,
        }
    }
}

impl BlackBoxConfig {
    /// Enables replanning with the given schedule.
    pub fn replanning(mut self, schedule: ReplanSchedule) -> Self {
        self.replanning = true;
        self.replan_schedule = schedule;
        self
    }

    /// Sets the maximum number of plans per episode.
    pub fn max_planning_times(mut self, v: Option<usize>) -> Self {
        self.max_planning_times = v;
        self
    }

    /// Sets the low-level step budget.
    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the verbosity of [`BlackBoxInfo`].
    pub fn verbose(mut self, v: u8) -> Self {
        self.verbose = v;
        self
    }
}

/// Where an episode stands between two calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    /// No reset yet.
    Uninitialized,

    /// Reset done, or in replanning mode the last trajectory ran out; the
    /// next action starts a plan.
    Idle,

    /// A trajectory is being tracked.
    Playing,

    /// The last trajectory was cut short by a replanning request.
    ReplanPending,

    /// Terminated or truncated. Without replanning this includes the end of
    /// the single trajectory.
    Done,
}

/// Step bookkeeping of the running episode.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplanState {
    /// Low-level steps taken in the episode.
    pub t: usize,

    /// Value of `t` at the most recent replan, `0` before the first one.
    pub last_replan_step: usize,

    /// Generator invocations in the episode.
    pub plan_count: usize,

    /// State machine.
    pub episode: EpisodeState,
}

impl ReplanState {
    fn new() -> Self {
        Self {
            t: 0,
            last_replan_step: 0,
            plan_count: 0,
            episode: EpisodeState::Uninitialized,
        }
    }

    fn restart(&mut self) {
        self.t = 0;
        self.last_replan_step = 0;
        self.plan_count = 0;
        self.episode = EpisodeState::Idle;
    }
}

/// Diagnostics of one high-level step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlackBoxInfo {
    /// Reward of every executed low-level step.
    pub step_rewards: Vec<f64>,

    /// Length of the generated trajectory.
    pub trajectory_length: usize,

    /// The trajectory was cut short by a replanning request.
    pub replan_requested: bool,

    /// Planned positions, when `verbose >= 2`.
    pub positions: Option<Array2<f64>>,

    /// Planned velocities, when `verbose >= 2`.
    pub velocities: Option<Array2<f64>>,

    /// Executed low-level actions, when `verbose >= 2`.
    pub step_actions: Option<Vec<Array1<f64>>>,

    /// Raw observations after every low-level step, when `verbose >= 2`.
    pub step_observations: Option<Vec<Array1<f64>>>,

    /// Diagnostics of every low-level step, when `verbose >= 2`.
    pub step_records: Option<Vec<Record>>,
}

impl Info for BlackBoxInfo {}

impl BlackBoxInfo {
    /// Summarizes the step as a [`Record`].
    pub fn to_record(&self, reward: f64) -> Record {
        let mut record = Record::from_scalar("reward", reward);
        record.insert(
            "trajectory_length",
            RecordValue::Scalar(self.trajectory_length as f64),
        );
        record.insert(
            "executed_steps",
            RecordValue::Scalar(self.step_rewards.len() as f64),
        );
        record.insert(
            "step_rewards",
            RecordValue::Array1(self.step_rewards.clone()),
        );
        record
    }
}

/// Aggregated transition returned by [`BlackBoxEnv::step_trajectory`].
#[derive(Debug, Clone)]
pub struct BlackBoxStep {
    /// Final observation after the active observation mask.
    pub obs: Array1<f64>,

    /// Aggregated reward.
    pub reward: f64,

    /// The underlying environment terminated.
    pub is_terminated: bool,

    /// The underlying environment or the step budget truncated the episode.
    pub is_truncated: bool,

    /// Diagnostics.
    pub info: BlackBoxInfo,
}

impl BlackBoxStep {
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// Drives a step-based environment with a movement primitive.
///
/// Every action passed to [`step_trajectory`](BlackBoxEnv::step_trajectory)
/// is a parameter vector `[tau?, delay?, weights...]`. It is expanded into a
/// [`Trajectory`](crate::Trajectory) starting from the current joint state,
/// tracked row by row with the configured [`Controller`], and the collected
/// rewards are aggregated by the task adapter.
///
/// Without replanning an episode is a single trajectory: once it has been
/// tracked to its end the episode is truncated. In replanning mode a
/// trajectory may be cut short, or run out before the episode ends. The call
/// then returns and the next action is planned from the state reached so far.
pub struct BlackBoxEnv<T: MpTask> {
    env: T::Env,
    task: T,
    generator: Box<dyn TrajectoryGenerator>,
    phase: PhaseConfig,
    controller: Controller,
    config: BlackBoxConfig,
    mask: ObsMask,
    state: ReplanState,
}

impl<T: MpTask> BlackBoxEnv<T> {
    /// Wraps `env`.
    pub fn new(env: T::Env, task: T, config: &MpConfig) -> Result<Self, MpError> {
        config.phase.validate()?;
        let num_dof = task.num_dof();
        let generator = config.generator.build(num_dof, &config.phase)?;
        let controller = config.controller.build(num_dof)?;
        if let Some(0) = config.black_box.max_planning_times {
            return Err(MpError::InvalidConfig(
                "max_planning_times must be at least 1".into(),
            ));
        }
        let mask = task.active_obs();
        debug!(
            "BlackBoxEnv with {} generator, {} dof, {} parameters",
            config.generator.name(),
            num_dof,
            config.phase.num_params() + generator.num_weights()
        );

        Ok(Self {
            env,
            task,
            generator,
            phase: config.phase.clone(),
            controller,
            config: config.black_box.clone(),
            mask,
            state: ReplanState::new(),
        })
    }

    /// Length of an action.
    pub fn num_params(&self) -> usize {
        self.phase.num_params() + self.generator.num_weights()
    }

    /// Timing configuration.
    pub fn phase(&self) -> &PhaseConfig {
        &self.phase
    }

    /// Number of generator weights in an action.
    pub fn num_weights(&self) -> usize {
        self.generator.num_weights()
    }

    /// Bookkeeping of the running episode.
    pub fn replan_state(&self) -> &ReplanState {
        &self.state
    }

    /// The active observation mask.
    pub fn obs_mask(&self) -> &ObsMask {
        &self.mask
    }

    /// The underlying environment.
    pub fn env(&self) -> &T::Env {
        &self.env
    }

    /// The task adapter.
    pub fn task(&self) -> &T {
        &self.task
    }

    /// Resets the environment, applies `context` if given and returns the
    /// masked initial observation.
    pub fn reset_with_context(&mut self, context: Option<&[f64]>) -> Result<Array1<f64>, MpError> {
        let obs = self.env.reset().map_err(MpError::SimulatorFault)?;
        let obs = match context {
            Some(context) => self.task.set_context(&mut self.env, context)?,
            None => obs,
        };
        self.start_episode(obs)
    }

    /// Resets the environment with an index, see [`Env::reset_with_index`].
    pub fn reset_with_index(&mut self, ix: usize) -> Result<Array1<f64>, MpError> {
        let obs = self
            .env
            .reset_with_index(ix)
            .map_err(MpError::SimulatorFault)?;
        self.start_episode(obs)
    }

    fn start_episode(&mut self, obs: Array1<f64>) -> Result<Array1<f64>, MpError> {
        let obs = self.mask.apply(&obs)?;
        self.state.restart();
        trace!("reset: obs = {:?}", obs);
        Ok(obs)
    }

    fn replanning_fires(
        &self,
        obs: &Array1<f64>,
        action: &Array1<f64>,
        steps_in_plan: usize,
    ) -> bool {
        if !self.config.replanning || steps_in_plan == 0 {
            return false;
        }
        if let Some(max) = self.config.max_planning_times {
            if self.state.plan_count >= max {
                return false;
            }
        }
        let t = self.state.t;
        self.config.replan_schedule.fires(t) || {
            let pos = self.task.current_pos(&self.env);
            let vel = self.task.current_vel(&self.env);
            self.task.do_replanning(
                pos.view(),
                vel.view(),
                obs,
                action,
                t,
                self.state.last_replan_step,
            )
        }
    }

    /// Executes one high-level action.
    pub fn step_trajectory(&mut self, action: &Array1<f64>) -> Result<BlackBoxStep, MpError> {
        match self.state.episode {
            EpisodeState::Uninitialized => return Err(MpError::NotReset),
            EpisodeState::Done => return Err(MpError::EpisodeFinished),
            _ => {}
        }

        let num_weights = self.generator.num_weights();
        let action = action.to_vec();
        self.phase.split(&action, num_weights)?;

        let (action, bias) =
            self.task
                .episode_callback(&self.env, Array1::from(action), &self.phase)?;
        let action = action.to_vec();
        let params = self.phase.split(&action, num_weights)?;

        let dt = self.task.dt(&self.env);
        let init_pos = self.task.current_pos(&self.env);
        let init_vel = self.task.current_vel(&self.env);
        let mut traj = self.generator.generate(
            params.weights,
            init_pos.view(),
            init_vel.view(),
            params.tau,
            params.delay,
            dt,
        )?;
        if traj.is_empty() {
            return Err(MpError::EmptyTrajectory {
                tau: params.tau,
                delay: params.delay,
                dt,
            });
        }
        if let Some(bias) = bias {
            traj.add_position_bias(bias.view())?;
        }

        // Nothing below may fail before the first simulator step.
        self.task.on_plan(&mut self.env, &self.phase, traj.len());
        if self.state.t > 0 {
            self.state.last_replan_step = self.state.t;
        }
        self.state.plan_count += 1;
        self.state.episode = EpisodeState::Playing;
        debug!(
            "plan {} at t = {}: tau = {}, delay = {}, {} steps",
            self.state.plan_count,
            self.state.t,
            params.tau,
            params.delay,
            traj.len()
        );

        let verbose = self.config.verbose >= 2;
        let mut step_rewards = Vec::with_capacity(traj.len());
        let mut step_actions = Vec::new();
        let mut step_observations = Vec::new();
        let mut step_records = Vec::new();
        let mut obs = None;
        let (mut is_terminated, mut is_truncated, mut replan_requested) = (false, false, false);

        let rows = traj.pos.rows().into_iter().zip(traj.vel.rows());
        for (k, (des_pos, des_vel)) in rows.enumerate() {
            let c_pos = self.task.current_pos(&self.env);
            let c_vel = self.task.current_vel(&self.env);
            let low_act = self
                .controller
                .get_action(des_pos, des_vel, c_pos.view(), c_vel.view());
            let (step, record) = self.env.step(&low_act).map_err(MpError::SimulatorFault)?;
            self.state.t += 1;

            step_rewards.push(step.reward);
            is_terminated = step.is_terminated;
            is_truncated = step.is_truncated;
            if let Some(max) = self.config.max_episode_steps {
                if self.state.t >= max {
                    is_truncated = true;
                }
            }
            if verbose {
                step_actions.push(low_act.clone());
                step_observations.push(step.obs.clone());
                step_records.push(record);
            }

            let done = is_terminated || is_truncated;
            if !done && self.replanning_fires(&step.obs, &low_act, k + 1) {
                debug!("replanning requested at t = {}", self.state.t);
                replan_requested = true;
            }
            obs = Some(step.obs);
            if done || replan_requested {
                break;
            }
        }

        // traj is non-empty, so at least one step was taken
        let obs = obs.ok_or(MpError::EmptyTrajectory {
            tau: params.tau,
            delay: params.delay,
            dt,
        })?;
        let obs = self.mask.apply(&obs)?;
        let reward = self.task.aggregate_rewards(&step_rewards);

        if !self.config.replanning && !(is_terminated || is_truncated) {
            debug!("trajectory finished at t = {}, episode ends", self.state.t);
            is_truncated = true;
        }

        self.state.episode = if is_terminated || is_truncated {
            EpisodeState::Done
        } else if replan_requested {
            EpisodeState::ReplanPending
        } else {
            EpisodeState::Idle
        };
        trace!(
            "step: reward = {}, t = {}, state = {:?}",
            reward,
            self.state.t,
            self.state.episode
        );

        let info = BlackBoxInfo {
            step_rewards,
            trajectory_length: traj.len(),
            replan_requested,
            positions: verbose.then(|| traj.pos.clone()),
            velocities: verbose.then(|| traj.vel.clone()),
            step_actions: verbose.then(|| step_actions),
            step_observations: verbose.then(|| step_observations),
            step_records: verbose.then(|| step_records),
        };

        Ok(BlackBoxStep {
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        })
    }
}

/// Configuration of [`BlackBoxEnv`] as an [`Env`].
pub struct BlackBoxEnvConfig<T: MpTask> {
    /// Configuration of the underlying environment.
    pub env: <T::Env as Env>::Config,

    /// Configuration of the task adapter.
    pub task: T::Config,

    /// Movement primitive configuration.
    pub mp: MpConfig,
}

impl<T: MpTask> Clone for BlackBoxEnvConfig<T> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            task: self.task.clone(),
            mp: self.mp.clone(),
        }
    }
}

impl<T: MpTask> Env for BlackBoxEnv<T> {
    type Config = BlackBoxEnvConfig<T>;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = BlackBoxInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let env = <T::Env as Env>::build(&config.env, seed)?;
        let task = T::build(&config.task)?;
        Ok(Self::new(env, task, &config.mp)?)
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        let step = self.step_trajectory(a)?;
        let record = step.info.to_record(step.reward);
        let step = Step::new(
            step.obs,
            a.clone(),
            step.reward,
            step.is_terminated,
            step.is_truncated,
            step.info,
        );
        Ok((step, record))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        Ok(self.reset_with_context(None)?)
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        Ok(BlackBoxEnv::reset_with_index(self, ix)?)
    }
}

/// Object-safe view of a [`BlackBoxEnv`], used where the task type is erased.
pub trait EpisodicEnv {
    /// See [`BlackBoxEnv::reset_with_context`].
    fn reset_with_context(&mut self, context: Option<&[f64]>) -> Result<Array1<f64>, MpError>;

    /// See [`BlackBoxEnv::reset_with_index`].
    fn reset_with_index(&mut self, ix: usize) -> Result<Array1<f64>, MpError>;

    /// See [`BlackBoxEnv::step_trajectory`].
    fn step_trajectory(&mut self, action: &Array1<f64>) -> Result<BlackBoxStep, MpError>;

    /// Length of an action.
    fn num_params(&self) -> usize;

    /// Number of generator weights in an action.
    fn num_weights(&self) -> usize;

    /// Timing configuration.
    fn phase(&self) -> &PhaseConfig;

    /// Bookkeeping of the running episode.
    fn replan_state(&self) -> &ReplanState;

    /// Length of the masked observation.
    fn obs_dim(&self) -> usize;
}

impl<T: MpTask> EpisodicEnv for BlackBoxEnv<T> {
    fn reset_with_context(&mut self, context: Option<&[f64]>) -> Result<Array1<f64>, MpError> {
        BlackBoxEnv::reset_with_context(self, context)
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Array1<f64>, MpError> {
        BlackBoxEnv::reset_with_index(self, ix)
    }

    fn step_trajectory(&mut self, action: &Array1<f64>) -> Result<BlackBoxStep, MpError> {
        BlackBoxEnv::step_trajectory(self, action)
    }

    fn num_params(&self) -> usize {
        BlackBoxEnv::num_params(self)
    }

    fn num_weights(&self) -> usize {
        BlackBoxEnv::num_weights(self)
    }

    fn phase(&self) -> &PhaseConfig {
        BlackBoxEnv::phase(self)
    }

    fn replan_state(&self) -> &ReplanState {
        BlackBoxEnv::replan_state(self)
    }

    fn obs_dim(&self) -> usize {
        self.mask.active_len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_schedule() {
        let s = ReplanSchedule::Every { interval: 50 };
        assert!(!s.fires(49));
        assert!(s.fires(50));
        assert!(s.fires(100));
        assert!(!ReplanSchedule::Every { interval: 0 }.fires(0));
        assert!(!ReplanSchedule::Never.fires(50));
    }

    #[test]
    fn test_info_record() {
        let info = BlackBoxInfo {
            step_rewards: vec![1.0, 2.0],
            trajectory_length: 5,
            ..Default::default()
        };
        let record = info.to_record(3.0);
        assert_eq!(record.get_scalar("reward").unwrap(), 3.0);
        assert_eq!(record.get_scalar("trajectory_length").unwrap(), 5.0);
        assert_eq!(record.get_array1("step_rewards").unwrap(), vec![1.0, 2.0]);
    }
}
