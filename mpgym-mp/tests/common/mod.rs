//! A kinematic joint simulator used by the integration tests.
#![allow(dead_code)]
use anyhow::{bail, Result};
use mpgym_core::{record::Record, Env, Step};
use mpgym_mp::{MpError, MpTask, ObsMask, PhaseConfig};
use ndarray::{Array1, ArrayView1};

#[derive(Clone, Debug)]
pub struct JointEnvConfig {
    pub num_dof: usize,
    pub dt: f64,
    pub terminate_at: Option<usize>,
    pub fail_at: Option<usize>,
}

impl JointEnvConfig {
    pub fn new(num_dof: usize) -> Self {
        Self {
            num_dof,
            dt: 0.01,
            terminate_at: None,
            fail_at: None,
        }
    }
}

/// Joints follow the commanded position exactly. The reward of step `t`
/// (1-based) is `t`, so reward sums are exact.
pub struct JointEnv {
    pub config: JointEnvConfig,
    pub pos: Array1<f64>,
    pub vel: Array1<f64>,
    pub goal: f64,
    pub t: usize,
    pub release_step: Option<usize>,
    pub commands: Vec<Array1<f64>>,
}

impl JointEnv {
    fn obs(&self) -> Array1<f64> {
        let mut obs = self.pos.to_vec();
        obs.extend(self.vel.iter());
        obs.push(self.goal);
        obs.push(self.t as f64);
        Array1::from(obs)
    }

    pub fn obs_len(num_dof: usize) -> usize {
        2 * num_dof + 2
    }
}

impl Env for JointEnv {
    type Config = JointEnvConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            pos: Array1::zeros(config.num_dof),
            vel: Array1::zeros(config.num_dof),
            goal: 0.0,
            t: 0,
            release_step: None,
            commands: vec![],
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        if Some(self.t + 1) == self.config.fail_at {
            bail!("joint limit violated at step {}", self.t + 1);
        }
        self.t += 1;
        self.vel = (a - &self.pos) / self.config.dt;
        self.pos = a.clone();
        self.commands.push(a.clone());
        let terminated = Some(self.t) == self.config.terminate_at;
        let step = Step::new(self.obs(), a.clone(), self.t as f64, terminated, false, ());
        Ok((step, Record::from_scalar("command", a[0])))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.pos.fill(0.0);
        self.vel.fill(0.0);
        self.goal = 0.0;
        self.t = 0;
        self.release_step = None;
        self.commands.clear();
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

#[derive(Clone, Debug, Default)]
pub struct JointTaskConfig {
    pub num_dof: usize,
    /// Replan when `t % n == 0`.
    pub replan_every: Option<usize>,
    /// Overrides the default mask, which exposes the goal only.
    pub mask: Option<Vec<bool>>,
    pub bias: Option<Vec<f64>>,
}

pub struct JointTask {
    config: JointTaskConfig,
}

impl MpTask for JointTask {
    type Env = JointEnv;
    type Config = JointTaskConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    fn num_dof(&self) -> usize {
        self.config.num_dof
    }

    fn dt(&self, env: &Self::Env) -> f64 {
        env.config.dt
    }

    fn current_pos(&self, env: &Self::Env) -> Array1<f64> {
        env.pos.clone()
    }

    fn current_vel(&self, env: &Self::Env) -> Array1<f64> {
        env.vel.clone()
    }

    fn active_obs(&self) -> ObsMask {
        match &self.config.mask {
            Some(mask) => ObsMask::from_bools(mask.clone()),
            None => ObsMask::builder()
                .component("pos", self.config.num_dof, false)
                .component("vel", self.config.num_dof, false)
                .component("goal", 1, true)
                .component("steps", 1, false)
                .build(),
        }
    }

    fn do_replanning(
        &self,
        _pos: ArrayView1<f64>,
        _vel: ArrayView1<f64>,
        _obs: &Array1<f64>,
        _action: &Array1<f64>,
        t: usize,
        _last_replan_step: usize,
    ) -> bool {
        match self.config.replan_every {
            Some(n) => t % n == 0,
            None => false,
        }
    }

    fn episode_callback(
        &self,
        _env: &Self::Env,
        action: Array1<f64>,
        _phase: &PhaseConfig,
    ) -> Result<(Array1<f64>, Option<Array1<f64>>), MpError> {
        let bias = self.config.bias.clone().map(Array1::from);
        Ok((action, bias))
    }

    fn on_plan(&mut self, env: &mut Self::Env, phase: &PhaseConfig, trajectory_length: usize) {
        if phase.learn_tau {
            env.release_step = Some(env.t + trajectory_length);
        }
    }

    fn set_context(
        &mut self,
        env: &mut Self::Env,
        context: &[f64],
    ) -> Result<Array1<f64>, MpError> {
        match context {
            [goal] if goal.abs() <= 1.0 => {
                env.goal = *goal;
                Ok(env.obs())
            }
            _ => Err(MpError::InvalidContext(format!(
                "expected one goal in [-1, 1], got {:?}",
                context
            ))),
        }
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
