//! Planar n-link arm reaching for a goal.
use crate::reacher::{distance, end_effector, sample_in_disc};
use anyhow::Result;
use log::trace;
use mpgym_core::{record::Record, Env, Step};
use mpgym_mp::{MpError, MpTask, ObsMask, PhaseConfig};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Configuration of [`SimpleReacherEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleReacherConfig {
    /// Number of links, each of length one.
    pub n_links: usize,

    /// Integration time step.
    pub dt: f64,

    /// Steps after which the episode is truncated.
    pub max_steps: usize,

    /// The distance penalty is paid from this step on (1-based).
    pub steps_before_reward: usize,

    /// Joint accelerations are clipped to `[-max_action, max_action]`.
    pub max_action: f64,

    /// Weight of the squared-action penalty.
    pub ctrl_cost_weight: f64,

    /// Fixed goal. Sampled in the reachable disc at every reset if `None`.
    pub goal: Option<[f64; 2]>,
}

impl Default for SimpleReacherConfig {
    fn default() -> Self {
        Self {
            n_links: 2,
            dt: 0.01,
            max_steps: 200,
            steps_before_reward: 200,
            max_action: 10.0,
            ctrl_cost_weight: 1e-4,
            goal: None,
        }
    }
}

impl SimpleReacherConfig {
    /// Sets the number of links.
    pub fn n_links(mut self, v: usize) -> Self {
        self.n_links = v;
        self
    }

    /// Sets the step of the first distance penalty.
    pub fn steps_before_reward(mut self, v: usize) -> Self {
        self.steps_before_reward = v;
        self
    }

    /// Fixes the goal.
    pub fn goal(mut self, v: Option<[f64; 2]>) -> Self {
        self.goal = v;
        self
    }
}

/// Planar arm driven by joint accelerations.
///
/// Observation: `cos(q)`, `sin(q)`, goal, `q'`, end effector minus goal and
/// the step count, `3 * n_links + 5` entries.
pub struct SimpleReacherEnv {
    config: SimpleReacherConfig,
    seed: u64,
    rng: fastrand::Rng,
    angles: Array1<f64>,
    velocities: Array1<f64>,
    goal: [f64; 2],
    steps: usize,
    steps_before_reward: usize,
}

impl SimpleReacherEnv {
    /// Length of the observation for `n_links` links.
    pub fn obs_len(n_links: usize) -> usize {
        3 * n_links + 5
    }

    fn obs(&self) -> Array1<f64> {
        let ee = end_effector(&self.angles);
        let mut obs = Vec::with_capacity(Self::obs_len(self.config.n_links));
        obs.extend(self.angles.iter().map(|a| a.cos()));
        obs.extend(self.angles.iter().map(|a| a.sin()));
        obs.extend(self.goal);
        obs.extend(self.velocities.iter());
        obs.extend([ee[0] - self.goal[0], ee[1] - self.goal[1]]);
        obs.push(self.steps as f64);
        Array1::from(obs)
    }

    /// Current goal.
    pub fn goal(&self) -> [f64; 2] {
        self.goal
    }

    /// Joint angles.
    pub fn angles(&self) -> &Array1<f64> {
        &self.angles
    }

    /// Joint velocities.
    pub fn velocities(&self) -> &Array1<f64> {
        &self.velocities
    }

    /// Integration time step.
    pub fn dt(&self) -> f64 {
        self.config.dt
    }

    /// Steps taken in the running episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Step of the first distance penalty in the running episode.
    pub fn steps_before_reward(&self) -> usize {
        self.steps_before_reward
    }

    pub(crate) fn set_goal(&mut self, goal: [f64; 2]) -> Array1<f64> {
        self.goal = goal;
        self.obs()
    }

    pub(crate) fn set_steps_before_reward(&mut self, v: usize) {
        self.steps_before_reward = v;
    }
}

impl Env for SimpleReacherEnv {
    type Config = SimpleReacherConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.n_links == 0 {
            anyhow::bail!("SimpleReacherEnv needs at least one link");
        }
        let n = config.n_links;
        Ok(Self {
            config: config.clone(),
            seed: seed as u64,
            rng: fastrand::Rng::with_seed(seed as u64),
            angles: Array1::zeros(n),
            velocities: Array1::zeros(n),
            goal: config.goal.unwrap_or([n as f64, 0.0]),
            steps: 0,
            steps_before_reward: config.steps_before_reward,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        if a.len() != self.config.n_links {
            anyhow::bail!(
                "action has {} entries, arm has {} links",
                a.len(),
                self.config.n_links
            );
        }
        let max = self.config.max_action;
        let acc = a.mapv(|v| v.clamp(-max, max));
        self.velocities = &self.velocities + &(&acc * self.config.dt);
        self.angles = &self.angles + &(&self.velocities * self.config.dt);
        self.steps += 1;

        let dist = distance(end_effector(&self.angles), self.goal);
        let ctrl_cost = self.config.ctrl_cost_weight * acc.mapv(|v| v * v).sum();
        let reward_dist = if self.steps >= self.steps_before_reward {
            -dist
        } else {
            0.0
        };
        let reward = reward_dist - ctrl_cost;
        let is_truncated = self.steps >= self.config.max_steps;
        trace!("SimpleReacherEnv step {}: dist = {}", self.steps, dist);

        let step = Step::new(self.obs(), a.clone(), reward, false, is_truncated, ());
        let record = Record::from_scalar("distance", dist);
        Ok((step, record))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.angles.fill(0.0);
        self.velocities.fill(0.0);
        self.steps = 0;
        self.steps_before_reward = self.config.steps_before_reward;
        self.goal = match self.config.goal {
            Some(goal) => goal,
            None => sample_in_disc(&mut self.rng, self.config.n_links as f64),
        };
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = fastrand::Rng::with_seed(self.seed.wrapping_add(ix as u64));
        self.reset()
    }
}

/// Movement primitive adapter of [`SimpleReacherEnv`].
///
/// Exposes the goal only and takes a goal as context. With a learned
/// duration the distance penalty starts when the movement ends.
pub struct SimpleReacherTask {
    n_links: usize,
}

impl MpTask for SimpleReacherTask {
    type Env = SimpleReacherEnv;
    type Config = SimpleReacherConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            n_links: config.n_links,
        })
    }

    fn num_dof(&self) -> usize {
        self.n_links
    }

    fn dt(&self, env: &Self::Env) -> f64 {
        env.dt()
    }

    fn current_pos(&self, env: &Self::Env) -> Array1<f64> {
        env.angles().clone()
    }

    fn current_vel(&self, env: &Self::Env) -> Array1<f64> {
        env.velocities().clone()
    }

    fn active_obs(&self) -> ObsMask {
        let n = self.n_links;
        ObsMask::builder()
            .component("cos", n, false)
            .component("sin", n, false)
            .component("goal", 2, true)
            .component("joint_velocities", n, false)
            .component("end_effector_to_goal", 2, false)
            .component("steps", 1, false)
            .build()
    }

    fn on_plan(&mut self, env: &mut Self::Env, phase: &PhaseConfig, trajectory_length: usize) {
        // The distance penalty starts with the last step of the movement.
        if phase.learn_tau {
            env.set_steps_before_reward(env.steps() + trajectory_length);
        }
    }

    fn set_context(
        &mut self,
        env: &mut Self::Env,
        context: &[f64],
    ) -> Result<Array1<f64>, MpError> {
        let goal = check_reachable(context, self.n_links)?;
        Ok(env.set_goal(goal))
    }
}

/// A 2-D point within reach of an arm with `n_links` unit links.
pub(crate) fn check_reachable(context: &[f64], n_links: usize) -> Result<[f64; 2], MpError> {
    match context {
        [x, y] if x.is_finite() && y.is_finite() => {
            let p = [*x, *y];
            if distance(p, [0.0, 0.0]) <= n_links as f64 {
                Ok(p)
            } else {
                Err(MpError::InvalidContext(format!(
                    "({}, {}) is out of reach of {} links",
                    x, y, n_links
                )))
            }
        }
        _ => Err(MpError::InvalidContext(format!(
            "expected a finite 2-D point, got {:?}",
            context
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_observation_layout() -> Result<()> {
        let mut env = SimpleReacherEnv::build(&SimpleReacherConfig::default().n_links(3), 0)?;
        let obs = env.reset()?;
        assert_eq!(obs.len(), SimpleReacherEnv::obs_len(3));
        assert_eq!(obs.len(), SimpleReacherTask { n_links: 3 }.active_obs().len());
        // cos(0) for every joint
        assert_eq!(obs.slice(ndarray::s![0..3]).to_vec(), vec![1.0; 3]);
        assert!(distance(env.goal(), [0.0, 0.0]) <= 3.0);
        Ok(())
    }

    #[test]
    fn test_distance_penalty_at_last_step() -> Result<()> {
        let config = SimpleReacherConfig::default().goal(Some([0.0, 2.0]));
        let mut env = SimpleReacherEnv::build(&config, 0)?;
        env.reset()?;
        let a = Array1::zeros(2);
        for t in 1..=200 {
            let (step, _) = env.step(&a)?;
            if t < 200 {
                assert_eq!(step.reward, 0.0);
                assert!(!step.is_done());
            } else {
                // straight arm at (2, 0)
                assert!((step.reward + 8f64.sqrt()).abs() < 1e-12);
                assert!(step.is_truncated);
            }
        }
        Ok(())
    }

    #[test]
    fn test_reset_with_index_is_reproducible() -> Result<()> {
        let mut env = SimpleReacherEnv::build(&SimpleReacherConfig::default(), 7)?;
        let obs1 = env.reset_with_index(3)?;
        env.reset()?;
        let obs2 = env.reset_with_index(3)?;
        assert_eq!(obs1, obs2);
        Ok(())
    }

    #[test]
    fn test_context_must_be_reachable() {
        assert!(check_reachable(&[1.0, 1.0], 2).is_ok());
        assert!(matches!(
            check_reachable(&[2.0, 2.0], 2),
            Err(MpError::InvalidContext(_))
        ));
        assert!(check_reachable(&[1.0], 2).is_err());
        assert!(check_reachable(&[f64::NAN, 0.0], 2).is_err());
    }
}
