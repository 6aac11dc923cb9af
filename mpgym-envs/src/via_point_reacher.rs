//! Planar n-link arm passing a via point on its way to a fixed goal.
use crate::{
    reacher::{distance, end_effector, link_points, sample_in_disc, self_collision},
    simple_reacher::check_reachable,
};
use anyhow::Result;
use log::{debug, trace};
use mpgym_core::{
    record::{Record, RecordValue},
    Env, Step,
};
use mpgym_mp::{MpError, MpTask, ObsMask};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Configuration of [`ViaPointReacherEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViaPointReacherConfig {
    /// Number of links, each of length one.
    pub n_links: usize,

    /// Integration time step.
    pub dt: f64,

    /// Steps after which the episode is truncated.
    pub max_steps: usize,

    /// Step (1-based) at which the via point should be reached.
    pub via_step: usize,

    /// Goal reached at the last step.
    pub goal: [f64; 2],

    /// Fixed via point. Sampled at every reset if `None`.
    pub via_point: Option<[f64; 2]>,

    /// Joint accelerations are clipped to `[-max_action, max_action]`.
    pub max_action: f64,

    /// Weight of the squared-action penalty.
    pub ctrl_cost_weight: f64,

    /// If `false`, crossing links end the episode with `collision_penalty`.
    pub allow_self_collision: bool,

    /// Penalty paid on a self collision.
    pub collision_penalty: f64,
}

impl Default for ViaPointReacherConfig {
    fn default() -> Self {
        Self {
            n_links: 5,
            dt: 0.01,
            max_steps: 200,
            via_step: 100,
            goal: [0.0, 4.0],
            via_point: None,
            max_action: 10.0,
            ctrl_cost_weight: 1e-4,
            allow_self_collision: false,
            collision_penalty: 1000.0,
        }
    }
}

impl ViaPointReacherConfig {
    /// Sets the number of links.
    pub fn n_links(mut self, v: usize) -> Self {
        self.n_links = v;
        self
    }

    /// Sets the goal.
    pub fn goal(mut self, v: [f64; 2]) -> Self {
        self.goal = v;
        self
    }

    /// Fixes the via point.
    pub fn via_point(mut self, v: Option<[f64; 2]>) -> Self {
        self.via_point = v;
        self
    }

    /// Allows links to cross.
    pub fn allow_self_collision(mut self, v: bool) -> Self {
        self.allow_self_collision = v;
        self
    }
}

/// Planar arm driven by joint accelerations.
///
/// Observation: `cos(q)`, `sin(q)`, via point, `q'`, end effector minus via
/// point, end effector minus goal and the step count.
pub struct ViaPointReacherEnv {
    config: ViaPointReacherConfig,
    seed: u64,
    rng: fastrand::Rng,
    angles: Array1<f64>,
    velocities: Array1<f64>,
    via_point: [f64; 2],
    steps: usize,
}

impl ViaPointReacherEnv {
    /// Length of the observation for `n_links` links.
    pub fn obs_len(n_links: usize) -> usize {
        3 * n_links + 7
    }

    fn obs(&self) -> Array1<f64> {
        let ee = end_effector(&self.angles);
        let (via, goal) = (self.via_point, self.config.goal);
        let mut obs = Vec::with_capacity(Self::obs_len(self.config.n_links));
        obs.extend(self.angles.iter().map(|a| a.cos()));
        obs.extend(self.angles.iter().map(|a| a.sin()));
        obs.extend(via);
        obs.extend(self.velocities.iter());
        obs.extend([ee[0] - via[0], ee[1] - via[1]]);
        obs.extend([ee[0] - goal[0], ee[1] - goal[1]]);
        obs.push(self.steps as f64);
        Array1::from(obs)
    }

    fn sample_via_point(&mut self) -> [f64; 2] {
        // upper half of the reachable disc, away from the base
        let r = self.config.n_links as f64;
        loop {
            let p = sample_in_disc(&mut self.rng, r);
            if p[1] >= 0.0 && distance(p, [0.0, 0.0]) >= 0.25 * r {
                return p;
            }
        }
    }

    /// Current via point.
    pub fn via_point(&self) -> [f64; 2] {
        self.via_point
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

    pub(crate) fn set_via_point(&mut self, p: [f64; 2]) -> Array1<f64> {
        self.via_point = p;
        self.obs()
    }
}

impl Env for ViaPointReacherEnv {
    type Config = ViaPointReacherConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.n_links == 0 {
            anyhow::bail!("ViaPointReacherEnv needs at least one link");
        }
        if config.via_step == 0 || config.via_step > config.max_steps {
            anyhow::bail!(
                "via_step must lie in [1, {}], got {}",
                config.max_steps,
                config.via_step
            );
        }
        let n = config.n_links;
        Ok(Self {
            config: config.clone(),
            seed: seed as u64,
            rng: fastrand::Rng::with_seed(seed as u64),
            angles: Array1::zeros(n),
            velocities: Array1::zeros(n),
            via_point: config.via_point.unwrap_or([0.0, 0.5 * n as f64]),
            steps: 0,
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

        let points = link_points(&self.angles);
        let ee = points[points.len() - 1];
        let mut reward = -self.config.ctrl_cost_weight * acc.mapv(|v| v * v).sum();
        if self.steps == self.config.via_step {
            reward -= distance(ee, self.via_point);
        }
        if self.steps == self.config.max_steps {
            reward -= distance(ee, self.config.goal);
        }

        let collided = !self.config.allow_self_collision && self_collision(&points);
        if collided {
            debug!("ViaPointReacherEnv: self collision at step {}", self.steps);
            reward -= self.config.collision_penalty;
        }
        let is_truncated = !collided && self.steps >= self.config.max_steps;
        trace!("ViaPointReacherEnv step {}: reward = {}", self.steps, reward);

        let step = Step::new(self.obs(), a.clone(), reward, collided, is_truncated, ());
        let mut record = Record::from_scalar("distance_to_goal", distance(ee, self.config.goal));
        let to_via_point = distance(ee, self.via_point);
        record.insert("distance_to_via_point", RecordValue::Scalar(to_via_point));
        Ok((step, record))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.angles.fill(0.0);
        self.velocities.fill(0.0);
        self.steps = 0;
        self.via_point = match self.config.via_point {
            Some(p) => p,
            None => self.sample_via_point(),
        };
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = fastrand::Rng::with_seed(self.seed.wrapping_add(ix as u64));
        self.reset()
    }
}

/// Movement primitive adapter of [`ViaPointReacherEnv`]. The context is the
/// via point.
pub struct ViaPointReacherTask {
    n_links: usize,
}

impl MpTask for ViaPointReacherTask {
    type Env = ViaPointReacherEnv;
    type Config = ViaPointReacherConfig;

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
            .component("via_point", 2, true)
            .component("joint_velocities", n, false)
            .component("end_effector_to_via_point", 2, false)
            .component("end_effector_to_goal", 2, false)
            .component("steps", 1, false)
            .build()
    }

    fn set_context(
        &mut self,
        env: &mut Self::Env,
        context: &[f64],
    ) -> Result<Array1<f64>, MpError> {
        let p = check_reachable(context, self.n_links)?;
        Ok(env.set_via_point(p))
    }
}
