//! Planar n-link arm reaching into a hole in the ground.
use crate::reacher::{distance, end_effector, link_points, points_along_links, self_collision};
use anyhow::Result;
use log::{debug, trace};
use mpgym_core::{
    record::{Record, RecordValue},
    Env, Step,
};
use mpgym_mp::{MpError, MpTask, ObsMask};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Points checked against the ground per link.
const POINTS_PER_LINK: usize = 20;

/// Configuration of [`HoleReacherEnv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoleReacherConfig {
    /// Number of links, each of length one.
    pub n_links: usize,

    /// Integration time step.
    pub dt: f64,

    /// Steps after which the episode is truncated.
    pub max_steps: usize,

    /// Sample the first joint angle in `[pi/4, 3pi/4]` at every reset
    /// instead of pointing straight up.
    pub random_start: bool,

    /// If `false`, crossing links end the episode with `collision_penalty`.
    pub allow_self_collision: bool,

    /// If `false`, touching the ground or the hole walls ends the episode
    /// with `collision_penalty`.
    pub allow_wall_collision: bool,

    /// Fixed hole center. Sampled in `[1, 3.5]` at every reset if `None`.
    pub hole_x: Option<f64>,

    /// Fixed hole width. Sampled in `[1, 2]` at every reset if `None`.
    pub hole_width: Option<f64>,

    /// Depth of the hole; its bottom center is the goal.
    pub hole_depth: f64,

    /// Joint velocities are clipped to `[-max_velocity, max_velocity]`.
    pub max_velocity: f64,

    /// Weight of the squared joint acceleration penalty.
    pub ctrl_cost_weight: f64,

    /// Penalty paid on a collision.
    pub collision_penalty: f64,
}

impl Default for HoleReacherConfig {
    fn default() -> Self {
        Self {
            n_links: 5,
            dt: 0.01,
            max_steps: 200,
            random_start: true,
            allow_self_collision: false,
            allow_wall_collision: false,
            hole_x: None,
            hole_width: None,
            hole_depth: 1.0,
            max_velocity: 10.0,
            ctrl_cost_weight: 5e-8,
            collision_penalty: 100.0,
        }
    }
}

impl HoleReacherConfig {
    /// Sets the number of links.
    pub fn n_links(mut self, v: usize) -> Self {
        self.n_links = v;
        self
    }

    /// Sets whether the start pose is sampled.
    pub fn random_start(mut self, v: bool) -> Self {
        self.random_start = v;
        self
    }

    /// Fixes the hole center.
    pub fn hole_x(mut self, v: Option<f64>) -> Self {
        self.hole_x = v;
        self
    }

    /// Fixes the hole width.
    pub fn hole_width(mut self, v: Option<f64>) -> Self {
        self.hole_width = v;
        self
    }

    /// Sets the hole depth.
    pub fn hole_depth(mut self, v: f64) -> Self {
        self.hole_depth = v;
        self
    }

    /// Allows links to touch the ground and the hole walls.
    pub fn allow_wall_collision(mut self, v: bool) -> Self {
        self.allow_wall_collision = v;
        self
    }
}

/// Rectangular hole cut into the ground line `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hole {
    /// Center of the opening.
    pub x: f64,

    /// Width of the opening.
    pub width: f64,

    /// Depth below the ground line.
    pub depth: f64,
}

impl Hole {
    /// Bottom center of the hole.
    pub fn goal(&self) -> [f64; 2] {
        [self.x, -self.depth]
    }

    /// Whether `p` lies inside solid ground.
    fn is_solid(&self, p: [f64; 2]) -> bool {
        if p[1] >= 0.0 {
            return false;
        }
        let half = 0.5 * self.width;
        p[1] < -self.depth || p[0] < self.x - half || p[0] > self.x + half
    }
}

/// Planar arm driven by joint velocities above a ground line with a hole.
///
/// The arm is mounted at the origin on the ground. Leaving the free space
/// (ground or hole walls) or crossing itself ends the episode with a
/// penalty, unless allowed. The last step is rewarded with the negative
/// squared distance of the end effector to the bottom of the hole.
///
/// Observation: `cos(q)`, `sin(q)`, `q'`, hole center, width and depth, end
/// effector minus goal and the step count.
pub struct HoleReacherEnv {
    config: HoleReacherConfig,
    seed: u64,
    rng: fastrand::Rng,
    angles: Array1<f64>,
    velocities: Array1<f64>,
    hole: Hole,
    steps: usize,
}

impl HoleReacherEnv {
    /// Length of the observation for `n_links` links.
    pub fn obs_len(n_links: usize) -> usize {
        3 * n_links + 6
    }

    fn obs(&self) -> Array1<f64> {
        let ee = end_effector(&self.angles);
        let goal = self.hole.goal();
        let mut obs = Vec::with_capacity(Self::obs_len(self.config.n_links));
        obs.extend(self.angles.iter().map(|a| a.cos()));
        obs.extend(self.angles.iter().map(|a| a.sin()));
        obs.extend(self.velocities.iter());
        obs.extend([self.hole.x, self.hole.width, self.hole.depth]);
        obs.extend([ee[0] - goal[0], ee[1] - goal[1]]);
        obs.push(self.steps as f64);
        Array1::from(obs)
    }

    /// Current hole.
    pub fn hole(&self) -> Hole {
        self.hole
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

    /// Whether any point of the arm is inside the ground.
    pub fn wall_collision(&self) -> bool {
        let points = link_points(&self.angles);
        points_along_links(&points, POINTS_PER_LINK)
            .into_iter()
            .any(|p| self.hole.is_solid(p))
    }

    pub(crate) fn set_hole(&mut self, x: f64, width: f64) -> Array1<f64> {
        self.hole.x = x;
        self.hole.width = width;
        self.obs()
    }
}

impl Env for HoleReacherEnv {
    type Config = HoleReacherConfig;
    type Obs = Array1<f64>;
    type Act = Array1<f64>;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.n_links == 0 {
            anyhow::bail!("HoleReacherEnv needs at least one link");
        }
        if !(config.hole_depth > 0.0) || config.hole_width.map_or(false, |w| !(w > 0.0)) {
            anyhow::bail!("the hole needs a positive width and depth");
        }
        let n = config.n_links;
        let hole = Hole {
            x: config.hole_x.unwrap_or(2.0),
            width: config.hole_width.unwrap_or(1.0),
            depth: config.hole_depth,
        };
        let mut angles = Array1::zeros(n);
        angles[0] = FRAC_PI_2;
        Ok(Self {
            config: config.clone(),
            seed: seed as u64,
            rng: fastrand::Rng::with_seed(seed as u64),
            angles,
            velocities: Array1::zeros(n),
            hole,
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
        let (max, dt) = (self.config.max_velocity, self.config.dt);
        let velocities = a.mapv(|v| v.clamp(-max, max));
        let acc = (&velocities - &self.velocities) / dt;
        self.velocities = velocities;
        self.angles = &self.angles + &(&self.velocities * dt);
        self.steps += 1;

        let points = link_points(&self.angles);
        let ee = points[points.len() - 1];
        let goal = self.hole.goal();
        let mut reward = -self.config.ctrl_cost_weight * acc.mapv(|v| v * v).sum();
        if self.steps == self.config.max_steps {
            reward -= distance(ee, goal).powi(2);
        }

        let self_collided = !self.config.allow_self_collision && self_collision(&points);
        let wall_collided = !self.config.allow_wall_collision && self.wall_collision();
        let collided = self_collided || wall_collided;
        if collided {
            debug!(
                "HoleReacherEnv: collision at step {} (self: {}, wall: {})",
                self.steps, self_collided, wall_collided
            );
            reward -= self.config.collision_penalty;
        }
        let is_truncated = !collided && self.steps >= self.config.max_steps;
        trace!("HoleReacherEnv step {}: reward = {}", self.steps, reward);

        let step = Step::new(self.obs(), a.clone(), reward, collided, is_truncated, ());
        let mut record = Record::from_scalar("distance_to_goal", distance(ee, goal));
        record.insert("collided", RecordValue::Scalar(if collided { 1.0 } else { 0.0 }));
        Ok((step, record))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.angles.fill(0.0);
        self.angles[0] = if self.config.random_start {
            FRAC_PI_4 + FRAC_PI_2 * self.rng.f64()
        } else {
            FRAC_PI_2
        };
        self.velocities.fill(0.0);
        self.steps = 0;
        self.hole.x = match self.config.hole_x {
            Some(x) => x,
            None => 1.0 + 2.5 * self.rng.f64(),
        };
        self.hole.width = match self.config.hole_width {
            Some(w) => w,
            None => 1.0 + self.rng.f64(),
        };
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = fastrand::Rng::with_seed(self.seed.wrapping_add(ix as u64));
        self.reset()
    }
}

/// Movement primitive adapter of [`HoleReacherEnv`]. The context is the hole
/// center and width.
pub struct HoleReacherTask {
    n_links: usize,
}

impl MpTask for HoleReacherTask {
    type Env = HoleReacherEnv;
    type Config = HoleReacherConfig;

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
            .component("joint_velocities", n, false)
            .component("hole_x", 1, true)
            .component("hole_width", 1, true)
            .component("hole_depth", 1, false)
            .component("end_effector_to_goal", 2, false)
            .component("steps", 1, false)
            .build()
    }

    fn set_context(
        &mut self,
        env: &mut Self::Env,
        context: &[f64],
    ) -> Result<Array1<f64>, MpError> {
        match context {
            [x, width] if x.is_finite() && width.is_finite() && *width > 0.0 => {
                let goal = [*x, -env.hole().depth];
                if distance(goal, [0.0, 0.0]) > self.n_links as f64 {
                    return Err(MpError::InvalidContext(format!(
                        "hole bottom ({}, {}) is out of reach of {} links",
                        goal[0], goal[1], self.n_links
                    )));
                }
                Ok(env.set_hole(*x, *width))
            }
            _ => Err(MpError::InvalidContext(format!(
                "expected a finite hole center and a positive width, got {:?}",
                context
            ))),
        }
    }
}
