//! Dynamic movement primitive.
use crate::{
    generator::{check_inputs, num_steps},
    MpError, RbfBasis, Trajectory, TrajectoryGenerator,
};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Configuration of [`Dmp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmpConfig {
    /// Forcing-term basis functions per degree of freedom.
    pub num_basis: usize,

    /// Width of the basis functions relative to their spacing.
    pub basis_bandwidth_factor: f64,

    /// Stiffness of the attractor; damping is `alpha / 4`.
    pub alpha: f64,

    /// Multiplier applied to the forcing weights.
    pub weights_scale: f64,

    /// Multiplier applied to the goal parameters.
    pub goal_scale: f64,

    /// Interpret the goal parameter as an offset from the start position.
    pub relative_goal: bool,

    /// Use the start position as goal; no goal parameter in the action.
    pub disable_goal: bool,
}

impl Default for DmpConfig {
    fn default() -> Self {
        Self {
            num_basis: 5,
            basis_bandwidth_factor: 3.0,
            alpha: 25.0,
            weights_scale: 1.0,
            goal_scale: 1.0,
            relative_goal: true,
            disable_goal: false,
        }
    }
}

impl DmpConfig {
    /// Sets the number of basis functions.
    pub fn num_basis(mut self, v: usize) -> Self {
        self.num_basis = v;
        self
    }

    /// Sets the attractor stiffness.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Sets the weight multiplier.
    pub fn weights_scale(mut self, v: f64) -> Self {
        self.weights_scale = v;
        self
    }

    /// Sets whether the goal is relative to the start position.
    pub fn relative_goal(mut self, v: bool) -> Self {
        self.relative_goal = v;
        self
    }

    /// Removes the goal from the parameters.
    pub fn disable_goal(mut self, v: bool) -> Self {
        self.disable_goal = v;
        self
    }
}

/// Second-order attractor with a learned forcing term.
///
/// ```text
/// tau^2 y'' = alpha (beta (g - y) - tau y') + alpha beta f(x)
/// f(x)      = x * sum_i psi_i(x) w_i / sum_i psi_i(x)
/// x         = exp(-alpha_phase (t - delay) / tau)
/// ```
///
/// Integrated with semi-implicit Euler steps of `dt` from the current position
/// *and* velocity, which makes it the natural choice for replanning. During
/// the delay the start position is held.
///
/// Per degree of freedom the weights are `num_basis` forcing weights followed
/// by one goal parameter (unless the goal is disabled).
pub struct Dmp {
    basis: RbfBasis,
    num_dof: usize,
    alpha: f64,
    beta: f64,
    alpha_phase: f64,
    weights_scale: f64,
    goal_scale: f64,
    relative_goal: bool,
    disable_goal: bool,
}

impl Dmp {
    /// Builds the generator.
    pub fn new(config: &DmpConfig, num_dof: usize, alpha_phase: f64) -> Result<Self, MpError> {
        if config.num_basis == 0 {
            return Err(MpError::InvalidConfig("DMP needs at least one basis".into()));
        }
        if !(config.alpha > 0.0) || !(alpha_phase > 0.0) {
            return Err(MpError::InvalidConfig(
                "DMP needs positive alpha and alpha_phase".into(),
            ));
        }
        let basis = RbfBasis::exponential(
            config.num_basis,
            config.basis_bandwidth_factor,
            alpha_phase,
        );
        Ok(Self {
            basis,
            num_dof,
            alpha: config.alpha,
            beta: config.alpha / 4.0,
            alpha_phase,
            weights_scale: config.weights_scale,
            goal_scale: config.goal_scale,
            relative_goal: config.relative_goal,
            disable_goal: config.disable_goal,
        })
    }

    fn params_per_dof(&self) -> usize {
        self.basis.num_learned() + if self.disable_goal { 0 } else { 1 }
    }
}

impl TrajectoryGenerator for Dmp {
    fn num_dof(&self) -> usize {
        self.num_dof
    }

    fn num_weights(&self) -> usize {
        self.params_per_dof() * self.num_dof
    }

    fn generate(
        &self,
        weights: &[f64],
        init_pos: ArrayView1<f64>,
        init_vel: ArrayView1<f64>,
        tau: f64,
        delay: f64,
        dt: f64,
    ) -> Result<Trajectory, MpError> {
        check_inputs(self, weights, init_pos, init_vel)?;
        let n_basis = self.basis.num_learned();
        let per_dof = self.params_per_dof();
        let steps = num_steps(tau, delay, dt);

        let goal: Array1<f64> = (0..self.num_dof)
            .map(|d| {
                if self.disable_goal {
                    init_pos[d]
                } else {
                    let g = weights[d * per_dof + n_basis] * self.goal_scale;
                    if self.relative_goal {
                        init_pos[d] + g
                    } else {
                        g
                    }
                }
            })
            .collect();

        let mut pos = Array2::zeros((steps, self.num_dof));
        let mut vel = Array2::zeros((steps, self.num_dof));
        let mut y = init_pos.to_owned();
        let mut yd = init_vel.to_owned();
        let mut moving = false;

        for k in 0..steps {
            let t = k as f64 * dt;
            if t < delay {
                pos.row_mut(k).assign(&init_pos);
                continue;
            }
            if !moving {
                // The movement starts from rest if the delay held the position.
                moving = true;
                if delay > 0.0 {
                    y.assign(&init_pos);
                    yd.fill(0.0);
                }
            }

            let x = (-self.alpha_phase * (t - delay) / tau).exp();
            let psi = self.basis.values(x);
            for d in 0..self.num_dof {
                let w = &weights[d * per_dof..d * per_dof + n_basis];
                let f: f64 = psi.iter().zip(w).map(|(p, w)| p * w).sum::<f64>()
                    * x
                    * self.weights_scale;
                let ydd = (self.alpha * (self.beta * (goal[d] - y[d]) - tau * yd[d])
                    + self.alpha * self.beta * f)
                    / (tau * tau);
                yd[d] += ydd * dt;
                y[d] += yd[d] * dt;
            }
            pos.row_mut(k).assign(&y);
            vel.row_mut(k).assign(&yd);
        }

        Ok(Trajectory { pos, vel })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_converges_to_relative_goal() {
        let dmp = Dmp::new(&DmpConfig::default().num_basis(3), 2, 3.0).unwrap();
        assert_eq!(dmp.num_weights(), 8);
        // zero forcing, goal offsets (+1, -0.5)
        let weights = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -0.5];
        let traj = dmp
            .generate(&weights, arr1(&[0.0, 1.0]).view(), arr1(&[0.0, 0.0]).view(), 1.0, 0.0, 0.01)
            .unwrap();

        let last = traj.pos.row(traj.len() - 1);
        assert!((last[0] - 1.0).abs() < 1e-2);
        assert!((last[1] - 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_disabled_goal_keeps_start_without_forcing() {
        let dmp = Dmp::new(&DmpConfig::default().num_basis(2).disable_goal(true), 1, 3.0).unwrap();
        assert_eq!(dmp.num_weights(), 2);
        let traj = dmp
            .generate(&[0.0, 0.0], arr1(&[0.7]).view(), arr1(&[0.0]).view(), 0.5, 0.0, 0.01)
            .unwrap();
        assert!(traj.pos.iter().all(|p| (*p - 0.7).abs() < 1e-12));
    }

    #[test]
    fn test_uses_initial_velocity() {
        let dmp = Dmp::new(&DmpConfig::default().num_basis(2).disable_goal(true), 1, 3.0).unwrap();
        let traj = dmp
            .generate(&[0.0, 0.0], arr1(&[0.0]).view(), arr1(&[1.0]).view(), 1.0, 0.0, 0.01)
            .unwrap();
        assert!(traj.pos[[0, 0]] > 0.0);
    }

    #[test]
    fn test_holds_during_delay() {
        let dmp = Dmp::new(&DmpConfig::default().num_basis(2), 1, 3.0).unwrap();
        let traj = dmp
            .generate(&[0.0, 0.0, 1.0], arr1(&[0.2]).view(), arr1(&[0.0]).view(), 1.0, 0.1, 0.01)
            .unwrap();
        assert_eq!(traj.len(), 110);
        assert_eq!(traj.pos[[5, 0]], 0.2);
        assert_eq!(traj.vel[[5, 0]], 0.0);
        assert!(traj.pos[[50, 0]] > 0.2);
    }
}
