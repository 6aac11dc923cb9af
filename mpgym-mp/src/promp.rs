//! Probabilistic movement primitive (mean trajectory).
use crate::{
    generator::{check_inputs, num_steps},
    phase::linear_phase,
    MpError, RbfBasis, Trajectory, TrajectoryGenerator,
};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Configuration of [`ProMp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProMpConfig {
    /// Basis functions with free weights, per degree of freedom.
    pub num_basis: usize,

    /// Width of the basis functions relative to their spacing.
    pub basis_bandwidth_factor: f64,

    /// Leading basis functions with zero weight.
    pub num_basis_zero_start: usize,

    /// Trailing basis functions with zero weight.
    pub num_basis_zero_goal: usize,

    /// Multiplier applied to the weights.
    pub weights_scale: f64,
}

impl Default for ProMpConfig {
    fn default() -> Self {
        Self {
            num_basis: 5,
            basis_bandwidth_factor: 2.0,
            num_basis_zero_start: 1,
            num_basis_zero_goal: 0,
            weights_scale: 1.0,
        }
    }
}

impl ProMpConfig {
    /// Sets the number of basis functions.
    pub fn num_basis(mut self, v: usize) -> Self {
        self.num_basis = v;
        self
    }

    /// Sets the number of zero-weight basis functions at the start.
    pub fn num_basis_zero_start(mut self, v: usize) -> Self {
        self.num_basis_zero_start = v;
        self
    }

    /// Sets the number of zero-weight basis functions at the goal.
    pub fn num_basis_zero_goal(mut self, v: usize) -> Self {
        self.num_basis_zero_goal = v;
        self
    }

    /// Sets the bandwidth factor.
    pub fn basis_bandwidth_factor(mut self, v: f64) -> Self {
        self.basis_bandwidth_factor = v;
        self
    }

    /// Sets the weight multiplier.
    pub fn weights_scale(mut self, v: f64) -> Self {
        self.weights_scale = v;
        self
    }
}

/// Mean trajectory of a ProMP over a linear phase.
///
/// `pos(t) = pos_0 + scale * (Phi(s(t)) - Phi(0)) W`, so every trajectory
/// starts exactly at the current position. Velocities are the analytic time
/// derivative and vanish outside `[delay, delay + tau]`. The initial
/// velocity is not used.
///
/// Weights are laid out per degree of freedom: `[w_0_0 .. w_0_n, w_1_0 ..]`.
pub struct ProMp {
    basis: RbfBasis,
    num_dof: usize,
    weights_scale: f64,
}

impl ProMp {
    /// Builds the generator.
    pub fn new(config: &ProMpConfig, num_dof: usize) -> Result<Self, MpError> {
        if config.num_basis == 0 {
            return Err(MpError::InvalidConfig("ProMP needs at least one basis".into()));
        }
        Ok(Self {
            basis: RbfBasis::linear(
                config.num_basis,
                config.basis_bandwidth_factor,
                config.num_basis_zero_start,
                config.num_basis_zero_goal,
            ),
            num_dof,
            weights_scale: config.weights_scale,
        })
    }
}

impl TrajectoryGenerator for ProMp {
    fn num_dof(&self) -> usize {
        self.num_dof
    }

    fn num_weights(&self) -> usize {
        self.basis.num_learned() * self.num_dof
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
        let steps = num_steps(tau, delay, dt);

        // (n_basis, dof)
        let w = Array2::from_shape_vec((self.num_dof, n_basis), weights.to_vec())
            .map_err(|e| MpError::InvalidAction(e.to_string()))?
            .reversed_axes()
            * self.weights_scale;

        let phi_0 = self.basis.values(0.0);
        let mut phi = Array2::zeros((steps, n_basis));
        let mut d_phi = Array2::zeros((steps, n_basis));
        for (k, (mut row, mut d_row)) in phi
            .axis_iter_mut(Axis(0))
            .zip(d_phi.axis_iter_mut(Axis(0)))
            .enumerate()
        {
            let t = (k + 1) as f64 * dt;
            let (s, ds_dt) = linear_phase(t, tau, delay);
            for (i, (v, d)) in self
                .basis
                .values(s)
                .into_iter()
                .zip(self.basis.derivatives(s))
                .enumerate()
            {
                row[i] = v - phi_0[i];
                d_row[i] = d * ds_dt;
            }
        }

        let pos = phi.dot(&w) + &init_pos;
        let vel = d_phi.dot(&w);
        Ok(Trajectory { pos, vel })
    }
}
