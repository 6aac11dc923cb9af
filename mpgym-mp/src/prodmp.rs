//! Probabilistic dynamic movement primitive.
use crate::{
    generator::{check_inputs, num_steps},
    MpError, RbfBasis, Trajectory, TrajectoryGenerator,
};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Integration substeps per low-level step when building the position basis.
const SUBSTEPS: usize = 10;

/// Configuration of [`ProDmp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProDmpConfig {
    /// Forcing-term basis functions per degree of freedom.
    pub num_basis: usize,

    /// Width of the basis functions relative to their spacing.
    pub basis_bandwidth_factor: f64,

    /// Stiffness of the critically damped attractor.
    pub alpha: f64,

    /// Multiplier applied to the forcing weights.
    pub weights_scale: f64,

    /// Multiplier applied to the goal parameters.
    pub goal_scale: f64,

    /// Constant added to every goal.
    pub goal_offset: f64,

    /// Normalize each position basis to a peak magnitude of one.
    pub auto_scale_basis: bool,

    /// Interpret the goal parameter as an offset from the start position.
    pub relative_goal: bool,

    /// Use the start position as goal; no goal parameter in the action.
    pub disable_goal: bool,
}

impl Default for ProDmpConfig {
    fn default() -> Self {
        Self {
            num_basis: 5,
            basis_bandwidth_factor: 3.0,
            alpha: 25.0,
            weights_scale: 1.0,
            goal_scale: 1.0,
            goal_offset: 0.0,
            auto_scale_basis: false,
            relative_goal: false,
            disable_goal: false,
        }
    }
}

impl ProDmpConfig {
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

    /// Sets the goal multiplier.
    pub fn goal_scale(mut self, v: f64) -> Self {
        self.goal_scale = v;
        self
    }

    /// Sets the constant goal offset.
    pub fn goal_offset(mut self, v: f64) -> Self {
        self.goal_offset = v;
        self
    }

    /// Sets whether the position basis is normalized.
    pub fn auto_scale_basis(mut self, v: bool) -> Self {
        self.auto_scale_basis = v;
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

/// Position and velocity basis sampled on the trajectory grid, `(steps, num_basis)`.
struct PositionBasis {
    pos: Array2<f64>,
    vel: Array2<f64>,
}

/// Critically damped attractor solved in closed form.
///
/// ```text
/// y'' + 2 l y' + l^2 y = l^2 g + l^2 x sum_i psi_i(x) w_i
/// l = alpha / (2 tau),  x = exp(-alpha_phase u / tau),  u = t - delay
/// ```
///
/// The solution splits into a weighted sum of position basis functions
/// `P_i(u)`, which vanish with their derivative at `u = 0`, plus the
/// homogeneous part fixed by the start state:
///
/// ```text
/// y(u) = g + sum_i w_i P_i(u) + exp(-l u) ((y0 - g) + (v0 + l (y0 - g)) u)
/// ```
///
/// The trajectory therefore starts exactly at the current position and
/// velocity, and is linear in the weights and the goal. During the delay the
/// start position is held and the movement begins from rest.
///
/// Per degree of freedom the weights are `num_basis` forcing weights followed
/// by one goal parameter (unless the goal is disabled).
pub struct ProDmp {
    basis: RbfBasis,
    num_dof: usize,
    alpha: f64,
    alpha_phase: f64,
    weights_scale: f64,
    goal_scale: f64,
    goal_offset: f64,
    auto_scale_basis: bool,
    relative_goal: bool,
    disable_goal: bool,
}

impl ProDmp {
    /// Builds the generator.
    pub fn new(config: &ProDmpConfig, num_dof: usize, alpha_phase: f64) -> Result<Self, MpError> {
        if config.num_basis == 0 {
            return Err(MpError::InvalidConfig("ProDMP needs at least one basis".into()));
        }
        if !(config.alpha > 0.0) || !(alpha_phase > 0.0) {
            return Err(MpError::InvalidConfig(
                "ProDMP needs positive alpha and alpha_phase".into(),
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
            alpha_phase,
            weights_scale: config.weights_scale,
            goal_scale: config.goal_scale,
            goal_offset: config.goal_offset,
            auto_scale_basis: config.auto_scale_basis,
            relative_goal: config.relative_goal,
            disable_goal: config.disable_goal,
        })
    }

    fn params_per_dof(&self) -> usize {
        self.basis.num_learned() + if self.disable_goal { 0 } else { 1 }
    }

    /// Forcing term of every basis at movement time `u`, scaled by `l^2`.
    fn forcing(&self, u: f64, tau: f64, lambda: f64) -> Vec<f64> {
        let x = (-self.alpha_phase * u / tau).exp();
        let scale = lambda * lambda * x * self.weights_scale;
        self.basis.values(x).into_iter().map(|p| p * scale).collect()
    }

    /// Samples the position basis at the movement times `times` (ascending,
    /// positive) by variation of parameters:
    ///
    /// ```text
    /// A_i(u) = int_0^u exp(l s) h_i(s) ds,  B_i(u) = int_0^u s exp(l s) h_i(s) ds
    /// P_i(u) = exp(-l u) (u A_i - B_i)
    /// P_i'(u) = exp(-l u) (A_i - l (u A_i - B_i))
    /// ```
    ///
    /// The integrals use the trapezoidal rule. `l u` never exceeds
    /// `alpha / 2`, so the exponentials stay bounded.
    fn position_basis(&self, times: &[f64], tau: f64, lambda: f64) -> PositionBasis {
        let n = self.basis.num_learned();
        let mut pos = Array2::zeros((times.len(), n));
        let mut vel = Array2::zeros((times.len(), n));
        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        let mut prev_s = 0.0;
        let mut prev_h = self.forcing(0.0, tau, lambda);

        for (row, &u) in times.iter().enumerate() {
            let ds = (u - prev_s) / SUBSTEPS as f64;
            for j in 1..=SUBSTEPS {
                let s = prev_s + ds * j as f64;
                let h = self.forcing(s, tau, lambda);
                let (e0, e1) = ((lambda * (s - ds)).exp(), (lambda * s).exp());
                for i in 0..n {
                    a[i] += 0.5 * ds * (e0 * prev_h[i] + e1 * h[i]);
                    b[i] += 0.5 * ds * ((s - ds) * e0 * prev_h[i] + s * e1 * h[i]);
                }
                prev_h = h;
            }
            prev_s = u;

            let decay = (-lambda * u).exp();
            for i in 0..n {
                let inner = u * a[i] - b[i];
                pos[[row, i]] = decay * inner;
                vel[[row, i]] = decay * (a[i] - lambda * inner);
            }
        }

        if self.auto_scale_basis {
            for i in 0..n {
                let peak = pos.column(i).iter().fold(0.0_f64, |m, p| m.max(p.abs()));
                if peak > 0.0 {
                    pos.column_mut(i).mapv_inplace(|p| p / peak);
                    vel.column_mut(i).mapv_inplace(|v| v / peak);
                }
            }
        }

        PositionBasis { pos, vel }
    }

    fn goal(&self, weights: &[f64], init_pos: f64, d: usize) -> f64 {
        if self.disable_goal {
            return init_pos;
        }
        let per_dof = self.params_per_dof();
        let g = weights[d * per_dof + self.basis.num_learned()] * self.goal_scale
            + self.goal_offset;
        if self.relative_goal {
            init_pos + g
        } else {
            g
        }
    }
}

impl TrajectoryGenerator for ProDmp {
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
        let lambda = self.alpha / (2.0 * tau);

        let mut pos = Array2::zeros((steps, self.num_dof));
        let mut vel = Array2::zeros((steps, self.num_dof));

        let held = (0..steps)
            .take_while(|&k| (k + 1) as f64 * dt - delay <= 0.0)
            .count();
        for k in 0..held {
            pos.row_mut(k).assign(&init_pos);
        }

        let times: Vec<f64> = (held..steps).map(|k| (k + 1) as f64 * dt - delay).collect();
        let basis = self.position_basis(&times, tau, lambda);

        for d in 0..self.num_dof {
            let w = &weights[d * per_dof..d * per_dof + n_basis];
            let y0 = init_pos[d];
            let v0 = if delay > 0.0 { 0.0 } else { init_vel[d] };
            let g = self.goal(weights, y0, d);
            let c1 = y0 - g;
            let c2 = v0 + lambda * c1;

            for (row, &u) in times.iter().enumerate() {
                let decay = (-lambda * u).exp();
                let forced_pos: f64 = basis.pos.row(row).iter().zip(w).map(|(p, w)| p * w).sum();
                let forced_vel: f64 = basis.vel.row(row).iter().zip(w).map(|(p, w)| p * w).sum();
                pos[[held + row, d]] = g + forced_pos + decay * (c1 + c2 * u);
                vel[[held + row, d]] = forced_vel + decay * (v0 - lambda * c2 * u);
            }
        }

        Ok(Trajectory { pos, vel })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Dmp, DmpConfig};
    use ndarray::arr1;

    #[test]
    fn test_starts_at_current_state() {
        let config = ProDmpConfig::default().num_basis(3).relative_goal(true);
        let prodmp = ProDmp::new(&config, 1, 3.0).unwrap();
        let weights = [0.4, -0.2, 0.1, 0.5];
        let (y0, v0, dt) = (arr1(&[0.3]), arr1(&[2.0]), 0.001);
        let traj = prodmp
            .generate(&weights, y0.view(), v0.view(), 1.0, 0.0, dt)
            .unwrap();

        assert!((traj.pos[[0, 0]] - (0.3 + 2.0 * dt)).abs() < 1e-4);
        assert!((traj.vel[[0, 0]] - 2.0).abs() < 0.2);
    }

    #[test]
    fn test_converges_to_goal_with_offset() {
        let config = ProDmpConfig::default().num_basis(2).goal_offset(0.25);
        let prodmp = ProDmp::new(&config, 2, 3.0).unwrap();
        assert_eq!(prodmp.num_weights(), 6);
        // absolute goals 0.5 and -1.0, shifted by the offset
        let weights = [0.0, 0.0, 0.5, 0.0, 0.0, -1.0];
        let (y0, v0) = (arr1(&[0.0, 0.0]), arr1(&[1.0, 0.0]));
        let traj = prodmp.generate(&weights, y0.view(), v0.view(), 1.0, 0.0, 0.01).unwrap();

        let last = traj.pos.row(traj.len() - 1);
        assert!((last[0] - 0.75).abs() < 1e-3);
        assert!((last[1] + 0.75).abs() < 1e-3);
    }

    #[test]
    fn test_agrees_with_integrated_dmp() {
        let weights = [1.0, -1.0, 0.5, 0.3];
        let (y0, v0) = (arr1(&[0.2]), arr1(&[0.0]));
        let prodmp = ProDmp::new(&ProDmpConfig::default().num_basis(3).relative_goal(true), 1, 3.0)
            .unwrap();
        let dmp = Dmp::new(&DmpConfig::default().num_basis(3), 1, 3.0).unwrap();

        let closed = prodmp.generate(&weights, y0.view(), v0.view(), 1.0, 0.0, 0.0005).unwrap();
        let integrated = dmp.generate(&weights, y0.view(), v0.view(), 1.0, 0.0, 0.0005).unwrap();

        assert_eq!(closed.len(), integrated.len());
        let max_diff = closed
            .pos
            .iter()
            .zip(integrated.pos.iter())
            .fold(0.0_f64, |m, (a, b)| m.max((a - b).abs()));
        assert!(max_diff < 2e-2, "max difference {}", max_diff);
    }

    #[test]
    fn test_auto_scaled_basis_peaks_at_one() {
        let config = ProDmpConfig::default()
            .num_basis(3)
            .disable_goal(true)
            .auto_scale_basis(true);
        let prodmp = ProDmp::new(&config, 1, 3.0).unwrap();
        let traj = prodmp
            .generate(&[0.0, 1.0, 0.0], arr1(&[0.0]).view(), arr1(&[0.0]).view(), 1.0, 0.0, 0.01)
            .unwrap();

        let peak = traj.pos.iter().fold(0.0_f64, |m, p| m.max(p.abs()));
        assert!((peak - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_goal_keeps_start_without_forcing() {
        let config = ProDmpConfig::default().num_basis(2).disable_goal(true);
        let prodmp = ProDmp::new(&config, 1, 3.0).unwrap();
        assert_eq!(prodmp.num_weights(), 2);
        let traj = prodmp
            .generate(&[0.0, 0.0], arr1(&[0.7]).view(), arr1(&[0.0]).view(), 0.5, 0.0, 0.01)
            .unwrap();
        assert!(traj.pos.iter().all(|p| (*p - 0.7).abs() < 1e-12));
        assert!(traj.vel.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_holds_during_delay() {
        let config = ProDmpConfig::default().num_basis(2).relative_goal(true);
        let prodmp = ProDmp::new(&config, 1, 3.0).unwrap();
        let traj = prodmp
            .generate(&[0.0, 0.0, 1.0], arr1(&[0.2]).view(), arr1(&[3.0]).view(), 1.0, 0.1, 0.01)
            .unwrap();
        assert_eq!(traj.len(), 110);
        assert_eq!(traj.pos[[5, 0]], 0.2);
        assert_eq!(traj.vel[[5, 0]], 0.0);
        // the initial velocity is dropped when the movement starts after a hold
        assert!(traj.pos[[10, 0]] - 0.2 < 0.015);
        assert!(traj.pos[[60, 0]] > 0.2);
    }

    #[test]
    fn test_rejects_wrong_weight_count() {
        let prodmp = ProDmp::new(&ProDmpConfig::default().num_basis(2), 2, 3.0).unwrap();
        let zeros = arr1(&[0.0, 0.0]);
        let res = prodmp.generate(&[0.0; 5], zeros.view(), zeros.view(), 1.0, 0.0, 0.01);
        assert!(matches!(res, Err(MpError::InvalidAction(_))));
    }
}
