//! Trajectory generators.
use crate::{Dmp, DmpConfig, MpError, PhaseConfig, ProDmp, ProDmpConfig, ProMp, ProMpConfig};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Desired positions and velocities, one row per low-level step.
///
/// Row `k` is the target at time `(k + 1) * dt` after the plan starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Desired joint positions, `(steps, dof)`.
    pub pos: Array2<f64>,

    /// Desired joint velocities, `(steps, dof)`.
    pub vel: Array2<f64>,
}

impl Trajectory {
    /// Number of low-level steps.
    pub fn len(&self) -> usize {
        self.pos.nrows()
    }

    /// `true` if the trajectory has no step.
    pub fn is_empty(&self) -> bool {
        self.pos.nrows() == 0
    }

    /// Number of degrees of freedom.
    pub fn num_dof(&self) -> usize {
        self.pos.ncols()
    }

    /// Shifts every desired position by `bias`.
    pub fn add_position_bias(&mut self, bias: ArrayView1<f64>) -> Result<(), MpError> {
        if bias.len() != self.num_dof() {
            return Err(MpError::InvalidAction(format!(
                "bias has {} entries, trajectory has {} degrees of freedom",
                bias.len(),
                self.num_dof()
            )));
        }
        self.pos += &bias;
        Ok(())
    }
}

/// Number of low-level steps covering `delay + tau` at time step `dt`.
pub fn num_steps(tau: f64, delay: f64, dt: f64) -> usize {
    ((tau + delay) / dt).round().max(0.0) as usize
}

/// Maps a weight vector to a [`Trajectory`].
///
/// Implementations must be deterministic: identical inputs give identical
/// trajectories.
pub trait TrajectoryGenerator {
    /// Number of degrees of freedom.
    fn num_dof(&self) -> usize;

    /// Number of weights expected by [`generate`](TrajectoryGenerator::generate).
    fn num_weights(&self) -> usize;

    /// Generates `num_steps(tau, delay, dt)` steps starting from the given
    /// position and velocity.
    fn generate(
        &self,
        weights: &[f64],
        init_pos: ArrayView1<f64>,
        init_vel: ArrayView1<f64>,
        tau: f64,
        delay: f64,
        dt: f64,
    ) -> Result<Trajectory, MpError>;
}

/// Checks the argument shapes shared by every generator.
pub(crate) fn check_inputs(
    gen: &dyn TrajectoryGenerator,
    weights: &[f64],
    init_pos: ArrayView1<f64>,
    init_vel: ArrayView1<f64>,
) -> Result<(), MpError> {
    if weights.len() != gen.num_weights() {
        return Err(MpError::InvalidAction(format!(
            "expected {} weights, got {}",
            gen.num_weights(),
            weights.len()
        )));
    }
    if init_pos.len() != gen.num_dof() || init_vel.len() != gen.num_dof() {
        return Err(MpError::InvalidConfig(format!(
            "initial state has {}/{} entries, generator has {} degrees of freedom",
            init_pos.len(),
            init_vel.len(),
            gen.num_dof()
        )));
    }
    Ok(())
}

/// Selects and configures a trajectory generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneratorConfig {
    /// Probabilistic movement primitive.
    ProMP(ProMpConfig),

    /// Dynamic movement primitive.
    DMP(DmpConfig),

    /// Dynamic movement primitive solved in closed form.
    ProDMP(ProDmpConfig),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::ProMP(ProMpConfig::default())
    }
}

impl GeneratorConfig {
    /// Short name used in environment ids.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProMP(_) => "ProMP",
            Self::DMP(_) => "DMP",
            Self::ProDMP(_) => "ProDMP",
        }
    }

    /// Builds the generator for `num_dof` degrees of freedom.
    pub fn build(
        &self,
        num_dof: usize,
        phase: &PhaseConfig,
    ) -> Result<Box<dyn TrajectoryGenerator>, MpError> {
        if num_dof == 0 {
            return Err(MpError::InvalidConfig(
                "a generator needs at least one degree of freedom".into(),
            ));
        }
        Ok(match self {
            Self::ProMP(config) => Box::new(ProMp::new(config, num_dof)?),
            Self::DMP(config) => Box::new(Dmp::new(config, num_dof, phase.alpha_phase)?),
            Self::ProDMP(config) => Box::new(ProDmp::new(config, num_dof, phase.alpha_phase)?),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_num_steps_rounds() {
        assert_eq!(num_steps(0.62, 0.0, 0.02), 31);
        assert_eq!(num_steps(1.0, 0.25, 0.01), 125);
        assert_eq!(num_steps(0.004, 0.0, 0.01), 0);
    }

    #[test]
    fn test_position_bias_is_broadcast() {
        let mut traj = Trajectory {
            pos: arr2(&[[0.0, 1.0], [2.0, 3.0]]),
            vel: Array2::zeros((2, 2)),
        };
        traj.add_position_bias(arr1(&[1.0, -1.0]).view()).unwrap();
        assert_eq!(traj.pos, arr2(&[[1.0, 0.0], [3.0, 2.0]]));
        assert!(traj.add_position_bias(arr1(&[1.0]).view()).is_err());
    }
}
