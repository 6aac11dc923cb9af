//! Tracking controllers.
use crate::MpError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Configuration of a [`Controller`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    /// Forward the desired position.
    Position,

    /// Forward the desired velocity.
    Velocity,

    /// Proportional-derivative control on the tracking error.
    ///
    /// A single gain is broadcast to every degree of freedom.
    Pd {
        /// Proportional gains.
        p_gains: Vec<f64>,
        /// Derivative gains.
        d_gains: Vec<f64>,
    },
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::Position
    }
}

impl ControllerConfig {
    /// Builds the controller for `num_dof` degrees of freedom.
    pub fn build(&self, num_dof: usize) -> Result<Controller, MpError> {
        match self {
            Self::Position => Ok(Controller::Position),
            Self::Velocity => Ok(Controller::Velocity),
            Self::Pd { p_gains, d_gains } => Ok(Controller::Pd {
                p_gains: gains("p_gains", p_gains, num_dof)?,
                d_gains: gains("d_gains", d_gains, num_dof)?,
            }),
        }
    }
}

fn gains(name: &str, v: &[f64], num_dof: usize) -> Result<Array1<f64>, MpError> {
    match v.len() {
        1 => Ok(Array1::from_elem(num_dof, v[0])),
        n if n == num_dof => Ok(Array1::from(v.to_vec())),
        n => Err(MpError::InvalidConfig(format!(
            "{} has {} entries, expected 1 or {}",
            name, n, num_dof
        ))),
    }
}

/// Maps desired and current joint state to a low-level action.
#[derive(Debug, Clone, PartialEq)]
pub enum Controller {
    /// Returns the desired position.
    Position,

    /// Returns the desired velocity.
    Velocity,

    /// `p * (pos_des - pos) + d * (vel_des - vel)`.
    Pd {
        /// Proportional gains.
        p_gains: Array1<f64>,
        /// Derivative gains.
        d_gains: Array1<f64>,
    },
}

impl Controller {
    /// Computes the low-level action.
    pub fn get_action(
        &self,
        des_pos: ArrayView1<f64>,
        des_vel: ArrayView1<f64>,
        c_pos: ArrayView1<f64>,
        c_vel: ArrayView1<f64>,
    ) -> Array1<f64> {
        match self {
            Self::Position => des_pos.to_owned(),
            Self::Velocity => des_vel.to_owned(),
            Self::Pd { p_gains, d_gains } => {
                p_gains * &(&des_pos - &c_pos) + d_gains * &(&des_vel - &c_vel)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_pd_controller() {
        let ctrl = ControllerConfig::Pd {
            p_gains: vec![2.0, 1.0],
            d_gains: vec![0.5],
        }
        .build(2)
        .unwrap();
        let a = ctrl.get_action(
            arr1(&[1.0, 2.0]).view(),
            arr1(&[0.0, 1.0]).view(),
            arr1(&[0.5, 2.5]).view(),
            arr1(&[1.0, 0.0]).view(),
        );
        assert_eq!(a, arr1(&[2.0 * 0.5 + 0.5 * -1.0, 1.0 * -0.5 + 0.5 * 1.0]));
    }

    #[test]
    fn test_gain_length_is_checked() {
        let config = ControllerConfig::Pd {
            p_gains: vec![1.0, 2.0, 3.0],
            d_gains: vec![0.1],
        };
        assert!(matches!(config.build(2), Err(MpError::InvalidConfig(_))));
    }

    #[test]
    fn test_passthrough_controllers() {
        let (p, v) = (arr1(&[1.0]), arr1(&[2.0]));
        let z = arr1(&[9.0]);
        assert_eq!(
            Controller::Position.get_action(p.view(), v.view(), z.view(), z.view()),
            p
        );
        assert_eq!(
            Controller::Velocity.get_action(p.view(), v.view(), z.view(), z.view()),
            v
        );
    }
}
