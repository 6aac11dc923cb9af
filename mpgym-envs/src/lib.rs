#![warn(missing_docs)]
//! Classic-control reacher tasks and the environment registry.
//!
//! [`SimpleReacherEnv`], [`ViaPointReacherEnv`] and [`HoleReacherEnv`] are
//! planar n-link arms implementing [`Env`](mpgym_core::Env). Each comes with an
//! [`MpTask`](mpgym_mp::MpTask) adapter so that it can be driven by a
//! movement primitive through [`BlackBoxEnv`](mpgym_mp::BlackBoxEnv).
//!
//! [`Registry::with_defaults`] lists every task in each [`Variant`]: ProMP,
//! DMP and ProDMP, plus replanning DMP and ProDMP environments:
//!
//! ```no_run
//! use mpgym_envs::Registry;
//! use ndarray::Array1;
//!
//! # fn main() -> anyhow::Result<()> {
//! let registry = Registry::with_defaults();
//! let mut env = registry.make("SimpleReacherProMP-v0", 42)?;
//! let obs = env.reset_with_context(Some(&[0.5, 1.0][..]))?;
//! let step = env.step_trajectory(&Array1::zeros(env.num_params()))?;
//! println!("{:?} -> {}", obs, step.reward);
//! # Ok(())
//! # }
//! ```
mod env_spec;
mod error;
mod hole_reacher;
mod reacher;
mod registry;
mod simple_reacher;
mod via_point_reacher;

pub use env_spec::{EnvKindConfig, MpEnvSpec};
pub use error::RegistryError;
pub use hole_reacher::{Hole, HoleReacherConfig, HoleReacherEnv, HoleReacherTask};
pub use registry::{EnvConstructor, Registry, RegistryEntry, Variant};
pub use simple_reacher::{SimpleReacherConfig, SimpleReacherEnv, SimpleReacherTask};
pub use via_point_reacher::{ViaPointReacherConfig, ViaPointReacherEnv, ViaPointReacherTask};
