//! Movement primitives and the black-box episodic wrapper.
//!
//! A movement primitive turns a small parameter vector into a full trajectory
//! of joint targets. [`BlackBoxEnv`] uses one to drive a step-based
//! [`Env`](mpgym_core::Env): each high-level action is expanded into a
//! [`Trajectory`], tracked step by step with a [`Controller`], and the
//! collected rewards are aggregated into a single return.
//!
//! The pieces:
//!
//! * [`PhaseConfig`] - duration (`tau`) and start delay, optionally learned.
//! * [`TrajectoryGenerator`] with the [`ProMp`], [`Dmp`] and [`ProDmp`]
//!   implementations.
//! * [`Controller`] - maps desired and current joint state to a low-level action.
//! * [`ObsMask`] - selects the observation components exposed to the caller.
//! * [`MpTask`] - the per-task adapter (state accessors, context, replanning).
//! * [`BlackBoxEnv`] - the episodic wrapper, also available behind the
//!   object-safe [`EpisodicEnv`] trait.
mod basis;
mod black_box;
mod config;
mod controller;
mod dmp;
mod error;
mod generator;
mod obs_mask;
mod phase;
mod prodmp;
mod promp;
mod task;
pub mod util;

pub use basis::RbfBasis;
pub use black_box::{
    BlackBoxConfig, BlackBoxEnv, BlackBoxEnvConfig, BlackBoxInfo, BlackBoxStep, EpisodeState,
    EpisodicEnv, ReplanSchedule, ReplanState,
};
pub use config::MpConfig;
pub use controller::{Controller, ControllerConfig};
pub use dmp::{Dmp, DmpConfig};
pub use error::MpError;
pub use generator::{num_steps, GeneratorConfig, Trajectory, TrajectoryGenerator};
pub use obs_mask::{ObsComponent, ObsMask, ObsMaskBuilder};
pub use phase::{MpParams, PhaseConfig};
pub use prodmp::{ProDmp, ProDmpConfig};
pub use promp::{ProMp, ProMpConfig};
pub use task::MpTask;
