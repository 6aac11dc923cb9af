#![warn(missing_docs)]
//! Core abstractions of step-based environments.
//!
//! This crate defines the vocabulary shared by the rest of the workspace:
//! an environment ([`Env`]) emits a [`Step`] at every interaction, a
//! [`Policy`] maps observations to actions, and a [`Record`](record::Record)
//! carries diagnostics alongside each step.
//!
//! Both the low-level simulators in `mpgym-envs` and the episodic wrapper in
//! `mpgym-mp` implement [`Env`], so the same [`Evaluator`] and
//! [`util::eval_with_recorder`] work on either level.
pub mod error;
pub mod record;
pub mod util;

mod base;
pub use base::{Act, Env, Info, Obs, Policy, Step};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};
