//! Movement primitive black-box environments for episodic reinforcement learning.
//!
//! mpgym consists of the following crates:
//!
//! * [mpgym-core](mpgym_core) provides the step-based environment
//!   abstractions ([`Env`](mpgym_core::Env), [`Step`](mpgym_core::Step),
//!   [`Policy`](mpgym_core::Policy)), records and evaluators.
//! * [mpgym-mp](mpgym_mp) has the trajectory generators (ProMP, DMP, ProDMP), the
//!   tracking controllers and [`BlackBoxEnv`](mpgym_mp::BlackBoxEnv), which
//!   expands one parameter vector into a whole trajectory executed on a
//!   step-based environment.
//! * [mpgym-envs](mpgym_envs) contains classic-control reacher tasks and the
//!   [`Registry`](mpgym_envs::Registry) of ready-made environments.
//!
//! The `mpgym` binary lists the registry, prints default configurations and
//! runs random rollouts.
pub use mpgym_core;
pub use mpgym_envs;
pub use mpgym_mp;

pub mod rollout;
