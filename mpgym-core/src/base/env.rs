//! Step-based environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// A single, non-vectorized environment advancing one action at a time.
///
/// Simulators implement it with joint commands as actions. The episodic
/// wrapper implements it with parameter vectors as actions, so that an
/// [`Evaluator`](crate::Evaluator) drives either level unchanged.
pub trait Env {
    /// Value the environment is built from.
    type Config: Clone;

    /// Observation type.
    type Obs: Obs;

    /// Action type.
    type Act: Act;

    /// Payload of each [`Step`].
    type Info: Info;

    /// Creates the environment. `seed` initializes its random generator.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Applies `a`. The returned [`Record`] holds per-step diagnostics.
    ///
    /// An error is fatal for the running episode.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Starts episode number `ix`.
    ///
    /// Implementations derive their randomness from `ix` so that evaluation
    /// runs are reproducible.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
