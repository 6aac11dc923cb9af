use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use chrono::Local;
use log::info;

/// Plays a fixed number of episodes on its own environment.
///
/// Episode `i` is started with [`Env::reset_with_index`]`(i)`, so repeated
/// evaluations face the same initial states. The resulting [`Record`] holds
/// the mean return under `Episode return`, the individual returns under
/// `Episode returns` and the start time under `Evaluated at`.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Builds the environment with `config` and `seed`.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        let env = E::build(config, seed)?;
        Ok(Self::from_env(env, n_episodes))
    }

    /// Evaluates on `env`.
    pub fn from_env(env: E, n_episodes: usize) -> Self {
        Self { n_episodes, env }
    }

    /// The evaluation environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn run_episode<P: Policy<E>>(&mut self, ix: usize, policy: &mut P) -> Result<f64> {
        let mut obs = self.env.reset_with_index(ix)?;
        let mut sum = 0.0;
        loop {
            let (step, _) = self.env.step(&policy.sample(&obs))?;
            sum += step.reward;
            if step.is_done() {
                return Ok(sum);
            }
            obs = step.obs;
        }
    }
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>,
    {
        let started = Local::now();
        let returns = (0..self.n_episodes)
            .map(|ix| {
                let r = self.run_episode(ix, policy)?;
                info!("Evaluation episode {}: return {}", ix, r);
                Ok(r)
            })
            .collect::<Result<Vec<f64>>>()?;

        let mean = returns.iter().sum::<f64>() / self.n_episodes.max(1) as f64;
        let mut record = Record::from_scalar("Episode return", mean);
        record.insert("Episode returns", RecordValue::Array1(returns));
        record.insert("Evaluated at", RecordValue::DateTime(started));
        Ok(record)
    }
}
