//! Running a policy on an environment.
use crate::{
    record::{RecordValue, Recorder},
    Env, Policy,
};
use anyhow::Result;

/// Plays `n_episodes` episodes and returns the reward sum of each.
///
/// Episode `i` starts with `reset_with_index(i)`. The record of every step is
/// extended with `reward`, `episode` and `step` before it is handed to
/// `recorder`.
pub fn eval_with_recorder<E, P, R>(
    env: &mut E,
    policy: &mut P,
    n_episodes: usize,
    recorder: &mut R,
) -> Result<Vec<f64>>
where
    E: Env,
    P: Policy<E>,
    R: Recorder,
{
    let mut returns = Vec::with_capacity(n_episodes);

    for episode in 0..n_episodes {
        let mut obs = env.reset_with_index(episode)?;
        let mut sum = 0.0;

        for ix in 0.. {
            let (step, mut record) = env.step(&policy.sample(&obs))?;
            sum += step.reward;
            record.insert("reward", RecordValue::Scalar(step.reward));
            record.insert("episode", RecordValue::Scalar(episode as f64));
            record.insert("step", RecordValue::Scalar(ix as f64));
            recorder.write(record);

            if step.is_done() {
                break;
            }
            obs = step.obs;
        }
        returns.push(sum);
    }

    Ok(returns)
}
