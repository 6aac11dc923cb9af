//! Random rollouts of episodic environments.
use anyhow::Result;
use log::info;
use mpgym_core::record::{Recorder, RecordValue};
use mpgym_mp::{util::sample_random_action, EpisodicEnv};

/// Runs `n_episodes` episodes with uniformly sampled parameter vectors.
///
/// Every high-level step is written to `recorder`. Returns the sum of the
/// aggregated rewards of each episode.
pub fn random_rollouts<R: Recorder>(
    env: &mut dyn EpisodicEnv,
    n_episodes: usize,
    seed: u64,
    weight_range: f64,
    recorder: &mut R,
) -> Result<Vec<f64>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut returns = Vec::with_capacity(n_episodes);

    for episode in 0..n_episodes {
        env.reset_with_index(episode)?;
        let mut r_total = 0.0;
        let mut decision = 0;

        loop {
            let action = sample_random_action(env, &mut rng, weight_range);
            let step = env.step_trajectory(&action)?;
            r_total += step.reward;

            let mut record = step.info.to_record(step.reward);
            record.insert("episode", RecordValue::Scalar(episode as _));
            record.insert("decision", RecordValue::Scalar(decision as _));
            recorder.write(record);

            if step.is_done() {
                break;
            }
            decision += 1;
        }
        info!(
            "Episode {}, return = {}, low-level steps = {}",
            episode,
            r_total,
            env.replan_state().t
        );
        returns.push(r_total);
    }

    Ok(returns)
}

#[cfg(test)]
mod test {
    use super::*;
    use mpgym_core::record::BufferedRecorder;
    use mpgym_envs::Registry;

    #[test]
    fn test_random_rollouts() -> Result<()> {
        let registry = Registry::with_defaults();
        let mut env = registry.make("LongSimpleReacherReplanDMP-v0", 0)?;
        let mut recorder = BufferedRecorder::new();
        let returns = random_rollouts(env.as_mut(), 2, 0, 0.5, &mut recorder)?;

        assert_eq!(returns.len(), 2);
        // three plans per episode
        assert_eq!(recorder.records().len(), 6);
        assert_eq!(recorder.scalars("decision")?, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(recorder.scalars("executed_steps")?[0], 50.0);
        Ok(())
    }
}
