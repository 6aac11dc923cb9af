//! Utilities.
use crate::EpisodicEnv;
use ndarray::Array1;

/// Samples a random action for `env`.
///
/// Learned duration and delay are drawn uniformly inside their bounds, the
/// generator weights uniformly inside `[-weight_range, weight_range]`.
pub fn sample_random_action(
    env: &dyn EpisodicEnv,
    rng: &mut fastrand::Rng,
    weight_range: f64,
) -> Array1<f64> {
    let phase = env.phase();
    let mut action = Vec::with_capacity(env.num_params());
    if phase.learn_tau {
        action.push(uniform(rng, phase.tau_bound[0], phase.tau_bound[1]));
    }
    if phase.learn_delay {
        action.push(uniform(rng, phase.delay_bound[0], phase.delay_bound[1]));
    }
    action.extend((0..env.num_weights()).map(|_| uniform(rng, -weight_range, weight_range)));
    Array1::from(action)
}

fn uniform(rng: &mut fastrand::Rng, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.f64()
}
