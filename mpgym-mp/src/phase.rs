//! Duration and delay of a movement, and the parameter layout of actions.
use crate::MpError;
use serde::{Deserialize, Serialize};

/// Timing of a movement primitive.
///
/// When `learn_tau` (`learn_delay`) is set, the duration (delay) is the first
/// (next) component of every action and must lie inside `tau_bound`
/// (`delay_bound`). Otherwise the fixed `tau` (`delay`) is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Duration of the movement in seconds.
    pub tau: f64,

    /// Time before the movement starts, in seconds.
    pub delay: f64,

    /// Take the duration from the action.
    pub learn_tau: bool,

    /// Take the delay from the action.
    pub learn_delay: bool,

    /// Inclusive bounds of a learned duration.
    pub tau_bound: [f64; 2],

    /// Inclusive bounds of a learned delay.
    pub delay_bound: [f64; 2],

    /// Decay rate of the exponential phase used by DMPs.
    pub alpha_phase: f64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            tau: 1.0,
            delay: 0.0,
            learn_tau: false,
            learn_delay: false,
            tau_bound: [0.5, 1.5],
            delay_bound: [0.0, 0.5],
            alpha_phase: 2.0,
        }
    }
}

/// An action split into timing and generator weights.
#[derive(Debug, Clone, PartialEq)]
pub struct MpParams<'a> {
    /// Duration of the movement.
    pub tau: f64,

    /// Start delay.
    pub delay: f64,

    /// Generator weights.
    pub weights: &'a [f64],
}

impl PhaseConfig {
    /// Sets the fixed duration.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the fixed delay.
    pub fn delay(mut self, v: f64) -> Self {
        self.delay = v;
        self
    }

    /// Learns the duration within `bound`.
    pub fn learn_tau(mut self, bound: [f64; 2]) -> Self {
        self.learn_tau = true;
        self.tau_bound = bound;
        self
    }

    /// Learns the delay within `bound`.
    pub fn learn_delay(mut self, bound: [f64; 2]) -> Self {
        self.learn_delay = true;
        self.delay_bound = bound;
        self
    }

    /// Sets the decay rate of the exponential phase.
    pub fn alpha_phase(mut self, v: f64) -> Self {
        self.alpha_phase = v;
        self
    }

    /// Number of leading action components consumed by the timing.
    pub fn num_params(&self) -> usize {
        self.learn_tau as usize + self.learn_delay as usize
    }

    /// Checks internal consistency: positive fixed duration, ordered bounds.
    pub fn validate(&self) -> Result<(), MpError> {
        if !(self.tau > 0.0) || !(self.delay >= 0.0) {
            return Err(MpError::InvalidConfig(format!(
                "tau must be positive and delay non-negative, got tau = {}, delay = {}",
                self.tau, self.delay
            )));
        }
        for (name, [lo, hi]) in [("tau_bound", self.tau_bound), ("delay_bound", self.delay_bound)] {
            if !(lo <= hi) {
                return Err(MpError::InvalidConfig(format!(
                    "{} must be ordered, got [{}, {}]",
                    name, lo, hi
                )));
            }
        }
        Ok(())
    }

    /// Splits `action` into timing and weights.
    ///
    /// `num_weights` is the generator's weight count; the action must hold
    /// exactly `num_params() + num_weights` components.
    pub fn split<'a>(
        &self,
        action: &'a [f64],
        num_weights: usize,
    ) -> Result<MpParams<'a>, MpError> {
        let expected = self.num_params() + num_weights;
        if action.len() != expected {
            return Err(MpError::InvalidAction(format!(
                "expected {} parameters, got {}",
                expected,
                action.len()
            )));
        }

        let mut ix = 0;
        let tau = if self.learn_tau {
            ix += 1;
            check_bound("tau", action[0], self.tau_bound)?;
            if !(action[0] > 0.0) {
                return Err(MpError::InvalidAction(format!(
                    "tau must be positive, got {}",
                    action[0]
                )));
            }
            action[0]
        } else {
            self.tau
        };
        let delay = if self.learn_delay {
            let v = action[ix];
            ix += 1;
            check_bound("delay", v, self.delay_bound)?;
            if !(v >= 0.0) {
                return Err(MpError::InvalidAction(format!(
                    "delay must be non-negative, got {}",
                    v
                )));
            }
            v
        } else {
            self.delay
        };

        Ok(MpParams {
            tau,
            delay,
            weights: &action[ix..],
        })
    }
}

fn check_bound(name: &str, v: f64, [lo, hi]: [f64; 2]) -> Result<(), MpError> {
    if v >= lo && v <= hi {
        Ok(())
    } else {
        Err(MpError::InvalidAction(format!(
            "{} = {} outside of [{}, {}]",
            name, v, lo, hi
        )))
    }
}

/// Linear phase in `[0, 1]` and its time derivative at time `t`.
pub(crate) fn linear_phase(t: f64, tau: f64, delay: f64) -> (f64, f64) {
    let s = (t - delay) / tau;
    if s <= 0.0 {
        (0.0, 0.0)
    } else if s >= 1.0 {
        (1.0, 0.0)
    } else {
        (s, 1.0 / tau)
    }
}
