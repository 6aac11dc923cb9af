//! Environments, steps and policies.
mod env;
mod policy;
mod step;
pub use env::Env;
pub use policy::Policy;
pub use step::{Info, Step};

use ndarray::Array1;
use std::fmt::Debug;

/// Observation of an [`Env`].
pub trait Obs: Clone + Debug {
    /// Number of components.
    fn len(&self) -> usize;
}

/// Action of an [`Env`].
pub trait Act: Clone + Debug {
    /// Number of components.
    fn len(&self) -> usize;
}

impl Obs for Array1<f64> {
    fn len(&self) -> usize {
        self.dim()
    }
}

impl Act for Array1<f64> {
    fn len(&self) -> usize {
        self.dim()
    }
}
