//! Normalized radial basis functions over a phase variable.

/// Normalized Gaussian basis functions.
///
/// `zero_start` leading and `zero_goal` trailing functions take part in the
/// normalization but carry fixed zero weights, so only
/// [`num_learned`](RbfBasis::num_learned) functions are exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct RbfBasis {
    centers: Vec<f64>,
    bandwidths: Vec<f64>,
    zero_start: usize,
    zero_goal: usize,
}

impl RbfBasis {
    /// Centers evenly spaced over `[0, 1]`, bandwidth `factor / spacing^2`.
    pub fn linear(
        num_basis: usize,
        bandwidth_factor: f64,
        zero_start: usize,
        zero_goal: usize,
    ) -> Self {
        let n = zero_start + num_basis + zero_goal;
        let centers = linspace(n);
        let dist = if n > 1 { 1.0 / (n - 1) as f64 } else { 1.0 };
        let bandwidths = vec![bandwidth_factor / (dist * dist); n];
        Self {
            centers,
            bandwidths,
            zero_start,
            zero_goal,
        }
    }

    /// Centers placed along the exponentially decaying phase `exp(-alpha * s)`.
    pub fn exponential(num_basis: usize, bandwidth_factor: f64, alpha_phase: f64) -> Self {
        let centers: Vec<f64> = linspace(num_basis)
            .into_iter()
            .map(|s| (-alpha_phase * s).exp())
            .collect();
        let bandwidths = (0..num_basis)
            .map(|i| {
                let d = if num_basis == 1 {
                    1.0
                } else if i + 1 < num_basis {
                    centers[i] - centers[i + 1]
                } else {
                    centers[i - 1] - centers[i]
                };
                bandwidth_factor / (d * d)
            })
            .collect();
        Self {
            centers,
            bandwidths,
            zero_start: 0,
            zero_goal: 0,
        }
    }

    /// Number of functions with free weights.
    pub fn num_learned(&self) -> usize {
        self.centers.len() - self.zero_start - self.zero_goal
    }

    /// Values of the learned functions at phase `s`.
    pub fn values(&self, s: f64) -> Vec<f64> {
        let g = self.raw(s);
        let total: f64 = g.iter().sum();
        self.learned(&g)
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect()
    }

    /// Derivatives of the learned functions with respect to `s`.
    pub fn derivatives(&self, s: f64) -> Vec<f64> {
        let g = self.raw(s);
        let dg: Vec<f64> = g
            .iter()
            .zip(self.centers.iter().zip(self.bandwidths.iter()))
            .map(|(gi, (c, h))| -h * (s - c) * gi)
            .collect();
        let total: f64 = g.iter().sum();
        let d_total: f64 = dg.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.num_learned()];
        }

        self.learned(&g)
            .iter()
            .zip(self.learned(&dg))
            .map(|(gi, dgi)| dgi / total - gi * d_total / (total * total))
            .collect()
    }

    fn raw(&self, s: f64) -> Vec<f64> {
        self.centers
            .iter()
            .zip(self.bandwidths.iter())
            .map(|(c, h)| (-0.5 * h * (s - c) * (s - c)).exp())
            .collect()
    }

    fn learned<'a>(&self, v: &'a [f64]) -> &'a [f64] {
        &v[self.zero_start..v.len() - self.zero_goal]
    }
}

fn linspace(n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![0.5],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partition_of_unity_without_zero_bases() {
        let basis = RbfBasis::linear(5, 2.0, 0, 0);
        for s in [0.0, 0.3, 0.77, 1.0] {
            let sum: f64 = basis.values(s).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_bases_are_hidden() {
        let basis = RbfBasis::linear(3, 2.0, 2, 1);
        assert_eq!(basis.num_learned(), 3);
        assert_eq!(basis.values(0.5).len(), 3);
        assert_eq!(basis.derivatives(0.5).len(), 3);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let basis = RbfBasis::linear(4, 2.0, 1, 0);
        let (s, eps) = (0.4, 1e-6);
        let lo = basis.values(s - eps);
        let hi = basis.values(s + eps);
        for (i, d) in basis.derivatives(s).iter().enumerate() {
            let fd = (hi[i] - lo[i]) / (2.0 * eps);
            assert!((d - fd).abs() < 1e-5, "basis {}: {} vs {}", i, d, fd);
        }
    }

    #[test]
    fn test_exponential_centers_decay() {
        let basis = RbfBasis::exponential(4, 3.0, 3.0);
        assert_eq!(basis.num_learned(), 4);
        assert!(basis.centers.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(basis.centers[0], 1.0);
    }
}
