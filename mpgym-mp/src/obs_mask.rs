//! Active observation mask.
use crate::MpError;
use ndarray::Array1;

/// A named block of consecutive observation entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ObsComponent {
    /// Name of the block, e.g. `"joint_velocities"`.
    pub name: String,

    /// Number of entries.
    pub len: usize,

    /// Whether the entries are exposed to the caller.
    pub active: bool,
}

/// Boolean selector over an ordered catalog of observation components.
///
/// Declared once per task; [`apply`](ObsMask::apply) is a pure projection that
/// keeps the relative order of the selected entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ObsMask {
    components: Vec<ObsComponent>,
    mask: Vec<bool>,
}

/// Builder of [`ObsMask`].
#[derive(Debug, Default)]
pub struct ObsMaskBuilder {
    components: Vec<ObsComponent>,
}

impl ObsMaskBuilder {
    /// Appends a component to the catalog.
    pub fn component(mut self, name: impl Into<String>, len: usize, active: bool) -> Self {
        self.components.push(ObsComponent {
            name: name.into(),
            len,
            active,
        });
        self
    }

    /// Builds the mask.
    pub fn build(self) -> ObsMask {
        let mask = self
            .components
            .iter()
            .flat_map(|c| std::iter::repeat(c.active).take(c.len))
            .collect();
        ObsMask {
            components: self.components,
            mask,
        }
    }
}

impl ObsMask {
    /// Starts a catalog.
    pub fn builder() -> ObsMaskBuilder {
        ObsMaskBuilder::default()
    }

    /// A mask from raw booleans, as a single unnamed component per entry.
    pub fn from_bools(mask: Vec<bool>) -> Self {
        let components = mask
            .iter()
            .enumerate()
            .map(|(i, active)| ObsComponent {
                name: format!("obs_{}", i),
                len: 1,
                active: *active,
            })
            .collect();
        Self { components, mask }
    }

    /// A mask selecting all `len` entries.
    pub fn all(len: usize) -> Self {
        Self::builder().component("obs", len, true).build()
    }

    /// Number of raw observation entries covered.
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    /// `true` if the mask covers nothing.
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Number of selected entries.
    pub fn active_len(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// The catalog.
    pub fn components(&self) -> &[ObsComponent] {
        &self.components
    }

    /// The flattened selector.
    pub fn as_slice(&self) -> &[bool] {
        &self.mask
    }

    /// Projects `obs` onto the selected entries.
    pub fn apply(&self, obs: &Array1<f64>) -> Result<Array1<f64>, MpError> {
        if obs.len() != self.mask.len() {
            return Err(MpError::ObservationMask {
                mask: self.mask.len(),
                obs: obs.len(),
            });
        }
        Ok(obs
            .iter()
            .zip(self.mask.iter())
            .filter_map(|(v, m)| m.then(|| *v))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr1;

    fn mask() -> ObsMask {
        ObsMask::builder()
            .component("cos", 2, false)
            .component("sin", 2, true)
            .component("goal", 2, true)
            .component("steps", 1, false)
            .build()
    }

    #[test]
    fn test_projection_keeps_order() {
        let obs = arr1(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let m = mask();
        assert_eq!(m.len(), 7);
        assert_eq!(m.active_len(), 4);
        assert_eq!(m.apply(&obs).unwrap(), arr1(&[2.0, 3.0, 4.0, 5.0]));
    }

    #[test]
    fn test_length_mismatch() {
        let err = mask().apply(&arr1(&[0.0; 6])).unwrap_err();
        assert!(matches!(err, MpError::ObservationMask { mask: 7, obs: 6 }));
    }

    #[test]
    fn test_from_bools() {
        let m = ObsMask::from_bools(vec![true, false, true]);
        assert_eq!(m.apply(&arr1(&[1.0, 2.0, 3.0])).unwrap(), arr1(&[1.0, 3.0]));
        assert_eq!(m.components().len(), 3);
    }
}
