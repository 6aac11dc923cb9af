//! Catalog of movement primitive environments.
use crate::{
    EnvKindConfig, HoleReacherConfig, MpEnvSpec, RegistryError, SimpleReacherConfig,
    ViaPointReacherConfig,
};
use anyhow::Result;
use log::{debug, info, warn};
use mpgym_mp::{
    BlackBoxConfig, ControllerConfig, DmpConfig, EpisodicEnv, GeneratorConfig, MpConfig,
    PhaseConfig, ProDmpConfig, ProMpConfig, ReplanSchedule,
};
use std::{collections::HashMap, fmt, str::FromStr};

/// Movement primitive variant of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// ProMP without replanning.
    ProMP,

    /// DMP without replanning.
    DMP,

    /// DMP replanned on a fixed schedule.
    ReplanDMP,

    /// ProDMP without replanning.
    ProDMP,

    /// ProDMP replanned on a fixed schedule.
    ReplanProDMP,
}

impl Variant {
    /// All variants, in catalog order.
    pub const ALL: [Variant; 5] = [
        Variant::ProMP,
        Variant::DMP,
        Variant::ReplanDMP,
        Variant::ProDMP,
        Variant::ReplanProDMP,
    ];

    /// Tag used in environment ids.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ProMP => "ProMP",
            Self::DMP => "DMP",
            Self::ReplanDMP => "ReplanDMP",
            Self::ProDMP => "ProDMP",
            Self::ReplanProDMP => "ReplanProDMP",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Variant {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| RegistryError::UnknownVariant(s.to_string()))
    }
}

/// Builds an episodic environment from a spec and a seed.
pub type EnvConstructor = fn(&MpEnvSpec, i64) -> Result<Box<dyn EpisodicEnv>>;

fn build_from_spec(spec: &MpEnvSpec, seed: i64) -> Result<Box<dyn EpisodicEnv>> {
    spec.build(seed)
}

/// An entry of [`Registry`].
#[derive(Clone)]
pub struct RegistryEntry {
    /// Environment id, e.g. `SimpleReacherProMP-v0`.
    pub id: String,

    /// Movement primitive variant.
    pub variant: Variant,

    /// Default configuration.
    pub spec: MpEnvSpec,

    constructor: EnvConstructor,
}

impl RegistryEntry {
    /// An entry built with [`MpEnvSpec::build`].
    pub fn new(id: impl Into<String>, variant: Variant, spec: MpEnvSpec) -> Self {
        Self::with_constructor(id, variant, spec, build_from_spec)
    }

    /// An entry with a custom constructor.
    pub fn with_constructor(
        id: impl Into<String>,
        variant: Variant,
        spec: MpEnvSpec,
        constructor: EnvConstructor,
    ) -> Self {
        Self {
            id: id.into(),
            variant,
            spec,
            constructor,
        }
    }
}

/// Name to constructor mapping of environments.
///
/// Ids keep their registration order and are unique.
///
/// ```
/// use mpgym_envs::{Registry, Variant};
///
/// let registry = Registry::with_defaults();
/// assert_eq!(registry.ids()[0], "SimpleReacherProMP-v0");
/// assert_eq!(registry.ids_for_variant(Variant::ReplanProDMP).len(), 5);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn register(&mut self, entry: RegistryEntry) -> Result<(), RegistryError> {
        if self.index.contains_key(&entry.id) {
            return Err(RegistryError::DuplicateId(entry.id));
        }
        debug!("Register {}", entry.id);
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Looks up an entry.
    pub fn get(&self, id: &str) -> Result<&RegistryEntry, RegistryError> {
        self.index
            .get(id)
            .map(|ix| &self.entries[*ix])
            .ok_or_else(|| RegistryError::UnknownId(id.to_string()))
    }

    /// Builds the environment `id` with its default configuration.
    pub fn make(&self, id: &str, seed: i64) -> Result<Box<dyn EpisodicEnv>> {
        let entry = self.get(id)?;
        self.make_with(id, &entry.spec, seed)
    }

    /// Builds the environment `id` with a custom configuration.
    pub fn make_with(&self, id: &str, spec: &MpEnvSpec, seed: i64) -> Result<Box<dyn EpisodicEnv>> {
        let entry = self.get(id)?;
        info!("Make {}", id);
        (entry.constructor)(spec, seed)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    /// Registered ids of one variant in registration order.
    pub fn ids_for_variant(&self, variant: Variant) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.variant == variant)
            .map(|e| e.id.as_str())
            .collect()
    }

    /// Iterates over the entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The reacher catalog, every base task in every [`Variant`].
    pub fn with_defaults() -> Self {
        let pd = ControllerConfig::Pd {
            p_gains: vec![0.6],
            d_gains: vec![0.075],
        };
        let bases = [
            (
                "SimpleReacher",
                EnvKindConfig::SimpleReacher(SimpleReacherConfig::default().n_links(2)),
                pd.clone(),
                false,
            ),
            (
                "LongSimpleReacher",
                EnvKindConfig::SimpleReacher(SimpleReacherConfig::default().n_links(5)),
                pd.clone(),
                false,
            ),
            (
                "SimpleReacher7d",
                EnvKindConfig::SimpleReacher(SimpleReacherConfig::default().n_links(7)),
                pd.clone(),
                true,
            ),
            (
                "ViaPointReacher",
                EnvKindConfig::ViaPointReacher(ViaPointReacherConfig::default().n_links(5)),
                pd,
                false,
            ),
            (
                "HoleReacher",
                EnvKindConfig::HoleReacher(HoleReacherConfig::default().n_links(5)),
                ControllerConfig::Velocity,
                false,
            ),
        ];

        let mut registry = Self::new();
        for (base, env, controller, learn_tau) in bases {
            for variant in Variant::ALL {
                let id = format!("{}{}-v0", base, variant.tag());
                let mp = default_mp_config(variant, controller.clone(), learn_tau);
                let spec = MpEnvSpec::new(env.clone(), mp);
                if let Err(e) = registry.register(RegistryEntry::new(id, variant, spec)) {
                    warn!("Skip default entry: {}", e);
                }
            }
        }
        registry
    }
}

const MAX_EPISODE_STEPS: usize = 200;

fn default_mp_config(variant: Variant, controller: ControllerConfig, learn_tau: bool) -> MpConfig {
    let mut phase = PhaseConfig::default().tau(2.0);
    if learn_tau {
        phase = phase.learn_tau([0.5, 1.5]);
    }
    let black_box = BlackBoxConfig::default().max_episode_steps(Some(MAX_EPISODE_STEPS));

    let (generator, black_box) = match variant {
        Variant::ProMP => (
            GeneratorConfig::ProMP(ProMpConfig::default().num_basis(5).num_basis_zero_start(1)),
            black_box,
        ),
        Variant::DMP => (GeneratorConfig::DMP(DmpConfig::default().num_basis(5)), black_box),
        Variant::ReplanDMP => (
            GeneratorConfig::DMP(DmpConfig::default().num_basis(5)),
            black_box
                .replanning(ReplanSchedule::Every { interval: 50 })
                .max_planning_times(Some(3)),
        ),
        Variant::ProDMP => (GeneratorConfig::ProDMP(default_prodmp()), black_box),
        Variant::ReplanProDMP => (
            GeneratorConfig::ProDMP(default_prodmp()),
            black_box
                .replanning(ReplanSchedule::Every { interval: 50 })
                .max_planning_times(Some(3)),
        ),
    };

    MpConfig::default()
        .phase(phase)
        .generator(generator)
        .controller(controller)
        .black_box(black_box)
}

fn default_prodmp() -> ProDmpConfig {
    ProDmpConfig::default()
        .num_basis(5)
        .relative_goal(true)
        .auto_scale_basis(true)
}

#[cfg(test)]
mod test {
    use super::*;

    fn spec() -> MpEnvSpec {
        MpEnvSpec::new(
            EnvKindConfig::SimpleReacher(SimpleReacherConfig::default()),
            MpConfig::default(),
        )
    }

    #[test]
    fn test_duplicate_id() {
        let mut registry = Registry::new();
        registry
            .register(RegistryEntry::new("A-v0", Variant::ProMP, spec()))
            .unwrap();
        let err = registry
            .register(RegistryEntry::new("A-v0", Variant::DMP, spec()))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("A-v0".into()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A-v0").unwrap().variant, Variant::ProMP);
    }

    #[test]
    fn test_insertion_order() {
        let mut registry = Registry::new();
        for id in ["c", "a", "b"] {
            registry
                .register(RegistryEntry::new(id, Variant::DMP, spec()))
                .unwrap();
        }
        assert_eq!(registry.ids(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unknown_id() {
        let registry = Registry::with_defaults();
        assert!(matches!(
            registry.get("Nope-v0"),
            Err(RegistryError::UnknownId(_))
        ));
        assert!(registry.make("Nope-v0", 0).is_err());
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("replandmp".parse::<Variant>().unwrap(), Variant::ReplanDMP);
        assert_eq!("ProMP".parse::<Variant>().unwrap(), Variant::ProMP);
        assert_eq!("prodmp".parse::<Variant>().unwrap(), Variant::ProDMP);
        assert_eq!("ReplanProDMP".parse::<Variant>().unwrap(), Variant::ReplanProDMP);
        assert!("ProMP2".parse::<Variant>().is_err());
    }
}
