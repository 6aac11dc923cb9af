//! Serializable description of a movement primitive environment.
use crate::{
    HoleReacherConfig, HoleReacherTask, SimpleReacherConfig, SimpleReacherTask,
    ViaPointReacherConfig, ViaPointReacherTask,
};
use anyhow::Result;
use log::info;
use mpgym_core::Env;
use mpgym_mp::{BlackBoxEnv, EpisodicEnv, MpConfig, MpTask};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// The underlying step-based environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EnvKindConfig {
    /// [`SimpleReacherEnv`](crate::SimpleReacherEnv).
    SimpleReacher(SimpleReacherConfig),

    /// [`ViaPointReacherEnv`](crate::ViaPointReacherEnv).
    ViaPointReacher(ViaPointReacherConfig),

    /// [`HoleReacherEnv`](crate::HoleReacherEnv).
    HoleReacher(HoleReacherConfig),
}

impl EnvKindConfig {
    /// Name of the environment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleReacher(_) => "SimpleReacherEnv",
            Self::ViaPointReacher(_) => "ViaPointReacherEnv",
            Self::HoleReacher(_) => "HoleReacherEnv",
        }
    }

    /// Number of links of the arm.
    pub fn n_links(&self) -> usize {
        match self {
            Self::SimpleReacher(c) => c.n_links,
            Self::ViaPointReacher(c) => c.n_links,
            Self::HoleReacher(c) => c.n_links,
        }
    }
}

/// Environment and movement primitive configuration of a registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpEnvSpec {
    /// Step-based environment.
    pub env: EnvKindConfig,

    /// Movement primitive.
    pub mp: MpConfig,
}

fn wrap<T>(
    env_config: &<T::Env as Env>::Config,
    task_config: &T::Config,
    mp: &MpConfig,
    seed: i64,
) -> Result<Box<dyn EpisodicEnv>>
where
    T: MpTask + 'static,
    T::Env: 'static,
{
    let env = <T::Env as Env>::build(env_config, seed)?;
    let task = T::build(task_config)?;
    Ok(Box::new(BlackBoxEnv::new(env, task, mp)?))
}

impl MpEnvSpec {
    /// Constructs [`MpEnvSpec`].
    pub fn new(env: EnvKindConfig, mp: MpConfig) -> Self {
        Self { env, mp }
    }

    /// Builds the episodic environment.
    pub fn build(&self, seed: i64) -> Result<Box<dyn EpisodicEnv>> {
        info!(
            "Build {} with {} generator, seed = {}",
            self.env.name(),
            self.mp.generator.name(),
            seed
        );
        match &self.env {
            EnvKindConfig::SimpleReacher(c) => wrap::<SimpleReacherTask>(c, c, &self.mp, seed),
            EnvKindConfig::ViaPointReacher(c) => {
                wrap::<ViaPointReacherTask>(c, c, &self.mp, seed)
            }
            EnvKindConfig::HoleReacher(c) => wrap::<HoleReacherTask>(c, c, &self.mp, seed),
        }
    }

    /// Constructs [`MpEnvSpec`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MpEnvSpec`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
