//! Configuration of the movement primitive side of an environment.
use crate::{BlackBoxConfig, ControllerConfig, GeneratorConfig, PhaseConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Everything [`BlackBoxEnv`](crate::BlackBoxEnv) needs besides the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MpConfig {
    /// Duration and delay.
    pub phase: PhaseConfig,

    /// Trajectory generator.
    pub generator: GeneratorConfig,

    /// Tracking controller.
    pub controller: ControllerConfig,

    /// Episode execution.
    pub black_box: BlackBoxConfig,
}

impl MpConfig {
    /// Sets the phase configuration.
    pub fn phase(mut self, v: PhaseConfig) -> Self {
        self.phase = v;
        self
    }

    /// Sets the generator configuration.
    pub fn generator(mut self, v: GeneratorConfig) -> Self {
        self.generator = v;
        self
    }

    /// Sets the controller configuration.
    pub fn controller(mut self, v: ControllerConfig) -> Self {
        self.controller = v;
        self
    }

    /// Sets the execution configuration.
    pub fn black_box(mut self, v: BlackBoxConfig) -> Self {
        self.black_box = v;
        self
    }

    /// Constructs [`MpConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MpConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
