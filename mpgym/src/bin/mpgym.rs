use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use mpgym::rollout::random_rollouts;
use mpgym_core::record::NullRecorder;
use mpgym_envs::{MpEnvSpec, Registry, Variant};
use std::path::PathBuf;

/// Movement primitive environments
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered environment ids
    List {
        /// Only ids of this variant (ProMP, DMP, ReplanDMP, ProDMP or ReplanProDMP)
        #[arg(long)]
        variant: Option<String>,
    },

    /// Print the default configuration of an environment as YAML
    Config {
        /// Environment id
        id: String,
    },

    /// Run episodes with random parameter vectors
    Rollout {
        /// Environment id
        id: String,

        /// Number of episodes
        #[arg(short, long, default_value_t = 1)]
        episodes: usize,

        /// Random seed
        #[arg(short, long, default_value_t = 42)]
        seed: i64,

        /// Configuration file overriding the default one
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Weights are drawn from [-weight_range, weight_range]
        #[arg(long, default_value_t = 1.0)]
        weight_range: f64,
    },
}

fn list(registry: &Registry, variant: Option<&str>) -> Result<()> {
    let ids = match variant {
        Some(v) => registry.ids_for_variant(v.parse::<Variant>()?),
        None => registry.ids(),
    };
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

fn config(registry: &Registry, id: &str) -> Result<()> {
    let spec = &registry.get(id)?.spec;
    print!("{}", serde_yaml::to_string(spec)?);
    Ok(())
}

fn rollout(
    registry: &Registry,
    id: &str,
    episodes: usize,
    seed: i64,
    config: Option<PathBuf>,
    weight_range: f64,
) -> Result<()> {
    let mut env = match config {
        Some(path) => {
            info!("Load configuration from {:?}", path);
            registry.make_with(id, &MpEnvSpec::load(path)?, seed)?
        }
        None => registry.make(id, seed)?,
    };
    let returns = random_rollouts(
        env.as_mut(),
        episodes,
        seed as u64,
        weight_range,
        &mut NullRecorder {},
    )?;
    for (i, r) in returns.iter().enumerate() {
        println!("episode {}: return = {}", i, r);
    }
    let mean = returns.iter().sum::<f64>() / returns.len().max(1) as f64;
    println!("mean return = {}", mean);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let registry = Registry::with_defaults();

    match args.command {
        Command::List { variant } => list(&registry, variant.as_deref()),
        Command::Config { id } => config(&registry, &id),
        Command::Rollout {
            id,
            episodes,
            seed,
            config,
            weight_range,
        } => rollout(&registry, &id, episodes, seed, config, weight_range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_parse_rollout() {
        let args =
            Args::try_parse_from(["mpgym", "rollout", "SimpleReacherDMP-v0", "-e", "3"]).unwrap();
        match args.command {
            Command::Rollout { id, episodes, seed, .. } => {
                assert_eq!(id, "SimpleReacherDMP-v0");
                assert_eq!(episodes, 3);
                assert_eq!(seed, 42);
            }
            _ => panic!("expected rollout"),
        }
    }

    #[test]
    fn test_commands() -> Result<()> {
        let registry = Registry::with_defaults();
        list(&registry, Some("dmp"))?;
        assert!(list(&registry, Some("ProMP2")).is_err());
        config(&registry, "ViaPointReacherProMP-v0")?;
        assert!(config(&registry, "Nope-v0").is_err());

        let tmp_dir = TempDir::new("mpgym_cli")?;
        let path = tmp_dir.path().join("spec.yaml");
        registry.get("SimpleReacherProMP-v0")?.spec.save(&path)?;
        rollout(&registry, "SimpleReacherProMP-v0", 1, 0, Some(path), 0.5)?;
        Ok(())
    }
}
