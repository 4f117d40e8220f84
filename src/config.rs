//! Construction parameters of the laundry room.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

pub const MIN_SIZE: usize = 2;
pub const MAX_SIZE: usize = 20;
pub const MIN_ITERATIONS: usize = 1;
pub const MAX_ITERATIONS: usize = 12_000_000;

/// Configuration of [`Env`](crate::environment::Env).
///
/// Out of range values are never rejected, they are clamped when the environment is built.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EnvConfig {
    /// Side of the square room.
    pub size: usize,

    /// Number of turns in the episode.
    pub iterations: usize,

    /// Log the room every turn. Drastically slows the program.
    pub print: bool,

    /// Seed of the random layout. Entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            size: 5,
            iterations: 100_000,
            print: false,
            seed: None,
        }
    }
}

impl EnvConfig {
    pub fn size(mut self, v: usize) -> Self {
        self.size = v;
        self
    }

    pub fn iterations(mut self, v: usize) -> Self {
        self.iterations = v;
        self
    }

    pub fn print(mut self, v: bool) -> Self {
        self.print = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Returns a copy with `size` and `iterations` clamped to their legal ranges.
    pub fn clamped(&self) -> Self {
        Self {
            size: self.size.max(MIN_SIZE).min(MAX_SIZE),
            iterations: self.iterations.max(MIN_ITERATIONS).min(MAX_ITERATIONS),
            ..self.clone()
        }
    }

    /// Constructs [`EnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`EnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn clamps_size() {
        for (given, expected) in [(0, 2), (1, 2), (2, 2), (7, 7), (20, 20), (21, 20), (500, 20)] {
            assert_eq!(EnvConfig::default().size(given).clamped().size, expected);
        }
    }

    #[test]
    fn clamps_iterations() {
        let c = EnvConfig::default().iterations(0).clamped();
        assert_eq!(c.iterations, 1);
        let c = EnvConfig::default().iterations(MAX_ITERATIONS + 1).clamped();
        assert_eq!(c.iterations, MAX_ITERATIONS);
        let c = EnvConfig::default().iterations(42).clamped();
        assert_eq!(c.iterations, 42);
    }

    #[test]
    fn clamping_keeps_other_fields() {
        let c = EnvConfig::default().print(true).seed(9).size(100).clamped();
        assert!(c.print);
        assert_eq!(c.seed, Some(9));
    }

    #[test]
    fn serde_env_config() -> Result<()> {
        let config = EnvConfig::default().size(4).iterations(300).seed(17);

        let dir = TempDir::new("env_config")?;
        let path = dir.path().join("env_config.yaml");

        config.save(&path)?;
        let config_ = EnvConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
