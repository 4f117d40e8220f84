//! Robots selectable by name.
use std::collections::BTreeMap;

use crate::agent::{Agent, RandomAgent, ScriptedAgent};
use crate::error::{Error, Result};
use crate::qlearning::{QLearningAgent, QLearningConfig};

/// Everything a factory may need to build a robot.
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    pub seed: Option<u64>,
    pub qlearning: QLearningConfig,
    /// Comma separated action names for the scripted robot.
    pub script: String,
}

pub type AgentFactory = Box<dyn Fn(&AgentOptions) -> Box<dyn Agent>>;

/// Maps robot names to factories.
pub struct AgentRegistry {
    factories: BTreeMap<String, AgentFactory>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the robots shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("qlearning", |opts| {
            let mut config = opts.qlearning.clone();
            if config.seed.is_none() {
                config.seed = opts.seed;
            }
            Box::new(QLearningAgent::new(config))
        });
        registry.register("random", |opts| Box::new(RandomAgent::new(opts.seed)));
        registry.register("scripted", |opts| Box::new(ScriptedAgent::parse(&opts.script)));
        registry
    }

    /// Registers a factory, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&AgentOptions) -> Box<dyn Agent> + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, name: &str, opts: &AgentOptions) -> Result<Box<dyn Agent>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownAgent(name.to_string()))?;
        Ok(factory(opts))
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
