//! The sample robot: tabular Q-learning with a decaying epsilon-greedy exploration.
use anyhow::{anyhow, Result};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use crate::agent::{Agent, AgentReport, Senses};
use crate::environment::Action;
use crate::table::{QTable, State};

/// Hyperparameters of [`QLearningAgent`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct QLearningConfig {
    /// Learning rate.
    pub alpha: f32,

    /// Discount factor.
    pub gamma: f32,

    /// Initial exploration rate.
    pub epsilon: f64,

    /// Exploration decay per turn, before division by the room size.
    pub epsilon_decay_scale: f64,

    /// Exploration never decays below this rate.
    pub min_epsilon: f64,

    /// Resample random moves that would walk into a wall.
    pub bounds_checked_exploration: bool,

    /// Log the whole value table when the episode is over.
    pub show_table: bool,

    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.5,
            epsilon: 1.0,
            epsilon_decay_scale: 0.00001,
            min_epsilon: 0.2,
            bounds_checked_exploration: false,
            show_table: false,
            seed: None,
        }
    }
}

impl QLearningConfig {
    pub fn alpha(mut self, v: f32) -> Self {
        self.alpha = v;
        self
    }

    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    pub fn min_epsilon(mut self, v: f64) -> Self {
        self.min_epsilon = v;
        self
    }

    pub fn bounds_checked_exploration(mut self, v: bool) -> Self {
        self.bounds_checked_exploration = v;
        self
    }

    pub fn show_table(mut self, v: bool) -> Self {
        self.show_table = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// Constructs [`QLearningConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QLearningConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

const EPSILON_LOG_INTERVAL: usize = 100_000;

pub struct QLearningAgent {
    config: QLearningConfig,
    rng: StdRng,
    table: Option<QTable>,
    epsilon: f64,
    delta_epsilon: f64,
    state: State,
    last_state: State,
    last_action: Option<Action>,
    reward: f32,
    score_history: Vec<i64>,
    turns: usize,
}

impl QLearningAgent {
    pub fn new(config: QLearningConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let origin = State {
            row: 0,
            col: 0,
            has_laundry: false,
        };
        Self {
            epsilon: config.epsilon,
            delta_epsilon: 0.0,
            config,
            rng,
            table: None,
            state: origin,
            last_state: origin,
            last_action: None,
            reward: 0.0,
            score_history: Vec::new(),
            turns: 0,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The value table, `None` until [`Agent::created`] ran.
    pub fn table(&self) -> Option<&QTable> {
        self.table.as_ref()
    }

    pub fn score_history(&self) -> &[i64] {
        &self.score_history
    }

    fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon - self.delta_epsilon).max(self.config.min_epsilon);
    }

    fn explore(&mut self, senses: &Senses) -> Action {
        let mut action = senses.actions().choose(&mut self.rng);
        if self.config.bounds_checked_exploration {
            while senses.is_blocked(action) {
                action = senses.actions().choose(&mut self.rng);
            }
        }
        action
    }

    // Q(s, a) = (1 - alpha) * Q(s, a) + alpha * (r + gamma * max_a' Q(s', a'))
    fn learn(&mut self, action: Action) -> Result<()> {
        let (alpha, gamma) = (self.config.alpha, self.config.gamma);
        let table = self.table.as_mut().ok_or_else(not_created)?;
        let old = table.get(self.last_state, action);
        let future = table.max_value(self.state);
        let value = (1.0 - alpha) * old + alpha * (self.reward + gamma * future);
        table.set(self.last_state, action, value);
        Ok(())
    }
}

fn not_created() -> anyhow::Error {
    anyhow!("the agent was used before `created`")
}

impl Agent for QLearningAgent {
    fn created(&mut self, senses: &Senses) -> Result<()> {
        let size = senses.room_size();
        self.table = Some(QTable::new(size));
        self.state = State::observe(senses);
        self.last_state = self.state;
        self.last_action = None;
        self.reward = 0.0;
        self.epsilon = self.config.epsilon;
        self.delta_epsilon = self.config.epsilon_decay_scale / size as f64;
        self.score_history = vec![senses.score()];
        self.turns = 0;
        Ok(())
    }

    fn get_action(&mut self, senses: &Senses) -> Result<Action> {
        if self.table.is_none() {
            return Err(not_created());
        }
        self.decay_epsilon();
        self.turns += 1;
        if self.turns % EPSILON_LOG_INTERVAL == 0 {
            debug!("turn {}: epsilon {}", self.turns, self.epsilon);
        }

        if self.rng.gen::<f64>() < self.epsilon {
            return Ok(self.explore(senses));
        }
        let table = self.table.as_ref().ok_or_else(not_created)?;
        Ok(table.best_action(self.state))
    }

    fn rewarded(&mut self, senses: &Senses, action: Action, reward: i32) -> Result<()> {
        self.last_state = State::observe(senses);
        self.last_action = Some(action);
        self.reward = reward as f32;
        self.score_history.push(senses.score() + reward as i64);
        Ok(())
    }

    fn updated(&mut self, senses: &Senses) -> Result<()> {
        self.state = State::observe(senses);
        let action = self
            .last_action
            .ok_or_else(|| anyhow!("updated before any action was rewarded"))?;
        self.learn(action)
    }

    fn finished(&mut self, _senses: &Senses) -> Result<Option<AgentReport>> {
        let table = self.table.as_ref().ok_or_else(not_created)?;
        let best_actions = table.best_actions();
        if self.config.show_table {
            info!("Action values:\n{}", table);
        }
        info!("Best actions:\n{}", best_actions);
        info!(
            "Final exploration rate {} after {} turns",
            self.epsilon, self.turns
        );
        Ok(Some(AgentReport {
            score_history: self.score_history.clone(),
            values: Some(table.clone()),
            best_actions: Some(best_actions),
        }))
    }
}
