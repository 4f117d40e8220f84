//! A laundry collecting robot in a square room, for teaching reinforcement learning.
//!
//! The [`environment::Env`] owns the room and runs the turns, robots implement
//! [`agent::Agent`], and [`qlearning::QLearningAgent`] is the sample robot.
pub mod agent;
pub mod config;
pub mod environment;
pub mod error;
pub mod qlearning;
pub mod registry;
pub mod table;

pub use agent::{Agent, AgentReport, Senses};
pub use config::EnvConfig;
pub use environment::{Action, ActionSet, Env, Episode, Pos};
pub use error::Error;
pub use qlearning::{QLearningAgent, QLearningConfig};
pub use registry::{AgentOptions, AgentRegistry};
