use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use laundry_robot::{AgentOptions, AgentRegistry, Env, EnvConfig, QLearningConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Teach a robot to put the laundry in the hamper")]
struct Args {
    /// Size of the room (2-20)
    #[arg(long)]
    size: Option<usize>,

    /// Iterations to run (1-12000000)
    #[arg(long)]
    iterations: Option<usize>,

    /// Print the room every turn (drastically slows the program)
    #[arg(long, default_value_t = false)]
    print: bool,

    /// Name of the robot to run
    #[arg(long, default_value = "qlearning")]
    agent: String,

    /// Comma separated actions played by the `scripted` robot
    #[arg(long, default_value = "")]
    script: String,

    /// Random seed for the room and the robot
    #[arg(long)]
    seed: Option<u64>,

    /// Room configuration in YAML, flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Q-learning hyperparameters in YAML
    #[arg(long)]
    qlearning_config: Option<PathBuf>,

    /// Never explore moves that walk into a wall
    #[arg(long, default_value_t = false)]
    bounds_checked: bool,

    /// Log the full action value table at the end
    #[arg(long, default_value_t = false)]
    show_table: bool,

    /// Write the score history to this CSV file
    #[arg(long)]
    scores: Option<PathBuf>,
}

fn env_config(args: &Args) -> Result<EnvConfig> {
    let mut config = match &args.config {
        Some(path) => EnvConfig::load(path)?,
        None => EnvConfig::default(),
    };
    if let Some(size) = args.size {
        config = config.size(size);
    }
    if let Some(iterations) = args.iterations {
        config = config.iterations(iterations);
    }
    if args.print {
        config = config.print(true);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    Ok(config)
}

fn agent_options(args: &Args, config: &EnvConfig) -> Result<AgentOptions> {
    let mut qlearning = match &args.qlearning_config {
        Some(path) => QLearningConfig::load(path)?,
        None => QLearningConfig::default(),
    };
    if args.bounds_checked {
        qlearning = qlearning.bounds_checked_exploration(true);
    }
    if args.show_table {
        qlearning = qlearning.show_table(true);
    }
    Ok(AgentOptions {
        seed: config.seed.map(|seed| seed.wrapping_add(1)),
        qlearning,
        script: args.script.clone(),
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = env_config(&args)?;
    let registry = AgentRegistry::with_builtin();
    let mut agent = registry.build(&args.agent, &agent_options(&args, &config)?)?;

    let mut env = Env::new(&config);
    let episode = env.run(agent.as_mut())?;
    info!("Score after {} turns: {}", episode.turns, episode.score);

    if let (Some(path), Some(report)) = (&args.scores, &episode.report) {
        report.write_score_history(path)?;
        info!("Saved the score history in {:?}", path);
    }
    Ok(())
}
