use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::{info, trace};
use rand::{
    distributions::{Distribution, Standard},
    rngs::StdRng,
    Rng, SeedableRng,
};

use crate::agent::{Agent, AgentReport, Senses};
use crate::config::EnvConfig;
use crate::error::{Error, Result};

// Action
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Collect,
    Place,
}

impl Action {
    /// Every action, in the order used to break ties between equally valued actions.
    pub const ALL: [Action; 6] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Collect,
        Action::Place,
    ];

    /// Position of the action inside [`Action::ALL`].
    pub fn index(self) -> usize {
        match self {
            Action::Left => 0,
            Action::Right => 1,
            Action::Up => 2,
            Action::Down => 3,
            Action::Collect => 4,
            Action::Place => 5,
        }
    }

    /// Row/column displacement of a movement, `None` for collect and place.
    pub fn into_vector(self) -> Option<(isize, isize)> {
        match self {
            Action::Up => Some((-1, 0)),
            Action::Down => Some((1, 0)),
            Action::Left => Some((0, -1)),
            Action::Right => Some((0, 1)),
            Action::Collect | Action::Place => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Up => "up",
            Action::Down => "down",
            Action::Collect => "collect",
            Action::Place => "place",
        }
    }

    /// Map symbol used when drawing the best action of a cell.
    pub fn symbol(self) -> char {
        match self {
            Action::Left => '<',
            Action::Right => '>',
            Action::Up => '^',
            Action::Down => 'v',
            Action::Collect => 'o',
            Action::Place => 'x',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::InvalidAction(s.to_string()))
    }
}

impl Distribution<Action> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        Action::ALL[rng.gen_range(0..Action::ALL.len())]
    }
}

/// The fixed, ordered set of actions of an episode.
///
/// Cloning shares the same instance, so the environment and every agent see one set.
#[derive(Debug, Clone)]
pub struct ActionSet(Rc<[Action]>);

impl ActionSet {
    pub fn standard() -> Self {
        ActionSet(Rc::from(&Action::ALL[..]))
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    /// Uniformly random member of the set.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        self.0[rng.gen_range(0..self.0.len())]
    }

    /// Whether both handles point to the very same set.
    pub fn ptr_eq(&self, other: &ActionSet) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Self {
        Pos {
            row: rng.gen_range(0..size),
            col: rng.gen_range(0..size),
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Rewards of one episode, all scaled by half the room size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rewards {
    pub hamper: i32,
    pub laundry: i32,
    pub misplaced: i32,
}

impl Rewards {
    pub fn for_size(size: usize) -> Self {
        let half = (size / 2) as i32;
        Rewards {
            hamper: 15 * half,
            laundry: 5 * half,
            misplaced: -2 * half,
        }
    }
}

/// Mutable part of an episode: what the agent is allowed to observe.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Room {
    pub robot: Pos,
    pub has_laundry: bool,
    pub score: i64,
}

/// Outcome of [`Env::run`].
#[derive(Debug)]
pub struct Episode {
    pub score: i64,
    pub turns: usize,
    pub report: Option<AgentReport>,
}

/// The laundry room: a robot, a laundry pile and a hamper on a square grid.
pub struct Env {
    size: usize,
    iterations: usize,
    print: bool,
    hamper: Pos,
    laundry: Pos,
    rewards: Rewards,
    actions: ActionSet,
    room: Room,
}

impl Env {
    /// Builds a room with a random layout. Parameters are clamped, never rejected.
    pub fn new(config: &EnvConfig) -> Self {
        let config = config.clamped();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let size = config.size;
        let hamper = Pos::random(&mut rng, size);
        let mut laundry = Pos::random(&mut rng, size);
        while laundry == hamper {
            laundry = Pos::random(&mut rng, size);
        }
        let robot = Pos::random(&mut rng, size);
        Self::build(&config, robot, laundry, hamper)
    }

    /// Builds a room with a given layout.
    pub fn with_layout(config: &EnvConfig, robot: Pos, laundry: Pos, hamper: Pos) -> Result<Self> {
        let config = config.clamped();
        for (what, pos) in [("robot", robot), ("laundry", laundry), ("hamper", hamper)] {
            if pos.row >= config.size || pos.col >= config.size {
                return Err(Error::InvalidLayout(format!(
                    "{} at {} is outside a room of size {}",
                    what, pos, config.size
                )));
            }
        }
        if laundry == hamper {
            return Err(Error::InvalidLayout(format!(
                "laundry and hamper share the cell {}",
                laundry
            )));
        }
        Ok(Self::build(&config, robot, laundry, hamper))
    }

    fn build(config: &EnvConfig, robot: Pos, laundry: Pos, hamper: Pos) -> Self {
        Self {
            size: config.size,
            iterations: config.iterations,
            print: config.print,
            hamper,
            laundry,
            rewards: Rewards::for_size(config.size),
            actions: ActionSet::standard(),
            room: Room {
                robot,
                has_laundry: false,
                score: 0,
            },
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn hamper(&self) -> Pos {
        self.hamper
    }

    pub fn laundry(&self) -> Pos {
        self.laundry
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn room(&self) -> Room {
        self.room
    }

    /// A fresh read-only copy of the state the agent may observe.
    pub fn senses(&self) -> Senses {
        Senses::new(self.room, self.size, self.actions.clone())
    }

    /// Applies one action, adds its reward to the score and returns the reward.
    pub fn step(&mut self, action: Action) -> i32 {
        let reward = match action.into_vector() {
            Some(movement_vec) => {
                let (new_pos, _wall_hit) = self.check_movement(self.room.robot, movement_vec);
                self.room.robot = new_pos;
                0
            }
            None if action == Action::Collect => self.collect(),
            None => self.place(),
        };
        self.room.score += reward as i64;
        reward
    }

    /// Moves one cell. A step through a wall leaves the robot where it is.
    fn check_movement(&self, pos: Pos, movement_vec: (isize, isize)) -> (Pos, bool) {
        let size = self.size as isize;
        let new_row = pos.row as isize + movement_vec.0;
        let new_col = pos.col as isize + movement_vec.1;

        if new_row < 0 || new_row >= size || new_col < 0 || new_col >= size {
            return (pos, true);
        }
        (Pos::new(new_row as usize, new_col as usize), false)
    }

    fn collect(&mut self) -> i32 {
        if !self.room.has_laundry && self.room.robot == self.laundry {
            self.room.has_laundry = true;
            if self.print {
                info!("Successfully collected laundry");
            }
            return self.rewards.laundry;
        }
        0
    }

    fn place(&mut self) -> i32 {
        if !self.room.has_laundry {
            return 0;
        }
        self.room.has_laundry = false;
        if self.room.robot == self.hamper {
            if self.print {
                info!("Successfully deposited laundry");
            }
            self.rewards.hamper
        } else {
            if self.print {
                info!("Incorrectly deposited laundry");
            }
            self.rewards.misplaced
        }
    }

    /// Drives `agent` through the whole episode.
    ///
    /// Every turn asks for an action, applies it, then notifies the agent with
    /// `rewarded` (observations still from before the action) and `updated`
    /// (observations after the action), in that order.
    pub fn run<A: Agent + ?Sized>(&mut self, agent: &mut A) -> Result<Episode> {
        info!(
            "Running {} turns in a {}x{} room: robot {}, laundry {}, hamper {}, rewards {:?}",
            self.iterations, self.size, self.size, self.room.robot, self.laundry, self.hamper,
            self.rewards
        );
        agent
            .created(&self.senses())
            .map_err(|e| Error::from_hook("created", e))?;

        for turn in 1..=self.iterations {
            if self.print {
                info!("Iteration: {}/{}", turn, self.iterations);
                info!("Score: {}", self.room.score);
                info!("\n{}", self);
            }

            let before = self.senses();
            let action = agent
                .get_action(&before)
                .map_err(|e| Error::from_hook("get_action", e))?;
            // Action names are checked by `Action::from_str`, a parsed action is always in the set.
            let reward = self.step(action);
            trace!(
                "turn {}: {} -> reward {}, robot {}, laundry {}",
                turn, action, reward, self.room.robot, self.room.has_laundry
            );

            agent
                .rewarded(&before, action, reward)
                .map_err(|e| Error::from_hook("rewarded", e))?;
            agent
                .updated(&self.senses())
                .map_err(|e| Error::from_hook("updated", e))?;

            if self.print {
                info!("Action Taken: {}", action);
            }
        }

        let report = agent
            .finished(&self.senses())
            .map_err(|e| Error::from_hook("finished", e))?;
        info!("Finished with score {}", self.room.score);

        Ok(Episode {
            score: self.room.score,
            turns: self.iterations,
            report,
        })
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                let pos = Pos::new(row, col);
                let c = if pos == self.room.robot {
                    'R'
                } else if pos == self.hamper {
                    'H'
                } else if pos == self.laundry {
                    'L'
                } else {
                    '*'
                };
                write!(f, "{} ", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Row-major iterator over every cell of a square room.
pub struct EnvIter {
    curr_row: usize,
    curr_col: usize,
    first: bool,
    size: usize,
}

impl EnvIter {
    pub fn new(size: usize) -> EnvIter {
        EnvIter {
            size,
            curr_row: 0,
            curr_col: 0,
            first: true,
        }
    }
}

impl Iterator for EnvIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        if self.size == 0 {
            return None;
        }
        if self.first {
            self.first = false;
            return Some(Pos::new(0, 0));
        }
        if self.curr_row == self.size {
            return None;
        }
        self.curr_col += 1;
        if self.curr_col == self.size {
            self.curr_col = 0;
            self.curr_row += 1;
            if self.curr_row == self.size {
                return None;
            }
        }
        Some(Pos::new(self.curr_row, self.curr_col))
    }
}
