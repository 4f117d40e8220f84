//! The contract between the laundry room and the robots it drives.
use std::path::Path;

use anyhow::{bail, Result};
use csv::Writer;
use rand::{rngs::StdRng, SeedableRng};

use crate::environment::{Action, ActionSet, Pos, Room};
use crate::table::{BestActions, QTable};

/// Read-only copy of what a robot can observe, handed to every hook.
#[derive(Debug, Clone)]
pub struct Senses {
    room: Room,
    room_size: usize,
    actions: ActionSet,
}

impl Senses {
    pub fn new(room: Room, room_size: usize, actions: ActionSet) -> Self {
        Self {
            room,
            room_size,
            actions,
        }
    }

    pub fn position(&self) -> Pos {
        self.room.robot
    }

    pub fn has_laundry(&self) -> bool {
        self.room.has_laundry
    }

    pub fn room_size(&self) -> usize {
        self.room_size
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn score(&self) -> i64 {
        self.room.score
    }

    /// Whether `action` is a move that would hit a wall from the current position.
    pub fn is_blocked(&self, action: Action) -> bool {
        let pos = self.position();
        let last = self.room_size.saturating_sub(1);
        match action {
            Action::Left => pos.col == 0,
            Action::Right => pos.col >= last,
            Action::Up => pos.row == 0,
            Action::Down => pos.row >= last,
            Action::Collect | Action::Place => false,
        }
    }
}

/// A robot driven by [`Env::run`](crate::environment::Env::run).
///
/// Hooks are called synchronously in a fixed order: `created` once, then for every turn
/// `get_action`, `rewarded` and `updated`, and finally `finished` once.
/// An error returned by any hook aborts the episode.
pub trait Agent {
    /// Called once before the first turn.
    fn created(&mut self, senses: &Senses) -> Result<()>;

    /// Chooses the action of this turn.
    fn get_action(&mut self, senses: &Senses) -> Result<Action>;

    /// Reward for the action just taken.
    ///
    /// `senses` still shows the room as it was before the action.
    fn rewarded(&mut self, senses: &Senses, action: Action, reward: i32) -> Result<()>;

    /// The turn is over, `senses` shows the room after the action.
    fn updated(&mut self, senses: &Senses) -> Result<()>;

    /// Called once after the last turn.
    fn finished(&mut self, senses: &Senses) -> Result<Option<AgentReport>>;
}

/// What a robot hands over for display once the episode is over.
#[derive(Debug, Clone, Default)]
pub struct AgentReport {
    /// Score before the first turn followed by the score after every turn.
    pub score_history: Vec<i64>,
    pub values: Option<QTable>,
    pub best_actions: Option<BestActions>,
}

impl AgentReport {
    /// Writes the score history as `turn,score` rows.
    pub fn write_score_history(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = Writer::from_path(path)?;
        wtr.write_record(&["turn", "score"])?;
        for (turn, score) in self.score_history.iter().enumerate() {
            wtr.write_record(&[turn.to_string(), score.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Picks a uniformly random action every turn.
pub struct RandomAgent {
    rng: StdRng,
    score_history: Vec<i64>,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
            score_history: Vec::new(),
        }
    }
}

impl Agent for RandomAgent {
    fn created(&mut self, senses: &Senses) -> Result<()> {
        self.score_history = vec![senses.score()];
        Ok(())
    }

    fn get_action(&mut self, senses: &Senses) -> Result<Action> {
        Ok(senses.actions().choose(&mut self.rng))
    }

    fn rewarded(&mut self, senses: &Senses, _action: Action, reward: i32) -> Result<()> {
        self.score_history.push(senses.score() + reward as i64);
        Ok(())
    }

    fn updated(&mut self, _senses: &Senses) -> Result<()> {
        Ok(())
    }

    fn finished(&mut self, _senses: &Senses) -> Result<Option<AgentReport>> {
        Ok(Some(AgentReport {
            score_history: self.score_history.clone(),
            ..AgentReport::default()
        }))
    }
}

/// Replays a list of action names, starting over when it runs out.
///
/// Names are only resolved when played, so a misspelled name ends the episode with
/// [`Error::InvalidAction`](crate::error::Error::InvalidAction).
pub struct ScriptedAgent {
    script: Vec<String>,
    next: usize,
    score_history: Vec<i64>,
}

impl ScriptedAgent {
    pub fn new<S: Into<String>>(script: impl IntoIterator<Item = S>) -> Self {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            next: 0,
            score_history: Vec::new(),
        }
    }

    /// Parses a comma separated script such as `"collect, down, place"`.
    pub fn parse(script: &str) -> Self {
        Self::new(
            script
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }
}

impl Agent for ScriptedAgent {
    fn created(&mut self, senses: &Senses) -> Result<()> {
        if self.script.is_empty() {
            bail!("the script has no actions");
        }
        self.score_history = vec![senses.score()];
        Ok(())
    }

    fn get_action(&mut self, _senses: &Senses) -> Result<Action> {
        if self.script.is_empty() {
            bail!("the script has no actions");
        }
        let name = &self.script[self.next % self.script.len()];
        self.next += 1;
        Ok(name.parse::<Action>()?)
    }

    fn rewarded(&mut self, senses: &Senses, _action: Action, reward: i32) -> Result<()> {
        self.score_history.push(senses.score() + reward as i64);
        Ok(())
    }

    fn updated(&mut self, _senses: &Senses) -> Result<()> {
        Ok(())
    }

    fn finished(&mut self, _senses: &Senses) -> Result<Option<AgentReport>> {
        Ok(Some(AgentReport {
            score_history: self.score_history.clone(),
            ..AgentReport::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn senses(size: usize, row: usize, col: usize) -> Senses {
        let room = Room {
            robot: Pos::new(row, col),
            has_laundry: false,
            score: 0,
        };
        Senses::new(room, size, ActionSet::standard())
    }

    #[test]
    fn blocked_moves() {
        let s = senses(3, 0, 0);
        assert!(s.is_blocked(Action::Left));
        assert!(s.is_blocked(Action::Up));
        assert!(!s.is_blocked(Action::Right));
        assert!(!s.is_blocked(Action::Down));
        assert!(!s.is_blocked(Action::Collect));

        let s = senses(3, 2, 2);
        assert!(s.is_blocked(Action::Right));
        assert!(s.is_blocked(Action::Down));
        assert!(!s.is_blocked(Action::Place));
    }

    #[test]
    fn script_parsing() {
        let mut agent = ScriptedAgent::parse(" collect, down ,,place ");
        let s = senses(3, 0, 0);
        agent.created(&s).unwrap();
        let played: Vec<Action> = (0..4).map(|_| agent.get_action(&s).unwrap()).collect();
        assert_eq!(
            played,
            vec![Action::Collect, Action::Down, Action::Place, Action::Collect]
        );
    }

    #[test]
    fn empty_script_is_rejected() {
        let mut agent = ScriptedAgent::parse(" , ");
        assert!(agent.created(&senses(2, 0, 0)).is_err());
        assert!(agent.get_action(&senses(2, 0, 0)).is_err());
    }

    #[test]
    fn blocked_in_an_empty_room() {
        let s = senses(0, 0, 0);
        assert!(s.is_blocked(Action::Left));
        assert!(s.is_blocked(Action::Right));
        assert!(!s.is_blocked(Action::Collect));
    }

    #[test]
    fn writes_score_history() -> Result<()> {
        let report = AgentReport {
            score_history: vec![0, 0, 10, 30],
            ..AgentReport::default()
        };
        let dir = TempDir::new("score_history")?;
        let path = dir.path().join("scores.csv");
        report.write_score_history(&path)?;
        assert_eq!(
            fs::read_to_string(&path)?,
            "turn,score\n0,0\n1,0\n2,10\n3,30\n"
        );
        Ok(())
    }
}
