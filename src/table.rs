//! Tabular action values, one row per (row, col, carrying) state.
use std::fmt;

use ndarray::{s, Array3, Array4, ArrayView1};
use ordered_float::OrderedFloat;

use crate::agent::Senses;
use crate::environment::{Action, EnvIter};

/// A robot state as seen by a tabular learner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct State {
    pub row: usize,
    pub col: usize,
    pub has_laundry: bool,
}

impl State {
    pub fn observe(senses: &Senses) -> Self {
        let pos = senses.position();
        State {
            row: pos.row,
            col: pos.col,
            has_laundry: senses.has_laundry(),
        }
    }
}

/// Estimated value of every action in every state, all zero at start.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array4<f32>,
}

impl QTable {
    pub fn new(room_size: usize) -> Self {
        Self {
            values: Array4::zeros((room_size, room_size, 2, Action::ALL.len())),
        }
    }

    pub fn room_size(&self) -> usize {
        self.values.shape()[0]
    }

    /// Values of all actions of a state, in [`Action::ALL`] order.
    pub fn values(&self, state: State) -> ArrayView1<f32> {
        self.values
            .slice(s![state.row, state.col, state.has_laundry as usize, ..])
    }

    pub fn get(&self, state: State, action: Action) -> f32 {
        self.values[[state.row, state.col, state.has_laundry as usize, action.index()]]
    }

    pub fn set(&mut self, state: State, action: Action, value: f32) {
        self.values[[state.row, state.col, state.has_laundry as usize, action.index()]] = value;
    }

    /// The best action of a state. The first one in [`Action::ALL`] order wins a tie.
    pub fn best_action(&self, state: State) -> Action {
        Action::ALL.iter().copied().fold(Action::ALL[0], |a, f| {
            if self.get(state, f) > self.get(state, a) {
                f
            } else {
                a
            }
        })
    }

    /// Value of the best action of a state.
    pub fn max_value(&self, state: State) -> f32 {
        self.values(state)
            .iter()
            .map(|v| OrderedFloat(*v))
            .max()
            .map_or(0.0, OrderedFloat::into_inner)
    }

    /// Best action of every state.
    pub fn best_actions(&self) -> BestActions {
        let size = self.room_size();
        let actions = Array3::from_shape_fn((size, size, 2), |(row, col, laundry)| {
            self.best_action(State {
                row,
                col,
                has_laundry: laundry == 1,
            })
        });
        BestActions { actions }
    }
}

fn laundry_label(has_laundry: bool) -> &'static str {
    if has_laundry {
        "Has Laundry"
    } else {
        "No Laundry"
    }
}

impl fmt::Display for QTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pos in EnvIter::new(self.room_size()) {
            for &has_laundry in [false, true].iter() {
                let state = State {
                    row: pos.row,
                    col: pos.col,
                    has_laundry,
                };
                write!(f, "({}, {}, {})", pos.row, pos.col, laundry_label(has_laundry))?;
                for action in Action::ALL.iter() {
                    write!(f, " {}: {}", action, self.get(state, *action))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// The greedy policy derived from a [`QTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct BestActions {
    actions: Array3<Action>,
}

impl BestActions {
    pub fn get(&self, state: State) -> Action {
        self.actions[[state.row, state.col, state.has_laundry as usize]]
    }
}

impl fmt::Display for BestActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.actions.shape()[0];
        for &has_laundry in [false, true].iter() {
            writeln!(f, "{}", laundry_label(has_laundry))?;
            for row in 0..size {
                for col in 0..size {
                    let action = self.actions[[row, col, has_laundry as usize]];
                    write!(f, "{} ", action.symbol())?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
