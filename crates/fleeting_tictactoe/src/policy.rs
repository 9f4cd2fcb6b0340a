//! Heuristic opponent for solo play.

use super::geometry;
use super::state::MatchState;
use super::types::{Mark, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Chance that the easy tier ignores position and picks at random.
const EASY_RANDOM_CHANCE: f64 = 0.7;

/// Chance that the medium tier takes a winning move it has found.
const MEDIUM_TAKE_WIN_CHANCE: f64 = 0.8;

/// Opponent strength.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Mostly random, sometimes positional.
    Easy,
    /// Always blocks, usually wins when it can.
    #[default]
    Medium,
    /// Always wins when it can, then blocks, then positional.
    Hard,
}

/// Chooses moves for the computer-controlled mark.
pub trait OpponentPolicy: Send {
    /// Picks an empty position for `me`, or `None` when the board has no empty cell.
    fn select_move(&mut self, state: &MatchState, me: Mark, difficulty: Difficulty)
    -> Option<Position>;

    /// Display name.
    fn name(&self) -> &str;
}

/// Depth-1 lookahead with a center > corner > edge preference.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    rng: StdRng,
}

impl HeuristicPolicy {
    /// Creates a policy seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a policy with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn random_empty(&mut self, empty: &[Position]) -> Option<Position> {
        if empty.is_empty() {
            return None;
        }
        Some(empty[self.rng.random_range(0..empty.len())])
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl OpponentPolicy for HeuristicPolicy {
    #[instrument(skip(self, state), fields(turn = %state.turn()))]
    fn select_move(
        &mut self,
        state: &MatchState,
        me: Mark,
        difficulty: Difficulty,
    ) -> Option<Position> {
        let empty = state.empty_positions();
        if empty.is_empty() {
            return None;
        }
        let opponent = me.opponent();

        let choice = match difficulty {
            Difficulty::Easy => {
                if self.rng.random_bool(EASY_RANDOM_CHANCE) {
                    self.random_empty(&empty)
                } else {
                    positional_move(state)
                }
            }
            Difficulty::Medium => winning_move(state, opponent)
                .or_else(|| {
                    winning_move(state, me)
                        .filter(|_| self.rng.random_bool(MEDIUM_TAKE_WIN_CHANCE))
                })
                .or_else(|| positional_move(state)),
            Difficulty::Hard => winning_move(state, me)
                .or_else(|| winning_move(state, opponent))
                .or_else(|| positional_move(state)),
        };

        debug!(%difficulty, mark = %me, choice = ?choice, "Opponent chose move");
        choice.or_else(|| self.random_empty(&empty))
    }

    fn name(&self) -> &str {
        "Heuristic"
    }
}

/// First empty position where `mark` would complete a line, eviction included.
pub fn winning_move(state: &MatchState, mark: Mark) -> Option<Position> {
    state
        .empty_positions()
        .into_iter()
        .find(|position| state.would_win(*position, mark))
}

/// Empty position crossed by the most lines; ties go to the lowest index.
pub fn positional_move(state: &MatchState) -> Option<Position> {
    let shape = state.ruleset().shape();
    state
        .empty_positions()
        .into_iter()
        .map(|position| (geometry::lines_through(shape, position), position))
        .fold(None, |best: Option<(usize, Position)>, candidate| match best {
            Some(current) if current.0 >= candidate.0 => Some(current),
            _ => Some(candidate),
        })
        .map(|(_, position)| position)
}
