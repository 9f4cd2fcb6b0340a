//! Fleeting tic-tac-toe game logic.
//!
//! Tic-tac-toe on a 3x3 board or a 3x3x3 volume where the board never fills:
//! once the number of live pieces exceeds the ruleset capacity, the oldest
//! piece is evicted.
//!
//! # Architecture
//!
//! - **Geometry**: every winning line for a shape (8 flat, 49 volumetric)
//! - **MatchState**: placement, eviction, win detection, turn order, scores
//! - **Policy**: depth-1 heuristic opponent for solo play
//! - **Fade**: presentation-only timers for evicted pieces
//!
//! # Example
//!
//! ```
//! use fleeting_tictactoe::{MatchState, Mark, Phase, Position, Ruleset};
//!
//! let mut state = MatchState::new(Ruleset::compact());
//! for (row, col) in [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)] {
//!     state.place_current(Position::new(row, col)).unwrap();
//! }
//! assert_eq!(state.winner(), Some(Mark::X));
//! assert_eq!(state.phase(), Phase::Ended);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod fade;
pub mod geometry;
pub mod invariants;
mod observer;
mod policy;
mod ruleset;
mod solo;
mod state;
mod types;

pub use error::MoveError;
pub use fade::{BLINK_DURATION, FADE_DURATION, FadeTracker, Ghost};
pub use geometry::Line;
pub use observer::{Cue, MatchObserver, notify};
pub use policy::{Difficulty, HeuristicPolicy, OpponentPolicy, positional_move, winning_move};
pub use ruleset::{COMPACT_CAPACITY, Ruleset, VOLUMETRIC_CAPACITY};
pub use solo::{SoloMatch, SoloTurn};
pub use state::{MatchState, MatchView, Phase, PlaceOutcome, Placement, Scores};
pub use types::{Board, Cell, CellHints, Mark, Position, SIDE, Shape};
