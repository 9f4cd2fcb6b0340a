//! Placement errors.

use super::types::{Mark, Position};

/// A rejected placement. Never mutates the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// The position is not on this board.
    #[display("Position {} is off the board", _0)]
    OutOfBounds(#[error(not(source))] Position),

    /// The cell already holds a piece.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(#[error(not(source))] Position),

    /// The match has a winner and awaits a reset.
    #[display("Match is over")]
    MatchEnded,

    /// The mark is not on turn.
    #[display("It's not {}'s turn", _0)]
    WrongTurn(#[error(not(source))] Mark),
}
