//! The match state machine.
//!
//! A match moves `Playing -> Ended` on a winning placement and back to
//! `Playing` only through [`MatchState::reset`]. Every placement appends to a
//! FIFO queue; once the queue exceeds the ruleset capacity the oldest piece is
//! removed before the board is checked for a winner.

use super::error::MoveError;
use super::geometry;
use super::ruleset::Ruleset;
use super::types::{Board, Mark, Position};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

/// Match phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Accepting placements.
    Playing,
    /// A line was completed; waiting for a reset.
    Ended,
}

/// A live piece in the placement queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Where the piece sits.
    pub position: Position,
    /// Who placed it.
    pub mark: Mark,
    /// Monotonic placement number, starting at 1 each match.
    pub sequence: u64,
}

/// Win tally across matches. Draws do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    /// Wins for X.
    pub x: u32,
    /// Wins for O.
    pub o: u32,
}

impl Scores {
    /// Wins recorded for a mark.
    pub fn get(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    fn record_win(&mut self, mark: Mark) {
        match mark {
            Mark::X => self.x += 1,
            Mark::O => self.o += 1,
        }
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOutcome {
    /// Board after placement, eviction and win detection.
    pub board: Board,
    /// The piece removed to stay within capacity, if any.
    pub evicted: Option<Placement>,
    /// The winner, if this placement completed a line.
    pub winner: Option<Mark>,
}

impl PlaceOutcome {
    /// Returns true if the placement won the match.
    pub fn is_win(&self) -> bool {
        self.winner.is_some()
    }
}

/// Read-only projection handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchView {
    /// Board snapshot.
    pub board: Board,
    /// Mark on turn.
    pub turn: Mark,
    /// Winner, once ended.
    pub winner: Option<Mark>,
    /// Current phase.
    pub phase: Phase,
    /// Running tally.
    pub scores: Scores,
}

/// Authoritative state of one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    ruleset: Ruleset,
    board: Board,
    queue: VecDeque<Placement>,
    next_sequence: u64,
    total_placed: u64,
    turn: Mark,
    winner: Option<Mark>,
    phase: Phase,
    scores: Scores,
}

impl MatchState {
    /// Creates a match with X on turn.
    #[instrument]
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            board: Board::new(ruleset.shape()),
            queue: VecDeque::with_capacity(ruleset.capacity() + 1),
            next_sequence: 1,
            total_placed: 0,
            turn: Mark::X,
            winner: None,
            phase: Phase::Playing,
            scores: Scores::default(),
        }
    }

    /// The rules this match was created with.
    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Live pieces, oldest first.
    pub fn queue(&self) -> &VecDeque<Placement> {
        &self.queue
    }

    /// Mark on turn.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// Winner, once the match has ended.
    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Running win tally.
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Pieces placed this match, including evicted ones.
    pub fn total_placed(&self) -> u64 {
        self.total_placed
    }

    /// Sequence number the next placement will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Returns true while placements are accepted.
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Unoccupied positions in index order.
    pub fn empty_positions(&self) -> Vec<Position> {
        self.board.empty_positions()
    }

    /// Snapshot for renderers.
    pub fn view(&self) -> MatchView {
        MatchView {
            board: self.board.clone(),
            turn: self.turn,
            winner: self.winner,
            phase: self.phase,
            scores: self.scores,
        }
    }

    /// Places a piece for `by`.
    ///
    /// Evicts the oldest piece when the queue overflows, then checks every
    /// line. A win ends the match and bumps the score; otherwise the turn
    /// passes to the other mark.
    #[instrument(skip(self), fields(shape = %self.ruleset.shape(), turn = %self.turn))]
    pub fn place(&mut self, position: Position, by: Mark) -> Result<PlaceOutcome, MoveError> {
        self.validate(position, by).inspect_err(|e| {
            warn!(%position, mark = %by, error = %e, "Placement rejected");
        })?;

        let evicted = self.apply(position, by);
        if let Some(old) = evicted {
            debug!(position = %old.position, mark = %old.mark, sequence = old.sequence, "Evicted oldest piece");
        }

        let winner = geometry::winner(&self.board);
        match winner {
            Some(mark) => {
                self.phase = Phase::Ended;
                self.winner = Some(mark);
                self.scores.record_win(mark);
                info!(winner = %mark, x = self.scores.x, o = self.scores.o, "Match won");
            }
            None => self.turn = by.opponent(),
        }

        #[cfg(debug_assertions)]
        self.check_invariants();

        Ok(PlaceOutcome {
            board: self.board.clone(),
            evicted,
            winner,
        })
    }

    /// Places a piece for whichever mark is on turn.
    pub fn place_current(&mut self, position: Position) -> Result<PlaceOutcome, MoveError> {
        self.place(position, self.turn)
    }

    /// Returns true if `mark` placing at `position` would complete a line,
    /// taking into account the eviction that placement would trigger.
    ///
    /// Ignores whose turn it is.
    pub fn would_win(&self, position: Position, mark: Mark) -> bool {
        if !self.is_playing() || !self.board.is_empty(position) {
            return false;
        }
        let mut trial = self.clone();
        trial.apply(position, mark);
        geometry::winner(&trial.board) == Some(mark)
    }

    /// Clears the board for a new match. Scores are kept.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        debug!("Resetting match");
        *self = Self {
            scores: self.scores,
            ..Self::new(self.ruleset)
        };
    }

    fn validate(&self, position: Position, by: Mark) -> Result<(), MoveError> {
        if self.phase != Phase::Playing {
            return Err(MoveError::MatchEnded);
        }
        if !self.ruleset.shape().contains(position) {
            return Err(MoveError::OutOfBounds(position));
        }
        if !self.board.is_empty(position) {
            return Err(MoveError::CellOccupied(position));
        }
        if by != self.turn {
            return Err(MoveError::WrongTurn(by));
        }
        Ok(())
    }

    /// Occupies the cell, enqueues it and evicts past capacity. No checks.
    fn apply(&mut self, position: Position, mark: Mark) -> Option<Placement> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.total_placed += 1;
        self.board.occupy(position, mark, sequence);
        self.queue.push_back(Placement {
            position,
            mark,
            sequence,
        });

        if self.queue.len() > self.ruleset.capacity() {
            let oldest = self.queue.pop_front()?;
            self.board.vacate(oldest.position);
            Some(oldest)
        } else {
            None
        }
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        use super::invariants::{InvariantSet, PlacementInvariants};

        if let Err(violations) = PlacementInvariants::check_all(self) {
            for violation in &violations {
                warn!(violation = %violation.description, "Invariant violated");
            }
            debug_assert!(violations.is_empty(), "placement invariants violated");
        }
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(state: &mut MatchState, moves: &[(u8, u8)]) -> Option<PlaceOutcome> {
        let mut last = None;
        for &(row, col) in moves {
            last = Some(
                state
                    .place_current(Position::new(row, col))
                    .expect("legal move"),
            );
        }
        last
    }

    #[test]
    fn test_row_win_with_capacity_five() {
        let mut state = MatchState::new(Ruleset::compact().with_capacity(5));
        let outcome = play(&mut state, &[(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)])
            .expect("moves played");

        assert_eq!(outcome.winner, Some(Mark::X));
        assert_eq!(state.phase(), Phase::Ended);
        assert_eq!(state.winner(), Some(Mark::X));
        assert_eq!(state.scores().get(Mark::X), 1);
        assert_eq!(state.scores().get(Mark::O), 0);
    }

    #[test]
    fn test_sixth_piece_evicts_oldest() {
        let mut state = MatchState::new(Ruleset::compact().with_capacity(5));
        play(&mut state, &[(0, 0), (1, 1), (0, 1), (2, 2), (2, 0)]);
        assert_eq!(state.queue().len(), 5);

        let outcome = play(&mut state, &[(1, 0)]).expect("move played");

        assert!(state.board().is_empty(Position::new(0, 0)));
        assert_eq!(state.queue().len(), 5);
        assert_eq!(
            outcome.evicted.map(|p| (p.position, p.mark, p.sequence)),
            Some((Position::new(0, 0), Mark::X, 1))
        );
    }

    #[test]
    fn test_evicted_piece_cannot_complete_own_line() {
        let mut state = MatchState::new(Ruleset::compact());
        // X: (0,0) #1, (0,1) #3, (2,2) #5; O: (1,0) #2, (2,0) #4, (2,1) #6
        play(&mut state, &[(0, 0), (1, 0), (0, 1), (2, 0), (2, 2), (2, 1)]);
        assert_eq!(state.queue().len(), 6);

        // Row 0 would be complete, but (0,0) leaves the board on this move.
        let outcome = play(&mut state, &[(0, 2)]).expect("move played");
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.evicted.map(|p| p.position), Some(Position::new(0, 0)));
        assert_eq!(state.phase(), Phase::Playing);
        assert_eq!(state.turn(), Mark::O);
    }

    #[test]
    fn test_win_survives_eviction_elsewhere() {
        let mut state = MatchState::new(Ruleset::compact());
        // X: (1,0) #1, (0,0) #3, (1,1) #5; O: (0,2) #2, (2,1) #4, (0,1) #6
        play(&mut state, &[(1, 0), (0, 2), (0, 0), (2, 1), (1, 1), (0, 1)]);

        let outcome = play(&mut state, &[(2, 2)]).expect("move played");
        assert_eq!(outcome.evicted.map(|p| p.position), Some(Position::new(1, 0)));
        assert_eq!(outcome.winner, Some(Mark::X));
        assert_eq!(state.phase(), Phase::Ended);
    }

    #[test]
    fn test_rejections_do_not_mutate() {
        let mut state = MatchState::new(Ruleset::compact());
        play(&mut state, &[(1, 1)]);
        let before = state.clone();

        assert_eq!(
            state.place(Position::new(1, 1), Mark::O),
            Err(MoveError::CellOccupied(Position::new(1, 1)))
        );
        assert_eq!(
            state.place(Position::new(3, 0), Mark::O),
            Err(MoveError::OutOfBounds(Position::new(3, 0)))
        );
        assert_eq!(
            state.place(Position::at(0, 0, 1), Mark::O),
            Err(MoveError::OutOfBounds(Position::at(0, 0, 1)))
        );
        assert_eq!(
            state.place(Position::new(0, 0), Mark::X),
            Err(MoveError::WrongTurn(Mark::X))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_ended_match_refuses_placements() {
        let mut state = MatchState::new(Ruleset::compact());
        play(&mut state, &[(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)]);
        assert_eq!(
            state.place_current(Position::new(2, 0)),
            Err(MoveError::MatchEnded)
        );
    }

    #[test]
    fn test_reset_keeps_scores_and_is_idempotent() {
        let mut state = MatchState::new(Ruleset::compact());
        play(&mut state, &[(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)]);

        state.reset();
        let once = state.clone();
        state.reset();

        assert_eq!(state, once);
        assert_eq!(state.phase(), Phase::Playing);
        assert_eq!(state.turn(), Mark::X);
        assert_eq!(state.winner(), None);
        assert!(state.queue().is_empty());
        assert_eq!(state.next_sequence(), 1);
        assert_eq!(state.board().occupied_count(), 0);
        assert_eq!(state.scores().get(Mark::X), 1);
    }

    #[test]
    fn test_would_win_accounts_for_eviction() {
        let mut state = MatchState::new(Ruleset::compact());
        play(&mut state, &[(0, 0), (1, 0), (0, 1), (2, 0), (2, 2), (2, 1)]);
        let before = state.clone();

        assert!(!state.would_win(Position::new(0, 2), Mark::X));
        assert_eq!(state, before);
    }

    #[test]
    fn test_would_win_detects_open_line() {
        let mut state = MatchState::new(Ruleset::compact());
        play(&mut state, &[(0, 0), (1, 1), (0, 1)]);
        assert!(state.would_win(Position::new(0, 2), Mark::X));
        assert!(!state.would_win(Position::new(0, 2), Mark::O));
        assert!(!state.would_win(Position::new(0, 0), Mark::X));
    }

    #[test]
    fn test_volumetric_space_diagonal() {
        let mut state = MatchState::new(Ruleset::volumetric());
        for (position, mark) in [
            (Position::at(0, 0, 0), Mark::X),
            (Position::at(0, 0, 1), Mark::O),
            (Position::at(1, 1, 1), Mark::X),
            (Position::at(0, 0, 2), Mark::O),
        ] {
            state.place(position, mark).expect("legal move");
        }
        let outcome = state
            .place(Position::at(2, 2, 2), Mark::X)
            .expect("legal move");
        assert_eq!(outcome.winner, Some(Mark::X));
    }

    #[test]
    fn test_view_serializes_for_renderers() {
        let mut state = MatchState::new(Ruleset::compact());
        play(&mut state, &[(1, 1)]);
        let json = serde_json::to_value(state.view()).expect("serializes");
        assert_eq!(json["turn"], "O");
        assert_eq!(json["phase"], "playing");
        assert_eq!(json["scores"], serde_json::json!({"x": 0, "o": 0}));
    }
}
