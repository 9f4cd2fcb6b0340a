//! First-class invariants for the placement queue.
//!
//! These are checked after every placement in debug builds and can be
//! tested independently.

use super::state::MatchState;
use std::collections::HashSet;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S> {
    /// Checks every invariant, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(holds, _)| !holds)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Invariant: the queue never holds more pieces than the capacity.
pub struct WithinCapacityInvariant;

impl Invariant<MatchState> for WithinCapacityInvariant {
    fn holds(state: &MatchState) -> bool {
        state.queue().len() <= state.ruleset().capacity()
    }

    fn description() -> &'static str {
        "Placement queue length is at most the capacity"
    }
}

/// Invariant: queued pieces and occupied cells are the same set.
pub struct QueueMatchesBoardInvariant;

impl Invariant<MatchState> for QueueMatchesBoardInvariant {
    fn holds(state: &MatchState) -> bool {
        let board = state.board();
        let queued: HashSet<_> = state
            .queue()
            .iter()
            .map(|p| (p.position, p.mark, p.sequence))
            .collect();
        let occupied: HashSet<_> = board
            .cells()
            .filter_map(|(position, cell)| {
                cell.occupant()
                    .map(|mark| (position, mark, cell.sequence()))
            })
            .collect();

        queued.len() == state.queue().len() && queued == occupied
    }

    fn description() -> &'static str {
        "Placement queue matches the occupied cells"
    }
}

/// Invariant: the queue is ordered oldest first by sequence number.
pub struct OldestFirstInvariant;

impl Invariant<MatchState> for OldestFirstInvariant {
    fn holds(state: &MatchState) -> bool {
        let queue = state.queue();
        queue
            .iter()
            .zip(queue.iter().skip(1))
            .all(|(a, b)| a.sequence < b.sequence)
    }

    fn description() -> &'static str {
        "Placement queue is in ascending sequence order"
    }
}

/// All placement invariants as a composable set.
pub type PlacementInvariants = (
    WithinCapacityInvariant,
    QueueMatchesBoardInvariant,
    OldestFirstInvariant,
);
