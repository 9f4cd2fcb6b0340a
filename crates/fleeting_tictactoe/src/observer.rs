//! Hooks for renderers and audio cues.

use super::state::{MatchState, MatchView, PlaceOutcome};

/// Feedback kinds fired after a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cue {
    /// A piece landed and play continues.
    Placed,
    /// A piece landed and completed a line.
    Won,
}

/// Receives state after every successful placement.
pub trait MatchObserver: Send {
    /// Redraws from a fresh snapshot.
    fn redraw(&mut self, view: &MatchView);

    /// Plays a cue.
    fn cue(&mut self, cue: Cue);
}

/// Sends the redraw and the matching cue for one placement.
pub fn notify(observer: &mut dyn MatchObserver, state: &MatchState, outcome: &PlaceOutcome) {
    observer.redraw(&state.view());
    observer.cue(if outcome.is_win() { Cue::Won } else { Cue::Placed });
}
