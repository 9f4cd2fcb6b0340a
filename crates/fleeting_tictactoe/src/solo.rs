//! Single-player matches against an [`OpponentPolicy`].

use super::error::MoveError;
use super::fade::FadeTracker;
use super::observer::{self, MatchObserver};
use super::policy::{Difficulty, OpponentPolicy};
use super::ruleset::Ruleset;
use super::state::{MatchState, PlaceOutcome};
use super::types::{Mark, Position};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// What happened on one human turn.
#[derive(Debug, Clone, PartialEq)]
pub struct SoloTurn {
    /// The human placement.
    pub human: PlaceOutcome,
    /// The opponent's reply and where it went, unless the human won.
    pub reply: Option<(Position, PlaceOutcome)>,
}

/// A local match between a human and a policy-driven opponent.
pub struct SoloMatch {
    state: MatchState,
    human: Mark,
    difficulty: Difficulty,
    policy: Box<dyn OpponentPolicy>,
    observer: Option<Box<dyn MatchObserver>>,
    fades: FadeTracker,
}

impl std::fmt::Debug for SoloMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoloMatch")
            .field("state", &self.state)
            .field("human", &self.human)
            .field("difficulty", &self.difficulty)
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}

impl SoloMatch {
    /// Creates a match; the human plays `human`.
    #[instrument(skip(policy))]
    pub fn new(
        ruleset: Ruleset,
        human: Mark,
        difficulty: Difficulty,
        policy: Box<dyn OpponentPolicy>,
    ) -> Self {
        info!(policy = policy.name(), "Starting solo match");
        Self {
            state: MatchState::new(ruleset),
            human,
            difficulty,
            policy,
            observer: None,
            fades: FadeTracker::default(),
        }
    }

    /// Attaches a renderer/cue sink.
    pub fn with_observer(mut self, observer: Box<dyn MatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The underlying match.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// The human's mark.
    pub fn human(&self) -> Mark {
        self.human
    }

    /// Opponent strength.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Fade animations for recently evicted pieces.
    pub fn fades(&self) -> &FadeTracker {
        &self.fades
    }

    /// Lets the opponent move when it holds the first mark.
    ///
    /// Returns `None` when it is not the opponent's turn.
    #[instrument(skip(self))]
    pub fn opening_move(&mut self) -> Option<(Position, PlaceOutcome)> {
        if self.state.turn() == self.human || !self.state.is_playing() {
            return None;
        }
        self.opponent_reply()
    }

    /// Plays the human move and, if the match continues, the opponent's reply.
    #[instrument(skip(self), fields(human = %self.human))]
    pub fn play(&mut self, position: Position) -> Result<SoloTurn, MoveError> {
        let human = self.place(position, self.human)?;
        let reply = if self.state.is_playing() {
            self.opponent_reply()
        } else {
            None
        };
        Ok(SoloTurn { human, reply })
    }

    /// Starts the next match. Scores carry over.
    #[instrument(skip(self))]
    pub fn rematch(&mut self) {
        self.state.reset();
        self.fades.clear();
        if let Some(sink) = self.observer.as_mut() {
            sink.redraw(&self.state.view());
        }
    }

    fn opponent_reply(&mut self) -> Option<(Position, PlaceOutcome)> {
        let me = self.human.opponent();
        let position = self
            .policy
            .select_move(&self.state, me, self.difficulty)?;
        debug!(%position, "Opponent replies");
        match self.place(position, me) {
            Ok(outcome) => Some((position, outcome)),
            Err(e) => {
                warn!(%position, error = %e, "Opponent chose an illegal move");
                None
            }
        }
    }

    fn place(&mut self, position: Position, mark: Mark) -> Result<PlaceOutcome, MoveError> {
        let outcome = self.state.place(position, mark)?;
        let now = Instant::now();
        self.fades.cancel(position);
        if let Some(evicted) = outcome.evicted {
            self.fades.schedule(evicted, now);
        }
        self.fades.prune(now);
        if let Some(sink) = self.observer.as_mut() {
            observer::notify(sink.as_mut(), &self.state, &outcome);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::Recorder;
    use crate::observer::Cue;
    use crate::{HeuristicPolicy, Phase};

    fn solo(human: Mark) -> SoloMatch {
        SoloMatch::new(
            Ruleset::compact(),
            human,
            Difficulty::Hard,
            Box::new(HeuristicPolicy::seeded(3)),
        )
    }

    #[test]
    fn test_opponent_replies_after_human() {
        let mut game = solo(Mark::X);
        let turn = game.play(Position::new(0, 0)).expect("legal move");

        let (reply, _) = turn.reply.expect("opponent replied");
        assert_eq!(reply, Position::new(1, 1));
        assert_eq!(game.state().turn(), Mark::X);
        assert_eq!(game.state().queue().len(), 2);
    }

    #[test]
    fn test_opponent_opens_when_human_plays_o() {
        let mut game = solo(Mark::O);
        let (position, _) = game.opening_move().expect("opponent opens");
        assert_eq!(position, Position::new(1, 1));
        assert!(game.opening_move().is_none());
    }

    #[test]
    fn test_invalid_human_move_is_rejected() {
        let mut game = solo(Mark::X);
        game.play(Position::new(0, 0)).expect("legal move");
        assert_eq!(
            game.play(Position::new(1, 1)),
            Err(MoveError::CellOccupied(Position::new(1, 1)))
        );
    }

    #[test]
    fn test_observer_sees_every_placement() {
        let recorder = Recorder::default();
        let mut game = solo(Mark::X).with_observer(Box::new(recorder.clone()));
        game.play(Position::new(0, 0)).expect("legal move");

        assert_eq!(recorder.views.lock().expect("lock").len(), 2);
        assert_eq!(
            *recorder.cues.lock().expect("lock"),
            vec![Cue::Placed, Cue::Placed]
        );
    }

    #[test]
    fn test_hard_opponent_beats_passive_human() {
        let mut game = solo(Mark::X);
        for _ in 0..30 {
            if !game.state().is_playing() {
                break;
            }
            let Some(&position) = game.state().empty_positions().last() else {
                break;
            };
            game.play(position).expect("legal move");
        }
        assert_eq!(game.state().phase(), Phase::Ended);
        assert_eq!(game.state().winner(), Some(Mark::O));

        game.rematch();
        assert!(game.state().is_playing());
        assert_eq!(game.state().scores().get(Mark::O), 1);
    }
}
