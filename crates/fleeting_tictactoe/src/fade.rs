//! Presentation-only fade-out for evicted pieces.
//!
//! Eviction itself is immediate in [`MatchState`](crate::MatchState). The
//! tracker only remembers where a piece used to be so a renderer can show it
//! blinking and then fading. Nothing here feeds back into game logic.

use super::state::Placement;
use super::types::{Board, CellHints, Mark, Position};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// How long an evicted piece blinks before fading.
pub const BLINK_DURATION: Duration = Duration::from_millis(1500);

/// How long the fade itself takes.
pub const FADE_DURATION: Duration = Duration::from_secs(1);

/// A recently evicted piece still being animated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    /// Where the piece was.
    pub position: Position,
    /// Whose piece it was.
    pub mark: Mark,
    /// Current display hints.
    pub hints: CellHints,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    mark: Mark,
    since: Instant,
}

/// Cancellable per-cell fade timers.
#[derive(Debug, Clone)]
pub struct FadeTracker {
    blink: Duration,
    fade: Duration,
    pending: HashMap<Position, Pending>,
}

impl FadeTracker {
    /// Creates a tracker with custom timings.
    pub fn new(blink: Duration, fade: Duration) -> Self {
        Self {
            blink,
            fade,
            pending: HashMap::new(),
        }
    }

    /// Starts animating an evicted piece.
    #[instrument(skip(self))]
    pub fn schedule(&mut self, evicted: Placement, now: Instant) {
        debug!(position = %evicted.position, "Fade scheduled");
        self.pending.insert(
            evicted.position,
            Pending {
                mark: evicted.mark,
                since: now,
            },
        );
    }

    /// Stops animating a cell, e.g. because a new piece landed there.
    pub fn cancel(&mut self, position: Position) -> bool {
        self.pending.remove(&position).is_some()
    }

    /// Drops every pending animation.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of animations still running at `now`.
    pub fn active(&self, now: Instant) -> usize {
        self.ghosts(now).len()
    }

    /// Ghosts still visible at `now`, in position order.
    pub fn ghosts(&self, now: Instant) -> Vec<Ghost> {
        let mut ghosts: Vec<Ghost> = self
            .pending
            .iter()
            .filter_map(|(position, pending)| {
                self.hints_at(pending.since, now).map(|hints| Ghost {
                    position: *position,
                    mark: pending.mark,
                    hints,
                })
            })
            .collect();
        ghosts.sort_by_key(|ghost| ghost.position);
        ghosts
    }

    /// Forgets animations that have finished by `now`.
    pub fn prune(&mut self, now: Instant) {
        let (blink, fade) = (self.blink, self.fade);
        self.pending
            .retain(|_, pending| now.saturating_duration_since(pending.since) < blink + fade);
    }

    /// Writes hints for visible ghosts onto the empty cells of a snapshot.
    pub fn apply(&self, board: &mut Board, now: Instant) {
        for ghost in self.ghosts(now) {
            if board.is_empty(ghost.position) {
                board.set_hints(ghost.position, ghost.hints);
            }
        }
    }

    fn hints_at(&self, since: Instant, now: Instant) -> Option<CellHints> {
        let elapsed = now.saturating_duration_since(since);
        if elapsed < self.blink {
            return Some(CellHints {
                blinking: true,
                fade: 0.0,
            });
        }
        let fading = elapsed - self.blink;
        if fading >= self.fade {
            return None;
        }
        Some(CellHints {
            blinking: false,
            fade: fading.as_secs_f32() / self.fade.as_secs_f32(),
        })
    }
}

impl Default for FadeTracker {
    fn default() -> Self {
        Self::new(BLINK_DURATION, FADE_DURATION)
    }
}
