//! Terminal front end for solo matches.

use fleeting_tictactoe::{
    Cue, Difficulty, HeuristicPolicy, Mark, MatchObserver, MatchView, Phase, Position, Ruleset,
    Shape, SoloMatch,
};
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{instrument, warn};

/// Settings for one terminal session.
#[derive(Debug, Clone)]
pub struct SoloOptions {
    /// Board shape.
    pub shape: Shape,
    /// Opponent strength.
    pub difficulty: Difficulty,
    /// Capacity override.
    pub capacity: Option<usize>,
    /// Opponent seed.
    pub seed: Option<u64>,
    /// Whether the human plays O.
    pub second: bool,
}

/// A line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Move(Position),
    Reset,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_ascii_lowercase().as_str() {
        "reset" | "r" => Input::Reset,
        "quit" | "q" | "exit" => Input::Quit,
        other => Position::parse(other).map_or(Input::Unknown, Input::Move),
    }
}

/// Prints the board after every placement.
struct TextObserver<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TextObserver<W> {
    fn write_view(&mut self, view: &MatchView) -> io::Result<()> {
        writeln!(self.out, "\n{}\n", view.board.display())?;
        writeln!(self.out, "Score  X: {}  O: {}", view.scores.x, view.scores.o)?;
        match (view.phase, view.winner) {
            (Phase::Ended, Some(winner)) => writeln!(self.out, "{} wins!", winner),
            _ => writeln!(self.out, "{} to move", view.turn),
        }
    }
}

impl<W: Write + Send> MatchObserver for TextObserver<W> {
    fn redraw(&mut self, view: &MatchView) {
        if let Err(e) = self.write_view(view) {
            warn!(error = %e, "Failed to draw board");
        }
    }

    fn cue(&mut self, cue: Cue) {
        let text = match cue {
            Cue::Placed => "*click*",
            Cue::Won => "*fanfare*",
        };
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!(error = %e, "Failed to play cue");
        }
    }
}

fn build_match<W: Write + Send + 'static>(options: &SoloOptions, out: W) -> SoloMatch {
    let ruleset = match options.capacity {
        Some(capacity) => Ruleset::for_shape(options.shape).with_capacity(capacity),
        None => Ruleset::for_shape(options.shape),
    };
    let policy = match options.seed {
        Some(seed) => HeuristicPolicy::seeded(seed),
        None => HeuristicPolicy::new(),
    };
    let human = if options.second { Mark::O } else { Mark::X };
    SoloMatch::new(ruleset, human, options.difficulty, Box::new(policy))
        .with_observer(Box::new(TextObserver { out }))
}

/// Runs the read-move-reply loop until `quit` or end of input.
#[instrument]
pub fn run(options: SoloOptions) -> anyhow::Result<()> {
    let mut game = build_match(&options, io::stdout());
    let mut out = io::stdout();

    writeln!(
        out,
        "Fleeting tic-tac-toe ({}, capacity {}, {} opponent). You are {}.",
        game.state().ruleset().shape(),
        game.state().ruleset().capacity(),
        game.difficulty(),
        game.human()
    )?;
    writeln!(out, "Enter moves as `row col` or `row col layer`; `reset` or `quit`.")?;
    game.opening_move();

    for line in io::stdin().lock().lines() {
        let line = line?;
        match parse_input(&line) {
            Input::Quit => break,
            Input::Reset => {
                game.rematch();
                game.opening_move();
            }
            Input::Unknown => writeln!(out, "Could not read {:?}", line.trim())?,
            Input::Move(position) => match game.play(position) {
                Ok(turn) => {
                    if let Some((reply, _)) = turn.reply {
                        writeln!(out, "Opponent played {}", reply)?;
                    }
                    for ghost in game.fades().ghosts(Instant::now()) {
                        writeln!(out, "Fading: {} at {}", ghost.mark, ghost.position)?;
                    }
                    if !game.state().is_playing() {
                        writeln!(out, "Type `reset` for a rematch.")?;
                    }
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
        }
    }

    let scores = game.state().scores();
    writeln!(out, "Final score  X: {}  O: {}", scores.x, scores.o)?;
    Ok(())
}
