//! Winning-line geometry.
//!
//! Lines are generated from direction vectors rather than listed by hand:
//! every non-zero direction in `{-1, 0, 1}^d` whose first non-zero component
//! is positive, walked from each cell that still has two more cells ahead of
//! it. That yields 8 lines on the compact board and 49 in the volume, each
//! exactly once and always in the same order.

use super::types::{Board, Mark, Position, Shape};
use std::sync::LazyLock;
use tracing::instrument;

/// Three cells that win when uniformly owned, ordered along their direction.
pub type Line = [Position; 3];

static COMPACT_LINES: LazyLock<Vec<Line>> = LazyLock::new(|| build_lines(Shape::Compact));
static VOLUMETRIC_LINES: LazyLock<Vec<Line>> = LazyLock::new(|| build_lines(Shape::Volumetric));

/// All winning lines for a shape.
pub fn lines(shape: Shape) -> &'static [Line] {
    match shape {
        Shape::Compact => &COMPACT_LINES,
        Shape::Volumetric => &VOLUMETRIC_LINES,
    }
}

/// Returns the owning mark if every cell on the line holds it.
pub fn evaluate(board: &Board, line: &Line) -> Option<Mark> {
    let [a, b, c] = *line;
    let mark = board.occupant(a)?;
    (board.occupant(b) == Some(mark) && board.occupant(c) == Some(mark)).then_some(mark)
}

/// Returns the mark owning the first complete line, if any.
#[instrument(skip(board), fields(shape = %board.shape()))]
pub fn winner(board: &Board) -> Option<Mark> {
    lines(board.shape())
        .iter()
        .find_map(|line| evaluate(board, line))
}

/// Number of winning lines passing through a cell.
pub fn lines_through(shape: Shape, position: Position) -> usize {
    lines(shape)
        .iter()
        .filter(|line| line.contains(&position))
        .count()
}

fn directions(shape: Shape) -> Vec<[i8; 3]> {
    let depth: &[i8] = match shape {
        Shape::Compact => &[0],
        Shape::Volumetric => &[-1, 0, 1],
    };
    let mut directions = Vec::new();
    for dr in [-1i8, 0, 1] {
        for dc in [-1i8, 0, 1] {
            for &dl in depth {
                let direction = [dr, dc, dl];
                let leading = direction.iter().copied().find(|d| *d != 0);
                if leading.is_some_and(|d| d > 0) {
                    directions.push(direction);
                }
            }
        }
    }
    directions
}

fn build_lines(shape: Shape) -> Vec<Line> {
    let mut lines = Vec::new();
    for direction in directions(shape) {
        for start in shape.positions() {
            let walk = [0, 1, 2].map(|steps| {
                start
                    .offset(direction, steps)
                    .filter(|p| shape.contains(*p))
            });
            if let [Some(a), Some(b), Some(c)] = walk {
                lines.push([a, b, c]);
            }
        }
    }
    lines
}
