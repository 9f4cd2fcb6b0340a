//! Core domain types: marks, board shapes, positions, cells and the board.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Cells per axis. Both shapes are three wide.
pub const SIDE: u8 = 3;

/// One of the two player symbols.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Mark {
    /// Mark X (always moves first).
    X,
    /// Mark O.
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// Board geometry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Shape {
    /// Flat 3x3 grid.
    #[strum(to_string = "compact", serialize = "square", serialize = "2d")]
    Compact,
    /// 3x3x3 volume.
    #[strum(to_string = "volumetric", serialize = "cube", serialize = "3d")]
    Volumetric,
}

impl Shape {
    /// Number of axes (2 or 3).
    pub fn dimensions(self) -> usize {
        match self {
            Shape::Compact => 2,
            Shape::Volumetric => 3,
        }
    }

    /// Number of layers along the third axis.
    pub fn layers(self) -> u8 {
        match self {
            Shape::Compact => 1,
            Shape::Volumetric => SIDE,
        }
    }

    /// Total number of cells.
    pub fn cell_count(self) -> usize {
        usize::from(SIDE) * usize::from(SIDE) * usize::from(self.layers())
    }

    /// Returns true if the position lies on a board of this shape.
    pub fn contains(self, position: Position) -> bool {
        position.row < SIDE && position.col < SIDE && position.layer < self.layers()
    }

    /// Flat index of a position, layer-major then row-major.
    pub fn index_of(self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let side = usize::from(SIDE);
        Some(
            (usize::from(position.layer) * side + usize::from(position.row)) * side
                + usize::from(position.col),
        )
    }

    /// Inverse of [`Shape::index_of`].
    pub fn position_at(self, index: usize) -> Option<Position> {
        if index >= self.cell_count() {
            return None;
        }
        let side = usize::from(SIDE);
        // Each component is < SIDE, so the narrowing casts are lossless.
        Some(Position::at(
            ((index / side) % side) as u8,
            (index % side) as u8,
            (index / (side * side)) as u8,
        ))
    }

    /// Every position of this shape in index order.
    pub fn positions(self) -> impl Iterator<Item = Position> {
        (0..self.cell_count()).filter_map(move |i| self.position_at(i))
    }

    /// The central cell.
    pub fn center(self) -> Position {
        match self {
            Shape::Compact => Position::new(1, 1),
            Shape::Volumetric => Position::at(1, 1, 1),
        }
    }
}

/// A cell coordinate. The compact shape only uses `layer == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row, 0-2.
    pub row: u8,
    /// Column, 0-2.
    pub col: u8,
    /// Depth layer, 0-2 (always 0 on the compact board).
    #[serde(default)]
    pub layer: u8,
}

impl Position {
    /// Creates a position on the compact board.
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col, layer: 0 }
    }

    /// Creates a position with an explicit layer.
    pub const fn at(row: u8, col: u8, layer: u8) -> Self {
        Self { row, col, layer }
    }

    /// Moves `steps` times along `direction`, or `None` when a coordinate would go negative.
    pub(crate) fn offset(self, direction: [i8; 3], steps: i8) -> Option<Self> {
        let step = |value: u8, delta: i8| -> Option<u8> {
            let moved = i16::from(value) + i16::from(delta) * i16::from(steps);
            u8::try_from(moved).ok()
        };
        Some(Self::at(
            step(self.row, direction[0])?,
            step(self.col, direction[1])?,
            step(self.layer, direction[2])?,
        ))
    }

    /// Parses `"row col"` or `"row col layer"` (whitespace or comma separated).
    #[instrument]
    pub fn parse(input: &str) -> Option<Self> {
        let parts: Vec<u8> = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [row, col] => Some(Self::new(*row, *col)),
            [row, col, layer] => Some(Self::at(*row, *col, *layer)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.row, self.col, self.layer)
    }
}

/// Display-only metadata for a cell. Never read by game logic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellHints {
    /// The cell is flashing ahead of its fade.
    pub blinking: bool,
    /// Fade-out progress, 0.0 (opaque) to 1.0 (gone).
    pub fade: f32,
}

/// A board cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    occupant: Option<Mark>,
    sequence: u64,
    hints: CellHints,
}

impl Cell {
    /// The mark occupying this cell, if any.
    pub fn occupant(&self) -> Option<Mark> {
        self.occupant
    }

    /// Placement sequence number of the occupant, 0 when empty.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Presentation hints.
    pub fn hints(&self) -> CellHints {
        self.hints
    }

    /// Returns true if no mark occupies this cell.
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Fixed-size grid of cells for one [`Shape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    shape: Shape,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            cells: vec![Cell::default(); shape.cell_count()],
        }
    }

    /// Board geometry.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Gets the cell at a position.
    pub fn get(&self, position: Position) -> Option<&Cell> {
        self.shape
            .index_of(position)
            .and_then(|index| self.cells.get(index))
    }

    /// Gets the mark at a position.
    pub fn occupant(&self, position: Position) -> Option<Mark> {
        self.get(position).and_then(Cell::occupant)
    }

    /// Returns true if the position is on the board and unoccupied.
    pub fn is_empty(&self, position: Position) -> bool {
        self.get(position).is_some_and(Cell::is_empty)
    }

    /// All cells paired with their positions.
    pub fn cells(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.shape.positions().zip(self.cells.iter())
    }

    /// Unoccupied positions in index order.
    pub fn empty_positions(&self) -> Vec<Position> {
        self.cells()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(position, _)| position)
            .collect()
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }

    /// Replaces the presentation hints of a cell.
    pub fn set_hints(&mut self, position: Position, hints: CellHints) {
        if let Some(cell) = self.cell_mut(position) {
            cell.hints = hints;
        }
    }

    pub(crate) fn occupy(&mut self, position: Position, mark: Mark, sequence: u64) {
        if let Some(cell) = self.cell_mut(position) {
            *cell = Cell {
                occupant: Some(mark),
                sequence,
                hints: CellHints::default(),
            };
        }
    }

    pub(crate) fn vacate(&mut self, position: Position) {
        if let Some(cell) = self.cell_mut(position) {
            *cell = Cell::default();
        }
    }

    fn cell_mut(&mut self, position: Position) -> Option<&mut Cell> {
        let index = self.shape.index_of(position)?;
        self.cells.get_mut(index)
    }

    /// Formats the board as text, one 3x3 block per layer.
    pub fn display(&self) -> String {
        let mut layers = Vec::new();
        for layer in 0..self.shape.layers() {
            let mut rows = Vec::new();
            for row in 0..SIDE {
                let symbols: Vec<String> = (0..SIDE)
                    .map(|col| match self.occupant(Position::at(row, col, layer)) {
                        Some(mark) => mark.to_string(),
                        None => ".".to_string(),
                    })
                    .collect();
                rows.push(symbols.join("|"));
            }
            layers.push(rows.join("\n-+-+-\n"));
        }
        layers.join("\n\n")
    }
}
