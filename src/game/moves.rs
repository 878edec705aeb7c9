//! Moves and full turns.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use super::kind::PieceKind;

/// Board side length.
pub const BOARD_SIDE: u8 = 5;

/// Errors raised when constructing a [`Move`] or [`FullMove`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Row or column outside the 5x5 board.
    #[display("coordinates out of range: ({row}, {col})")]
    OutOfRange {
        /// Offending row.
        row: u8,
        /// Offending column.
        col: u8,
    },
    /// A full turn takes exactly four moves.
    #[display("a full turn takes exactly four moves, got {count}")]
    WrongArity {
        /// Number of moves supplied.
        count: usize,
    },
}

/// The eight compass directions a piece may slide in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// All directions, in the original scan order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// `(row, col)` step for one slide increment.
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::NorthEast => (-1, 1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (1, -1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MoveWire {
    row: u8,
    col: u8,
    kind: PieceKind,
}

/// A single square reference: coordinates plus the kind sitting there (for
/// a destination, the kind being moved there).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MoveWire", into = "MoveWire")]
pub struct Move {
    row: u8,
    col: u8,
    kind: PieceKind,
}

impl Move {
    /// Creates a move, rejecting out-of-range coordinates.
    pub fn new(row: u8, col: u8, kind: PieceKind) -> Result<Self, MoveError> {
        if row >= BOARD_SIDE || col >= BOARD_SIDE {
            return Err(MoveError::OutOfRange { row, col });
        }
        Ok(Move { row, col, kind })
    }

    /// Row on the board (0-4).
    pub fn row(&self) -> u8 {
        self.row
    }

    /// Column on the board (0-4).
    pub fn col(&self) -> u8 {
        self.col
    }

    /// Kind carried by this move.
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Same move with a different kind.
    pub fn with_kind(self, kind: PieceKind) -> Self {
        Move { kind, ..self }
    }
}

impl TryFrom<MoveWire> for Move {
    type Error = MoveError;

    fn try_from(wire: MoveWire) -> Result<Self, Self::Error> {
        Move::new(wire.row, wire.col, wire.kind)
    }
}

impl From<Move> for MoveWire {
    fn from(m: Move) -> Self {
        MoveWire {
            row: m.row,
            col: m.col,
            kind: m.kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FullMoveWire {
    moves: Vec<Move>,
    score: i32,
}

/// A committed full turn: neutron from/to, then own-piece from/to, plus the
/// engine's evaluation of the resulting position (0 for human turns).
///
/// The zero-move value is a reserved sentinel meaning "no legal move
/// available"; it is distinguishable from every real turn via
/// [`FullMove::is_empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FullMoveWire", into = "FullMoveWire")]
pub struct FullMove {
    moves: Vec<Move>,
    score: i32,
}

impl FullMove {
    /// Creates a full turn from exactly four moves (or zero, for the
    /// no-legal-move sentinel).
    pub fn new(moves: Vec<Move>, score: i32) -> Result<Self, MoveError> {
        if !moves.is_empty() && moves.len() != 4 {
            return Err(MoveError::WrongArity { count: moves.len() });
        }
        Ok(FullMove { moves, score })
    }

    /// The "no legal move available" sentinel.
    pub fn empty(score: i32) -> Self {
        FullMove {
            moves: Vec::new(),
            score,
        }
    }

    /// True for the no-legal-move sentinel.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The four moves of a real turn (empty for the sentinel).
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Engine evaluation attached to this turn.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Same turn with a different evaluation.
    pub fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    /// Neutron relocation target (slot 1), absent for the sentinel.
    pub fn neutron_to(&self) -> Option<&Move> {
        self.moves.get(1)
    }
}

impl TryFrom<FullMoveWire> for FullMove {
    type Error = MoveError;

    fn try_from(wire: FullMoveWire) -> Result<Self, Self::Error> {
        FullMove::new(wire.moves, wire.score)
    }
}

impl From<FullMove> for FullMoveWire {
    fn from(full_move: FullMove) -> Self {
        FullMoveWire {
            moves: full_move.moves,
            score: full_move.score,
        }
    }
}
