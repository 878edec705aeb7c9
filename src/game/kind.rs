//! Piece vocabulary shared with clients, and the internal cell model.

use serde::{Deserialize, Serialize};
use strum::FromRepr;

/// Piece kind as clients and the stored record see it.
///
/// The four `S*` variants are the "highlighted" counterparts used to mark
/// the current selection and its reachable squares inside the same board
/// array. Every base kind has exactly one highlighted counterpart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRepr,
)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum PieceKind {
    /// Machine-side piece.
    Black = 1,
    /// Human-side piece.
    White = 2,
    /// The shared piece both players relocate every turn.
    Neutron = 3,
    /// Empty square.
    Cell = 4,
    /// Highlighted black piece.
    SBlack = 5,
    /// Highlighted white piece.
    SWhite = 6,
    /// Highlighted empty square (a legal destination).
    SCell = 7,
    /// Highlighted neutron (the current selection).
    SNeutron = 8,
}

impl PieceKind {
    /// Wire code of this kind (1-8).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_repr(code)
    }

    /// Returns the base-phase counterpart (identity for base kinds).
    pub fn base(self) -> Self {
        match self {
            PieceKind::SBlack => PieceKind::Black,
            PieceKind::SWhite => PieceKind::White,
            PieceKind::SNeutron => PieceKind::Neutron,
            PieceKind::SCell => PieceKind::Cell,
            other => other,
        }
    }

    /// Returns the highlighted counterpart (identity for highlighted kinds).
    pub fn highlighted(self) -> Self {
        match self {
            PieceKind::Black => PieceKind::SBlack,
            PieceKind::White => PieceKind::SWhite,
            PieceKind::Neutron => PieceKind::SNeutron,
            PieceKind::Cell => PieceKind::SCell,
            other => other,
        }
    }
}

/// What occupies a square, independent of any highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// Machine-side piece.
    Black,
    /// Human-side piece.
    White,
    /// The shared neutron.
    Neutron,
    /// Nothing.
    Empty,
}

/// A single board square: its occupant plus the presentation flag marking
/// it as part of the current selection.
///
/// The stored record keeps the original single-enumeration encoding, so the
/// pair maps bijectively onto [`PieceKind`]; splitting the two concerns
/// internally means clearing highlights can never change an occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The piece on this square, if any.
    pub occupant: Occupant,
    /// Whether the square is currently marked as selected/reachable.
    pub highlighted: bool,
}

impl Cell {
    /// An empty, unhighlighted square.
    pub const EMPTY: Cell = Cell {
        occupant: Occupant::Empty,
        highlighted: false,
    };

    /// A base-phase square holding the given occupant.
    pub fn of(occupant: Occupant) -> Self {
        Cell {
            occupant,
            highlighted: false,
        }
    }

    /// True when a slider may pass through or land on this square.
    ///
    /// Matches the original rule exactly: only a base-phase empty square
    /// counts, a highlighted empty square does not.
    pub fn is_open(self) -> bool {
        self.occupant == Occupant::Empty && !self.highlighted
    }
}

impl From<PieceKind> for Cell {
    fn from(kind: PieceKind) -> Self {
        let highlighted = kind != kind.base();
        let occupant = match kind.base() {
            PieceKind::Black => Occupant::Black,
            PieceKind::White => Occupant::White,
            PieceKind::Neutron => Occupant::Neutron,
            _ => Occupant::Empty,
        };
        Cell {
            occupant,
            highlighted,
        }
    }
}

impl From<Cell> for PieceKind {
    fn from(cell: Cell) -> Self {
        let base = match cell.occupant {
            Occupant::Black => PieceKind::Black,
            Occupant::White => PieceKind::White,
            Occupant::Neutron => PieceKind::Neutron,
            Occupant::Empty => PieceKind::Cell,
        };
        if cell.highlighted { base.highlighted() } else { base }
    }
}

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The human player.
    White,
    /// The machine player.
    Black,
}

impl Side {
    /// The opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// The piece kind this side plays with.
    pub fn kind(self) -> PieceKind {
        match self {
            Side::White => PieceKind::White,
            Side::Black => PieceKind::Black,
        }
    }

    /// The occupant this side plays with.
    pub fn occupant(self) -> Occupant {
        match self {
            Side::White => Occupant::White,
            Side::Black => Occupant::Black,
        }
    }

    /// The back rank this side is trying to drive the neutron onto.
    ///
    /// Black wins on row 0, White on row 4.
    pub fn home_row(self) -> u8 {
        match self {
            Side::White => 4,
            Side::Black => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 1..=8 {
            let kind = PieceKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(PieceKind::from_code(0).is_none());
        assert!(PieceKind::from_code(9).is_none());
    }

    #[test]
    fn base_and_highlighted_are_a_bijection() {
        let bases = [
            PieceKind::Black,
            PieceKind::White,
            PieceKind::Neutron,
            PieceKind::Cell,
        ];
        for base in bases {
            assert_eq!(base.highlighted().base(), base);
            assert_ne!(base.highlighted(), base);
        }
    }

    #[test]
    fn cell_round_trips_through_kind() {
        for code in 1..=8 {
            let kind = PieceKind::from_code(code).unwrap();
            assert_eq!(PieceKind::from(Cell::from(kind)), kind);
        }
    }

    #[test]
    fn highlighted_empty_square_is_not_open() {
        let cell = Cell::from(PieceKind::SCell);
        assert!(!cell.is_open());
        assert!(Cell::EMPTY.is_open());
    }
}
