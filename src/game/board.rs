//! The 5x5 board: layout, sliding-move generation, and turn application.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::kind::{Cell, Occupant, PieceKind, Side};
use super::moves::{BOARD_SIDE, Direction, FullMove, Move};

const CELL_COUNT: usize = (BOARD_SIDE * BOARD_SIDE) as usize;

/// The game board.
///
/// Cells are stored in the original column-major order: the flat index of
/// `(row, col)` is `col * 5 + row`. The wire representation is the flat
/// array of piece-kind codes in that same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Starting position: black pieces on row 0, white pieces on row 4,
    /// the neutron in the center.
    pub fn new() -> Self {
        let mut board = Board {
            cells: [Cell::EMPTY; CELL_COUNT],
        };
        for col in 0..BOARD_SIDE {
            board.set(0, col, Cell::of(Occupant::Black));
            board.set(4, col, Cell::of(Occupant::White));
        }
        board.set(2, 2, Cell::of(Occupant::Neutron));
        board
    }

    fn index(row: u8, col: u8) -> usize {
        col as usize * BOARD_SIDE as usize + row as usize
    }

    /// Cell at `(row, col)`.
    pub fn cell(&self, row: u8, col: u8) -> Cell {
        self.cells[Self::index(row, col)]
    }

    fn set(&mut self, row: u8, col: u8, cell: Cell) {
        self.cells[Self::index(row, col)] = cell;
    }

    /// Wire-level kind at `(row, col)`.
    pub fn kind_at(&self, row: u8, col: u8) -> PieceKind {
        self.cell(row, col).into()
    }

    /// Flat wire codes in column-major order.
    pub fn codes(&self) -> [u8; CELL_COUNT] {
        let mut out = [0u8; CELL_COUNT];
        for (slot, cell) in out.iter_mut().zip(self.cells.iter()) {
            *slot = PieceKind::from(*cell).code();
        }
        out
    }

    /// Returns every cell to base phase, then highlights the listed squares.
    ///
    /// Called with an empty slice this is the "clear selection" step that
    /// precedes every new highlight computation.
    pub fn highlight(&mut self, marks: &[Move]) {
        for cell in &mut self.cells {
            cell.highlighted = false;
        }
        for mark in marks {
            self.cells[Self::index(mark.row(), mark.col())].highlighted = true;
        }
    }

    /// Legal sliding destinations from `origin`: for each of the eight
    /// directions, the farthest square reachable over an unbroken run of
    /// open cells. Directions that cannot advance contribute nothing, so
    /// the origin itself is never returned.
    pub fn legal_destinations(&self, origin: &Move) -> Vec<Move> {
        Direction::ALL
            .iter()
            .filter_map(|direction| self.slide(origin, *direction))
            .collect()
    }

    fn slide(&self, origin: &Move, direction: Direction) -> Option<Move> {
        let (dr, dc) = direction.delta();
        let (mut row, mut col) = (origin.row() as i8, origin.col() as i8);
        loop {
            let (next_row, next_col) = (row + dr, col + dc);
            if !in_bounds(next_row) || !in_bounds(next_col) {
                break;
            }
            if !self.cell(next_row as u8, next_col as u8).is_open() {
                break;
            }
            row = next_row;
            col = next_col;
        }
        if row as u8 == origin.row() && col as u8 == origin.col() {
            return None;
        }
        // Coordinates stayed in bounds throughout the walk.
        Move::new(row as u8, col as u8, origin.kind()).ok()
    }

    /// Moves the piece named by `to.kind()` onto `(to.row, to.col)`,
    /// vacating the source square unless source and destination coincide.
    pub fn apply_move(&mut self, from: &Move, to: &Move) {
        self.set(to.row(), to.col(), Cell::from(to.kind()));
        if Self::index(from.row(), from.col()) != Self::index(to.row(), to.col()) {
            self.set(from.row(), from.col(), Cell::EMPTY);
        }
    }

    /// Applies a committed full turn: neutron pair first, then the piece
    /// pair. With `forward == false` the pair order is reversed, undoing a
    /// previously applied turn.
    pub fn apply_full_move(&mut self, full_move: &FullMove, forward: bool) {
        let moves = full_move.moves();
        let pairs: [(usize, usize); 2] = if forward { [(0, 1), (2, 3)] } else { [(3, 2), (1, 0)] };
        for (from, to) in pairs {
            if let (Some(from), Some(to)) = (moves.get(from), moves.get(to)) {
                self.apply_move(from, to);
            }
        }
    }

    /// Locates the neutron.
    pub fn find_neutron(&self) -> Option<Move> {
        self.find_pieces(Occupant::Neutron).into_iter().next()
    }

    /// All squares occupied by the given occupant, in column-major order.
    pub fn find_pieces(&self, occupant: Occupant) -> Vec<Move> {
        let mut found = Vec::new();
        for col in 0..BOARD_SIDE {
            for row in 0..BOARD_SIDE {
                if self.cell(row, col).occupant == occupant {
                    let kind = PieceKind::from(Cell::of(occupant));
                    if let Ok(m) = Move::new(row, col, kind) {
                        found.push(m);
                    }
                }
            }
        }
        found
    }

    /// Enumerates every full turn available to `side`: each surviving
    /// neutron relocation combined with each own-piece relocation computed
    /// on the board with the neutron already moved.
    ///
    /// Neutron moves that hand the opponent its back rank are dropped, and
    /// an immediately winning neutron move short-circuits the rest.
    pub fn enumerate_turns(&self, side: Side) -> Vec<FullMove> {
        let Some(neutron) = self.find_neutron() else {
            return Vec::new();
        };
        let player_home = side.home_row();
        let opponent_home = side.opponent().home_row();

        let mut neutron_moves: Vec<Move> = self
            .legal_destinations(&neutron)
            .into_iter()
            .filter(|m| m.row() != opponent_home)
            .collect();

        if let Some(winning) = neutron_moves.iter().find(|m| m.row() == player_home).copied() {
            neutron_moves = vec![winning];
        }

        let pieces = self.find_pieces(side.occupant());
        let mut turns = Vec::new();

        for neutron_move in &neutron_moves {
            let mut scratch = self.clone();
            scratch.apply_move(&neutron, neutron_move);
            for piece in &pieces {
                for piece_move in scratch.legal_destinations(piece) {
                    let turn = FullMove::new(
                        vec![neutron, *neutron_move, *piece, piece_move],
                        0,
                    );
                    if let Ok(turn) = turn {
                        turns.push(turn);
                    }
                }
            }
        }

        turns
    }

    /// Compact text rendering, one line per row.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..BOARD_SIDE {
            for col in 0..BOARD_SIDE {
                let cell = self.cell(row, col);
                let symbol = match (cell.occupant, cell.highlighted) {
                    (Occupant::Black, false) => 'B',
                    (Occupant::White, false) => 'W',
                    (Occupant::Neutron, false) => 'N',
                    (Occupant::Empty, false) => '.',
                    (Occupant::Black, true) => 'b',
                    (Occupant::White, true) => 'w',
                    (Occupant::Neutron, true) => 'n',
                    (Occupant::Empty, true) => '*',
                };
                out.push(symbol);
            }
            if row + 1 < BOARD_SIDE {
                out.push('\n');
            }
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn in_bounds(value: i8) -> bool {
    value >= 0 && value < BOARD_SIDE as i8
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.codes().serialize(serializer)
    }
}

/// Wire form of the board: either the flat 25-code array or five 5-code
/// chunks, normalized to flat on ingestion.
#[derive(Deserialize)]
#[serde(untagged)]
enum BoardWire {
    Flat(Vec<u8>),
    Nested(Vec<Vec<u8>>),
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let codes: Vec<u8> = match BoardWire::deserialize(deserializer)? {
            BoardWire::Flat(codes) => codes,
            BoardWire::Nested(chunks) => {
                if chunks.len() != BOARD_SIDE as usize
                    || chunks.iter().any(|chunk| chunk.len() != BOARD_SIDE as usize)
                {
                    return Err(D::Error::custom("board must be 5x5"));
                }
                chunks.into_iter().flatten().collect()
            }
        };
        if codes.len() != CELL_COUNT {
            return Err(D::Error::custom(format!(
                "board must hold {CELL_COUNT} cells, got {}",
                codes.len()
            )));
        }
        let mut cells = [Cell::EMPTY; CELL_COUNT];
        for (slot, code) in cells.iter_mut().zip(codes) {
            let kind = PieceKind::from_code(code)
                .ok_or_else(|| D::Error::custom(format!("unknown piece code {code}")))?;
            *slot = Cell::from(kind);
        }
        Ok(Board { cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(board: &Board, row: u8, col: u8) -> PieceKind {
        board.kind_at(row, col)
    }

    #[test]
    fn starting_layout() {
        let board = Board::new();
        for col in 0..5 {
            assert_eq!(at(&board, 0, col), PieceKind::Black);
            assert_eq!(at(&board, 4, col), PieceKind::White);
        }
        assert_eq!(at(&board, 2, 2), PieceKind::Neutron);
        assert_eq!(at(&board, 1, 3), PieceKind::Cell);
    }

    #[test]
    fn codes_are_column_major() {
        let board = Board::new();
        let codes = board.codes();
        // Column 2 occupies indices 10..15: black, empty, neutron, empty, white.
        assert_eq!(&codes[10..15], &[1, 4, 3, 4, 2]);
    }

    #[test]
    fn destinations_are_maximal_slides() {
        let board = Board::new();
        let neutron = board.find_neutron().unwrap();
        let moves = board.legal_destinations(&neutron);

        // From the center of the fresh board every direction advances,
        // stopping just short of the occupied back ranks.
        assert_eq!(moves.len(), 8);
        for m in &moves {
            assert_ne!((m.row(), m.col()), (neutron.row(), neutron.col()));
            assert_eq!(m.kind(), PieceKind::Neutron);
        }
        let coords: Vec<(u8, u8)> = moves.iter().map(|m| (m.row(), m.col())).collect();
        assert!(coords.contains(&(2, 0)));
        assert!(coords.contains(&(2, 4)));
        assert!(coords.contains(&(1, 1)));
        assert!(coords.contains(&(3, 3)));
        // Vertical slides are blocked by nothing until the back-rank pieces.
        assert!(coords.contains(&(1, 2)));
        assert!(coords.contains(&(3, 2)));
    }

    #[test]
    fn blocked_direction_contributes_nothing() {
        let mut board = Board::new();
        let neutron = board.find_neutron().unwrap();
        // Wall the neutron in on every side.
        for (row, col) in [(1, 1), (1, 2), (1, 3), (2, 1), (2, 3), (3, 1), (3, 2), (3, 3)] {
            board.apply_move(
                &Move::new(row, col, PieceKind::Cell).unwrap(),
                &Move::new(row, col, PieceKind::Black).unwrap(),
            );
        }
        assert!(board.legal_destinations(&neutron).is_empty());
    }

    #[test]
    fn highlight_resets_previous_marks() {
        let mut board = Board::new();
        let first = Move::new(2, 2, PieceKind::Neutron).unwrap();
        board.highlight(&[first]);
        assert_eq!(board.kind_at(2, 2), PieceKind::SNeutron);

        let second = Move::new(2, 0, PieceKind::Cell).unwrap();
        board.highlight(&[second]);
        assert_eq!(board.kind_at(2, 2), PieceKind::Neutron);
        assert_eq!(board.kind_at(2, 0), PieceKind::SCell);
    }

    #[test]
    fn apply_move_vacates_the_source() {
        let mut board = Board::new();
        let from = Move::new(2, 2, PieceKind::Neutron).unwrap();
        let to = Move::new(2, 0, PieceKind::Neutron).unwrap();
        board.apply_move(&from, &to);
        assert_eq!(board.kind_at(2, 0), PieceKind::Neutron);
        assert_eq!(board.kind_at(2, 2), PieceKind::Cell);
    }

    #[test]
    fn apply_move_onto_itself_keeps_the_piece() {
        let mut board = Board::new();
        let spot = Move::new(2, 2, PieceKind::Neutron).unwrap();
        board.apply_move(&spot, &spot);
        assert_eq!(board.kind_at(2, 2), PieceKind::Neutron);
    }

    #[test]
    fn reversed_application_undoes_a_turn() {
        let mut board = Board::new();
        let turn = FullMove::new(
            vec![
                Move::new(2, 2, PieceKind::Neutron).unwrap(),
                Move::new(1, 2, PieceKind::Neutron).unwrap(),
                Move::new(0, 0, PieceKind::Black).unwrap(),
                Move::new(3, 0, PieceKind::Black).unwrap(),
            ],
            0,
        )
        .unwrap();
        let before = board.clone();
        board.apply_full_move(&turn, true);
        assert_ne!(board, before);
        board.apply_full_move(&turn, false);
        assert_eq!(board, before);
    }

    #[test]
    fn enumerate_turns_skips_gifting_the_opponent() {
        let board = Board::new();
        let turns = board.enumerate_turns(Side::Black);
        assert!(!turns.is_empty());
        for turn in &turns {
            // Black never slides the neutron onto White's home rank.
            assert_ne!(turn.moves()[1].row(), 4);
            assert_eq!(turn.moves()[0].kind(), PieceKind::Neutron);
            assert_eq!(turn.moves()[2].kind(), PieceKind::Black);
        }
    }

    #[test]
    fn nested_board_normalizes_to_flat() {
        let board = Board::new();
        let flat = serde_json::to_value(&board).unwrap();
        let chunks: Vec<Vec<u8>> = board
            .codes()
            .chunks(5)
            .map(|chunk| chunk.to_vec())
            .collect();
        let nested = serde_json::to_value(&chunks).unwrap();

        let from_flat: Board = serde_json::from_value(flat).unwrap();
        let from_nested: Board = serde_json::from_value(nested).unwrap();
        assert_eq!(from_flat, from_nested);
        assert_eq!(from_flat, board);
    }

    #[test]
    fn bad_piece_code_is_rejected() {
        let mut codes = Board::new().codes().to_vec();
        codes[0] = 9;
        assert!(serde_json::from_value::<Board>(serde_json::to_value(codes).unwrap()).is_err());
    }
}
