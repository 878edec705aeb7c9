//! The game aggregate: board, movement log, turn phase, and version.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::FromRepr;

use super::board::Board;
use super::kind::Occupant;
use super::moves::{FullMove, Move};

/// Unique identifier for a game.
pub type GameId = String;

/// AI strength selector. The closed set of accepted values mirrors the
/// wire contract: 2 and 4 select the search engine at those depths, 11-13
/// select the learned-policy engine presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Difficulty {
    /// Shallow search (depth 2).
    Shallow = 2,
    /// Deeper search (depth 4).
    Deep = 4,
    /// Learned policy, easy preset.
    LearnedEasy = 11,
    /// Learned policy, medium preset.
    LearnedMedium = 12,
    /// Learned policy, hard preset.
    LearnedHard = 13,
}

impl Difficulty {
    /// True for the learned-policy presets (11-13).
    pub fn is_learned(self) -> bool {
        matches!(
            self,
            Difficulty::LearnedEasy | Difficulty::LearnedMedium | Difficulty::LearnedHard
        )
    }

    /// Search depth for the search presets.
    pub fn search_depth(self) -> Option<u8> {
        match self {
            Difficulty::Shallow => Some(2),
            Difficulty::Deep => Some(4),
            _ => None,
        }
    }
}

/// Rejected difficulty value.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("difficulty {got} is not one of the accepted values")]
pub struct DifficultyError {
    /// The rejected value.
    pub got: u8,
}

impl TryFrom<u8> for Difficulty {
    type Error = DifficultyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Difficulty::from_repr(value).ok_or(DifficultyError { got: value })
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d as u8
    }
}

/// Where the turn state machine stands.
///
/// A full human turn walks `NeutronSelection -> NeutronDestination ->
/// PieceSelection -> PieceDestination`; the selected square travels inside
/// the destination phases, so "awaiting a destination with nothing
/// selected" cannot be represented. The stored record keeps the original
/// `whoMove` 0/1 flag plus an optional `selectedChip`.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPhase {
    /// Waiting for the neutron to be picked up.
    NeutronSelection,
    /// Neutron picked up, waiting for its destination.
    NeutronDestination {
        /// The neutron's current square.
        selected: Move,
    },
    /// Waiting for a white piece to be picked up.
    PieceSelection,
    /// White piece picked up, waiting for its destination.
    PieceDestination {
        /// The piece's current square.
        selected: Move,
    },
}

impl TurnPhase {
    /// The 0/1 half-turn flag as persisted.
    pub fn who_move(&self) -> u8 {
        match self {
            TurnPhase::NeutronSelection | TurnPhase::NeutronDestination { .. } => 0,
            TurnPhase::PieceSelection | TurnPhase::PieceDestination { .. } => 1,
        }
    }

    /// The currently selected square, if any.
    pub fn selected(&self) -> Option<&Move> {
        match self {
            TurnPhase::NeutronDestination { selected }
            | TurnPhase::PieceDestination { selected } => Some(selected),
            _ => None,
        }
    }

    /// The occupant the current half-turn expects to be picked up.
    pub fn expected_occupant(&self) -> Occupant {
        match self.who_move() {
            0 => Occupant::Neutron,
            _ => Occupant::White,
        }
    }

    fn from_wire(who_move: u8, selected: Option<Move>) -> Result<Self, StateError> {
        match (who_move, selected) {
            (0, None) => Ok(TurnPhase::NeutronSelection),
            (0, Some(selected)) => Ok(TurnPhase::NeutronDestination { selected }),
            (1, None) => Ok(TurnPhase::PieceSelection),
            (1, Some(selected)) => Ok(TurnPhase::PieceDestination { selected }),
            (got, _) => Err(StateError::InvalidWhoMove { got }),
        }
    }
}

/// Errors raised while ingesting a stored or client-supplied game record.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum StateError {
    /// The record tag was not `GameState`.
    #[display("record tag must be \"GameState\"")]
    InvalidTag,
    /// Empty game id.
    #[display("game id must not be empty")]
    EmptyId,
    /// Persisted versions are non-negative.
    #[display("version must be non-negative, got {got}")]
    NegativeVersion {
        /// The rejected version.
        got: i64,
    },
    /// The half-turn flag was neither 0 nor 1.
    #[display("invalid whoMove value: {got}")]
    InvalidWhoMove {
        /// The rejected flag.
        got: u8,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GameStateWire {
    #[serde(rename = "__typename")]
    typename: String,
    id: String,
    board: Board,
    movements: Vec<FullMove>,
    #[serde(rename = "whoMove")]
    who_move: u8,
    #[serde(rename = "selectedChip", default, skip_serializing_if = "Option::is_none")]
    selected_chip: Option<Move>,
    #[serde(rename = "neutronFrom", default, skip_serializing_if = "Option::is_none")]
    neutron_from: Option<Move>,
    #[serde(rename = "neutronTo", default, skip_serializing_if = "Option::is_none")]
    neutron_to: Option<Move>,
    version: i64,
    #[serde(default = "default_difficulty")]
    difficulty: Difficulty,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Shallow
}

/// The aggregate root for one game.
///
/// The store is the source of truth for the persisted copy; the engine
/// mutates an in-memory copy and hands it back for persistence with the
/// version bumped exactly once per accepted round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GameStateWire", into = "GameStateWire")]
pub struct GameState {
    id: GameId,
    board: Board,
    movements: Vec<FullMove>,
    phase: TurnPhase,
    neutron_from: Option<Move>,
    neutron_to: Option<Move>,
    version: i64,
    difficulty: Difficulty,
}

impl GameState {
    /// Version of a state that has never been persisted. The wire and the
    /// store only ever carry versions from 0 upward.
    pub const UNPERSISTED: i64 = -1;

    /// Fresh game with the starting board.
    pub fn new(id: GameId) -> Self {
        GameState {
            id,
            board: Board::new(),
            movements: Vec::new(),
            phase: TurnPhase::NeutronSelection,
            neutron_from: None,
            neutron_to: None,
            version: Self::UNPERSISTED,
            difficulty: default_difficulty(),
        }
    }

    /// Fresh game under a generated id.
    pub fn with_random_id() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Game id.
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Committed full turns, oldest first.
    pub fn movements(&self) -> &[FullMove] {
        &self.movements
    }

    pub(crate) fn push_movement(&mut self, movement: FullMove) {
        self.movements.push(movement);
    }

    /// Current phase of the turn state machine.
    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    /// Source of the most recent neutron relocation.
    pub fn neutron_from(&self) -> Option<&Move> {
        self.neutron_from.as_ref()
    }

    pub(crate) fn set_neutron_from(&mut self, m: Option<Move>) {
        self.neutron_from = m;
    }

    /// Target of the most recent neutron relocation.
    pub fn neutron_to(&self) -> Option<&Move> {
        self.neutron_to.as_ref()
    }

    pub(crate) fn set_neutron_to(&mut self, m: Option<Move>) {
        self.neutron_to = m;
    }

    /// Monotonic persistence version ([`GameState::UNPERSISTED`] before the
    /// first save).
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Stamps an explicit version (store initialization and client loads).
    pub fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    /// Advances the version by one for the next save.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// AI strength for this game.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Changes the AI strength.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }
}

impl TryFrom<GameStateWire> for GameState {
    type Error = StateError;

    fn try_from(wire: GameStateWire) -> Result<Self, Self::Error> {
        if wire.typename != "GameState" {
            return Err(StateError::InvalidTag);
        }
        if wire.id.is_empty() {
            return Err(StateError::EmptyId);
        }
        if wire.version < 0 {
            return Err(StateError::NegativeVersion { got: wire.version });
        }
        let phase = TurnPhase::from_wire(wire.who_move, wire.selected_chip)?;
        Ok(GameState {
            id: wire.id,
            board: wire.board,
            movements: wire.movements,
            phase,
            neutron_from: wire.neutron_from,
            neutron_to: wire.neutron_to,
            version: wire.version,
            difficulty: wire.difficulty,
        })
    }
}

impl From<GameState> for GameStateWire {
    fn from(state: GameState) -> Self {
        GameStateWire {
            typename: "GameState".to_string(),
            who_move: state.phase.who_move(),
            selected_chip: state.phase.selected().copied(),
            id: state.id,
            board: state.board,
            movements: state.movements,
            neutron_from: state.neutron_from,
            neutron_to: state.neutron_to,
            version: state.version,
            difficulty: state.difficulty,
        }
    }
}
