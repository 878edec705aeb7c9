//! Game domain: board and piece model, move generation, and the turn
//! state machine.

mod board;
mod engine;
mod kind;
mod moves;
mod state;

pub use board::Board;
pub use engine::{
    ClickStep, EngineError, TurnEngine, Verdict, check_game_over, click_transition,
    reply_transition,
};
pub use kind::{Cell, Occupant, PieceKind, Side};
pub use moves::{BOARD_SIDE, Direction, FullMove, Move, MoveError};
pub use state::{Difficulty, DifficultyError, GameId, GameState, StateError, TurnPhase};
