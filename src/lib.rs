//! Neutron game server library.
//!
//! Neutron is a two-player abstract strategy game on a 5x5 board: each
//! turn relocates the shared neutron and then one of the player's own
//! pieces, and trapping the neutron or driving it to a back rank ends the
//! game. This crate provides:
//!
//! - **Game engine**: board model, maximal-slide move generation, and the
//!   click-driven turn state machine with win/stalemate detection.
//! - **Versioned store**: optimistic-concurrency persistence of game state
//!   so concurrent writers never silently clobber each other.
//! - **AI boundary**: a move-proposer registry with a bundled search
//!   engine; one side of every game is played by the machine.
//! - **Transport**: a WebSocket protocol broadcasting each accepted state
//!   transition to everyone watching the game.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod ai;
mod cli;
mod config;
mod game;
mod rooms;
mod server;
mod store;

// Crate-level exports - machine player boundary
pub use ai::{AiError, AiProxy, EngineMode, MinimaxEngine, MoveProposer};

// Crate-level exports - CLI
pub use cli::{Cli, Command};

// Crate-level exports - configuration
pub use config::{Config, ConfigError};

// Crate-level exports - game domain
pub use game::{
    BOARD_SIDE, Board, Cell, ClickStep, Difficulty, DifficultyError, Direction, EngineError,
    FullMove, GameId, GameState, Move, MoveError, Occupant, PieceKind, Side, StateError,
    TurnEngine, TurnPhase, Verdict, check_game_over, click_transition, reply_transition,
};

// Crate-level exports - rooms and transport
pub use rooms::RoomRegistry;
pub use server::{AppState, router};

// Crate-level exports - versioned store
pub use store::{GameStore, MemoryStore, StoreError, game_key};
