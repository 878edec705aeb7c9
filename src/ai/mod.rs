//! The machine player boundary: a registry of move proposers keyed by
//! engine mode, with unavailable modes rejected before any state changes.

mod minimax;

pub use minimax::MinimaxEngine;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{Display, Error};
use tracing::instrument;

use crate::game::{Board, Difficulty, FullMove};

/// Which family of engine backs a difficulty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EngineMode {
    /// Conventional search (difficulties 2 and 4).
    #[display("search")]
    Search,
    /// Learned policy (difficulties 11-13).
    #[display("learned")]
    Learned,
}

impl From<Difficulty> for EngineMode {
    fn from(difficulty: Difficulty) -> Self {
        if difficulty.is_learned() {
            EngineMode::Learned
        } else {
            EngineMode::Search
        }
    }
}

/// Errors raised at the machine-player boundary.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum AiError {
    /// No engine is loaded for the requested mode. Surfaced before any
    /// game state changes; never silently downgraded to another engine.
    #[display("no {mode} engine is loaded")]
    Unavailable {
        /// The rejected mode.
        mode: EngineMode,
    },
    /// The engine ran but failed to produce a reply.
    #[display("engine failed: {reason}")]
    Failed {
        /// What went wrong.
        reason: String,
    },
}

/// A move proposer: given a board and a difficulty, produce the machine's
/// full turn. One call per invocation; the zero-move [`FullMove`] sentinel
/// means "no legal reply" and must be passed through untouched.
#[async_trait]
pub trait MoveProposer: Send + Sync {
    /// Proposes the machine's reply for the given position.
    async fn propose(&self, board: Board, difficulty: Difficulty) -> Result<FullMove, AiError>;
}

/// Registry routing difficulties to their backing engines.
#[derive(Clone, Default)]
pub struct AiProxy {
    engines: HashMap<EngineMode, Arc<dyn MoveProposer>>,
}

impl AiProxy {
    /// Empty registry; every mode starts unavailable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the engine backing a mode.
    pub fn register(&mut self, mode: EngineMode, engine: Arc<dyn MoveProposer>) {
        self.engines.insert(mode, engine);
    }

    /// Whether the engine backing this difficulty is loaded.
    pub fn is_available(&self, difficulty: Difficulty) -> bool {
        self.engines.contains_key(&EngineMode::from(difficulty))
    }

    /// Invokes the engine backing the difficulty, rejecting unavailable
    /// modes with a distinguishable error.
    #[instrument(skip(self, board), fields(difficulty = u8::from(difficulty)))]
    pub async fn propose(
        &self,
        board: Board,
        difficulty: Difficulty,
    ) -> Result<FullMove, AiError> {
        let mode = EngineMode::from(difficulty);
        let engine = self
            .engines
            .get(&mode)
            .ok_or(AiError::Unavailable { mode })?;
        engine.propose(board, difficulty).await
    }
}

impl std::fmt::Debug for AiProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiProxy")
            .field("modes", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}
