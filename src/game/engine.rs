//! The turn state machine: click transitions, the game-over rule, and the
//! asynchronous hand-off to the machine player.

use derive_more::{Display, Error, From};
use tracing::{debug, info, instrument};

use crate::ai::{AiError, AiProxy};

use super::board::Board;
use super::kind::{Cell, Occupant, PieceKind, Side};
use super::moves::{BOARD_SIDE, FullMove, Move, MoveError};
use super::state::{GameState, TurnPhase};

/// Result of a click as far as the game's life is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Play continues.
    Ongoing,
    /// The game ended with a winner.
    Won {
        /// The side credited with the win.
        winner: Side,
    },
}

impl Verdict {
    /// True once a winner exists.
    pub fn is_over(self) -> bool {
        matches!(self, Verdict::Won { .. })
    }

    /// Wire kind of the winner ([`PieceKind::Cell`] while play continues).
    pub fn winner_kind(self) -> PieceKind {
        match self {
            Verdict::Ongoing => PieceKind::Cell,
            Verdict::Won { winner } => winner.kind(),
        }
    }
}

/// Errors raised by the turn engine.
#[derive(Debug, Display, Error, From)]
pub enum EngineError {
    /// A coordinate or turn failed its construction invariant.
    #[display("{_0}")]
    Move(MoveError),
    /// A highlighted destination was clicked with nothing selected; the
    /// board and the phase disagree.
    #[display("highlighted destination clicked with no selection (whoMove={who_move})")]
    #[from(skip)]
    PhaseCorrupted {
        /// The half-turn flag at the time.
        who_move: u8,
    },
    /// The machine reply carried moves but no neutron relocation.
    #[display("machine reply is missing its neutron relocation")]
    MalformedReply,
    /// The move proposer failed or is unavailable.
    #[display("{_0}")]
    Ai(AiError),
}

/// Outcome of the pure click transition.
#[derive(Debug)]
pub enum ClickStep {
    /// Selection, dismissal, or the neutron half-turn: nothing further to
    /// drive.
    Settled {
        /// State after the click.
        state: GameState,
        /// Game-over verdict for this click.
        verdict: Verdict,
    },
    /// The human full turn just committed; unless the verdict already ends
    /// the game, the machine reply is pending.
    TurnCommitted {
        /// State after the click.
        state: GameState,
        /// Verdict from the human half of the turn.
        verdict: Verdict,
    },
}

/// Decides whether the game is over after a neutron relocation.
///
/// Check order matters and is part of the rules: a trapped neutron first
/// credits the side that caused the trap, then row 0 hands the game to
/// Black and row 4 to White regardless of remaining mobility.
pub fn check_game_over(board: &Board, neutron_to: Option<&Move>, credit: Side) -> Verdict {
    let Some(destination) = neutron_to else {
        return Verdict::Ongoing;
    };
    if board.legal_destinations(destination).is_empty() {
        return Verdict::Won { winner: credit };
    }
    if destination.row() == 0 {
        return Verdict::Won { winner: Side::Black };
    }
    if destination.row() == 4 {
        return Verdict::Won { winner: Side::White };
    }
    Verdict::Ongoing
}

/// Pure transition for one inbound click.
///
/// Exactly one of three branches applies: picking up the expected piece,
/// committing a highlighted destination, or dismissing the click (which
/// clears any selection). The board content only changes in the second
/// branch.
pub fn click_transition(mut state: GameState, row: u8, col: u8) -> Result<ClickStep, EngineError> {
    if row >= BOARD_SIDE || col >= BOARD_SIDE {
        return Err(MoveError::OutOfRange { row, col }.into());
    }

    let cell = state.board().cell(row, col);
    let expected = state.phase().expected_occupant();

    if cell.occupant == expected && !cell.highlighted {
        select(&mut state, row, col)?;
        return Ok(ClickStep::Settled {
            state,
            verdict: Verdict::Ongoing,
        });
    }

    if cell.occupant == Occupant::Empty && cell.highlighted {
        return commit_destination(state, row, col);
    }

    // Irrelevant square: drop the selection and its highlights.
    debug!(row, col, "click dismissed");
    state.board_mut().highlight(&[]);
    let phase = match state.phase().who_move() {
        0 => TurnPhase::NeutronSelection,
        _ => TurnPhase::PieceSelection,
    };
    state.set_phase(phase);
    Ok(ClickStep::Settled {
        state,
        verdict: Verdict::Ongoing,
    })
}

fn select(state: &mut GameState, row: u8, col: u8) -> Result<(), EngineError> {
    let kind = PieceKind::from(Cell::of(state.phase().expected_occupant()));
    let origin = Move::new(row, col, kind)?;

    // Highlights from a previous selection must be gone before computing
    // reachable squares, or they would block the slides.
    state.board_mut().highlight(&[]);
    let mut marks = state.board().legal_destinations(&origin);
    marks.push(origin);
    state.board_mut().highlight(&marks);

    let phase = match state.phase().who_move() {
        0 => TurnPhase::NeutronDestination { selected: origin },
        _ => TurnPhase::PieceDestination { selected: origin },
    };
    state.set_phase(phase);
    debug!(row, col, marks = marks.len() - 1, "selection highlighted");
    Ok(())
}

fn commit_destination(
    mut state: GameState,
    row: u8,
    col: u8,
) -> Result<ClickStep, EngineError> {
    match state.phase().clone() {
        TurnPhase::NeutronDestination { selected } => {
            let destination = Move::new(row, col, selected.kind())?;
            state.board_mut().apply_move(&selected, &destination);
            state.board_mut().highlight(&[]);
            state.set_neutron_from(Some(selected));
            state.set_neutron_to(Some(destination));
            let verdict = check_game_over(state.board(), Some(&destination), Side::White);
            state.set_phase(TurnPhase::PieceSelection);
            Ok(ClickStep::Settled { state, verdict })
        }
        TurnPhase::PieceDestination { selected } => {
            let destination = Move::new(row, col, selected.kind())?;
            state.board_mut().apply_move(&selected, &destination);
            state.board_mut().highlight(&[]);

            // The piece move may have boxed the neutron in where it stands.
            let neutron_to = state.neutron_to().copied();
            let verdict = check_game_over(state.board(), neutron_to.as_ref(), Side::White);

            if let (Some(neutron_from), Some(neutron_to)) =
                (state.neutron_from().copied(), neutron_to)
            {
                let turn =
                    FullMove::new(vec![neutron_from, neutron_to, selected, destination], 0)?;
                state.push_movement(turn);
            }

            state.set_phase(TurnPhase::NeutronSelection);
            Ok(ClickStep::TurnCommitted { state, verdict })
        }
        phase => Err(EngineError::PhaseCorrupted {
            who_move: phase.who_move(),
        }),
    }
}

/// Pure transition applying the machine's reply to a committed human turn.
pub fn reply_transition(
    mut state: GameState,
    reply: FullMove,
) -> Result<(GameState, Verdict), EngineError> {
    let neutron_to = reply
        .neutron_to()
        .copied()
        .ok_or(EngineError::MalformedReply)?;
    state.push_movement(reply.clone());
    state.set_neutron_to(Some(neutron_to));
    state.board_mut().apply_full_move(&reply, true);
    state.board_mut().highlight(&[]);
    let verdict = check_game_over(state.board(), Some(&neutron_to), Side::Black);
    Ok((state, verdict))
}

/// Drives full click round trips, including the machine's reply.
///
/// The engine never persists: it takes an in-memory [`GameState`] and
/// returns the successor for the caller to save.
pub struct TurnEngine {
    proxy: AiProxy,
}

impl TurnEngine {
    /// Creates an engine backed by the given proposer registry.
    pub fn new(proxy: AiProxy) -> Self {
        TurnEngine { proxy }
    }

    /// The proposer registry (for availability checks at the boundary).
    pub fn proxy(&self) -> &AiProxy {
        &self.proxy
    }

    /// Applies one click. When the click completes a human turn without
    /// ending the game, the machine's reply is obtained and applied before
    /// returning; an empty reply means the machine has no legal move and
    /// White wins outright.
    #[instrument(skip(self, state), fields(game_id = %state.id(), row, col))]
    pub async fn apply_click(
        &self,
        state: GameState,
        row: u8,
        col: u8,
    ) -> Result<(GameState, Verdict), EngineError> {
        match click_transition(state, row, col)? {
            ClickStep::Settled { state, verdict } => Ok((state, verdict)),
            ClickStep::TurnCommitted { state, verdict } => {
                if verdict.is_over() {
                    info!(winner = ?verdict.winner_kind(), "human turn ended the game");
                    return Ok((state, verdict));
                }
                let reply = self
                    .proxy
                    .propose(state.board().clone(), state.difficulty())
                    .await?;
                if reply.is_empty() {
                    info!("machine has no legal reply, White wins");
                    return Ok((
                        state,
                        Verdict::Won {
                            winner: Side::White,
                        },
                    ));
                }
                let (state, verdict) = reply_transition(state, reply)?;
                if verdict.is_over() {
                    info!(winner = ?verdict.winner_kind(), "machine turn ended the game");
                }
                Ok((state, verdict))
            }
        }
    }
}
