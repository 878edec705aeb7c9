//! Alpha-beta search over full turns, backing difficulties 2 and 4.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::game::{Board, Difficulty, FullMove, Side};

use super::{AiError, MoveProposer};

const WIN: i32 = i16::MAX as i32;
const LOSS: i32 = i16::MIN as i32;

/// Position value from Black's point of view: terminal ranks dominate,
/// otherwise the neutron's mobility toward either home rank decides.
fn heuristic(board: &Board) -> i32 {
    let Some(neutron) = board.find_neutron() else {
        return 0;
    };
    if neutron.row() == 4 {
        return LOSS;
    }
    if neutron.row() == 0 {
        return WIN;
    }
    let mut value = 0;
    for escape in board.legal_destinations(&neutron) {
        if escape.row() == 4 {
            value -= 5000;
        }
        if escape.row() == 0 {
            value += 1000;
        }
    }
    value
}

fn terminal(board: &Board, depth: u8) -> bool {
    if depth == 0 {
        return true;
    }
    match board.find_neutron() {
        Some(neutron) => neutron.row() == 0 || neutron.row() == 4,
        None => true,
    }
}

fn max_value(board: &mut Board, depth: u8, alpha: i32, beta: i32, side: Side) -> FullMove {
    if terminal(board, depth) {
        return FullMove::empty(heuristic(board));
    }

    let turns = board.enumerate_turns(side);
    let mut best = FullMove::empty(alpha);

    for turn in &turns {
        board.apply_full_move(turn, true);
        let reply = min_value(board, depth - 1, best.score(), beta, side.opponent());
        board.apply_full_move(turn, false);

        if reply.score() > best.score() {
            best = turn.clone().with_score(reply.score());
        }
        if best.score() >= beta {
            return turn.clone().with_score(beta);
        }
    }

    if best.is_empty() && !turns.is_empty() {
        // The window swallowed every line; fall back to the best immediate
        // position so a move is still produced.
        let mut fallback = FullMove::empty(i32::MIN);
        for turn in &turns {
            board.apply_full_move(turn, true);
            let value = heuristic(board);
            board.apply_full_move(turn, false);
            if value > fallback.score() {
                fallback = turn.clone().with_score(value);
            }
        }
        fallback
    } else {
        best
    }
}

fn min_value(board: &mut Board, depth: u8, alpha: i32, beta: i32, side: Side) -> FullMove {
    if terminal(board, depth) {
        return FullMove::empty(heuristic(board));
    }

    let turns = board.enumerate_turns(side);
    let mut best = FullMove::empty(beta);

    for turn in &turns {
        board.apply_full_move(turn, true);
        let reply = max_value(board, depth - 1, alpha, best.score(), side.opponent());
        board.apply_full_move(turn, false);

        if reply.score() < best.score() {
            best = turn.clone().with_score(reply.score());
        }
        if alpha >= best.score() {
            return turn.clone().with_score(alpha);
        }
    }

    if best.is_empty() && !turns.is_empty() {
        let mut fallback = FullMove::empty(i32::MAX);
        for turn in &turns {
            board.apply_full_move(turn, true);
            let value = heuristic(board);
            board.apply_full_move(turn, false);
            if value < fallback.score() {
                fallback = turn.clone().with_score(value);
            }
        }
        fallback
    } else {
        best
    }
}

/// The conventional search engine. Plays Black; the search runs on a
/// blocking worker thread so it never stalls the runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimaxEngine;

#[async_trait]
impl MoveProposer for MinimaxEngine {
    #[instrument(skip(self, board))]
    async fn propose(&self, board: Board, difficulty: Difficulty) -> Result<FullMove, AiError> {
        let depth = difficulty.search_depth().ok_or_else(|| AiError::Failed {
            reason: format!("search engine cannot serve difficulty {}", u8::from(difficulty)),
        })?;

        let turn = tokio::task::spawn_blocking(move || {
            let mut board = board;
            max_value(&mut board, depth, i32::MIN, i32::MAX, Side::Black)
        })
        .await
        .map_err(|join| AiError::Failed {
            reason: join.to_string(),
        })?;

        debug!(
            empty = turn.is_empty(),
            score = turn.score(),
            "search finished"
        );
        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    /// Builds a board from a 5-line sketch: B/W/N for pieces, '.' empty.
    fn board_from(rows: [&str; 5]) -> Board {
        let mut codes = vec![4u8; 25];
        for (row, line) in rows.iter().enumerate() {
            for (col, symbol) in line.chars().enumerate() {
                codes[col * 5 + row] = match symbol {
                    'B' => 1,
                    'W' => 2,
                    'N' => 3,
                    _ => 4,
                };
            }
        }
        serde_json::from_value(serde_json::to_value(codes).unwrap()).unwrap()
    }

    #[test]
    fn heuristic_rewards_black_rank() {
        let winning = board_from(["N....", ".....", ".....", ".....", "....."]);
        assert_eq!(heuristic(&winning), WIN);

        let losing = board_from([".....", ".....", ".....", ".....", "N...."]);
        assert_eq!(heuristic(&losing), LOSS);
    }

    #[tokio::test]
    async fn takes_the_winning_neutron_move() {
        // Black to move; the neutron can slide straight up to row 0.
        let board = board_from([
            ".....", //
            ".....", //
            "..N..", //
            "B....", //
            "....W",
        ]);
        let turn = MinimaxEngine
            .propose(board, Difficulty::Shallow)
            .await
            .unwrap();
        assert!(!turn.is_empty());
        assert_eq!(turn.moves()[1].row(), 0);
    }

    #[tokio::test]
    async fn no_moves_yields_the_empty_sentinel() {
        // The neutron is completely walled in, so Black has no neutron
        // relocation and therefore no full turn.
        let board = board_from([
            "WWW..", //
            "WNW..", //
            "WWW..", //
            ".....", //
            "....B",
        ]);
        let turn = MinimaxEngine
            .propose(board, Difficulty::Shallow)
            .await
            .unwrap();
        assert!(turn.is_empty());
    }

    #[tokio::test]
    async fn learned_difficulty_is_not_served() {
        let err = MinimaxEngine
            .propose(Board::new(), Difficulty::LearnedEasy)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Failed { .. }));
    }
}
