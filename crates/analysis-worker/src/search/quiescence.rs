// Capture-only extension of leaves reached by a capture

use chess_core::rules;
use shakmaty::{Chess, Color, Position};

use super::{terminal_score, Searcher};
use crate::eval::evaluate;

impl Searcher {
    /// Stand pat, then resolve captures in search order until quiet or out of depth.
    pub(super) fn quiescence(
        &mut self,
        pos: &Chess,
        mut alpha: i32,
        mut beta: i32,
        depth: u8,
        ply: u8,
    ) -> i32 {
        self.nodes += 1;
        if self.should_stop() {
            return evaluate(pos);
        }
        if let Some(score) = terminal_score(pos, ply) {
            return score;
        }

        let stand_pat = evaluate(pos);
        if depth == 0 {
            return stand_pat;
        }

        let maximizing = pos.turn() == Color::White;
        if maximizing {
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
        } else {
            if stand_pat <= alpha {
                return stand_pat;
            }
            beta = beta.min(stand_pat);
        }

        let mut best = stand_pat;
        for mv in super::ordering::ordered_captures(pos) {
            let Ok(child) = rules::apply(pos, &mv) else {
                continue;
            };
            let score = self.quiescence(&child, alpha, beta, depth - 1, ply.saturating_add(1));
            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }
        best
    }
}
