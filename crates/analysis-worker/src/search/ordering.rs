//! Move ordering heuristics

use std::cmp::Reverse;

use chess_core::rules::{self, MoveMeta};
use shakmaty::{Chess, Move, Position, Role};

use crate::board_utils::{is_central, piece_value};

const CHECK_BONUS: i32 = 10_000;
const CAPTURE_BASE: i32 = 1_000;
const CENTER_BONUS: i32 = 10;

/// Attacker weight for MVV-LVA; the king counts as the most valuable attacker
fn attacker_value(role: Role) -> i32 {
    match role {
        Role::King => 1_000,
        other => piece_value(other),
    }
}

/// Heuristic priority of a move; higher is searched first.
pub fn move_priority(meta: &MoveMeta) -> i32 {
    let mut score = 0;
    if meta.gives_check {
        score += CHECK_BONUS;
    }
    if let Some(victim) = meta.capture {
        score += CAPTURE_BASE + piece_value(victim) * 10 - attacker_value(meta.role);
    }
    if let Some(promoted) = meta.promotion {
        score += piece_value(promoted);
    }
    if is_central(meta.to) {
        score += CENTER_BONUS;
    }
    score
}

/// All legal moves in search order. The sort is stable so equal priorities
/// keep generation order.
pub fn ordered_moves(pos: &Chess) -> Vec<Move> {
    sort_by_priority(pos, pos.legal_moves().into_iter().collect())
}

/// Legal captures only, in search order.
pub fn ordered_captures(pos: &Chess) -> Vec<Move> {
    sort_by_priority(
        pos,
        pos.legal_moves()
            .into_iter()
            .filter(|mv| mv.is_capture())
            .collect(),
    )
}

fn sort_by_priority(pos: &Chess, moves: Vec<Move>) -> Vec<Move> {
    let mut scored: Vec<(i32, Move)> = moves
        .into_iter()
        .map(|mv| (move_priority(&rules::move_meta(pos, &mv)), mv))
        .collect();
    scored.sort_by_key(|(priority, _)| Reverse(*priority));
    scored.into_iter().map(|(_, mv)| mv).collect()
}
