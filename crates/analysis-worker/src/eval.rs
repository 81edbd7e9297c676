//! Static evaluation: material, piece placement, mobility, check and pawn
//! structure. Scores are in centipawns, positive favouring White.

use chess_core::rules;
use shakmaty::{Board, Chess, Color, Position, Role, Square};

use crate::board_utils::{doubled_pawns, piece_value};

/// Score of a delivered checkmate; every search score is clamped to this range
pub const MATE_SCORE: i32 = 30_000;

/// Scores with this magnitude or more are mates
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;

const MOBILITY_WEIGHT: i32 = 2;
const CHECK_PENALTY: i32 = 30;
const DOUBLED_PAWN_PENALTY: i32 = 15;

// Piece-square tables from White's point of view, rank 8 first.
const PAWN_PST: [i32; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, 50, 50, 50, 50, 50, 50, 50, 50, 10, 10, 20, 30, 30, 20, 10, 10, 5, 5,
    10, 25, 25, 10, 5, 5, 0, 0, 0, 20, 20, 0, 0, 0, 5, -5, -10, 0, 0, -10, -5, 5, 5, 10, 10, -20,
    -20, 10, 10, 5, 0, 0, 0, 0, 0, 0, 0, 0,
];

const KNIGHT_PST: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50, -40, -20, 0, 0, 0, 0, -20, -40, -30, 0, 10, 15, 15, 10,
    0, -30, -30, 5, 15, 20, 20, 15, 5, -30, -30, 0, 15, 20, 20, 15, 0, -30, -30, 5, 10, 15, 15, 10,
    5, -30, -40, -20, 0, 5, 5, 0, -20, -40, -50, -40, -30, -30, -30, -30, -40, -50,
];

const BISHOP_PST: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20, -10, 0, 0, 0, 0, 0, 0, -10, -10, 0, 5, 10, 10, 5, 0,
    -10, -10, 5, 5, 10, 10, 5, 5, -10, -10, 0, 10, 10, 10, 10, 0, -10, -10, 10, 10, 10, 10, 10, 10,
    -10, -10, 5, 0, 0, 0, 0, 5, -10, -20, -10, -10, -10, -10, -10, -10, -20,
];

const ROOK_PST: [i32; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, 5, 10, 10, 10, 10, 10, 10, 5, -5, 0, 0, 0, 0, 0, 0, -5, -5, 0, 0, 0, 0,
    0, 0, -5, -5, 0, 0, 0, 0, 0, 0, -5, -5, 0, 0, 0, 0, 0, 0, -5, -5, 0, 0, 0, 0, 0, 0, -5, 0, 0,
    0, 5, 5, 0, 0, 0,
];

const QUEEN_PST: [i32; 64] = [
    -20, -10, -10, -5, -5, -10, -10, -20, -10, 0, 0, 0, 0, 0, 0, -10, -10, 0, 5, 5, 5, 5, 0, -10,
    -5, 0, 5, 5, 5, 5, 0, -5, 0, 0, 5, 5, 5, 5, 0, -5, -10, 5, 5, 5, 5, 5, 0, -10, -10, 0, 5, 0, 0,
    0, 0, -10, -20, -10, -10, -5, -5, -10, -10, -20,
];

const KING_MIDDLEGAME_PST: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30, -30, -40, -40, -50, -50, -40, -40, -30, -30, -40, -40,
    -50, -50, -40, -40, -30, -30, -40, -40, -50, -50, -40, -40, -30, -20, -30, -30, -40, -40, -30,
    -30, -20, -10, -20, -20, -20, -20, -20, -20, -10, 20, 20, 0, 0, 0, 0, 20, 20, 20, 30, 10, 0, 0,
    10, 30, 20,
];

fn placement(role: Role, color: Color, square: Square) -> i32 {
    // Tables start at a8; flip the rank for White, Black reads them as-is
    let idx = match color {
        Color::White => square as usize ^ 56,
        Color::Black => square as usize,
    };
    let table = match role {
        Role::Pawn => &PAWN_PST,
        Role::Knight => &KNIGHT_PST,
        Role::Bishop => &BISHOP_PST,
        Role::Rook => &ROOK_PST,
        Role::Queen => &QUEEN_PST,
        Role::King => &KING_MIDDLEGAME_PST,
    };
    table[idx]
}

fn material_and_placement(board: &Board) -> i32 {
    let mut score = 0;
    for sq in board.occupied() {
        if let Some(piece) = board.piece_at(sq) {
            let value = piece_value(piece.role) + placement(piece.role, piece.color, sq);
            score += piece.color.fold_wb(value, -value);
        }
    }
    score
}

/// Evaluate a position without search.
pub fn evaluate(pos: &Chess) -> i32 {
    let turn = pos.turn();

    if pos.is_checkmate() {
        return turn.fold_wb(-MATE_SCORE, MATE_SCORE);
    }
    if rules::is_draw(pos) {
        return 0;
    }

    let board = pos.board();
    let mut score = material_and_placement(board);

    let mobility = pos.legal_moves().len() as i32 * MOBILITY_WEIGHT;
    score += turn.fold_wb(mobility, -mobility);

    if pos.is_check() {
        score += turn.fold_wb(-CHECK_PENALTY, CHECK_PENALTY);
    }

    score -= doubled_pawns(board, Color::White) * DOUBLED_PAWN_PENALTY;
    score += doubled_pawns(board, Color::Black) * DOUBLED_PAWN_PENALTY;

    score
}

/// Is `score` a forced-mate score?
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::rules::from_fen;

    #[test]
    fn test_deterministic() {
        let pos = from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3").unwrap();
        assert_eq!(evaluate(&pos), evaluate(&pos));
    }

    #[test]
    fn test_start_position_is_mirror_antisymmetric() {
        let white = Chess::default();
        let black =
            from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1").unwrap();
        assert_eq!(evaluate(&white), -evaluate(&black));
        assert!(evaluate(&white) > 0);
    }

    #[test]
    fn test_colour_mirror_negates_score() {
        let white = from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let black = from_fen("4k3/4p3/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white), -evaluate(&black));
        assert!(evaluate(&white) > 0);
    }

    #[test]
    fn test_terminal_scores() {
        // Back-rank mate, Black to move
        let mated = from_fen("3R2k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert_eq!(evaluate(&mated), MATE_SCORE);
        assert!(is_mate_score(evaluate(&mated)));

        let stalemate = from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(evaluate(&stalemate), 0);

        let fifty = from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 100 90").unwrap();
        assert_eq!(evaluate(&fifty), 0);
    }

    #[test]
    fn test_material_dominates() {
        let up_a_queen = from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(evaluate(&up_a_queen) > 800);
    }
}
