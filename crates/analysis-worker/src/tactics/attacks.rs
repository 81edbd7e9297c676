/// Attack-based detectors: fork

use shakmaty::{Board, Color, Role, Square};

use crate::board_utils::attacked_opponent_squares;

/// Fork: the piece that just landed on `to` attacks two or more enemy
/// knights, bishops, rooks, queens or the king.
pub fn fork(board_after: &Board, to: Square, mover: Color) -> bool {
    attacked_opponent_squares(board_after, to, mover)
        .into_iter()
        .filter(|(role, _)| *role != Role::Pawn)
        .count()
        >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::rules::from_fen;
    use shakmaty::Position;

    #[test]
    fn test_knight_forks_king_and_rook() {
        let pos = from_fen("r3k3/2N5/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(fork(pos.board(), Square::C7, Color::White));
    }

    #[test]
    fn test_pawns_do_not_count() {
        // Knight on d5 hits the c7 and e7 pawns only
        let pos = from_fen("4k3/2p1p3/8/3N4/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(!fork(pos.board(), Square::D5, Color::White));
    }
}
