/// Pin detector

use shakmaty::{Bitboard, Board, Color, Role, Square};

use crate::board_utils::{is_ray_piece, slider_attacks};

/// Pin: the slider that just landed on `to` attacks an enemy piece which
/// alone shields the enemy king on the same line.
pub fn pin(board_after: &Board, to: Square, mover: Color) -> bool {
    let Some(piece) = board_after.piece_at(to) else {
        return false;
    };
    if !is_ray_piece(piece.role) {
        return false;
    }
    let Some(king) = board_after.king_of(!mover) else {
        return false;
    };

    let occupied = board_after.occupied();
    let attacks = slider_attacks(piece.role, to, occupied);
    if attacks.contains(king) {
        // Already a check, not a pin
        return false;
    }

    let shields = attacks & board_after.by_color(!mover);
    shields.into_iter().any(|shield| {
        if board_after.role_at(shield) == Some(Role::King) {
            return false;
        }
        let without_shield = occupied & !Bitboard::from_square(shield);
        slider_attacks(piece.role, to, without_shield).contains(king)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::rules::from_fen;
    use shakmaty::Position;

    #[test]
    fn test_bishop_pins_knight_to_king() {
        // Bb5 pins the c6 knight against the e8 king
        let pos = from_fen("r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3")
            .unwrap();
        // d7 pawn is in the way, so no pin yet
        assert!(!pin(pos.board(), Square::B5, Color::White));

        let pinned = from_fen("4k3/8/2n5/1B6/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(pin(pinned.board(), Square::B5, Color::White));
    }

    #[test]
    fn test_check_is_not_a_pin() {
        let check = from_fen("4k3/8/8/1B6/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(!pin(check.board(), Square::B5, Color::White));
    }

    #[test]
    fn test_knight_never_pins() {
        let pos = from_fen("4k3/8/2n5/8/8/8/8/1N2K3 b - - 0 1").unwrap();
        assert!(!pin(pos.board(), Square::B1, Color::White));
    }
}
