/// Board utility functions for evaluation and tactical analysis

use shakmaty::attacks::{bishop_attacks, queen_attacks, rook_attacks};
use shakmaty::{Bitboard, Board, Color, Role, Square};

// Piece values for material calculation (centipawns)
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Piece value (no king)
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => 0,
    }
}

/// Is this a ray (sliding) piece type?
pub fn is_ray_piece(role: Role) -> bool {
    matches!(role, Role::Queen | Role::Rook | Role::Bishop)
}

/// Count material for one side
pub fn material_count(board: &Board, color: Color) -> i32 {
    let color_bb = board.by_color(color);
    Role::ALL
        .iter()
        .map(|&role| (board.by_role(role) & color_bb).count() as i32 * piece_value(role))
        .sum()
}

/// Material difference (positive = side has more)
pub fn material_diff(board: &Board, side: Color) -> i32 {
    material_count(board, side) - material_count(board, !side)
}

/// Opponent pieces attacked from a square, as (role, square) pairs
pub fn attacked_opponent_squares(board: &Board, from: Square, pov: Color) -> Vec<(Role, Square)> {
    let enemies = board.by_color(!pov);
    (board.attacks_from(from) & enemies)
        .into_iter()
        .filter_map(|sq| board.piece_at(sq).map(|piece| (piece.role, sq)))
        .collect()
}

/// Squares a slider on `square` reaches given the occupancy
pub fn slider_attacks(role: Role, square: Square, occupied: Bitboard) -> Bitboard {
    match role {
        Role::Bishop => bishop_attacks(square, occupied),
        Role::Rook => rook_attacks(square, occupied),
        Role::Queen => queen_attacks(square, occupied),
        _ => Bitboard::EMPTY,
    }
}

/// Is the square one of the four central squares d4, e4, d5, e5?
pub fn is_central(square: Square) -> bool {
    matches!(square, Square::D4 | Square::E4 | Square::D5 | Square::E5)
}

/// Pawns beyond the first on each file, summed over files
pub fn doubled_pawns(board: &Board, color: Color) -> i32 {
    let pawns = board.by_role(Role::Pawn) & board.by_color(color);
    let mut per_file = [0i32; 8];
    for sq in pawns {
        per_file[sq.file() as usize] += 1;
    }
    per_file.iter().map(|&n| (n - 1).max(0)).sum()
}
