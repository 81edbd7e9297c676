//! Thin adapter over `shakmaty` exposing exactly the rules-engine operations
//! the analysis pipeline relies on.

use shakmaty::fen::{Epd, Fen};
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position, Role, Square};

use crate::error::ChessCoreError;

/// Halfmove clock value at which the fifty-move rule applies
const FIFTY_MOVE_PLIES: u32 = 100;

/// A move in both notations, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    /// SAN including the `+`/`#` suffix
    pub san: String,
    pub uci: String,
}

/// What move ordering needs to know about a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveMeta {
    pub role: Role,
    pub capture: Option<Role>,
    pub promotion: Option<Role>,
    pub to: Square,
    pub gives_check: bool,
}

/// Position notation used for deduplication and cache keys.
/// EPD drops the move counters so transpositions reached at different
/// move numbers share a key.
pub fn position_key(pos: &Chess) -> String {
    Epd::from_position(pos, EnPassantMode::Legal).to_string()
}

pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

pub fn from_fen(fen: &str) -> Result<Chess, ChessCoreError> {
    let invalid = |reason: String| ChessCoreError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// Play a move on a copy of `pos`. The original is never touched.
pub fn apply(pos: &Chess, mv: &Move) -> Result<Chess, ChessCoreError> {
    pos.clone()
        .play(mv.clone())
        .map_err(|_| ChessCoreError::IllegalMove(mv.to_uci(CastlingMode::Standard).to_string()))
}

/// Any drawing condition the position itself can show: stalemate,
/// insufficient material or the fifty-move rule. Repetition depends on
/// history and is tracked by callers.
pub fn is_draw(pos: &Chess) -> bool {
    pos.is_stalemate() || pos.is_insufficient_material() || pos.halfmoves() >= FIFTY_MOVE_PLIES
}

pub fn gives_check(pos: &Chess, mv: &Move) -> bool {
    apply(pos, mv).map(|after| after.is_check()).unwrap_or(false)
}

pub fn uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

pub fn parse_uci(pos: &Chess, text: &str) -> Result<Move, ChessCoreError> {
    let invalid = |reason: String| ChessCoreError::InvalidUci {
        uci: text.to_string(),
        reason,
    };
    let parsed: UciMove = text.parse().map_err(|e| invalid(format!("{e}")))?;
    parsed.to_move(pos).map_err(|e| invalid(format!("{e}")))
}

/// Describe `mv` as played from `pos`. Fails if `mv` is illegal there.
pub fn move_info(pos: &Chess, mv: &Move) -> Result<MoveInfo, ChessCoreError> {
    if !pos.is_legal(*mv) {
        return Err(ChessCoreError::IllegalMove(uci(mv)));
    }
    Ok(MoveInfo {
        san: SanPlus::from_move(pos.clone(), *mv).to_string(),
        uci: uci(mv),
    })
}

/// Ordering metadata for `mv` played from `pos`.
pub fn move_meta(pos: &Chess, mv: &Move) -> MoveMeta {
    MoveMeta {
        role: mv.role(),
        capture: mv.capture(),
        promotion: mv.promotion(),
        to: mv.to(),
        gives_check: gives_check(pos, mv),
    }
}

/// Describe a whole line, stopping at the first move that is illegal in the
/// position reached so far.
pub fn describe_line(start: &Chess, line: &[Move]) -> Vec<MoveInfo> {
    let mut pos = start.clone();
    let mut out = Vec::with_capacity(line.len());
    for mv in line {
        let Ok(info) = move_info(&pos, mv) else { break };
        let Ok(next) = apply(&pos, mv) else { break };
        out.push(info);
        pos = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_key_ignores_move_counters() {
        let a = from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let b = from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 4 9").unwrap();
        assert_eq!(position_key(&a), position_key(&b));
        assert_ne!(fen(&a), fen(&b));
    }

    #[test]
    fn test_move_info_marks_check_and_mate() {
        let pos = from_fen("5r1k/6pp/7N/8/2Q5/8/5PPP/6K1 w - - 0 14").unwrap();
        let mv = parse_uci(&pos, "c4g8").unwrap();
        let info = move_info(&pos, &mv).unwrap();
        assert_eq!(info.san, "Qg8+");
        assert_eq!(info.uci, "c4g8");

        let after = apply(&pos, &mv).unwrap();
        let reply = parse_uci(&after, "f8g8").unwrap();
        assert_eq!(move_info(&after, &reply).unwrap().san, "Rxg8");
        let after = apply(&after, &reply).unwrap();
        let mate = parse_uci(&after, "h6f7").unwrap();
        assert_eq!(move_info(&after, &mate).unwrap().san, "Nf7#");

        // The same move is not legal once it has been played
        assert!(move_info(&after, &reply).is_err());
    }

    #[test]
    fn test_move_meta() {
        let pos = from_fen("5r1k/6pp/7N/8/2Q5/8/5PPP/6K1 w - - 0 14").unwrap();
        let check = move_meta(&pos, &parse_uci(&pos, "c4g8").unwrap());
        assert_eq!(check.role, Role::Queen);
        assert_eq!(check.to, Square::G8);
        assert!(check.gives_check);
        assert_eq!(check.capture, None);

        let capture = move_meta(&pos, &parse_uci(&pos, "h6g8").unwrap());
        assert!(!capture.gives_check);
        assert_eq!(capture.capture, None);

        let promo = from_fen("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let meta = move_meta(&promo, &parse_uci(&promo, "a7b8q").unwrap());
        assert_eq!(meta.capture, Some(Role::Rook));
        assert_eq!(meta.promotion, Some(Role::Queen));
        assert!(meta.gives_check);
    }

    #[test]
    fn test_draw_conditions() {
        let stalemate = from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(is_draw(&stalemate));

        let bare_kings = from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
        assert!(is_draw(&bare_kings));

        let fifty = from_fen("8/8/4k3/3p4/3P4/4K3/8/8 w - - 100 80").unwrap();
        assert!(is_draw(&fifty));

        let blocked = from_fen("8/8/4k3/3p4/3P4/4K3/8/8 w - - 0 30").unwrap();
        assert!(!is_draw(&blocked));
    }

    #[test]
    fn test_describe_line_stops_at_illegal_move() {
        let pos = Chess::default();
        let e4 = parse_uci(&pos, "e2e4").unwrap();
        let after = apply(&pos, &e4).unwrap();
        let e5 = parse_uci(&after, "e7e5").unwrap();
        // Playing e4 twice is illegal on the third ply
        let line = vec![e4.clone(), e5, e4];
        let described = describe_line(&pos, &line);
        assert_eq!(described.len(), 2);
        assert_eq!(described[0].uci, "e2e4");
    }
}
