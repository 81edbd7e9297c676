//! Move-list loading: a lightweight regex-based PGN reader.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Position};

use crate::error::ChessCoreError;
use crate::game_data::{GameHeaders, GameHistory, GameRecord};
use crate::rules;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"));
static ANY_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("header strip regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?")
        .expect("move regex")
});
static EVENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[Event\s").expect("event regex"));

/// Read the tag pairs we care about.
pub fn parse_headers(pgn: &str) -> GameHeaders {
    let mut headers = GameHeaders::default();
    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "Link" => headers.link = Some(value),
            "Site" if headers.link.is_none() && value.starts_with("http") => {
                headers.link = Some(value)
            }
            "FEN" => headers.fen = Some(value),
            _ => {}
        }
    }
    headers
}

/// Extract SAN tokens from PGN text (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = ANY_HEADER_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");

    // Strip innermost variations until none are left so nested ones go too
    let mut text = no_comments.into_owned();
    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, "").into_owned();
    }

    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse a move list into a legal game history.
/// Honors a `[FEN]` header; otherwise starts from the standard position.
pub fn load_move_list(text: &str) -> Result<GameHistory, ChessCoreError> {
    let headers = parse_headers(text);
    let start = match headers.fen.as_deref() {
        Some(fen) => rules::from_fen(fen)?,
        None => Chess::default(),
    };

    let tokens = extract_moves(text);
    if tokens.is_empty() {
        return Err(ChessCoreError::EmptyGame);
    }

    let mut pos = start.clone();
    let mut moves = Vec::with_capacity(tokens.len());
    for (ply, token) in tokens.into_iter().enumerate() {
        let invalid = |reason: String| ChessCoreError::InvalidSan {
            ply,
            san: token.clone(),
            reason,
        };
        let san: SanPlus = token.parse().map_err(|e| invalid(format!("{e}")))?;
        let mv = san.san.to_move(&pos).map_err(|e| invalid(format!("{e}")))?;
        pos = rules::apply(&pos, &mv)?;
        moves.push(mv);
        if pos.is_game_over() {
            break;
        }
    }

    Ok(GameHistory { start, moves })
}

/// Split a multi-game PGN file into game records. Text without `[Event`
/// tags is treated as a single game.
pub fn split_games(text: &str) -> Vec<GameRecord> {
    let starts: Vec<usize> = EVENT_RE.find_iter(text).map(|m| m.start()).collect();
    let chunks: Vec<&str> = if starts.is_empty() {
        vec![text]
    } else {
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                &text[start..end]
            })
            .collect()
    };

    chunks
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| {
            let url = parse_headers(chunk).link.unwrap_or_default();
            GameRecord::new(chunk.trim(), url)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_moves_strips_noise() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]

1. e4 {best by test} e5 2. Nf3 (2. f4 exf4 (2... d5)) Nc6 3. O-O-O?? 1-0"#;
        let moves = extract_moves(pgn);
        assert_eq!(moves, vec!["e4", "e5", "Nf3", "Nc6", "O-O-O"]);
    }

    #[test]
    fn test_load_move_list_basic() {
        let history = load_move_list("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7").unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(rules::uci(&history.moves[8]), "e1g1");
    }

    #[test]
    fn test_load_move_list_with_fen_header() {
        let pgn = r#"[SetUp "1"]
[FEN "5r1k/6pp/7N/8/2Q5/8/5PPP/6K1 w - - 0 14"]

14. Qg8+ Rxg8 15. Nf7#"#;
        let history = load_move_list(pgn).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.start.fullmoves().get(), 14);
    }

    #[test]
    fn test_load_move_list_rejects_illegal() {
        let err = load_move_list("1. e4 e5 2. Ke3").unwrap_err();
        assert!(matches!(err, ChessCoreError::InvalidSan { ply: 2, .. }));
        assert_eq!(load_move_list("1-0").unwrap_err(), ChessCoreError::EmptyGame);
    }

    #[test]
    fn test_split_games_reads_link() {
        let text = r#"[Event "Live Chess"]
[Link "https://example.org/game/1"]

1. e4 e5 1-0

[Event "Live Chess"]
[Site "https://example.org/game/2"]

1. d4 d5 0-1
"#;
        let games = split_games(text);
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].url, "https://example.org/game/1");
        assert_eq!(games[1].url, "https://example.org/game/2");
        assert!(games[1].moves.contains("1. d4 d5"));
    }
}
