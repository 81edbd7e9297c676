use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move};

use crate::rules;

/// A game as handed over by the game source: raw move-list text plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// SAN move list, optionally wrapped in a full PGN with headers
    #[serde(alias = "pgn", alias = "moveList")]
    pub moves: String,
    #[serde(default, alias = "sourceUrl", alias = "link")]
    pub url: String,
}

impl GameRecord {
    pub fn new(moves: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            moves: moves.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHeaders {
    pub link: Option<String>,
    pub fen: Option<String>,
}

/// A parsed game: its start position and the legal moves played from it.
#[derive(Debug, Clone)]
pub struct GameHistory {
    pub start: Chess,
    pub moves: Vec<Move>,
}

impl GameHistory {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Walk the game, yielding `(ply index, position before the move, move)`.
    pub fn replay(&self) -> Replay<'_> {
        Replay {
            history: self,
            pos: Some(self.start.clone()),
            index: 0,
        }
    }
}

pub struct Replay<'a> {
    history: &'a GameHistory,
    pos: Option<Chess>,
    index: usize,
}

impl<'a> Iterator for Replay<'a> {
    type Item = (usize, Chess, &'a Move);

    fn next(&mut self) -> Option<Self::Item> {
        let mv = self.history.moves.get(self.index)?;
        let before = self.pos.take()?;
        // A history is built from legal moves only, so this only fails on a corrupted record
        self.pos = rules::apply(&before, mv).ok();
        let index = self.index;
        self.index += 1;
        Some((index, before, mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::load_move_list;

    #[test]
    fn test_game_record_aliases() {
        let json = r#"[{"pgn": "1. e4 e5", "link": "https://example.org/1"},
                       {"moves": "1. d4", "url": "https://example.org/2"},
                       {"moveList": "1. c4"}]"#;
        let games: Vec<GameRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(games[0].url, "https://example.org/1");
        assert_eq!(games[1].moves, "1. d4");
        assert_eq!(games[2].url, "");
    }

    #[test]
    fn test_replay_yields_position_before_each_move() {
        let history = load_move_list("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6").unwrap();
        let mut expected = history.start.clone();
        for (index, before, mv) in history.replay() {
            assert_eq!(rules::position_key(&before), rules::position_key(&expected), "ply {index}");
            expected = rules::apply(&expected, mv).unwrap();
        }
        assert_eq!(history.replay().count(), 6);
    }
}
