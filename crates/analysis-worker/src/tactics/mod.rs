/// Tactical classification: evaluation swing, motif detection and difficulty
/// for a played move plus the engine's continuation

pub mod attacks;
pub mod material;
pub mod pins;

use std::fmt;

use chess_core::rules;
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move, Position};

use crate::board_utils::material_diff;
use crate::config::TacticThresholds;
use crate::eval::evaluate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Motif {
    /// The move itself mates
    MateThreat,
    /// Check answered by a forced continuation
    Forcing,
    Fork,
    Pin,
    Sacrifice,
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Motif::MateThreat => "mateThreat",
            Motif::Forcing => "forcing",
            Motif::Fork => "fork",
            Motif::Pin => "pin",
            Motif::Sacrifice => "sacrifice",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_tactical: bool,
    pub motifs: Vec<Motif>,
    pub difficulty: Difficulty,
    /// |score after the line − score before the move|, centipawns
    pub eval_swing: i32,
    pub ends_in_mate: bool,
}

impl Classification {
    fn not_tactical() -> Self {
        Self {
            is_tactical: false,
            motifs: Vec::new(),
            difficulty: Difficulty::Easy,
            eval_swing: 0,
            ends_in_mate: false,
        }
    }
}

/// Classify `played` from `pos`, followed by the engine's `continuation`.
/// The continuation is replayed until its first illegal move.
pub fn classify(
    pos: &Chess,
    played: &Move,
    continuation: &[Move],
    thresholds: &TacticThresholds,
) -> Classification {
    let mover = pos.turn();
    let Ok(after_move) = rules::apply(pos, played) else {
        return Classification::not_tactical();
    };

    let mut balances = vec![
        material_diff(pos.board(), mover),
        material_diff(after_move.board(), mover),
    ];
    let mut end = after_move.clone();
    let mut replayed = 0;
    for mv in continuation {
        let Ok(next) = rules::apply(&end, mv) else {
            break;
        };
        end = next;
        balances.push(material_diff(end.board(), mover));
        replayed += 1;
    }

    let eval_swing = (evaluate(&end) - evaluate(pos)).abs();
    let ends_in_mate = end.is_checkmate();
    let gives_check = after_move.is_check();

    let mut motifs = Vec::new();
    if after_move.is_checkmate() {
        motifs.push(Motif::MateThreat);
    }
    if gives_check && replayed > 0 {
        motifs.push(Motif::Forcing);
    }
    if attacks::fork(after_move.board(), played.to(), mover) {
        motifs.push(Motif::Fork);
    }
    if pins::pin(after_move.board(), played.to(), mover) {
        motifs.push(Motif::Pin);
    }
    if material::sacrifice(&balances, thresholds.sacrifice_margin, ends_in_mate) {
        motifs.push(Motif::Sacrifice);
    }

    let is_tactical = !motifs.is_empty()
        || eval_swing > thresholds.tactical_swing
        || (gives_check && eval_swing > thresholds.check_swing)
        || (played.is_capture() && eval_swing > thresholds.capture_swing)
        || ends_in_mate;

    let difficulty = if eval_swing > thresholds.hard_swing
        || motifs.contains(&Motif::MateThreat)
        || ends_in_mate
    {
        Difficulty::Hard
    } else if eval_swing > thresholds.medium_swing || motifs.len() > 1 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    };

    Classification {
        is_tactical,
        motifs,
        difficulty,
        eval_swing,
        ends_in_mate,
    }
}
