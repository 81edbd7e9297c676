/// Tactic output records and balanced selection

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tactics::{Difficulty, Motif};

/// One training puzzle, ready for JSON output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tactic {
    /// Position before the solver's first move
    pub fen: String,
    /// Solution line in SAN, solver's move first
    pub solution: Vec<String>,
    pub solution_uci: Vec<String>,
    pub difficulty: Difficulty,
    pub source_url: String,
    /// Evaluation swing of the line, centipawns
    pub eval_magnitude: i32,
    pub patterns: Vec<Motif>,
    pub solver_is_white: bool,
    pub game_index: usize,
    pub ply_index: usize,
}

/// Rank by descending magnitude (stable, so ties keep discovery order) and
/// fill each difficulty tier up to `per_tier_cap` until `max_total` are kept.
pub fn select_balanced(mut tactics: Vec<Tactic>, per_tier_cap: usize, max_total: usize) -> Vec<Tactic> {
    tactics.sort_by(|a, b| b.eval_magnitude.cmp(&a.eval_magnitude));

    let mut per_tier: HashMap<Difficulty, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(max_total.min(tactics.len()));
    for tactic in tactics {
        if selected.len() >= max_total {
            break;
        }
        let count = per_tier.entry(tactic.difficulty).or_default();
        if *count >= per_tier_cap {
            continue;
        }
        *count += 1;
        selected.push(tactic);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tactic(difficulty: Difficulty, eval_magnitude: i32, game_index: usize) -> Tactic {
        Tactic {
            fen: String::new(),
            solution: vec!["Qg8+".into(), "Rxg8".into()],
            solution_uci: vec!["c4g8".into(), "f8g8".into()],
            difficulty,
            source_url: String::new(),
            eval_magnitude,
            patterns: Vec::new(),
            solver_is_white: true,
            game_index,
            ply_index: 0,
        }
    }

    #[test]
    fn test_quota_limits_each_tier_and_total() {
        let mut pool = Vec::new();
        for i in 0..6 {
            pool.push(tactic(Difficulty::Easy, 200 + i, i as usize));
            pool.push(tactic(Difficulty::Medium, 400 + i, i as usize));
            pool.push(tactic(Difficulty::Hard, 900 + i, i as usize));
        }
        let selected = select_balanced(pool, 4, 10);

        assert_eq!(selected.len(), 10);
        for tier in Difficulty::ALL {
            assert!(selected.iter().filter(|t| t.difficulty == tier).count() <= 4);
        }
        assert!(selected
            .windows(2)
            .all(|pair| pair[0].eval_magnitude >= pair[1].eval_magnitude));
        // 4 hard + 4 medium fill first, then the two strongest easy ones
        assert_eq!(selected.iter().filter(|t| t.difficulty == Difficulty::Easy).count(), 2);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let pool = vec![
            tactic(Difficulty::Hard, 500, 0),
            tactic(Difficulty::Hard, 500, 1),
            tactic(Difficulty::Hard, 700, 2),
        ];
        let selected = select_balanced(pool, 4, 10);
        let order: Vec<usize> = selected.iter().map(|t| t.game_index).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(tactic(Difficulty::Medium, 420, 3)).unwrap();
        assert_eq!(json["difficulty"], "medium");
        assert_eq!(json["evalMagnitude"], 420);
        assert_eq!(json["solverIsWhite"], true);
        assert_eq!(json["solutionUci"][0], "c4g8");
    }
}
