//! Tactic pipeline: games in, ranked puzzles out.
//!
//! Candidate discovery and result handling run on the caller's task; only
//! the searches themselves go to the worker pool. Results are consumed in
//! candidate order, whatever order the executors finish in.

use std::collections::HashSet;

use chess_core::pgn::{self, load_move_list};
use chess_core::rules;
use chess_core::GameRecord;
use futures::future::join_all;
use serde::Serialize;
use shakmaty::{Chess, Color, Move, Position};
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, WorkerConfig};
use crate::error::WorkerError;
use crate::pool::WorkerPool;
use crate::puzzle::{select_balanced, Tactic};
use crate::search::SearchResult;
use crate::tactics::classify;

const PROGRESS_DISCOVERED: u8 = 10;
const PROGRESS_ANALYZED: u8 = 80;
const PROGRESS_FILTERING: u8 = 85;

/// A position worth asking the engine about.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub position: Chess,
    pub fen: String,
    pub played: Move,
    /// SAN of the played move, with check suffix
    pub played_san: String,
    pub game_index: usize,
    pub url: String,
    /// Ply index of the played move within its game
    pub ply_index: usize,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<Candidate>,
    pub games_skipped: usize,
    pub duplicates_skipped: usize,
}

/// Read a games file: a JSON array of game records, or PGN text with one
/// or more games. Text that opens like JSON must parse as JSON.
pub fn parse_games(text: &str) -> Result<Vec<GameRecord>, WorkerError> {
    if looks_like_json(text) {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(pgn::split_games(text))
    }
}

// A PGN tag pair also opens with `[`, but never with `[{`, `[]` or `["`
fn looks_like_json(text: &str) -> bool {
    let mut chars = text.trim_start().chars();
    match chars.next() {
        Some('{') => true,
        Some('[') => matches!(
            chars.find(|c| !c.is_whitespace()),
            Some('{' | ']' | '"') | None
        ),
        _ => false,
    }
}

/// Replay every game and keep the positions outside the opening horizon and
/// the final plies, first occurrence of each position only.
pub fn collect_candidates(games: &[GameRecord], config: &PipelineConfig) -> Discovery {
    let mut discovery = Discovery::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (game_index, game) in games.iter().enumerate() {
        let history = match load_move_list(&game.moves) {
            Ok(history) => history,
            Err(e) => {
                warn!(game_index, url = %game.url, error = %e, "Skipping unreadable game");
                discovery.games_skipped += 1;
                continue;
            }
        };

        let len = history.len();
        for (ply_index, position, played) in history.replay() {
            if position.fullmoves().get() <= config.opening_horizon {
                continue;
            }
            if ply_index + config.tail_exclusion >= len {
                break;
            }
            if !seen.insert(rules::position_key(&position)) {
                discovery.duplicates_skipped += 1;
                continue;
            }
            let played_san = match rules::move_info(&position, played) {
                Ok(info) => info.san,
                Err(e) => {
                    warn!(game_index, ply_index, error = %e, "Unplayable move in replay");
                    break;
                }
            };
            discovery.candidates.push(Candidate {
                fen: rules::fen(&position),
                position,
                played: played.clone(),
                played_san,
                game_index,
                url: game.url.clone(),
                ply_index,
            });
        }
    }

    discovery
}

/// Outcome of a pipeline run: the selected tactics plus counters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub tactics: Vec<Tactic>,
    pub games_total: usize,
    pub games_skipped: usize,
    pub candidates: usize,
    pub duplicates_skipped: usize,
    pub analyses_failed: usize,
    pub engine_matches: usize,
    pub accepted: usize,
    pub status: String,
}

/// Keeps reported percentages from ever going backwards.
struct Progress<F> {
    sink: F,
    last: u8,
}

impl<F: FnMut(u8, &str)> Progress<F> {
    fn report(&mut self, percent: u8, status: &str) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        debug!(percent, status, "Progress");
        (self.sink)(percent, status);
    }
}

pub struct TacticPipeline {
    pool: WorkerPool,
    config: PipelineConfig,
}

impl TacticPipeline {
    pub fn new(pool: WorkerPool, config: PipelineConfig) -> Self {
        Self { pool, config }
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, WorkerError> {
        Ok(Self::new(WorkerPool::from_config(config)?, config.pipeline.clone()))
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyze `games` at `depth` and return the selected tactics.
    pub async fn generate<F>(&self, games: &[GameRecord], depth: u8, on_progress: F) -> Vec<Tactic>
    where
        F: FnMut(u8, &str),
    {
        self.generate_report(games, depth, on_progress).await.tactics
    }

    /// Like [`generate`](Self::generate), with run counters and a final status line.
    pub async fn generate_report<F>(&self, games: &[GameRecord], depth: u8, on_progress: F) -> PipelineReport
    where
        F: FnMut(u8, &str),
    {
        let mut progress = Progress {
            sink: on_progress,
            last: 0,
        };
        progress.report(0, "Scanning games for candidate positions");

        let discovery = collect_candidates(games, &self.config);
        let mut report = PipelineReport {
            games_total: games.len(),
            games_skipped: discovery.games_skipped,
            candidates: discovery.candidates.len(),
            duplicates_skipped: discovery.duplicates_skipped,
            ..PipelineReport::default()
        };
        progress.report(
            PROGRESS_DISCOVERED,
            &format!(
                "Found {} candidate positions in {} games",
                report.candidates, report.games_total
            ),
        );

        if discovery.candidates.is_empty() {
            report.status = format!(
                "No candidate positions in {} games ({} unreadable)",
                report.games_total, report.games_skipped
            );
            progress.report(100, &report.status);
            return report;
        }

        let batch_size = self.config.batch_size.max(1);
        let total_batches = discovery.candidates.len().div_ceil(batch_size);
        let mut found: Vec<Tactic> = Vec::new();

        for (batch_index, batch) in discovery.candidates.chunks(batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let analyses = batch.iter().map(|candidate| {
                self.pool
                    .analyze_with_timeout(candidate.fen.clone(), depth, self.config.analysis_timeout)
            });
            let results = join_all(analyses).await;

            for (candidate, result) in batch.iter().zip(results) {
                match result {
                    Ok(search) => {
                        if let Some(tactic) = self.examine(candidate, &search, &mut report) {
                            found.push(tactic);
                        }
                    }
                    Err(e) => {
                        report.analyses_failed += 1;
                        warn!(
                            game_index = candidate.game_index,
                            ply_index = candidate.ply_index,
                            error = %e,
                            "Analysis failed"
                        );
                    }
                }
            }

            let done = batch_index + 1;
            let span = usize::from(PROGRESS_ANALYZED - PROGRESS_DISCOVERED);
            let percent = PROGRESS_DISCOVERED + (span * done / total_batches) as u8;
            progress.report(
                percent,
                &format!("Analyzed batch {done}/{total_batches}, {} tactics so far", found.len()),
            );
        }

        report.accepted = found.len();
        progress.report(
            PROGRESS_FILTERING,
            &format!("Selecting from {} tactics", report.accepted),
        );

        report.tactics = select_balanced(found, self.config.per_tier_cap, self.config.max_tactics);
        report.status = format!(
            "Generated {} tactics from {} games ({} candidates, {} engine matches, {} failed analyses)",
            report.tactics.len(),
            report.games_total,
            report.candidates,
            report.engine_matches,
            report.analyses_failed
        );
        progress.report(100, &report.status);
        report
    }

    /// Turn one engine result into a tactic if the game move matches the
    /// engine's choice and the line is tactical enough.
    fn examine(&self, candidate: &Candidate, search: &SearchResult, report: &mut PipelineReport) -> Option<Tactic> {
        let best = search.best_move()?;
        if best.san != candidate.played_san {
            return None;
        }
        report.engine_matches += 1;

        let line = engine_line(&candidate.position, search);
        if line.is_empty() {
            return None;
        }

        let thresholds = &self.config.thresholds;
        let classification = classify(&candidate.position, &candidate.played, &line[1..], thresholds);
        if !classification.is_tactical || classification.eval_swing <= thresholds.min_accept_swing {
            debug!(
                game_index = candidate.game_index,
                ply_index = candidate.ply_index,
                swing = classification.eval_swing,
                "Engine match below tactic bar"
            );
            return None;
        }

        let solution_len = line.len().min(self.config.max_solution_len);
        let solution = rules::describe_line(&candidate.position, &line[..solution_len]);
        if solution.len() < self.config.min_solution_len {
            return None;
        }

        info!(
            game_index = candidate.game_index,
            ply_index = candidate.ply_index,
            san = %candidate.played_san,
            swing = classification.eval_swing,
            difficulty = %classification.difficulty,
            "Tactic found"
        );

        Some(Tactic {
            fen: candidate.fen.clone(),
            solution: solution.iter().map(|m| m.san.clone()).collect(),
            solution_uci: solution.iter().map(|m| m.uci.clone()).collect(),
            difficulty: classification.difficulty,
            source_url: candidate.url.clone(),
            eval_magnitude: classification.eval_swing,
            patterns: classification.motifs,
            solver_is_white: candidate.position.turn() == Color::White,
            game_index: candidate.game_index,
            ply_index: candidate.ply_index,
        })
    }
}

/// Rebuild the engine's line as moves from `start`, stopping at the first
/// move that does not apply.
fn engine_line(start: &Chess, search: &SearchResult) -> Vec<Move> {
    let mut pos = start.clone();
    let mut line = Vec::with_capacity(search.line.len());
    for info in &search.line {
        let Ok(mv) = rules::parse_uci(&pos, &info.uci) else {
            break;
        };
        let Ok(next) = rules::apply(&pos, &mv) else {
            break;
        };
        line.push(mv);
        pos = next;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_config() -> PipelineConfig {
        PipelineConfig {
            opening_horizon: 0,
            tail_exclusion: 0,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_collect_candidates_dedups_across_games() {
        let games = vec![
            GameRecord::new("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. c3 Nf6", "g1"),
            GameRecord::new("1. d4 d5 2. c4 e6", "g2"),
            GameRecord::new("1. Nf3 Nc6 2. e4 e5 3. Bc4 Bc5 4. O-O Nf6", "g3"),
        ];
        let discovery = collect_candidates(&games, &open_config());

        assert_eq!(discovery.candidates.len(), 15);
        assert_eq!(discovery.duplicates_skipped, 5);
        let third: Vec<usize> = discovery
            .candidates
            .iter()
            .filter(|c| c.game_index == 2)
            .map(|c| c.ply_index)
            .collect();
        assert_eq!(third, vec![1, 2, 3, 7]);
        assert_eq!(discovery.candidates[0].url, "g1");
    }

    #[test]
    fn test_horizon_and_tail_exclusion() {
        let games = vec![GameRecord::new(
            "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. c3 Nf6 5. d4 exd4 6. cxd4 Bb4+ 7. Nc3 Nxe4",
            "",
        )];
        let config = PipelineConfig {
            opening_horizon: 5,
            tail_exclusion: 2,
            ..PipelineConfig::default()
        };
        let discovery = collect_candidates(&games, &config);
        // Fullmove 6 and 7 positions, minus the final two plies
        let plies: Vec<usize> = discovery.candidates.iter().map(|c| c.ply_index).collect();
        assert_eq!(plies, vec![10, 11]);
        assert_eq!(discovery.candidates[0].played_san, "cxd4");
        assert_eq!(discovery.candidates[1].played_san, "Bb4+");
    }

    #[test]
    fn test_unreadable_game_is_skipped() {
        let games = vec![
            GameRecord::new("1. e4 e5 2. Ke3", ""),
            GameRecord::new("1. e4 e5", ""),
        ];
        let discovery = collect_candidates(&games, &open_config());
        assert_eq!(discovery.games_skipped, 1);
        assert_eq!(discovery.candidates.len(), 2);
        assert!(discovery.candidates.iter().all(|c| c.game_index == 1));
    }

    #[test]
    fn test_parse_games_json_and_pgn() {
        let json = r#"[ {"pgn": "1. e4 e5", "link": "https://example.org/1"} ]"#;
        let games = parse_games(json).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].url, "https://example.org/1");

        let pgn_text = "[Event \"Casual\"]\n[Link \"https://example.org/2\"]\n\n1. d4 d5 1-0\n";
        let games = parse_games(pgn_text).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].url, "https://example.org/2");

        let bare = parse_games("1. e4 e5 2. Nf3").unwrap();
        assert_eq!(bare.len(), 1);
        assert!(parse_games("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let broken = r#"[{"pgn": "1. e4 e5", "link": }]"#;
        assert!(matches!(parse_games(broken), Err(WorkerError::Json(_))));
        assert!(matches!(parse_games("{\"pgn\": 3}"), Err(WorkerError::Json(_))));
    }

    #[test]
    fn test_progress_never_goes_backwards() {
        let mut seen = Vec::new();
        {
            let mut progress = Progress {
                sink: |percent: u8, _: &str| seen.push(percent),
                last: 0,
            };
            progress.report(10, "a");
            progress.report(5, "b");
            progress.report(120, "c");
        }
        assert_eq!(seen, vec![10, 10, 100]);
    }
}
