//! Depth-bounded minimax search with alpha-beta pruning.
//!
//! Scores are White-positive throughout: White nodes maximize, Black nodes
//! minimize. Each `Searcher` owns its transposition cache, so one searcher
//! must never be shared between threads.

pub mod cache;
pub mod ordering;
mod quiescence;

use std::iter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chess_core::rules::{self, MoveInfo};
use shakmaty::{Chess, Color, Move, Position};
use tracing::debug;

use self::cache::{Bound, CacheEntry, TranspositionCache};
use crate::config::EngineConfig;
use crate::error::WorkerError;
use crate::eval::{evaluate, is_mate_score, MATE_SCORE, MATE_THRESHOLD};

const INFINITY: i32 = MATE_SCORE + 1;

#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Principal variation from the searched position
    pub line: Vec<MoveInfo>,
    /// White-positive score, clamped to ±`MATE_SCORE`
    pub score: i32,
    pub nodes_searched: u64,
    pub depth: u8,
    /// The node ceiling or the stop flag cut this search short
    pub aborted: bool,
}

impl SearchResult {
    pub fn best_move(&self) -> Option<&MoveInfo> {
        self.line.first()
    }

    pub fn is_mate(&self) -> bool {
        is_mate_score(self.score)
    }
}

/// Score of a finished game, adjusted so nearer mates rank higher.
pub(crate) fn terminal_score(pos: &Chess, ply: u8) -> Option<i32> {
    if pos.is_checkmate() {
        let score = MATE_SCORE - i32::from(ply);
        return Some(pos.turn().fold_wb(-score, score));
    }
    if rules::is_draw(pos) {
        return Some(0);
    }
    None
}

// Cached mate scores are stored relative to the node, not the root
fn score_to_cache(score: i32, ply: u8) -> i32 {
    let ply = i32::from(ply);
    if score >= MATE_THRESHOLD {
        (score + ply).min(MATE_SCORE)
    } else if score <= -MATE_THRESHOLD {
        (score - ply).max(-MATE_SCORE)
    } else {
        score
    }
}

fn score_from_cache(score: i32, ply: u8) -> i32 {
    let ply = i32::from(ply);
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

pub struct Searcher {
    config: EngineConfig,
    cache: TranspositionCache,
    stop: Arc<AtomicBool>,
    nodes: u64,
    aborted: bool,
    /// Position keys from the root to the current node
    path: Vec<String>,
}

impl Searcher {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_stop_flag(config, Arc::new(AtomicBool::new(false)))
    }

    /// Searcher that unwinds as soon as `stop` is raised.
    pub fn with_stop_flag(config: EngineConfig, stop: Arc<AtomicBool>) -> Self {
        let cache = TranspositionCache::new(config.cache_capacity);
        Self {
            config,
            cache,
            stop,
            nodes: 0,
            aborted: false,
            path: Vec::new(),
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Rebuild the position from FEN and search it.
    pub fn search_fen(&mut self, fen: &str, depth: u8) -> Result<SearchResult, WorkerError> {
        let pos = rules::from_fen(fen).map_err(|e| WorkerError::InvalidPosition(e.to_string()))?;
        Ok(self.search(&pos, depth))
    }

    pub fn search(&mut self, pos: &Chess, depth: u8) -> SearchResult {
        self.nodes = 0;
        self.aborted = false;
        self.path.clear();

        let (score, line) = self.alpha_beta(pos, depth, 0, -INFINITY, INFINITY, false);
        let line = rules::describe_line(pos, &line);
        let score = score.clamp(-MATE_SCORE, MATE_SCORE);

        debug!(
            depth,
            score,
            nodes = self.nodes,
            aborted = self.aborted,
            best = line.first().map(|m| m.san.as_str()).unwrap_or("-"),
            "Search complete"
        );

        SearchResult {
            line,
            score,
            nodes_searched: self.nodes,
            depth,
            aborted: self.aborted,
        }
    }

    fn should_stop(&mut self) -> bool {
        if !self.aborted
            && (self.nodes > self.config.node_ceiling || self.stop.load(Ordering::Relaxed))
        {
            self.aborted = true;
        }
        self.aborted
    }

    fn alpha_beta(
        &mut self,
        pos: &Chess,
        depth: u8,
        ply: u8,
        mut alpha: i32,
        mut beta: i32,
        via_capture: bool,
    ) -> (i32, Vec<Move>) {
        self.nodes += 1;
        if self.should_stop() {
            return (evaluate(pos), Vec::new());
        }
        if let Some(score) = terminal_score(pos, ply) {
            return (score, Vec::new());
        }
        if depth == 0 {
            let score = if via_capture && self.config.quiescence {
                self.quiescence(pos, alpha, beta, self.config.quiescence_depth, ply)
            } else {
                evaluate(pos)
            };
            return (score, Vec::new());
        }

        let key = rules::position_key(pos);
        if ply > 0 && self.path.contains(&key) {
            return (0, Vec::new());
        }

        if ply > 0 {
            if let Some(entry) = self.cache.probe(&key, depth) {
                let score = score_from_cache(entry.score, ply);
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => score >= beta,
                    Bound::Upper => score <= alpha,
                };
                if usable {
                    return (score, self.principal_variation(pos, usize::from(depth)));
                }
            }
        }

        let mut moves = ordering::ordered_moves(pos);
        if depth > self.config.width_depth_threshold {
            moves.truncate(self.config.search_width);
        }

        let maximizing = pos.turn() == Color::White;
        let (alpha_in, beta_in) = (alpha, beta);
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_line: Vec<Move> = Vec::new();

        self.path.push(key);
        for mv in moves {
            let Ok(child) = rules::apply(pos, &mv) else {
                continue;
            };
            let via_capture = mv.is_capture();
            let (score, line) =
                self.alpha_beta(&child, depth - 1, ply.saturating_add(1), alpha, beta, via_capture);

            let improves = if maximizing {
                score > best_score
            } else {
                score < best_score
            };
            if improves {
                best_score = score;
                best_line = iter::once(mv).chain(line).collect();
            }
            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
            if beta <= alpha || self.aborted {
                break;
            }
        }
        let key = self.path.pop().unwrap_or_default();

        if best_line.is_empty() {
            return (evaluate(pos), Vec::new());
        }

        if !self.aborted {
            let bound = if best_score <= alpha_in {
                Bound::Upper
            } else if best_score >= beta_in {
                Bound::Lower
            } else {
                Bound::Exact
            };
            self.cache.store(
                key,
                CacheEntry {
                    score: score_to_cache(best_score, ply),
                    depth,
                    best_move: best_line.first().cloned(),
                    bound,
                },
            );
        }

        (best_score, best_line)
    }

    /// Follow cached best moves from `pos` for at most `max_len` plies.
    fn principal_variation(&self, pos: &Chess, max_len: usize) -> Vec<Move> {
        let mut line = Vec::new();
        let mut current = pos.clone();
        while line.len() < max_len {
            let Some(mv) = self
                .cache
                .get(&rules::position_key(&current))
                .and_then(|entry| entry.best_move.clone())
            else {
                break;
            };
            let Ok(next) = rules::apply(&current, &mv) else {
                break;
            };
            line.push(mv);
            current = next;
        }
        line
    }
}
