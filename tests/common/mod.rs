#![allow(dead_code)]

use analysis_worker::config::{EngineConfig, PipelineConfig};
use analysis_worker::{TacticPipeline, WorkerPool};
use chess_core::GameRecord;

/// Queen sacrifice into a smothered mate, played at move 14.
pub const SMOTHERED_MATE_GAME: &str = r#"[Event "Club game"]
[White "Attacker"]
[Black "Defender"]
[Result "1-0"]
[SetUp "1"]
[FEN "5r1k/6pp/7N/8/2Q5/8/5PPP/6K1 w - - 0 14"]

14. Qg8+ Rxg8 15. Nf7# 1-0"#;

pub const SMOTHERED_MATE_FEN: &str = "5r1k/6pp/7N/8/2Q5/8/5PPP/6K1 w - - 0 14";

/// The same combination with an extra a-pawn, so a distinct position.
pub const SMOTHERED_MATE_PAWN_GAME: &str = r#"[Event "Club game"]
[SetUp "1"]
[FEN "5r1k/6pp/7N/8/2Q5/8/P4PPP/6K1 w - - 0 14"]

14. Qg8+ Rxg8 15. Nf7# 1-0"#;

/// Blocked pawns, kings shuffling.
pub const QUIET_GAME: &str = r#"[SetUp "1"]
[FEN "8/8/4k3/3p4/3P4/4K3/8/8 w - - 0 30"]

30. Ke2 Ke7 31. Ke3 Ke6 32. Ke2 Ke7 33. Ke3 Ke6 34. Ke2 Ke7 1/2-1/2"#;

pub fn game(moves: &str, url: &str) -> GameRecord {
    GameRecord::new(moves, url)
}

/// Small pool with default engine tuning.
pub fn pool(workers: usize) -> WorkerPool {
    WorkerPool::new(workers, EngineConfig::default()).unwrap()
}

pub fn pipeline(workers: usize) -> TacticPipeline {
    pipeline_with(workers, PipelineConfig::default())
}

pub fn pipeline_with(workers: usize, config: PipelineConfig) -> TacticPipeline {
    TacticPipeline::new(pool(workers), config)
}
