//! Worker configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::WorkerError;

/// Engine-wide ceiling on nodes visited by a single search
pub const NODE_CEILING: u64 = 400_000;

/// Default search depth in plies
pub const DEFAULT_DEPTH: u8 = 3;

/// Search engine tuning. Every executor builds its own searcher from a clone.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Top-K moves searched at nodes deeper than `width_depth_threshold`
    pub search_width: usize,

    /// Remaining depth above which the width cap applies
    pub width_depth_threshold: u8,

    /// Transposition cache capacity (entries)
    pub cache_capacity: usize,

    /// Node ceiling per search
    pub node_ceiling: u64,

    /// Extend capture leaves with a quiescence search
    pub quiescence: bool,

    /// Maximum quiescence plies
    pub quiescence_depth: u8,

    /// Keep the transposition cache between tasks on the same executor.
    /// Off by default so a result never depends on which executor ran it.
    pub retain_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_width: 12,
            width_depth_threshold: 2,
            cache_capacity: 200_000,
            node_ceiling: NODE_CEILING,
            quiescence: true,
            quiescence_depth: 4,
            retain_cache: false,
        }
    }
}

/// Evaluation-swing cutoffs (centipawns) used to accept and grade tactics
#[derive(Clone, Debug)]
pub struct TacticThresholds {
    /// Swing a classified tactic must exceed to be kept at all
    pub min_accept_swing: i32,
    /// Swing that makes any move tactical on its own
    pub tactical_swing: i32,
    /// Lower bar for checking moves
    pub check_swing: i32,
    /// Lower bar for captures
    pub capture_swing: i32,
    pub medium_swing: i32,
    pub hard_swing: i32,
    /// Material (centipawns) a sacrifice must give up and later regain
    pub sacrifice_margin: i32,
}

impl Default for TacticThresholds {
    fn default() -> Self {
        Self {
            min_accept_swing: 150,
            tactical_swing: 250,
            check_swing: 120,
            capture_swing: 150,
            medium_swing: 350,
            hard_swing: 700,
            sacrifice_margin: 200,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Positions up to and including this fullmove number are skipped
    pub opening_horizon: u32,

    /// Number of final plies of each game that are never candidates
    pub tail_exclusion: usize,

    /// Candidates submitted to the pool per batch
    pub batch_size: usize,

    /// Pause between batches
    pub batch_delay: Duration,

    /// Wall-clock budget for a single analysis
    pub analysis_timeout: Duration,

    pub max_solution_len: usize,
    pub min_solution_len: usize,

    /// Tactics kept per difficulty tier
    pub per_tier_cap: usize,

    /// Tactics kept overall
    pub max_tactics: usize,

    pub thresholds: TacticThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            opening_horizon: 5,
            tail_exclusion: 2,
            batch_size: 16,
            batch_delay: Duration::from_millis(25),
            analysis_timeout: Duration::from_secs(30),
            max_solution_len: 5,
            min_solution_len: 2,
            per_tier_cap: 4,
            max_tactics: 10,
            thresholds: TacticThresholds::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Number of search executors
    pub workers: usize,

    /// Search depth in plies for every candidate
    pub depth: u8,

    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let workers = num_cpus::get().max(1);
        Self {
            workers,
            depth: DEFAULT_DEPTH,
            engine: EngineConfig::default(),
            pipeline: PipelineConfig {
                batch_size: workers * 4,
                ..PipelineConfig::default()
            },
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self, WorkerError> {
        let defaults = Self::default();

        let workers = env_or("WORKER_COUNT", defaults.workers);
        if workers == 0 {
            return Err(WorkerError::Config("WORKER_COUNT must be at least 1"));
        }

        let depth = env_or("SEARCH_DEPTH", defaults.depth);
        if depth == 0 {
            return Err(WorkerError::Config("SEARCH_DEPTH must be at least 1"));
        }

        let engine = EngineConfig {
            search_width: env_or("SEARCH_WIDTH", defaults.engine.search_width).max(1),
            width_depth_threshold: env_or(
                "WIDTH_DEPTH_THRESHOLD",
                defaults.engine.width_depth_threshold,
            ),
            cache_capacity: env_or("CACHE_CAPACITY", defaults.engine.cache_capacity),
            node_ceiling: env_or("NODE_CEILING", defaults.engine.node_ceiling),
            quiescence: env_or("QUIESCENCE", defaults.engine.quiescence),
            quiescence_depth: env_or("QUIESCENCE_DEPTH", defaults.engine.quiescence_depth),
            retain_cache: env_or("RETAIN_CACHE", defaults.engine.retain_cache),
        };

        let t = &defaults.pipeline.thresholds;
        let thresholds = TacticThresholds {
            min_accept_swing: env_or("MIN_TACTIC_SWING", t.min_accept_swing),
            tactical_swing: env_or("TACTICAL_SWING", t.tactical_swing),
            check_swing: env_or("CHECK_SWING", t.check_swing),
            capture_swing: env_or("CAPTURE_SWING", t.capture_swing),
            medium_swing: env_or("MEDIUM_SWING", t.medium_swing),
            hard_swing: env_or("HARD_SWING", t.hard_swing),
            sacrifice_margin: env_or("SACRIFICE_MARGIN", t.sacrifice_margin),
        };

        let p = &defaults.pipeline;
        let pipeline = PipelineConfig {
            opening_horizon: env_or("OPENING_HORIZON", p.opening_horizon),
            tail_exclusion: env_or("TAIL_EXCLUSION", p.tail_exclusion),
            batch_size: env_or("BATCH_SIZE", workers * 4).max(1),
            batch_delay: Duration::from_millis(env_or(
                "BATCH_DELAY_MS",
                p.batch_delay.as_millis() as u64,
            )),
            analysis_timeout: Duration::from_secs(env_or(
                "ANALYSIS_TIMEOUT_SECS",
                p.analysis_timeout.as_secs(),
            )),
            max_solution_len: p.max_solution_len,
            min_solution_len: p.min_solution_len,
            per_tier_cap: env_or("PER_TIER_CAP", p.per_tier_cap),
            max_tactics: env_or("MAX_TACTICS", p.max_tactics),
            thresholds,
        };

        Ok(Self {
            workers,
            depth,
            engine,
            pipeline,
        })
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparseable config value");
            default
        }),
        Err(_) => default,
    }
}
