pub mod board_utils;
pub mod config;
pub mod error;
pub mod eval;
pub mod pipeline;
pub mod pool;
pub mod puzzle;
pub mod search;
pub mod tactics;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use pipeline::{PipelineReport, TacticPipeline};
pub use pool::{AnalysisHandle, PoolStatus, WorkerPool};
pub use puzzle::Tactic;
pub use search::{SearchResult, Searcher};
