//! Rules-engine capability shared by the analysis crates.
//!
//! Everything chess-legal goes through `shakmaty`; this crate only adapts it
//! to the shapes the tactic pipeline consumes (game records, move metadata,
//! position keys).

pub mod error;
pub mod game_data;
pub mod pgn;
pub mod rules;

pub use error::ChessCoreError;
pub use game_data::{GameHistory, GameRecord};
pub use rules::{MoveInfo, MoveMeta};
