use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessCoreError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid SAN '{san}' at ply {ply}: {reason}")]
    InvalidSan {
        ply: usize,
        san: String,
        reason: String,
    },

    #[error("Invalid UCI move '{uci}': {reason}")]
    InvalidUci { uci: String, reason: String },

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Move list contains no moves")]
    EmptyGame,
}
