use thiserror::Error;

use crate::cheat::CheatErrors;

/// Why a settings tuple was refused before a round could start.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("word goal must be at least 1 (got {0})")]
    WordGoal(i64),

    #[error("bonus per word must not be negative (got {0})")]
    BonusPerWord(i64),

    #[error("initial energy must be at least 1 (got {0})")]
    InitialEnergy(i64),

    #[error("goal percentage must be between 1 and 100 (got {0})")]
    GoalPercentage(i64),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid settings: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Word list is empty")]
    EmptyWordList,

    #[error("Unknown word list: {0}")]
    UnknownWordList(String),

    #[error("No cheat entry is pending for this round")]
    NoCheatPending,

    #[error("Cheat entry rejected: {0}")]
    CheatRejected(CheatErrors),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database Error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
