// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod cheat;
pub mod clock;
pub mod config;
pub mod error;
pub mod game_result;
pub mod history;
pub mod language;
pub mod meter;
pub mod mode;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod time_series;
pub mod typing_policy;
pub mod word_stream;

pub use error::{EngineError, EngineResult};
pub use game_result::GameResult;
pub use mode::{EngineConfig, ModeName};
pub use round::{Round, RoundOutcome, RoundSetup, RoundSummary};
