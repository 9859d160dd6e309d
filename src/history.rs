use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::game_result::{GameResult, ResultConsumer};
use crate::mode::ModeName;

/// Local store of finished rounds.
#[derive(Debug)]
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Connection::open(path.as_ref())?,
        };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> EngineResult<()> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS game_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                word_list_id TEXT NOT NULL,
                energy_remaining INTEGER,
                wpm INTEGER NOT NULL,
                accuracy_percent REAL NOT NULL,
                score INTEGER NOT NULL,
                words_completed INTEGER NOT NULL,
                multiplier REAL NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                username TEXT NOT NULL
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_game_results_timestamp ON game_results(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Store a result. Survival results with no energy left are skipped;
    /// returns whether a row was written.
    pub fn record(&self, result: &GameResult) -> EngineResult<bool> {
        if result.is_zero_energy() {
            debug!(mode = %result.mode, "skipping zero-energy result");
            return Ok(false);
        }

        self.conn.execute(
            r#"
            INSERT INTO game_results
            (mode, word_list_id, energy_remaining, wpm, accuracy_percent, score,
             words_completed, multiplier, elapsed_ms, timestamp, username)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                result.mode.to_string(),
                result.word_list_id,
                result.energy_remaining,
                result.wpm,
                result.accuracy_percent,
                result.score as i64,
                result.words_completed,
                result.multiplier,
                result.elapsed_ms as i64,
                result.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                result.username,
            ],
        )?;
        info!(score = result.score, mode = %result.mode, "result saved");
        Ok(true)
    }

    /// Most recent results first.
    pub fn recent(&self, limit: usize) -> EngineResult<Vec<GameResult>> {
        self.query(limit.min(i64::MAX as usize) as i64)
    }

    // A negative limit means no limit.
    fn query(&self, limit: i64) -> EngineResult<Vec<GameResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT mode, word_list_id, energy_remaining, wpm, accuracy_percent, score,
                   words_completed, multiplier, elapsed_ms, timestamp, username
            FROM game_results
            ORDER BY timestamp DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit], row_to_result)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn count(&self) -> EngineResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM game_results", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Highest-scoring result of each mode, ordered by mode name.
    pub fn best_by_mode(&self) -> EngineResult<Vec<GameResult>> {
        let all = self.query(-1)?;
        Ok(all
            .into_iter()
            .into_group_map_by(|r| r.mode)
            .into_values()
            .filter_map(|results| results.into_iter().max_by_key(|r| r.score))
            .sorted_by_key(|r| r.mode.to_string())
            .collect())
    }

    pub fn clear(&self) -> EngineResult<()> {
        self.conn.execute("DELETE FROM game_results", [])?;
        Ok(())
    }
}

fn row_to_result(row: &Row<'_>) -> rusqlite::Result<GameResult> {
    let mode: String = row.get(0)?;
    let mode = mode.parse::<ModeName>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "mode".to_string(), rusqlite::types::Type::Text)
    })?;
    let timestamp: String = row.get(9)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                9,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })?
        .with_timezone(&Utc);

    Ok(GameResult {
        mode,
        word_list_id: row.get(1)?,
        energy_remaining: row.get(2)?,
        wpm: row.get(3)?,
        accuracy_percent: row.get(4)?,
        score: row.get::<_, i64>(5)? as u64,
        words_completed: row.get(6)?,
        multiplier: row.get(7)?,
        elapsed_ms: row.get::<_, i64>(8)? as u64,
        timestamp,
        username: row.get(10)?,
    })
}

impl ResultConsumer for HistoryStore {
    fn name(&self) -> &str {
        "history"
    }

    fn consume(&mut self, result: &GameResult) -> EngineResult<()> {
        self.record(result).map(|_| ())
    }
}

/// Write results as CSV with a header row.
pub fn export_csv<W: Write>(results: &[GameResult], writer: W) -> EngineResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}
