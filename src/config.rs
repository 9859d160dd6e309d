use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::mode::{check_ranges, EngineConfig, ModeName, ModeParams, CLASSIC};

/// Persisted settings. Numeric fields are signed so that a hand-edited file
/// with negative values still loads and is rejected by validation rather
/// than by the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub word_goal: i64,
    pub bonus_per_word: i64,
    pub initial_energy: i64,
    pub goal_percentage: i64,
    pub zen: bool,
    pub word_list: String,
    pub username: String,
    pub fast_tick_ms: u64,
    pub slow_tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_goal: CLASSIC.word_goal as i64,
            bonus_per_word: CLASSIC.bonus_per_word as i64,
            initial_energy: CLASSIC.initial_energy as i64,
            goal_percentage: CLASSIC.goal_percentage as i64,
            zen: false,
            word_list: "english".to_string(),
            username: "player".to_string(),
            fast_tick_ms: 100,
            slow_tick_ms: 1000,
        }
    }
}

/// Shown to the player when saved settings could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNotice {
    pub reason: ConfigError,
}

impl std::fmt::Display for ConfigNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid settings, reverted to defaults ({})", self.reason)
    }
}

impl Config {
    /// Overwrite the round tunables with a preset's values.
    pub fn apply_mode(&mut self, mode: ModeName) {
        if mode == ModeName::Zen {
            self.zen = true;
            return;
        }
        if let Some(params) = crate::mode::preset(mode) {
            self.zen = false;
            self.word_goal = params.word_goal as i64;
            self.bonus_per_word = params.bonus_per_word as i64;
            self.initial_energy = params.initial_energy as i64;
            self.goal_percentage = params.goal_percentage as i64;
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        check_ranges(
            self.word_goal,
            self.bonus_per_word,
            self.initial_energy,
            self.goal_percentage,
        )?;
        let word_goal = u32::try_from(self.word_goal).map_err(|_| ConfigError::WordGoal(self.word_goal))?;
        if self.zen {
            return EngineConfig::zen(word_goal);
        }
        let params = ModeParams {
            word_goal,
            bonus_per_word: u32::try_from(self.bonus_per_word)
                .map_err(|_| ConfigError::BonusPerWord(self.bonus_per_word))?,
            initial_energy: u32::try_from(self.initial_energy)
                .map_err(|_| ConfigError::InitialEnergy(self.initial_energy))?,
            goal_percentage: self.goal_percentage as u32,
        };
        EngineConfig::survival(params)
    }

    /// The engine config, or Classic plus a notice when the settings are bad.
    pub fn resolve(&self) -> (EngineConfig, Option<ConfigNotice>) {
        match self.engine_config() {
            Ok(config) => (config, None),
            Err(reason) => {
                warn!(%reason, "invalid settings, falling back to classic");
                (EngineConfig::classic(), Some(ConfigNotice { reason }))
            }
        }
    }

    /// Replace invalid round tunables with Classic, keeping everything else.
    pub fn reset_tunables(&mut self) {
        let defaults = Config::default();
        self.word_goal = defaults.word_goal;
        self.bonus_per_word = defaults.bonus_per_word;
        self.initial_energy = defaults.initial_energy;
        self.goal_percentage = defaults.goal_percentage;
        self.zen = false;
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("wordrush_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(path = %self.path.display(), error = %e, "unreadable config, using defaults"),
            },
            Err(_) => info!(path = %self.path.display(), "no config yet, using defaults"),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
