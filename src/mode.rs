use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named difficulty of a round.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModeName {
    Classic,
    Hard,
    Practice,
    Speedrunner,
    #[value(skip)]
    Custom,
    Zen,
}

/// The four tunables that define a survival round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeParams {
    pub word_goal: u32,
    pub bonus_per_word: u32,
    pub initial_energy: u32,
    pub goal_percentage: u32,
}

impl ModeParams {
    pub const fn new(
        word_goal: u32,
        bonus_per_word: u32,
        initial_energy: u32,
        goal_percentage: u32,
    ) -> Self {
        Self {
            word_goal,
            bonus_per_word,
            initial_energy,
            goal_percentage,
        }
    }

    /// Check the tuple against the allowed ranges, reporting the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ranges(
            self.word_goal as i64,
            self.bonus_per_word as i64,
            self.initial_energy as i64,
            self.goal_percentage as i64,
        )
    }
}

pub const CLASSIC: ModeParams = ModeParams::new(30, 3, 10, 100);
pub const HARD: ModeParams = ModeParams::new(20, 2, 8, 100);
pub const PRACTICE: ModeParams = ModeParams::new(60, 5, 15, 100);
pub const SPEEDRUNNER: ModeParams = ModeParams::new(10, 2, 8, 100);

/// Preset table, in the order the front end lists them.
pub const PRESETS: [(ModeName, ModeParams); 4] = [
    (ModeName::Classic, CLASSIC),
    (ModeName::Hard, HARD),
    (ModeName::Practice, PRACTICE),
    (ModeName::Speedrunner, SPEEDRUNNER),
];

/// Name of the preset whose tuple equals `params`, or `Custom`.
pub fn resolve_mode(params: &ModeParams) -> ModeName {
    PRESETS
        .iter()
        .find(|(_, preset)| preset == params)
        .map(|(name, _)| *name)
        .unwrap_or(ModeName::Custom)
}

pub fn preset(name: ModeName) -> Option<ModeParams> {
    PRESETS
        .iter()
        .find(|(preset_name, _)| *preset_name == name)
        .map(|(_, params)| *params)
}

pub(crate) fn check_ranges(
    word_goal: i64,
    bonus_per_word: i64,
    initial_energy: i64,
    goal_percentage: i64,
) -> Result<(), ConfigError> {
    if word_goal < 1 {
        return Err(ConfigError::WordGoal(word_goal));
    }
    if bonus_per_word < 0 {
        return Err(ConfigError::BonusPerWord(bonus_per_word));
    }
    if initial_energy < 1 {
        return Err(ConfigError::InitialEnergy(initial_energy));
    }
    if !(1..=100).contains(&goal_percentage) {
        return Err(ConfigError::GoalPercentage(goal_percentage));
    }
    Ok(())
}

/// Parameters of one round. Only constructible through validating
/// constructors, so `mode` always agrees with the tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    params: ModeParams,
    mode: ModeName,
}

impl EngineConfig {
    /// A survival config; the mode name is derived from the tuple.
    pub fn survival(params: ModeParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            mode: resolve_mode(&params),
        })
    }

    /// A zen round that ends after `word_goal` words. The remaining tunables
    /// keep their Classic values so the difficulty multiplier stays anchored.
    pub fn zen(word_goal: u32) -> Result<Self, ConfigError> {
        let params = ModeParams {
            word_goal,
            ..CLASSIC
        };
        params.validate()?;
        Ok(Self {
            params,
            mode: ModeName::Zen,
        })
    }

    pub fn from_preset(name: ModeName) -> Option<Self> {
        preset(name).map(|params| Self { params, mode: name })
    }

    pub fn classic() -> Self {
        Self {
            params: CLASSIC,
            mode: ModeName::Classic,
        }
    }

    pub fn params(&self) -> ModeParams {
        self.params
    }

    pub fn mode(&self) -> ModeName {
        self.mode
    }

    pub fn word_goal(&self) -> u32 {
        self.params.word_goal
    }

    pub fn bonus_per_word(&self) -> u32 {
        self.params.bonus_per_word
    }

    pub fn initial_energy(&self) -> u32 {
        self.params.initial_energy
    }

    pub fn goal_percentage(&self) -> u32 {
        self.params.goal_percentage
    }

    pub fn is_zen(&self) -> bool {
        self.mode == ModeName::Zen
    }

    /// Progress (in completed words) a survival round must reach to win.
    pub fn goal_progress(&self) -> f64 {
        self.params.word_goal as f64 * self.params.goal_percentage as f64 / 100.0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::classic()
    }
}
