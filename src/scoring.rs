//! Difficulty multiplier and final score.
//!
//! Difficulty is measured against the Classic preset (30 words, 3 energy per
//! word, 10 starting energy), which scores exactly 1.0.

use crate::mode::EngineConfig;

const REFERENCE_WORD_GOAL: f64 = 30.0;
const REFERENCE_BONUS: f64 = 3.0;
const REFERENCE_ENERGY: f64 = 10.0;

const WORD_GOAL_WEIGHT: f64 = 1.5;
const BONUS_WEIGHT: f64 = 1.75;
const ENERGY_WEIGHT: f64 = 1.75;
const WEIGHT_SUM: f64 = 5.0;

pub const MIN_MULTIPLIER: f64 = 0.5;
pub const MAX_MULTIPLIER: f64 = 2.0;

/// Energy bonus per unit left at the end of a round.
const ENERGY_POINTS: f64 = 5.0;
/// The energy bonus never exceeds this share of the base score.
const ENERGY_BONUS_CAP: f64 = 0.2;

pub fn compute_difficulty_multiplier(config: &EngineConfig) -> f64 {
    let word_goal_factor = (config.word_goal() as f64 / REFERENCE_WORD_GOAL).clamp(1.0, 3.0);
    let bonus_factor =
        (REFERENCE_BONUS / (config.bonus_per_word() as f64).max(0.5)).clamp(1.0, 3.0);
    let initial_factor =
        (REFERENCE_ENERGY / (config.initial_energy() as f64).max(0.5)).clamp(1.0, 3.0);

    let weighted = word_goal_factor * WORD_GOAL_WEIGHT
        + bonus_factor * BONUS_WEIGHT
        + initial_factor * ENERGY_WEIGHT;
    (weighted / WEIGHT_SUM).clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
}

/// Accuracy is squared so sloppy typing costs more than slow typing.
pub fn compute_score(wpm: u32, accuracy_percent: f64, multiplier: f64, energy_remaining: u32) -> u64 {
    let wpm = wpm.max(1) as f64;
    let accuracy = (accuracy_percent / 100.0).clamp(0.0, 1.0);
    let base = (wpm * 10.0 * accuracy * accuracy * multiplier).round();
    let energy_bonus = (energy_remaining as f64 * ENERGY_POINTS).min(base * ENERGY_BONUS_CAP);
    (base + energy_bonus).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{ModeName, ModeParams, HARD};

    #[test]
    fn classic_is_the_reference_point() {
        assert_eq!(compute_difficulty_multiplier(&EngineConfig::classic()), 1.0);
    }

    #[test]
    fn harder_presets_score_higher() {
        let hard = EngineConfig::survival(HARD).unwrap();
        assert!((compute_difficulty_multiplier(&hard) - 1.2625).abs() < 1e-9);

        let practice = EngineConfig::from_preset(ModeName::Practice).unwrap();
        // only the longer goal counts; softer energy settings floor at 1
        assert!((compute_difficulty_multiplier(&practice) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn multiplier_is_clamped() {
        let brutal = EngineConfig::survival(ModeParams::new(500, 0, 1, 100)).unwrap();
        assert_eq!(compute_difficulty_multiplier(&brutal), MAX_MULTIPLIER);

        let gentle = EngineConfig::survival(ModeParams::new(1, 50, 500, 100)).unwrap();
        assert_eq!(compute_difficulty_multiplier(&gentle), 1.0);
    }

    #[test]
    fn score_for_perfect_classic_round() {
        // base 600, energy bonus capped at 120
        assert_eq!(compute_score(60, 100.0, 1.0, 40), 720);
        // uncapped energy bonus
        assert_eq!(compute_score(60, 100.0, 1.0, 10), 650);
    }

    #[test]
    fn accuracy_is_squared() {
        assert_eq!(compute_score(60, 50.0, 1.0, 0), 150);
    }

    #[test]
    fn zero_wpm_is_floored_to_one() {
        assert_eq!(compute_score(0, 100.0, 1.0, 0), 10);
    }

    #[test]
    fn zero_accuracy_scores_zero() {
        assert_eq!(compute_score(80, 0.0, 2.0, 10), 0);
    }
}
