use std::time::Duration;

/// Characters per "word" in WPM.
pub const CHARS_PER_WORD: f64 = 5.0;
/// Elapsed time below this is treated as this, so WPM cannot explode at the
/// start of a round.
pub const MIN_ELAPSED_MINUTES: f64 = 0.08;

/// Monotonic log of typing attempts for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceCounters {
    total_characters_typed: u64,
    total_keystrokes: u64,
    correct_keystrokes: u64,
}

impl PerformanceCounters {
    pub fn record_keystroke(&mut self, correct: bool) {
        self.total_keystrokes += 1;
        if correct {
            self.correct_keystrokes += 1;
        }
    }

    /// Credit the characters of a completed word.
    pub fn record_word(&mut self, word: &str) {
        self.total_characters_typed += word.chars().count() as u64;
    }

    pub fn total_characters_typed(&self) -> u64 {
        self.total_characters_typed
    }

    pub fn total_keystrokes(&self) -> u64 {
        self.total_keystrokes
    }

    pub fn correct_keystrokes(&self) -> u64 {
        self.correct_keystrokes
    }

    pub fn snapshot(&self, effective_elapsed: Duration) -> PerformanceSnapshot {
        PerformanceSnapshot {
            wpm: wpm(self.total_characters_typed, effective_elapsed),
            accuracy_percent: accuracy_percent(self.correct_keystrokes, self.total_keystrokes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSnapshot {
    pub wpm: u32,
    pub accuracy_percent: f64,
}

pub fn wpm(characters: u64, effective_elapsed: Duration) -> u32 {
    let minutes = (effective_elapsed.as_secs_f64() / 60.0).max(MIN_ELAPSED_MINUTES);
    (characters as f64 / CHARS_PER_WORD / minutes).round() as u32
}

/// Percentage with one decimal; 0 when nothing was typed.
pub fn accuracy_percent(correct: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to_tenth(100.0 * correct as f64 / total as f64)
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
