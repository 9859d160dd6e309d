use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{EngineError, EngineResult};

/// The current and queued target words of a round.
///
/// Matching is case-sensitive: `"Rust"` does not complete `"rust"`.
#[derive(Debug, Clone)]
pub struct WordStream {
    words: Vec<String>,
    current: String,
    next: String,
    completed: Vec<String>,
    rng: StdRng,
}

impl WordStream {
    pub fn new(words: Vec<String>) -> EngineResult<Self> {
        Self::with_rng(words, StdRng::from_entropy())
    }

    /// Deterministic draws, for replays and tests.
    pub fn seeded(words: Vec<String>, seed: u64) -> EngineResult<Self> {
        Self::with_rng(words, StdRng::seed_from_u64(seed))
    }

    fn with_rng(words: Vec<String>, mut rng: StdRng) -> EngineResult<Self> {
        let words: Vec<String> = words.into_iter().filter(|w| !w.is_empty()).collect();
        let current = draw(&words, &mut rng).ok_or(EngineError::EmptyWordList)?;
        let next = draw(&words, &mut rng).ok_or(EngineError::EmptyWordList)?;
        Ok(Self {
            words,
            current,
            next,
            completed: vec![],
            rng,
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn next(&self) -> &str {
        &self.next
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.current.chars().nth(idx)
    }

    pub fn check_match(&self, typed: &str) -> bool {
        typed == self.current
    }

    /// Promote the queued word and draw a fresh one behind it.
    pub fn advance(&mut self) -> (&str, &str) {
        // The list is non-empty by construction, so a draw always succeeds.
        let drawn = draw(&self.words, &mut self.rng).unwrap_or_else(|| self.next.clone());
        let finished = std::mem::replace(&mut self.current, std::mem::replace(&mut self.next, drawn));
        self.completed.push(finished);
        (&self.current, &self.next)
    }
}

fn draw(words: &[String], rng: &mut StdRng) -> Option<String> {
    words.choose(rng).cloned()
}
