use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::cheat::CheatForm;
use crate::clock::{ClockPhase, ClockState, DEFAULT_DRAIN_INTERVAL};
use crate::error::{EngineError, EngineResult};
use crate::game_result::GameResult;
use crate::meter::PerformanceSnapshot;
use crate::mode::EngineConfig;
use crate::scoring::{compute_difficulty_multiplier, compute_score};
use crate::session::{RoundState, FLASH_TICKS};
use crate::time_series::WpmSeries;
use crate::typing_policy::{char_feedback, classify, inserted_keystrokes, InputClass, Outcome};
use crate::word_stream::WordStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Won,
    Lost,
    Aborted,
    Cheated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    NotStarted,
    Active,
    /// Stopped by the cheat trigger, waiting for hand-entered figures.
    CheatPending,
    Finished(RoundOutcome),
}

/// Final figures of a round. `result` is only present when the round is
/// worth keeping: a survival win with energy left, a zen win, or an accepted
/// cheat entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub outcome: RoundOutcome,
    pub message: String,
    pub wpm: u32,
    pub accuracy_percent: f64,
    pub score: u64,
    pub energy_remaining: Option<u32>,
    pub words_completed: u32,
    pub elapsed: Duration,
    pub result: Option<GameResult>,
}

/// What the caller should do after feeding an input mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEffect {
    pub class: InputClass,
    pub word_completed: bool,
    /// The caller should empty its input buffer.
    pub clear_buffer: bool,
    /// Present for command-mode input, for the command interpreter.
    pub command: Option<String>,
    pub summary: Option<RoundSummary>,
}

impl InputEffect {
    fn new(class: InputClass) -> Self {
        Self {
            class,
            word_completed: false,
            clear_buffer: false,
            command: None,
            summary: None,
        }
    }
}

/// Inputs for building a round.
#[derive(Debug, Clone)]
pub struct RoundSetup {
    pub config: EngineConfig,
    pub words: Vec<String>,
    pub word_list_id: String,
    pub username: String,
    pub drain_interval: Duration,
    /// Fixes the word draw order when set.
    pub seed: Option<u64>,
}

impl RoundSetup {
    pub fn new(config: EngineConfig, words: Vec<String>) -> Self {
        Self {
            config,
            words,
            word_list_id: "custom".to_string(),
            username: "player".to_string(),
            drain_interval: DEFAULT_DRAIN_INTERVAL,
            seed: None,
        }
    }
}

/// One round of the game, from `start` to a single [`RoundSummary`].
#[derive(Debug, Clone)]
pub struct Round {
    setup: RoundSetup,
    multiplier: f64,
    phase: RoundPhase,
    state: RoundState,
}

impl Round {
    pub fn new(setup: RoundSetup) -> EngineResult<Self> {
        let state = fresh_state(&setup)?;
        Ok(Self {
            multiplier: compute_difficulty_multiplier(&setup.config),
            setup,
            phase: RoundPhase::NotStarted,
            state,
        })
    }

    /// Reset every component and begin a new round with `config`.
    pub fn start(&mut self, config: EngineConfig) -> EngineResult<()> {
        self.setup.config = config;
        self.state = fresh_state(&self.setup)?;
        self.multiplier = compute_difficulty_multiplier(&config);
        self.phase = RoundPhase::Active;
        info!(
            mode = %config.mode(),
            word_goal = config.word_goal(),
            multiplier = self.multiplier,
            "round started"
        );
        Ok(())
    }

    pub fn restart(&mut self) -> EngineResult<()> {
        self.start(self.setup.config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.setup.config
    }

    pub fn word_list_id(&self) -> &str {
        &self.setup.word_list_id
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    /// Whether periodic ticks currently matter. Drivers may stop their
    /// timers while this is false.
    pub fn is_ticking(&self) -> bool {
        self.is_active()
            && self.state.clock.phase() == ClockPhase::Running
            && !self.state.clock.in_command_mode()
    }

    pub fn in_command_mode(&self) -> bool {
        self.state.clock.in_command_mode()
    }

    pub fn debug_enabled(&self) -> bool {
        self.state.debug
    }

    pub fn flash_active(&self) -> bool {
        self.state.flash_ticks > 0
    }

    pub fn current_word(&self) -> &str {
        self.state.stream.current()
    }

    pub fn next_word(&self) -> &str {
        self.state.stream.next()
    }

    pub fn words_completed(&self) -> u32 {
        self.state.stream.completed().len() as u32
    }

    pub fn energy_remaining(&self) -> Option<u32> {
        self.state.clock.energy_remaining()
    }

    pub fn clock_state(&self) -> ClockState {
        self.state.clock.state()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.state.clock.effective_elapsed(now)
    }

    pub fn wpm_series(&self) -> &WpmSeries {
        &self.state.wpm_series
    }

    pub fn total_keystrokes(&self) -> u64 {
        self.state.counters.total_keystrokes()
    }

    pub fn correct_keystrokes(&self) -> u64 {
        self.state.counters.correct_keystrokes()
    }

    pub fn snapshot(&self, now: Instant) -> PerformanceSnapshot {
        self.state.counters.snapshot(self.elapsed(now))
    }

    pub fn feedback(&self, buffer: &str) -> Vec<Outcome> {
        char_feedback(self.current_word(), buffer)
    }

    /// Feed the whole input buffer after a change.
    pub fn on_input(&mut self, buffer: &str, now: Instant) -> InputEffect {
        let class = classify(buffer, self.state.clock.in_command_mode());
        let mut effect = InputEffect::new(class);
        if !self.is_active() {
            return effect;
        }
        // A bar that emptied since the last tick ends the round before the
        // input is looked at.
        if self.state.clock.on_tick(now) == ClockPhase::Lost {
            effect.clear_buffer = true;
            effect.summary = Some(self.finish(RoundOutcome::Lost, now));
            return effect;
        }

        match class {
            InputClass::CommandEnter => {
                self.state.clock.enter_command(now);
                self.state.last_buffer = buffer.to_string();
                effect.command = Some(buffer.to_string());
                debug!("command mode entered");
            }
            InputClass::CommandContinue => {
                self.state.last_buffer = buffer.to_string();
                effect.command = Some(buffer.to_string());
            }
            InputClass::CommandExit => {
                self.state.clock.exit_command(now);
                // What is left in the buffer was not typed, but it can still
                // complete the word.
                self.state.last_buffer = buffer.to_string();
                debug!("command mode exited");
                self.complete_if_match(buffer, now, &mut effect);
            }
            InputClass::DebugTrigger => {
                self.state.debug = !self.state.debug;
                self.state.last_buffer.clear();
                effect.clear_buffer = true;
            }
            InputClass::TerminalTrigger => {
                effect.clear_buffer = true;
                effect.summary = Some(self.finish(RoundOutcome::Aborted, now));
            }
            InputClass::CheatTrigger => {
                self.state.clock.stop(now);
                self.state.last_buffer.clear();
                self.phase = RoundPhase::CheatPending;
                effect.clear_buffer = true;
                info!("cheat entry requested");
            }
            InputClass::NormalTyping => self.type_text(buffer, now, &mut effect),
        }

        if self.is_active() && self.state.clock.phase() == ClockPhase::Lost {
            effect.clear_buffer = true;
            effect.summary = Some(self.finish(RoundOutcome::Lost, now));
        }
        effect
    }

    fn type_text(&mut self, buffer: &str, now: Instant, effect: &mut InputEffect) {
        let strokes = inserted_keystrokes(&self.state.last_buffer, buffer, self.current_word());
        if !strokes.is_empty() {
            self.state.clock.start(now);
        }
        for stroke in &strokes {
            self.state.counters.record_keystroke(stroke.correct);
        }
        self.state.last_buffer = buffer.to_string();
        self.complete_if_match(buffer, now, effect);
    }

    fn complete_if_match(&mut self, buffer: &str, now: Instant, effect: &mut InputEffect) {
        if !self.state.stream.check_match(buffer) {
            return;
        }

        self.state.clock.start(now);
        match self.state.clock.record_word(now) {
            ClockPhase::Lost => {
                effect.summary = Some(self.finish(RoundOutcome::Lost, now));
            }
            phase => {
                let word = self.current_word().to_string();
                self.state.counters.record_word(&word);
                self.state.stream.advance();
                self.state.flash_ticks = FLASH_TICKS;
                self.state.last_buffer.clear();
                effect.word_completed = true;
                effect.clear_buffer = true;
                debug!(word = %word, energy = ?self.energy_remaining(), "word completed");
                if phase == ClockPhase::Won {
                    effect.summary = Some(self.finish(RoundOutcome::Won, now));
                }
            }
        }
    }

    /// Feedback cadence: flash decay and live WPM sampling.
    pub fn on_fast_tick(&mut self, now: Instant) {
        if !self.is_ticking() {
            return;
        }
        self.state.flash_ticks = self.state.flash_ticks.saturating_sub(1);
        let elapsed = self.elapsed(now);
        let wpm = self.state.counters.snapshot(elapsed).wpm;
        self.state.wpm_series.offer(elapsed, wpm);
    }

    /// Resource cadence: energy drain or zen elapsed time.
    pub fn on_slow_tick(&mut self, now: Instant) -> Option<RoundSummary> {
        if !self.is_active() {
            return None;
        }
        match self.state.clock.on_tick(now) {
            ClockPhase::Lost => Some(self.finish(RoundOutcome::Lost, now)),
            _ => None,
        }
    }

    /// End the round without a result. Returns None when nothing was running.
    pub fn abort(&mut self, now: Instant) -> Option<RoundSummary> {
        match self.phase {
            RoundPhase::Active | RoundPhase::CheatPending => {
                Some(self.finish(RoundOutcome::Aborted, now))
            }
            _ => None,
        }
    }

    /// Complete a cheat-stopped round with hand-entered figures. Invalid
    /// figures leave the round waiting for a corrected form.
    pub fn submit_cheat(&mut self, form: &CheatForm, now: Instant) -> EngineResult<RoundSummary> {
        if self.phase != RoundPhase::CheatPending {
            return Err(EngineError::NoCheatPending);
        }
        let figures = form.validate().map_err(EngineError::CheatRejected)?;

        let score = compute_score(figures.wpm, figures.accuracy_percent, self.multiplier, 0);
        let words_completed = self.words_completed();
        let result = GameResult {
            mode: self.setup.config.mode(),
            word_list_id: self.setup.word_list_id.clone(),
            energy_remaining: None,
            wpm: figures.wpm,
            accuracy_percent: figures.accuracy_percent,
            score,
            words_completed,
            multiplier: self.multiplier,
            elapsed_ms: figures.elapsed.as_millis() as u64,
            timestamp: Utc::now(),
            username: self.setup.username.clone(),
        };
        self.phase = RoundPhase::Finished(RoundOutcome::Cheated);
        info!(wpm = figures.wpm, score, "round finished by manual entry");
        debug!(at = ?now, "cheat accepted");

        Ok(RoundSummary {
            outcome: RoundOutcome::Cheated,
            message: "Figures entered manually".to_string(),
            wpm: figures.wpm,
            accuracy_percent: figures.accuracy_percent,
            score,
            energy_remaining: None,
            words_completed,
            elapsed: figures.elapsed,
            result: Some(result),
        })
    }

    fn finish(&mut self, outcome: RoundOutcome, now: Instant) -> RoundSummary {
        self.state.clock.stop(now);
        let elapsed = self.elapsed(now);
        let snapshot = self.state.counters.snapshot(elapsed);
        let energy_remaining = self.energy_remaining();
        let score = compute_score(
            snapshot.wpm,
            snapshot.accuracy_percent,
            self.multiplier,
            energy_remaining.unwrap_or(0),
        );
        let words_completed = self.words_completed();

        let eligible = match outcome {
            RoundOutcome::Won => energy_remaining.map_or(true, |energy| energy > 0),
            RoundOutcome::Lost | RoundOutcome::Aborted | RoundOutcome::Cheated => false,
        };
        let result = eligible.then(|| GameResult {
            mode: self.setup.config.mode(),
            word_list_id: self.setup.word_list_id.clone(),
            energy_remaining,
            wpm: snapshot.wpm,
            accuracy_percent: snapshot.accuracy_percent,
            score,
            words_completed,
            multiplier: self.multiplier,
            elapsed_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
            username: self.setup.username.clone(),
        });

        let message = match (outcome, energy_remaining) {
            (RoundOutcome::Won, Some(energy)) => {
                format!("Goal reached with {energy} energy to spare")
            }
            (RoundOutcome::Won, None) => "Zen goal reached".to_string(),
            (RoundOutcome::Lost, _) => "Out of energy".to_string(),
            (RoundOutcome::Aborted, _) => "Round aborted".to_string(),
            (RoundOutcome::Cheated, _) => "Figures entered manually".to_string(),
        };

        self.phase = RoundPhase::Finished(outcome);
        info!(
            ?outcome,
            wpm = snapshot.wpm,
            accuracy = snapshot.accuracy_percent,
            score,
            recorded = result.is_some(),
            "round finished"
        );

        RoundSummary {
            outcome,
            message,
            wpm: snapshot.wpm,
            accuracy_percent: snapshot.accuracy_percent,
            score,
            energy_remaining,
            words_completed,
            elapsed,
            result,
        }
    }
}

fn fresh_state(setup: &RoundSetup) -> EngineResult<RoundState> {
    let stream = match setup.seed {
        Some(seed) => WordStream::seeded(setup.words.clone(), seed)?,
        None => WordStream::new(setup.words.clone())?,
    };
    Ok(RoundState::new(&setup.config, stream, setup.drain_interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{ModeParams, CLASSIC};
    use assert_matches::assert_matches;

    fn round_with(config: EngineConfig, words: &[&str]) -> Round {
        let mut setup = RoundSetup::new(config, words.iter().map(|w| w.to_string()).collect());
        setup.seed = Some(3);
        let mut round = Round::new(setup).unwrap();
        round.start(config).unwrap();
        round
    }

    /// Type `word` one character per `step`, starting at `at`.
    fn type_word(round: &mut Round, word: &str, at: Instant, step: Duration) -> InputEffect {
        let mut buffer = String::new();
        let mut effect = InputEffect::new(InputClass::NormalTyping);
        for (i, c) in word.chars().enumerate() {
            buffer.push(c);
            effect = round.on_input(&buffer, at + step * i as u32);
        }
        effect
    }

    #[test]
    fn new_round_waits_for_start() {
        let setup = RoundSetup::new(EngineConfig::classic(), vec!["word".into()]);
        let mut round = Round::new(setup).unwrap();
        assert_eq!(round.phase(), RoundPhase::NotStarted);
        let effect = round.on_input("w", Instant::now());
        assert!(!effect.word_completed);
        assert_eq!(round.total_keystrokes(), 0);
    }

    #[test]
    fn clock_waits_for_first_keystroke() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        assert_eq!(round.on_slow_tick(t0 + Duration::from_secs(30)), None);
        assert!(!round.clock_state().started);

        round.on_input("w", t0 + Duration::from_secs(31));
        assert!(round.clock_state().started);
        assert_eq!(round.energy_remaining(), Some(10));
    }

    #[test]
    fn completing_a_word_advances_and_clears() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        let effect = type_word(&mut round, "word", t0, Duration::from_millis(100));
        assert!(effect.word_completed);
        assert!(effect.clear_buffer);
        assert_eq!(round.words_completed(), 1);
        assert_eq!(round.energy_remaining(), Some(13));
        assert!(round.flash_active());
    }

    #[test]
    fn keystrokes_are_never_taken_back() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        round.on_input("w", t0);
        round.on_input("wx", t0);
        round.on_input("w", t0);
        round.on_input("wo", t0);
        assert_eq!(round.total_keystrokes(), 3);
        assert_eq!(round.correct_keystrokes(), 2);
    }

    #[test]
    fn command_mode_bypasses_word_matching() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        round.on_input("w", t0);
        let effect = round.on_input("/", t0);
        assert_eq!(effect.class, InputClass::CommandEnter);
        assert!(round.in_command_mode());
        assert!(!round.is_ticking());

        let effect = round.on_input("/word", t0);
        assert_eq!(effect.class, InputClass::CommandContinue);
        assert_eq!(effect.command.as_deref(), Some("/word"));
        assert_eq!(round.words_completed(), 0);
        assert_eq!(round.total_keystrokes(), 1);

        let effect = round.on_input("", t0 + Duration::from_secs(1));
        assert_eq!(effect.class, InputClass::CommandExit);
        assert!(round.is_ticking());
    }

    #[test]
    fn ticks_in_command_mode_do_not_drain() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        round.on_input("w", t0);
        round.on_input("/", t0 + Duration::from_secs(1));
        assert_eq!(round.on_slow_tick(t0 + Duration::from_secs(60)), None);
        assert_eq!(round.energy_remaining(), Some(9));
    }

    #[test]
    fn entering_command_mode_after_the_bar_emptied_loses() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        round.on_input("w", t0);

        let effect = round.on_input("/", t0 + Duration::from_millis(10_400));
        let summary = effect.summary.unwrap();
        assert_eq!(summary.outcome, RoundOutcome::Lost);
        assert_eq!(summary.elapsed, Duration::from_secs(10));
        assert!(summary.result.is_none());
        assert!(effect.clear_buffer);
        assert_matches!(round.phase(), RoundPhase::Finished(RoundOutcome::Lost));
        assert!(!round.in_command_mode());

        // leaving command mode afterwards changes nothing
        let effect = round.on_input("", t0 + Duration::from_secs(11));
        assert!(effect.summary.is_none());
    }

    #[test]
    fn triggers_after_the_bar_emptied_lose() {
        let t0 = Instant::now();
        let late = t0 + Duration::from_millis(10_200);
        for trigger in ["!debug", "!godmode", "!abort"] {
            let mut round = round_with(EngineConfig::classic(), &["word"]);
            round.on_input("w", t0);
            let summary = round.on_input(trigger, late).summary.unwrap();
            assert_eq!(summary.outcome, RoundOutcome::Lost, "{trigger}");
            assert!(summary.result.is_none());
            assert!(!round.debug_enabled());
            assert_ne!(round.phase(), RoundPhase::CheatPending);
        }
    }

    #[test]
    fn leftover_after_command_mode_can_complete_the_word() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        round.on_input("w", t0);
        round.on_input("/word", t0 + Duration::from_secs(1));
        let effect = round.on_input("word", t0 + Duration::from_secs(2));
        assert_eq!(effect.class, InputClass::CommandExit);
        assert!(effect.word_completed);
        assert!(effect.clear_buffer);
        assert_eq!(round.words_completed(), 1);
        // the leftover text is not counted as typed
        assert_eq!(round.total_keystrokes(), 1);
    }

    #[test]
    fn survival_win_emits_result() {
        let config = EngineConfig::survival(ModeParams {
            word_goal: 2,
            ..CLASSIC
        })
        .unwrap();
        let mut round = round_with(config, &["go"]);
        let t0 = Instant::now();
        type_word(&mut round, "go", t0, Duration::from_millis(500));
        let effect = type_word(
            &mut round,
            "go",
            t0 + Duration::from_secs(2),
            Duration::from_millis(500),
        );

        let summary = effect.summary.unwrap();
        assert_eq!(summary.outcome, RoundOutcome::Won);
        assert_matches!(round.phase(), RoundPhase::Finished(RoundOutcome::Won));
        let result = summary.result.unwrap();
        assert_eq!(result.words_completed, 2);
        assert_eq!(result.energy_remaining, summary.energy_remaining);
        assert_eq!(result.rederive_score(), result.score);
        assert_eq!(result.mode, crate::mode::ModeName::Custom);
    }

    #[test]
    fn running_dry_ends_without_result() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        round.on_input("w", t0);
        assert_eq!(round.on_slow_tick(t0 + Duration::from_secs(9)), None);
        let summary = round.on_slow_tick(t0 + Duration::from_secs(10)).unwrap();
        assert_eq!(summary.outcome, RoundOutcome::Lost);
        assert_eq!(summary.energy_remaining, Some(0));
        assert!(summary.result.is_none());

        // Finished rounds ignore further input and ticks.
        assert_eq!(round.on_slow_tick(t0 + Duration::from_secs(11)), None);
        assert!(!round.on_input("wo", t0).word_completed);
    }

    #[test]
    fn abort_trigger_ends_round_without_result() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let effect = round.on_input("!abort", Instant::now());
        let summary = effect.summary.unwrap();
        assert_eq!(summary.outcome, RoundOutcome::Aborted);
        assert!(summary.result.is_none());
    }

    #[test]
    fn debug_trigger_toggles_and_clears() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let effect = round.on_input("!debug", Instant::now());
        assert!(effect.clear_buffer);
        assert!(round.debug_enabled());
        round.on_input("!debug", Instant::now());
        assert!(!round.debug_enabled());
    }

    #[test]
    fn cheat_requires_valid_figures() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        assert_matches!(
            round.submit_cheat(&CheatForm::new("100", "90", "01:00"), t0),
            Err(EngineError::NoCheatPending)
        );

        round.on_input("!godmode", t0);
        assert_eq!(round.phase(), RoundPhase::CheatPending);

        assert_matches!(
            round.submit_cheat(&CheatForm::new("301", "90", "01:00"), t0),
            Err(EngineError::CheatRejected(_))
        );
        assert_eq!(round.phase(), RoundPhase::CheatPending);

        let summary = round
            .submit_cheat(&CheatForm::new("100", "90", "01:00"), t0)
            .unwrap();
        assert_eq!(summary.outcome, RoundOutcome::Cheated);
        let result = summary.result.unwrap();
        assert_eq!(result.energy_remaining, None);
        assert_eq!(result.elapsed_ms, 60_000);
        assert_eq!(result.score, compute_score(100, 90.0, 1.0, 0));
    }

    #[test]
    fn restart_resets_state() {
        let mut round = round_with(EngineConfig::classic(), &["word"]);
        let t0 = Instant::now();
        type_word(&mut round, "word", t0, Duration::from_millis(100));
        round.restart().unwrap();
        assert_eq!(round.words_completed(), 0);
        assert_eq!(round.total_keystrokes(), 0);
        assert!(!round.clock_state().started);
        assert!(round.is_active());
    }

    #[test]
    fn fast_tick_samples_wpm_once_per_second() {
        let mut round = round_with(EngineConfig::zen(50).unwrap(), &["word"]);
        let t0 = Instant::now();
        type_word(&mut round, "word", t0, Duration::from_millis(100));
        for ms in (100..3000).step_by(100) {
            round.on_fast_tick(t0 + Duration::from_millis(ms));
        }
        assert_eq!(round.wpm_series().points().len(), 2);
        assert!(!round.flash_active());
    }
}
