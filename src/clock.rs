use std::time::{Duration, Instant};

use tracing::debug;

use crate::mode::EngineConfig;

/// Default time it takes to drain one unit of energy.
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(1);

/// How a round terminates, fixed once at round start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerminationPolicy {
    /// Energy drains over time; reaching `goal_progress` words wins, running
    /// dry loses.
    Survival { goal_progress: f64 },
    /// Nothing drains; completing `word_goal` words wins.
    Goal { word_goal: u32 },
}

impl TerminationPolicy {
    pub fn for_config(config: &EngineConfig) -> Self {
        if config.is_zen() {
            TerminationPolicy::Goal {
                word_goal: config.word_goal(),
            }
        } else {
            TerminationPolicy::Survival {
                goal_progress: config.goal_progress(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    /// Waiting for the first keystroke.
    Idle,
    Running,
    Won,
    Lost,
    /// Stopped from outside (abort, cheat entry).
    Stopped,
}

impl ClockPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClockPhase::Won | ClockPhase::Lost | ClockPhase::Stopped)
    }
}

/// Read-only view of the clock, suitable for a debug overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockState {
    pub energy_remaining: Option<u32>,
    pub elapsed_ms: u64,
    pub total_progress: f64,
    pub started: bool,
    pub started_at: Option<Instant>,
    pub in_command_mode: bool,
    pub command_entered_at: Option<Instant>,
}

/// Energy countdown for survival rounds, elapsed counter for zen rounds.
///
/// Drain is derived from effective elapsed time (wall time since the first
/// keystroke minus every command-mode pause), so ticks only decide *when*
/// the clock is sampled, never how much is drained.
#[derive(Debug, Clone)]
pub struct ResourceClock {
    policy: TerminationPolicy,
    initial_energy: u32,
    bonus_per_word: u32,
    drain_interval: Duration,
    bonus_total: u64,
    drained: u64,
    elapsed_ms: u64,
    total_progress: f64,
    started_at: Option<Instant>,
    in_command_mode: bool,
    command_entered_at: Option<Instant>,
    paused_total: Duration,
    frozen_at: Option<Instant>,
    phase: ClockPhase,
}

impl ResourceClock {
    pub fn new(config: &EngineConfig, drain_interval: Duration) -> Self {
        Self {
            policy: TerminationPolicy::for_config(config),
            initial_energy: config.initial_energy(),
            bonus_per_word: config.bonus_per_word(),
            drain_interval: drain_interval.max(Duration::from_millis(1)),
            bonus_total: 0,
            drained: 0,
            elapsed_ms: 0,
            total_progress: 0.0,
            started_at: None,
            in_command_mode: false,
            command_entered_at: None,
            paused_total: Duration::ZERO,
            frozen_at: None,
            phase: ClockPhase::Idle,
        }
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn in_command_mode(&self) -> bool {
        self.in_command_mode
    }

    pub fn is_survival(&self) -> bool {
        matches!(self.policy, TerminationPolicy::Survival { .. })
    }

    /// Start timing. Only the first call has an effect.
    pub fn start(&mut self, now: Instant) {
        if self.phase == ClockPhase::Idle {
            self.started_at = Some(now);
            self.phase = ClockPhase::Running;
            debug!("clock started");
        }
    }

    /// Suspend draining. Returns false if already in command mode.
    pub fn enter_command(&mut self, now: Instant) -> bool {
        if self.in_command_mode {
            return false;
        }
        self.in_command_mode = true;
        // Before the first keystroke there is nothing to compensate.
        if self.phase == ClockPhase::Running {
            self.sync(now);
            self.command_entered_at = Some(now);
        }
        debug!(phase = ?self.phase, "clock paused for command mode");
        true
    }

    /// Resume draining and fold the pause into the timing base.
    pub fn exit_command(&mut self, now: Instant) -> Option<Duration> {
        if !self.in_command_mode {
            return None;
        }
        self.in_command_mode = false;
        let paused = self
            .command_entered_at
            .take()
            .map(|entered| now.saturating_duration_since(entered))
            .unwrap_or_default();
        self.paused_total += paused;
        debug!(paused_ms = paused.as_millis() as u64, "clock resumed");
        Some(paused)
    }

    /// Time spent actively typing: excludes command-mode dwell and stops at
    /// the moment the clock was frozen.
    pub fn effective_elapsed(&self, now: Instant) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.frozen_at.unwrap_or(now);
        let mut elapsed = end
            .saturating_duration_since(started_at)
            .saturating_sub(self.paused_total);
        if let Some(entered) = self.command_entered_at {
            elapsed = elapsed.saturating_sub(end.saturating_duration_since(entered));
        }
        elapsed
    }

    pub fn paused_total(&self) -> Duration {
        self.paused_total
    }

    /// Sample the clock on the slow cadence.
    pub fn on_tick(&mut self, now: Instant) -> ClockPhase {
        if self.phase == ClockPhase::Running && !self.in_command_mode {
            self.sync(now);
        }
        self.phase
    }

    /// Count one completed word, crediting its bonus first. The drain is
    /// brought up to date before the bonus lands, so a word typed after
    /// energy ran out cannot revive the round.
    pub fn record_word(&mut self, now: Instant) -> ClockPhase {
        if self.phase != ClockPhase::Running {
            return self.phase;
        }
        if !self.in_command_mode && self.sync(now) == ClockPhase::Lost {
            return self.phase;
        }

        self.total_progress += 1.0;
        match self.policy {
            TerminationPolicy::Survival { goal_progress } => {
                self.bonus_total += self.bonus_per_word as u64;
                if self.total_progress >= goal_progress {
                    self.finish(ClockPhase::Won, now);
                }
            }
            TerminationPolicy::Goal { word_goal } => {
                if self.total_progress >= word_goal as f64 {
                    self.finish(ClockPhase::Won, now);
                }
            }
        }
        self.phase
    }

    /// Freeze the clock without a win or loss.
    pub fn stop(&mut self, now: Instant) {
        if !self.phase.is_terminal() {
            self.finish(ClockPhase::Stopped, now);
        }
    }

    pub fn energy_remaining(&self) -> Option<u32> {
        match self.policy {
            TerminationPolicy::Survival { .. } => {
                let available = self.initial_energy as u64 + self.bonus_total;
                Some(available.saturating_sub(self.drained).min(u32::MAX as u64) as u32)
            }
            TerminationPolicy::Goal { .. } => None,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn total_progress(&self) -> f64 {
        self.total_progress
    }

    pub fn state(&self) -> ClockState {
        ClockState {
            energy_remaining: self.energy_remaining(),
            elapsed_ms: self.elapsed_ms,
            total_progress: self.total_progress,
            started: self.has_started(),
            started_at: self.started_at,
            in_command_mode: self.in_command_mode,
            command_entered_at: self.command_entered_at,
        }
    }

    fn sync(&mut self, now: Instant) -> ClockPhase {
        if self.phase != ClockPhase::Running {
            return self.phase;
        }
        let elapsed = self.effective_elapsed(now);
        self.elapsed_ms = elapsed.as_millis() as u64;

        if self.is_survival() {
            self.drained = (elapsed.as_nanos() / self.drain_interval.as_nanos()) as u64;
            if self.energy_remaining() == Some(0) {
                // Timing ends at the exact moment the last unit drained.
                let exhausted_at = now
                    .checked_sub(elapsed.saturating_sub(self.drain_budget()))
                    .unwrap_or(now);
                self.finish(ClockPhase::Lost, exhausted_at);
            }
        }
        self.phase
    }

    fn drain_budget(&self) -> Duration {
        let units = self.initial_energy as u64 + self.bonus_total;
        self.drain_interval
            .saturating_mul(units.min(u32::MAX as u64) as u32)
    }

    fn finish(&mut self, phase: ClockPhase, now: Instant) {
        if let Some(entered) = self.command_entered_at.take() {
            self.paused_total += now.saturating_duration_since(entered);
        }
        self.frozen_at = Some(now);
        self.elapsed_ms = self.effective_elapsed(now).as_millis() as u64;
        self.phase = phase;
        debug!(?phase, elapsed_ms = self.elapsed_ms, "clock finished");
    }
}
