use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    /// Feedback cadence.
    FastTick,
    /// Resource cadence.
    SlowTick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(GameEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(GameEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Serializes input events and both tick cadences into one stream, so a
/// tick can never interleave with the handling of a keystroke.
pub struct Runner<E: GameEventSource, F: Ticker, S: Ticker> {
    event_source: E,
    fast: F,
    slow: S,
    next_fast: Instant,
    next_slow: Instant,
    suspended: bool,
}

impl<E: GameEventSource, F: Ticker, S: Ticker> Runner<E, F, S> {
    pub fn new(event_source: E, fast: F, slow: S) -> Self {
        let now = Instant::now();
        Self {
            next_fast: now + fast.interval(),
            next_slow: now + slow.interval(),
            event_source,
            fast,
            slow,
            suspended: false,
        }
    }

    /// Cancel pending ticks until [`Runner::resume`]. Input still flows.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Restart both cadences from now.
    pub fn resume(&mut self) {
        if self.suspended {
            self.suspended = false;
            let now = Instant::now();
            self.next_fast = now + self.fast.interval();
            self.next_slow = now + self.slow.interval();
        }
    }

    /// Suspend or resume to match `ticking`.
    pub fn set_ticking(&mut self, ticking: bool) {
        if ticking {
            self.resume()
        } else {
            self.suspend()
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Blocks until an event arrives or a tick falls due, and returns it.
    /// The slow tick wins when both are due.
    pub fn step(&mut self) -> GameEvent {
        loop {
            let now = Instant::now();
            if !self.suspended {
                if now >= self.next_slow {
                    self.next_slow += self.slow.interval();
                    return GameEvent::SlowTick;
                }
                if now >= self.next_fast {
                    self.next_fast += self.fast.interval();
                    return GameEvent::FastTick;
                }
            }

            let wait = if self.suspended {
                self.fast.interval()
            } else {
                self.next_fast.min(self.next_slow).saturating_duration_since(now)
            };

            match self.event_source.recv_timeout(wait) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => std::thread::sleep(wait),
            }
        }
    }
}
