use std::time::Duration;

use crate::clock::ResourceClock;
use crate::meter::PerformanceCounters;
use crate::mode::EngineConfig;
use crate::time_series::WpmSeries;
use crate::word_stream::WordStream;

/// Fast ticks a completed-word flash stays visible for.
pub const FLASH_TICKS: u8 = 3;

/// Everything a round mutates, owned in one place. Front ends read it
/// through [`crate::round::Round`], never write it.
#[derive(Debug, Clone)]
pub struct RoundState {
    pub clock: ResourceClock,
    pub stream: WordStream,
    pub counters: PerformanceCounters,
    /// Buffer as of the previous mutation, used to find inserted characters.
    pub last_buffer: String,
    pub debug: bool,
    /// Remaining fast ticks of the completed-word flash.
    pub flash_ticks: u8,
    pub wpm_series: WpmSeries,
}

impl RoundState {
    pub fn new(config: &EngineConfig, stream: WordStream, drain_interval: Duration) -> Self {
        Self {
            clock: ResourceClock::new(config, drain_interval),
            stream,
            counters: PerformanceCounters::default(),
            last_buffer: String::new(),
            debug: false,
            flash_ticks: 0,
            wpm_series: WpmSeries::default(),
        }
    }
}
