use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::mode::ModeName;
use crate::scoring::compute_score;

/// The record a finished round hands to the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub mode: ModeName,
    pub word_list_id: String,
    pub energy_remaining: Option<u32>,
    pub wpm: u32,
    pub accuracy_percent: f64,
    pub score: u64,
    pub words_completed: u32,
    pub multiplier: f64,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub username: String,
}

impl GameResult {
    /// Score recomputed from the stored figures.
    pub fn rederive_score(&self) -> u64 {
        compute_score(
            self.wpm,
            self.accuracy_percent,
            self.multiplier,
            self.energy_remaining.unwrap_or(0),
        )
    }

    /// A survival result that ran dry carries no score worth keeping.
    pub fn is_zero_energy(&self) -> bool {
        self.energy_remaining == Some(0)
    }
}

/// A downstream party that wants finished results: history, achievements,
/// leveling. Failures stay with the consumer.
pub trait ResultConsumer {
    fn name(&self) -> &str;
    fn consume(&mut self, result: &GameResult) -> EngineResult<()>;
}

/// Fans a result out to every registered consumer.
#[derive(Default)]
pub struct ResultPublisher {
    consumers: Vec<Box<dyn ResultConsumer>>,
}

impl ResultPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, consumer: Box<dyn ResultConsumer>) {
        self.consumers.push(consumer);
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Deliver to all consumers; returns how many accepted it.
    pub fn publish(&mut self, result: &GameResult) -> usize {
        let mut delivered = 0;
        for consumer in self.consumers.iter_mut() {
            match consumer.consume(result) {
                Ok(()) => {
                    debug!(consumer = consumer.name(), score = result.score, "result delivered");
                    delivered += 1;
                }
                Err(e) => warn!(consumer = consumer.name(), error = %e, "result consumer failed"),
            }
        }
        delivered
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) fn sample_result() -> GameResult {
        GameResult {
            mode: ModeName::Classic,
            word_list_id: "english".into(),
            energy_remaining: Some(12),
            wpm: 60,
            accuracy_percent: 96.5,
            score: compute_score(60, 96.5, 1.0, 12),
            words_completed: 30,
            multiplier: 1.0,
            elapsed_ms: 30_000,
            timestamp: Utc::now(),
            username: "player".into(),
        }
    }

    struct Recorder(Rc<RefCell<Vec<u64>>>);

    impl ResultConsumer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn consume(&mut self, result: &GameResult) -> EngineResult<()> {
            self.0.borrow_mut().push(result.score);
            Ok(())
        }
    }

    struct Broken;

    impl ResultConsumer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn consume(&mut self, _result: &GameResult) -> EngineResult<()> {
            Err(EngineError::EmptyWordList)
        }
    }

    #[test]
    fn json_roundtrip_keeps_score_derivable() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let restored: GameResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, result);
        assert_eq!(restored.rederive_score(), result.score);
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["mode"], "classic");
    }

    #[test]
    fn failing_consumer_does_not_block_others() {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut publisher = ResultPublisher::new();
        publisher.register(Box::new(Broken));
        publisher.register(Box::new(Recorder(seen.clone())));

        let result = sample_result();
        assert_eq!(publisher.publish(&result), 1);
        assert_eq!(*seen.borrow(), vec![result.score]);
    }
}
