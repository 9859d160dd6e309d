//! Hand-entered figures for a round ended through the cheat trigger.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const MAX_CHEAT_WPM: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CheatField {
    Wpm,
    Accuracy,
    Time,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: CheatField,
    pub message: String,
}

impl FieldError {
    fn new(field: CheatField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheatErrors(pub Vec<FieldError>);

impl CheatErrors {
    pub fn for_field(&self, field: CheatField) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CheatErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheatForm {
    pub wpm: String,
    pub accuracy: String,
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheatFigures {
    pub wpm: u32,
    pub accuracy_percent: f64,
    pub elapsed: Duration,
}

impl CheatForm {
    pub fn new(wpm: impl Into<String>, accuracy: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            wpm: wpm.into(),
            accuracy: accuracy.into(),
            time: time.into(),
        }
    }

    pub fn field_mut(&mut self, field: CheatField) -> &mut String {
        match field {
            CheatField::Wpm => &mut self.wpm,
            CheatField::Accuracy => &mut self.accuracy,
            CheatField::Time => &mut self.time,
        }
    }

    pub fn validate(&self) -> Result<CheatFigures, CheatErrors> {
        let mut errors = vec![];

        let wpm = match self.wpm.trim().parse::<u32>() {
            Ok(wpm) if wpm <= MAX_CHEAT_WPM => Some(wpm),
            Ok(_) => {
                errors.push(FieldError::new(
                    CheatField::Wpm,
                    format!("must be between 0 and {MAX_CHEAT_WPM}"),
                ));
                None
            }
            Err(_) => {
                errors.push(FieldError::new(CheatField::Wpm, "must be a whole number"));
                None
            }
        };

        let accuracy = match self.accuracy.trim().parse::<f64>() {
            Ok(acc) if (0.0..=100.0).contains(&acc) => Some(acc),
            Ok(_) => {
                errors.push(FieldError::new(
                    CheatField::Accuracy,
                    "must be between 0 and 100",
                ));
                None
            }
            Err(_) => {
                errors.push(FieldError::new(CheatField::Accuracy, "must be a number"));
                None
            }
        };

        let elapsed = match parse_mm_ss(self.time.trim()) {
            Some(elapsed) => Some(elapsed),
            None => {
                errors.push(FieldError::new(CheatField::Time, "must look like mm:ss"));
                None
            }
        };

        match (wpm, accuracy, elapsed) {
            (Some(wpm), Some(accuracy_percent), Some(elapsed)) => Ok(CheatFigures {
                wpm,
                accuracy_percent,
                elapsed,
            }),
            _ => Err(CheatErrors(errors)),
        }
    }
}

/// `mm:ss` with one or two minute digits and seconds below 60.
pub fn parse_mm_ss(text: &str) -> Option<Duration> {
    let (minutes, seconds) = text.split_once(':')?;
    let digits = |s: &str, max_len: usize| {
        !s.is_empty() && s.len() <= max_len && s.chars().all(|c| c.is_ascii_digit())
    };
    if !digits(minutes, 2) || !digits(seconds, 2) || seconds.len() != 2 {
        return None;
    }
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(Duration::from_secs(minutes * 60 + seconds))
}
