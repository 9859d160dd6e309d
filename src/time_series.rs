use std::time::Duration;

/// Live WPM at a given second of effective round time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// One sample per whole second of effective time, no matter how often it is
/// offered a value.
#[derive(Debug, Clone, Default)]
pub struct WpmSeries {
    points: Vec<TimeSeriesPoint>,
}

impl WpmSeries {
    /// Returns true if a new point was stored.
    pub fn offer(&mut self, effective_elapsed: Duration, wpm: u32) -> bool {
        let second = effective_elapsed.as_secs();
        if second == 0 {
            return false;
        }
        let last = self.points.last().map(|p| p.t as u64).unwrap_or(0);
        if second <= last {
            return false;
        }
        self.points
            .push(TimeSeriesPoint::new(second as f64, wpm as f64));
        true
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn as_tuples(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (*p).into()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_point_per_second() {
        let mut series = WpmSeries::default();
        assert!(!series.offer(Duration::from_millis(400), 10));
        assert!(series.offer(Duration::from_millis(1100), 20));
        assert!(!series.offer(Duration::from_millis(1900), 30));
        assert!(series.offer(Duration::from_millis(3050), 40));
        assert_eq!(series.as_tuples(), vec![(1.0, 20.0), (3.0, 40.0)]);
    }
}
