use wordrush::time_series::TimeSeriesPoint;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(points: &[TimeSeriesPoint], elapsed_secs: f64) -> (f64, f64) {
    let highest_wpm = points.iter().map(|p| p.wpm).fold(0.0, f64::max);

    let overall_duration = points
        .last()
        .map(|p| p.t)
        .unwrap_or(elapsed_secs)
        .max(elapsed_secs)
        .max(1.0);

    (overall_duration, highest_wpm.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

/// `m:ss` for a number of milliseconds.
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], 5.0);
        assert_eq!(x, 5.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_uses_peak() {
        let points = [
            TimeSeriesPoint::new(1.0, 30.0),
            TimeSeriesPoint::new(2.0, 64.4),
            TimeSeriesPoint::new(3.0, 50.0),
        ];
        assert_eq!(compute_chart_params(&points, 3.4), (3.4, 64.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65_400), "1:05");
    }
}
