//! Display formatting for durations, percentiles and dates

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Format a number of minutes as `2h 5m`, `45m` or `0m`
pub fn format_duration(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Performance band for a percentile rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileBucket {
    Excellent,
    Good,
    Average,
    BelowAverage,
    NeedsImprovement,
    Unknown,
}

impl PercentileBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            PercentileBucket::Excellent => "excellent",
            PercentileBucket::Good => "good",
            PercentileBucket::Average => "average",
            PercentileBucket::BelowAverage => "below_average",
            PercentileBucket::NeedsImprovement => "needs_improvement",
            PercentileBucket::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PercentileBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a percentile; a missing (or NaN) percentile is `Unknown`
pub fn percentile_bucket(percentile: Option<f64>) -> PercentileBucket {
    match percentile {
        None => PercentileBucket::Unknown,
        Some(p) if p.is_nan() => PercentileBucket::Unknown,
        Some(p) if p >= 90.0 => PercentileBucket::Excellent,
        Some(p) if p >= 75.0 => PercentileBucket::Good,
        Some(p) if p >= 50.0 => PercentileBucket::Average,
        Some(p) if p >= 25.0 => PercentileBucket::BelowAverage,
        Some(_) => PercentileBucket::NeedsImprovement,
    }
}

/// Whole days from `now` until `target`; negative once `target` has passed
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (target - now).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(125), "2h 5m");
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(60), "1h 0m");
        assert_eq!(format_duration(1441), "24h 1m");
    }

    #[test]
    fn test_percentile_bucket_edges() {
        assert_eq!(percentile_bucket(Some(90.0)), PercentileBucket::Excellent);
        assert_eq!(percentile_bucket(Some(89.9)), PercentileBucket::Good);
        assert_eq!(percentile_bucket(Some(75.0)), PercentileBucket::Good);
        assert_eq!(percentile_bucket(Some(50.0)), PercentileBucket::Average);
        assert_eq!(percentile_bucket(Some(25.0)), PercentileBucket::BelowAverage);
        assert_eq!(
            percentile_bucket(Some(24.99)),
            PercentileBucket::NeedsImprovement
        );
        assert_eq!(percentile_bucket(Some(0.0)), PercentileBucket::NeedsImprovement);
        assert_eq!(percentile_bucket(None), PercentileBucket::Unknown);
        assert_eq!(percentile_bucket(Some(f64::NAN)), PercentileBucket::Unknown);
    }

    #[test]
    fn test_bucket_display() {
        assert_eq!(PercentileBucket::BelowAverage.to_string(), "below_average");
        assert_eq!(
            serde_json::to_string(&PercentileBucket::NeedsImprovement).unwrap(),
            "\"needs_improvement\""
        );
    }

    #[test]
    fn test_days_until() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(days_until(now + Duration::days(10), now), 10);
        assert_eq!(days_until(now - Duration::days(3), now), -3);
        assert_eq!(days_until(now + Duration::hours(5), now), 0);
    }
}
