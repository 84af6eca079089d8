//! Hour-of-day aggregation over the persisted crowd log history.

use chrono::Timelike;
use common::analytics::{LogEntry, PeakHourBucket, PeakHourReport};

/// Groups the history by hour of day (0-23), ignoring the date, and sums
/// person counts per hour. Aggregation is a raw sum across all observed
/// days, not a per-day average. Hours with no observations are present
/// with a zero count, ordered 0 through 23.
pub fn aggregate(entries: &[LogEntry]) -> PeakHourReport {
    let mut hourly: Vec<PeakHourBucket> = (0..24).map(|hour| PeakHourBucket { hour, count: 0 }).collect();

    for entry in entries {
        let hour = entry.timestamp.hour() as usize;
        hourly[hour].count += u64::from(entry.person_count);
    }

    let peak_hour = if entries.is_empty() {
        None
    } else {
        // Ties resolve to the earliest hour.
        let mut best = 0usize;
        for (hour, bucket) in hourly.iter().enumerate() {
            if bucket.count > hourly[best].count {
                best = hour;
            }
        }
        Some(best as u32)
    };
    let peak_count = peak_hour.map_or(0, |hour| hourly[hour as usize].count);

    PeakHourReport {
        peak_hour,
        peak_count,
        hourly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::analytics::RiskLevel;
    use common::detection::AudioStatus;
    use uuid::Uuid;

    fn entry(day: u32, hour: u32, count: u32) -> LogEntry {
        LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, day, hour, 15, 0).unwrap(),
            person_count: count,
            risk_score: RiskLevel::Low,
            audio_status: AudioStatus::Normal,
        }
    }

    #[test]
    fn test_hand_constructed_history() {
        let entries = vec![
            entry(1, 9, 2),
            entry(2, 9, 4),
            entry(3, 9, 6),
            entry(1, 14, 10),
        ];
        let report = aggregate(&entries);
        assert_eq!(report.hourly.len(), 24);
        assert_eq!(report.hourly[9].count, 12);
        assert_eq!(report.hourly[14].count, 10);
        let others: u64 = report
            .hourly
            .iter()
            .filter(|b| b.hour != 9 && b.hour != 14)
            .map(|b| b.count)
            .sum();
        assert_eq!(others, 0);
        assert_eq!(report.peak_hour, Some(9));
        assert_eq!(report.peak_count, 12);
    }

    #[test]
    fn test_aggregation_sums_across_days() {
        let entries = vec![entry(1, 18, 3), entry(2, 18, 3), entry(3, 18, 3)];
        let report = aggregate(&entries);
        assert_eq!(report.hourly[18].count, 9);
    }

    #[test]
    fn test_buckets_are_hour_ordered() {
        let report = aggregate(&[entry(1, 23, 1), entry(1, 0, 1)]);
        for (i, bucket) in report.hourly.iter().enumerate() {
            assert_eq!(bucket.hour as usize, i);
        }
    }

    #[test]
    fn test_empty_history_has_no_peak() {
        let report = aggregate(&[]);
        assert_eq!(report.peak_hour, None);
        assert_eq!(report.peak_count, 0);
        assert!(report.hourly.iter().all(|b| b.count == 0));
    }
}
