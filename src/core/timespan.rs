use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;

const MS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// A raw [start, end] time span in UTC. Used for cross-issue accounting
/// after the caller has filtered stages down to the statuses it cares
/// about and clipped them to a bounding window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Round to one decimal place for display figures.
pub fn round1(num: f64) -> f64 {
    (num * 10.0).round() / 10.0
}

/// Elapsed wall-clock days between two instants (24h = 1.0).
pub fn date_diff_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let diff_ms = to.signed_duration_since(from).num_milliseconds().abs();
    diff_ms as f64 / MS_PER_DAY
}

/// Sort spans by start and merge overlapping or touching ones.
/// Merging is idempotent: re-merging an already-merged list returns it
/// unchanged.
pub fn merge_spans(spans: &[Span]) -> Vec<Span> {
    if spans.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<Span> = spans.to_vec();
    sorted.sort_by_key(|s| s.start);

    let mut merged: Vec<Span> = Vec::new();
    merged.push(sorted[0]);

    for span in &sorted[1..] {
        let last = merged.last_mut().unwrap();
        if span.start <= last.end {
            if span.end > last.end {
                last.end = span.end;
            }
        } else {
            merged.push(*span);
        }
    }

    merged
}

/// Total elapsed days covered by the spans, with overlaps merged first so
/// parallel work is not double-counted. Ignores the work-day calendar
/// entirely; this is raw wall-clock time for lead-time figures.
pub fn elapsed_days(spans: &[Span]) -> f64 {
    merge_spans(spans)
        .iter()
        .map(|s| date_diff_days(s.start, s.end))
        .sum()
}

/// True when `date`'s weekday is in the calendar. Weekday indices follow
/// the tracker UI convention: 0 = Sunday … 6 = Saturday.
pub fn is_work_day(date: NaiveDate, work_days: &[u32]) -> bool {
    work_days.contains(&date.weekday().num_days_from_sunday())
}

/// The [00:00:00.000, 23:59:59.999] UTC bounds of a calendar date.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_milli_opt(0, 0, 0, 0).unwrap().and_utc();
    let end = date.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();
    (start, end)
}

/// All calendar dates from `from` through `to`, inclusive.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = from;
    while current <= to {
        days.push(current);
        current += Duration::days(1);
    }
    days
}

/// Count the distinct work days any merged span overlaps. A day with ANY
/// overlap counts as one full day, never fractionally, and a day touched
/// by several disjoint spans still counts once. An empty calendar yields 0.
pub fn work_days_touched(spans: &[Span], work_days: &[u32]) -> u32 {
    let mut touched: BTreeSet<NaiveDate> = BTreeSet::new();

    for span in merge_spans(spans) {
        if span.end < span.start {
            continue;
        }
        for date in days_between(span.start.date_naive(), span.end.date_naive()) {
            if !is_work_day(date, work_days) {
                continue;
            }
            let (day_start, day_end) = day_bounds(date);
            if day_start <= span.end && day_end >= span.start {
                touched.insert(date);
            }
        }
    }

    touched.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn span(start: DateTime<Utc>, hours: i64) -> Span {
        Span {
            start,
            end: start + Duration::hours(hours),
        }
    }

    #[test]
    fn test_merge_overlapping_spans() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let spans = vec![span(base, 2), span(base + Duration::hours(1), 3)];
        let merged = merge_spans(&spans);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, base);
        assert_eq!(merged[0].end, base + Duration::hours(4));
    }

    #[test]
    fn test_merge_disjoint_spans() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let spans = vec![span(base, 1), span(base + Duration::hours(5), 1)];
        assert_eq!(merge_spans(&spans).len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let spans = vec![
            span(base, 2),
            span(base + Duration::hours(1), 3),
            span(base + Duration::hours(10), 1),
        ];
        let once = merge_spans(&spans);
        let twice = merge_spans(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_elapsed_days_merges_overlap() {
        // Two fully-overlapping 12h spans are 0.5 days, not 1.0.
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let spans = vec![span(base, 12), span(base, 12)];
        assert!((elapsed_days(&spans) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_days_empty() {
        assert_eq!(elapsed_days(&[]), 0.0);
    }

    #[test]
    fn test_date_diff_days() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert!((date_diff_days(from, to) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_is_work_day_sunday_indexed() {
        // 2024-01-07 is a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let mon_fri = [1, 2, 3, 4, 5];
        assert!(!is_work_day(sunday, &mon_fri));
        assert!(is_work_day(monday, &mon_fri));
    }

    #[test]
    fn test_work_days_touched_skips_weekend() {
        // Fri 2024-01-05 09:00 through Mon 2024-01-08 17:00 touches
        // Fri + Mon on a Mon-Fri calendar; the weekend doesn't count.
        let start = Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 8, 17, 0, 0).unwrap();
        let spans = vec![Span { start, end }];
        assert_eq!(work_days_touched(&spans, &[1, 2, 3, 4, 5]), 2);
    }

    #[test]
    fn test_work_days_touched_counts_day_once() {
        // Two disjoint spans on the same Monday count a single day.
        let morning = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 1, 8, 20, 0, 0).unwrap();
        let spans = vec![span(morning, 1), span(evening, 1)];
        assert_eq!(work_days_touched(&spans, &[1, 2, 3, 4, 5]), 1);
    }

    #[test]
    fn test_work_days_touched_partial_day_counts_full() {
        // A one-minute touch of a work day still counts the whole day.
        let start = Utc.with_ymd_and_hms(2024, 1, 8, 23, 58, 0).unwrap();
        let spans = vec![Span {
            start,
            end: start + Duration::minutes(1),
        }];
        assert_eq!(work_days_touched(&spans, &[1, 2, 3, 4, 5]), 1);
    }

    #[test]
    fn test_work_days_touched_empty_calendar() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let spans = vec![Span { start, end }];
        assert_eq!(work_days_touched(&spans, &[]), 0);
    }

    #[test]
    fn test_days_between_inclusive() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let days = days_between(from, to);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], from);
        assert_eq!(days[2], to);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(2.449), 2.4);
        assert_eq!(round1(2.45), 2.5);
        assert_eq!(round1(0.0), 0.0);
    }
}
