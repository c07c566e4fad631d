use crate::types::{Comment, DayBucket};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Count comments per calendar day over the `days`-day window ending at
/// `today`, inclusive.
///
/// The deliverable is the full sequence: exactly `days` buckets, oldest
/// day first, days with no comments present with a zero count. Comments
/// published outside the window are ignored.
pub fn daily_counts(comments: &[Comment], days: usize, today: NaiveDate) -> Vec<DayBucket> {
    if days == 0 {
        return Vec::new();
    }

    let window_start = today - Duration::days(days as i64 - 1);

    let mut counts: HashMap<NaiveDate, u64> = HashMap::new();
    for comment in comments {
        let date = comment.published_at.date_naive();
        if date >= window_start && date <= today {
            *counts.entry(date).or_insert(0) += 1;
        }
    }

    (0..days)
        .map(|offset| {
            let date = window_start + Duration::days(offset as i64);
            DayBucket {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn comment_on(date: NaiveDate) -> Comment {
        let at = Utc
            .from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap());
        Comment::new("text", 0, at)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exact_length_and_order() {
        let today = day(2026, 8, 28);
        let buckets = daily_counts(&[], 7, today);

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, day(2026, 8, 22));
        assert_eq!(buckets[6].date, today);
        // Dates are sequential with no gaps.
        for pair in buckets.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        assert!(buckets.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_counts_and_zero_fill() {
        let today = day(2026, 8, 28);
        let comments = vec![
            comment_on(day(2026, 8, 28)),
            comment_on(day(2026, 8, 28)),
            comment_on(day(2026, 8, 26)),
        ];

        let buckets = daily_counts(&comments, 7, today);
        assert_eq!(buckets[6].count, 2);
        assert_eq!(buckets[4].count, 1);
        assert_eq!(buckets[5].count, 0);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn test_out_of_window_comments_ignored() {
        let today = day(2026, 8, 28);
        let comments = vec![
            comment_on(day(2026, 8, 21)), // one day too old for 7 days
            comment_on(day(2026, 8, 22)), // oldest in-window day
            comment_on(day(2026, 8, 29)), // future
        ];

        let buckets = daily_counts(&comments, 7, today);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 1);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn test_window_spans_month_boundary() {
        let today = day(2026, 9, 2);
        let buckets = daily_counts(&[], 28, today);
        assert_eq!(buckets.len(), 28);
        assert_eq!(buckets[0].date, day(2026, 8, 6));
        assert_eq!(buckets[27].date, today);
    }

    #[test]
    fn test_zero_days_yields_empty() {
        assert!(daily_counts(&[], 0, day(2026, 8, 28)).is_empty());
    }
}
