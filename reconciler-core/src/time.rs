// Minute-granularity clock arithmetic shared by the sweeper and matcher

use chrono::NaiveDateTime;

/// Timestamp layout used by both the record store and the mutation feed.
/// Both sides are assumed to live in the same fixed process-wide timezone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Whole elapsed minutes from `earlier` to `now`. Partial minutes are not
/// counted, so 6m59s of elapsed time is 6 minutes.
pub fn whole_minutes_between(earlier: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - earlier).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn test_parse_valid_timestamp() {
        let parsed = ts("2025-08-25 10:30:00");
        assert_eq!(format_timestamp(parsed), "2025-08-25 10:30:00");
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert!(parse_timestamp(" 2025-08-25 10:30:00 ").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2025-08-25T10:30:00Z").is_none());
    }

    #[test]
    fn test_whole_minutes_truncate() {
        let now = ts("2025-08-25 10:07:00");
        assert_eq!(whole_minutes_between(now - Duration::seconds(419), now), 6);
        assert_eq!(whole_minutes_between(now - Duration::seconds(420), now), 7);
        assert_eq!(whole_minutes_between(now - Duration::seconds(59), now), 0);
    }

    #[test]
    fn test_whole_minutes_negative_for_future_instants() {
        let now = ts("2025-08-25 10:07:00");
        assert_eq!(whole_minutes_between(now + Duration::seconds(120), now), -2);
    }
}
