//! Canonical date/time decomposition and grid-stepping arithmetic.
//!
//! Dates are `YYYY-MM-DD` and clock times `HH:mm:ss` strings throughout the
//! engine. Clock times compare lexicographically and may carry hours past 23,
//! which act as exclusive end-of-day sentinels.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// First instant of a day.
pub const START_OF_DAY: &str = "00:00:00";
/// Last representable tick of a day, used as an inclusive window bound.
pub const END_OF_DAY: &str = "23:59:59";

static CLOCK_MINUTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}:(\d{2})").unwrap());

/// Spacing between grid ticks within one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Quarter,
    Half,
}

impl Granularity {
    pub fn minutes(&self) -> i64 {
        match self {
            Granularity::Quarter => 15,
            Granularity::Half => 30,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }

    /// Quarter-hour if any label shows a `:15` or `:45` minute, otherwise half-hour.
    ///
    /// Works on raw labels (`"8:15 PM"`) as well as canonical clock times.
    pub fn infer_from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let quarter = labels.iter().any(|label| {
            CLOCK_MINUTES_RE
                .captures_iter(label.as_ref())
                .any(|caps| matches!(&caps[1], "15" | "45"))
        });
        if quarter { Granularity::Quarter } else { Granularity::Half }
    }

    pub fn infer_from_times<'a, I>(times: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let times: Vec<&str> = times.into_iter().collect();
        Self::infer_from_labels(&times)
    }
}

/// Split a zone-aware instant into canonical date and time strings.
pub fn timestamp_to_date_and_time<Tz>(ts: &DateTime<Tz>) -> (String, String)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    (ts.format(DATE_FORMAT).to_string(), ts.format(TIME_FORMAT).to_string())
}

/// Calendar-correct day offset; rolls over month and year boundaries.
pub fn get_next_date(date: &str, delta_days: i64) -> Option<String> {
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    let next = day.checked_add_signed(Duration::days(delta_days))?;
    Some(next.format(DATE_FORMAT).to_string())
}

/// Add minutes to a clock time without wrapping the hour.
///
/// `get_next_time("23:45:00", 30)` is `"24:15:00"`, which stays distinct from
/// next-day midnight. Results before `00:00:00` are rejected.
pub fn get_next_time(time: &str, delta_minutes: i64) -> Option<String> {
    let (hours, minutes, seconds) = split_clock(time)?;
    let total = hours as i64 * 60 + minutes as i64 + delta_minutes;
    if total < 0 {
        return None;
    }
    Some(format!("{:02}:{:02}:{:02}", total / 60, total % 60, seconds))
}

/// Resolve a date and a possibly overflowing clock time to a local datetime.
pub fn date_time_to_naive(date: &str, time: &str) -> Option<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    let (hours, minutes, seconds) = split_clock(time)?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    midnight.checked_add_signed(
        Duration::hours(hours as i64)
            + Duration::minutes(minutes as i64)
            + Duration::seconds(seconds as i64),
    )
}

/// Place a canonical date and clock time in `tz`.
///
/// Ambiguous local times resolve to the earlier instant; times skipped by a
/// DST jump yield `None`.
pub fn local_instant<Tz: TimeZone>(date: &str, time: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let naive = date_time_to_naive(date, time)?;
    tz.from_local_datetime(&naive).earliest()
}

fn split_clock(time: &str) -> Option<(u32, u32, u32)> {
    let mut parts = time.trim().split(':');
    let hours = parts.next()?.parse::<u32>().ok()?;
    let minutes = parts.next()?.parse::<u32>().ok()?;
    let seconds = match parts.next() {
        Some(s) => s.parse::<u32>().ok()?,
        None => 0,
    };
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some((hours, minutes, seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use test_case::test_case;

    #[test_case("23:45:00", 30, Some("24:15:00") ; "hour is not wrapped")]
    #[test_case("20:30:00", -30, Some("20:00:00") ; "steps backward")]
    #[test_case("23:59:59", 15, Some("24:14:59") ; "keeps seconds")]
    #[test_case("00:00:00", -15, None ; "negative result")]
    #[test_case("8:15 PM", 15, None ; "not canonical")]
    fn test_get_next_time(time: &str, delta: i64, expected: Option<&str>) {
        assert_eq!(get_next_time(time, delta).as_deref(), expected);
    }

    #[test_case("2025-12-31", 1, Some("2026-01-01") ; "year rollover")]
    #[test_case("2024-02-28", 1, Some("2024-02-29") ; "leap day")]
    #[test_case("2025-03-01", -1, Some("2025-02-28") ; "backward across month")]
    #[test_case("2025-13-01", 1, None ; "invalid date")]
    fn test_get_next_date(date: &str, delta: i64, expected: Option<&str>) {
        assert_eq!(get_next_date(date, delta).as_deref(), expected);
    }

    #[test]
    fn test_granularity_inference() {
        assert_eq!(Granularity::infer_from_labels(&["8:30 PM", "9:00 PM"]), Granularity::Half);
        assert_eq!(Granularity::infer_from_labels(&["", "8:15 PM"]), Granularity::Quarter);
        assert_eq!(Granularity::infer_from_times(["11:45:00", "12:00:00"]), Granularity::Quarter);
        assert_eq!(Granularity::infer_from_times(["23:59:59"]), Granularity::Half);
        let empty: [&str; 0] = [];
        assert_eq!(Granularity::infer_from_labels(&empty), Granularity::Half);
    }

    #[test]
    fn test_sentinel_resolves_past_midnight() {
        let naive = date_time_to_naive("2025-08-03", "24:15:00").unwrap();
        assert_eq!(naive.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-08-04 00:15:00");
    }

    #[test]
    fn test_timestamp_round_trip_in_zone() {
        let ts = local_instant("2025-08-03", "20:15:00", &New_York).unwrap();
        let later = ts + Granularity::Half.duration() * 8;
        assert_eq!(
            timestamp_to_date_and_time(&later),
            ("2025-08-04".to_string(), "00:15:00".to_string())
        );
    }
}
