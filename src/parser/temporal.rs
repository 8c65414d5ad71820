//! Regex extraction of party sizes, clock times and calendar dates from the
//! free-form text a booking page renders.
//!
//! Nothing here fails: unmatched text yields `None` or an empty result.

use chrono::{Datelike, Local, NaiveDate};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::time_arith::DATE_FORMAT;

const FULL_MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";
const SHORT_MONTHS: &str = "Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

static PARTY_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*(?:person|people)\b").unwrap());

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*([ap])\.?\s?m\b\.?").unwrap());

/// Date patterns from most to least specific; the first match wins.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i)\b({FULL_MONTHS})\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"),
        format!(r"(?i)\b({FULL_MONTHS})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"),
        format!(r"(?i)\b({SHORT_MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"),
        format!(r"(?i)\b({SHORT_MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// A calendar date (if one was found) and the clock times around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateAndTimes {
    pub date: Option<String>,
    pub times: Vec<String>,
}

/// Extract `<N> person` / `<N> people`.
pub fn parse_party_size(text: &str) -> Option<u32> {
    PARTY_SIZE_RE.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// Every `h:mm AM/PM` in `text`, in order of appearance, as `HH:mm:00`.
pub fn parse_times(text: &str) -> Vec<String> {
    CLOCK_TIME_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps[2].parse().ok()?;
            if !(1..=12).contains(&hour) || minute >= 60 {
                debug!("Ignoring out-of-range clock time: {}", &caps[0]);
                return None;
            }
            let hour_24 = convert_to_24_hour(hour, &caps[3]);
            Some(format!("{:02}:{:02}:00", hour_24, minute))
        })
        .collect()
}

/// First clock time of a single slot label, if any.
pub fn parse_time_label(label: &str) -> Option<String> {
    parse_times(label).into_iter().next()
}

/// Date and times from text, assuming the current year when none is written.
pub fn parse_date_and_times(text: &str) -> DateAndTimes {
    parse_date_and_times_in_year(text, Local::now().year())
}

/// Date and times from text, assuming `default_year` when none is written.
///
/// The matched date is cut out before the times are extracted so that day
/// numbers never read as times.
pub fn parse_date_and_times_in_year(text: &str, default_year: i32) -> DateAndTimes {
    if text.trim().is_empty() {
        return DateAndTimes::default();
    }

    for pattern in DATE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if text[whole.end()..].starts_with(':') {
                // "August 8:15 PM" - the number belongs to a clock time
                continue;
            }
            let Some(date) = date_from_captures(&caps, default_year) else {
                continue;
            };
            let remainder = format!("{} {}", &text[..whole.start()], &text[whole.end()..]);
            debug!("Matched date '{}' as {}", whole.as_str(), date);
            return DateAndTimes { date: Some(date), times: parse_times(&remainder) };
        }
    }

    DateAndTimes { date: None, times: parse_times(text) }
}

fn date_from_captures(caps: &Captures<'_>, default_year: i32) -> Option<String> {
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(y) => y.as_str().parse().ok()?,
        None => default_year,
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format(DATE_FORMAT).to_string())
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Convert a 12-hour clock hour to 24-hour form
fn convert_to_24_hour(hour: u32, meridiem: &str) -> u32 {
    match (hour, meridiem.to_ascii_lowercase().as_str()) {
        (12, "a") => 0,
        (12, "p") => 12,
        (h, "p") => h + 12,
        (h, _) => h,
    }
}
