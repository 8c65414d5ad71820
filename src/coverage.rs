//! Scores gathered records against the harness's availability queries.
//!
//! A query is a list of alternative conditions. It is covered as soon as one
//! alternative is seen available, or at the end when every slot of every
//! alternative has been refuted by collected unavailability evidence.

use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::records::{IntervalObservation, PointObservation, Record};
use crate::time_arith::date_time_to_naive;

static WITHIN_HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"within ([\d\.]+) hours").unwrap());

const TOO_FAR_IN_ADVANCE: &str = "take online reservations that far in advance";
const PARTY_TOO_SMALL: &str = "your party is too small";
const PARTY_TOO_LARGE: &str = "your party is too large";
const NO_ONLINE_AVAILABILITY: &str = "no online availability";

/// One alternative condition; every present list holds acceptable values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiCandidateQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_sizes: Option<Vec<u32>>,
}

/// A single slot drawn from a [`MultiCandidateQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SingleCandidateQuery<'a> {
    restaurant_name: Option<&'a str>,
    party_size: Option<u32>,
    date: Option<&'a str>,
    time: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub score: f64,
    pub n_queries: usize,
    pub n_covered: usize,
    pub queries: Vec<Vec<MultiCandidateQuery>>,
    pub is_query_covered: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartyIssue {
    TooSmall,
    TooLarge,
}

/// How a record bears on a query.
enum Evidence<'a> {
    /// "No online availability within N hours" around a point.
    Window {
        point: &'a PointObservation,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
    /// A half-open unavailable span.
    Span(&'a IntervalObservation),
    /// A single unavailable slot.
    Unavailable(&'a PointObservation),
    Available(&'a PointObservation),
}

impl<'a> Evidence<'a> {
    fn classify(record: &'a Record) -> Self {
        match record {
            Record::Interval(interval) => Evidence::Span(interval),
            Record::Point(point) => {
                let info = point.info.to_lowercase();
                if info.contains(NO_ONLINE_AVAILABILITY) {
                    let (start, end) = parse_date_time_range(&point.date, &point.time, &point.info);
                    Evidence::Window { point, start, end }
                } else if info.contains("unavailable") || info.contains("unfortunately") {
                    Evidence::Unavailable(point)
                } else {
                    Evidence::Available(point)
                }
            }
        }
    }
}

/// Gathers records over an episode and decides which queries they cover.
#[derive(Debug, Clone)]
pub struct InfoGathering {
    queries: Vec<Vec<MultiCandidateQuery>>,
    all_infos: Vec<Vec<Record>>,
    is_query_covered: Vec<bool>,
    // per query, per alternative
    unavailable_evidences: Vec<Vec<Vec<Record>>>,
}

impl InfoGathering {
    pub fn new(queries: Vec<Vec<MultiCandidateQuery>>) -> Self {
        let is_query_covered = vec![false; queries.len()];
        let unavailable_evidences =
            queries.iter().map(|alts| vec![Vec::new(); alts.len()]).collect();
        Self { queries, all_infos: Vec::new(), is_query_covered, unavailable_evidences }
    }

    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.queries));
    }

    pub fn all_infos(&self) -> &[Vec<Record>] {
        &self.all_infos
    }

    pub fn is_query_covered(&self) -> &[bool] {
        &self.is_query_covered
    }

    /// Feed the records of one extraction pass.
    pub fn update(&mut self, infos: Vec<Record>) {
        info!("InfoGathering.update gathered {} intermediate infos", infos.len());

        for record in &infos {
            let text = record.info().to_lowercase();
            if text.contains(TOO_FAR_IN_ADVANCE) {
                self.handle_too_far_in_advance(record);
            }
            if text.contains(PARTY_TOO_SMALL) {
                self.handle_party_issue(record, PartyIssue::TooSmall);
            }
            if text.contains(PARTY_TOO_LARGE) {
                self.handle_party_issue(record, PartyIssue::TooLarge);
            }
        }

        for i in 0..self.queries.len() {
            if self.is_query_covered[i] {
                continue;
            }
            for record in &infos {
                if self.check_alternative_conditions(i, record) {
                    info!("InfoGathering.update found {}-th query covered by {:?}", i, record);
                    self.is_query_covered[i] = true;
                    break;
                }
            }
        }

        self.all_infos.push(infos);
    }

    /// Final score: queries exhausted by evidence count as covered.
    pub fn compute(&mut self) -> CoverageResult {
        for i in 0..self.queries.len() {
            if self.is_query_covered[i] {
                continue;
            }
            let exhausted = self.queries[i]
                .iter()
                .zip(&self.unavailable_evidences[i])
                .all(|(alternative, evidences)| is_exhausted(alternative, evidences));
            if exhausted {
                info!("InfoGathering.compute found {}-th query exhausted", i);
                self.is_query_covered[i] = true;
            }
        }

        let n_queries = self.queries.len();
        let n_covered = self.is_query_covered.iter().filter(|c| **c).count();
        let result = CoverageResult {
            score: n_covered as f64 / n_queries.max(1) as f64,
            n_queries,
            n_covered,
            queries: self.queries.clone(),
            is_query_covered: self.is_query_covered.clone(),
        };
        info!("InfoGathering.compute final score {} ({}/{})", result.score, n_covered, n_queries);
        result
    }

    /// A restaurant that refuses bookings from some date on covers every
    /// alternative for it whose dates all fall on or after that date.
    fn handle_too_far_in_advance(&mut self, record: &Record) {
        let Record::Point(point) = record else {
            return;
        };
        let restaurant = point.restaurant_name.to_lowercase();
        info!("InfoGathering found 'too far in advance' for {} on {}", restaurant, point.date);

        for i in 0..self.queries.len() {
            if self.is_query_covered[i] {
                continue;
            }
            let covered = self.queries[i].iter().any(|alternative| {
                names_include(alternative, &restaurant)
                    && non_empty(&alternative.dates).is_some_and(|dates| {
                        dates.iter().all(|d| d.as_str() >= point.date.as_str())
                    })
            });
            if covered {
                info!("InfoGathering marking query {} as covered: all dates >= {}", i, point.date);
                self.is_query_covered[i] = true;
            }
        }
    }

    fn handle_party_issue(&mut self, record: &Record, issue: PartyIssue) {
        let Some(size) = record.party_size() else {
            return;
        };
        let restaurant = record.restaurant_name().to_lowercase();
        info!("InfoGathering found party {:?} for {} with party size {}", issue, restaurant, size);

        for i in 0..self.queries.len() {
            if self.is_query_covered[i] {
                continue;
            }
            let covered = self.queries[i].iter().any(|alternative| {
                names_include(alternative, &restaurant)
                    && non_empty(&alternative.party_sizes).is_some_and(|sizes| {
                        sizes.iter().all(|p| match issue {
                            PartyIssue::TooSmall => *p <= size,
                            PartyIssue::TooLarge => *p >= size,
                        })
                    })
            });
            if covered {
                info!("InfoGathering marking query {} as covered due to party {:?}", i, issue);
                self.is_query_covered[i] = true;
            }
        }
    }

    fn check_alternative_conditions(&mut self, i: usize, record: &Record) -> bool {
        let alternatives = &self.queries[i];
        let evidences = &mut self.unavailable_evidences[i];
        alternatives.iter().zip(evidences.iter_mut()).any(|(alternative, evidences)| {
            check_multi_candidate_query(alternative, record, evidences)
        })
    }
}

/// True if `record` shows `query` available. A record that covers the query
/// but shows it unavailable is kept as evidence instead.
fn check_multi_candidate_query(
    query: &MultiCandidateQuery,
    record: &Record,
    evidences: &mut Vec<Record>,
) -> bool {
    if let Some(names) = non_empty(&query.restaurant_names) {
        let name = record.restaurant_name().to_lowercase();
        if !names.iter().any(|n| n.to_lowercase() == name) {
            return false;
        }
    }
    if let Some(sizes) = non_empty(&query.party_sizes) {
        if !record.party_size().is_some_and(|size| sizes.contains(&size)) {
            return false;
        }
    }

    let dates = non_empty(&query.dates);
    let times = non_empty(&query.times);

    let refuted = match Evidence::classify(record) {
        Evidence::Window { point, start, end } => match (dates, times) {
            (Some(dates), Some(times)) => cartesian(dates, times).any(|(d, t)| {
                match (start, end, date_time_to_naive(d, t)) {
                    (Some(start), Some(end), Some(ts)) => start <= ts && ts <= end,
                    _ => false,
                }
            }),
            (Some(dates), None) => dates.contains(&point.date),
            (None, Some(times)) => times.contains(&point.time),
            (None, None) => false,
        },
        Evidence::Span(interval) => match (dates, times) {
            (Some(dates), Some(times)) => {
                cartesian(dates, times).any(|(d, t)| span_contains(interval, d, t))
            }
            (Some(dates), None) => dates.iter().any(|d| {
                interval.start_date.as_str() <= d.as_str()
                    && d.as_str() < interval.end_date.as_str()
            }),
            (None, Some(times)) => times.iter().any(|t| {
                interval.start_time.as_str() <= t.as_str()
                    && t.as_str() < interval.end_time.as_str()
            }),
            (None, None) => false,
        },
        Evidence::Unavailable(point) => {
            dates.map_or(true, |dates| dates.contains(&point.date))
                && times.map_or(true, |times| times.contains(&point.time))
        }
        Evidence::Available(point) => {
            return dates.map_or(true, |dates| dates.contains(&point.date))
                && times.map_or(true, |times| times.contains(&point.time));
        }
    };

    if refuted {
        evidences.push(record.clone());
    }
    false
}

/// True if `record` settles the single slot `query` as unavailable.
fn check_single_candidate_query(query: &SingleCandidateQuery<'_>, record: &Record) -> bool {
    if let Some(name) = query.restaurant_name {
        if record.restaurant_name().to_lowercase() != name.to_lowercase() {
            return false;
        }
    }
    if let Some(size) = query.party_size {
        if record.party_size() != Some(size) {
            return false;
        }
    }

    match Evidence::classify(record) {
        Evidence::Window { point, start, end } => match (query.date, query.time) {
            (Some(d), Some(t)) => match (start, end, date_time_to_naive(d, t)) {
                (Some(start), Some(end), Some(ts)) => start <= ts && ts <= end,
                _ => false,
            },
            (Some(d), None) => point.date == d,
            (None, Some(t)) => point.time == t,
            (None, None) => false,
        },
        Evidence::Span(interval) => match (query.date, query.time) {
            (Some(d), Some(t)) => span_contains(interval, d, t),
            (Some(d), None) => interval.start_date.as_str() <= d && d < interval.end_date.as_str(),
            (None, Some(t)) => interval.start_time.as_str() <= t && t < interval.end_time.as_str(),
            (None, None) => false,
        },
        Evidence::Unavailable(point) | Evidence::Available(point) => {
            query.date.map_or(true, |d| point.date == d)
                && query.time.map_or(true, |t| point.time == t)
        }
    }
}

/// Every name × party size × date × time slot of `query` is refuted.
fn is_exhausted(query: &MultiCandidateQuery, evidences: &[Record]) -> bool {
    let names = options(&query.restaurant_names, String::as_str);
    let sizes = options(&query.party_sizes, |s| *s);
    let dates = options(&query.dates, String::as_str);
    let times = options(&query.times, String::as_str);

    for &restaurant_name in &names {
        for &party_size in &sizes {
            for &date in &dates {
                for &time in &times {
                    let slot = SingleCandidateQuery { restaurant_name, party_size, date, time };
                    if !evidences.iter().any(|record| check_single_candidate_query(&slot, record)) {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn span_contains(interval: &IntervalObservation, date: &str, time: &str) -> bool {
    let start = date_time_to_naive(&interval.start_date, &interval.start_time);
    let end = date_time_to_naive(&interval.end_date, &interval.end_time);
    match (start, end, date_time_to_naive(date, time)) {
        (Some(start), Some(end), Some(ts)) => start <= ts && ts < end,
        _ => false,
    }
}

/// `[t - h, t + h]` for "... within h hours"; the instant itself otherwise.
fn parse_date_time_range(
    date: &str,
    time: &str,
    info: &str,
) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let base = date_time_to_naive(date, time);
    let hours = WITHIN_HOURS_RE.captures(info).and_then(|caps| caps[1].parse::<f64>().ok());
    match (base, hours) {
        (Some(base), Some(hours)) => {
            let half_width = Duration::milliseconds((hours * 3_600_000.0) as i64);
            (Some(base - half_width), Some(base + half_width))
        }
        _ => {
            warn!("InfoGathering could not parse date time range from info: {}", info);
            (base, base)
        }
    }
}

fn names_include(query: &MultiCandidateQuery, restaurant: &str) -> bool {
    non_empty(&query.restaurant_names)
        .is_some_and(|names| names.iter().any(|n| n.to_lowercase() == restaurant))
}

fn non_empty<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    values.as_deref().filter(|v| !v.is_empty())
}

/// Present values as `Some`, or a single `None` wildcard.
fn options<'a, T, U>(values: &'a Option<Vec<T>>, f: impl Fn(&'a T) -> U) -> Vec<Option<U>> {
    match non_empty(values) {
        Some(values) => values.iter().map(|v| Some(f(v))).collect(),
        None => vec![None],
    }
}

fn cartesian<'a>(
    dates: &'a [String],
    times: &'a [String],
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    dates.iter().flat_map(move |d| times.iter().map(move |t| (d.as_str(), t.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AvailabilityInterval, RestaurantContext};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn ctx(name: &str, party_size: u32) -> RestaurantContext {
        RestaurantContext {
            url: "https://www.opentable.com".to_string(),
            restaurant_name: name.to_string(),
            party_size: Some(party_size),
            base_date: "2025-12-11".to_string(),
            base_time: "19:00:00".to_string(),
        }
    }

    fn query(dates: &[&str], times: &[&str]) -> MultiCandidateQuery {
        MultiCandidateQuery {
            restaurant_names: Some(vec!["abrazo".to_string()]),
            dates: Some(dates.iter().map(|s| s.to_string()).collect()),
            times: Some(times.iter().map(|s| s.to_string()).collect()),
            party_sizes: Some(vec![2]),
        }
    }

    fn span(start: (&str, &str), end: (&str, &str)) -> AvailabilityInterval {
        AvailabilityInterval {
            start_date: start.0.to_string(),
            start_time: start.1.to_string(),
            end_date: end.0.to_string(),
            end_time: end.1.to_string(),
            info: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_available_slot_covers_query() {
        let mut metric =
            InfoGathering::new(vec![vec![query(&["2025-12-11"], &["19:00:00", "19:30:00"])]]);
        metric.update(vec![Record::point(
            &ctx("Abrazo", 2),
            "2025-12-11",
            "19:30:00",
            "available",
        )]);
        assert_eq!(metric.is_query_covered(), &[true]);
        assert_eq!(metric.compute().score, 1.0);
    }

    #[test]
    fn test_wrong_party_size_does_not_cover() {
        let mut metric = InfoGathering::new(vec![vec![query(&["2025-12-11"], &["19:00:00"])]]);
        metric.update(vec![Record::point(
            &ctx("Abrazo", 4),
            "2025-12-11",
            "19:00:00",
            "available",
        )]);
        let result = metric.compute();
        assert_eq!(result.n_covered, 0);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_interval_and_points_exhaust_query() {
        let mut metric = InfoGathering::new(vec![vec![query(
            &["2025-12-11", "2025-12-12"],
            &["19:00:00", "20:00:00"],
        )]]);
        let interval = span(("2025-12-11", "19:00:00"), ("2025-12-12", "18:00:00"));
        metric.update(vec![Record::from_interval(&ctx("Abrazo", 2), &interval)]);
        assert!(!metric.compute().is_query_covered[0]);

        metric.update(vec![
            Record::point(&ctx("Abrazo", 2), "2025-12-12", "19:00:00", "unavailable"),
            Record::point(&ctx("Abrazo", 2), "2025-12-12", "20:00:00", "unavailable"),
        ]);
        let result = metric.compute();
        assert_eq!(result.is_query_covered, vec![true]);
        assert_eq!(metric.all_infos().len(), 2);
    }

    #[test_case(&["2025-12-11"], &[], true ; "dates only inside span")]
    #[test_case(&["2025-12-12"], &[], false ; "dates only on end date")]
    #[test_case(&[], &["20:00:00"], true ; "times only inside span")]
    #[test_case(&[], &["22:00:00"], false ; "times only past end time")]
    fn test_interval_against_partial_query(dates: &[&str], times: &[&str], covered: bool) {
        let mut metric = InfoGathering::new(vec![vec![query(dates, times)]]);
        let interval = span(("2025-12-11", "19:00:00"), ("2025-12-12", "21:00:00"));
        metric.update(vec![Record::from_interval(&ctx("Abrazo", 2), &interval)]);
        assert_eq!(metric.is_query_covered(), &[false]);
        assert_eq!(metric.compute().is_query_covered, vec![covered]);
    }

    #[test]
    fn test_no_online_availability_window() {
        let mut metric =
            InfoGathering::new(vec![vec![query(&["2025-12-11"], &["18:00:00", "20:30:00"])]]);
        metric.update(vec![Record::point(
            &ctx("Abrazo", 2),
            "2025-12-11",
            "19:00:00",
            "No online availability within 2.5 hours of 7:00 PM",
        )]);
        assert_eq!(metric.compute().n_covered, 1);
    }

    #[test_case(&["2025-12-11"], &[], true ; "dates only on notice date")]
    #[test_case(&["2025-12-12"], &[], false ; "dates only on another date")]
    #[test_case(&[], &["19:00:00"], true ; "times only at notice time")]
    fn test_window_against_partial_query(dates: &[&str], times: &[&str], covered: bool) {
        let mut metric = InfoGathering::new(vec![vec![query(dates, times)]]);
        metric.update(vec![Record::point(
            &ctx("Abrazo", 2),
            "2025-12-11",
            "19:00:00",
            "No online availability within 2.5 hours of 7:00 PM",
        )]);
        assert_eq!(metric.compute().is_query_covered, vec![covered]);
    }

    #[test]
    fn test_unfortunately_notice_counts_as_unavailable() {
        let mut metric = InfoGathering::new(vec![vec![query(&["2025-12-11"], &["19:00:00"])]]);
        metric.update(vec![Record::point(
            &ctx("Abrazo", 2),
            "2025-12-11",
            "19:00:00",
            "Unfortunately, there is currently no availability for your party.",
        )]);
        assert_eq!(metric.is_query_covered(), &[false]);
        assert_eq!(metric.compute().is_query_covered, vec![true]);
    }

    #[test]
    fn test_too_far_in_advance_covers_later_dates() {
        let mut metric = InfoGathering::new(vec![
            vec![query(&["2026-03-01", "2026-03-02"], &["19:00:00"])],
            vec![query(&["2025-12-20"], &["19:00:00"])],
        ]);
        metric.update(vec![Record::point(
            &ctx("ABRAZO", 2),
            "2026-02-15",
            "19:00:00",
            "Abrazo does not take online reservations that far in advance.",
        )]);
        assert_eq!(metric.is_query_covered(), &[true, false]);
    }

    #[test_case(9, "Your party is too large", &[9, 10], true ; "large covers larger sizes")]
    #[test_case(9, "Your party is too large", &[4], false ; "large leaves smaller sizes")]
    #[test_case(1, "Your party is too small", &[1], true ; "small covers same size")]
    #[test_case(2, "Your party is too small", &[1, 2], true ; "small covers smaller sizes")]
    #[test_case(1, "Your party is too small", &[2], false ; "small leaves larger sizes")]
    fn test_party_size_notice(size: u32, notice: &str, sizes: &[u32], covered: bool) {
        let mut alternative = query(&["2025-12-11"], &["19:00:00"]);
        alternative.party_sizes = Some(sizes.to_vec());
        let mut metric = InfoGathering::new(vec![vec![alternative]]);
        metric.update(vec![Record::point(&ctx("Abrazo", size), "2025-12-11", "19:00:00", notice)]);
        assert_eq!(metric.is_query_covered(), &[covered]);
    }

    #[test]
    fn test_reset_clears_progress() {
        let mut metric = InfoGathering::new(vec![vec![query(&["2025-12-11"], &["19:00:00"])]]);
        metric.update(vec![Record::point(
            &ctx("Abrazo", 2),
            "2025-12-11",
            "19:00:00",
            "available",
        )]);
        assert_eq!(metric.is_query_covered(), &[true]);

        metric.reset();
        assert_eq!(metric.is_query_covered(), &[false]);
        assert!(metric.all_infos().is_empty());
    }

    #[test]
    fn test_empty_query_list_scores_zero() {
        let mut metric = InfoGathering::new(Vec::new());
        let result = metric.compute();
        assert_eq!(result.n_queries, 0);
        assert_eq!(result.score, 0.0);
    }
}
