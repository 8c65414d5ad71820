//! Time-grid reconstruction for slot rows that render only some of their labels.
//!
//! A row is read as evenly spaced grid positions. Positions with a label are
//! available; blank positions are unavailable ticks placed by the grid.

use chrono::{DateTime, TimeZone};
use log::debug;
use std::fmt::Display;

use crate::parser::parse_time_label;
use crate::records::{Availability, TimeSlotObservation};
use crate::time_arith::{Granularity, get_next_date, local_instant, timestamp_to_date_and_time};

/// Fill the gaps of a sparse slot row on `date`.
///
/// Runs of blank positions are filled as follows:
/// * between two known times, every grid tick strictly between them;
/// * before the first known time, one tick per blank stepping backward;
/// * after the last known time, one tick per blank stepping forward.
///
/// A label that falls before the previous known time lies past
/// midnight and moves to the following date.
///
/// Output is chronological. Empty or all-blank rows produce nothing.
pub fn infer_grid<S, Tz>(date: &str, labels: &[S], tz: &Tz) -> Vec<TimeSlotObservation>
where
    S: AsRef<str>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let granularity = Granularity::infer_from_labels(labels);
    let step = granularity.duration();

    let positions = place_labels(date, labels, tz);

    if positions.iter().all(Option::is_none) {
        debug!("Grid row for {} has no readable labels", date);
        return Vec::new();
    }

    let mut ticks: Vec<(DateTime<Tz>, Availability)> = Vec::with_capacity(positions.len());
    let mut i = 0;
    while i < positions.len() {
        if let Some(ts) = &positions[i] {
            ticks.push((ts.clone(), Availability::Available));
            i += 1;
            continue;
        }

        let run_start = i;
        while i < positions.len() && positions[i].is_none() {
            i += 1;
        }
        let run_len = (i - run_start) as i32;
        let left = run_start.checked_sub(1).and_then(|j| positions[j].clone());
        let right = positions.get(i).cloned().flatten();

        match (left, right) {
            (Some(left), Some(right)) => {
                let mut ts = left + step;
                while ts < right {
                    ticks.push((ts.clone(), Availability::Unavailable));
                    ts = ts + step;
                }
            }
            (None, Some(right)) => {
                for k in (1..=run_len).rev() {
                    ticks.push((right.clone() - step * k, Availability::Unavailable));
                }
            }
            (Some(left), None) => {
                for k in 1..=run_len {
                    ticks.push((left.clone() + step * k, Availability::Unavailable));
                }
            }
            (None, None) => {}
        }
    }

    // A known label always wins over a synthesized tick at the same instant.
    ticks.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.is_available().cmp(&a.1.is_available())));
    ticks.dedup_by(|later, earlier| later.0 == earlier.0);

    debug!(
        "Grid row for {} ({}-minute grid): {} labels -> {} ticks",
        date,
        granularity.minutes(),
        labels.len(),
        ticks.len()
    );

    ticks
        .into_iter()
        .map(|(ts, availability)| {
            let (date, time) = timestamp_to_date_and_time(&ts);
            TimeSlotObservation { date, time, availability }
        })
        .collect()
}

fn place_labels<S, Tz>(date: &str, labels: &[S], tz: &Tz) -> Vec<Option<DateTime<Tz>>>
where
    S: AsRef<str>,
    Tz: TimeZone,
{
    let place = |day: i64, time: &str| {
        get_next_date(date, day).and_then(|d| local_instant(&d, time, tz))
    };

    let mut day = 0;
    let mut last: Option<DateTime<Tz>> = None;
    let mut positions = Vec::with_capacity(labels.len());
    for label in labels {
        let Some(time) = parse_time_label(label.as_ref()) else {
            positions.push(None);
            continue;
        };
        let mut ts = place(day, time.as_str());
        let before_last = matches!((&last, &ts), (Some(prev), Some(cur)) if cur < prev);
        if before_last {
            day += 1;
            debug!("Label {} on {} rolls over to day +{}", time, date, day);
            ts = place(day, time.as_str());
        }
        if ts.is_some() {
            last = ts.clone();
        }
        positions.push(ts);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Availability::{Available, Unavailable};
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;

    fn slots(rows: &[(&str, &str, Availability)]) -> Vec<TimeSlotObservation> {
        rows.iter().map(|(d, t, a)| TimeSlotObservation::new(*d, *t, *a)).collect()
    }

    #[test]
    fn test_leading_and_trailing_blanks() {
        let result = infer_grid("2025-08-03", &["", "", "8:30 PM", "9:00 PM", ""], &New_York);
        assert_eq!(
            result,
            slots(&[
                ("2025-08-03", "19:30:00", Unavailable),
                ("2025-08-03", "20:00:00", Unavailable),
                ("2025-08-03", "20:30:00", Available),
                ("2025-08-03", "21:00:00", Available),
                ("2025-08-03", "21:30:00", Unavailable),
            ])
        );
    }

    #[test]
    fn test_bounded_gap_fills_every_tick_between() {
        let result = infer_grid("2025-08-03", &["5:00 PM", "", "6:15 PM"], &New_York);
        let times: Vec<_> = result.iter().map(|s| (s.time.as_str(), s.availability)).collect();
        assert_eq!(
            times,
            vec![
                ("17:00:00", Available),
                ("17:15:00", Unavailable),
                ("17:30:00", Unavailable),
                ("17:45:00", Unavailable),
                ("18:00:00", Unavailable),
                ("18:15:00", Available),
            ]
        );
    }

    #[test]
    fn test_trailing_blank_crosses_midnight() {
        let result = infer_grid("2025-12-31", &["11:30 PM", ""], &New_York);
        assert_eq!(
            result,
            slots(&[
                ("2025-12-31", "23:30:00", Available),
                ("2026-01-01", "00:00:00", Unavailable),
            ])
        );
    }

    #[test]
    fn test_labels_past_midnight_move_to_next_date() {
        let result = infer_grid("2025-12-11", &["11:30 PM", "", "12:30 AM"], &New_York);
        assert_eq!(
            result,
            slots(&[
                ("2025-12-11", "23:30:00", Available),
                ("2025-12-12", "00:00:00", Unavailable),
                ("2025-12-12", "00:30:00", Available),
            ])
        );
    }

    #[test]
    fn test_rerun_on_own_available_output_is_stable() {
        let first = infer_grid("2025-08-03", &["", "12:00 PM", "", "1:00 PM"], &New_York);
        let labels: Vec<String> = first
            .iter()
            .filter(|s| s.availability.is_available())
            .map(|s| {
                let hour: u32 = s.time[..2].parse().unwrap();
                let meridiem = if hour >= 12 { "PM" } else { "AM" };
                let h12 = match hour % 12 {
                    0 => 12,
                    h => h,
                };
                format!("{}:{} {}", h12, &s.time[3..5], meridiem)
            })
            .collect();

        let second = infer_grid("2025-08-03", &labels, &New_York);
        let available: Vec<_> =
            first.into_iter().filter(|s| s.availability.is_available()).collect();
        assert_eq!(second, available);
    }

    #[test]
    fn test_empty_and_blank_rows() {
        let empty: [&str; 0] = [];
        assert!(infer_grid("2025-08-03", &empty, &New_York).is_empty());
        assert!(infer_grid("2025-08-03", &["", " ", "Notify me"], &New_York).is_empty());
    }

    #[test]
    fn test_unreadable_label_counts_as_gap() {
        let result = infer_grid("2025-08-03", &["Notify me", "6:00 PM"], &New_York);
        assert_eq!(
            result,
            slots(&[
                ("2025-08-03", "17:30:00", Unavailable),
                ("2025-08-03", "18:00:00", Available),
            ])
        );
    }
}
