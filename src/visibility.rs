//! Partial observability for scrollable slot lists.
//!
//! An agent only perceives the slots scrolled into view, so availability is
//! asserted only inside the band the visible slots disclose. A visible extreme
//! item discloses its whole end of the day.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::records::{Availability, TimeSlotObservation};
use crate::time_arith::{END_OF_DAY, Granularity, START_OF_DAY, get_next_time};

/// One rendered slot of a day and whether it was in view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotVisibility {
    pub time: String,
    pub visible: bool,
}

impl SlotVisibility {
    pub fn new(time: impl Into<String>, visible: bool) -> Self {
        Self { time: time.into(), visible }
    }
}

/// Inclusive `[start, end]` range of clock times an agent could observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationWindow {
    pub start: String,
    pub end: String,
}

/// Derive the observable window from the list extremes (`L`, `R`) and the
/// visible extremes (`a`, `b`).
///
/// | condition           | window               |
/// |---------------------|----------------------|
/// | `L = a`, `b = R`    | whole day            |
/// | `L = a`, `b < R`    | `[00:00:00, b]`      |
/// | `L < a`, `b = R`    | `[a, 23:59:59]`      |
/// | `L < a`, `b < R`    | `[a, b]`             |
///
/// `None` when nothing is visible.
pub fn observation_window(slots: &[SlotVisibility]) -> Option<ObservationWindow> {
    let first_visible = slots.iter().filter(|s| s.visible).map(|s| s.time.as_str()).min()?;
    let last_visible = slots.iter().filter(|s| s.visible).map(|s| s.time.as_str()).max()?;
    let first = slots.iter().map(|s| s.time.as_str()).min()?;
    let last = slots.iter().map(|s| s.time.as_str()).max()?;

    let start = if first == first_visible { START_OF_DAY } else { first_visible };
    let end = if last == last_visible { END_OF_DAY } else { last_visible };

    Some(ObservationWindow { start: start.to_string(), end: end.to_string() })
}

/// Stamp every grid tick of the observable window on `date`.
///
/// A tick is available when its time is one of the listed slots (visible or
/// not) and unavailable otherwise. Ticks outside the window stay unknown and
/// are not emitted.
pub fn infer_visible_window(date: &str, slots: &[SlotVisibility]) -> Vec<TimeSlotObservation> {
    let Some(window) = observation_window(slots) else {
        debug!("No visible slots for {}", date);
        return Vec::new();
    };

    let granularity = Granularity::infer_from_times(slots.iter().map(|s| s.time.as_str()));
    let known: HashSet<&str> = slots.iter().map(|s| s.time.as_str()).collect();

    let mut observations = Vec::new();
    let mut tick = window.start.clone();
    while tick.as_str() <= window.end.as_str() {
        let availability = if known.contains(tick.as_str()) {
            Availability::Available
        } else {
            Availability::Unavailable
        };
        observations.push(TimeSlotObservation::new(date, tick.as_str(), availability));
        match get_next_time(&tick, granularity.minutes()) {
            Some(next) => tick = next,
            None => break,
        }
    }

    debug!(
        "Visible window for {} is [{}, {}] on a {}-minute grid: {} ticks",
        date,
        window.start,
        window.end,
        granularity.minutes(),
        observations.len()
    );
    observations
}
