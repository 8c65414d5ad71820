//! Merging of observations across repeated invocations and paginated views.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::records::{AvailabilityInterval, Record, UNAVAILABLE};

/// Stable structural identity of a page container (a result card, a popup).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerKey(pub String);

impl std::fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    pub key: ContainerKey,
    /// Promoted or pinned listing; sealed on first sight whatever it yields.
    #[serde(default)]
    pub promoted: bool,
}

impl ContainerRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: ContainerKey(key.into()), promoted: false }
    }

    pub fn promoted(key: impl Into<String>) -> Self {
        Self { key: ContainerKey(key.into()), promoted: true }
    }
}

/// Visited set of containers that already contributed to the output.
///
/// This is the only state that survives between invocations.
#[derive(Debug, Default, Clone)]
pub struct ResultAggregator {
    sealed: HashSet<ContainerKey>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sealed(&self, key: &ContainerKey) -> bool {
        self.sealed.contains(key)
    }

    pub fn sealed_count(&self) -> usize {
        self.sealed.len()
    }

    /// Pass a container's records through unless it is already sealed.
    ///
    /// The container is sealed when it yields at least one record, or when it
    /// is promoted. An ordinary container that yields nothing stays open for
    /// the next invocation.
    pub fn admit(&mut self, container: &ContainerRef, records: Vec<Record>) -> Vec<Record> {
        if self.is_sealed(&container.key) {
            debug!(
                "Container {} already recorded, skipping {} records",
                container.key,
                records.len()
            );
            return Vec::new();
        }

        if container.promoted || !records.is_empty() {
            self.sealed.insert(container.key.clone());
            debug!("Sealed container {} with {} records", container.key, records.len());
        } else {
            debug!("Container {} yielded nothing, leaving it open", container.key);
        }
        records
    }

    pub fn reset(&mut self) {
        self.sealed.clear();
    }
}

/// Tracks the available slots nearest to a baseline moment across the days of
/// a "show more" view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureTracker {
    baseline: (String, String),
    prev_available: Option<(String, String)>,
    next_available: Option<(String, String)>,
}

impl DisclosureTracker {
    pub fn new(baseline_date: &str, baseline_time: &str) -> Self {
        Self {
            baseline: (baseline_date.to_string(), baseline_time.to_string()),
            prev_available: None,
            next_available: None,
        }
    }

    /// Record an available slot. Slots at the baseline count as "before".
    pub fn observe(&mut self, date: &str, time: &str) {
        let slot = (date.to_string(), time.to_string());
        if slot <= self.baseline {
            if self.prev_available.as_ref().map_or(true, |prev| slot > *prev) {
                self.prev_available = Some(slot);
            }
        } else if self.next_available.as_ref().map_or(true, |next| slot < *next) {
            self.next_available = Some(slot);
        }
    }

    pub fn prev_available(&self) -> Option<(&str, &str)> {
        self.prev_available.as_ref().map(|(d, t)| (d.as_str(), t.as_str()))
    }

    pub fn next_available(&self) -> Option<(&str, &str)> {
        self.next_available.as_ref().map(|(d, t)| (d.as_str(), t.as_str()))
    }

    /// The unavailable span asserted by the view, if any.
    ///
    /// Only the first page can bound the span: later pages do not show what
    /// precedes them.
    pub fn interval(&self, first_page: bool) -> Option<AvailabilityInterval> {
        if !first_page {
            return None;
        }
        let (end_date, end_time) = self.next_available.as_ref()?;
        let (start_date, start_time) = self.prev_available.as_ref().unwrap_or(&self.baseline);
        Some(AvailabilityInterval {
            start_date: start_date.clone(),
            start_time: start_time.clone(),
            end_date: end_date.clone(),
            end_time: end_time.clone(),
            info: UNAVAILABLE.to_string(),
        })
    }
}
