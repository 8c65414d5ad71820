//! One extraction pass over a page snapshot.
//!
//! Each fragment of the snapshot is routed by UI shape: slot rows go to the
//! grid engine, scrollable lists to the visibility window, "show more" popups
//! to the disclosure tracker and notices straight through. Every container's
//! records then pass through the aggregator's visited set.

use chrono_tz::Tz;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::aggregator::{ContainerRef, DisclosureTracker, ResultAggregator};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::grid::infer_grid;
use crate::parser::{parse_date_and_times_in_year, parse_party_size, parse_time_label};
use crate::records::{AVAILABLE, Record, RestaurantContext};
use crate::time_arith::get_next_time;
use crate::visibility::{SlotVisibility, infer_visible_window};

/// Text and visibility tuples already pulled off the page by a site adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub container: ContainerRef,
    pub context: RestaurantContext,
    /// Party-size text near the fragment; overrides the context's size.
    #[serde(default)]
    pub party_size_text: Option<String>,
    #[serde(flatten)]
    pub shape: FragmentShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FragmentShape {
    /// A fixed row of slot buttons, blank where no label is rendered.
    SlotGrid(DayLabels),
    /// A scrollable list where only some slots are in view.
    VisibleSlots {
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        header: Option<String>,
        slots: Vec<LabelVisibility>,
    },
    /// One page of a multi-day "show more" popup (pages count from 1).
    ShowMore {
        #[serde(default = "first_page")]
        page: u32,
        days: Vec<DayLabels>,
    },
    /// A free-text reason the page gives for not offering slots.
    Notice {
        text: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        time: Option<String>,
    },
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayLabels {
    #[serde(default)]
    pub date: Option<String>,
    /// Day heading such as "Sunday, August 3"; used when `date` is absent.
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelVisibility {
    pub label: String,
    pub visible: bool,
}

/// Runs extraction passes and owns the visited set between them.
#[derive(Debug, Clone)]
pub struct Extractor {
    tz: Tz,
    default_year: i32,
    aggregator: ResultAggregator,
}

impl Extractor {
    pub fn new(tz: Tz, default_year: i32) -> Self {
        Self { tz, default_year, aggregator: ResultAggregator::new() }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(config.reference_tz()?, config.year()))
    }

    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    /// Extract every record the snapshot discloses that earlier passes have
    /// not already produced.
    pub fn extract(&mut self, snapshot: &PageSnapshot) -> Vec<Record> {
        // Fragments of one container are admitted together.
        let mut by_container: Vec<(ContainerRef, Vec<Record>)> = Vec::new();
        for fragment in &snapshot.fragments {
            if self.aggregator.is_sealed(&fragment.container.key) {
                debug!("Skipping recorded container {}", fragment.container.key);
                continue;
            }
            let records = self.fragment_records(fragment);
            match by_container.iter_mut().find(|(c, _)| c.key == fragment.container.key) {
                Some((container, existing)) => {
                    container.promoted |= fragment.container.promoted;
                    existing.extend(records);
                }
                None => by_container.push((fragment.container.clone(), records)),
            }
        }

        let mut output = Vec::new();
        for (container, records) in by_container {
            output.extend(self.aggregator.admit(&container, records));
        }

        info!(
            "Extracted {} records from {} fragments ({} containers recorded)",
            output.len(),
            snapshot.fragments.len(),
            self.aggregator.sealed_count()
        );
        output
    }

    fn fragment_records(&self, fragment: &Fragment) -> Vec<Record> {
        let mut ctx = fragment.context.clone();
        if let Some(size) = fragment.party_size_text.as_deref().and_then(parse_party_size) {
            ctx.party_size = Some(size);
        }

        match &fragment.shape {
            FragmentShape::SlotGrid(day) => {
                let date = self.resolve_date(day.date.as_deref(), day.header.as_deref(), &ctx);
                infer_grid(&date, &day.labels, &self.tz)
                    .iter()
                    .map(|slot| Record::from_slot(&ctx, slot))
                    .collect()
            }
            FragmentShape::VisibleSlots { date, header, slots } => {
                let date = self.resolve_date(date.as_deref(), header.as_deref(), &ctx);
                // Distinct times; a time counts as visible if any copy is.
                let mut by_time: BTreeMap<String, bool> = BTreeMap::new();
                for slot in slots {
                    match slot_time(&slot.label) {
                        Some(time) => *by_time.entry(time).or_insert(false) |= slot.visible,
                        None => debug!("Unreadable slot label '{}'", slot.label),
                    }
                }
                let slots: Vec<SlotVisibility> = by_time
                    .into_iter()
                    .map(|(time, visible)| SlotVisibility::new(time, visible))
                    .collect();
                infer_visible_window(&date, &slots)
                    .iter()
                    .map(|slot| Record::from_slot(&ctx, slot))
                    .collect()
            }
            FragmentShape::ShowMore { page, days } => {
                let mut tracker = DisclosureTracker::new(&ctx.base_date, &ctx.base_time);
                let mut records = Vec::new();
                for day in days {
                    let date = self.resolve_date(day.date.as_deref(), day.header.as_deref(), &ctx);
                    for time in day.labels.iter().filter_map(|label| slot_time(label)) {
                        tracker.observe(&date, &time);
                        records.push(Record::point(&ctx, &date, &time, AVAILABLE));
                    }
                }
                if let Some(interval) = tracker.interval(*page == 1) {
                    records.push(Record::from_interval(&ctx, &interval));
                }
                records
            }
            FragmentShape::Notice { text, date, time } => {
                let text = text.trim();
                if text.is_empty() {
                    return Vec::new();
                }
                let date = date.as_deref().unwrap_or(&ctx.base_date).to_string();
                let time = time.as_deref().unwrap_or(&ctx.base_time).to_string();
                vec![Record::point(&ctx, &date, &time, text)]
            }
        }
    }

    fn resolve_date(
        &self,
        date: Option<&str>,
        header: Option<&str>,
        ctx: &RestaurantContext,
    ) -> String {
        if let Some(date) = date {
            return date.to_string();
        }
        header
            .and_then(|h| parse_date_and_times_in_year(h, self.default_year).date)
            .unwrap_or_else(|| ctx.base_date.clone())
    }
}

/// Clock time of a slot label, accepting both "8:15 PM" and "20:15:00".
fn slot_time(label: &str) -> Option<String> {
    parse_time_label(label).or_else(|| {
        let label = label.trim();
        (label.len() == 8).then(|| get_next_time(label, 0)).flatten()
    })
}
