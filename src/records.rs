use serde::{Deserialize, Serialize};

/// Info string for a slot that could be booked.
pub const AVAILABLE: &str = "available";
/// Info string for a slot or span that could not be booked.
pub const UNAVAILABLE: &str = "unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => AVAILABLE,
            Availability::Unavailable => UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// One inferred grid tick. Never a range by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotObservation {
    pub date: String,
    pub time: String,
    pub availability: Availability,
}

impl TimeSlotObservation {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        availability: Availability,
    ) -> Self {
        Self { date: date.into(), time: time.into(), availability }
    }
}

/// A half-open `[start, end)` span asserted as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityInterval {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub info: String,
}

/// Page-level facts attached to every record emitted for a restaurant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantContext {
    #[serde(default)]
    pub url: String,
    pub restaurant_name: String,
    #[serde(default)]
    pub party_size: Option<u32>,
    pub base_date: String,
    pub base_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointObservation {
    pub url: String,
    pub restaurant_name: String,
    pub party_size: Option<u32>,
    pub date: String,
    pub time: String,
    /// `available`, `unavailable`, or a reason copied verbatim from the page.
    pub info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalObservation {
    pub url: String,
    pub restaurant_name: String,
    pub party_size: Option<u32>,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub info: String,
}

/// Output record of one extraction.
///
/// Serialized untagged so the harness sees the flat camelCase shapes; interval
/// goes first so `startDate` is tried before falling back to a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Interval(IntervalObservation),
    Point(PointObservation),
}

impl Record {
    pub fn point(ctx: &RestaurantContext, date: &str, time: &str, info: &str) -> Self {
        Record::Point(PointObservation {
            url: ctx.url.clone(),
            restaurant_name: ctx.restaurant_name.clone(),
            party_size: ctx.party_size,
            date: date.to_string(),
            time: time.to_string(),
            info: info.to_string(),
        })
    }

    pub fn from_slot(ctx: &RestaurantContext, slot: &TimeSlotObservation) -> Self {
        Self::point(ctx, &slot.date, &slot.time, slot.availability.as_str())
    }

    pub fn from_interval(ctx: &RestaurantContext, interval: &AvailabilityInterval) -> Self {
        Record::Interval(IntervalObservation {
            url: ctx.url.clone(),
            restaurant_name: ctx.restaurant_name.clone(),
            party_size: ctx.party_size,
            start_date: interval.start_date.clone(),
            start_time: interval.start_time.clone(),
            end_date: interval.end_date.clone(),
            end_time: interval.end_time.clone(),
            info: interval.info.clone(),
        })
    }

    pub fn restaurant_name(&self) -> &str {
        match self {
            Record::Interval(i) => &i.restaurant_name,
            Record::Point(p) => &p.restaurant_name,
        }
    }

    pub fn party_size(&self) -> Option<u32> {
        match self {
            Record::Interval(i) => i.party_size,
            Record::Point(p) => p.party_size,
        }
    }

    pub fn info(&self) -> &str {
        match self {
            Record::Interval(i) => &i.info,
            Record::Point(p) => &p.info,
        }
    }
}
