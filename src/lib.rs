pub mod aggregator;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod extract;
pub mod grid;
pub mod parser;
pub mod records;
pub mod time_arith;
pub mod visibility;

use log::LevelFilter;
use std::str::FromStr;

/// Set up `env_logger`; `RUST_LOG` wins over `default_level`.
pub fn init_logger(default_level: &str) {
    let level = LevelFilter::from_str(default_level).unwrap_or(LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}

// Re-export commonly used types
pub use aggregator::{ContainerKey, ContainerRef, DisclosureTracker, ResultAggregator};
pub use config::Config;
pub use coverage::{CoverageResult, InfoGathering, MultiCandidateQuery};
pub use error::SlotwatchError;
pub use extract::{Extractor, Fragment, FragmentShape, PageSnapshot};
pub use records::{
    Availability, AvailabilityInterval, Record, RestaurantContext, TimeSlotObservation,
};
