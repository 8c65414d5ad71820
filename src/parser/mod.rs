/// Slotwatch parser module
///
/// Text-to-structured-time parsers for the fragments a booking page renders.
pub mod temporal;

pub use temporal::{
    DateAndTimes, parse_date_and_times, parse_date_and_times_in_year, parse_party_size,
    parse_time_label, parse_times,
};
