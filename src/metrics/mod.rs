// Metrics — the value types every other subsystem passes around.
//
// A MetricRecord is one observation of an account's counters. Records come
// from two places (the Google Sheet and the local SQLite cache) and both are
// normalised here at the boundary: raw strings are coerced to non-negative
// integers and profile links are canonicalised so the two sides can be
// matched on the same key.

pub mod link;
pub mod parse;
pub mod record;

pub use link::{LinkError, Platform, ProfileLink};
pub use parse::{coerce_count, parse_count, ParseWarning};
pub use record::MetricRecord;
