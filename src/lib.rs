// Viewtrack: social-account metric sync for campaign projects
//
// This is the library root. Each module corresponds to one part of the
// sync: counters and links, the local store, the sheet reader, and the
// reconciliation pass that ties them together.

pub mod config;
pub mod db;
pub mod metrics;
pub mod output;
pub mod sheets;
pub mod status;
pub mod sync;

#[cfg(feature = "web")]
pub mod web;
