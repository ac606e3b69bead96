pub mod snapshots;
pub mod status;
pub mod sync;
