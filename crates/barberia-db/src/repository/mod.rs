//! # Repository Module
//!
//! The front desk keeps one shop snapshot, so there is one repository. It
//! hides the SQL behind `load`, `save` and `clear`.
//!
//! - [`SnapshotRepository`](snapshot::SnapshotRepository) - versioned snapshot storage

pub mod snapshot;
