//! Review workflow engine.
//!
//! Pure status transition rules, the append-only history recorder, and the
//! orchestrating service that drives both from reviewer decisions and
//! contributor edits.

pub mod history;
pub mod service;
pub mod transition;

pub use history::StatusHistoryRecorder;
pub use service::{NewReview, ResourceEdit, ReviewService};
pub use transition::{StatusEvent, next_status};
