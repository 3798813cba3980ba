//! Status transition rules.
//!
//! Pure decision logic: given a resource's current status and an event,
//! compute the next status. No I/O.

use crate::database::models::{ResourceStatus, ReviewDecision};

/// An event that may move a resource through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// A contributor-initiated save of the resource.
    ContributorEdited,
    /// A reviewer decision was recorded.
    ReviewDecided(ReviewDecision),
    /// The caller supplied a status explicitly (administrative override).
    ExplicitStatus(ResourceStatus),
}

/// Compute the next status for a resource.
///
/// Rules, in priority order:
/// 1. An explicit status wins outright.
/// 2. A contributor edit on a NeedsRevision resource resurfaces it to
///    reviewers as UnderReview.
/// 3. A Rejected review moves the resource to NeedsRevision.
/// 4. An Approved review moves it to Approved.
/// 5. Otherwise the status is unchanged.
///
/// The terminal Published state is never produced here; only publication
/// reconciliation reaches it.
pub fn next_status(current: ResourceStatus, event: StatusEvent) -> ResourceStatus {
    match event {
        StatusEvent::ExplicitStatus(status) => status,
        StatusEvent::ContributorEdited if current == ResourceStatus::NeedsRevision => {
            ResourceStatus::UnderReview
        }
        StatusEvent::ReviewDecided(ReviewDecision::Rejected) => ResourceStatus::NeedsRevision,
        StatusEvent::ReviewDecided(ReviewDecision::Approved) => ResourceStatus::Approved,
        _ => current,
    }
}
