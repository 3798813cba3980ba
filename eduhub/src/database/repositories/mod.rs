//! Database repositories.

pub mod publish_overrides;
pub mod resource;
pub mod review;
pub mod status_history;

pub use publish_overrides::{PublishOverridesRepository, SqlxPublishOverridesRepository};
pub use resource::{ResourceRepository, SqlxResourceRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use status_history::{SqlxStatusHistoryRepository, StatusHistoryRepository};
