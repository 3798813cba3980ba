//! Database models.

pub mod publish_overrides;
pub mod resource;
pub mod review;
pub mod status_history;

pub use publish_overrides::{PublishOverridesDbModel, Visibility};
pub use resource::{ResourceCategory, ResourceDbModel, ResourceStatus};
pub use review::{ReviewDbModel, ReviewDecision};
pub use status_history::StatusHistoryDbModel;
