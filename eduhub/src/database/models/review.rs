//! Resource review database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Resource review database model.
///
/// A reviewer's verdict on a resource. Immutable once created; a resource
/// accumulates one row per review round.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReviewDbModel {
    pub id: String,
    pub resource_id: String,
    pub reviewer_id: String,
    pub reviewer_role: String,
    /// Decision: Approved, Rejected
    pub decision: String,
    pub summary: Option<String>,
    /// ISO 8601 timestamp when the review was recorded
    pub reviewed_at: String,
}

impl ReviewDbModel {
    pub fn new(
        resource_id: impl Into<String>,
        reviewer_id: impl Into<String>,
        reviewer_role: impl Into<String>,
        decision: ReviewDecision,
        summary: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource_id.into(),
            reviewer_id: reviewer_id.into(),
            reviewer_role: reviewer_role.into(),
            decision: decision.as_str().to_string(),
            summary,
            reviewed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn parsed_decision(&self) -> Option<ReviewDecision> {
        ReviewDecision::parse(&self.decision)
    }
}

/// Review decision values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}
