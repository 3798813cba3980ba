//! Resource database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Resource database model.
///
/// A submitted educational item tracked through the review lifecycle.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResourceDbModel {
    pub id: String,
    pub title: String,
    /// Category: Video, LessonPlan, Worksheet, Presentation
    pub category: String,
    pub summary: Option<String>,
    /// Share link into the source file store; required for video publishing.
    pub source_link: Option<String>,
    /// Status: Submitted, UnderReview, NeedsRevision, Approved, Published
    pub status: String,
    /// External URL of the published video; set only on reaching Published.
    pub published_url: Option<String>,
    pub contributor_id: String,
    /// ISO 8601 timestamp when the resource was created
    pub created_at: String,
    /// ISO 8601 timestamp when the resource was last updated
    pub updated_at: String,
}

impl ResourceDbModel {
    pub fn new(
        title: impl Into<String>,
        category: ResourceCategory,
        summary: Option<String>,
        source_link: Option<String>,
        contributor_id: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            category: category.as_str().to_string(),
            summary,
            source_link,
            status: ResourceStatus::Submitted.as_str().to_string(),
            published_url: None,
            contributor_id: contributor_id.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Parse the stored status string, if it is a known value.
    pub fn parsed_status(&self) -> Option<ResourceStatus> {
        ResourceStatus::parse(&self.status)
    }

    /// Parse the stored category string, if it is a known value.
    pub fn parsed_category(&self) -> Option<ResourceCategory> {
        ResourceCategory::parse(&self.category)
    }
}

/// Resource categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum ResourceCategory {
    Video,
    LessonPlan,
    Worksheet,
    Presentation,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::LessonPlan => "LessonPlan",
            Self::Worksheet => "Worksheet",
            Self::Presentation => "Presentation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Video" => Some(Self::Video),
            "LessonPlan" => Some(Self::LessonPlan),
            "Worksheet" => Some(Self::Worksheet),
            "Presentation" => Some(Self::Presentation),
            _ => None,
        }
    }
}

/// Resource lifecycle status values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum ResourceStatus {
    /// Newly submitted by a contributor, awaiting triage.
    Submitted,
    /// In the reviewers' queue.
    UnderReview,
    /// Sent back to the contributor for changes.
    NeedsRevision,
    /// Accepted by a reviewer; videos proceed to publication.
    Approved,
    /// Terminal state, reached only through publication reconciliation.
    Published,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::UnderReview => "UnderReview",
            Self::NeedsRevision => "NeedsRevision",
            Self::Approved => "Approved",
            Self::Published => "Published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Submitted" => Some(Self::Submitted),
            "UnderReview" => Some(Self::UnderReview),
            "NeedsRevision" => Some(Self::NeedsRevision),
            "Approved" => Some(Self::Approved),
            "Published" => Some(Self::Published),
            _ => None,
        }
    }
}
