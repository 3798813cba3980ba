//! Publish override database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-resource publication overrides, one-to-one with a video resource.
///
/// Purely descriptive: the pipeline reads these to replace resource-derived
/// defaults field by field. A missing row (or an all-empty one) means "use
/// resource defaults".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PublishOverridesDbModel {
    pub resource_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// JSON array of tag strings
    pub tags: String,
    /// Visibility: public, unlisted, private
    pub visibility: Option<String>,
    pub audience_restricted: bool,
    pub category_code: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl PublishOverridesDbModel {
    /// An all-empty overrides row for the given resource.
    pub fn new(resource_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            resource_id: resource_id.into(),
            title: None,
            description: None,
            tags: "[]".to_string(),
            visibility: None,
            audience_restricted: false,
            category_code: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Decode the stored tags JSON; malformed data reads as no tags.
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }

    /// Encode and store a tag list.
    pub fn set_tag_list(&mut self, tags: &[String]) {
        self.tags = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
    }

    pub fn parsed_visibility(&self) -> Option<Visibility> {
        self.visibility.as_deref().and_then(Visibility::parse)
    }
}

/// Destination-side visibility levels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "unlisted" => Some(Self::Unlisted),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_list_round_trip() {
        let mut overrides = PublishOverridesDbModel::new("res-1");
        assert!(overrides.tag_list().is_empty());

        overrides.set_tag_list(&["stem".to_string(), "fractions".to_string()]);
        assert_eq!(overrides.tag_list(), vec!["stem", "fractions"]);
    }

    #[test]
    fn malformed_tags_read_as_empty() {
        let mut overrides = PublishOverridesDbModel::new("res-1");
        overrides.tags = "not json".to_string();
        assert!(overrides.tag_list().is_empty());
    }
}
