//! Publish metadata resolution.
//!
//! Merges resource-derived defaults with optional per-resource overrides.

use serde::{Deserialize, Serialize};

use super::ResourceSnapshot;
use crate::database::models::{PublishOverridesDbModel, Visibility};

/// Default destination category code (Education).
pub const DEFAULT_CATEGORY_CODE: i64 = 27;

/// Final metadata submitted alongside an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_code: i64,
    pub visibility: Visibility,
    pub audience_restricted: bool,
}

/// Resolve the final publish metadata for a resource snapshot.
///
/// Defaults come from the resource itself: its title, its summary with a
/// `Subjects:` line appended when subject tags exist, the default category
/// code, unlisted visibility, no audience restriction, no tags. Any non-empty
/// override field replaces its default; empty or zero override fields are
/// ignored, so a missing overrides row and an all-empty one are equivalent.
pub fn resolve(
    snapshot: &ResourceSnapshot,
    overrides: Option<&PublishOverridesDbModel>,
) -> PublishMetadata {
    let mut metadata = PublishMetadata {
        title: snapshot.title.clone(),
        description: default_description(snapshot),
        tags: Vec::new(),
        category_code: DEFAULT_CATEGORY_CODE,
        visibility: Visibility::Unlisted,
        audience_restricted: false,
    };

    let Some(overrides) = overrides else {
        return metadata;
    };

    if let Some(title) = non_empty(&overrides.title) {
        metadata.title = title.to_string();
    }
    if let Some(description) = non_empty(&overrides.description) {
        metadata.description = description.to_string();
    }
    let tags = overrides.tag_list();
    if !tags.is_empty() {
        metadata.tags = tags;
    }
    if let Some(visibility) = overrides.parsed_visibility() {
        metadata.visibility = visibility;
    }
    metadata.audience_restricted = overrides.audience_restricted;
    if let Some(code) = overrides.category_code.filter(|code| *code != 0) {
        metadata.category_code = code;
    }

    metadata
}

fn default_description(snapshot: &ResourceSnapshot) -> String {
    let mut description = snapshot.summary.clone().unwrap_or_default();
    if !snapshot.subjects.is_empty() {
        if !description.is_empty() {
            description.push_str("\n\n");
        }
        description.push_str("Subjects: ");
        description.push_str(&snapshot.subjects.join(", "));
    }
    description
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
