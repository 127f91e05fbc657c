//! Raw wire types for the headless CMS content delivery API.
//!
//! Documents authored in a CMS are loosely typed: fields go missing, change
//! shape between schema revisions, or carry `null`. Every field here is
//! therefore optional, and a field whose JSON type does not match is read as
//! absent instead of failing the whole document.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single story document as delivered by the CMS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStory {
    #[serde(default, deserialize_with = "lenient")]
    pub uuid: Option<String>,
    /// Numeric (or occasionally string) identifier; kept raw.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub full_slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<RawStoryContent>,
    #[serde(default, deserialize_with = "lenient")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<String>,
}

/// The authored content block of a story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStoryContent {
    #[serde(default, deserialize_with = "lenient")]
    pub component: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub teaser: Option<String>,
    /// Body: a rich-text document object or a preformatted string.
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub featured_image: Option<RawAsset>,
    #[serde(default, deserialize_with = "lenient")]
    pub categories: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,
}

/// Asset reference (images, files).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAsset {
    #[serde(default, deserialize_with = "lenient")]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub alt: Option<String>,
}

/// Response body of the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoriesEnvelope {
    #[serde(default, deserialize_with = "lenient_items")]
    pub stories: Vec<RawStory>,
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<u64>,
}

/// Response body of the single-item endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    pub story: Option<RawStory>,
}

/// Change notification posted by the CMS when content moves through its workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,
    #[serde(default)]
    pub story_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub story: Option<StoryRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub full_slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryRef {
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
}

impl ChangeNotification {
    /// Slug of the affected story, preferring the nested `story.slug`.
    pub fn story_slug(&self) -> Option<&str> {
        self.story
            .as_ref()
            .and_then(|story| story.slug.as_deref())
            .or(self.slug.as_deref())
            .or(self.full_slug.as_deref())
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mistyped_fields_read_as_absent() {
        let story: RawStory = serde_json::from_value(json!({
            "uuid": 42,
            "slug": "hello",
            "name": ["not", "a", "string"],
            "content": { "title": { "nested": true }, "categories": "Tech" },
            "published_at": null
        }))
        .expect("story should deserialize");

        assert_eq!(story.uuid, None);
        assert_eq!(story.slug.as_deref(), Some("hello"));
        assert_eq!(story.name, None);
        let content = story.content.expect("content");
        assert_eq!(content.title, None);
        assert_eq!(content.categories, None);
        assert_eq!(story.published_at, None);
    }

    #[test]
    fn non_object_stories_are_dropped() {
        let envelope: StoriesEnvelope = serde_json::from_value(json!({
            "stories": [null, { "slug": "kept" }, 7],
            "total": "many"
        }))
        .expect("envelope should deserialize");

        assert_eq!(envelope.stories.len(), 1);
        assert_eq!(envelope.stories[0].slug.as_deref(), Some("kept"));
        assert_eq!(envelope.total, None);
    }

    #[test]
    fn missing_stories_default_to_empty() {
        let envelope: StoriesEnvelope =
            serde_json::from_value(json!({})).expect("envelope should deserialize");
        assert!(envelope.stories.is_empty());
    }

    #[test]
    fn change_notification_prefers_nested_slug() {
        let payload: ChangeNotification = serde_json::from_value(json!({
            "action": "published",
            "story": { "slug": "nested" },
            "full_slug": "blog/flat"
        }))
        .expect("payload");
        assert_eq!(payload.story_slug(), Some("nested"));

        let flat: ChangeNotification =
            serde_json::from_value(json!({ "action": "published", "full_slug": "blog/flat" }))
                .expect("payload");
        assert_eq!(flat.story_slug(), Some("blog/flat"));

        let blank: ChangeNotification =
            serde_json::from_value(json!({ "action": "deleted", "story": { "slug": "  " } }))
                .expect("payload");
        assert_eq!(blank.story_slug(), None);
    }
}
