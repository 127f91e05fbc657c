//! Raw CMS story → `Article`.
//!
//! Pure and total: every field of the raw document is optional, and anything
//! missing or of an unexpected shape resolves to an explicit default.

use quire_cms_types::{RawStory, RawStoryContent};
use serde_json::Value;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339};

use crate::domain::article::{Article, ArticleContent};
use crate::domain::rich_text::RichTextNode;

pub fn map_story(raw: RawStory) -> Article {
    let RawStory {
        uuid,
        id,
        slug,
        name,
        content,
        published_at,
        created_at,
        updated_at,
        ..
    } = raw;
    let RawStoryContent {
        title,
        teaser,
        content: body,
        featured_image,
        categories,
        author,
        ..
    } = content.unwrap_or_default();

    let internal_name = non_empty(name);
    Article {
        id: non_empty(uuid).or_else(|| id.as_ref().and_then(scalar_id)),
        slug: non_empty(slug),
        title: non_empty(title).or_else(|| internal_name.clone()),
        internal_name,
        teaser: non_empty(teaser),
        content: body.and_then(map_content),
        featured_image_url: featured_image.and_then(|asset| non_empty(asset.filename)),
        categories: categories.map(map_categories).unwrap_or_default(),
        author: non_empty(author),
        published_at: published_at.as_deref().and_then(parse_timestamp),
        created_at: created_at.as_deref().and_then(parse_timestamp),
        updated_at: updated_at.as_deref().and_then(parse_timestamp),
    }
}

pub fn map_stories(raw: Vec<RawStory>) -> Vec<Article> {
    raw.into_iter().map(map_story).collect()
}

fn map_content(value: Value) -> Option<ArticleContent> {
    match value {
        Value::String(html) => Some(ArticleContent::Html(html)),
        Value::Object(_) => Some(ArticleContent::RichText(RichTextNode::from_json(&value))),
        _ => None,
    }
}

fn map_categories(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(category) if !category.trim().is_empty() => Some(category),
            _ => None,
        })
        .collect()
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Absent or unparseable input is "unknown", never the epoch.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }

    let with_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(parsed) = PrimitiveDateTime::parse(raw, &with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(raw, &without_seconds))
    {
        return Some(parsed.assume_utc());
    }

    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}
