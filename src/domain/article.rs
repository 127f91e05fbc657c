//! Article entity derived from a CMS story.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, macros::format_description};

use super::error::DomainError;
use super::rich_text::RichTextNode;

pub const DEFAULT_SUMMARY_LENGTH: usize = 150;

/// Body of an article: legacy preformatted markup or a rich-text tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArticleContent {
    Html(String),
    RichText(RichTextNode),
}

impl ArticleContent {
    /// Text without markup, whitespace collapsed.
    pub fn plain_text(&self) -> String {
        let raw = match self {
            ArticleContent::Html(html) => strip_tags(html),
            ArticleContent::RichText(root) => root.plain_text(),
        };
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub internal_name: Option<String>,
    pub title: Option<String>,
    pub teaser: Option<String>,
    pub content: Option<ArticleContent>,
    pub featured_image_url: Option<String>,
    pub categories: Vec<String>,
    pub author: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Article {
    /// Slug used for routing, or `Malformed` when the source document had none.
    pub fn ensure_routable(&self) -> Result<&str, DomainError> {
        self.slug
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .ok_or_else(|| DomainError::malformed("article has no slug"))
    }

    pub fn is_routable(&self) -> bool {
        self.ensure_routable().is_ok()
    }

    /// Published date as `January 05, 2024`.
    pub fn formatted_date(&self) -> Option<String> {
        let format = format_description!("[month repr:long] [day], [year]");
        self.published_at?.format(&format).ok()
    }

    /// Teaser when present, otherwise the leading `max_chars` characters of the body.
    pub fn summary(&self, max_chars: usize) -> String {
        if let Some(teaser) = self.teaser.as_deref().filter(|teaser| !teaser.is_empty()) {
            return teaser.to_string();
        }

        let text = self
            .content
            .as_ref()
            .map(ArticleContent::plain_text)
            .unwrap_or_default();
        if text.chars().count() <= max_chars {
            return text;
        }

        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    }
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text
}
