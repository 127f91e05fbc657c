//! Read-only seam to the remote CMS.

use async_trait::async_trait;
use quire_cms_types::RawStory;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoriesFilter {
    None,
    /// Stories whose `categories` field contains the value.
    Category(String),
    /// Full-text search term.
    Search(String),
}

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoriesQuery {
    pub per_page: u32,
    pub page: u32,
    pub filter: StoriesFilter,
}

impl StoriesQuery {
    pub fn latest(per_page: u32, page: u32) -> Self {
        Self {
            per_page,
            page,
            filter: StoriesFilter::None,
        }
    }

    pub fn in_category(category: impl Into<String>, per_page: u32, page: u32) -> Self {
        Self {
            per_page,
            page,
            filter: StoriesFilter::Category(category.into()),
        }
    }

    pub fn search(query: impl Into<String>, per_page: u32, page: u32) -> Self {
        Self {
            per_page,
            page,
            filter: StoriesFilter::Search(query.into()),
        }
    }
}

/// Raw list response: the decoded documents and the source's total count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoriesPage {
    pub stories: Vec<RawStory>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("content source responded with status {0}")]
    Status(u16),
    #[error("content source request timed out")]
    Timeout,
    #[error("content source unreachable: {0}")]
    Network(String),
    #[error("content source payload could not be decoded: {0}")]
    Decode(String),
}

impl SourceError {
    /// Numeric status reported by the source, when it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Issues parameterized reads against the CMS. No caching, no mapping.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_stories(&self, query: &StoriesQuery) -> Result<StoriesPage, SourceError>;

    /// `Ok(None)` when the source has no document under `slug`.
    async fn fetch_story(&self, slug: &str) -> Result<Option<RawStory>, SourceError>;
}
