//! Cache key definitions.
//!
//! Every gateway read operation maps its full parameter tuple onto one
//! `CacheKey`. Free-text parameters are form-urlencoded before they are joined
//! with `:` so a category or query containing the separator cannot alias
//! another key.

use std::fmt;

use url::form_urlencoded::byte_serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A page of the unfiltered article listing.
    ArticleList { per_page: u32, page: u32 },
    /// A page of articles in one category.
    ArticlesByCategory {
        category: String,
        per_page: u32,
        page: u32,
    },
    /// A page of full-text search results.
    ArticleSearch {
        query: String,
        per_page: u32,
        page: u32,
    },
    /// A single article by slug.
    Article { slug: String },
}

impl CacheKey {
    pub fn article_list(per_page: u32, page: u32) -> Self {
        Self::ArticleList { per_page, page }
    }

    pub fn articles_by_category(category: &str, per_page: u32, page: u32) -> Self {
        Self::ArticlesByCategory {
            category: category.to_string(),
            per_page,
            page,
        }
    }

    pub fn article_search(query: &str, per_page: u32, page: u32) -> Self {
        Self::ArticleSearch {
            query: query.to_string(),
            per_page,
            page,
        }
    }

    pub fn article(slug: &str) -> Self {
        Self::Article {
            slug: slug.to_string(),
        }
    }

    /// Short label for logs and metrics.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::ArticleList { .. } => "list",
            Self::ArticlesByCategory { .. } => "category",
            Self::ArticleSearch { .. } => "search",
            Self::Article { .. } => "article",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArticleList { per_page, page } => write!(f, "articles:list:{per_page}:{page}"),
            Self::ArticlesByCategory {
                category,
                per_page,
                page,
            } => write!(
                f,
                "articles:category:{}:{per_page}:{page}",
                encode(category)
            ),
            Self::ArticleSearch {
                query,
                per_page,
                page,
            } => write!(f, "articles:search:{}:{per_page}:{page}", encode(query)),
            Self::Article { slug } => write!(f, "article:{}", encode(slug)),
        }
    }
}

fn encode(part: &str) -> String {
    byte_serialize(part.as_bytes()).collect()
}
