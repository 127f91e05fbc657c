//! Category catalog and filtered listings.

use serde::{Deserialize, Serialize};

use super::gateway::{ArticlePage, ContentGateway, GatewayError};

pub const DEFAULT_CATEGORY_SAMPLE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Category usage across the latest `sample_size` articles, most used first.
/// Ties keep the order in which categories first appear.
pub async fn category_counts(
    gateway: &ContentGateway,
    sample_size: u32,
) -> Result<Vec<CategoryCount>, GatewayError> {
    let page = gateway.list_articles(sample_size.max(1), 1).await?;

    let mut counts: Vec<CategoryCount> = Vec::new();
    for category in page.items.iter().flat_map(|article| &article.categories) {
        match counts.iter_mut().find(|entry| entry.name == *category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                name: category.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|left, right| right.count.cmp(&left.count));
    Ok(counts)
}

/// Listing filter as selected by a reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ArticleFilter {
    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())
    }

    fn category_name(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Search wins over category, category over the plain listing.
pub async fn list_for_filter(
    gateway: &ContentGateway,
    filter: &ArticleFilter,
    per_page: u32,
    page: u32,
) -> Result<ArticlePage, GatewayError> {
    if let Some(term) = filter.search_term() {
        return gateway.search_articles(term, per_page, page).await;
    }
    if let Some(category) = filter.category_name() {
        return gateway
            .list_articles_by_category(category, per_page, page)
            .await;
    }
    gateway.list_articles(per_page, page).await
}
