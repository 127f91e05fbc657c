use tracing::warn;

use crate::domain::article::Article;

use super::gateway::ContentGateway;

pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// Articles to show next to `current_slug`.
///
/// Candidates come from the first category, then the latest articles fill any
/// remaining slots. Only routable articles other than the current one are
/// kept, each once. Source failures are logged and the articles collected so
/// far are returned.
pub async fn related_articles(
    gateway: &ContentGateway,
    current_slug: &str,
    categories: &[String],
    limit: usize,
) -> Vec<Article> {
    if limit == 0 {
        return Vec::new();
    }
    let fetch_size = u32::try_from(limit.saturating_add(1)).unwrap_or(u32::MAX);
    let mut related: Vec<Article> = Vec::with_capacity(limit);

    if let Some(category) = categories.first() {
        match gateway
            .list_articles_by_category(category, fetch_size, 1)
            .await
        {
            Ok(page) => extend_unique(&mut related, page.items, current_slug, limit),
            Err(err) => warn!(
                target = "application::related::related_articles",
                category = %category,
                error = %err,
                "related category lookup failed"
            ),
        }
    }

    if related.len() < limit {
        match gateway.list_articles(fetch_size, 1).await {
            Ok(page) => extend_unique(&mut related, page.items, current_slug, limit),
            Err(err) => warn!(
                target = "application::related::related_articles",
                error = %err,
                "latest articles lookup failed"
            ),
        }
    }

    related
}

fn extend_unique(
    related: &mut Vec<Article>,
    candidates: Vec<Article>,
    current_slug: &str,
    limit: usize,
) {
    for candidate in candidates {
        if related.len() >= limit {
            break;
        }
        if !candidate.is_routable() || candidate.slug.as_deref() == Some(current_slug) {
            continue;
        }
        if related.iter().any(|kept| kept.slug == candidate.slug) {
            continue;
        }
        related.push(candidate);
    }
}
