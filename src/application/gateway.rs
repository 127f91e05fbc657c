//! Cache-aside content gateway.
//!
//! Every read derives a [`CacheKey`] from its full parameter tuple, looks the
//! key up, and only on a miss fetches from the [`ContentSource`], maps the raw
//! documents, and stores the mapped payload. Failures and not-found results
//! are returned to the caller and never written to the store.
//!
//! Concurrent misses on the same key each reach the source; there is no
//! single-flight deduplication. Results are idempotent, so the last store wins
//! with an equivalent payload.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStore};
use crate::domain::article::Article;

use super::mapper::{map_stories, map_story};
use super::source::{ContentSource, SourceError, StoriesQuery};

const SOURCE: &str = "application::gateway";
const METRIC_CACHE_HIT_TOTAL: &str = "quire_cache_hit_total";
const METRIC_CACHE_MISS_TOTAL: &str = "quire_cache_miss_total";
const METRIC_CACHE_STORE_TOTAL: &str = "quire_cache_store_total";
const METRIC_CACHE_INVALIDATE_TOTAL: &str = "quire_cache_invalidate_total";
const METRIC_CMS_REQUEST_MS: &str = "quire_cms_request_ms";

/// One page of mapped articles plus the source's total count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub items: Vec<Article>,
    pub total: u64,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to {operation} from the content source")]
    Transport {
        operation: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("article `{slug}` not found")]
    NotFound { slug: String },
}

impl GatewayError {
    /// Status code identifying the failure: the remote status when the source
    /// answered, 404 for a missing article.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Transport { source, .. } => source.status(),
            GatewayError::NotFound { .. } => Some(404),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}

pub struct ContentGateway {
    source: Arc<dyn ContentSource>,
    store: Arc<dyn CacheStore>,
    ttl: Option<Duration>,
}

impl ContentGateway {
    /// `ttl` of `None` disables caching: every read goes to the source.
    pub fn new(
        source: Arc<dyn ContentSource>,
        store: Arc<dyn CacheStore>,
        ttl: Option<Duration>,
    ) -> Self {
        Self { source, store, ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub async fn list_articles(&self, per_page: u32, page: u32) -> Result<ArticlePage, GatewayError> {
        self.read_page(
            CacheKey::article_list(per_page, page),
            StoriesQuery::latest(per_page, page),
        )
        .await
    }

    pub async fn list_articles_by_category(
        &self,
        category: &str,
        per_page: u32,
        page: u32,
    ) -> Result<ArticlePage, GatewayError> {
        self.read_page(
            CacheKey::articles_by_category(category, per_page, page),
            StoriesQuery::in_category(category, per_page, page),
        )
        .await
    }

    pub async fn search_articles(
        &self,
        query: &str,
        per_page: u32,
        page: u32,
    ) -> Result<ArticlePage, GatewayError> {
        self.read_page(
            CacheKey::article_search(query, per_page, page),
            StoriesQuery::search(query, per_page, page),
        )
        .await
    }

    pub async fn get_article(&self, slug: &str) -> Result<Article, GatewayError> {
        let key = CacheKey::article(slug);
        if let Some(article) = self.lookup::<Article>(&key).await {
            return Ok(article);
        }

        let started_at = Instant::now();
        let fetched = self.source.fetch_story(slug).await;
        record_request(started_at, &fetched);
        let raw = fetched
            .map_err(|source| self.transport_failure(&key, source))?
            .ok_or_else(|| GatewayError::NotFound {
                slug: slug.to_string(),
            })?;

        let article = map_story(raw);
        self.remember(&key, &article).await;
        Ok(article)
    }

    /// Drop the cached single-article entry for `slug`. Absent entries are a no-op.
    pub async fn invalidate_article(&self, slug: &str) {
        let key = CacheKey::article(slug).to_string();
        self.store.delete(&key).await;
        counter!(METRIC_CACHE_INVALIDATE_TOTAL, "scope" => "article").increment(1);
        info!(target = SOURCE, key = %key, "invalidated article cache entry");
    }

    /// Clear the whole backing store.
    pub async fn invalidate_all(&self) {
        self.store.clear().await;
        counter!(METRIC_CACHE_INVALIDATE_TOTAL, "scope" => "all").increment(1);
        info!(target = SOURCE, "invalidated all cache entries");
    }

    async fn read_page(
        &self,
        key: CacheKey,
        query: StoriesQuery,
    ) -> Result<ArticlePage, GatewayError> {
        if let Some(page) = self.lookup::<ArticlePage>(&key).await {
            return Ok(page);
        }

        let started_at = Instant::now();
        let fetched = self.source.fetch_stories(&query).await;
        record_request(started_at, &fetched);
        let raw = fetched.map_err(|source| self.transport_failure(&key, source))?;

        let page = ArticlePage {
            items: map_stories(raw.stories),
            total: raw.total,
        };
        self.remember(&key, &page).await;
        Ok(page)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        self.ttl?;
        let rendered = key.to_string();
        let operation = key.operation();

        let Some(bytes) = self.store.get(&rendered).await else {
            counter!(METRIC_CACHE_MISS_TOTAL, "operation" => operation).increment(1);
            debug!(target = SOURCE, key = %rendered, "cache miss");
            return None;
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT_TOTAL, "operation" => operation).increment(1);
                debug!(target = SOURCE, key = %rendered, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    key = %rendered,
                    error = %err,
                    "discarding undecodable cache entry"
                );
                self.store.delete(&rendered).await;
                counter!(METRIC_CACHE_MISS_TOTAL, "operation" => operation).increment(1);
                None
            }
        }
    }

    async fn remember<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let Some(ttl) = self.ttl else {
            return;
        };
        let rendered = key.to_string();
        match serde_json::to_vec(value) {
            Ok(encoded) => {
                self.store.put(&rendered, Bytes::from(encoded), ttl).await;
                counter!(METRIC_CACHE_STORE_TOTAL, "operation" => key.operation()).increment(1);
            }
            Err(err) => warn!(
                target = SOURCE,
                key = %rendered,
                error = %err,
                "cache payload could not be encoded"
            ),
        }
    }

    fn transport_failure(&self, key: &CacheKey, source: SourceError) -> GatewayError {
        warn!(
            target = SOURCE,
            key = %key,
            status = source.status(),
            error = %source,
            "content source request failed"
        );
        GatewayError::Transport {
            operation: key.operation(),
            source,
        }
    }
}

fn record_request<T>(started_at: Instant, result: &Result<T, SourceError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(SourceError::Timeout) => "timeout",
        Err(SourceError::Status(_)) => "status",
        Err(_) => "error",
    };
    histogram!(METRIC_CMS_REQUEST_MS, "outcome" => outcome)
        .record(started_at.elapsed().as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::application::source::StoriesPage;
    use crate::cache::MemoryCacheStore;
    use async_trait::async_trait;
    use quire_cms_types::RawStory;

    struct FailingSource;

    #[async_trait]
    impl ContentSource for FailingSource {
        async fn fetch_stories(&self, _query: &StoriesQuery) -> Result<StoriesPage, SourceError> {
            Err(SourceError::Status(503))
        }

        async fn fetch_story(&self, _slug: &str) -> Result<Option<RawStory>, SourceError> {
            Err(SourceError::Timeout)
        }
    }

    fn gateway(source: Arc<dyn ContentSource>) -> (ContentGateway, Arc<MemoryCacheStore>) {
        let store = Arc::new(MemoryCacheStore::new(NonZeroUsize::MIN.saturating_add(15)));
        let gateway = ContentGateway::new(source, store.clone(), Some(Duration::from_secs(60)));
        (gateway, store)
    }

    #[tokio::test]
    async fn transport_errors_carry_status_and_are_not_stored() {
        let (gateway, store) = gateway(Arc::new(FailingSource));

        let err = gateway.list_articles(10, 1).await.expect_err("failure");
        assert_eq!(err.status_code(), Some(503));
        assert!(matches!(
            err,
            GatewayError::Transport { operation: "list", .. }
        ));

        let err = gateway.get_article("x").await.expect_err("failure");
        assert_eq!(err.status_code(), None);
        assert!(!err.is_not_found());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn undecodable_entries_are_evicted_and_refetched() {
        let (gateway, store) = gateway(Arc::new(FailingSource));
        let key = CacheKey::article_list(10, 1).to_string();
        store
            .put(&key, Bytes::from_static(b"not json"), Duration::from_secs(60))
            .await;

        let err = gateway.list_articles(10, 1).await.expect_err("refetch fails");
        assert_eq!(err.status_code(), Some(503));
        assert!(store.get(&key).await.is_none());
    }

    #[test]
    fn not_found_reports_404() {
        let err = GatewayError::NotFound {
            slug: "gone".to_string(),
        };
        assert_eq!(err.status_code(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "article `gone` not found");
    }
}
