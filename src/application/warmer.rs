//! Cache warming: replays the gateway's reads so the first visitors hit a
//! populated cache.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::gateway::{ContentGateway, GatewayError};
use super::pagination::total_pages;

const SOURCE: &str = "application::warmer";
const METRIC_CACHE_WARM_MS: &str = "quire_cache_warm_ms";

#[derive(Debug, Error)]
pub enum CacheWarmError {
    #[error("failed to load the first article page")]
    FirstPage(#[source] GatewayError),
}

/// Counts of entries populated by one warm pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmReport {
    pub pages: usize,
    pub articles: usize,
    pub categories: usize,
    pub failures: usize,
}

/// Drives the gateway's reads to pre-populate the cache.
///
/// Only the first listing page must succeed; every later failure is logged,
/// counted, and skipped.
pub struct CacheWarmer {
    gateway: Arc<ContentGateway>,
    page_size: u32,
}

impl CacheWarmer {
    pub fn new(gateway: Arc<ContentGateway>, page_size: u32) -> Self {
        Self {
            gateway,
            page_size: page_size.max(1),
        }
    }

    pub async fn warm(&self, clear: bool) -> Result<WarmReport, CacheWarmError> {
        let started_at = Instant::now();
        info!(target = SOURCE, clear, page_size = self.page_size, "warming content cache");

        if clear {
            self.gateway.invalidate_all().await;
        }

        let first = self
            .gateway
            .list_articles(self.page_size, 1)
            .await
            .map_err(CacheWarmError::FirstPage)?;
        let mut report = WarmReport {
            pages: 1,
            ..WarmReport::default()
        };

        let pages = total_pages(first.total, self.page_size);
        for page in 2..=pages {
            match self.gateway.list_articles(self.page_size, page).await {
                Ok(_) => report.pages += 1,
                Err(err) => self.record_failure(&mut report, "page", &page.to_string(), &err),
            }
        }

        for article in &first.items {
            let Ok(slug) = article.ensure_routable() else {
                continue;
            };
            match self.gateway.get_article(slug).await {
                Ok(_) => report.articles += 1,
                Err(err) => self.record_failure(&mut report, "article", slug, &err),
            }
        }

        let mut categories: Vec<&str> = Vec::new();
        for category in first.items.iter().flat_map(|article| &article.categories) {
            if !categories.contains(&category.as_str()) {
                categories.push(category);
            }
        }
        for category in categories {
            match self
                .gateway
                .list_articles_by_category(category, self.page_size, 1)
                .await
            {
                Ok(_) => report.categories += 1,
                Err(err) => self.record_failure(&mut report, "category", category, &err),
            }
        }

        histogram!(METRIC_CACHE_WARM_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        info!(
            target = SOURCE,
            pages = report.pages,
            articles = report.articles,
            categories = report.categories,
            failures = report.failures,
            "content cache warmed"
        );
        Ok(report)
    }

    /// Warm pass run before serving. A failure is logged and the server starts
    /// with a cold cache.
    pub async fn warm_on_startup(&self) -> Option<WarmReport> {
        match self.warm(false).await {
            Ok(report) => Some(report),
            Err(CacheWarmError::FirstPage(cause)) => {
                warn!(
                    target = SOURCE,
                    error = %cause,
                    status = cause.status_code(),
                    "startup cache warm failed; serving with a cold cache"
                );
                None
            }
        }
    }

    fn record_failure(&self, report: &mut WarmReport, phase: &str, item: &str, err: &GatewayError) {
        report.failures += 1;
        warn!(target = SOURCE, phase, item, error = %err, "cache warm step failed");
    }
}
