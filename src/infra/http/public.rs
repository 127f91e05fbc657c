use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    application::{
        catalog::{self, ArticleFilter, CategoryCount, DEFAULT_CATEGORY_SAMPLE},
        error::AppError,
        pagination::{PageParams, total_pages},
        related::{DEFAULT_RELATED_LIMIT, related_articles},
        render::render_content,
    },
    domain::article::{Article, DEFAULT_SUMMARY_LENGTH},
};

use super::{
    AppState,
    middleware::{log_responses, set_request_context},
    webhook::cms_webhook,
};

pub fn build_public_router(state: AppState) -> Router {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/{*slug}", get(article_detail))
        .route("/categories", get(categories))
        .route("/webhooks/cms", post(cms_webhook))
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Serialize)]
struct ArticleCard {
    slug: Option<String>,
    title: Option<String>,
    summary: String,
    formatted_date: Option<String>,
    featured_image_url: Option<String>,
    categories: Vec<String>,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            slug: article.slug.clone(),
            title: article.title.clone(),
            summary: article.summary(DEFAULT_SUMMARY_LENGTH),
            formatted_date: article.formatted_date(),
            featured_image_url: article.featured_image_url.clone(),
            categories: article.categories.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ArticleListing {
    items: Vec<ArticleCard>,
    total: u64,
    page: u32,
    per_page: u32,
    total_pages: u32,
}

#[derive(Debug, Serialize)]
struct ArticleDetail {
    id: Option<String>,
    slug: String,
    title: Option<String>,
    author: Option<String>,
    categories: Vec<String>,
    featured_image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    published_at: Option<OffsetDateTime>,
    formatted_date: Option<String>,
    summary: String,
    html: String,
    related: Vec<ArticleCard>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<ArticleListing>, AppError> {
    let (per_page, page) = params.resolve();
    let listing = catalog::list_for_filter(&state.gateway, &filter, per_page, page).await?;

    Ok(Json(ArticleListing {
        items: listing.items.iter().map(ArticleCard::from).collect(),
        total: listing.total,
        page,
        per_page,
        total_pages: total_pages(listing.total, per_page),
    }))
}

async fn article_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleDetail>, AppError> {
    let article = state.gateway.get_article(&slug).await?;
    let slug = article.ensure_routable()?.to_string();
    let related = related_articles(
        &state.gateway,
        &slug,
        &article.categories,
        DEFAULT_RELATED_LIMIT,
    )
    .await;

    Ok(Json(ArticleDetail {
        html: render_content(article.content.as_ref()),
        summary: article.summary(DEFAULT_SUMMARY_LENGTH),
        formatted_date: article.formatted_date(),
        related: related.iter().map(ArticleCard::from).collect(),
        id: article.id,
        slug,
        title: article.title,
        author: article.author,
        categories: article.categories,
        featured_image_url: article.featured_image_url,
        published_at: article.published_at,
    }))
}

async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>, AppError> {
    let counts = catalog::category_counts(&state.gateway, DEFAULT_CATEGORY_SAMPLE).await?;
    Ok(Json(counts))
}

async fn health() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
