//! HTTP adapter for the CMS content delivery API.

use async_trait::async_trait;
use bytes::Bytes;
use quire_cms_types::{RawStory, StoriesEnvelope, StoryEnvelope};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::application::source::{
    ContentSource, SourceError, StoriesFilter, StoriesPage, StoriesQuery,
};
use crate::config::{CmsSettings, ContentVersion};

use super::error::InfraError;

const TOTAL_HEADER: &str = "total";
const SORT_ORDER: &str = "published_at:desc";

#[derive(Clone, Debug)]
pub struct HttpContentSource {
    client: Client,
    base: Url,
    token: String,
    version: ContentVersion,
    content_type: String,
}

impl HttpContentSource {
    /// Build the source from settings. The access token must be present.
    pub fn new(settings: &CmsSettings) -> Result<Self, InfraError> {
        let token = settings.access_token.clone().ok_or_else(|| {
            InfraError::configuration("cms.access_token is required to reach the content source")
        })?;
        if settings.base_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "cms.base_url `{}` cannot carry a path",
                settings.base_url
            )));
        }

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::client(err.to_string()))?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            token,
            version: settings.version,
            content_type: settings.content_type.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("quire/", env!("CARGO_PKG_VERSION"))
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("stories").extend(segments);
        }
        url
    }

    fn list_url(&self, query: &StoriesQuery) -> Url {
        let mut url = self.endpoint([]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("token", &self.token)
                .append_pair("per_page", &query.per_page.to_string())
                .append_pair("page", &query.page.to_string())
                .append_pair("content_type", &self.content_type)
                .append_pair("version", self.version.as_str())
                .append_pair("sort_by", SORT_ORDER);
            match &query.filter {
                StoriesFilter::None => {}
                StoriesFilter::Category(category) => {
                    pairs.append_pair("filter_query[categories][in]", category);
                }
                StoriesFilter::Search(term) => {
                    pairs.append_pair("search_term", term);
                }
            }
        }
        url
    }

    fn story_url(&self, slug: &str) -> Url {
        let mut url = self.endpoint(slug.split('/').filter(|segment| !segment.is_empty()));
        url.query_pairs_mut()
            .append_pair("token", &self.token)
            .append_pair("version", self.version.as_str());
        url
    }

    async fn get(&self, url: Url) -> Result<Response, SourceError> {
        debug!(
            target = "infra::cms::HttpContentSource",
            path = url.path(),
            "requesting content source"
        );
        self.client.get(url).send().await.map_err(transport_error)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_stories(&self, query: &StoriesQuery) -> Result<StoriesPage, SourceError> {
        let response = self.get(self.list_url(query)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let header_total = response
            .headers()
            .get(TOTAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let body = read_body(response).await?;
        let envelope: StoriesEnvelope =
            serde_json::from_slice(&body).map_err(|err| SourceError::Decode(err.to_string()))?;

        Ok(StoriesPage {
            total: envelope.total.or(header_total).unwrap_or(0),
            stories: envelope.stories,
        })
    }

    async fn fetch_story(&self, slug: &str) -> Result<Option<RawStory>, SourceError> {
        let response = self.get(self.story_url(slug)).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = read_body(response).await?;
        let envelope: StoryEnvelope =
            serde_json::from_slice(&body).map_err(|err| SourceError::Decode(err.to_string()))?;
        Ok(envelope.story)
    }
}

async fn read_body(response: Response) -> Result<Bytes, SourceError> {
    response.bytes().await.map_err(transport_error)
}

fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Network(err.without_url().to_string())
    }
}
