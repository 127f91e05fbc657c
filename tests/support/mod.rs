//! Shared fixtures for integration tests: an in-memory content source that
//! counts every call it receives.

#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quire::application::gateway::ContentGateway;
use quire::application::source::{
    ContentSource, SourceError, StoriesFilter, StoriesPage, StoriesQuery,
};
use quire::cache::MemoryCacheStore;
use quire_cms_types::{RawStory, RawStoryContent};
use serde_json::{Value, json};

pub const TTL: Duration = Duration::from_secs(3600);

pub fn story(slug: &str, title: &str, categories: &[&str]) -> RawStory {
    RawStory {
        uuid: Some(format!("uuid-{slug}")),
        slug: Some(slug.to_string()),
        name: Some(title.to_string()),
        published_at: Some("2024-01-05T10:00:00Z".to_string()),
        content: Some(RawStoryContent {
            title: Some(title.to_string()),
            categories: Some(categories.iter().map(|name| json!(name)).collect()),
            content: Some(json!({
                "type": "doc",
                "content": [{
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": format!("Body of {title}") }]
                }]
            })),
            ..RawStoryContent::default()
        }),
        ..RawStory::default()
    }
}

/// Content source backed by a fixed list of stories.
#[derive(Default)]
pub struct FakeSource {
    stories: Mutex<Vec<RawStory>>,
    failure: Mutex<Option<SourceError>>,
    queries: Mutex<Vec<StoriesQuery>>,
    list_calls: AtomicUsize,
    story_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_stories(stories: Vec<RawStory>) -> Arc<Self> {
        Arc::new(Self {
            stories: Mutex::new(stories),
            ..Self::default()
        })
    }

    pub fn fail_with(&self, error: Option<SourceError>) {
        *self.failure.lock().expect("failure lock") = error;
    }

    pub fn replace_stories(&self, stories: Vec<RawStory>) {
        *self.stories.lock().expect("stories lock") = stories;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn story_calls(&self) -> usize {
        self.story_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.list_calls() + self.story_calls()
    }

    pub fn queries(&self) -> Vec<StoriesQuery> {
        self.queries.lock().expect("queries lock").clone()
    }

    fn failure(&self) -> Option<SourceError> {
        self.failure.lock().expect("failure lock").clone()
    }
}

fn in_category(story: &RawStory, category: &str) -> bool {
    story
        .content
        .as_ref()
        .and_then(|content| content.categories.as_ref())
        .is_some_and(|items| items.iter().any(|item| item == &Value::from(category)))
}

fn matches_term(story: &RawStory, term: &str) -> bool {
    story
        .name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase()))
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch_stories(&self, query: &StoriesQuery) -> Result<StoriesPage, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().expect("queries lock").push(query.clone());
        if let Some(error) = self.failure() {
            return Err(error);
        }

        let stories = self.stories.lock().expect("stories lock").clone();
        let matching: Vec<RawStory> = stories
            .into_iter()
            .filter(|story| match &query.filter {
                StoriesFilter::None => true,
                StoriesFilter::Category(category) => in_category(story, category),
                StoriesFilter::Search(term) => matches_term(story, term),
            })
            .collect();

        let total = matching.len() as u64;
        let per_page = query.per_page as usize;
        let skip = (query.page.max(1) as usize - 1) * per_page;
        Ok(StoriesPage {
            stories: matching.into_iter().skip(skip).take(per_page).collect(),
            total,
        })
    }

    async fn fetch_story(&self, slug: &str) -> Result<Option<RawStory>, SourceError> {
        self.story_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure() {
            return Err(error);
        }
        Ok(self
            .stories
            .lock()
            .expect("stories lock")
            .iter()
            .find(|story| story.slug.as_deref() == Some(slug))
            .cloned())
    }
}

pub fn store() -> Arc<MemoryCacheStore> {
    Arc::new(MemoryCacheStore::new(
        NonZeroUsize::new(256).expect("non-zero capacity"),
    ))
}

pub fn gateway(source: Arc<FakeSource>, ttl: Option<Duration>) -> (Arc<ContentGateway>, Arc<MemoryCacheStore>) {
    let store = store();
    let gateway = Arc::new(ContentGateway::new(source, store.clone(), ttl));
    (gateway, store)
}

pub fn sample_stories() -> Vec<RawStory> {
    vec![
        story("rust-intro", "Rust Intro", &["Tech", "Rust"]),
        story("async-deep-dive", "Async Deep Dive", &["Tech"]),
        story("garden-notes", "Garden Notes", &["Life"]),
        story("tech-roundup", "Tech Roundup", &["Tech"]),
        story("recipes", "Recipes", &["Life", "Food"]),
    ]
}
