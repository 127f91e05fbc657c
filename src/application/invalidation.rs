//! Change-notification → cache invalidation policy.
//!
//! A recognized workflow action naming a specific story evicts only that
//! article. Everything else (unknown actions, notifications without a slug)
//! clears the whole store.

use quire_cms_types::ChangeNotification;
use tracing::info;

use super::gateway::ContentGateway;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    Published,
    Unpublished,
    Deleted,
    Other(String),
}

impl ChangeAction {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "published" => ChangeAction::Published,
            "unpublished" => ChangeAction::Unpublished,
            "deleted" => ChangeAction::Deleted,
            _ => ChangeAction::Other(tag.to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ChangeAction::Other(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationPlan {
    Article(String),
    All,
}

impl InvalidationPlan {
    pub fn for_event(action: &ChangeAction, slug: Option<&str>) -> Self {
        match slug.map(str::trim).filter(|slug| !slug.is_empty()) {
            Some(slug) if action.is_recognized() => InvalidationPlan::Article(slug.to_string()),
            _ => InvalidationPlan::All,
        }
    }

    pub fn for_notification(notification: &ChangeNotification) -> Self {
        let action = ChangeAction::parse(notification.action.as_deref().unwrap_or_default());
        Self::for_event(&action, notification.story_slug())
    }
}

/// Execute the invalidation a notification calls for and return the plan used.
pub async fn apply_change(
    gateway: &ContentGateway,
    notification: &ChangeNotification,
) -> InvalidationPlan {
    let plan = InvalidationPlan::for_notification(notification);
    info!(
        target = "application::invalidation::apply_change",
        action = notification.action.as_deref().unwrap_or("none"),
        plan = ?plan,
        "applying content change"
    );
    match &plan {
        InvalidationPlan::Article(slug) => gateway.invalidate_article(slug).await,
        InvalidationPlan::All => gateway.invalidate_all().await,
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions_case_insensitively() {
        assert_eq!(ChangeAction::parse("published"), ChangeAction::Published);
        assert_eq!(ChangeAction::parse("Unpublished"), ChangeAction::Unpublished);
        assert_eq!(ChangeAction::parse(" deleted "), ChangeAction::Deleted);
        assert_eq!(
            ChangeAction::parse("moved"),
            ChangeAction::Other("moved".to_string())
        );
    }

    #[test]
    fn specific_slug_targets_one_article() {
        for action in [
            ChangeAction::Published,
            ChangeAction::Unpublished,
            ChangeAction::Deleted,
        ] {
            assert_eq!(
                InvalidationPlan::for_event(&action, Some("hello")),
                InvalidationPlan::Article("hello".to_string())
            );
        }
    }

    #[test]
    fn ambiguous_events_clear_everything() {
        assert_eq!(
            InvalidationPlan::for_event(&ChangeAction::Published, None),
            InvalidationPlan::All
        );
        assert_eq!(
            InvalidationPlan::for_event(&ChangeAction::Published, Some("  ")),
            InvalidationPlan::All
        );
        assert_eq!(
            InvalidationPlan::for_event(&ChangeAction::Other("moved".to_string()), Some("hello")),
            InvalidationPlan::All
        );
    }

    #[test]
    fn notification_without_action_clears_everything() {
        let notification: ChangeNotification =
            serde_json::from_value(serde_json::json!({ "story": { "slug": "hello" } }))
                .expect("payload");
        assert_eq!(
            InvalidationPlan::for_notification(&notification),
            InvalidationPlan::All
        );
    }
}
