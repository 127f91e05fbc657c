//! axum surfaces: the public read API and the loopback admin API.

mod admin;
mod middleware;
mod public;
mod webhook;

use std::sync::Arc;

pub use admin::build_admin_router;
pub use middleware::RequestContext;
pub use public::build_public_router;

use crate::application::gateway::ContentGateway;
use crate::application::warmer::CacheWarmer;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ContentGateway>,
    pub warmer: Arc<CacheWarmer>,
}

impl AppState {
    pub fn new(gateway: Arc<ContentGateway>, warmer: Arc<CacheWarmer>) -> Self {
        Self { gateway, warmer }
    }
}
