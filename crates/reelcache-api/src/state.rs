//! Application state shared across handlers.

use reelcache_core::Config;
use reelcache_fetch::ReelFetcher;
use reelcache_storage::ReelStore;
use std::sync::Arc;

/// Immutable service handles, constructed once at startup and shared by
/// reference across all requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReelStore>,
    pub fetcher: Arc<ReelFetcher>,
}
