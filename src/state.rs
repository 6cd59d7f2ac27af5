use std::sync::{atomic::AtomicU64, Arc};
use tokio::sync::{broadcast, RwLock};

use crate::config::SiteConfig;
use crate::content_loader::SiteContent;
use crate::content_store::FsContentStore;
use crate::markdown::StyleRules;
use crate::notifier::Notifier;

pub type RefreshBroadcaster = broadcast::Sender<()>;

pub struct AppState {
    pub config: SiteConfig,
    pub style_rules: StyleRules,
    pub store: FsContentStore,
    pub notifier: Notifier,
    pub site: RwLock<SiteContent>,
    /// Bumped by every reload; see `content_loader::reload_content`.
    pub generation: AtomicU64,
}

impl AppState {
    pub fn new(
        config: SiteConfig,
        style_rules: StyleRules,
        notifier: Notifier,
        site: SiteContent,
    ) -> Self {
        AppState {
            store: FsContentStore::new(config.posts_dir()),
            config,
            style_rules,
            notifier,
            site: RwLock::new(site),
            generation: AtomicU64::new(0),
        }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
