//! Shared application state.

use domains::traits::{
    AuthProvider, CollectionRepo, HealthCheck, MediaRepo, MediaStorage, PostRepo, RedirectRepo,
    SettingsRepo,
};
use services::{
    CollectionService, IdCodec, MediaPolicy, MediaService, PostService, RedirectService,
    SearchService, SettingsService, SiteInfo,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Ports shared by every request. Services are cheap views over these and
/// are built per request.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepo>,
    pub collections: Arc<dyn CollectionRepo>,
    pub media: Arc<dyn MediaRepo>,
    pub redirects: Arc<dyn RedirectRepo>,
    pub settings: Arc<dyn SettingsRepo>,
    pub health: Arc<dyn HealthCheck>,
    pub storage: Arc<dyn MediaStorage>,
    pub auth: Arc<dyn AuthProvider>,
    pub ids: Arc<IdCodec>,
    /// Configured site identity; stored settings override it per request
    pub site: Arc<SiteInfo>,
    pub media_policy: MediaPolicy,
    /// Directory served under `media_url_prefix`, when media is stored locally
    pub media_root: Option<PathBuf>,
    pub media_url_prefix: String,
}

impl AppState {
    /// Wires every repository port to one store implementing them all.
    pub fn from_store<S>(
        store: Arc<S>,
        storage: Arc<dyn MediaStorage>,
        auth: Arc<dyn AuthProvider>,
        ids: IdCodec,
        site: SiteInfo,
    ) -> Self
    where
        S: PostRepo
            + CollectionRepo
            + MediaRepo
            + RedirectRepo
            + SettingsRepo
            + HealthCheck
            + 'static,
    {
        Self {
            posts: store.clone(),
            collections: store.clone(),
            media: store.clone(),
            redirects: store.clone(),
            settings: store.clone(),
            health: store,
            storage,
            auth,
            ids: Arc::new(ids),
            site: Arc::new(site),
            media_policy: MediaPolicy::default(),
            media_root: None,
            media_url_prefix: "/media".to_string(),
        }
    }

    pub fn with_media_policy(mut self, policy: MediaPolicy) -> Self {
        self.media_policy = policy;
        self
    }

    /// Serves files under `root` at `url_prefix`.
    pub fn with_local_media(mut self, root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        self.media_root = Some(root.into());
        self.media_url_prefix = url_prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(self.posts.clone())
    }

    pub fn search_service(&self) -> SearchService {
        SearchService::new(self.posts.clone())
    }

    pub fn collection_service(&self) -> CollectionService {
        CollectionService::new(self.collections.clone(), self.posts.clone())
    }

    pub fn media_service(&self) -> MediaService {
        MediaService::new(self.media.clone(), self.storage.clone(), self.media_policy)
    }

    pub fn redirect_service(&self) -> RedirectService {
        RedirectService::new(self.redirects.clone())
    }

    pub fn settings_service(&self) -> SettingsService {
        SettingsService::new(self.settings.clone(), (*self.site).clone())
    }
}
