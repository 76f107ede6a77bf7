//! Entry point tying the request client, query cache, mutation coordinator
//! and session together.

mod commands;
mod queries;

use std::future::Future;
use std::sync::Arc;

use bazaar_api_types::{LoginForm, MessageResponse, RegisterForm, ResponseEnvelope};
use url::Url;

use super::mutations::MutationCoordinator;
use super::session::{Identity, Session};
use crate::cache::{CacheConfig, CacheKey, QueryCache};
use crate::client::{ApiClient, ClientError, into_data};
use crate::config::Settings;
use crate::infra::token_store::{FileTokenStore, TokenStore};

#[derive(Debug, Clone)]
pub struct Marketplace {
    client: ApiClient,
    cache: QueryCache,
    mutations: MutationCoordinator,
    session: Arc<Session>,
}

impl Marketplace {
    /// Builds a client from resolved settings, persisting the session token
    /// under `session.token_dir`.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let store = Arc::new(FileTokenStore::new(&settings.session.token_dir));
        Self::new(
            &settings.api.base_url,
            CacheConfig::from(&settings.cache),
            store,
        )
    }

    pub fn new(
        base_url: &Url,
        cache: CacheConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let session = Arc::new(Session::new(store));
        let client = ApiClient::new(base_url, session.clone())?;
        let cache = QueryCache::new(cache);
        Ok(Self {
            client,
            mutations: MutationCoordinator::new(cache.clone()),
            cache,
            session,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.current()
    }

    pub async fn restore_session(&self) -> Result<Option<Identity>, ClientError> {
        self.session.restore(&self.client.auth()).await
    }

    /// Re-fetches the signed-in user and drops the cached `auth.me` entry.
    pub async fn refresh_session(&self) -> Result<Option<Identity>, ClientError> {
        let identity = self.session.refresh(&self.client.auth()).await?;
        self.cache.invalidate_prefix("auth.me");
        Ok(identity)
    }

    pub async fn login(&self, form: &LoginForm) -> Result<Identity, ClientError> {
        let identity = self.session.login(&self.client.auth(), form).await?;
        // Reads cached under a previous identity must not leak into this one.
        self.cache.clear();
        Ok(identity)
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<Identity, ClientError> {
        let identity = self.session.register(&self.client.auth(), form).await?;
        self.cache.clear();
        Ok(identity)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.session.logout(&self.client.auth()).await;
        self.cache.clear();
        result
    }

    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        self.client.auth().forgot_password(email).await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        self.client.auth().reset_password(token, password).await
    }

    /// Reads `key` through the cache; on a miss `call` issues the request and
    /// the envelope is unwrapped, so `success: false` is never cached.
    async fn query<T, F, Fut>(
        &self,
        key: CacheKey,
        fallback: &'static str,
        call: F,
    ) -> Result<T, ClientError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<ResponseEnvelope<T>, ClientError>> + Send + 'static,
    {
        let client = self.client.clone();
        self.cache
            .read(key, move || async move { into_data(call(client).await?, fallback) })
            .await
    }
}
