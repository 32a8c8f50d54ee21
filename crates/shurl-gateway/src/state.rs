use crate::identity::IdentityKeys;
use shurl_core::Token;
use shurl_service::LinkService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    service: LinkService,
    base_url: Arc<str>,
    identity_keys: Arc<IdentityKeys>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        service: LinkService,
        public_base_url: impl Into<String>,
        identity_keys: IdentityKeys,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            base_url: Arc::from(public_base_url.into()),
            identity_keys: Arc::new(identity_keys),
            shutdown,
        }
    }

    pub fn service(&self) -> &LinkService {
        &self.service
    }

    pub fn identity_keys(&self) -> &IdentityKeys {
        &self.identity_keys
    }

    /// Full short URL for `token`.
    pub fn short_url(&self, token: &Token) -> String {
        token.to_url(&self.base_url)
    }

    /// A token for one request's wait on the service. It fires when the
    /// server begins shutting down.
    pub fn request_cancellation(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
