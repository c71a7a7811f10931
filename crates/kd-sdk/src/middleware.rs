//! Request and response middleware
//!
//! Requests are passed through the chain by value, so every call carries
//! its own header map and concurrent calls never observe each other's
//! credentials.

use crate::assets::rewrite_asset_urls;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Transform applied to each outbound request before dispatch
pub trait RequestMiddleware: Send + Sync + fmt::Debug {
    fn on_request(&self, request: ApiRequest) -> Result<ApiRequest>;
}

/// Transform applied to each successful response payload
pub trait ResponseMiddleware: Send + Sync + fmt::Debug {
    fn on_response(&self, payload: Value) -> Value;
}

/// Ordered middleware chains
#[derive(Debug, Clone, Default)]
pub struct Middleware {
    request: Vec<Arc<dyn RequestMiddleware>>,
    response: Vec<Arc<dyn ResponseMiddleware>>,
}

impl Middleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer auth on the way out, asset rewriting on the way in
    pub fn standard(store: Arc<dyn CredentialStore>, asset_origin: &str) -> Self {
        Self::new()
            .with_request(BearerAuth::new(store))
            .with_response(AssetUrlRewriter::new(asset_origin))
    }

    pub fn with_request(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.request.push(Arc::new(middleware));
        self
    }

    pub fn with_response(mut self, middleware: impl ResponseMiddleware + 'static) -> Self {
        self.response.push(Arc::new(middleware));
        self
    }

    /// Run the request chain in registration order
    pub fn prepare(&self, request: ApiRequest) -> Result<ApiRequest> {
        self.request
            .iter()
            .try_fold(request, |request, middleware| middleware.on_request(request))
    }

    /// Run the response chain in registration order
    pub fn finish(&self, payload: Value) -> Value {
        self.response
            .iter()
            .fold(payload, |payload, middleware| middleware.on_response(payload))
    }
}

/// Sets `Authorization: Bearer <token>` from the credential store.
///
/// The store is read on every call, so a request replayed after a refresh
/// picks up the new token.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    store: Arc<dyn CredentialStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

impl RequestMiddleware for BearerAuth {
    fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest> {
        if let Some(token) = self.store.access_token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::Storage(format!("stored access token is not a valid header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }
}

/// Absolutizes server-relative asset URLs in response payloads
#[derive(Debug, Clone)]
pub struct AssetUrlRewriter {
    origin: String,
}

impl AssetUrlRewriter {
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into() }
    }
}

impl ResponseMiddleware for AssetUrlRewriter {
    fn on_response(&self, payload: Value) -> Value {
        rewrite_asset_urls(payload, &self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use serde_json::json;

    #[derive(Debug)]
    struct Tag(&'static str);

    impl RequestMiddleware for Tag {
        fn on_request(&self, request: ApiRequest) -> Result<ApiRequest> {
            let seen = request
                .headers()
                .get("x-chain")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            request.with_header("x-chain", &format!("{seen}{}", self.0))
        }
    }

    #[test]
    fn test_bearer_header_from_store() {
        let store: Arc<dyn CredentialStore> =
            Arc::new(MemoryCredentialStore::with_session("T1", None, None));
        let chain = Middleware::standard(store, "https://host");

        let prepared = chain.prepare(ApiRequest::get("/Jobs")).unwrap();
        assert_eq!(prepared.headers()[AUTHORIZATION], "Bearer T1");
    }

    #[test]
    fn test_no_header_without_token() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let chain = Middleware::standard(store, "https://host");

        let prepared = chain.prepare(ApiRequest::get("/Jobs")).unwrap();
        assert!(prepared.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_prepare_leaves_source_request_untouched() {
        let store: Arc<dyn CredentialStore> =
            Arc::new(MemoryCredentialStore::with_session("T1", None, None));
        let chain = Middleware::standard(store.clone(), "https://host");
        let original = ApiRequest::get("/Jobs");

        let first = chain.prepare(original.clone()).unwrap();
        store.save_tokens("T2", None).unwrap();
        let second = chain.prepare(original.clone()).unwrap();

        assert!(original.headers().get(AUTHORIZATION).is_none());
        assert_eq!(first.headers()[AUTHORIZATION], "Bearer T1");
        assert_eq!(second.headers()[AUTHORIZATION], "Bearer T2");
    }

    #[test]
    fn test_request_chain_runs_in_order() {
        let chain = Middleware::new().with_request(Tag("a")).with_request(Tag("b"));
        let prepared = chain.prepare(ApiRequest::get("/")).unwrap();
        assert_eq!(prepared.headers()["x-chain"], "ab");
    }

    #[test]
    fn test_response_chain_rewrites_assets() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let chain = Middleware::standard(store, "https://host");
        assert_eq!(
            chain.finish(json!({ "logoUrl": "/l.png" })),
            json!({ "logoUrl": "https://host/l.png" })
        );
    }
}
