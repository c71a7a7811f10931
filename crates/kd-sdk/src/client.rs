//! Session-aware Kodopo client
//!
//! Every call runs through the request middleware (bearer token), is
//! dispatched with the configured timeout, and has its payload normalized
//! by the response middleware. A 401 is recovered locally at most once per
//! request:
//!
//! 1. no response, or a status other than 401: returned to the caller
//! 2. 401 from the refresh endpoint: session terminated
//! 3. 401 on a request already replayed after a refresh: session terminated
//! 4. refresh already running: queue behind it, replay when it succeeds
//! 5. otherwise lead a refresh, release the queue, replay this request

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{Error, RefreshError, Result};
use crate::middleware::Middleware;
use crate::refresh::{RefreshCoordinator, Ticket};
use crate::request::{ApiRequest, RequestBody};
use crate::session::{Session, SessionEvent, TerminationReason};
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn, Instrument};

/// Body of the refresh call
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    token: &'a str,
}

/// Tokens returned by the refresh endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Kodopo API client
///
/// Cheap to clone; clones share the credential store, the refresh state and
/// the session event channel.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: Config,
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
    middleware: Middleware,
    refresh: RefreshCoordinator,
    session: Session,
}

impl Client {
    /// Create a client with the standard middleware
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let middleware = Middleware::standard(store.clone(), &config.asset_origin);
        Self::with_middleware(config, store, middleware)
    }

    /// Create a client with a custom middleware chain
    pub fn with_middleware(
        config: Config,
        store: Arc<dyn CredentialStore>,
        middleware: Middleware,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let session = Session::new(store.clone(), config.login_route.clone());

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                store,
                middleware,
                refresh: RefreshCoordinator::new(),
                session,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Receive session termination events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Clear stored credentials and announce the logout
    pub fn logout(&self) {
        self.inner.session.terminate(TerminationReason::UserLogout);
    }

    /// Send a request and return its normalized payload
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let span = info_span!(
            "request",
            request_id = %request.id(),
            method = %request.method(),
            path = %request.path(),
        );
        self.execute(request).instrument(span).await
    }

    /// Send a request and deserialize its normalized payload
    pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let payload = self.send(request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    // Boxed because a replay re-enters `execute`
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<Value>> {
        async move {
            match self.dispatch(&request).await {
                Ok(payload) => Ok(payload),
                Err(err) => self.recover(request, err).await,
            }
        }
        .boxed()
    }

    async fn recover(&self, mut request: ApiRequest, err: Error) -> Result<Value> {
        if !err.is_unauthorized() {
            return Err(err);
        }

        if self.inner.config.is_refresh_request(request.path()) {
            self.inner.session.terminate(TerminationReason::RefreshRejected);
            return Err(err);
        }

        if request.is_retried() {
            self.inner.session.terminate(TerminationReason::RetryRejected);
            return Err(err);
        }

        match self.inner.refresh.acquire() {
            Ticket::Follower(waiter) => {
                debug!("Waiting for in-flight token refresh");
                match waiter.wait().await {
                    Ok(_) => {
                        request.mark_retried();
                        self.execute(request).await
                    }
                    Err(refresh_err) => Err(Error::Refresh(refresh_err)),
                }
            }
            Ticket::Leader(lease) => {
                request.mark_retried();
                match self.refresh_tokens().await {
                    Ok(token) => {
                        let released = lease.settle(Ok(token));
                        debug!(released, "Replaying after refresh");
                        self.execute(request).await
                    }
                    Err(refresh_err) => {
                        lease.settle(Err(refresh_err.clone()));
                        let reason = match refresh_err {
                            RefreshError::Rejected { status: 401, .. } => {
                                TerminationReason::RefreshRejected
                            }
                            _ => TerminationReason::RefreshFailed,
                        };
                        self.inner.session.terminate(reason);

                        match refresh_err {
                            // Nothing was attempted; surface the 401 itself
                            RefreshError::MissingRefreshToken => Err(err),
                            other => Err(Error::Refresh(other)),
                        }
                    }
                }
            }
        }
    }

    /// Exchange the stored refresh token for new tokens and persist them.
    ///
    /// Goes straight to the HTTP client so the refresh call never passes
    /// through the middleware or the 401 recovery above.
    async fn refresh_tokens(&self) -> std::result::Result<String, RefreshError> {
        let refresh_token = self
            .inner
            .store
            .refresh_token()
            .ok_or(RefreshError::MissingRefreshToken)?;

        info!("Refreshing access token");

        let response = self
            .inner
            .http
            .post(self.inner.config.refresh_url())
            .json(&RefreshRequest { token: &refresh_token })
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Refresh endpoint rejected the refresh token");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        if tokens.access_token.is_empty() {
            return Err(RefreshError::InvalidResponse("empty access_token".to_string()));
        }

        self.inner
            .store
            .save_tokens(&tokens.access_token, tokens.refresh_token.as_deref())
            .map_err(|e| RefreshError::Storage(e.to_string()))?;

        info!(rotated = tokens.refresh_token.is_some(), "Access token refreshed");
        Ok(tokens.access_token)
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Value> {
        let prepared = self.inner.middleware.prepare(request.clone())?;
        let url = self.inner.config.url_for(prepared.path());

        let mut builder = self
            .inner
            .http
            .request(prepared.method().clone(), url)
            .headers(prepared.headers().clone());

        builder = match prepared.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        debug!(retried = prepared.is_retried(), "Dispatching");

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, timeout = e.is_timeout(), "Request failed without a response");
            Error::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "Request rejected");
            return Err(Error::from_status(status, body));
        }

        let bytes = response.bytes().await?;
        Ok(self.inner.middleware.finish(decode_payload(&bytes)))
    }
}

/// Empty bodies become `null`; bodies that are not JSON become a string
fn decode_payload(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(b""), Value::Null);
        assert_eq!(decode_payload(b"  \n"), Value::Null);
        assert_eq!(decode_payload(br#"{"id":1}"#), json!({ "id": 1 }));
        assert_eq!(decode_payload(b"Deleted"), json!("Deleted"));
    }

    #[test]
    fn test_token_response_accepts_both_casings() {
        let snake: TokenResponse =
            serde_json::from_value(json!({ "access_token": "a", "refresh_token": "r" })).unwrap();
        assert_eq!(snake.refresh_token.as_deref(), Some("r"));

        let camel: TokenResponse = serde_json::from_value(json!({ "accessToken": "a" })).unwrap();
        assert_eq!(camel.access_token, "a");
        assert!(camel.refresh_token.is_none());
    }
}
