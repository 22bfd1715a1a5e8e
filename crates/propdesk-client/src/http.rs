//! Intercepting HTTP client for the PropDesk admin API
//!
//! Every authenticated request goes through `ApiClient::send`:
//!
//! 1. the bearer token of the current session is attached, refreshing it
//!    first when it is about to expire;
//! 2. a `401` answer triggers one refresh and one retry of the same request;
//! 3. a second `401`, or a refresh the server refuses, discards the session
//!    and surfaces [`Error::SessionExpired`].
//!
//! Refreshes are single-flight. Requests that fail with the same stale token
//! queue on the refresh lock; the first one refreshes, the others notice the
//! token has already changed and simply retry.

use crate::session::SessionManager;
use chrono::{TimeDelta, Utc};
use propdesk_core::{ApiConfig, Error, Result, TokenResponse};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const REFRESH_PATH: &str = "/auth/refresh";

/// Upper bound for the proactive refresh window (one day)
const MAX_REFRESH_SKEW_SECS: u64 = 86_400;

/// A request that can be sent more than once
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    authenticated: bool,
    token: Option<String>,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            token: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Send without a bearer token and without refresh handling
    pub(crate) const fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Attach a token that is not part of the stored session
    pub(crate) fn bearer(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub(crate) fn query(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub(crate) fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Error body shapes the API is known to return
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// HTTP client for the admin API with session handling built in
///
/// Cheap to clone; clones share the session and the refresh lock.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionManager>,
    refresh_skew: TimeDelta,
    refresh_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("refresh_skew", &self.refresh_skew)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config` sharing `session`
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URL is invalid or the
    /// underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> Result<Self> {
        config.validate()?;

        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("propdesk/", env!("CARGO_PKG_VERSION")));

        let http = builder.build().map_err(|e| Error::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        let skew_secs =
            i64::try_from(config.refresh_skew_secs.min(MAX_REFRESH_SKEW_SECS)).unwrap_or(0);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            refresh_skew: TimeDelta::seconds(skew_secs),
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Session shared by every clone of this client
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(&request).await?;
        decode(response).await
    }

    /// Send a request and discard the body
    pub(crate) async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(&request).await.map(drop)
    }

    /// Send a request through the auth interceptors
    ///
    /// Returns the response only when its status is a success.
    pub(crate) async fn send(&self, request: &ApiRequest) -> Result<Response> {
        if !request.authenticated {
            let response = self.dispatch(request, request.token.as_deref()).await?;
            return check_status(response, request).await;
        }

        let token = self.fresh_access_token().await?;
        let response = self.dispatch(request, Some(&token)).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response, request).await;
        }

        debug!(method = %request.method, path = %request.path, "Access token rejected, refreshing");
        self.refresh_after(&token).await?;

        let token = self.session.access_token().ok_or(Error::SessionExpired)?;
        let response = self.dispatch(request, Some(&token)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(
                method = %request.method,
                path = %request.path,
                "Refreshed token rejected, discarding session"
            );
            self.session.clear();
            return Err(Error::SessionExpired);
        }

        check_status(response, request).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "Request failed");
            Error::Transport(e.to_string())
        })?;

        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status().as_u16(),
            "API response"
        );
        Ok(response)
    }

    /// Access token to send now, refreshed first when close to expiry
    pub(crate) async fn fresh_access_token(&self) -> Result<String> {
        let session = self.session.current().ok_or(Error::Unauthenticated)?;

        if session.expires_within(self.refresh_skew, Utc::now()) {
            debug!(expires_at = %session.expires_at, "Access token about to expire, refreshing");
            self.refresh_after(&session.access_token).await?;
            return self.session.access_token().ok_or(Error::SessionExpired);
        }

        Ok(session.access_token)
    }

    /// Refresh the session unless someone already replaced `stale_token`
    async fn refresh_after(&self, stale_token: &str) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let session = self.session.current().ok_or(Error::SessionExpired)?;
        if session.access_token != stale_token {
            debug!("Session already refreshed by a concurrent request");
            return Ok(());
        }

        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh_token: &session.refresh_token,
            })
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let tokens: TokenResponse = decode(response).await?;
            let refreshed = session.refreshed(tokens, Utc::now());
            if !self.session.replace_if_current(stale_token, refreshed) {
                warn!("Session ended while refreshing, dropping new tokens");
                return Err(Error::SessionExpired);
            }
            info!(user = %session.user.email, "Access token refreshed");
            return Ok(());
        }

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!(status = status.as_u16(), "Refresh token rejected, discarding session");
            self.session.clear();
            return Err(Error::SessionExpired);
        }

        Err(error_from_response(response, REFRESH_PATH).await)
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn check_status(response: Response, request: &ApiRequest) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    if !request.authenticated && response.status() == StatusCode::UNAUTHORIZED {
        let body = read_error_body(response).await;
        return Err(Error::Authentication(
            body.summary().unwrap_or_else(|| "invalid credentials".to_string()),
        ));
    }

    Err(error_from_response(response, &request.path).await)
}

async fn read_error_body(response: Response) -> ApiErrorBody {
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => ApiErrorBody::default(),
    }
}

impl ApiErrorBody {
    fn summary(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .filter(|m| !m.trim().is_empty())
    }

    fn first_field_error(&self) -> Option<(String, String)> {
        self.errors.as_ref().and_then(|errors| {
            errors
                .iter()
                .find_map(|(field, messages)| messages.first().map(|m| (field.clone(), m.clone())))
        })
    }
}

async fn error_from_response(response: Response, path: &str) -> Error {
    let status = response.status();
    let body = read_error_body(response).await;

    if let Some((field, message)) = body.first_field_error()
        && matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
        )
    {
        return Error::Validation { field, message };
    }

    let message = body.summary().unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    });

    match status {
        StatusCode::NOT_FOUND => Error::NotFound {
            resource: path.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimitExceeded { message },
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}
