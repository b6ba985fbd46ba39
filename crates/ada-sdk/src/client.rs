//! Authenticated API client
//!
//! `Client` owns the token lifecycle and the request pipeline: it keeps a
//! valid access token in the session store (acquiring or renewing one as
//! needed), builds the endpoint URL and headers for each call, executes
//! through the transport, and maps the HTTP status to a success payload
//! or a typed error.
//!
//! Headers are transient: every call assembles its header map from
//! scratch, so an Authorization value never leaks from one call into the
//! next and always reflects the currently valid token.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{API_PATH, API_VERSION, TOKEN_PATH};
use crate::error::{Error, Result};
use crate::params::Params;
use crate::secret::Secret;
use crate::session::{MemorySessionStore, SessionStore};
use crate::token::{self, Token};
use crate::transport::{HttpTransport, ReqwestTransport, TransportRequest};

/// Statuses the request pipeline treats as success.
const SUCCESS_STATUSES: &[u16] = &[200, 201, 202];

/// Raw API response: status code and body bytes.
///
/// The pipeline never decodes bodies; callers pick the representation
/// via [`ApiResponse::text`] or [`ApiResponse::json`].
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status is one the pipeline treats as success.
    ///
    /// Only meaningful in silent mode, where non-success responses are
    /// returned instead of raised.
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUSES.contains(&self.status)
    }

    /// Body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(format!("response body: {e}")))
    }
}

/// Authenticated REST client for one logical session.
///
/// Cheap to share behind an `Arc`; concurrent calls are safe, and the
/// token refresh path is serialized so racing callers acquire at most
/// one token between them.
pub struct Client {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    /// Serializes the read-check-acquire-write token sequence
    refresh_lock: Mutex<()>,
    client_id: String,
    client_secret: Secret,
    token_url: String,
    api_root: String,
    silent_mode: bool,
    expiry_leeway: Duration,
}

impl Client {
    /// Client with the bundled reqwest transport and an in-memory
    /// session store.
    pub fn new(config: Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_parts(config, transport, Arc::new(MemorySessionStore::new()))
    }

    /// Client around an existing transport and session store.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        config.validate()?;

        let root = config.url.trim_end_matches('/');
        let token_url = format!("{root}{TOKEN_PATH}");
        let api_root = format!("{root}{API_PATH}");

        Ok(Self {
            transport,
            store,
            refresh_lock: Mutex::new(()),
            client_id: config.client_id,
            client_secret: config.client_secret,
            token_url,
            api_root,
            silent_mode: config.silent_mode,
            expiry_leeway: Duration::from_secs(config.expiry_leeway_secs),
        })
    }

    /// GET `endpoint`, encoding `params` into the query string.
    pub async fn get(&self, endpoint: &str, params: Params) -> Result<ApiResponse> {
        self.request(Method::GET, endpoint, params, HeaderMap::new())
            .await
    }

    /// POST `params` to `endpoint` as the request body.
    pub async fn post(&self, endpoint: &str, params: Params) -> Result<ApiResponse> {
        self.request(Method::POST, endpoint, params, HeaderMap::new())
            .await
    }

    /// PUT `params` to `endpoint` as the request body.
    pub async fn put(&self, endpoint: &str, params: Params) -> Result<ApiResponse> {
        self.request(Method::PUT, endpoint, params, HeaderMap::new())
            .await
    }

    /// DELETE `endpoint`, encoding `params` into the query string.
    pub async fn delete(&self, endpoint: &str, params: Params) -> Result<ApiResponse> {
        self.request(Method::DELETE, endpoint, params, HeaderMap::new())
            .await
    }

    /// Execute one authenticated request.
    ///
    /// `extra_headers` are merged in first; headers the pipeline owns
    /// (Authorization, Content-Type, Content-Length) replace any caller
    /// value of the same name.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Params,
        extra_headers: HeaderMap,
    ) -> Result<ApiResponse> {
        let token = self.valid_token().await?;

        let mut url = self.endpoint_url(endpoint);
        let mut headers = extra_headers;
        headers.insert(AUTHORIZATION, authorization_value(&token)?);

        let body = if method == Method::GET || method == Method::DELETE {
            let query = params.to_query()?;
            if !query.is_empty() {
                url = format!("{url}?{query}");
            }
            None
        } else {
            let (bytes, content_type) = params.to_body()?;
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len() as u64));
            Some(bytes)
        };

        debug!(%method, url = %url, "executing API request");
        let response = self
            .transport
            .execute(TransportRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;

        if SUCCESS_STATUSES.contains(&response.status) {
            return Ok(ApiResponse {
                status: response.status,
                body: response.body,
            });
        }

        if self.silent_mode {
            debug!(
                status = response.status,
                "returning non-success response in silent mode"
            );
            return Ok(ApiResponse {
                status: response.status,
                body: response.body,
            });
        }

        warn!(status = response.status, "API request failed");
        Err(Error::Api {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        })
    }

    /// Forget the cached token; the next call acquires a fresh one.
    pub async fn invalidate(&self) {
        self.store.clear().await;
    }

    /// Return a token that is valid right now, acquiring a fresh one if
    /// the stored token is missing or about to expire.
    ///
    /// The whole sequence holds the refresh lock, so concurrent calls
    /// acquire at most one token between them and never observe a
    /// half-written store.
    async fn valid_token(&self) -> Result<Token> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(stored) = self.store.load().await {
            if stored.is_fresh(self.expiry_leeway) {
                debug!("using cached access token");
                return Ok(stored);
            }
        }

        let token = token::request_token(
            self.transport.as_ref(),
            &self.token_url,
            &self.client_id,
            &self.client_secret,
        )
        .await?;
        self.store.save(token.clone()).await;
        Ok(token)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{API_VERSION}{}",
            self.api_root,
            normalize_endpoint(endpoint)
        )
    }
}

/// Ensure a leading slash. Idempotent.
fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with('/') {
        endpoint.to_owned()
    } else {
        format!("/{endpoint}")
    }
}

/// Authorization value from the stored token: the token type with its
/// first letter capitalized, a space, the token itself.
fn authorization_value(token: &Token) -> Result<HeaderValue> {
    let token_type = capitalize(&token.token_type.to_lowercase());
    let mut value = HeaderValue::from_str(&format!("{token_type} {}", token.access_token))
        .map_err(|e| Error::Encode(format!("authorization header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
