//! OAuth2 token acquisition
//!
//! One token endpoint interaction: the client-credentials grant. The
//! client authenticates with HTTP Basic auth and receives a short-lived
//! access token. `expires_in` is a delta in seconds; it is converted to
//! an absolute instant captured just before the request was sent, so a
//! slow token endpoint can only shorten the cached lifetime, never
//! extend it.

use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::secret::Secret;
use crate::transport::{HttpTransport, TransportRequest};

/// A cached access token with its absolute expiry.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Instant,
}

impl Token {
    /// Whether the token can still be used, keeping `leeway` of headroom
    /// before the nominal expiry.
    ///
    /// A leeway so large that `now + leeway` is unrepresentable treats
    /// every token as stale.
    pub fn is_fresh(&self, leeway: Duration) -> bool {
        !self.access_token.is_empty()
            && Instant::now()
                .checked_add(leeway)
                .is_some_and(|horizon| horizon < self.expires_at)
    }
}

/// Response from the token endpoint on success.
///
/// `expires_in` is a delta in seconds from the response time. The caller
/// converts this to an absolute instant when storing the token.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
}

/// Error payload the token endpoint returns alongside a non-200 status.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error_description: String,
}

/// Request an access token via the client-credentials grant.
///
/// POSTs `grant_type=client_credentials` with HTTP Basic auth. Any
/// non-200 status is an error regardless of the client's silent mode:
/// no API call can proceed without a token.
pub async fn request_token(
    transport: &dyn HttpTransport,
    token_url: &str,
    client_id: &str,
    client_secret: &Secret,
) -> Result<Token> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, basic_auth(client_id, client_secret)?);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );

    let body = serde_urlencoded::to_string([("grant_type", "client_credentials")])
        .map_err(|e| Error::Encode(format!("token request body: {e}")))?;

    debug!(url = token_url, "requesting access token");
    let requested_at = Instant::now();

    let response = transport
        .execute(TransportRequest {
            method: Method::POST,
            url: token_url.to_owned(),
            headers,
            body: Some(body.into_bytes()),
        })
        .await?;

    if response.status != 200 {
        return Err(Error::OAuth {
            status: response.status,
            message: oauth_error_message(&response.body),
        });
    }

    let parsed: TokenResponse = match serde_json::from_slice(&response.body) {
        Ok(parsed) => parsed,
        // A 200 that does not carry a token is still an acquisition failure
        Err(_) => {
            return Err(Error::OAuth {
                status: response.status,
                message: oauth_error_message(&response.body),
            });
        }
    };

    // expires_in is wire-controlled; an expiry past the clock's range is
    // a failed acquisition
    let expires_at = requested_at
        .checked_add(Duration::from_secs(parsed.expires_in))
        .ok_or_else(|| Error::OAuth {
            status: response.status,
            message: format!("token expiry out of range: {} seconds", parsed.expires_in),
        })?;

    info!(expires_in = parsed.expires_in, "access token acquired");
    Ok(Token {
        access_token: parsed.access_token,
        token_type: parsed.token_type,
        expires_at,
    })
}

/// Basic auth header value for the token request.
fn basic_auth(client_id: &str, client_secret: &Secret) -> Result<HeaderValue> {
    let encoded = STANDARD.encode(format!("{client_id}:{}", client_secret.expose()));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| Error::Encode(format!("basic auth header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Extract a human-readable message from a token endpoint error body.
///
/// Well-formed failures carry `{"error": ..., "error_description": ...}`;
/// anything else gets a generic message.
fn oauth_error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<OAuthErrorBody>(body) {
        Ok(parsed) => parsed.error_description,
        Err(_) => String::from("unable to get access token"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ReqwestTransport;
    use axum::http::StatusCode;
    use tokio::net::TcpListener;

    /// Start a server answering POST /api/token with a fixed status and body.
    async fn start_token_server(status: StatusCode, body: serde_json::Value) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let app = axum::Router::new().route(
                "/api/token",
                axum::routing::post(move || async move { (status, axum::Json(body)) }),
            );
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/api/token")
    }

    #[test]
    fn token_response_deserializes() {
        let json = r#"{"access_token":"at_abc","token_type":"bearer","expires_in":3600}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "at_abc");
        assert_eq!(parsed.token_type, "bearer");
        assert_eq!(parsed.expires_in, 3600);
    }

    #[test]
    fn token_freshness_honors_leeway() {
        let token = Token {
            access_token: "at_abc".into(),
            token_type: "bearer".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(token.is_fresh(Duration::ZERO));
        // 60s of leeway pushes a 30s token past its usable life
        assert!(!token.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn empty_token_value_is_never_fresh() {
        let token = Token {
            access_token: String::new(),
            token_type: "bearer".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(!token.is_fresh(Duration::ZERO));
    }

    #[test]
    fn oversized_leeway_treats_token_as_stale() {
        let token = Token {
            access_token: "at_abc".into(),
            token_type: "bearer".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        // now + leeway overflows the clock; must report stale, not panic
        assert!(!token.is_fresh(Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn error_message_prefers_description() {
        let body = br#"{"error":"invalid_client","error_description":"client authentication failed"}"#;
        assert_eq!(oauth_error_message(body), "client authentication failed");
        assert_eq!(
            oauth_error_message(b"<html>offline</html>"),
            "unable to get access token"
        );
    }

    #[tokio::test]
    async fn acquires_token_with_expiry_from_pre_request_instant() {
        let url = start_token_server(
            StatusCode::OK,
            serde_json::json!({
                "access_token": "at_1",
                "token_type": "bearer",
                "expires_in": 3600,
            }),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let transport = ReqwestTransport::new().unwrap();
        let before = Instant::now();
        let token = request_token(&transport, &url, "client-1", &Secret::new("secret-1"))
            .await
            .unwrap();
        let after = Instant::now();

        assert_eq!(token.access_token, "at_1");
        assert_eq!(token.token_type, "bearer");
        // The expiry is anchored to the moment before the request went out
        assert!(token.expires_at >= before + Duration::from_secs(3600));
        assert!(token.expires_at <= after + Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn overflowing_expires_in_is_an_oauth_error() {
        let url = start_token_server(
            StatusCode::OK,
            serde_json::json!({
                "access_token": "at_1",
                "token_type": "bearer",
                "expires_in": u64::MAX,
            }),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let transport = ReqwestTransport::new().unwrap();
        let err = request_token(&transport, &url, "client-1", &Secret::new("secret-1"))
            .await
            .unwrap_err();

        match err {
            Error::OAuth { status, message } => {
                assert_eq!(status, 200);
                assert!(message.contains("out of range"), "got: {message}");
            }
            other => panic!("expected OAuth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_200_surfaces_error_description() {
        let url = start_token_server(
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "invalid_client",
                "error_description": "client authentication failed",
            }),
        )
        .await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let transport = ReqwestTransport::new().unwrap();
        let err = request_token(&transport, &url, "client-1", &Secret::new("wrong"))
            .await
            .unwrap_err();

        match err {
            Error::OAuth { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "client authentication failed");
            }
            other => panic!("expected OAuth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_oauth_error() {
        let url = start_token_server(StatusCode::OK, serde_json::json!({"unexpected": true})).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let transport = ReqwestTransport::new().unwrap();
        let err = request_token(&transport, &url, "client-1", &Secret::new("secret-1"))
            .await
            .unwrap_err();

        match err {
            Error::OAuth { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "unable to get access token");
            }
            other => panic!("expected OAuth error, got {other:?}"),
        }
    }
}
