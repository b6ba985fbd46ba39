//! Endpoint layout and default knobs
//!
//! The service exposes both the token endpoint and the REST API under a
//! single root URL. These constants capture that layout; the secrets
//! (client credentials, access tokens) live in `Config` and the session
//! store, never here.

/// Version segment included in every REST endpoint URL
pub const API_VERSION: &str = "v1";

/// Token endpoint path, relative to the service root URL
pub const TOKEN_PATH: &str = "/api/token";

/// REST API path prefix, relative to the service root URL
pub const API_PATH: &str = "/api";

/// Seconds before nominal expiry at which a cached token is treated as
/// expired. Absorbs clock skew and request latency so a token never
/// dies mid-request.
pub const DEFAULT_EXPIRY_LEEWAY_SECS: u64 = 60;

/// User-Agent sent by the bundled reqwest transport
pub const USER_AGENT: &str = concat!("ada-sdk/", env!("CARGO_PKG_VERSION"));
