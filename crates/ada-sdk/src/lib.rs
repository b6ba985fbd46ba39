//! OAuth2 client-credentials API client library
//!
//! Acquires access tokens via the client-credentials grant and drives an
//! authenticated request pipeline against the versioned REST API. The
//! transport and session store sit behind traits, so the client can be
//! tested and embedded without touching the network defaults.
//!
//! Request flow:
//! 1. Caller builds a [`Config`] (or loads one via `Config::load()`)
//! 2. [`Client::new`] wires up the reqwest transport and the in-memory
//!    session store
//! 3. Each call obtains a fresh-enough token from the store, renewing
//!    through `token::request_token()` when the stored one is missing
//!    or about to expire
//! 4. The pipeline builds the versioned URL and headers, executes, and
//!    maps non-success statuses to [`Error::Api`] (or hands back the
//!    raw [`ApiResponse`] in silent mode)

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod params;
pub mod secret;
pub mod session;
pub mod token;
pub mod transport;

pub use client::{ApiResponse, Client};
pub use config::Config;
pub use constants::*;
pub use error::{Error, Result};
pub use params::Params;
pub use secret::Secret;
pub use session::{MemorySessionStore, SessionStore};
pub use token::{Token, TokenResponse, request_token};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};

pub use reqwest::Method;
pub use reqwest::header::{HeaderMap, HeaderValue};
