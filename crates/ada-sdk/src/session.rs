//! Session-scoped token storage
//!
//! Holds at most one token for the lifetime of a logical session. The
//! bundled `MemorySessionStore` suits single-process use; deployments
//! that share a session across processes implement `SessionStore` over
//! their own backend.
//!
//! The trait is infallible on purpose: a backend read failure should
//! behave as a cache miss (the token gets re-acquired) and a write
//! failure as a dropped cache entry. Implementations log and degrade
//! instead of propagating storage errors into the request path.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::Mutex;

use crate::token::Token;

/// Backing store for the session's cached token.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn SessionStore>`).
pub trait SessionStore: Send + Sync {
    /// Read the stored token, if any.
    fn load(&self) -> Pin<Box<dyn Future<Output = Option<Token>> + Send + '_>>;

    /// Store a token, replacing any previous one.
    fn save(&self, token: Token) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Drop the stored token.
    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// In-memory store for a single-process session.
#[derive(Default)]
pub struct MemorySessionStore {
    state: Mutex<Option<Token>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Option<Token>> + Send + '_>> {
        Box::pin(async { self.state.lock().await.clone() })
    }

    fn save(&self, token: Token) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            *self.state.lock().await = Some(token);
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {
            *self.state.lock().await = None;
        })
    }
}
