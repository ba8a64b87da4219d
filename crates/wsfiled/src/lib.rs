//! Server library - connection handling and dispatch logic extracted for testing.

use std::sync::Arc;

use crate::cache::ResponseCache;

pub mod cache;
pub mod dispatch;
pub mod net;
pub mod source;
pub mod stream;

/// State shared by every connection of one server process.
///
/// The response cache is the only mutable state crossing connection (and
/// command) boundaries; all access goes through its single-flight contract.
pub struct ServerState {
    pub cache: ResponseCache,
    pub http: reqwest::Client,
}

impl ServerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cache: ResponseCache::new(),
            http: reqwest::Client::new(),
        })
    }
}
