//! Scripted network for tests.
//!
//! Replies are configured per URL. Unscripted URLs fail like an unreachable
//! host. Every call is recorded so tests can assert what went over the wire.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use swcache_core::{Error, ResponseSnapshot};

use super::{FetchRequest, Network};

#[derive(Debug, Clone)]
enum Reply {
    Respond(ResponseSnapshot),
    Fail(String),
}

/// In-process [`Network`] with per-URL canned replies, failures and latency.
#[derive(Debug, Default)]
pub struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body` and no headers.
    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.respond_with(url, ResponseSnapshot::new(url, status, body))
    }

    pub fn respond_with(&self, url: &str, response: ResponseSnapshot) -> &Self {
        lock(&self.replies).insert(url.to_string(), Reply::Respond(response));
        self
    }

    /// Make `url` fail at the transport level.
    pub fn fail(&self, url: &str) -> &Self {
        lock(&self.replies).insert(url.to_string(), Reply::Fail(format!("connection refused: {url}")));
        self
    }

    /// Hold every fetch of `url` for `delay` before replying.
    pub fn delay(&self, url: &str, delay: Duration) -> &Self {
        lock(&self.delays).insert(url.to_string(), delay);
        self
    }

    /// Every request received, in order.
    pub fn calls(&self) -> Vec<FetchRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        lock(&self.calls).iter().filter(|r| r.url.as_str() == url).count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error> {
        let url = request.url.as_str().to_string();
        lock(&self.calls).push(request.clone());

        let delay = lock(&self.delays).get(&url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.replies).get(&url).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(Error::Network(message)),
            None => Err(Error::Network(format!("no route to {url}"))),
        }
    }
}
