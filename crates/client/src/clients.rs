//! Page-facing messaging.
//!
//! Pages observe lifecycle transitions through a broadcast channel and send
//! control messages back as plain strings.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Lifecycle notification sent to every open page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SW_INSTALLED")]
    Installed { version: String },
    #[serde(rename = "SW_ACTIVATED")]
    Activated { version: String },
}

impl WorkerMessage {
    pub fn version(&self) -> &str {
        match self {
            WorkerMessage::Installed { version } | WorkerMessage::Activated { version } => version,
        }
    }
}

/// Message a page may post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Promote the waiting worker now instead of after every page closes.
    SkipWaiting,
}

impl ControlMessage {
    /// Recognize a page message. Only the exact literal matches.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "SKIP_WAITING" => Some(ControlMessage::SkipWaiting),
            _ => None,
        }
    }
}

/// The set of pages within scope.
#[derive(Debug, Clone)]
pub struct Clients {
    sender: broadcast::Sender<WorkerMessage>,
    controller: Arc<RwLock<Option<String>>>,
}

impl Default for Clients {
    fn default() -> Self {
        Self::new()
    }
}

impl Clients {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, controller: Arc::new(RwLock::new(None)) }
    }

    /// A new page listening for lifecycle messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerMessage> {
        self.sender.subscribe()
    }

    /// Broadcast to every listening page. Returns how many received it.
    pub fn post(&self, message: WorkerMessage) -> usize {
        match self.sender.send(message) {
            Ok(n) => n,
            Err(broadcast::error::SendError(message)) => {
                tracing::debug!(?message, "no pages listening");
                0
            }
        }
    }

    /// Take control of every open page for `version`.
    pub fn claim(&self, version: &str) {
        let mut controller = self
            .controller
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *controller = Some(version.to_string());
    }

    /// Version currently controlling pages, if any.
    pub fn controller(&self) -> Option<String> {
        self.controller
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
