//! One versioned worker instance and its event dispatch table.
//!
//! The platform delivers four kinds of events: install, activate, fetch and
//! message. Each maps to exactly one handler here. Lifecycle ordering across
//! versions (waiting, promotion, redundancy) belongs to the registration.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use swcache_core::{AppConfig, Error, PartitionStore};

use crate::classify::FreshnessPolicy;
use crate::clients::{Clients, ControlMessage, WorkerMessage};
use crate::fetch::Network;
use crate::partitions::{ActivateReport, InstallReport, PartitionManager};
use crate::router::{InterceptedRequest, Route, Router};
use crate::strategy::StrategyOutcome;

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting to take over.
    Installed,
    Activating,
    Activated,
    /// Superseded, or install failed. Never used again.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Events the platform delivers to a worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(InterceptedRequest),
    Message(String),
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched { route: Route, outcome: StrategyOutcome },
    /// The recognized control message, if the data was one.
    Message(Option<ControlMessage>),
}

/// A worker built for a single version.
pub struct ServiceWorker {
    version: String,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
    skip_waiting_on_install: bool,
    manager: Arc<PartitionManager>,
    router: Router,
    clients: Clients,
}

impl ServiceWorker {
    pub fn new(
        config: &AppConfig, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>, clients: Clients,
    ) -> Result<Self, Error> {
        let manager = Arc::new(PartitionManager::new(config, store, network)?);
        let router = Router::new(manager.clone(), FreshnessPolicy::from(config));

        Ok(Self {
            version: config.version.clone(),
            state: Mutex::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            skip_waiting_on_install: config.skip_waiting_on_install,
            manager,
            router,
            clients,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn state(&self) -> WorkerState {
        *self.lock_state()
    }

    pub fn manager(&self) -> &PartitionManager {
        &self.manager
    }

    /// Ask to be promoted as soon as installed, without waiting for pages to close.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Mark as superseded.
    pub fn retire(&self) {
        self.set_state(WorkerState::Redundant);
    }

    /// Route an event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install => self.on_install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.on_activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => {
                let (route, outcome) = self.on_fetch(&request).await?;
                Ok(EventOutcome::Fetched { route, outcome })
            }
            WorkerEvent::Message(data) => Ok(EventOutcome::Message(self.on_message(&data))),
        }
    }

    async fn on_install(&self) -> Result<InstallReport, Error> {
        self.set_state(WorkerState::Installing);
        tracing::info!(version = %self.version, "installing");

        let report = match self.manager.install().await {
            Ok(report) => report,
            Err(e) => {
                self.set_state(WorkerState::Redundant);
                tracing::warn!(version = %self.version, "install failed: {e}");
                return Err(e);
            }
        };

        if self.skip_waiting_on_install {
            self.skip_waiting();
        }
        self.set_state(WorkerState::Installed);
        self.clients.post(WorkerMessage::Installed { version: self.version.clone() });
        Ok(report)
    }

    async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.set_state(WorkerState::Activating);
        tracing::info!(version = %self.version, "activating");

        let report = self.manager.activate().await?;

        self.clients.claim(&self.version);
        self.set_state(WorkerState::Activated);
        self.clients.post(WorkerMessage::Activated { version: self.version.clone() });
        tracing::info!(version = %self.version, "activated");
        Ok(report)
    }

    async fn on_fetch(&self, request: &InterceptedRequest) -> Result<(Route, StrategyOutcome), Error> {
        self.router.handle(request).await
    }

    fn on_message(&self, data: &str) -> Option<ControlMessage> {
        let message = ControlMessage::parse(data);
        match message {
            Some(ControlMessage::SkipWaiting) => self.skip_waiting(),
            None => tracing::debug!(version = %self.version, "ignoring message: {data}"),
        }
        message
    }

    fn set_state(&self, state: WorkerState) {
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.version)
            .field("state", &self.state())
            .field("skip_waiting", &self.skip_waiting_requested())
            .finish()
    }
}
