//! Registration: the slot holder that sequences workers across versions.
//!
//! A registration has at most one active and one waiting worker. A newly
//! registered worker is installed, then either promoted right away (nothing
//! active yet, or it asked to skip waiting) or parked as the waiting worker
//! until a page posts `SKIP_WAITING`.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use swcache_core::{AppConfig, Error, PartitionStore};
use tokio::sync::Mutex;

use crate::clients::{Clients, ControlMessage};
use crate::fetch::Network;
use crate::router::{InterceptedRequest, Route};
use crate::strategy::StrategyOutcome;
use crate::worker::{EventOutcome, ServiceWorker, WorkerEvent, WorkerState};

#[derive(Default)]
struct Slots {
    active: Option<Arc<ServiceWorker>>,
    waiting: Option<Arc<ServiceWorker>>,
}

/// Version and state of one worker slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerInfo {
    pub version: String,
    pub state: WorkerState,
}

impl WorkerInfo {
    fn of(worker: &ServiceWorker) -> Self {
        Self { version: worker.version().to_string(), state: worker.state() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub active: Option<WorkerInfo>,
    pub waiting: Option<WorkerInfo>,
    /// Version controlling open pages.
    pub controller: Option<String>,
}

/// A fetch handled by the registration.
#[derive(Debug)]
pub struct FetchResult {
    /// `None` when no worker was active and the request went straight to the network.
    pub route: Option<Route>,
    /// Version of the worker that served it.
    pub version: Option<String>,
    pub outcome: StrategyOutcome,
}

pub struct Registration {
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    clients: Clients,
    slots: RwLock<Slots>,
    /// Serializes register and skip-waiting so promotions never interleave.
    lifecycle: Mutex<()>,
}

impl Registration {
    pub fn new(store: Arc<dyn PartitionStore>, network: Arc<dyn Network>) -> Self {
        Self { store, network, clients: Clients::new(), slots: RwLock::default(), lifecycle: Mutex::new(()) }
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn store(&self) -> Arc<dyn PartitionStore> {
        self.store.clone()
    }

    /// Build a worker for `config.version` sharing this registration's store, network and pages.
    pub fn worker_for(&self, config: &AppConfig) -> Result<Arc<ServiceWorker>, Error> {
        Ok(Arc::new(ServiceWorker::new(
            config,
            self.store.clone(),
            self.network.clone(),
            self.clients.clone(),
        )?))
    }

    pub fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.read_slots().active.clone()
    }

    pub fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.read_slots().waiting.clone()
    }

    /// Install `worker` and place it.
    ///
    /// Registering the version that is already active or waiting is a no-op.
    /// A failed install leaves the slots untouched.
    pub async fn register(&self, worker: Arc<ServiceWorker>) -> Result<RegistrationStatus, Error> {
        let _guard = self.lifecycle.lock().await;

        if self.holds_version(worker.version()) {
            tracing::debug!(version = worker.version(), "already registered");
            return Ok(self.status());
        }

        worker.dispatch(WorkerEvent::Install).await?;

        let promote_now = self.active().is_none() || worker.skip_waiting_requested();
        if promote_now {
            self.promote(worker).await?;
        } else {
            tracing::info!(version = worker.version(), "installed, waiting for pages to release the active worker");
            let replaced = self.write_slots().waiting.replace(worker);
            if let Some(replaced) = replaced {
                replaced.retire();
            }
        }

        Ok(self.status())
    }

    /// Deliver a page message to the worker it targets.
    ///
    /// `SKIP_WAITING` goes to the waiting worker and promotes it. Without a
    /// waiting worker it reaches the active one, where it has no effect.
    pub async fn post_message(&self, data: &str) -> Result<Option<ControlMessage>, Error> {
        let _guard = self.lifecycle.lock().await;

        let target = match self.waiting().or_else(|| self.active()) {
            Some(worker) => worker,
            None => {
                tracing::debug!("message with no worker registered: {data}");
                return Ok(None);
            }
        };

        let message = match target.dispatch(WorkerEvent::Message(data.to_string())).await? {
            EventOutcome::Message(message) => message,
            _ => None,
        };

        let is_waiting = self
            .waiting()
            .is_some_and(|w| Arc::ptr_eq(&w, &target));
        if message == Some(ControlMessage::SkipWaiting) && is_waiting {
            self.promote(target).await?;
        }

        Ok(message)
    }

    /// Handle an intercepted request with the active worker, or the bare network if none.
    pub async fn handle_fetch(&self, request: InterceptedRequest) -> Result<FetchResult, Error> {
        let Some(worker) = self.active() else {
            tracing::debug!(url = %request.request.url, "no active worker, passing through");
            let response = self.network.fetch(&request.request).await?;
            return Ok(FetchResult { route: None, version: None, outcome: StrategyOutcome::network(response) });
        };

        match worker.dispatch(WorkerEvent::Fetch(request)).await? {
            EventOutcome::Fetched { route, outcome } => {
                Ok(FetchResult { route: Some(route), version: Some(worker.version().to_string()), outcome })
            }
            _ => Err(Error::InvalidInput("fetch event produced no response".into())),
        }
    }

    pub fn status(&self) -> RegistrationStatus {
        let slots = self.read_slots();
        RegistrationStatus {
            active: slots.active.as_deref().map(WorkerInfo::of),
            waiting: slots.waiting.as_deref().map(WorkerInfo::of),
            controller: self.clients.controller(),
        }
    }

    /// Activate `worker`, retiring the current active one and any other
    /// waiting worker.
    ///
    /// The slot swap happens before activation so fetches issued during the
    /// sweep are served by the new version.
    async fn promote(&self, worker: Arc<ServiceWorker>) -> Result<(), Error> {
        let (previous, superseded) = {
            let mut slots = self.write_slots();
            let superseded = slots.waiting.take().filter(|w| !Arc::ptr_eq(w, &worker));
            (slots.active.replace(worker.clone()), superseded)
        };

        if let Some(superseded) = superseded {
            tracing::info!(version = superseded.version(), by = worker.version(), "discarding superseded waiting worker");
            superseded.retire();
        }

        if let Some(previous) = previous {
            tracing::info!(from = previous.version(), to = worker.version(), "replacing active worker");
            previous.retire();
        }

        worker.dispatch(WorkerEvent::Activate).await?;
        Ok(())
    }

    fn holds_version(&self, version: &str) -> bool {
        let slots = self.read_slots();
        [&slots.active, &slots.waiting]
            .into_iter()
            .flatten()
            .any(|w| w.version() == version)
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
