//! Request-side machinery for swcache.
//!
//! This crate provides the network layer, freshness classification, the fetch
//! strategies, request routing, versioned partition management and the worker
//! lifecycle (install, activate, skip-waiting) built on top of them.

pub mod classify;
pub mod clients;
pub mod fetch;
pub mod partitions;
pub mod registration;
pub mod router;
pub mod strategy;
pub mod worker;

pub use classify::{Freshness, FreshnessPolicy, classify};
pub use clients::{Clients, ControlMessage, WorkerMessage};
pub use fetch::{FetchClient, FetchConfig, FetchRequest, Network};
pub use partitions::{ActivateReport, InstallReport, PartitionManager};
pub use registration::{FetchResult, Registration, RegistrationStatus, WorkerInfo};
pub use router::{InterceptedRequest, Route, Router, route};
pub use strategy::{ResponseSource, StrategyOutcome};
pub use worker::{EventOutcome, ServiceWorker, WorkerEvent, WorkerState};
