//! Shared state behind every tool: the base configuration and the registration.

use std::sync::Arc;

use swcache_client::fetch::{Network, Url, resolve};
use swcache_client::{Registration, RegistrationStatus};
use swcache_core::{AppConfig, Error, PartitionStore};

use crate::error::HarnessError;

pub struct Harness {
    config: AppConfig,
    scope: Url,
    registration: Registration,
}

impl Harness {
    pub fn new(config: AppConfig, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>) -> Result<Self, HarnessError> {
        let scope = config.scope_url()?;
        Ok(Self { config, scope, registration: Registration::new(store, network) })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn store(&self) -> Arc<dyn PartitionStore> {
        self.registration.store()
    }

    /// Register the worker for the configured version, as a first page load would.
    pub async fn start(&self) -> Result<RegistrationStatus, Error> {
        let worker = self.registration.worker_for(&self.config)?;
        self.registration.register(worker).await
    }

    /// Config for another build of the same site.
    pub fn config_for(&self, version: &str) -> Result<AppConfig, HarnessError> {
        let config = AppConfig { version: version.trim().to_string(), ..self.config.clone() };
        config.validate()?;
        Ok(config)
    }

    /// Resolve a tool-supplied URL, absolute or relative to the scope.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.scope, input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use swcache_client::fetch::mock::MockNetwork;
    use swcache_core::MemoryStore;

    pub const SCOPE: &str = "https://portfolio.example/";

    /// Harness over an in-memory store and a network that serves the seed assets.
    pub fn harness() -> (Arc<MemoryStore>, Arc<MockNetwork>, Harness) {
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(MockNetwork::new());
        network
            .respond("https://portfolio.example/", 200, "<html>root</html>")
            .respond("https://portfolio.example/index.html", 200, "<html>shell</html>")
            .respond("https://portfolio.example/manifest.json", 200, "{}");

        let config = AppConfig { version: "v1".into(), scope: SCOPE.into(), ..Default::default() };
        let harness = Harness::new(config, store.clone(), network.clone()).unwrap();
        (store, network, harness)
    }

    /// Decode the JSON text payload of a tool result.
    pub fn output<T: serde::de::DeserializeOwned>(result: &rmcp::model::CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
