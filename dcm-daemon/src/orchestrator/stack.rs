//! Descriptor orchestration for the managed compose stack.
//!
//! Every change runs the same cycle against the configured descriptor:
//! load, mutate, save, then restart the stack. Cycles are serialized by a
//! lock held for the whole cycle, restart included.

use dcm_core::{
    ComposeCodec, ComposeFile, Config, Network, Result, Service, StackApplier, Volume,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// A named entity in an insert request.
#[derive(Debug, Clone, Deserialize)]
pub struct Entry<T> {
    pub name: String,
    #[serde(default)]
    pub value: T,
}

/// Service to upsert, with an optional network and volume to upsert
/// alongside it. Network and volume entries with an empty name are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertRequest {
    pub service: Entry<Service>,
    #[serde(default)]
    pub network: Option<Entry<Network>>,
    #[serde(default)]
    pub volume: Option<Entry<Volume>>,
}

/// Orchestrator for the compose descriptor at a single location.
pub struct ComposeOrchestrator {
    compose_path: PathBuf,
    shared_secret_key: Option<String>,
    applier: Arc<dyn StackApplier>,
    lock: Mutex<()>,
}

impl ComposeOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    /// * `config` - Descriptor location and shared-secret settings
    /// * `applier` - Restarts the stack after each saved change
    pub fn new(config: &Config, applier: Arc<dyn StackApplier>) -> Self {
        Self {
            compose_path: config.docker_path.clone(),
            shared_secret_key: config.shared_secret_key.clone(),
            applier,
            lock: Mutex::new(()),
        }
    }

    pub fn compose_path(&self) -> &Path {
        &self.compose_path
    }

    /// Upsert a service (plus optional network and volume), broadcast the
    /// shared secret, save and restart the stack.
    #[instrument(skip(self, request), fields(service = %request.service.name))]
    pub async fn insert(&self, request: InsertRequest) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut compose = ComposeCodec::load(&self.compose_path)?;

        let InsertRequest { service, network, volume } = request;
        compose.add_service(&service.name, service.value);

        if let Some(volume) = volume.filter(|v| !v.name.is_empty()) {
            compose.add_volume(&volume.name, volume.value);
        }
        if let Some(network) = network.filter(|n| !n.name.is_empty()) {
            compose.add_network(&network.name, network.value);
        }

        if let Some(key) = &self.shared_secret_key {
            let updated = propagate_shared_secret(&mut compose, key, &service.name);
            debug!(key = %key, updated, "Propagated shared secret");
        }

        ComposeCodec::save(&compose, &self.compose_path)?;
        info!("Service inserted");

        self.apply().await
    }

    /// Delete a service and the top-level volumes it mounts, save and
    /// restart the stack. Returns the removed volume names.
    ///
    /// A missing service fails before anything is written or restarted.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut compose = ComposeCodec::load(&self.compose_path)?;

        let removed_volumes = compose.remove_service_cascading(name)?;

        ComposeCodec::save(&compose, &self.compose_path)?;
        info!(volumes = ?removed_volumes, "Service deleted");

        self.apply().await?;
        Ok(removed_volumes)
    }

    /// Service names, sorted.
    pub async fn list_services(&self) -> Result<Vec<String>> {
        let compose = ComposeCodec::load(&self.compose_path)?;
        let mut names = compose.list_services();
        names.sort();
        Ok(names)
    }

    pub async fn get_service(&self, name: &str) -> Result<Service> {
        let compose = ComposeCodec::load(&self.compose_path)?;
        compose.get_service(name).cloned()
    }

    async fn apply(&self) -> Result<()> {
        self.applier.apply(&self.compose_path).await.map_err(|e| {
            warn!(error = %e, "Stack restart failed; saved descriptor left in place");
            e
        })
    }
}

/// Copy the `key` environment value of `source` into every service.
///
/// Returns the number of services written, zero when `source` does not
/// define `key`.
pub fn propagate_shared_secret(compose: &mut ComposeFile, key: &str, source: &str) -> usize {
    let Some(value) =
        compose.services.get(source).and_then(|s| s.environment.get(key)).cloned()
    else {
        debug!(source, key, "Source service has no shared secret, skipping broadcast");
        return 0;
    };

    for service in compose.services.values_mut() {
        service.environment.insert(key.to_string(), value.clone());
    }
    compose.services.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockApplier, StackFixture};
    use dcm_core::{ApplyPhase, DcmError};
    use std::collections::BTreeMap;

    fn insert_request(name: &str, image: &str, secret: Option<&str>) -> InsertRequest {
        let environment = secret
            .map(|s| BTreeMap::from([("AUTH_KEY".to_string(), s.to_string())]))
            .unwrap_or_default();
        InsertRequest {
            service: Entry {
                name: name.to_string(),
                value: Service {
                    image: Some(image.to_string()),
                    volumes: vec![format!("{}-data:/data", name)],
                    environment,
                    ..Default::default()
                },
            },
            network: Some(Entry { name: "front".to_string(), value: Network::default() }),
            volume: Some(Entry { name: format!("{}-data", name), value: Volume::default() }),
        }
    }

    #[test]
    fn test_propagate_shared_secret_reaches_every_service() {
        let mut compose = ComposeFile::new("3.8");
        compose.add_service("web", Service::default());
        compose.add_service(
            "api",
            Service {
                environment: BTreeMap::from([("AUTH_KEY".to_string(), "s3cret".to_string())]),
                ..Default::default()
            },
        );

        assert_eq!(propagate_shared_secret(&mut compose, "AUTH_KEY", "api"), 2);
        assert_eq!(compose.services["web"].environment["AUTH_KEY"], "s3cret");
    }

    #[test]
    fn test_propagate_shared_secret_without_source_value() {
        let mut compose = ComposeFile::new("3.8");
        compose.add_service("web", Service::default());
        compose.add_service("api", Service::default());

        assert_eq!(propagate_shared_secret(&mut compose, "AUTH_KEY", "api"), 0);
        assert!(compose.services["web"].environment.is_empty());
    }

    #[tokio::test]
    async fn test_insert_saves_and_applies() {
        let fixture = StackFixture::new("version: \"3.8\"\n");
        let applier = Arc::new(MockApplier::default());
        let orchestrator = fixture.orchestrator(applier.clone());

        orchestrator.insert(insert_request("api", "app:1.0", Some("abc"))).await.unwrap();

        let compose = fixture.load();
        assert_eq!(compose.services["api"].image.as_deref(), Some("app:1.0"));
        assert!(compose.volumes.contains_key("api-data"));
        assert!(compose.networks.contains_key("front"));
        assert_eq!(applier.calls(), vec![fixture.path.clone()]);
    }

    #[tokio::test]
    async fn test_insert_broadcasts_secret_to_existing_services() {
        let fixture = StackFixture::new(
            r#"
services:
  web:
    image: nginx
    environment:
      AUTH_KEY: old
  worker:
    image: worker
"#,
        );
        let orchestrator = fixture.orchestrator(Arc::new(MockApplier::default()));

        orchestrator.insert(insert_request("api", "app:1.0", Some("new"))).await.unwrap();

        let compose = fixture.load();
        for name in ["web", "worker", "api"] {
            assert_eq!(compose.services[name].environment["AUTH_KEY"], "new", "service {}", name);
        }
    }

    #[tokio::test]
    async fn test_insert_ignores_unnamed_network_and_volume() {
        let fixture = StackFixture::new("version: \"3.8\"\n");
        let orchestrator = fixture.orchestrator(Arc::new(MockApplier::default()));

        let mut request = insert_request("api", "app:1.0", None);
        request.network = Some(Entry { name: String::new(), value: Network::default() });
        request.volume = None;
        orchestrator.insert(request).await.unwrap();

        let compose = fixture.load();
        assert!(compose.networks.is_empty());
        assert!(compose.volumes.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_disabled_by_config() {
        let fixture = StackFixture::new("services:\n  web:\n    image: nginx\n");
        let mut config = fixture.config();
        config.shared_secret_key = None;
        let orchestrator = ComposeOrchestrator::new(&config, Arc::new(MockApplier::default()));

        orchestrator.insert(insert_request("api", "app:1.0", Some("abc"))).await.unwrap();

        assert!(fixture.load().services["web"].environment.is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades_and_applies() {
        let fixture = StackFixture::new(
            r#"
services:
  api:
    image: app:1.0
    volumes:
      - cache:/data
      - ./logs:/logs
  web:
    image: nginx
volumes:
  cache:
"#,
        );
        let applier = Arc::new(MockApplier::default());
        let orchestrator = fixture.orchestrator(applier.clone());

        let removed = orchestrator.delete("api").await.unwrap();
        assert_eq!(removed, vec!["cache"]);

        let compose = fixture.load();
        assert_eq!(compose.list_services(), vec!["web"]);
        assert!(compose.volumes.is_empty());
        assert_eq!(applier.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_service_writes_nothing() {
        let fixture = StackFixture::new("services:\n  web:\n    image: nginx\n");
        let before = std::fs::read_to_string(&fixture.path).unwrap();
        let applier = Arc::new(MockApplier::default());
        let orchestrator = fixture.orchestrator(applier.clone());

        let err = orchestrator.delete("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(std::fs::read_to_string(&fixture.path).unwrap(), before);
        assert!(applier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_apply_failure_keeps_saved_descriptor() {
        let fixture = StackFixture::new("version: \"3.8\"\n");
        let orchestrator = fixture.orchestrator(Arc::new(MockApplier::failing(ApplyPhase::Start)));

        let err = orchestrator.insert(insert_request("api", "app:1.0", None)).await.unwrap_err();
        assert!(matches!(err, DcmError::Apply { phase: ApplyPhase::Start, .. }));
        assert!(fixture.load().services.contains_key("api"));
    }

    #[tokio::test]
    async fn test_unreadable_descriptor_is_io_error() {
        let fixture = StackFixture::new("version: \"3.8\"\n");
        std::fs::remove_file(&fixture.path).unwrap();
        let applier = Arc::new(MockApplier::default());
        let orchestrator = fixture.orchestrator(applier.clone());

        let err = orchestrator.insert(insert_request("api", "app:1.0", None)).await.unwrap_err();
        assert!(matches!(err, DcmError::Io { .. }));
        assert!(applier.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_get_services() {
        let fixture = StackFixture::new(
            "services:\n  web:\n    image: nginx\n  db:\n    image: postgres\n",
        );
        let orchestrator = fixture.orchestrator(Arc::new(MockApplier::default()));

        assert_eq!(orchestrator.list_services().await.unwrap(), vec!["db", "web"]);
        let db = orchestrator.get_service("db").await.unwrap();
        assert_eq!(db.image.as_deref(), Some("postgres"));
        assert!(orchestrator.get_service("cache").await.unwrap_err().is_not_found());
    }
}
