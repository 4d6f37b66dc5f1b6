//! In-place mutations of a decoded compose document.
//!
//! Adds are upserts: the last write for a name wins. Updates and deletes are
//! strict and fail with [`DcmError::NotFound`] when the name is absent,
//! leaving the document untouched. None of these perform I/O.

use super::types::{ComposeFile, Network, Service, Volume};
use crate::error::{DcmError, EntityKind, Result};
use tracing::debug;

impl ComposeFile {
    /// Insert or overwrite the service at `name`.
    pub fn add_service(&mut self, name: &str, service: Service) {
        debug!(service = name, "Upserting service");
        self.services.insert(name.to_string(), service);
    }

    /// Overwrite an existing service.
    pub fn update_service(&mut self, name: &str, service: Service) -> Result<()> {
        let slot = self
            .services
            .get_mut(name)
            .ok_or_else(|| DcmError::not_found(EntityKind::Service, name))?;
        *slot = service;
        debug!(service = name, "Updated service");
        Ok(())
    }

    /// Remove a service, returning its definition.
    pub fn delete_service(&mut self, name: &str) -> Result<Service> {
        let removed = self
            .services
            .remove(name)
            .ok_or_else(|| DcmError::not_found(EntityKind::Service, name))?;
        debug!(service = name, "Deleted service");
        Ok(removed)
    }

    pub fn get_service(&self, name: &str) -> Result<&Service> {
        self.services.get(name).ok_or_else(|| DcmError::not_found(EntityKind::Service, name))
    }

    /// Names of all services. Callers must not rely on the order.
    pub fn list_services(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Remove a service together with the top-level volumes its mounts name.
    ///
    /// Every mount source token (the part before the first `:`) is passed to
    /// [`ComposeFile::delete_volume`]; tokens that are not declared volumes,
    /// such as bind-mount paths, are skipped. Volumes are removed even when
    /// another service still mounts them.
    ///
    /// Returns the names of the volumes that were removed. Fails with
    /// [`DcmError::NotFound`] without touching the document if the service
    /// is absent.
    pub fn remove_service_cascading(&mut self, name: &str) -> Result<Vec<String>> {
        let sources: Vec<String> =
            self.get_service(name)?.volume_sources().map(str::to_string).collect();

        let mut removed = Vec::new();
        for source in sources {
            match self.delete_volume(&source) {
                Ok(()) => removed.push(source),
                Err(e) => debug!(service = name, volume = %source, "Skipping mount: {}", e),
            }
        }

        self.delete_service(name)?;
        Ok(removed)
    }

    /// Insert or overwrite the network at `name`.
    pub fn add_network(&mut self, name: &str, network: Network) {
        debug!(network = name, "Upserting network");
        self.networks.insert(name.to_string(), network);
    }

    pub fn delete_network(&mut self, name: &str) -> Result<()> {
        self.networks
            .remove(name)
            .map(|_| debug!(network = name, "Deleted network"))
            .ok_or_else(|| DcmError::not_found(EntityKind::Network, name))
    }

    /// Insert or overwrite the volume at `name`.
    pub fn add_volume(&mut self, name: &str, volume: Volume) {
        debug!(volume = name, "Upserting volume");
        self.volumes.insert(name.to_string(), volume);
    }

    pub fn delete_volume(&mut self, name: &str) -> Result<()> {
        self.volumes
            .remove(name)
            .map(|_| debug!(volume = name, "Deleted volume"))
            .ok_or_else(|| DcmError::not_found(EntityKind::Volume, name))
    }
}
