//! Docker Compose file codec.
//!
//! Reads and writes docker-compose.yml files. Decoding tolerates unknown
//! fields and missing blocks; encoding always emits every declared volume as
//! a mapping.

use super::types::ComposeFile;
use crate::error::{DcmError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Codec for docker-compose.yml files.
pub struct ComposeCodec;

impl ComposeCodec {
    /// Decode a docker-compose.yml document.
    ///
    /// # Errors
    ///
    /// Returns [`DcmError::Format`] if the YAML is malformed or does not fit
    /// the compose model.
    #[instrument(skip(content))]
    pub fn decode(content: &str) -> Result<ComposeFile> {
        let compose: ComposeFile = serde_yaml::from_str(content)
            .map_err(|e| DcmError::Format { reason: e.to_string() })?;

        debug!(
            services = compose.services.len(),
            networks = compose.networks.len(),
            volumes = compose.volumes.len(),
            "Decoded compose document"
        );
        Ok(compose)
    }

    /// Encode a compose document to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`DcmError::Format`] if serialization fails.
    pub fn encode(compose: &ComposeFile) -> Result<String> {
        serde_yaml::to_string(compose).map_err(|e| DcmError::Format { reason: e.to_string() })
    }

    /// Read and decode a compose file.
    ///
    /// # Errors
    ///
    /// Returns [`DcmError::Io`] if the file cannot be read, or
    /// [`DcmError::Format`] if its content is invalid (see `decode`).
    #[instrument]
    pub fn load<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<ComposeFile> {
        let path = path.as_ref();
        debug!("Reading compose file from {:?}", path);

        let content = std::fs::read_to_string(path)
            .map_err(|e| DcmError::Io { path: path.to_path_buf(), source: e })?;

        Self::decode(&content)
    }

    /// Encode and write a compose file.
    ///
    /// The document is written to a sibling temporary file first and renamed
    /// into place, so readers never observe a half-written descriptor. A
    /// symlinked path updates the link target, and an existing file keeps
    /// its permissions.
    ///
    /// # Errors
    ///
    /// Returns [`DcmError::Format`] on encoding failure, or [`DcmError::Io`]
    /// if the destination cannot be written.
    #[instrument(skip(compose))]
    pub fn save<P: AsRef<Path> + std::fmt::Debug>(compose: &ComposeFile, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = Self::encode(compose)?;

        let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let permissions = std::fs::metadata(&target).ok().map(|m| m.permissions());
        let tmp = staging_path(&target);

        let written = write_staged(&tmp, content.as_bytes(), permissions)
            .map_err(|e| DcmError::Io { path: tmp.clone(), source: e })
            .and_then(|()| {
                std::fs::rename(&tmp, &target)
                    .map_err(|e| DcmError::Io { path: target.clone(), source: e })
            });
        if written.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        written?;

        info!(services = compose.services.len(), "Saved compose file to {:?}", target);
        Ok(())
    }
}

/// Write `content` to `tmp`, applying `permissions` before any byte lands.
fn write_staged(
    tmp: &Path,
    content: &[u8],
    permissions: Option<std::fs::Permissions>,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(tmp)?;
    if let Some(permissions) = permissions {
        file.set_permissions(permissions)?;
    }
    file.write_all(content)?;
    file.sync_all()
}

/// `docker-compose.yml` -> `.docker-compose.yml.tmp` in the same directory.
fn staging_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
