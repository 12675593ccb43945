//! Durable per-network deployment registry
//!
//! The registry is a single JSON document read and written as a whole. All
//! mutation goes through [`RegistryStore::transaction`], which holds an
//! exclusive advisory lock on a sidecar `<registry>.lock` file for the whole
//! load, mutate and save cycle, so two cooperating runner processes cannot
//! lose each other's updates. Saves go through a temporary file in the same
//! directory that is renamed over the target.

use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    error::{RegistryError, Result},
    object::{Network, NetworkRegistry},
};

pub const DEFAULT_REGISTRY_PATH: &str = "deployment.json";

pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, bootstrapping an empty one on disk if it does not exist yet
    pub fn load(&self) -> Result<NetworkRegistry> {
        if !self.path.exists() {
            let registry = NetworkRegistry::empty();
            self.save(&registry)?;
            info!("Created empty deployment registry at {}", self.path.display());
            return Ok(registry);
        }
        let content = fs::read(&self.path).map_err(|e| RegistryError::io(&self.path, e))?;
        let mut registry: NetworkRegistry =
            serde_json::from_slice(&content).map_err(|source| RegistryError::MalformedDocument {
                path: self.path.clone(),
                source,
            })?;
        for network in Network::ALL {
            registry.deployments_mut(network);
        }
        debug!("Loaded deployment registry from {}", self.path.display());
        Ok(registry)
    }

    /// Overwrite the whole document
    pub fn save(&self, registry: &NetworkRegistry) -> Result<()> {
        let mut content = serde_json::to_string_pretty(registry).map_err(|source| {
            RegistryError::MalformedDocument {
                path: self.path.clone(),
                source,
            }
        })?;
        content.push('\n');
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| RegistryError::io(&dir, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| RegistryError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| RegistryError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Read-modify-write the registry under the store lock
    ///
    /// The document is only written back when `mutate` succeeds.
    pub fn transaction<T, E, F>(&self, mutate: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut NetworkRegistry) -> std::result::Result<T, E>,
        E: From<RegistryError>,
    {
        let _lock = self.lock()?;
        let mut registry = self.load()?;
        let value = mutate(&mut registry)?;
        self.save(&registry)?;
        Ok(value)
    }

    /// Inspect the registry under the store lock without writing it back
    pub fn read<T, E, F>(&self, inspect: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&NetworkRegistry) -> std::result::Result<T, E>,
        E: From<RegistryError>,
    {
        let _lock = self.lock()?;
        let registry = self.load()?;
        inspect(&registry)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<StoreLock> {
        let path = self.lock_path();
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| RegistryError::io(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| RegistryError::io(&path, e))?;
        debug!("Acquired registry lock at {}", path.display());
        Ok(StoreLock { file })
    }
}

/// Held for the duration of one registry transaction
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
