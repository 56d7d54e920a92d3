//! Pluggable storage backends and the registry that dispatches to them.
//!
//! A [`Backend`] knows one concrete format: how to parse it from a string or
//! a stored file, how to list loadable entries in a location, and how to
//! serialize a tree back. [`BackendRegistry`] picks a backend per call
//! (by file extension for storage paths, by content sniffing for strings)
//! and resolves relative storage paths against its configured base path.
//!
//! Like the tree accessors, the registry has a collapsed surface
//! (`load_storage`, `load_string`, `serialize` return `Option`,
//! `list_entries` returns an empty vector) and a `try_*` surface that keeps
//! the [`DataError`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::node::{DataNode, Level};
use crate::storage;

pub mod json;
pub mod yaml;

pub use json::JsonBackend;
pub use yaml::YamlBackend;

/// Environment variable read by [`StorageConfig::from_env`].
pub const BASE_PATH_ENV: &str = "DATAIO_BASE_PATH";

pub trait Backend {
    /// Short identifier, also accepted by [`BackendRegistry::serialize_as`].
    fn name(&self) -> &'static str;

    /// File extensions this backend loads, preferred one first.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether `text` looks like this backend's format.
    fn sniff(&self, text: &str) -> bool;

    fn parse_string(&self, text: &str) -> Result<DataNode>;

    fn serialize(&self, data: &DataNode) -> Result<String>;

    fn parse_storage(&self, path: &Path) -> Result<DataNode> {
        let text = storage::read_text(path)?;
        self.parse_string(&text)
    }

    /// Names of the entries in `dir` this backend can load.
    fn list_entries(&self, dir: &Path) -> Result<Vec<String>> {
        storage::list_entry_names(dir, self.extensions())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Relative storage paths are resolved against this directory.
    pub base_path: PathBuf,
    /// Backend used to serialize when no format is implied by a path.
    pub default_backend: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            default_backend: "json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Defaults, with `base_path` taken from `DATAIO_BASE_PATH` when set.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(BASE_PATH_ENV))
    }

    /// Defaults, with `base_path` overridden by a non-empty `base`.
    pub fn from_env_value(base: Option<OsString>) -> Self {
        let mut cfg = Self::default();
        if let Some(base) = base.filter(|v| !v.is_empty()) {
            cfg.base_path = PathBuf::from(base);
        }
        cfg
    }
}

pub struct BackendRegistry {
    config: StorageConfig,
    backends: Vec<Box<dyn Backend>>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_default_backends(StorageConfig::default())
    }
}

impl BackendRegistry {
    /// Registry with no backends.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            backends: Vec::new(),
        }
    }

    /// Registry with the JSON and YAML backends, tried in that order.
    pub fn with_default_backends(config: StorageConfig) -> Self {
        let mut reg = Self::new(config);
        reg.register(Box::new(JsonBackend));
        reg.register(Box::new(YamlBackend));
        reg
    }

    /// Adds a backend after the existing ones. A backend with the same name replaces it.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        match self
            .backends
            .iter()
            .position(|b| b.name() == backend.name())
        {
            Some(idx) => self.backends[idx] = backend,
            None => self.backends.push(backend),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn base_storage_path(&self) -> &Path {
        &self.config.base_path
    }

    pub fn set_base_storage_path(&mut self, base: impl Into<PathBuf>) {
        self.config.base_path = base.into();
        debug!(base = %self.config.base_path.display(), "base storage path set");
    }

    pub fn backend(&self, name: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .map(|b| b.as_ref())
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn resolve_storage_path(&self, storage_path: impl AsRef<Path>) -> PathBuf {
        let p = storage_path.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config.base_path.join(p)
        }
    }

    /// Empty Level root.
    pub fn create_empty(&self) -> DataNode {
        DataNode::level()
    }

    pub fn load_storage(&self, storage_path: impl AsRef<Path>) -> Option<DataNode> {
        let storage_path = storage_path.as_ref();
        collapse(self.try_load_storage(storage_path), "load_storage", storage_path)
    }

    /// Loads a file (by exact name, or by entry name with a backend extension
    /// appended) or a whole directory as a Level of entry name to tree.
    pub fn try_load_storage(&self, storage_path: impl AsRef<Path>) -> Result<DataNode> {
        let path = self.resolve_storage_path(storage_path);
        if path.is_dir() {
            return self.load_directory(&path);
        }
        let (file, backend) = self.locate(&path)?;
        debug!(path = %file.display(), backend = backend.name(), "loading storage");
        backend.parse_storage(&file)
    }

    fn locate(&self, path: &Path) -> Result<(PathBuf, &dyn Backend)> {
        if path.is_file()
            && let Some(b) = self
                .backends
                .iter()
                .find(|b| storage::matches_extension(path, b.extensions()))
        {
            return Ok((path.to_path_buf(), b.as_ref()));
        }
        for b in &self.backends {
            if let Some(file) = storage::find_with_extensions(path, b.extensions()) {
                return Ok((file, b.as_ref()));
            }
        }
        if path.is_file() {
            Err(DataError::BackendUnavailable(path.display().to_string()))
        } else {
            Err(DataError::PathNotFound(path.display().to_string()))
        }
    }

    fn load_directory(&self, dir: &Path) -> Result<DataNode> {
        let mut level = Level::new();
        for name in self.entries_in(dir)? {
            match self.locate(&dir.join(&name)) {
                Ok((file, backend)) => match backend.parse_storage(&file) {
                    Ok(tree) => {
                        level.insert(name, tree);
                    }
                    Err(e) => warn!(entry = %name, error = %e, "skipping unreadable entry"),
                },
                Err(e) => warn!(entry = %name, error = %e, "skipping entry"),
            }
        }
        Ok(DataNode::Level(level))
    }

    pub fn load_string(&self, text: &str) -> Option<DataNode> {
        match self.try_load_string(text) {
            Ok(tree) => Some(tree),
            Err(e) => {
                debug!(error = %e, "load_string failed");
                None
            }
        }
    }

    /// Parses `text` with the first registered backend that recognizes it.
    pub fn try_load_string(&self, text: &str) -> Result<DataNode> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.sniff(text))
            .ok_or_else(|| DataError::BackendUnavailable("string data".to_string()))?;
        backend.parse_string(text)
    }

    /// Entry names loadable from `storage_path`; empty on any failure.
    pub fn list_entries(&self, storage_path: impl AsRef<Path>) -> Vec<String> {
        let storage_path = storage_path.as_ref();
        collapse(self.try_list_entries(storage_path), "list_entries", storage_path)
            .unwrap_or_default()
    }

    pub fn try_list_entries(&self, storage_path: impl AsRef<Path>) -> Result<Vec<String>> {
        self.entries_in(&self.resolve_storage_path(storage_path))
    }

    fn entries_in(&self, dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for b in &self.backends {
            names.extend(b.list_entries(dir)?);
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Serializes with the configured default backend.
    pub fn serialize(&self, data: &DataNode) -> Option<String> {
        match self.try_serialize(data) {
            Ok(s) => Some(s),
            Err(e) => {
                debug!(error = %e, "serialize failed");
                None
            }
        }
    }

    pub fn try_serialize(&self, data: &DataNode) -> Result<String> {
        self.serialize_as(data, &self.config.default_backend)
    }

    pub fn serialize_as(&self, data: &DataNode, backend: &str) -> Result<String> {
        self.backend(backend)
            .ok_or_else(|| DataError::BackendUnavailable(format!("backend '{}'", backend)))?
            .serialize(data)
    }

    /// Writes `data` to `storage_path`. The extension picks the backend; an
    /// extensionless path gets the default backend's preferred extension.
    pub fn save_storage(&self, data: &DataNode, storage_path: impl AsRef<Path>) -> Result<PathBuf> {
        let mut path = self.resolve_storage_path(storage_path);
        let backend = match self
            .backends
            .iter()
            .find(|b| storage::matches_extension(&path, b.extensions()))
        {
            Some(b) => b.as_ref(),
            None => {
                if path.extension().is_some() {
                    return Err(DataError::BackendUnavailable(path.display().to_string()));
                }
                let b = self.backend(&self.config.default_backend).ok_or_else(|| {
                    DataError::BackendUnavailable(format!(
                        "backend '{}'",
                        self.config.default_backend
                    ))
                })?;
                if let Some(ext) = b.extensions().first() {
                    path.set_extension(ext);
                }
                b
            }
        };
        let text = backend.serialize(data)?;
        storage::write_text(&path, &text)?;
        debug!(path = %path.display(), backend = backend.name(), "saved storage");
        Ok(path)
    }
}

fn collapse<T>(res: Result<T>, op: &str, path: &Path) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(op, path = %path.display(), error = %e, "storage operation failed");
            None
        }
    }
}
