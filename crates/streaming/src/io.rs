//! Where raw resource payloads come from.

use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLoadError {
    NotFound(String),
    /// A local read failed for a reason other than absence.
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },
    Http { path: String, status: Option<u16>, message: String },
}

impl std::fmt::Display for ResourceLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLoadError::NotFound(path) => write!(f, "resource not found: {path}"),
            ResourceLoadError::Io { path, message, .. } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            ResourceLoadError::Http {
                path,
                status: Some(status),
                message,
            } => write!(f, "http {status} fetching {path}: {message}"),
            ResourceLoadError::Http { path, message, .. } => {
                write!(f, "http error fetching {path}: {message}")
            }
        }
    }
}

impl std::error::Error for ResourceLoadError {}

/// Fetches a resource by its catalog path and yields the raw text.
pub trait ResourceSource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, ResourceLoadError>>;
}

/// Resources stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl ResourceSource for DirectorySource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, ResourceLoadError>> {
        let full = self.resolve(path);
        let path = path.to_string();
        async move {
            debug!(path = %full.display(), "reading resource");
            fs::read_to_string(&full).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ResourceLoadError::NotFound(path),
                kind => ResourceLoadError::Io {
                    path: full.clone(),
                    kind,
                    message: e.to_string(),
                },
            })
        }
    }
}

/// In-memory resources keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    resources: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, payload: impl Into<String>) {
        self.resources.insert(path.into(), payload.into());
    }

    pub fn with(mut self, path: impl Into<String>, payload: impl Into<String>) -> Self {
        self.insert(path, payload);
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.resources.remove(path)
    }
}

impl ResourceSource for MemorySource {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, ResourceLoadError>> {
        let found = self
            .resources
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| ResourceLoadError::NotFound(path.to_string()));
        async move { found }
    }
}
