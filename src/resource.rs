//! Resource handles and the loader that turns them into byte streams

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

/// The one document type this viewer handles
pub const PDF_MIME: &str = "application/pdf";

/// Sequentially read, single-shot stream of a document's raw bytes
pub type DocumentStream = Box<dyn Read + Send>;

/// Opaque reference to a document, resolved to bytes only by a [`ResourceLoader`]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, used as a document title
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceHandle {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

/// Errors from opening a resource
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("resource not found: {handle}")]
    NotFound { handle: ResourceHandle },

    #[error("failed to open {handle}: {source}")]
    Io {
        handle: ResourceHandle,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn io(handle: &ResourceHandle, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                handle: handle.clone(),
            }
        } else {
            Self::Io {
                handle: handle.clone(),
                source,
            }
        }
    }
}

/// Turns a resource handle into a readable byte stream on demand.
///
/// `open` may block; callers run it off the dispatch thread. Every stream
/// obtained from `open` is handed back through `release` once it is
/// superseded or the shell shuts down.
pub trait ResourceLoader: Send + Sync {
    fn open(&self, handle: &ResourceHandle) -> Result<DocumentStream, LoadError>;

    fn release(&self, handle: &ResourceHandle, stream: DocumentStream) {
        debug!("Releasing stream for {handle}");
        drop(stream);
    }
}

/// Loader for local files. Handles are plain paths or `file://` URIs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileLoader;

impl FileLoader {
    fn resolve(handle: &ResourceHandle) -> PathBuf {
        let raw = handle.as_str();
        PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw))
    }
}

impl ResourceLoader for FileLoader {
    fn open(&self, handle: &ResourceHandle) -> Result<DocumentStream, LoadError> {
        let path = Self::resolve(handle);
        let file = File::open(&path).map_err(|e| LoadError::io(handle, e))?;
        debug!("Opened {path:?}");
        Ok(Box::new(BufReader::new(file)))
    }
}
