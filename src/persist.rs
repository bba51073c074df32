use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::resource::ResourceHandle;
use crate::zoom::ZoomLevel;

/// State that survives shell suspension. The page count is deliberately
/// absent: it is always rediscovered from the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub resource_handle: Option<ResourceHandle>,
    pub current_page: u32,
    pub zoom_level: ZoomLevel,
}

/// JSON file holding the last [`PersistedState`]
#[derive(Debug)]
pub struct StateStore {
    file_path: Option<PathBuf>,
}

impl StateStore {
    pub fn ephemeral() -> Self {
        Self { file_path: None }
    }

    pub fn with_file(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(file_path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Read the stored record; `None` when nothing has been saved yet
    pub fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        let Some(path) = &self.file_path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let state: PersistedState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Like [`load`](Self::load), logging and discarding unreadable records
    pub fn load_or_none(&self) -> Option<PersistedState> {
        self.load().unwrap_or_else(|e| {
            log::error!("Failed to load viewer state from {:?}: {}", self.file_path, e);
            None
        })
    }

    pub fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        match &self.file_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                let content = serde_json::to_string_pretty(state)?;
                fs::write(path, content)?;
                log::debug!("Saved viewer state to {path:?}");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
