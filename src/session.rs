//! Viewer session state and its transitions
//!
//! [`ViewerSession`] is the single source of truth for what the shell is
//! showing. It is mutated only through [`ViewerSession::apply`], which
//! validates the command, updates the state and returns the effects the
//! controller must carry out. Every transition that changes state bumps
//! `version`, so published snapshots can be ordered.

use crate::persist::PersistedState;
use crate::resource::ResourceHandle;
use crate::zoom::ZoomLevel;

/// Where the session is in the document lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Empty,
    Loading,
    Ready,
}

/// Page count as reported by the renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageCount {
    Unknown,
    Known(u32),
}

/// Externally visible load state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// No document
    Empty,
    /// Stream requested, renderer not yet handed the document
    Loading,
    /// Renderer has the document
    Ready(PageCount),
}

/// Which zoom controls should be presented as enabled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Affordance {
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
}

/// Authoritative viewer state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerSession {
    resource: Option<ResourceHandle>,
    current_page: u32,
    total_pages: u32,
    zoom: ZoomLevel,
    phase: Phase,
    version: u64,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(ZoomLevel::default())
    }
}

impl ViewerSession {
    /// Create an empty session at the given zoom level
    #[must_use]
    pub fn new(zoom: ZoomLevel) -> Self {
        Self {
            resource: None,
            current_page: 1,
            total_pages: 0,
            zoom,
            phase: Phase::Empty,
            version: 0,
        }
    }

    #[must_use]
    pub fn resource(&self) -> Option<&ResourceHandle> {
        self.resource.as_ref()
    }

    /// Current page (1-indexed)
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Total page count, 0 while unknown
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    #[must_use]
    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    /// Transition counter, increases on every state change
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        match self.phase {
            Phase::Empty => LoadState::Empty,
            Phase::Loading => LoadState::Loading,
            Phase::Ready if self.total_pages == 0 => LoadState::Ready(PageCount::Unknown),
            Phase::Ready => LoadState::Ready(PageCount::Known(self.total_pages)),
        }
    }

    #[must_use]
    pub fn affordance(&self) -> Affordance {
        Affordance {
            can_zoom_in: !self.zoom.is_max(),
            can_zoom_out: !self.zoom.is_min(),
        }
    }

    /// The three fields that survive suspension
    #[must_use]
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            resource_handle: self.resource.clone(),
            current_page: self.current_page,
            zoom_level: self.zoom,
        }
    }

    /// The document-related fields an open replaces
    #[must_use]
    pub fn document(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            resource: self.resource.clone(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            phase: self.phase,
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        let (changed, effects) = self.transition(cmd);
        if changed {
            self.version += 1;
        }
        effects
    }

    fn transition(&mut self, cmd: Command) -> (bool, Vec<Effect>) {
        match cmd {
            Command::Open(handle) => {
                self.resource = Some(handle.clone());
                self.current_page = 1;
                self.total_pages = 0;
                self.phase = Phase::Loading;
                (true, vec![Effect::ReleaseStream, Effect::OpenStream(handle)])
            }

            Command::Restore(record) => {
                self.current_page = record.current_page.max(1);
                self.zoom = record.zoom_level;
                self.total_pages = 0;
                self.resource = record.resource_handle;
                match self.resource.clone() {
                    Some(handle) => {
                        self.phase = Phase::Loading;
                        (true, vec![Effect::ReleaseStream, Effect::OpenStream(handle)])
                    }
                    None => {
                        self.phase = Phase::Empty;
                        (true, vec![Effect::ReleaseStream])
                    }
                }
            }

            Command::OpenFailed(prior) => {
                self.resource = prior.resource;
                self.current_page = prior.current_page;
                self.total_pages = prior.total_pages;
                self.phase = prior.phase;
                if self.phase == Phase::Ready {
                    (true, vec![Effect::RenderCurrentPage])
                } else {
                    (true, vec![])
                }
            }

            Command::StreamReady => {
                if self.phase == Phase::Loading {
                    self.phase = Phase::Ready;
                    (true, vec![Effect::LoadDocument])
                } else {
                    (false, vec![])
                }
            }

            Command::NextPage => {
                if self.current_page < self.total_pages {
                    self.current_page += 1;
                    (true, vec![Effect::RenderCurrentPage])
                } else {
                    (false, vec![])
                }
            }

            Command::PreviousPage => {
                if self.current_page > 1 {
                    self.current_page -= 1;
                    (true, vec![Effect::RenderCurrentPage])
                } else {
                    (false, vec![])
                }
            }

            Command::JumpToPage(page) => {
                if page >= 1 && page <= i64::from(self.total_pages) {
                    self.current_page = page as u32;
                    (true, vec![Effect::RenderCurrentPage])
                } else {
                    (false, vec![])
                }
            }

            Command::ZoomIn => match self.zoom.step_in() {
                Some(zoom) => {
                    self.zoom = zoom;
                    (true, vec![Effect::RenderCurrentPage])
                }
                None => (false, vec![]),
            },

            Command::ZoomOut => match self.zoom.step_out() {
                Some(zoom) => {
                    self.zoom = zoom;
                    (true, vec![Effect::RenderCurrentPage])
                }
                None => (false, vec![]),
            },

            Command::SetPageCount(count) => {
                if self.phase != Phase::Ready {
                    return (false, vec![]);
                }
                self.total_pages = count;
                if count > 0 && self.current_page > count {
                    self.current_page = count;
                    (true, vec![Effect::RenderCurrentPage])
                } else {
                    (true, vec![])
                }
            }
        }
    }
}

/// Document fields saved before an open, restored if it fails
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSnapshot {
    resource: Option<ResourceHandle>,
    current_page: u32,
    total_pages: u32,
    phase: Phase,
}

/// Commands that modify the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Switch to a new document, page 1, page count unknown
    Open(ResourceHandle),
    /// Reinstate a persisted record verbatim
    Restore(PersistedState),
    /// The byte stream for the pending document is available
    StreamReady,
    /// The pending open failed; go back to the document shown before it.
    /// Zoom is left alone.
    OpenFailed(DocumentSnapshot),
    NextPage,
    PreviousPage,
    /// Jump to a page; anything outside `[1, total_pages]` is ignored
    JumpToPage(i64),
    ZoomIn,
    ZoomOut,
    /// Page count reported by the renderer
    SetPageCount(u32),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Release the byte stream currently held, if any
    ReleaseStream,
    /// Ask the loader for a stream for this handle
    OpenStream(ResourceHandle),
    /// Tell the renderer to start a new rendering session
    LoadDocument,
    /// Tell the renderer to repaint from current state
    RenderCurrentPage,
}
