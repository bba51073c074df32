//! Render bridge - the boundary between the controller and the renderer
//!
//! The renderer is an opaque component with its own loop. The controller
//! talks to it with two parameterless commands ([`RenderSurface::load`],
//! [`RenderSurface::request_render`]). The renderer talks back through a
//! [`Channel`]: synchronous reads of the published session, a single-shot
//! fetch of the document bytes, and an asynchronous page count report that
//! lands on the controller's event queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, trace};

use crate::resource::{DocumentStream, LoadError, PDF_MIME, ResourceHandle};
use crate::session::ViewerSession;

/// Fixed request identity the renderer fetches the document bytes from
pub const PLACEHOLDER_URL: &str = "https://localhost/placeholder.pdf";

/// Identifies one stream-open attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpenTicket(pub u64);

/// Identifies one stream handed to the renderer. Bumped on every install.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LoadGeneration(pub u64);

/// Inbound notifications, consumed in order by the controller
pub enum Event {
    /// A stream-open attempt finished
    StreamOpened {
        ticket: OpenTicket,
        handle: ResourceHandle,
        result: Result<DocumentStream, LoadError>,
    },
    /// The renderer finished parsing the stream of `generation`
    PageCountDiscovered {
        generation: LoadGeneration,
        count: u32,
    },
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::StreamOpened {
                ticket,
                handle,
                result,
            } => f
                .debug_struct("StreamOpened")
                .field("ticket", ticket)
                .field("handle", handle)
                .field("ok", &result.is_ok())
                .finish(),
            Event::PageCountDiscovered { generation, count } => f
                .debug_struct("PageCountDiscovered")
                .field("generation", generation)
                .field("count", count)
                .finish(),
        }
    }
}

/// Outbound side, implemented by whatever rendering engine is plugged in.
///
/// Both calls are fire-and-forget. After `request_render` the renderer must
/// pull page and zoom through its [`Channel`] right before drawing, never
/// from values it remembered earlier.
pub trait RenderSurface {
    /// Start a new rendering session; the renderer fetches
    /// [`PLACEHOLDER_URL`] through its channel.
    fn load(&mut self);

    /// Repaint using whatever state the channel reports now
    fn request_render(&mut self);
}

/// Bytes handed to the renderer for [`PLACEHOLDER_URL`]
pub struct FetchedDocument {
    pub mime_type: &'static str,
    pub stream: DocumentStream,
}

type SharedSession = Arc<RwLock<ViewerSession>>;
/// Stream waiting for the renderer, and the generation it was installed as
#[derive(Default)]
struct StreamSlot {
    stream: Option<DocumentStream>,
    generation: LoadGeneration,
}

type SharedSlot = Arc<Mutex<StreamSlot>>;

/// Renderer-facing handle onto the bridge
#[derive(Clone)]
pub struct Channel {
    session: SharedSession,
    stream: SharedSlot,
    /// Generation of the stream this renderer fetched last
    fetched: Arc<AtomicU64>,
    events: Sender<Event>,
}

impl Channel {
    /// Current page as of this instant
    #[must_use]
    pub fn get_current_page(&self) -> u32 {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current_page()
    }

    /// Current zoom step as of this instant
    #[must_use]
    pub fn get_zoom_level(&self) -> u8 {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .zoom()
            .get()
    }

    /// Report the page count of the document being rendered. The report is
    /// tied to the stream fetched last, so a late count for a replaced
    /// document can be told apart.
    pub fn report_page_count(&self, count: u32) {
        let generation = LoadGeneration(self.fetched.load(Ordering::SeqCst));
        if self
            .events
            .send(Event::PageCountDiscovered { generation, count })
            .is_err()
        {
            debug!("Controller gone, dropping page count {count}");
        }
    }

    /// Resolve a resource request. Only `GET` on [`PLACEHOLDER_URL`] is
    /// served, and only once per loaded document.
    pub fn fetch(&self, method: &str, url: &str) -> Option<FetchedDocument> {
        if method != "GET" || url != PLACEHOLDER_URL {
            trace!("Refusing {method} {url}");
            return None;
        }
        let mut slot = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        let stream = slot.stream.take()?;
        self.fetched.store(slot.generation.0, Ordering::SeqCst);
        Some(FetchedDocument {
            mime_type: PDF_MIME,
            stream,
        })
    }
}

/// Controller-facing side of the bridge
pub struct RenderBridge {
    session: SharedSession,
    stream: SharedSlot,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    surface: Box<dyn RenderSurface>,
}

impl RenderBridge {
    /// Build the bridge and attach a renderer to its channel
    pub fn new<F>(attach: F) -> Self
    where
        F: FnOnce(Channel) -> Box<dyn RenderSurface>,
    {
        let session = Arc::new(RwLock::new(ViewerSession::default()));
        let stream: SharedSlot = Arc::new(Mutex::new(StreamSlot::default()));
        let (events_tx, events_rx) = flume::unbounded();

        let surface = attach(Channel {
            session: session.clone(),
            stream: stream.clone(),
            fetched: Arc::new(AtomicU64::new(0)),
            events: events_tx.clone(),
        });

        Self {
            session,
            stream,
            events_tx,
            events_rx,
            surface,
        }
    }

    /// Make `session` what the renderer reads from now on
    pub fn publish(&self, session: &ViewerSession) {
        let mut published = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.version() >= published.version() {
            *published = session.clone();
        }
    }

    pub fn load(&mut self) {
        self.surface.load();
    }

    pub fn request_render(&mut self) {
        self.surface.request_render();
    }

    /// Make `stream` the one the renderer will fetch under a new
    /// generation; returns any stream that was still waiting there
    pub fn install_stream(&self, stream: DocumentStream) -> Option<DocumentStream> {
        let mut slot = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation.0 += 1;
        slot.stream.replace(stream)
    }

    /// Take back the stream if the renderer has not fetched it
    pub fn take_stream(&self) -> Option<DocumentStream> {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stream
            .take()
    }

    /// Generation of the stream installed last
    #[must_use]
    pub fn live_generation(&self) -> LoadGeneration {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Sender for background work that reports back to the controller
    #[must_use]
    pub fn sender(&self) -> Sender<Event> {
        self.events_tx.clone()
    }

    pub fn try_next_event(&self) -> Option<Event> {
        self.events_rx.try_recv().ok()
    }

    pub fn next_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.events_rx.recv_timeout(timeout).ok()
    }
}
