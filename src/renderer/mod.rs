//! Built-in renderer
//!
//! [`PageScanRenderer`] plays the part of the embedded rendering engine. It
//! runs on its own thread and only ever talks to the controller through a
//! [`Channel`]: it fetches the document bytes once per load, reports the
//! page count, and on every render request pulls page and zoom right
//! before producing a [`Frame`].

#[cfg(feature = "mupdf")]
mod mupdf_counter;
mod scan;

use std::io::Read;

use flume::{Receiver, Sender};
use log::{debug, warn};

use crate::bridge::{Channel, PLACEHOLDER_URL, RenderSurface};
use crate::zoom::ZoomLevel;

#[cfg(feature = "mupdf")]
pub use mupdf_counter::MupdfCounter;
pub use scan::ScanCounter;

/// Works out how many pages a document has
pub trait PageCounter: Send + 'static {
    fn count_pages(&self, bytes: &[u8]) -> Option<u32>;
}

/// What the renderer painted
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Page painted (1-indexed)
    pub page: u32,
    pub page_count: u32,
    pub zoom_level: ZoomLevel,
    /// Visual scale factor for `zoom_level`
    pub scale: f32,
}

/// Requests sent to the render thread
#[derive(Debug)]
enum SurfaceRequest {
    Load,
    Render,
    Shutdown,
}

/// Renderer running on a dedicated thread
pub struct PageScanRenderer {
    requests: Sender<SurfaceRequest>,
}

impl PageScanRenderer {
    /// Spawn with the default page counter for this build
    #[must_use]
    pub fn spawn(channel: Channel, frames: Sender<Frame>) -> Self {
        #[cfg(feature = "mupdf")]
        let counter = MupdfCounter;
        #[cfg(not(feature = "mupdf"))]
        let counter = ScanCounter;
        Self::with_counter(channel, frames, counter)
    }

    #[must_use]
    pub fn with_counter<C: PageCounter>(channel: Channel, frames: Sender<Frame>, counter: C) -> Self {
        let (requests, rx) = flume::unbounded();
        std::thread::spawn(move || {
            render_worker(&channel, rx, &frames, &counter);
        });
        Self { requests }
    }

    fn send(&self, request: SurfaceRequest) {
        if self.requests.send(request).is_err() {
            debug!("Render thread already stopped");
        }
    }
}

impl RenderSurface for PageScanRenderer {
    fn load(&mut self) {
        self.send(SurfaceRequest::Load);
    }

    fn request_render(&mut self) {
        self.send(SurfaceRequest::Render);
    }
}

impl Drop for PageScanRenderer {
    fn drop(&mut self) {
        self.send(SurfaceRequest::Shutdown);
    }
}

fn render_worker<C: PageCounter>(
    channel: &Channel,
    requests: Receiver<SurfaceRequest>,
    frames: &Sender<Frame>,
    counter: &C,
) {
    // Page count of the document currently loaded, if it parsed
    let mut page_count = None;

    for request in requests {
        match request {
            SurfaceRequest::Load => {
                page_count = load_document(channel, counter);
                if let Some(count) = page_count {
                    channel.report_page_count(count);
                    paint(channel, count, frames);
                }
            }

            SurfaceRequest::Render => {
                if let Some(count) = page_count {
                    paint(channel, count, frames);
                }
            }

            SurfaceRequest::Shutdown => break,
        }
    }
}

fn load_document<C: PageCounter>(channel: &Channel, counter: &C) -> Option<u32> {
    let Some(mut document) = channel.fetch("GET", PLACEHOLDER_URL) else {
        warn!("No document stream available for {PLACEHOLDER_URL}");
        return None;
    };

    let mut bytes = Vec::new();
    if let Err(e) = document.stream.read_to_end(&mut bytes) {
        warn!("Failed to read document stream: {e}");
        return None;
    }

    let count = counter.count_pages(&bytes);
    match count {
        Some(n) => debug!("Parsed {} bytes, {n} pages", bytes.len()),
        None => warn!("Could not determine page count, document stays inert"),
    }
    count
}

fn paint(channel: &Channel, page_count: u32, frames: &Sender<Frame>) {
    // Pull state at paint time, never from earlier requests
    let page = channel.get_current_page();
    let zoom_level = ZoomLevel::from(channel.get_zoom_level());

    if page == 0 || page > page_count {
        debug!("Skipping paint of page {page} of {page_count}");
        return;
    }

    let _ = frames.send(Frame {
        page,
        page_count,
        zoom_level,
        scale: zoom_level.scale(),
    });
}
