//! Viewer controller - owns the session and turns intents into transitions
//!
//! All mutations run on the thread that owns the controller: user intents
//! come in through [`ViewerController::dispatch`], and background results
//! (stream opens, page count reports) are queued on the bridge and drained
//! with [`ViewerController::pump`]. Stream opening runs on a short-lived
//! thread so a slow loader never stalls dispatch.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::bridge::{Event, OpenTicket, RenderBridge};
use crate::persist::PersistedState;
use crate::resource::{DocumentStream, LoadError, PDF_MIME, ResourceHandle, ResourceLoader};
use crate::session::{Affordance, Command, DocumentSnapshot, Effect, LoadState, ViewerSession};
use crate::zoom::ZoomLevel;

/// A discrete user intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Open(ResourceHandle),
    NextPage,
    PreviousPage,
    JumpToPage(i64),
    ZoomIn,
    ZoomOut,
}

/// External request to display a document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenIntent {
    pub handle: ResourceHandle,
    pub content_type: String,
}

impl OpenIntent {
    pub fn new(handle: impl Into<ResourceHandle>, content_type: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            content_type: content_type.into(),
        }
    }
}

/// Errors surfaced past the controller boundary
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("unsupported content type {content_type:?}, expected {PDF_MIME}")]
    UnsupportedContentType { content_type: String },
}

/// How the shell was started
#[derive(Clone, Debug, Default)]
pub struct Launch {
    /// Document handed over by whoever started the shell
    pub intent: Option<OpenIntent>,
    /// Record saved by an earlier instance; wins over `intent`
    pub restore: Option<PersistedState>,
}

/// Open attempt waiting for its stream
struct PendingOpen {
    ticket: OpenTicket,
    /// Document shown before the first of any chain of superseding opens
    prior: DocumentSnapshot,
}

pub struct ViewerController {
    session: ViewerSession,
    bridge: RenderBridge,
    loader: Arc<dyn ResourceLoader>,
    /// Handle of the stream sitting in the bridge, if any
    live_handle: Option<ResourceHandle>,
    pending: Option<PendingOpen>,
    next_ticket: u64,
}

impl ViewerController {
    /// Create a controller with an empty session
    pub fn new(bridge: RenderBridge, loader: Arc<dyn ResourceLoader>, zoom: ZoomLevel) -> Self {
        let session = ViewerSession::new(zoom);
        bridge.publish(&session);
        Self {
            session,
            bridge,
            loader,
            live_handle: None,
            pending: None,
            next_ticket: 1,
        }
    }

    /// Create a controller and apply the launch request. The content type
    /// of an intent is checked before anything else happens.
    pub fn launch(
        bridge: RenderBridge,
        loader: Arc<dyn ResourceLoader>,
        zoom: ZoomLevel,
        launch: Launch,
    ) -> Result<Self, ViewerError> {
        if let Some(intent) = &launch.intent {
            Self::check_content_type(intent)?;
        }

        let mut controller = Self::new(bridge, loader, zoom);
        match (launch.restore, launch.intent) {
            (Some(record), _) => controller.restore(record),
            (None, Some(intent)) => controller.open_resource(intent.handle),
            (None, None) => {}
        }
        Ok(controller)
    }

    fn check_content_type(intent: &OpenIntent) -> Result<(), ViewerError> {
        if intent.content_type == PDF_MIME {
            Ok(())
        } else {
            Err(ViewerError::UnsupportedContentType {
                content_type: intent.content_type.clone(),
            })
        }
    }

    /// Accept an open-document request, rejecting anything that is not a PDF
    pub fn accept_intent(&mut self, intent: OpenIntent) -> Result<(), ViewerError> {
        Self::check_content_type(&intent)?;
        self.open_resource(intent.handle);
        Ok(())
    }

    #[must_use]
    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.session.load_state()
    }

    #[must_use]
    pub fn current_affordance(&self) -> Affordance {
        self.session.affordance()
    }

    #[must_use]
    pub fn persisted_state(&self) -> PersistedState {
        self.session.to_persisted()
    }

    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::Open(handle) => self.open_resource(handle),
            Intent::NextPage => self.next_page(),
            Intent::PreviousPage => self.previous_page(),
            Intent::JumpToPage(page) => self.jump_to_page(page),
            Intent::ZoomIn => self.zoom_in(),
            Intent::ZoomOut => self.zoom_out(),
        }
    }

    pub fn open_resource(&mut self, handle: ResourceHandle) {
        info!("Opening {handle}");
        self.begin_load(Command::Open(handle));
    }

    /// Reinstate a persisted record; reloads its document if it names one
    pub fn restore(&mut self, record: PersistedState) {
        info!(
            "Restoring {:?} at page {}, zoom {}",
            record.resource_handle,
            record.current_page,
            record.zoom_level.get()
        );
        self.begin_load(Command::Restore(record));
    }

    fn begin_load(&mut self, cmd: Command) {
        let prior = match self.pending.take() {
            Some(superseded) => superseded.prior,
            None => self.session.document(),
        };
        let ticket = OpenTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(PendingOpen { ticket, prior });
        let _ = self.apply(cmd);
        // A restore without a document has nothing to wait for
        if self.session.load_state() != LoadState::Loading {
            self.pending = None;
        }
    }

    pub fn next_page(&mut self) {
        let _ = self.apply(Command::NextPage);
    }

    pub fn previous_page(&mut self) {
        let _ = self.apply(Command::PreviousPage);
    }

    /// Page numbers from outside are range-checked here, whatever bounds
    /// the input widget enforced.
    pub fn jump_to_page(&mut self, page: i64) {
        if !self.apply(Command::JumpToPage(page)) {
            debug!(
                "Ignoring jump to page {page} of {}",
                self.session.total_pages()
            );
        }
    }

    pub fn zoom_in(&mut self) {
        let _ = self.apply(Command::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        let _ = self.apply(Command::ZoomOut);
    }

    /// Sole writer of the page count
    pub fn on_page_count_discovered(&mut self, count: u32) {
        if !matches!(self.session.load_state(), LoadState::Ready(_)) {
            debug!("Dropping stale page count {count}");
            return;
        }
        info!("Renderer reports {count} pages");
        let _ = self.apply(Command::SetPageCount(count));
    }

    /// Handle every queued background event; returns how many were handled
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.bridge.try_next_event() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for one background event and handle it
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.bridge.next_event_timeout(timeout) {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::PageCountDiscovered { generation, count } => {
                if generation == self.bridge.live_generation() {
                    self.on_page_count_discovered(count);
                } else {
                    debug!("Dropping page count {count} of replaced document ({generation:?})");
                }
            }
            Event::StreamOpened {
                ticket,
                handle,
                result,
            } => self.on_stream_opened(ticket, handle, result),
        }
    }

    fn on_stream_opened(
        &mut self,
        ticket: OpenTicket,
        handle: ResourceHandle,
        result: Result<DocumentStream, LoadError>,
    ) {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket == ticket);

        if !current {
            debug!("Discarding superseded open of {handle} ({ticket:?})");
            if let Ok(stream) = result {
                self.loader.release(&handle, stream);
            }
            return;
        }

        let Some(pending) = self.pending.take() else {
            return;
        };

        match result {
            Ok(stream) => {
                if let Some(stale) = self.bridge.install_stream(stream) {
                    if let Some(stale_handle) = self.live_handle.take() {
                        self.loader.release(&stale_handle, stale);
                    }
                }
                self.live_handle = Some(handle);
                let _ = self.apply(Command::StreamReady);
            }
            Err(e) => {
                warn!("Could not open document: {e}");
                let _ = self.apply(Command::OpenFailed(pending.prior));
            }
        }
    }

    /// Apply a command, publish the new state, then carry out its effects.
    /// Returns false when the command was a no-op.
    fn apply(&mut self, cmd: Command) -> bool {
        let version = self.session.version();
        let effects = self.session.apply(cmd);
        if self.session.version() == version {
            return false;
        }
        self.bridge.publish(&self.session);
        self.execute_effects(effects);
        true
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ReleaseStream => self.release_stream(),
                Effect::OpenStream(handle) => self.spawn_open(handle),
                Effect::LoadDocument => self.bridge.load(),
                Effect::RenderCurrentPage => self.bridge.request_render(),
            }
        }
    }

    fn release_stream(&mut self) {
        let stream = self.bridge.take_stream();
        let handle = self.live_handle.take();
        if let (Some(stream), Some(handle)) = (stream, handle) {
            self.loader.release(&handle, stream);
        }
    }

    fn spawn_open(&mut self, handle: ResourceHandle) {
        let Some(ticket) = self.pending.as_ref().map(|pending| pending.ticket) else {
            return;
        };
        let loader = self.loader.clone();
        let events = self.bridge.sender();

        std::thread::spawn(move || {
            let result = loader.open(&handle);
            let event = Event::StreamOpened {
                ticket,
                handle,
                result,
            };
            if let Err(flume::SendError(Event::StreamOpened {
                handle,
                result: Ok(stream),
                ..
            })) = events.send(event)
            {
                loader.release(&handle, stream);
            }
        });
    }

    /// Release everything held for the current document
    pub fn shutdown(&mut self) {
        self.pending = None;
        self.release_stream();
    }
}

impl Drop for ViewerController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Channel, PLACEHOLDER_URL};
    use crate::session::PageCount;
    use crate::test_utils::test_helpers::*;

    const SLOW: Duration = Duration::from_millis(300);

    fn loader() -> Arc<MemoryLoader> {
        Arc::new(
            MemoryLoader::new()
                .with_document("a.pdf", sample_pdf(6))
                .with_document("b.pdf", sample_pdf(3))
                .with_slow_document("slow.pdf", sample_pdf(9), SLOW),
        )
    }

    /// Open `handle`, let the renderer fetch it and report `pages`
    fn open_ready(controller: &mut ViewerController, channel: &Channel, handle: &str, pages: u32) {
        controller.open_resource(ResourceHandle::new(handle));
        assert_eq!(
            wait_until_loaded(controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert!(report_loaded_pages(channel, pages));
        controller.pump();
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Known(pages))
        );
    }

    fn not_loading(controller: &ViewerController) -> bool {
        controller.load_state() != LoadState::Loading
    }

    fn handle_of(controller: &ViewerController) -> Option<&str> {
        controller.session().resource().map(ResourceHandle::as_str)
    }

    #[test]
    fn open_moves_through_loading_to_ready() {
        let (mut controller, log, channel) = recording_viewer(loader());
        assert_eq!(controller.load_state(), LoadState::Empty);

        controller.open_resource(ResourceHandle::new("a.pdf"));
        assert_eq!(controller.load_state(), LoadState::Loading);
        assert!(log.calls().is_empty());

        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert_eq!(log.calls(), vec![SurfaceCall::Load]);
        assert!(channel.fetch("GET", PLACEHOLDER_URL).is_some());

        channel.report_page_count(6);
        assert_eq!(controller.pump(), 1);
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Known(6))
        );
        assert_eq!(controller.session().current_page(), 1);
    }

    #[test]
    fn renders_pull_state_that_is_already_published() {
        let (mut controller, log, channel) = recording_viewer(loader());
        open_ready(&mut controller, &channel, "a.pdf", 6);
        log.clear();

        controller.next_page();
        controller.next_page();
        controller.zoom_in();
        controller.previous_page();

        assert_eq!(
            log.calls(),
            vec![
                SurfaceCall::Render { page: 2, zoom: 2 },
                SurfaceCall::Render { page: 3, zoom: 2 },
                SurfaceCall::Render { page: 3, zoom: 3 },
                SurfaceCall::Render { page: 2, zoom: 3 },
            ]
        );
    }

    #[test]
    fn no_op_navigation_does_not_render() {
        let (mut controller, log, channel) = recording_viewer(loader());
        open_ready(&mut controller, &channel, "b.pdf", 3);
        log.clear();

        controller.previous_page();
        controller.jump_to_page(0);
        controller.jump_to_page(4);
        controller.jump_to_page(-2);
        controller.jump_to_page(3);
        controller.next_page();

        assert_eq!(controller.session().current_page(), 3);
        assert_eq!(log.calls(), vec![SurfaceCall::Render { page: 3, zoom: 2 }]);
    }

    #[test]
    fn zoom_stops_at_the_bounds() {
        let (mut controller, log, channel) = recording_viewer(loader());
        open_ready(&mut controller, &channel, "a.pdf", 6);
        log.clear();

        for _ in 0..4 {
            controller.zoom_in();
        }
        assert_eq!(controller.session().zoom().get(), 4);
        assert!(!controller.current_affordance().can_zoom_in);
        assert!(controller.current_affordance().can_zoom_out);
        assert_eq!(log.render_count(), 2);

        for _ in 0..6 {
            controller.zoom_out();
        }
        assert_eq!(controller.session().zoom().get(), 0);
        assert!(!controller.current_affordance().can_zoom_out);
        assert_eq!(log.render_count(), 6);
    }

    #[test]
    fn paging_is_refused_but_zoom_applies_while_loading() {
        let (mut controller, log, channel) = recording_viewer(loader());
        open_ready(&mut controller, &channel, "a.pdf", 6);
        controller.jump_to_page(3);
        log.clear();

        controller.open_resource(ResourceHandle::new("slow.pdf"));
        assert_eq!(controller.load_state(), LoadState::Loading);
        controller.next_page();
        controller.previous_page();
        controller.jump_to_page(2);
        controller.zoom_out();

        assert_eq!(controller.session().current_page(), 1);
        assert_eq!(log.calls(), vec![SurfaceCall::Render { page: 1, zoom: 1 }]);

        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert_eq!(controller.session().zoom().get(), 1);
        assert_eq!(log.calls().last(), Some(&SurfaceCall::Load));
    }

    #[test]
    fn reopening_releases_the_unfetched_stream() {
        let loader = loader();
        let (mut controller, _log, _channel) = recording_viewer(loader.clone());
        controller.open_resource(ResourceHandle::new("a.pdf"));
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );

        controller.open_resource(ResourceHandle::new("b.pdf"));
        assert_eq!(loader.released(), 1);
        assert_eq!(controller.session().current_page(), 1);
        assert_eq!(controller.session().total_pages(), 0);

        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert_eq!(handle_of(&controller), Some("b.pdf"));
    }

    #[test]
    fn failed_open_returns_to_the_previous_document_and_repaints_it() {
        let (mut controller, log, channel) = recording_viewer(loader());
        open_ready(&mut controller, &channel, "a.pdf", 6);
        controller.jump_to_page(4);
        let version = controller.session().version();
        log.clear();

        controller.open_resource(ResourceHandle::new("missing.pdf"));
        assert_eq!(controller.load_state(), LoadState::Loading);
        assert!(wait_for(&mut controller, not_loading));

        let session = controller.session();
        assert_eq!(handle_of(&controller), Some("a.pdf"));
        assert_eq!(session.current_page(), 4);
        assert_eq!(session.load_state(), LoadState::Ready(PageCount::Known(6)));
        assert!(session.version() > version);
        assert_eq!(channel.get_current_page(), 4);
        assert_eq!(log.calls(), vec![SurfaceCall::Render { page: 4, zoom: 2 }]);
    }

    #[test]
    fn zoom_changed_during_a_failed_open_is_kept() {
        let (mut controller, log, channel) = recording_viewer(loader());
        open_ready(&mut controller, &channel, "a.pdf", 6);
        controller.jump_to_page(4);
        log.clear();

        controller.open_resource(ResourceHandle::new("missing.pdf"));
        controller.zoom_in();
        controller.zoom_in();
        assert!(wait_for(&mut controller, not_loading));

        assert_eq!(controller.session().zoom().get(), 4);
        assert_eq!(controller.session().current_page(), 4);
        assert_eq!(channel.get_zoom_level(), 4);
        assert_eq!(
            log.calls(),
            vec![
                SurfaceCall::Render { page: 1, zoom: 3 },
                SurfaceCall::Render { page: 1, zoom: 4 },
                SurfaceCall::Render { page: 4, zoom: 4 },
            ]
        );
    }

    #[test]
    fn failed_first_open_returns_to_empty() {
        let (mut controller, log, _channel) = recording_viewer(loader());
        controller.open_resource(ResourceHandle::new("missing.pdf"));
        assert_eq!(wait_until_loaded(&mut controller), LoadState::Empty);
        assert!(controller.session().resource().is_none());
        assert!(log.calls().is_empty());
    }

    #[test]
    fn superseded_open_is_released_and_ignored() {
        let loader = loader();
        let (mut controller, log, _channel) = recording_viewer(loader.clone());

        controller.open_resource(ResourceHandle::new("slow.pdf"));
        controller.open_resource(ResourceHandle::new("b.pdf"));
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );

        assert!(wait_for(&mut controller, |_| loader.released() == 1));
        assert_eq!(loader.opened(), 2);
        assert_eq!(handle_of(&controller), Some("b.pdf"));
        assert_eq!(log.calls(), vec![SurfaceCall::Load]);
    }

    #[test]
    fn failure_after_a_superseded_open_returns_to_the_shown_document() {
        let loader = loader();
        let (mut controller, _log, channel) = recording_viewer(loader.clone());
        open_ready(&mut controller, &channel, "a.pdf", 6);
        controller.jump_to_page(3);

        controller.open_resource(ResourceHandle::new("slow.pdf"));
        controller.open_resource(ResourceHandle::new("missing.pdf"));
        assert!(wait_for(&mut controller, not_loading));
        assert!(wait_for(&mut controller, |_| loader.released() == 1));

        assert_eq!(handle_of(&controller), Some("a.pdf"));
        assert_eq!(controller.session().current_page(), 3);
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Known(6))
        );
    }

    #[test]
    fn restore_supersedes_a_pending_open() {
        let loader = loader();
        let (mut controller, _log, channel) = recording_viewer(loader.clone());

        controller.open_resource(ResourceHandle::new("slow.pdf"));
        controller.restore(PersistedState {
            resource_handle: Some(ResourceHandle::new("b.pdf")),
            current_page: 2,
            zoom_level: ZoomLevel::from(4),
        });
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert!(wait_for(&mut controller, |_| loader.released() == 1));
        assert_eq!(handle_of(&controller), Some("b.pdf"));

        assert!(report_loaded_pages(&channel, 3));
        controller.pump();
        assert_eq!(controller.session().current_page(), 2);
        assert_eq!(controller.session().zoom().get(), 4);
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Known(3))
        );
    }

    #[test]
    fn page_count_is_dropped_unless_ready() {
        let (mut controller, _log, channel) = recording_viewer(loader());

        channel.report_page_count(4);
        controller.pump();
        assert_eq!(controller.load_state(), LoadState::Empty);

        controller.open_resource(ResourceHandle::new("slow.pdf"));
        channel.report_page_count(4);
        controller.pump();
        assert_eq!(controller.load_state(), LoadState::Loading);

        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
    }

    #[test]
    fn late_page_count_of_a_replaced_document_is_dropped() {
        let (mut controller, _log, channel) = recording_viewer(loader());
        controller.open_resource(ResourceHandle::new("a.pdf"));
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        // Renderer starts parsing a.pdf
        assert!(channel.fetch("GET", PLACEHOLDER_URL).is_some());

        controller.open_resource(ResourceHandle::new("b.pdf"));
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );

        // ...and finishes it after b.pdf is already live
        channel.report_page_count(6);
        controller.pump();
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Unknown)
        );
        controller.next_page();
        assert_eq!(controller.session().current_page(), 1);

        assert!(report_loaded_pages(&channel, 3));
        controller.pump();
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Known(3))
        );
    }

    #[test]
    fn page_count_still_applies_after_a_failed_replacement() {
        let (mut controller, _log, channel) = recording_viewer(loader());
        controller.open_resource(ResourceHandle::new("a.pdf"));
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert!(channel.fetch("GET", PLACEHOLDER_URL).is_some());

        controller.open_resource(ResourceHandle::new("missing.pdf"));
        assert!(wait_for(&mut controller, not_loading));

        channel.report_page_count(6);
        controller.pump();
        assert_eq!(
            controller.load_state(),
            LoadState::Ready(PageCount::Known(6))
        );
    }

    #[test]
    fn launch_rejects_other_content_types_before_anything_else() {
        let loader = loader();
        let (bridge, log, _channel) = recording_bridge();
        let launch = Launch {
            intent: Some(OpenIntent::new("a.pdf", "text/plain")),
            restore: Some(PersistedState {
                resource_handle: Some(ResourceHandle::new("b.pdf")),
                current_page: 2,
                zoom_level: ZoomLevel::default(),
            }),
        };

        let result = ViewerController::launch(bridge, loader.clone(), ZoomLevel::default(), launch);
        match result {
            Err(ViewerError::UnsupportedContentType { content_type }) => {
                assert_eq!(content_type, "text/plain");
            }
            Ok(_) => panic!("launch accepted a non-PDF intent"),
        }
        assert_eq!(loader.opened(), 0);
        assert!(log.calls().is_empty());
    }

    #[test]
    fn accept_intent_checks_content_type() {
        let (mut controller, _log, _channel) = recording_viewer(loader());
        assert!(
            controller
                .accept_intent(OpenIntent::new("a.pdf", "image/png"))
                .is_err()
        );
        assert_eq!(controller.load_state(), LoadState::Empty);

        controller
            .accept_intent(OpenIntent::new("a.pdf", PDF_MIME))
            .unwrap();
        assert_eq!(controller.load_state(), LoadState::Loading);
    }

    #[test]
    fn launch_prefers_the_restored_record() {
        let (bridge, _log, channel) = recording_bridge();
        let launch = Launch {
            intent: Some(OpenIntent::new("a.pdf", PDF_MIME)),
            restore: Some(PersistedState {
                resource_handle: Some(ResourceHandle::new("b.pdf")),
                current_page: 2,
                zoom_level: ZoomLevel::from(4),
            }),
        };
        let mut controller =
            ViewerController::launch(bridge, loader(), ZoomLevel::default(), launch).unwrap();

        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert!(report_loaded_pages(&channel, 3));
        controller.pump();

        assert_eq!(handle_of(&controller), Some("b.pdf"));
        assert_eq!(controller.session().current_page(), 2);
        assert_eq!(controller.session().zoom().get(), 4);
    }

    #[test]
    fn restored_page_is_clamped_to_the_reported_count() {
        let (mut controller, log, channel) = recording_viewer(loader());
        controller.restore(PersistedState {
            resource_handle: Some(ResourceHandle::new("b.pdf")),
            current_page: 7,
            zoom_level: ZoomLevel::from(1),
        });
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );
        assert_eq!(controller.session().current_page(), 7);

        assert!(report_loaded_pages(&channel, 3));
        controller.pump();
        assert_eq!(controller.session().current_page(), 3);
        assert_eq!(
            log.calls().last(),
            Some(&SurfaceCall::Render { page: 3, zoom: 1 })
        );
    }

    #[test]
    fn restoring_a_record_without_document_stays_empty() {
        let loader = loader();
        let (mut controller, _log, channel) = recording_viewer(loader.clone());
        controller.restore(PersistedState {
            resource_handle: None,
            current_page: 1,
            zoom_level: ZoomLevel::from(3),
        });
        assert_eq!(controller.load_state(), LoadState::Empty);
        assert_eq!(channel.get_zoom_level(), 3);
        assert_eq!(loader.opened(), 0);
    }

    /// State, affordance and render commands after each step of a fixed
    /// input sequence
    fn replay(controller: &mut ViewerController, log: &SurfaceLog) -> Vec<String> {
        let script = [
            Intent::NextPage,
            Intent::NextPage,
            Intent::NextPage,
            Intent::PreviousPage,
            Intent::ZoomIn,
            Intent::ZoomIn,
            Intent::ZoomIn,
            Intent::ZoomOut,
        ];
        let mut trace = Vec::new();
        for intent in script {
            log.clear();
            controller.dispatch(intent.clone());
            trace.push(format!(
                "{intent:?}: {:?} page {} zoom {} {:?} {:?}",
                controller.load_state(),
                controller.session().current_page(),
                controller.session().zoom().get(),
                controller.current_affordance(),
                log.calls(),
            ));
        }
        trace
    }

    #[test]
    fn restored_controller_behaves_like_the_original() {
        let (mut original, original_log, channel) = recording_viewer(loader());
        open_ready(&mut original, &channel, "a.pdf", 6);
        original.jump_to_page(4);
        original.zoom_in();
        original.zoom_in();
        assert!(!original.current_affordance().can_zoom_in);
        let record = original.persisted_state();

        let (mut restored, restored_log, channel) = recording_viewer(loader());
        restored.restore(record.clone());
        assert_eq!(
            wait_until_loaded(&mut restored),
            LoadState::Ready(PageCount::Unknown)
        );
        assert!(report_loaded_pages(&channel, 6));
        restored.pump();

        assert_eq!(restored.persisted_state(), record);
        assert_eq!(restored.load_state(), original.load_state());
        assert_eq!(restored.current_affordance(), original.current_affordance());
        assert_eq!(
            replay(&mut restored, &restored_log),
            replay(&mut original, &original_log)
        );
    }

    #[test]
    fn shutdown_releases_the_live_stream_once() {
        let loader = loader();
        let (mut controller, _log, _channel) = recording_viewer(loader.clone());
        controller.open_resource(ResourceHandle::new("a.pdf"));
        assert_eq!(
            wait_until_loaded(&mut controller),
            LoadState::Ready(PageCount::Unknown)
        );

        controller.shutdown();
        assert_eq!(loader.released(), 1);
        drop(controller);
        assert_eq!(loader.released(), 1);
    }
}
