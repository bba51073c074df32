pub mod test_helpers {
    use std::collections::HashMap;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::{Duration, Instant};

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::bridge::{Channel, PLACEHOLDER_URL, RenderBridge, RenderSurface};
    use crate::controller::ViewerController;
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use crate::resource::{DocumentStream, LoadError, ResourceHandle, ResourceLoader};
    use crate::session::LoadState;
    use crate::zoom::ZoomLevel;

    /// How long helpers wait for background work before giving up
    pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Minimal byte stream that the page scanner reads as `pages` pages
    pub fn sample_pdf(pages: u32) -> Vec<u8> {
        let mut pdf = String::from("%PDF-1.4\n1 0 obj << /Type /Pages /Kids [");
        for i in 0..pages {
            pdf.push_str(&format!("{} 0 R ", i + 2));
        }
        pdf.push_str(&format!("] /Count {pages} >>\nendobj\n"));
        for i in 0..pages {
            pdf.push_str(&format!(
                "{} 0 obj << /Type /Page /Parent 1 0 R >>\nendobj\n",
                i + 2
            ));
        }
        pdf.push_str("%%EOF\n");
        pdf.into_bytes()
    }

    struct StoredDocument {
        bytes: Vec<u8>,
        open_delay: Duration,
        read_delay: Duration,
    }

    /// Stream that stalls before handing out its first bytes
    struct SlowReader {
        inner: Cursor<Vec<u8>>,
        delay: Option<Duration>,
    }

    impl Read for SlowReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(delay) = self.delay.take() {
                std::thread::sleep(delay);
            }
            self.inner.read(buf)
        }
    }

    /// In-memory loader that counts opens and releases
    #[derive(Default)]
    pub struct MemoryLoader {
        documents: Mutex<HashMap<String, StoredDocument>>,
        opened: AtomicUsize,
        released: AtomicUsize,
    }

    impl MemoryLoader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_document(self, handle: &str, bytes: Vec<u8>) -> Self {
            self.store(handle, bytes, Duration::ZERO, Duration::ZERO)
        }

        /// A document whose `open` blocks for `delay` first
        pub fn with_slow_document(self, handle: &str, bytes: Vec<u8>, delay: Duration) -> Self {
            self.store(handle, bytes, delay, Duration::ZERO)
        }

        /// A document that opens at once but whose stream takes `delay` to read
        pub fn with_slow_stream(self, handle: &str, bytes: Vec<u8>, delay: Duration) -> Self {
            self.store(handle, bytes, Duration::ZERO, delay)
        }

        fn store(
            self,
            handle: &str,
            bytes: Vec<u8>,
            open_delay: Duration,
            read_delay: Duration,
        ) -> Self {
            self.documents
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    handle.to_string(),
                    StoredDocument {
                        bytes,
                        open_delay,
                        read_delay,
                    },
                );
            self
        }

        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }
    }

    impl ResourceLoader for MemoryLoader {
        fn open(&self, handle: &ResourceHandle) -> Result<DocumentStream, LoadError> {
            let (bytes, open_delay, read_delay) = {
                let documents = self
                    .documents
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let Some(doc) = documents.get(handle.as_str()) else {
                    return Err(LoadError::NotFound {
                        handle: handle.clone(),
                    });
                };
                (doc.bytes.clone(), doc.open_delay, doc.read_delay)
            };
            if !open_delay.is_zero() {
                std::thread::sleep(open_delay);
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(SlowReader {
                inner: Cursor::new(bytes),
                delay: Some(read_delay).filter(|d| !d.is_zero()),
            }))
        }

        fn release(&self, _handle: &ResourceHandle, stream: DocumentStream) {
            self.released.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    }

    /// What a [`RecordingSurface`] was asked to do
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum SurfaceCall {
        Load,
        /// Render request, with the state pulled through the channel
        Render { page: u32, zoom: u8 },
    }

    #[derive(Clone, Default)]
    pub struct SurfaceLog(Arc<Mutex<Vec<SurfaceCall>>>);

    impl SurfaceLog {
        pub fn calls(&self) -> Vec<SurfaceCall> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        pub fn clear(&self) {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }

        pub fn render_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, SurfaceCall::Render { .. }))
                .count()
        }

        fn push(&self, call: SurfaceCall) {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        }
    }

    /// Surface that records commands and pulls state the way a renderer must
    pub struct RecordingSurface {
        channel: Channel,
        log: SurfaceLog,
    }

    impl RenderSurface for RecordingSurface {
        fn load(&mut self) {
            self.log.push(SurfaceCall::Load);
        }

        fn request_render(&mut self) {
            self.log.push(SurfaceCall::Render {
                page: self.channel.get_current_page(),
                zoom: self.channel.get_zoom_level(),
            });
        }
    }

    /// Bridge wired to a [`RecordingSurface`], plus the renderer-side channel
    pub fn recording_bridge() -> (RenderBridge, SurfaceLog, Channel) {
        let log = SurfaceLog::default();
        let mut renderer_channel = None;
        let bridge = RenderBridge::new(|channel| -> Box<dyn RenderSurface> {
            renderer_channel = Some(channel.clone());
            Box::new(RecordingSurface {
                channel,
                log: log.clone(),
            })
        });
        let channel = renderer_channel.unwrap_or_else(|| panic!("bridge did not attach"));
        (bridge, log, channel)
    }

    /// Controller at the default zoom on a recording bridge
    pub fn recording_viewer(
        loader: Arc<MemoryLoader>,
    ) -> (ViewerController, SurfaceLog, Channel) {
        let (bridge, log, channel) = recording_bridge();
        let controller = ViewerController::new(bridge, loader, ZoomLevel::default());
        (controller, log, channel)
    }

    /// Act as a renderer that parsed the live stream: fetch it, then report
    /// `pages`. Returns false if there was no stream to fetch.
    pub fn report_loaded_pages(channel: &Channel, pages: u32) -> bool {
        let fetched = channel.fetch("GET", PLACEHOLDER_URL).is_some();
        channel.report_page_count(pages);
        fetched
    }

    /// Handle background events until none arrives for `quiet`
    pub fn drain_until_quiet(controller: &mut ViewerController, quiet: Duration) {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        while controller.wait_event(quiet) && Instant::now() < deadline {}
    }

    /// Handle background events until the controller leaves `Loading`
    pub fn wait_until_loaded(controller: &mut ViewerController) -> LoadState {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        while controller.load_state() == LoadState::Loading && Instant::now() < deadline {
            controller.wait_event(Duration::from_millis(20));
        }
        controller.load_state()
    }

    /// Handle background events until `done` holds
    pub fn wait_for(
        controller: &mut ViewerController,
        mut done: impl FnMut(&ViewerController) -> bool,
    ) -> bool {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        while !done(controller) {
            if Instant::now() >= deadline {
                return false;
            }
            controller.wait_event(Duration::from_millis(20));
        }
        true
    }

    /// Builder for scripted key input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events.push(SimulatedEventSource::key(code));
            self
        }

        pub fn press_char(self, c: char) -> Self {
            self.press(KeyCode::Char(c))
        }

        pub fn next_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self = self.press_char('l');
            }
            self
        }

        pub fn previous_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self = self.press_char('h');
            }
            self
        }

        pub fn zoom_in(self) -> Self {
            self.press_char('+')
        }

        pub fn zoom_out(self) -> Self {
            self.press_char('-')
        }

        /// Open the picker, type `page`, confirm
        pub fn jump_to(mut self, page: u32) -> Self {
            self = self.press_char('g');
            self.events
                .extend(SimulatedEventSource::typed(&page.to_string()));
            self.press(KeyCode::Enter)
        }

        /// Open the path prompt, type `path`, confirm
        pub fn open(mut self, path: &str) -> Self {
            self = self.press_char('o');
            self.events.extend(SimulatedEventSource::typed(path));
            self.press(KeyCode::Enter)
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }

        pub fn into_events(self) -> Vec<Event> {
            self.events
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}
