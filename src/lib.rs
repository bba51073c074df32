// Export modules for use in tests
pub mod app;
pub mod bridge;
pub mod controller;
pub mod event_source;
pub mod panic_handler;
pub mod persist;
pub mod picker;
pub mod renderer;
pub mod resource;
pub mod session;
pub mod settings;
pub mod theme;
pub mod zoom;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the core viewer types
pub use bridge::{Channel, RenderBridge, RenderSurface};
pub use controller::{Intent, Launch, OpenIntent, ViewerController, ViewerError};
pub use session::{Affordance, LoadState, PageCount, ViewerSession};
