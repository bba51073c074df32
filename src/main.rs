use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};

use pdfshell::app::{App, run_app_with_event_source};
use pdfshell::bridge::{RenderBridge, RenderSurface};
use pdfshell::controller::{Launch, OpenIntent, ViewerController};
use pdfshell::event_source::KeyboardEventSource;
use pdfshell::panic_handler;
use pdfshell::persist::StateStore;
use pdfshell::renderer::PageScanRenderer;
use pdfshell::resource::{FileLoader, PDF_MIME};
use pdfshell::settings;

#[derive(Parser, Debug)]
#[command(name = "pdfshell", version, about = "A single-document PDF viewer for the terminal")]
struct Cli {
    /// Document to open (path or file:// URI)
    file: Option<String>,

    /// Content type of FILE; guessed from the extension when omitted
    #[arg(long, value_name = "TYPE")]
    mime: Option<String>,

    /// Restore the document, page and zoom saved by the last session
    #[arg(long)]
    resume: bool,

    /// Settings file to use instead of the per-user config
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where the viewer state is saved and restored
    #[arg(long, value_name = "PATH")]
    state_file: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn guess_content_type(handle: &str) -> &'static str {
    let is_pdf = Path::new(handle)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        PDF_MIME
    } else {
        "application/octet-stream"
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    settings::load_settings(cli.config.as_deref());
    let mut config = settings::get_settings();
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    WriteLogger::init(
        config.level_filter(),
        Config::default(),
        File::create(&config.log_file)
            .with_context(|| format!("creating log file {:?}", config.log_file))?,
    )?;
    info!("Starting pdfshell");

    let store = match cli.state_file.or_else(|| config.state_path()) {
        Some(path) => StateStore::with_file(path),
        None => StateStore::ephemeral(),
    };

    let launch = Launch {
        intent: cli.file.map(|file| {
            let content_type = cli
                .mime
                .unwrap_or_else(|| guess_content_type(&file).to_string());
            OpenIntent::new(file.as_str(), content_type)
        }),
        restore: if cli.resume { store.load_or_none() } else { None },
    };

    let (frames_tx, frames_rx) = flume::unbounded();
    let bridge = RenderBridge::new(|channel| -> Box<dyn RenderSurface> {
        Box::new(PageScanRenderer::spawn(channel, frames_tx))
    });
    let controller = ViewerController::launch(bridge, Arc::new(FileLoader), config.zoom(), launch)
        .inspect_err(|e| error!("Rejected launch: {e}"))?;

    panic_handler::initialize_panic_handler();
    panic_handler::setup_terminal()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(controller, frames_rx);
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    panic_handler::restore_terminal();

    let mut controller = app.into_controller();
    if let Err(e) = store.save(&controller.persisted_state()) {
        error!("Failed to save viewer state: {e}");
    }
    controller.shutdown();

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down pdfshell");
    Ok(())
}
