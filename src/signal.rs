//! Ctrl+C handling.
//!
//! A [`ShutdownHandler`] wraps a shared `AtomicBool`. The Ctrl+C hook sets
//! it; the indexer and detector check it, let their in-flight parallel
//! phase drain and then return an `Interrupted` error, so no partial
//! result is ever reported. The binary then exits with code 130.
//!
//! ```rust,no_run
//! use fragdupe::report::RunControl;
//! use fragdupe::signal::install_handler;
//!
//! let handler = install_handler();
//! let control = RunControl::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown, as Ctrl+C would.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag, for passing to the indexer and detector.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls return
/// the registered handler with its flag cleared. If registration fails a
/// handler without a hook is returned; it still honors
/// [`ShutdownHandler::request_shutdown`].
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let registered = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing the current phase...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    if let Err(e) = registered {
        log::debug!("Ctrl+C handler not registered ({}), using unhooked handler", e);
    }
    GLOBAL_HANDLER.get_or_init(|| handler).clone()
}
