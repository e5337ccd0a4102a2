//! Ctrl+C handling.
//!
//! A single `Arc<AtomicBool>` is set when the user interrupts. The finder,
//! the walker and the resolver each take a clone and check it between units
//! of work; the CLI then exits with code 130.
//!
//! ```rust,no_run
//! use arcdupe::duplicates::FinderConfig;
//! use arcdupe::signal::install_handler;
//!
//! let handler = install_handler();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
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
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for long-running components.
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

/// Install the process-wide Ctrl+C handler.
///
/// The OS handler can only be registered once. Later calls get the same
/// (reset) handler back; if registration fails, an unregistered handler is
/// returned and interruption simply cannot be observed.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();
    let registered = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing current step...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match registered {
        Ok(()) => GLOBAL_HANDLER.get_or_init(|| handler).clone(),
        Err(e) => {
            log::warn!("Ctrl+C handler not installed: {}", e);
            handler
        }
    }
}
