//! Signal-driven attach registration.
//!
//! A process can arm a signal so that an operator is able to request a remote
//! debugging session from outside (`kill -USR1 <pid>`). Running the attach
//! pipeline inside a signal handler is not safe in Rust - the manager is
//! single-threaded and the pipeline allocates - so the handler only records a
//! pending request. The embedder drains it from a safe point (its main loop
//! or an existing trace callback) and feeds the registered address to
//! [`DebugAttachManager::attach`](crate::attach::DebugAttachManager::attach):
//!
//! ```ignore
//! handler::register(None, None, None)?;
//! // ... event loop ...
//! if let Some(h) = handler::take_pending() {
//!     let _ = manager.attach(&h.address(), &bootstrap);
//! }
//! ```

use crate::session::{DFLT_HOST, DFLT_PORT};
use once_cell::sync::Lazy;
use signal_hook::low_level;
use signal_hook::SigId;
use std::io;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Default signal armed by [`register`].
pub const DFLT_SIGNAL: c_int = signal_hook::consts::SIGUSR1;

/// An armed attach registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub signum: c_int,
    pub host: String,
    pub port: u16,
}

impl Handler {
    /// The registered endpoint in the `"<host> <port>"` attach format.
    pub fn address(&self) -> String {
        format!("{} {}", self.host, self.port)
    }
}

struct Registration {
    handler: Handler,
    sig_id: SigId,
    pending: Arc<AtomicBool>,
}

static REGISTRATION: Lazy<Mutex<Option<Registration>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("cannot install signal handler: {0}")]
    Signal(#[from] io::Error),
}

/// Arm `signum` (default `SIGUSR1`) to request an attach to `host:port`
/// (default `127.0.0.1:7935`). Re-registering replaces the previous
/// registration.
pub fn register(
    signum: Option<c_int>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<Handler, HandlerError> {
    let handler = Handler {
        signum: signum.unwrap_or(DFLT_SIGNAL),
        host: host.unwrap_or(DFLT_HOST).to_string(),
        port: port.unwrap_or(DFLT_PORT),
    };

    let pending = Arc::new(AtomicBool::new(false));
    let sig_id = signal_hook::flag::register(handler.signum, pending.clone())?;

    let mut slot = REGISTRATION.lock().unwrap();
    if let Some(previous) = slot.take() {
        low_level::unregister(previous.sig_id);
        log::debug!("previous attach registration on signal {} replaced", previous.handler.signum);
    }
    *slot = Some(Registration {
        handler: handler.clone(),
        sig_id,
        pending,
    });

    log::info!(
        "attach armed on signal {}, endpoint {}:{}",
        handler.signum,
        handler.host,
        handler.port
    );
    Ok(handler)
}

/// Disarm the registration. Does nothing when none is armed.
pub fn unregister() {
    let mut slot = REGISTRATION.lock().unwrap();
    if let Some(registration) = slot.take() {
        low_level::unregister(registration.sig_id);
        log::info!("attach registration on signal {} removed", registration.handler.signum);
    }
}

/// The current registration, if any.
pub fn get_handler() -> Option<Handler> {
    REGISTRATION.lock().unwrap().as_ref().map(|r| r.handler.clone())
}

/// Consume a pending attach request raised by the armed signal since the last
/// call. Returns the registration whose endpoint the attach should target.
pub fn take_pending() -> Option<Handler> {
    let slot = REGISTRATION.lock().unwrap();
    let registration = slot.as_ref()?;
    registration
        .pending
        .swap(false, Ordering::SeqCst)
        .then(|| registration.handler.clone())
}
