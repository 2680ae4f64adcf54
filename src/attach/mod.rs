//! Attach orchestration: one entry point that bootstraps the debugger helper
//! inside an isolated execution context and splices its instrumentation hook
//! onto the paused primary context.
//!
//! The attach pipeline is a straight-line state machine:
//!
//! ```text
//! IDLE -> GUARDED -> CONTEXT_OPEN -> HELPER_RUNNING -> BRIDGED -> ACTIVE
//! ```
//!
//! with an aborting edge from every intermediate state. Partial progress
//! never leaks: the guard flag rolls back through a drop guard, the relaxed
//! scope restores itself on drop, and a created context is destroyed
//! synchronously before the error is returned. `ACTIVE -> IDLE` is driven
//! externally, by the communication handle releasing its [`TeardownToken`].

mod bridge;
mod context;
pub(crate) mod error;
mod guard;
mod scope;
mod teardown;

pub use error::AttachError;
pub use teardown::TeardownToken;

use crate::runtime::Runtime;
use crate::session::{RemoteAddress, SessionBootstrap, SessionRequest};
use bridge::bridge_hook;
use context::IsolatedContext;
use guard::AttachGuard;
use scope::RelaxedScope;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct ManagerInner {
    pub(crate) runtime: RefCell<Box<dyn Runtime>>,
    pub(crate) guard: AttachGuard,
}

/// Owner of the process-wide attach state: the session flag, the single
/// isolated context and the hook slot mutations all go through this object.
///
/// Construct one at process start and keep it on the thread that runs the
/// primary context; the manager is deliberately single-threaded (`!Send`),
/// matching the one-current-context-per-thread execution model.
pub struct DebugAttachManager {
    inner: Rc<ManagerInner>,
}

impl DebugAttachManager {
    pub fn new(runtime: impl Runtime + 'static) -> Self {
        DebugAttachManager {
            inner: Rc::new(ManagerInner {
                runtime: RefCell::new(Box::new(runtime)),
                guard: AttachGuard::new(),
            }),
        }
    }

    /// True while a remote session is active.
    pub fn session_active(&self) -> bool {
        self.inner.guard.is_active()
    }

    /// Attach a remote debugger to the paused primary context.
    ///
    /// `target_address` is `"<host> <port>"`, `"<host>"` or empty; missing
    /// parts are left for the helper to default. On success the primary
    /// context is instrumented with the helper's hook and the session stays
    /// active until the helper's communication handle is released.
    pub fn attach(
        &self,
        target_address: &str,
        bootstrap: &dyn SessionBootstrap,
    ) -> Result<(), AttachError> {
        // IDLE -> GUARDED
        let slot = self.inner.guard.try_acquire(&**self.inner.runtime.borrow())?;
        log::debug!("attach to '{target_address}': guard acquired");

        let address = RemoteAddress::parse(target_address)?;

        // The helper debugs the primary context's paused frame. A runtime
        // that cannot produce one is not ready to host a session yet.
        let primary_frame = {
            let rt = self.inner.runtime.borrow();
            let primary = rt.current_context();
            rt.current_frame(primary)
        };
        let Some(primary_frame) = primary_frame else {
            return Err(AttachError::NotInitialized);
        };

        // GUARDED -> CONTEXT_OPEN
        let isolated = IsolatedContext::open(&mut **self.inner.runtime.borrow_mut())?;

        // CONTEXT_OPEN -> HELPER_RUNNING: run the bootstrap inside the
        // secondary context with the relaxed-scope window open. The window
        // closes before the hook is bridged, whatever the outcome.
        let result = {
            let _scope = RelaxedScope::open(&self.inner.runtime, isolated.id(), primary_frame.clone());
            let request = SessionRequest {
                host: address.host.clone(),
                port: address.port,
                frame: primary_frame,
            };
            let mut rt = self.inner.runtime.borrow_mut();
            bootstrap.start_remote_session(&mut **rt, request)
        };

        let handle = match result {
            Ok(handle) => handle,
            Err(err) => {
                isolated.destroy(&mut **self.inner.runtime.borrow_mut());
                return Err(err.into());
            }
        };

        // HELPER_RUNNING -> BRIDGED: control goes back to the primary
        // context, which receives the hook the helper just installed.
        let bridged = {
            let mut rt = self.inner.runtime.borrow_mut();
            rt.swap_current(isolated.primary());
            bridge_hook(&mut **rt, isolated.id(), isolated.primary())
        };
        if let Err(err) = bridged {
            isolated.destroy(&mut **self.inner.runtime.borrow_mut());
            return Err(err);
        }

        // BRIDGED -> ACTIVE: from here on the handle owns the session; its
        // release is the only thing that ends it.
        let token = TeardownToken::new(self.inner.clone(), isolated);
        handle.bind_teardown(token);
        slot.commit();

        log::info!("remote debugging session active on '{target_address}'");
        Ok(())
    }
}
