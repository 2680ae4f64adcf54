//! Sidetap attaches a remote interactive debugger to a running program
//! without disturbing the program's own execution state, even when the
//! program is paused in a fragile moment - mid-iteration over its module
//! table, inside its import machinery, or before its core namespaces exist.
//!
//! The debugger front-end, its wire protocol and the transport are external
//! collaborators (see [`session`]). What this crate owns is the hard part in
//! between: bootstrapping a second, isolated execution context inside the
//! same process, running the privileged helper there, splicing the helper's
//! instrumentation hook back onto the paused primary context, and tearing the
//! isolated context down exactly once when the remote session ends.
//!
//! Entry point: [`attach::DebugAttachManager::attach`], fed by a CLI trigger,
//! an embedder, or the signal registration in [`handler`]. The host runtime
//! is reached through the [`runtime::Runtime`] adapter.

pub mod attach;
pub mod handler;
pub mod runtime;
pub mod session;

pub use attach::{AttachError, DebugAttachManager, TeardownToken};
pub use session::{RemoteAddress, SessionBootstrap, SessionHandle, SessionRequest};
