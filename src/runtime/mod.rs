//! Adapter interface to the host runtime.
//!
//! The attach machinery never talks to a concrete interpreter directly. It
//! manipulates execution contexts, trace hooks and paused frames through the
//! [`Runtime`] trait, and the embedder supplies the implementation for its
//! runtime version. All version-specific API differences live behind this
//! seam.

mod frame;

pub use frame::{Frame, Location, Namespace};

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Identifier of an execution context living in the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub const fn new(raw: u64) -> Self {
        ContextId(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Opaque, reference-counted runtime object.
///
/// Equality of values is intentionally not defined; what the attach machinery
/// cares about is object identity, exposed as [`Value::same_object`].
#[derive(Clone)]
pub struct Value(Rc<dyn Any>);

impl Value {
    pub fn new<T: 'static>(value: T) -> Self {
        Value(Rc::new(value))
    }

    /// True if both handles refer to the same underlying object.
    pub fn same_object(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:p})", Rc::as_ptr(&self.0))
    }
}

/// Kind of execution step reported to a trace hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Call,
    Line,
    Return,
    Unwind,
}

/// Callback half of an instrumentation hook.
pub type TraceFn = Rc<dyn Fn(&Frame, TraceEvent)>;

/// Instrumentation hook: a callback plus the opaque state it runs against.
///
/// The hook is owned by whichever context it is installed on. Cloning the
/// handle shares both halves, so a hook moved between contexts is the same
/// hook, not a copy.
#[derive(Clone)]
pub struct TraceHook {
    callback: TraceFn,
    state: Value,
}

impl TraceHook {
    pub fn new(callback: TraceFn, state: Value) -> Self {
        TraceHook { callback, state }
    }

    pub fn callback(&self) -> &TraceFn {
        &self.callback
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    /// True if both handles carry the identical (callback, state) pair.
    pub fn same_hook(&self, other: &TraceHook) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback) && self.state.same_object(&other.state)
    }
}

impl fmt::Debug for TraceHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceHook")
            .field("callback", &Rc::as_ptr(&self.callback))
            .field("state", &self.state)
            .finish()
    }
}

/// The host runtime failed to allocate a new execution context.
#[derive(Debug, thiserror::Error)]
#[error("cannot allocate a new execution context: {reason}")]
pub struct ContextCreationError {
    reason: String,
}

impl ContextCreationError {
    pub fn new(reason: impl Into<String>) -> Self {
        ContextCreationError {
            reason: reason.into(),
        }
    }
}

/// Host runtime operations used by the attach machinery.
///
/// The model is a single current-context pointer per thread: switching which
/// context is current is an explicit, synchronous operation, and there is no
/// parallelism between contexts.
pub trait Runtime {
    /// True once the runtime is fully initialized and able to run code.
    fn is_initialized(&self) -> bool;

    /// True while this thread is inside a trace callback. Attaching in that
    /// window would corrupt the very hook being read, so the guard rejects it.
    fn tracing_in_progress(&self) -> bool;

    /// Create a new, independent execution context sharing the process but
    /// not the primary context's namespaces. The created context becomes
    /// current on success.
    fn new_context(&mut self) -> Result<ContextId, ContextCreationError>;

    /// Finalize `ctx`. The caller must have made `ctx` current beforehand and
    /// is responsible for restoring a valid current context afterwards.
    fn end_context(&mut self, ctx: ContextId);

    fn current_context(&self) -> ContextId;

    /// Make `ctx` current, returning the previously current context.
    fn swap_current(&mut self, ctx: ContextId) -> ContextId;

    /// The instrumentation hook installed on `ctx`, if any.
    fn trace_hook(&self, ctx: ContextId) -> Option<TraceHook>;

    /// Install (or clear, with `None`) the instrumentation hook of `ctx`.
    fn set_trace_hook(&mut self, ctx: ContextId, hook: Option<TraceHook>);

    /// The frame that code running in `ctx` observes as current. Must consult
    /// the redirect table first, then the context's own execution state.
    fn current_frame(&self, ctx: ContextId) -> Option<Frame>;

    /// The frame redirect installed for `ctx`, if any.
    fn frame_redirect(&self, ctx: ContextId) -> Option<Frame>;

    /// Install (or clear, with `None`) a frame redirect for `ctx`: while set,
    /// frame introspection performed by code running in `ctx` resolves to the
    /// given frame instead of the context's own.
    fn set_frame_redirect(&mut self, ctx: ContextId, frame: Option<Frame>);

    /// A fresh namespace exposing only the primary context's builtin symbol
    /// table, suitable as a substitute globals table while name resolution
    /// must keep working against an otherwise empty scope.
    fn minimal_globals(&self) -> Namespace;
}
