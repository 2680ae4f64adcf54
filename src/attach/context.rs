use super::error::AttachError;
use crate::runtime::{ContextId, Runtime};

/// The secondary execution context hosting the debugger helper.
///
/// Creation leaves the new context current, mirroring the host runtime's
/// convention; the id of the previously current (primary) context is kept so
/// that every destruction path can restore a valid current context.
#[derive(Debug)]
pub(crate) struct IsolatedContext {
    id: ContextId,
    primary: ContextId,
}

impl IsolatedContext {
    pub fn open(rt: &mut dyn Runtime) -> Result<Self, AttachError> {
        let primary = rt.current_context();
        let id = rt.new_context()?;
        log::debug!("isolated context {id} created (primary {primary})");
        Ok(IsolatedContext { id, primary })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn primary(&self) -> ContextId {
        self.primary
    }

    pub fn destroy(self, rt: &mut dyn Runtime) {
        destroy_context(rt, self.id, self.primary);
    }
}

/// Finalize `ctx` from whatever context is current at the time.
///
/// The switch/restore pair around the finalization is mandatory: ending a
/// context while another one is current, or leaving the finalized context
/// installed as current, leaves the process without a valid current context
/// mid-finalization. When the previously current context is the one being
/// destroyed, `fallback` (the primary) is restored instead.
pub(crate) fn destroy_context(rt: &mut dyn Runtime, ctx: ContextId, fallback: ContextId) {
    let prev = rt.swap_current(ctx);
    rt.end_context(ctx);

    let restore = if prev == ctx { fallback } else { prev };
    rt.swap_current(restore);
    log::debug!("isolated context {ctx} destroyed, current restored to {restore}");
}
