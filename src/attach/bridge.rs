use super::error::AttachError;
use crate::runtime::{ContextId, Runtime, TraceHook};

/// Move the instrumentation hook installed by the helper on `from` onto `to`.
///
/// The hook the helper installed is the one the remote session drives; the
/// primary context must end up with that exact (callback, state) pair, never
/// a stale or default one. The local `hook` binding keeps the state alive
/// while the source registration - possibly its last runtime-held reference -
/// is cleared.
pub(crate) fn bridge_hook(
    rt: &mut dyn Runtime,
    from: ContextId,
    to: ContextId,
) -> Result<TraceHook, AttachError> {
    let Some(hook) = rt.trace_hook(from) else {
        return Err(AttachError::HookNotInstalled);
    };

    rt.set_trace_hook(from, None);
    rt.set_trace_hook(to, Some(hook.clone()));

    log::debug!("instrumentation hook bridged {from} -> {to}");
    Ok(hook)
}
