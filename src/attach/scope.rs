use crate::runtime::{ContextId, Frame, Namespace, Runtime};
use std::cell::RefCell;

/// Scoped relaxation of the primary frame's namespace and frame-accessor
/// state, open while the helper bootstrap runs in the secondary context.
///
/// The helper must resolve source lines, names and attributes belonging to
/// the primary context's paused frame, which the secondary context's default
/// isolation would block. While a `RelaxedScope` is alive:
///
/// - the primary frame's globals are swapped for a minimal namespace exposing
///   only the builtin symbol table (name resolution keeps working against an
///   otherwise empty scope), and its locals for an empty table;
/// - a frame redirect is installed for the secondary context, so any code
///   running there asking "what is the current frame" gets the primary
///   paused frame.
///
/// Restoration happens in `Drop`, on every exit path. A leaked substitution
/// would corrupt all subsequent frame introspection in the primary context
/// for the remainder of the process.
pub(crate) struct RelaxedScope<'a> {
    rt: &'a RefCell<Box<dyn Runtime>>,
    secondary: ContextId,
    frame: Frame,
    saved_globals: Option<Namespace>,
    saved_locals: Option<Namespace>,
    saved_redirect: Option<Option<Frame>>,
}

impl<'a> RelaxedScope<'a> {
    pub fn open(
        rt: &'a RefCell<Box<dyn Runtime>>,
        secondary: ContextId,
        frame: Frame,
    ) -> Self {
        let mut runtime = rt.borrow_mut();

        let minimal = runtime.minimal_globals();
        let saved_globals = frame.replace_globals(minimal);
        let saved_locals = frame.replace_locals(Namespace::new());

        let saved_redirect = runtime.frame_redirect(secondary);
        runtime.set_frame_redirect(secondary, Some(frame.clone()));
        drop(runtime);

        log::debug!("relaxed scope opened for {secondary}");
        RelaxedScope {
            rt,
            secondary,
            frame,
            saved_globals: Some(saved_globals),
            saved_locals: Some(saved_locals),
            saved_redirect: Some(saved_redirect),
        }
    }
}

impl Drop for RelaxedScope<'_> {
    fn drop(&mut self) {
        if let Some(globals) = self.saved_globals.take() {
            self.frame.replace_globals(globals);
        }
        if let Some(locals) = self.saved_locals.take() {
            self.frame.replace_locals(locals);
        }
        if let Some(redirect) = self.saved_redirect.take() {
            self.rt
                .borrow_mut()
                .set_frame_redirect(self.secondary, redirect);
        }
        log::debug!("relaxed scope closed for {}", self.secondary);
    }
}
