use super::context::IsolatedContext;
use super::ManagerInner;
use std::cell::Cell;
use std::rc::Rc;

/// Lifecycle proxy for an active remote session.
///
/// The token is bound into the communication handle on a successful attach,
/// so the handle's natural close/release path is what ends the session:
/// dropping the token destroys the secondary execution context and clears the
/// session flag. At most one token exists per process (enforced by the attach
/// guard), and firing is idempotent - a second trigger is a no-op.
pub struct TeardownToken {
    manager: Rc<ManagerInner>,
    context: Cell<Option<IsolatedContext>>,
}

impl TeardownToken {
    pub(crate) fn new(manager: Rc<ManagerInner>, context: IsolatedContext) -> Self {
        TeardownToken {
            manager,
            context: Cell::new(Some(context)),
        }
    }

    /// Tear the session down now instead of waiting for the drop. Handles
    /// with an explicit close path call this; both routes are idempotent.
    pub fn fire(&self) {
        let Some(context) = self.context.take() else {
            return;
        };

        let id = context.id();
        context.destroy(&mut **self.manager.runtime.borrow_mut());
        self.manager.guard.release();
        log::info!("remote session ended, isolated context {id} torn down");
    }

    /// True once the teardown has run.
    pub fn is_spent(&self) -> bool {
        // Cell<Option<_>> has no borrow-free peek, take and put back.
        let context = self.context.take();
        let spent = context.is_none();
        self.context.set(context);
        spent
    }
}

impl Drop for TeardownToken {
    fn drop(&mut self) {
        self.fire();
    }
}
