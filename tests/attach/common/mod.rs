use sidetap::runtime::{
    ContextCreationError, ContextId, Frame, Location, Namespace, Runtime, TraceHook, Value,
};
use sidetap::{SessionBootstrap, SessionHandle, SessionRequest, TeardownToken};
use sidetap::session::BootstrapError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const PRIMARY: ContextId = ContextId::new(1);

/// In-memory host runtime with injectable failure points. Clones share state,
/// so a test keeps one handle for inspection while the manager owns another.
#[derive(Clone)]
pub struct ScriptedRuntime(Rc<RefCell<RtState>>);

struct RtState {
    initialized: bool,
    tracing: bool,
    fail_context_creation: bool,
    next_id: u64,
    current: ContextId,
    alive: Vec<ContextId>,
    ended: Vec<ContextId>,
    hooks: HashMap<ContextId, TraceHook>,
    redirects: HashMap<ContextId, Frame>,
    frames: HashMap<ContextId, Frame>,
    builtins: Value,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        ScriptedRuntime(Rc::new(RefCell::new(RtState {
            initialized: true,
            tracing: false,
            fail_context_creation: false,
            next_id: 2,
            current: PRIMARY,
            alive: vec![PRIMARY],
            ended: Vec::new(),
            hooks: HashMap::new(),
            redirects: HashMap::new(),
            frames: HashMap::new(),
            builtins: Value::new("builtin symbol table"),
        })))
    }

    pub fn uninitialized() -> Self {
        let rt = Self::new();
        rt.0.borrow_mut().initialized = false;
        rt
    }

    pub fn set_paused_frame(&self, frame: Frame) {
        self.0.borrow_mut().frames.insert(PRIMARY, frame);
    }

    pub fn set_tracing(&self, tracing: bool) {
        self.0.borrow_mut().tracing = tracing;
    }

    pub fn fail_context_creation(&self) {
        self.0.borrow_mut().fail_context_creation = true;
    }

    pub fn alive_count(&self) -> usize {
        self.0.borrow().alive.len()
    }

    pub fn ended(&self) -> Vec<ContextId> {
        self.0.borrow().ended.clone()
    }

    pub fn current(&self) -> ContextId {
        self.0.borrow().current
    }

    pub fn hook_on(&self, ctx: ContextId) -> Option<TraceHook> {
        self.0.borrow().hooks.get(&ctx).cloned()
    }

    pub fn redirect_of(&self, ctx: ContextId) -> Option<Frame> {
        self.0.borrow().redirects.get(&ctx).cloned()
    }
}

impl Runtime for ScriptedRuntime {
    fn is_initialized(&self) -> bool {
        self.0.borrow().initialized
    }

    fn tracing_in_progress(&self) -> bool {
        self.0.borrow().tracing
    }

    fn new_context(&mut self) -> Result<ContextId, ContextCreationError> {
        let mut state = self.0.borrow_mut();
        if state.fail_context_creation {
            return Err(ContextCreationError::new("out of memory"));
        }
        let id = ContextId::new(state.next_id);
        state.next_id += 1;
        state.alive.push(id);
        state.current = id;
        Ok(id)
    }

    fn end_context(&mut self, ctx: ContextId) {
        let mut state = self.0.borrow_mut();
        // The finalization protocol requires the target to be current.
        assert_eq!(state.current, ctx, "end_context on a non-current context");
        let position = state
            .alive
            .iter()
            .position(|&c| c == ctx)
            .expect("end_context on a dead context");
        state.alive.remove(position);
        state.ended.push(ctx);
        state.hooks.remove(&ctx);
        state.redirects.remove(&ctx);
        state.frames.remove(&ctx);
    }

    fn current_context(&self) -> ContextId {
        self.0.borrow().current
    }

    fn swap_current(&mut self, ctx: ContextId) -> ContextId {
        let mut state = self.0.borrow_mut();
        let prev = state.current;
        state.current = ctx;
        prev
    }

    fn trace_hook(&self, ctx: ContextId) -> Option<TraceHook> {
        self.0.borrow().hooks.get(&ctx).cloned()
    }

    fn set_trace_hook(&mut self, ctx: ContextId, hook: Option<TraceHook>) {
        let mut state = self.0.borrow_mut();
        match hook {
            Some(hook) => state.hooks.insert(ctx, hook),
            None => state.hooks.remove(&ctx),
        };
    }

    fn current_frame(&self, ctx: ContextId) -> Option<Frame> {
        let state = self.0.borrow();
        state
            .redirects
            .get(&ctx)
            .or_else(|| state.frames.get(&ctx))
            .cloned()
    }

    fn frame_redirect(&self, ctx: ContextId) -> Option<Frame> {
        self.0.borrow().redirects.get(&ctx).cloned()
    }

    fn set_frame_redirect(&mut self, ctx: ContextId, frame: Option<Frame>) {
        let mut state = self.0.borrow_mut();
        match frame {
            Some(frame) => state.redirects.insert(ctx, frame),
            None => state.redirects.remove(&ctx),
        };
    }

    fn minimal_globals(&self) -> Namespace {
        let mut ns = Namespace::new();
        ns.insert("builtins".to_string(), self.0.borrow().builtins.clone());
        ns
    }
}

pub fn paused_frame() -> Frame {
    let mut globals = Namespace::new();
    globals.insert("module_table".to_string(), Value::new(vec!["os", "sys"]));
    globals.insert("answer".to_string(), Value::new(42u64));
    let mut locals = Namespace::new();
    locals.insert("i".to_string(), Value::new(7u64));
    Frame::new(
        Location {
            file: "loop.rs".to_string(),
            line: 42,
            function: "busy_loop".to_string(),
        },
        globals,
        locals,
    )
}

/// Communication handle stub: owns the teardown token the way a remote
/// debugger's socket does.
#[derive(Default)]
pub struct TestHandle {
    token: RefCell<Option<TeardownToken>>,
}

impl TestHandle {
    /// Release the token, as the real handle does when the socket closes.
    pub fn close(&self) {
        self.token.borrow_mut().take();
    }

    /// Trigger teardown without releasing the token.
    pub fn fire(&self) {
        if let Some(token) = self.token.borrow().as_ref() {
            token.fire();
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.borrow().is_some()
    }
}

impl SessionHandle for TestHandle {
    fn bind_teardown(&self, token: TeardownToken) {
        *self.token.borrow_mut() = Some(token);
    }
}

/// What the bootstrap stub simulates.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BootstrapMode {
    Connect,
    FailImport,
    MissingEntry,
    ConnectionRefused,
    /// Produce a handle without instrumenting the calling context.
    NoHook,
}

/// Scope state as seen from inside the bootstrap call.
pub struct Observed {
    pub current_ctx: ContextId,
    pub visible_frame: Option<Frame>,
    pub global_keys: Vec<String>,
    pub locals_len: usize,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Debugger-helper stub. On success it installs a fresh trace hook on the
/// calling (secondary) context and retains the produced handle, exactly like
/// the real helper keeps its socket as its command stream.
pub struct StubBootstrap {
    mode: BootstrapMode,
    pub handle: RefCell<Option<Rc<TestHandle>>>,
    pub installed_hook: RefCell<Option<TraceHook>>,
    pub observed: RefCell<Option<Observed>>,
}

impl StubBootstrap {
    pub fn new(mode: BootstrapMode) -> Self {
        StubBootstrap {
            mode,
            handle: RefCell::new(None),
            installed_hook: RefCell::new(None),
            observed: RefCell::new(None),
        }
    }

    pub fn drop_handle(&self) {
        self.handle.borrow_mut().take();
    }
}

impl SessionBootstrap for StubBootstrap {
    fn start_remote_session(
        &self,
        rt: &mut dyn Runtime,
        request: SessionRequest,
    ) -> Result<Rc<dyn SessionHandle>, BootstrapError> {
        let current = rt.current_context();
        *self.observed.borrow_mut() = Some(Observed {
            current_ctx: current,
            visible_frame: rt.current_frame(current),
            global_keys: {
                let mut keys: Vec<_> = request.frame.globals_snapshot().into_keys().collect();
                keys.sort();
                keys
            },
            locals_len: request.frame.locals_snapshot().len(),
            host: request.host.clone(),
            port: request.port,
        });

        match self.mode {
            BootstrapMode::FailImport => Err(BootstrapError::Import(anyhow::anyhow!(
                "no module named 'remote_debugger'"
            ))),
            BootstrapMode::MissingEntry => Err(BootstrapError::EntryPointMissing(
                "start_remote_session".to_string(),
            )),
            BootstrapMode::ConnectionRefused => Err(BootstrapError::SessionStart(
                anyhow::anyhow!("connection refused"),
            )),
            BootstrapMode::Connect | BootstrapMode::NoHook => {
                if self.mode == BootstrapMode::Connect {
                    let hook = TraceHook::new(Rc::new(|_, _| {}), Value::new("trace state"));
                    rt.set_trace_hook(current, Some(hook.clone()));
                    *self.installed_hook.borrow_mut() = Some(hook);
                }
                let handle = Rc::new(TestHandle::default());
                *self.handle.borrow_mut() = Some(handle.clone());
                Ok(handle)
            }
        }
    }
}
