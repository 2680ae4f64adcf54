use super::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// String-keyed table of runtime objects (a globals, locals or builtins table).
pub type Namespace = HashMap<String, Value>;

/// Source position of a paused point of execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// One paused point of execution in the host runtime.
///
/// A frame is a shared view: clones refer to the same underlying frame, and a
/// namespace substitution made through one clone is observed through all of
/// them. This is what lets a helper running in a secondary context resolve
/// names against the primary context's paused frame.
#[derive(Clone)]
pub struct Frame(Rc<RefCell<FrameData>>);

struct FrameData {
    location: Location,
    globals: Namespace,
    locals: Namespace,
}

impl Frame {
    pub fn new(location: Location, globals: Namespace, locals: Namespace) -> Self {
        Frame(Rc::new(RefCell::new(FrameData {
            location,
            globals,
            locals,
        })))
    }

    pub fn location(&self) -> Location {
        self.0.borrow().location.clone()
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.0.borrow().globals.get(name).cloned()
    }

    pub fn local(&self, name: &str) -> Option<Value> {
        self.0.borrow().locals.get(name).cloned()
    }

    /// Shallow copy of the globals table. Values are shared handles.
    pub fn globals_snapshot(&self) -> Namespace {
        self.0.borrow().globals.clone()
    }

    /// Shallow copy of the locals table. Values are shared handles.
    pub fn locals_snapshot(&self) -> Namespace {
        self.0.borrow().locals.clone()
    }

    /// Install `new` as the globals table and return the table it replaces.
    pub fn replace_globals(&self, new: Namespace) -> Namespace {
        std::mem::replace(&mut self.0.borrow_mut().globals, new)
    }

    /// Install `new` as the locals table and return the table it replaces.
    pub fn replace_locals(&self, new: Namespace) -> Namespace {
        std::mem::replace(&mut self.0.borrow_mut().locals, new)
    }

    /// True if both handles refer to the same underlying frame.
    pub fn same_frame(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Frame")
            .field("location", &data.location)
            .field("globals", &data.globals.len())
            .field("locals", &data.locals.len())
            .finish()
    }
}
