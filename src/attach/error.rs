use crate::runtime::ContextCreationError;
use crate::session::BootstrapError;

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    // --------------------------------- guard rejections ------------------------------------------
    #[error("runtime is not initialized")]
    NotInitialized,
    #[error("a remote debugging session is already active")]
    AlreadyActive,

    // --------------------------------- address errors --------------------------------------------
    #[error("invalid remote address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    // --------------------------------- context errors --------------------------------------------
    #[error(transparent)]
    ContextCreation(#[from] ContextCreationError),

    // --------------------------------- helper bootstrap errors -----------------------------------
    #[error("debugger helper import failed: {0}")]
    HelperImport(anyhow::Error),
    #[error("debugger helper has no entry point '{0}'")]
    HelperEntryPointMissing(String),
    #[error("remote session start failed: {0}")]
    SessionStart(anyhow::Error),

    // --------------------------------- bridge errors ---------------------------------------------
    /// The helper produced a handle but never instrumented its own context.
    /// This is an internal invariant violation, not a transient condition.
    #[error("internal error - instrumentation hook not set")]
    HookNotInstalled,
}

impl From<BootstrapError> for AttachError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::Import(e) => AttachError::HelperImport(e),
            BootstrapError::EntryPointMissing(name) => AttachError::HelperEntryPointMissing(name),
            BootstrapError::SessionStart(e) => AttachError::SessionStart(e),
        }
    }
}
