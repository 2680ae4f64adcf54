//! Interfaces to the external debugger helper and its transport.
//!
//! The helper is the component that actually speaks to the remote front-end:
//! it opens the transport and installs an instrumentation hook on the calling
//! context. This crate only bootstraps it inside an isolated context and
//! splices the hook back, so the helper is consumed behind [`SessionBootstrap`]
//! and the transport behind [`SessionHandle`].

use crate::attach::error::AttachError;
use crate::attach::TeardownToken;
use crate::runtime::{Frame, Runtime};
use std::rc::Rc;

/// Default remote endpoint, used when the registration or the caller leaves
/// host/port unset.
pub const DFLT_HOST: &str = "127.0.0.1";
pub const DFLT_PORT: u16 = 7935;

/// Remote endpoint parsed from a `"<host> <port>"` textual address.
///
/// The format tolerates one or two whitespace-separated tokens: a lone token
/// is the host, an empty string leaves both parts unset (the helper applies
/// its defaults). Tokens past the second are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteAddress {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl RemoteAddress {
    pub fn parse(address: &str) -> Result<Self, AttachError> {
        let mut tokens = address.split_whitespace();

        let host = tokens.next().map(str::to_string);
        let port = match tokens.next() {
            None => None,
            Some(tok) => Some(tok.parse::<u16>().map_err(|e| AttachError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?),
        };

        Ok(RemoteAddress { host, port })
    }
}

/// What the helper needs to start a remote session: the endpoint to listen on
/// and the primary context's paused frame to debug.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub frame: Frame,
}

/// Failure reported by the helper bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The helper module could not be imported into the calling context.
    #[error("debugger helper import failed: {0}")]
    Import(anyhow::Error),

    /// The helper module was imported but lacks the expected entry point.
    #[error("debugger helper has no entry point '{0}'")]
    EntryPointMissing(String),

    /// The entry point ran but no communication handle was produced
    /// (e.g. the remote endpoint refused the connection).
    #[error("remote session start failed: {0}")]
    SessionStart(anyhow::Error),
}

/// The debugger helper bootstrap callable.
///
/// `start_remote_session` is invoked while the secondary context is current
/// and with a relaxed-scope window open on the primary frame. On success it
/// must have installed an instrumentation hook on the calling context and
/// must keep its own reference to the returned handle, exactly like a remote
/// debugger keeps its socket as its command stream.
pub trait SessionBootstrap {
    fn start_remote_session(
        &self,
        rt: &mut dyn Runtime,
        request: SessionRequest,
    ) -> Result<Rc<dyn SessionHandle>, BootstrapError>;
}

/// The live transport to the remote front-end.
///
/// The handle is opaque except for one obligation: it stores the teardown
/// token handed to it by [`bind_teardown`](SessionHandle::bind_teardown), so
/// that its own natural close/release path drops the token and with it the
/// secondary execution context. No other subsystem-specific logic is needed
/// on the helper side.
pub trait SessionHandle {
    fn bind_teardown(&self, token: TeardownToken);
}
