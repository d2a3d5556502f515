//! The transport-facing receive pipeline and command dispatcher.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::attr::ReplyBuilder;
use crate::destroy::{DestroyGate, PrivilegeOracle};
use crate::error::{Error, Result};
use crate::message::{
    DCCPDIAG_GETSOCK, DiagRequest, SOCK_DESTROY, SOCK_DIAG_BY_FAMILY, TCPDIAG_GETSOCK,
};
use crate::registry::{DiagRegistry, MAX_FAMILY};

/// Default reply byte budget, sized like one transport receive buffer.
pub const DEFAULT_REPLY_CAPACITY: usize = 4096;

/// Diagnostic request service: one instance per control channel.
///
/// [`receive`](Self::receive) is the single entry point the transport
/// invokes with raw request bytes. Processing is strictly single-flight:
/// an internal mutex serializes all dispatch, so at most one request is
/// in flight per service instance. Handler calls run to completion; there
/// is no cancellation or timeout at this layer.
pub struct DiagService {
    registry: Arc<DiagRegistry>,
    gate: DestroyGate,
    reply_capacity: usize,
    rcv_lock: Mutex<()>,
}

impl DiagService {
    /// Create a service dispatching into `registry`, with destroy
    /// requests gated by `privileges`.
    pub fn new(registry: Arc<DiagRegistry>, privileges: Arc<dyn PrivilegeOracle>) -> Self {
        Self {
            registry,
            gate: DestroyGate::new(privileges),
            reply_capacity: DEFAULT_REPLY_CAPACITY,
            rcv_lock: Mutex::new(()),
        }
    }

    /// Override the reply byte budget.
    pub fn with_reply_capacity(mut self, capacity: usize) -> Self {
        self.reply_capacity = capacity;
        self
    }

    /// The registry this service dispatches into.
    pub fn registry(&self) -> &Arc<DiagRegistry> {
        &self.registry
    }

    /// Process one raw request and return the reply bytes.
    ///
    /// Destroy requests produce an empty reply; the transport
    /// acknowledges them from the returned result (see
    /// [`encode_ack`](crate::message::encode_ack)). Unknown message types
    /// are rejected before any lock is taken or any lookup performed.
    pub fn receive(&self, buf: &[u8]) -> Result<Vec<u8>> {
        let request = DiagRequest::parse(buf)?;

        match request.msg_type() {
            TCPDIAG_GETSOCK | DCCPDIAG_GETSOCK | SOCK_DIAG_BY_FAMILY | SOCK_DESTROY => {}
            other => {
                debug!(msg_type = other, "rejecting unknown message type");
                return Err(Error::InvalidArgument(format!(
                    "unknown message type {other}"
                )));
            }
        }

        let _serial = self.rcv_lock.lock().expect("receive mutex poisoned");
        self.dispatch(&request)
    }

    fn dispatch(&self, request: &DiagRequest<'_>) -> Result<Vec<u8>> {
        match request.msg_type() {
            TCPDIAG_GETSOCK | DCCPDIAG_GETSOCK => {
                let mut reply = self.reply(request);
                self.registry.dispatch_compat(request, &mut reply)?;
                Ok(reply.finish())
            }
            _ => self.command(request),
        }
    }

    /// Family-routed command path: dump or destroy.
    fn command(&self, request: &DiagRequest<'_>) -> Result<Vec<u8>> {
        let family = request.req_header()?.family;
        if family >= MAX_FAMILY {
            return Err(Error::bad_family(family));
        }

        let held = self.registry.lookup_and_hold(family)?;
        let handler = held.handler().ok_or(Error::NotFound { family })?;

        match request.msg_type() {
            SOCK_DIAG_BY_FAMILY => {
                let mut reply = self.reply(request);
                handler.dump(request, &mut reply)?;
                Ok(reply.finish())
            }
            SOCK_DESTROY if handler.supports_destroy() => {
                handler.destroy(request, &self.gate)?;
                Ok(Vec::new())
            }
            _ => Err(Error::NotSupported(format!(
                "family {family} does not implement the requested operation"
            ))),
        }
        // `held` drops here: the handler hold is released on every exit
        // path, including the error paths above.
    }

    fn reply(&self, request: &DiagRequest<'_>) -> ReplyBuilder {
        let mut reply = ReplyBuilder::new(SOCK_DIAG_BY_FAMILY, self.reply_capacity);
        reply.set_seq(request.seq());
        reply
    }
}
