//! Capability traits at the dispatch seams.
//!
//! A [`FamilyHandler`] is what a protocol module registers for its family;
//! a [`CompatHandler`] serves the two legacy message types outside the
//! per-family table; a [`HandlerResolver`] is the injected "try to load a
//! provider" hook fired when a lookup finds an empty slot.

use crate::attr::ReplyBuilder;
use crate::destroy::DestroyGate;
use crate::error::{Error, Result};
use crate::message::DiagRequest;

/// Per-family diagnostic handler.
///
/// Registered as `Arc<dyn FamilyHandler>`; the `Arc` identity is what
/// `unregister` checks. The registry lock is held for the whole duration
/// of a `dump`/`destroy` call, so implementations must not register or
/// unregister handlers from inside either (same-lock deadlock).
pub trait FamilyHandler: Send + Sync {
    /// Produce a diagnostic snapshot for sockets of this family.
    ///
    /// The request payload past the fixed header is protocol-specific and
    /// arrives unparsed. The result is propagated to the transport
    /// verbatim.
    fn dump(&self, request: &DiagRequest<'_>, reply: &mut ReplyBuilder) -> Result<()>;

    /// Whether this family implements socket destruction.
    fn supports_destroy(&self) -> bool {
        false
    }

    /// Terminate the socket named by the request.
    ///
    /// Only invoked when [`supports_destroy`](Self::supports_destroy)
    /// returns true; the implementation resolves its socket from the
    /// payload and goes through `gate` for the privilege check.
    fn destroy(&self, _request: &DiagRequest<'_>, _gate: &DestroyGate) -> Result<()> {
        Err(Error::NotSupported("destroy".into()))
    }
}

/// Global fallback handler for the two legacy request types.
pub trait CompatHandler: Send + Sync {
    /// Serve one legacy request.
    fn handle(&self, request: &DiagRequest<'_>, reply: &mut ReplyBuilder) -> Result<()>;
}

/// On-demand provisioning hook for families with no registered handler.
///
/// Invoked outside any registry lock, since provisioning may block for an
/// unbounded time. Fire-and-forget: the outcome is never observed, only
/// the subsequent lookup result matters.
pub trait HandlerResolver: Send + Sync {
    /// Best-effort attempt to provision a handler for `family`.
    fn resolve(&self, family: u8);
}
