//! The per-family handler table and the legacy compat slot.
//!
//! One mutex guards both. The lock is held for the entire duration a
//! looked-up handler is in use; that hold, not the table read, is what
//! keeps an unregister from invalidating a handler mid-call. The price is
//! a re-entrancy constraint: handler code must never register or
//! unregister from inside its own dump/destroy invocation.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::attr::ReplyBuilder;
use crate::error::{Error, Result};
use crate::handler::{CompatHandler, FamilyHandler, HandlerResolver};
use crate::message::DiagRequest;

/// Exclusive upper bound of the family tag domain.
///
/// Mirrors the kernel's `AF_MAX` (the length of `sock_diag_handlers[]`).
/// `libc` does not export `AF_MAX` for the linux-gnu target, so the ABI
/// value is inlined here rather than pulled from the crate.
pub const MAX_FAMILY: u8 = 45;

/// Family the compat path fires lazy resolution for. The legacy message
/// types predate per-family routing and are always resolved against inet.
const COMPAT_RESOLVE_FAMILY: u8 = libc::AF_INET as u8;

struct Slots {
    handlers: [Option<Arc<dyn FamilyHandler>>; MAX_FAMILY as usize],
    compat: Option<Arc<dyn CompatHandler>>,
}

/// Registry mapping family tags to diagnostic handlers.
pub struct DiagRegistry {
    slots: Mutex<Slots>,
    resolver: Option<Arc<dyn HandlerResolver>>,
}

impl Default for DiagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagRegistry {
    /// Create an empty registry with no resolution hook.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                handlers: std::array::from_fn(|_| None),
                compat: None,
            }),
            resolver: None,
        }
    }

    /// Create an empty registry that fires `resolver` when a lookup finds
    /// no handler for a family.
    pub fn with_resolver(resolver: Arc<dyn HandlerResolver>) -> Self {
        Self {
            resolver: Some(resolver),
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().expect("registry mutex poisoned")
    }

    fn resolve(&self, family: u8) {
        if let Some(resolver) = &self.resolver {
            debug!(family, "requesting handler provider");
            resolver.resolve(family);
        }
    }

    /// Register `handler` for `family`.
    ///
    /// Fails with [`Error::InvalidArgument`] for an out-of-range family
    /// and [`Error::AlreadyRegistered`] if the slot is occupied; the table
    /// is untouched on failure.
    pub fn register(&self, family: u8, handler: Arc<dyn FamilyHandler>) -> Result<()> {
        if family >= MAX_FAMILY {
            return Err(Error::bad_family(family));
        }

        let mut slots = self.lock();
        let slot = &mut slots.handlers[family as usize];
        if slot.is_some() {
            return Err(Error::AlreadyRegistered { family });
        }
        *slot = Some(handler);
        debug!(family, "diag handler registered");
        Ok(())
    }

    /// Unregister the handler occupying `family`.
    ///
    /// Out-of-range families are silently ignored (unregistration runs
    /// during teardown). Presenting a handler that does not occupy the
    /// slot is a contract violation and panics: the registry's
    /// bookkeeping has been corrupted by caller code and there is no safe
    /// continuation.
    pub fn unregister(&self, family: u8, handler: &Arc<dyn FamilyHandler>) {
        if family >= MAX_FAMILY {
            return;
        }

        let mut slots = self.lock();
        match slots.handlers[family as usize].take() {
            Some(occupant) => assert!(
                Arc::ptr_eq(&occupant, handler),
                "unregister of family {family} by a handler that does not occupy the slot"
            ),
            None => panic!("unregister of family {family} with no handler registered"),
        }
        debug!(family, "diag handler unregistered");
    }

    /// Look up the handler for `family` and hold the registry lock for
    /// the duration of its use.
    ///
    /// If the slot is observed empty, the resolver is fired first, outside
    /// the lock since provisioning can block indefinitely, to cover the
    /// case where a provider simply has not been loaded yet.
    /// The returned guard may still hold no handler.
    pub fn lookup_and_hold(&self, family: u8) -> Result<HandlerGuard<'_>> {
        if family >= MAX_FAMILY {
            return Err(Error::bad_family(family));
        }

        let slots = self.lock();
        if slots.handlers[family as usize].is_some() {
            return Ok(HandlerGuard { slots, family });
        }

        drop(slots);
        self.resolve(family);
        Ok(HandlerGuard {
            slots: self.lock(),
            family,
        })
    }

    /// Install the compat handler, replacing any existing one.
    pub fn register_compat(&self, handler: Arc<dyn CompatHandler>) {
        self.lock().compat = Some(handler);
        debug!("compat handler registered");
    }

    /// Clear the compat slot.
    ///
    /// Unlike [`unregister`](Self::unregister), the identity of `_handler`
    /// is not checked: whatever is installed is removed. A long-standing
    /// asymmetry with the per-family table, kept as-is.
    pub fn unregister_compat(&self, _handler: &Arc<dyn CompatHandler>) {
        self.lock().compat = None;
        debug!("compat handler unregistered");
    }

    /// Route a legacy request to the compat handler.
    ///
    /// When the slot is observed empty, resolution is attempted for the
    /// canonical default family before taking the lock; with the slot
    /// still empty afterwards the request fails [`Error::NotSupported`].
    /// The handler runs under the registry lock.
    pub fn dispatch_compat(
        &self,
        request: &DiagRequest<'_>,
        reply: &mut ReplyBuilder,
    ) -> Result<()> {
        let mut slots = self.lock();
        if slots.compat.is_none() {
            drop(slots);
            self.resolve(COMPAT_RESOLVE_FAMILY);
            slots = self.lock();
        }

        match &slots.compat {
            Some(handler) => handler.handle(request, reply),
            None => Err(Error::NotSupported(
                "no compat handler for legacy diagnostics".into(),
            )),
        }
    }
}

/// Scoped hold on a looked-up handler.
///
/// Owns the registry lock; dropping the guard releases it on every exit
/// path, which is what allows a pending unregister to proceed.
pub struct HandlerGuard<'a> {
    slots: MutexGuard<'a, Slots>,
    family: u8,
}

impl HandlerGuard<'_> {
    /// The current occupant of the held slot, if any.
    pub fn handler(&self) -> Option<&Arc<dyn FamilyHandler>> {
        self.slots.handlers[self.family as usize].as_ref()
    }
}
