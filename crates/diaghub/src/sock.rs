//! The socket seam consumed by the diagnostics core.

use std::sync::atomic::AtomicU64;

use crate::cookie::CookieCounter;
use crate::error::Result;
use crate::meminfo::MemSnapshot;

/// Socket state this core reads or acts on.
///
/// Sockets, their namespaces, and their protocol implementations live
/// outside this crate; this trait is the narrow surface the cookie
/// operations, the meminfo encoder, and the destroy gate need.
pub trait DiagSocket {
    /// Lazily assigned identity cookie; zero until first use. Once set it
    /// never changes for the socket's lifetime.
    fn cookie_slot(&self) -> &AtomicU64;

    /// The monotonic cookie source of the socket's owning namespace.
    fn cookie_counter(&self) -> &CookieCounter;

    /// Instantaneous memory accounting snapshot. Fields may be mutually
    /// inconsistent under concurrent socket activity.
    fn meminfo(&self) -> MemSnapshot;

    /// Protocol-level destroy operation, if the protocol has one.
    ///
    /// `code` is the error reported to the destroyed peer (for example a
    /// connection-reset reason). `None` means the protocol implements no
    /// destroy operation at all.
    fn destroy(&self, code: i32) -> Option<Result<()>>;
}
