//! Socket cookies: stable, unique, lazily assigned 64-bit identifiers.
//!
//! Diagnostic clients hold on to a cookie across requests to detect that a
//! socket they previously observed has been recycled rather than being the
//! same object. Assignment is lock-free: concurrent first readers race on
//! a compare-and-swap, exactly one drawn value wins, and losers discard
//! their draw and return the winner's.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::sock::DiagSocket;

/// Sentinel half meaning "caller never learned a cookie".
pub const NO_COOKIE: u32 = !0;

/// Per-namespace monotonic cookie source.
///
/// Owned by the namespace lifecycle, not by this core; sockets sharing a
/// counter never observe equal non-zero cookies. Races waste counter
/// values but never reuse them.
#[derive(Debug, Default)]
pub struct CookieCounter(AtomicU64);

impl CookieCounter {
    /// Create a counter starting at zero; the first issued value is 1.
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Read the socket's cookie, assigning one on first use.
///
/// Never blocks, never allocates; terminates with the single canonical
/// non-zero value for the socket.
pub fn generate(sk: &dyn DiagSocket) -> u64 {
    loop {
        let current = sk.cookie_slot().load(Ordering::Relaxed);
        if current != 0 {
            return current;
        }
        let fresh = sk.cookie_counter().next();
        // A lost race wastes `fresh`; the next iteration reads the winner.
        let _ = sk
            .cookie_slot()
            .compare_exchange(0, fresh, Ordering::Relaxed, Ordering::Relaxed);
    }
}

/// Check a candidate `[low, high]` cookie pair against the socket.
///
/// A pair of [`NO_COOKIE`] halves is a wildcard that always succeeds;
/// callers that never learned a cookie must still be served. Any other
/// pair must match the canonical cookie bit-exactly, else [`Error::Stale`].
pub fn check(sk: &dyn DiagSocket, cookie: [u32; 2]) -> Result<()> {
    if cookie[0] == NO_COOKIE && cookie[1] == NO_COOKIE {
        return Ok(());
    }

    let canonical = generate(sk);
    if canonical as u32 != cookie[0] || (canonical >> 32) as u32 != cookie[1] {
        return Err(Error::Stale);
    }

    Ok(())
}

/// The canonical cookie as a `[low, high]` pair, assigning if unset.
pub fn save(sk: &dyn DiagSocket) -> [u32; 2] {
    let canonical = generate(sk);
    [canonical as u32, (canonical >> 32) as u32]
}
