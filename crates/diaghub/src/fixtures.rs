//! Shared stubs for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicU64, AtomicUsize, Ordering};

use crate::attr::ReplyBuilder;
use crate::cookie::CookieCounter;
use crate::destroy::PrivilegeOracle;
use crate::error::Result;
use crate::handler::{CompatHandler, FamilyHandler, HandlerResolver};
use crate::message::{DiagRequest, NLMSG_HDRLEN, NlMsgHdr};
use crate::meminfo::MemSnapshot;
use crate::sock::DiagSocket;

/// Minimal socket collaborator: an own cookie slot, a namespace counter,
/// a canned meminfo snapshot, and an optional destroy recorder.
pub struct TestSocket {
    cookie: AtomicU64,
    counter: Arc<CookieCounter>,
    mem: MemSnapshot,
    can_destroy: bool,
    pub destroyed: AtomicBool,
    pub destroy_code: AtomicI32,
}

impl TestSocket {
    pub fn new() -> Self {
        Self::in_namespace(Arc::new(CookieCounter::new()))
    }

    pub fn in_namespace(counter: Arc<CookieCounter>) -> Self {
        Self {
            cookie: AtomicU64::new(0),
            counter,
            mem: MemSnapshot::default(),
            can_destroy: false,
            destroyed: AtomicBool::new(false),
            destroy_code: AtomicI32::new(0),
        }
    }

    pub fn with_meminfo(mut self, mem: MemSnapshot) -> Self {
        self.mem = mem;
        self
    }

    pub fn destroyable(mut self) -> Self {
        self.can_destroy = true;
        self
    }
}

impl DiagSocket for TestSocket {
    fn cookie_slot(&self) -> &AtomicU64 {
        &self.cookie
    }

    fn cookie_counter(&self) -> &CookieCounter {
        &self.counter
    }

    fn meminfo(&self) -> MemSnapshot {
        self.mem
    }

    fn destroy(&self, code: i32) -> Option<Result<()>> {
        if !self.can_destroy {
            return None;
        }
        self.destroyed.store(true, Ordering::Relaxed);
        self.destroy_code.store(code, Ordering::Relaxed);
        Some(Ok(()))
    }
}

/// Family handler counting its invocations.
#[derive(Default)]
pub struct StubHandler {
    pub dumps: AtomicUsize,
    pub destroys: AtomicUsize,
}

impl FamilyHandler for StubHandler {
    fn dump(&self, _request: &DiagRequest<'_>, _reply: &mut ReplyBuilder) -> Result<()> {
        self.dumps.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Compat handler counting its invocations.
#[derive(Default)]
pub struct StubCompat {
    pub calls: AtomicUsize,
}

impl CompatHandler for StubCompat {
    fn handle(&self, _request: &DiagRequest<'_>, _reply: &mut ReplyBuilder) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Resolver recording how often and for which family it fired.
#[derive(Default)]
pub struct CountingResolver {
    pub calls: AtomicUsize,
    pub last_family: AtomicU8,
}

impl HandlerResolver for CountingResolver {
    fn resolve(&self, family: u8) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.last_family.store(family, Ordering::Relaxed);
    }
}

/// Privilege oracle with a fixed answer.
pub struct StaticPrivileges {
    pub net_admin: bool,
}

impl PrivilegeOracle for StaticPrivileges {
    fn net_admin(&self) -> bool {
        self.net_admin
    }
}

/// Wire bytes for a command request: netlink header plus the fixed
/// 4-byte request header naming `family`.
pub fn request_bytes(msg_type: u16, family: u8, seq: u32) -> Vec<u8> {
    let payload = [family, 0, 0, 0];
    let mut header = NlMsgHdr::new(msg_type, 0);
    header.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
    header.nlmsg_seq = seq;
    let mut buf = header.as_bytes().to_vec();
    buf.extend_from_slice(&payload);
    buf
}
