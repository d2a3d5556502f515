//! Dispatch registry for socket diagnostics over a control-plane channel.
//!
//! This crate is the demultiplexing core of a NETLINK_SOCK_DIAG-shaped
//! diagnostics service: protocol modules register a handler per address
//! family, a transport feeds raw request bytes into [`DiagService`], and
//! the service routes each request (dump or destroy) to the right
//! handler while holding it stable against concurrent unregistration. Two
//! legacy message types are served by a single global compat handler
//! outside the per-family table.
//!
//! It also owns the per-socket identity cookie (see [`cookie`]): a lazily
//! assigned, never-reused 64-bit value diagnostic clients use to detect
//! that a socket they previously observed has been recycled.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use diaghub::{DiagRegistry, DiagService, FamilyHandler, PrivilegeOracle};
//! use diaghub::attr::ReplyBuilder;
//! use diaghub::message::DiagRequest;
//!
//! struct InetDiag;
//!
//! impl FamilyHandler for InetDiag {
//!     fn dump(&self, _req: &DiagRequest<'_>, reply: &mut ReplyBuilder) -> diaghub::Result<()> {
//!         reply.put_attr_u32(1, 42)
//!     }
//! }
//!
//! struct NoPrivileges;
//! impl PrivilegeOracle for NoPrivileges {
//!     fn net_admin(&self) -> bool { false }
//! }
//!
//! let registry = Arc::new(DiagRegistry::new());
//! registry.register(libc::AF_INET as u8, Arc::new(InetDiag))?;
//!
//! let service = DiagService::new(registry, Arc::new(NoPrivileges));
//! // `service.receive(bytes)` is what the transport calls per request.
//! # Ok::<(), diaghub::Error>(())
//! ```
//!
//! # Concurrency
//!
//! Request processing is single-flight per service; the registry lock is
//! held across each handler invocation, so handlers must never register
//! or unregister from inside their own dump/destroy. Cookie assignment is
//! lock-free. On-demand handler resolution runs outside every lock.

pub mod attr;
pub mod cookie;
pub mod destroy;
pub mod error;
pub mod handler;
pub mod meminfo;
pub mod message;
pub mod registry;
pub mod service;
pub mod sock;

#[cfg(test)]
mod fixtures;

pub use destroy::{DestroyGate, PrivilegeOracle};
pub use error::{Error, Result};
pub use handler::{CompatHandler, FamilyHandler, HandlerResolver};
pub use meminfo::MemSnapshot;
pub use registry::{DiagRegistry, HandlerGuard, MAX_FAMILY};
pub use service::DiagService;
pub use sock::DiagSocket;
