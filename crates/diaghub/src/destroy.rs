//! Privilege and capability gate for destructive operations.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::sock::DiagSocket;

/// Oracle answering whether the requesting context holds the elevated
/// network-administration privilege.
pub trait PrivilegeOracle: Send + Sync {
    /// True if the caller may destroy sockets.
    fn net_admin(&self) -> bool;
}

/// Gate in front of every socket destruction.
///
/// Handlers resolve the target socket from their request payload, then go
/// through [`destroy`](DestroyGate::destroy) rather than calling the
/// protocol operation directly.
pub struct DestroyGate {
    privileges: Arc<dyn PrivilegeOracle>,
}

impl DestroyGate {
    /// Create a gate backed by the given privilege oracle.
    pub fn new(privileges: Arc<dyn PrivilegeOracle>) -> Self {
        Self { privileges }
    }

    /// Destroy `sk`, reporting `code` to the destroyed peer.
    ///
    /// Fails with [`Error::PermissionDenied`] without the privilege and
    /// with [`Error::NotSupported`] when the socket's protocol exposes no
    /// destroy operation; otherwise delegates to the protocol and returns
    /// its result verbatim.
    pub fn destroy(&self, sk: &dyn DiagSocket, code: i32) -> Result<()> {
        if !self.privileges.net_admin() {
            return Err(Error::PermissionDenied(
                "destroying sockets requires the net-admin privilege".into(),
            ));
        }

        match sk.destroy(code) {
            Some(result) => result,
            None => Err(Error::NotSupported(
                "socket protocol has no destroy operation".into(),
            )),
        }
    }
}
