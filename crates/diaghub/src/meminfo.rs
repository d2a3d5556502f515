//! Socket memory-accounting snapshot encoding.

use crate::attr::ReplyBuilder;
use crate::error::Result;
use crate::sock::DiagSocket;

/// Number of fields in the meminfo block.
pub const SK_MEMINFO_VARS: usize = 7;

/// Instantaneous memory accounting snapshot for one socket.
///
/// Field order is the wire order. The snapshot is read without
/// synchronization against socket activity, so individual fields may be
/// momentarily inconsistent with each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemSnapshot {
    /// Received memory currently allocated.
    pub rmem_alloc: u32,
    /// Receive buffer limit.
    pub rcvbuf: u32,
    /// Sent memory currently allocated.
    pub wmem_alloc: u32,
    /// Send buffer limit.
    pub sndbuf: u32,
    /// Forward-allocated memory.
    pub fwd_alloc: u32,
    /// Memory queued for sending.
    pub wmem_queued: u32,
    /// Other (option) memory allocated.
    pub optmem: u32,
}

impl MemSnapshot {
    /// The seven fields in wire order.
    pub fn as_array(&self) -> [u32; SK_MEMINFO_VARS] {
        [
            self.rmem_alloc,
            self.rcvbuf,
            self.wmem_alloc,
            self.sndbuf,
            self.fwd_alloc,
            self.wmem_queued,
            self.optmem,
        ]
    }
}

/// Append the meminfo block for `sk` to `reply` as attribute `attr_type`.
///
/// Emits exactly [`SK_MEMINFO_VARS`] consecutive host-order u32 fields.
/// Fails with [`SizeExceeded`](crate::Error::SizeExceeded), writing
/// nothing, if the reply cannot accommodate the block.
pub fn put_meminfo(sk: &dyn DiagSocket, reply: &mut ReplyBuilder, attr_type: u16) -> Result<()> {
    let fields = sk.meminfo().as_array();
    let mut payload = [0u8; SK_MEMINFO_VARS * 4];
    for (chunk, value) in payload.chunks_exact_mut(4).zip(fields) {
        chunk.copy_from_slice(&value.to_ne_bytes());
    }
    reply.put_attr(attr_type, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{AttrIter, ReplyBuilder, get};
    use crate::error::Error;
    use crate::fixtures::TestSocket;
    use crate::message::{NLMSG_HDRLEN, SOCK_DIAG_BY_FAMILY};

    fn snapshot() -> MemSnapshot {
        MemSnapshot {
            rmem_alloc: 1,
            rcvbuf: 2,
            wmem_alloc: 3,
            sndbuf: 4,
            fwd_alloc: 5,
            wmem_queued: 6,
            optmem: 7,
        }
    }

    #[test]
    fn test_put_meminfo_field_order() {
        let sk = TestSocket::new().with_meminfo(snapshot());
        let mut reply = ReplyBuilder::new(SOCK_DIAG_BY_FAMILY, 256);
        put_meminfo(&sk, &mut reply, 7).unwrap();
        let buf = reply.finish();

        let (attr_type, payload) = AttrIter::new(&buf[NLMSG_HDRLEN..]).next().unwrap();
        assert_eq!(attr_type, 7);
        assert_eq!(payload.len(), SK_MEMINFO_VARS * 4);

        let fields: Vec<u32> = payload
            .chunks_exact(4)
            .map(|c| get::u32_ne(c).unwrap())
            .collect();
        assert_eq!(fields, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_put_meminfo_undersized_destination() {
        let sk = TestSocket::new().with_meminfo(snapshot());
        // Room for the header but not for a 7-field block.
        let mut reply = ReplyBuilder::new(SOCK_DIAG_BY_FAMILY, NLMSG_HDRLEN + 16);
        let before = reply.as_bytes().to_vec();

        let err = put_meminfo(&sk, &mut reply, 7).unwrap_err();
        assert!(matches!(err, Error::SizeExceeded { .. }));
        assert_eq!(reply.as_bytes(), &before[..]);
    }
}
