//! Netlink attribute handling and reply construction.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};
use crate::message::{NLMSG_HDRLEN, NlMsgHdr};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// Builder for a netlink-framed diagnostic reply with a hard byte budget.
///
/// The budget models the destination buffer a transport hands out for one
/// response message; an attribute that would not fit fails with
/// [`Error::SizeExceeded`] and leaves the reply untouched.
#[derive(Debug, Clone)]
pub struct ReplyBuilder {
    buf: Vec<u8>,
    capacity: usize,
}

impl ReplyBuilder {
    /// Create a reply of the given message type, bounded by `capacity`
    /// bytes including the netlink header.
    pub fn new(msg_type: u16, capacity: usize) -> Self {
        debug_assert!(capacity >= NLMSG_HDRLEN);
        let header = NlMsgHdr::new(msg_type, 0);
        let mut buf = Vec::with_capacity(capacity.min(4096));
        buf.extend_from_slice(header.as_bytes());
        Self { buf, capacity }
    }

    /// Set the sequence number echoed from the request.
    pub fn set_seq(&mut self, seq: u32) {
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
    }

    /// Current reply length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the reply is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Remaining byte budget.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Append an attribute with the given type and payload.
    ///
    /// Fails with [`Error::SizeExceeded`] if the aligned attribute would
    /// overflow the reply capacity; nothing is written in that case.
    pub fn put_attr(&mut self, attr_type: u16, data: &[u8]) -> Result<()> {
        let needed = nla_align(NLA_HDRLEN + data.len());
        if self.buf.len() + needed > self.capacity {
            return Err(Error::SizeExceeded {
                limit: self.capacity,
            });
        }

        let attr = NlAttr::new(attr_type, data.len());
        self.buf.extend_from_slice(attr.as_bytes());
        self.buf.extend_from_slice(data);
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
        Ok(())
    }

    /// Append a u32 attribute (host order).
    pub fn put_attr_u32(&mut self, attr_type: u16, value: u32) -> Result<()> {
        self.put_attr(attr_type, &value.to_ne_bytes())
    }

    /// Append a u64 attribute (host order).
    pub fn put_attr_u64(&mut self, attr_type: u16, value: u64) -> Result<()> {
        self.put_attr(attr_type, &value.to_ne_bytes())
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finalize and return the reply bytes with the length patched in.
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        self.buf
    }
}

/// Iterator over netlink attributes in a reply payload.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    /// Returns (attribute type, payload data).
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < NLA_HDRLEN {
            return None;
        }

        let attr = NlAttr::read_from_prefix(self.data).map(|(a, _)| a).ok()?;

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);

        // Move to next attribute
        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some((attr.nla_type, payload))
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use crate::error::{Error, Result};

    /// Extract a u32 value (host order).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(Error::InvalidArgument("truncated u32 attribute".into()));
        }
        Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a u64 value (host order).
    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        if data.len() < 8 {
            return Err(Error::InvalidArgument("truncated u64 attribute".into()));
        }
        Ok(u64::from_ne_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ]))
    }
}
