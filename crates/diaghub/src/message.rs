//! Netlink message framing for diagnostic requests.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Error message or ACK.
pub const NLMSG_ERROR: u16 = 2;

/// Legacy TCP diagnostics request, served by the compat handler.
pub const TCPDIAG_GETSOCK: u16 = 18;
/// Legacy DCCP diagnostics request, served by the compat handler.
pub const DCCPDIAG_GETSOCK: u16 = 19;
/// Dump diagnostic state for sockets of one family.
pub const SOCK_DIAG_BY_FAMILY: u16 = 20;
/// Destroy a specific socket.
pub const SOCK_DESTROY: u16 = 21;

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type.
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse a header from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(hdr, _)| hdr)
            .map_err(|_| {
                Error::InvalidArgument(format!(
                    "message shorter than netlink header: {} bytes",
                    data.len()
                ))
            })
    }
}

/// Fixed request header carried at the start of every command payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct DiagReqHeader {
    /// Protocol family the request targets.
    pub family: u8,
    /// Reserved, must-be-zero padding.
    pub reserved: [u8; 3],
}

/// Minimum command payload length.
pub const DIAG_REQ_HDRLEN: usize = std::mem::size_of::<DiagReqHeader>();

/// A parsed inbound diagnostic request.
///
/// Borrows the transport buffer; the payload is opaque to the dispatcher
/// beyond the leading [`DiagReqHeader`] and is handed to the resolved
/// handler untouched.
#[derive(Debug, Clone, Copy)]
pub struct DiagRequest<'a> {
    header: NlMsgHdr,
    payload: &'a [u8],
}

impl<'a> DiagRequest<'a> {
    /// Parse one netlink-framed request from `buf`.
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let header = NlMsgHdr::from_bytes(buf)?;
        let len = header.nlmsg_len as usize;
        if len < NLMSG_HDRLEN || len > buf.len() {
            return Err(Error::InvalidArgument(format!(
                "bad message length {len} in a {}-byte buffer",
                buf.len()
            )));
        }
        Ok(Self {
            header,
            payload: &buf[NLMSG_HDRLEN..len],
        })
    }

    /// The netlink header of this request.
    pub fn header(&self) -> &NlMsgHdr {
        &self.header
    }

    /// The message type tag.
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }

    /// The request sequence number, echoed into replies.
    pub fn seq(&self) -> u32 {
        self.header.nlmsg_seq
    }

    /// The payload following the netlink header.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// The fixed request header at the start of the payload.
    ///
    /// Fails if the payload is shorter than the minimum header size.
    pub fn req_header(&self) -> Result<DiagReqHeader> {
        DiagReqHeader::read_from_prefix(self.payload)
            .map(|(hdr, _)| hdr)
            .map_err(|_| {
                Error::InvalidArgument(format!(
                    "request payload shorter than {DIAG_REQ_HDRLEN} bytes"
                ))
            })
    }
}

/// Netlink error message payload: negative errno (0 for ACK) followed by
/// the header of the message being acknowledged.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Original message header that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Parse an error payload from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(err, _)| err)
            .map_err(|_| {
                Error::InvalidArgument(format!(
                    "error payload shorter than {} bytes",
                    std::mem::size_of::<Self>()
                ))
            })
    }

    /// Check if this is an ACK (no error).
    pub fn is_ack(&self) -> bool {
        self.error == 0
    }
}

/// Build the NLMSG_ERROR acknowledgement a transport sends back after a
/// request has been processed.
///
/// `error` of `None` encodes a success ACK (error field 0).
pub fn encode_ack(error: Option<&Error>, request: &NlMsgHdr) -> Vec<u8> {
    let total = NLMSG_HDRLEN + std::mem::size_of::<NlMsgError>();
    let mut header = NlMsgHdr::new(NLMSG_ERROR, 0);
    header.nlmsg_len = total as u32;
    header.nlmsg_seq = request.nlmsg_seq;
    header.nlmsg_pid = request.nlmsg_pid;

    let payload = NlMsgError {
        error: error.map_or(0, Error::errno),
        msg: *request,
    };

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(<NlMsgError as IntoBytes>::as_bytes(&payload));
    buf
}
