//! Error types for diagnostic dispatch.

/// Result type for diagnostic operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing a diagnostic request.
///
/// Every variant maps to a negative errno via [`Error::errno`], which is
/// what a transport puts in the acknowledgement it sends back to the
/// requesting client. None of these are retried internally; retry is the
/// transport's decision.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed request: bad length, out-of-range family, or unknown
    /// message type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A handler is already registered for this family.
    #[error("family {family} already has a registered handler")]
    AlreadyRegistered {
        /// The family whose slot was occupied.
        family: u8,
    },

    /// No handler is registered for this family.
    #[error("no handler registered for family {family}")]
    NotFound {
        /// The family that was looked up.
        family: u8,
    },

    /// The operation is not implemented by the resolved handler, or no
    /// compat handler is installed.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// A presented cookie no longer matches the socket; the socket the
    /// caller observed has been recycled.
    #[error("stale cookie: socket identity has changed")]
    Stale,

    /// Destructive operation attempted without the required privilege.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The reply buffer cannot accommodate the encoded block.
    #[error("reply exceeds capacity of {limit} bytes")]
    SizeExceeded {
        /// The reply capacity that would have been exceeded.
        limit: usize,
    },

    /// The control channel backing the service could not be created.
    /// Produced by the transport layer, mapped here so the taxonomy is
    /// complete in one place.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl Error {
    pub(crate) fn bad_family(family: u8) -> Self {
        Self::InvalidArgument(format!("family {family} out of range"))
    }

    /// The negative errno a transport reports for this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => -libc::EINVAL,
            Self::AlreadyRegistered { .. } => -libc::EBUSY,
            Self::NotFound { .. } => -libc::ENOENT,
            Self::NotSupported(_) => -libc::EOPNOTSUPP,
            Self::Stale => -libc::ESTALE,
            Self::PermissionDenied(_) => -libc::EPERM,
            Self::SizeExceeded { .. } => -libc::EMSGSIZE,
            Self::ResourceExhausted(_) => -libc::ENOMEM,
        }
    }

    /// Check if this is a "no handler" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a privilege failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
