//! Error type shared by every primitive in the crate.

/// Boxed error stored by a faulted awaitable.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure outcomes of the primitives.
///
/// Cancellation is a variant of its own so callers can tell "gave up" from
/// "failed" with [`Error::is_cancelled`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument was rejected before any work started.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// Graph validation found a vertex reachable from itself.
    #[error("graph contains a cycle")]
    CycleDetected,

    /// The primitive was used in a state that does not allow the call.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// The wait was cancelled through its token.
    #[error("operation was cancelled")]
    Cancelled,

    /// A fault stored by a producer, handed back to the consumer as is.
    #[error(transparent)]
    Faulted(BoxError),
}

impl Error {
    pub(crate) const fn invalid_argument(name: &'static str, reason: &'static str) -> Self {
        Self::InvalidArgument { name, reason }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    /// Returns the producer's error if this is a stored fault.
    pub fn into_fault(self) -> Option<BoxError> {
        match self {
            Self::Faulted(err) => Some(err),
            _ => None,
        }
    }
}
