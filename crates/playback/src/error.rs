//! Engine error types

use platform::SinkError;

use crate::control::TransitionError;
use crate::wav::HeaderError;

/// Why a stream could not be started.
///
/// Every variant leaves the engine idle with the source closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamError {
    /// A session is already active; it was left untouched.
    #[error("a stream is already active")]
    AlreadyActive,
    /// The path does not fit the session's path storage.
    #[error("path too long")]
    PathTooLong,
    /// The source is missing or unreadable.
    #[error("cannot open source")]
    Open,
    /// The file ended inside the 44-byte header.
    #[error("header truncated after {read} bytes")]
    ShortHeader {
        /// Bytes obtained before end of file.
        read: usize,
    },
    /// The header was read but describes an unplayable stream.
    #[error("invalid header: {0}")]
    InvalidHeader(#[from] HeaderError),
    /// The sink is already transmitting.
    #[error("audio sink busy")]
    SinkBusy,
    /// The sink rejected the configuration or failed to start.
    #[error("audio sink failed: {0}")]
    Sink(SinkError),
    /// Reading the header failed.
    #[error("read failed")]
    Read,
}

impl From<SinkError> for StreamError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Busy => Self::SinkBusy,
            other => Self::Sink(other),
        }
    }
}

/// Why a pause, resume or volume change failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError {
    /// The command is not legal in the current state.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The sink refused the command; the state is unchanged.
    #[error("audio sink failed: {0}")]
    Sink(#[from] SinkError),
}

impl PlaybackError {
    /// Shorthand for the no-session case.
    pub const NOT_ACTIVE: Self = Self::Transition(TransitionError::NotActive);
}
