//! Playback control state machine.
//!
//! `PlaybackState` is a pure, `no_std`, allocation-free state machine that
//! tracks whether the player is idle, playing, or paused. It has no I/O: the
//! streaming engine asks it whether a command is legal and applies the result
//! only after the hardware side effect succeeded, which keeps every rule of the
//! table below testable on the host.
//!
//! | From             | Event                 | To                   |
//! |------------------|-----------------------|----------------------|
//! | Idle             | `Started`             | Playing              |
//! | Playing / Paused | `Started`             | `AlreadyActive`      |
//! | Playing / Paused | `Pause`               | Paused               |
//! | Playing / Paused | `Resume`              | Playing              |
//! | Idle             | `Pause` / `Resume`    | `NotActive`          |
//! | any              | `Stop` / `EndOfData`  | Idle                 |

/// Current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// No session; a stream may be started.
    #[default]
    Idle,
    /// A session is active and the sink is transmitting.
    Playing,
    /// A session is active with sink output suspended; position is preserved.
    Paused,
}

/// Inputs to [`PlaybackState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// A stream was started successfully.
    Started,
    /// Suspend output.
    Pause,
    /// Continue output.
    Resume,
    /// Explicit stop.
    Stop,
    /// The source ran dry and the last buffered audio was consumed.
    EndOfData,
}

/// Rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionError {
    /// A session already exists.
    #[error("a stream is already active")]
    AlreadyActive,
    /// The event needs an active session.
    #[error("no active stream")]
    NotActive,
}

impl PlaybackState {
    /// Apply `event`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] for events that are illegal in this state.
    /// Pause while paused and resume while playing are accepted.
    pub fn transition(self, event: ControlEvent) -> Result<Self, TransitionError> {
        match (self, event) {
            (_, ControlEvent::Stop | ControlEvent::EndOfData) => Ok(Self::Idle),
            (Self::Idle, ControlEvent::Started) => Ok(Self::Playing),
            (Self::Playing | Self::Paused, ControlEvent::Started) => {
                Err(TransitionError::AlreadyActive)
            }
            (Self::Idle, ControlEvent::Pause | ControlEvent::Resume) => {
                Err(TransitionError::NotActive)
            }
            (Self::Playing | Self::Paused, ControlEvent::Pause) => Ok(Self::Paused),
            (Self::Playing | Self::Paused, ControlEvent::Resume) => Ok(Self::Playing),
        }
    }

    /// `true` while a session exists, paused or not.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}
