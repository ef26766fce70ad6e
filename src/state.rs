//! Session lifecycle state.

use std::sync::atomic::{AtomicU8, Ordering};

/// `Idle → Running → Stopping → Stopped`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Running,
            2 => SessionState::Stopping,
            _ => SessionState::Stopped,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Lock-free cell holding a [`SessionState`].
#[derive(Debug)]
pub(crate) struct AtomicSessionState(AtomicU8);

impl AtomicSessionState {
    pub(crate) fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn store(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move `from → to`. On failure returns the state actually held.
    pub(crate) fn transition(&self, from: SessionState, to: SessionState) -> Result<(), SessionState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(SessionState::from_u8)
    }
}
