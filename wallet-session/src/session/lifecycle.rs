use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Position of the session in its connect/disconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Lifecycle {
    Idle = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
}

impl Lifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Lifecycle::Connecting,
            2 => Lifecycle::Connected,
            3 => Lifecycle::Disconnecting,
            _ => Lifecycle::Idle,
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, Lifecycle::Connecting | Lifecycle::Disconnecting)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Lifecycle::Idle => "idle",
            Lifecycle::Connecting => "connecting",
            Lifecycle::Connected => "connected",
            Lifecycle::Disconnecting => "disconnecting",
        };
        f.write_str(label)
    }
}

/// Single-slot mutual exclusion for lifecycle operations.
///
/// Only one of connecting, connected and disconnecting can hold the slot, and
/// every transition is a compare-and-swap, so a second caller always observes
/// the first caller's claim.
#[derive(Debug)]
pub struct LifecycleToken {
    state: AtomicU8,
}

impl LifecycleToken {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(Lifecycle::Idle as u8),
        }
    }

    pub fn current(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: Lifecycle, to: Lifecycle) -> Result<(), Lifecycle> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(Lifecycle::from_u8)
    }

    /// Claim the slot for a connect attempt. Fails with the current state when
    /// the session is not idle.
    pub fn try_begin_connect(&self) -> Result<(), Lifecycle> {
        self.transition(Lifecycle::Idle, Lifecycle::Connecting)
    }

    /// Release a connect claim, landing in `Connected` when the adapter
    /// reports a live connection.
    pub fn finish_connect(&self, connected: bool) -> bool {
        let target = if connected {
            Lifecycle::Connected
        } else {
            Lifecycle::Idle
        };
        self.transition(Lifecycle::Connecting, target).is_ok()
    }

    /// Claim the slot for a disconnect, from either idle or connected.
    pub fn try_begin_disconnect(&self) -> Result<Lifecycle, Lifecycle> {
        match self.transition(Lifecycle::Connected, Lifecycle::Disconnecting) {
            Ok(()) => Ok(Lifecycle::Connected),
            Err(Lifecycle::Idle) => self
                .transition(Lifecycle::Idle, Lifecycle::Disconnecting)
                .map(|_| Lifecycle::Idle),
            Err(other) => Err(other),
        }
    }

    /// Drop back to idle after a teardown. A transient state is only released
    /// by the operation that claimed it, passed in `owned`.
    pub fn settle(&self, owned: Option<Lifecycle>) {
        if self.transition(Lifecycle::Connected, Lifecycle::Idle).is_ok() {
            return;
        }
        if let Some(owned) = owned.filter(|state| state.is_transient()) {
            let _ = self.transition(owned, Lifecycle::Idle);
        }
    }
}

impl Default for LifecycleToken {
    fn default() -> Self {
        Self::new()
    }
}
