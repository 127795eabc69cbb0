use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::{AccountKeys, NetworkInfo, ReadyState};
use crate::errors::WalletError;

/// Notifications an adapter emits to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    ReadyStateChange(ReadyState),
    AccountChange(Option<AccountKeys>),
    NetworkChange(Option<NetworkInfo>),
    Disconnect,
    Error(WalletError),
}

impl AdapterEvent {
    pub fn kind(&self) -> AdapterEventKind {
        match self {
            AdapterEvent::ReadyStateChange(_) => AdapterEventKind::ReadyStateChange,
            AdapterEvent::AccountChange(_) => AdapterEventKind::AccountChange,
            AdapterEvent::NetworkChange(_) => AdapterEventKind::NetworkChange,
            AdapterEvent::Disconnect => AdapterEventKind::Disconnect,
            AdapterEvent::Error(_) => AdapterEventKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterEventKind {
    ReadyStateChange,
    AccountChange,
    NetworkChange,
    Disconnect,
    Error,
}

impl AdapterEventKind {
    /// The four kinds the session listens to while an adapter is active.
    pub const SESSION: [AdapterEventKind; 4] = [
        AdapterEventKind::AccountChange,
        AdapterEventKind::NetworkChange,
        AdapterEventKind::Disconnect,
        AdapterEventKind::Error,
    ];
}

/// Handle returned by a subscription, used to remove exactly that listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type EventHandler = Arc<dyn Fn(&AdapterEvent) + Send + Sync>;

struct Listener {
    id: ListenerId,
    kind: AdapterEventKind,
    handler: EventHandler,
}

/// Listener bookkeeping that adapters embed to implement `on`/`off`.
///
/// Handlers are invoked without the internal lock held, so a handler may
/// subscribe or unsubscribe on the same emitter.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Mutex<Vec<Listener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.lock().push(Listener { id, kind, handler });
        id
    }

    /// Returns whether a listener was removed.
    pub fn off(&self, kind: AdapterEventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|listener| !(listener.id == id && listener.kind == kind));
        listeners.len() != before
    }

    pub fn emit(&self, event: &AdapterEvent) {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|listener| listener.kind == kind)
            .map(|listener| Arc::clone(&listener.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn listener_count(&self, kind: AdapterEventKind) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|listener| listener.kind == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}
