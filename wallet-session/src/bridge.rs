//! Forwards lifecycle events of the active adapter into the session.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::adapter::{
    AccountKeys, AdapterEvent, AdapterEventKind, ListenerId, NetworkInfo, SharedAdapter,
    WalletAdapter,
};
use crate::errors::WalletError;

/// Session-side receiver of bridged adapter events.
pub trait SessionSink: Send + Sync {
    fn account_changed(&self, account: Option<AccountKeys>);

    fn network_changed(&self, network: Option<NetworkInfo>);

    fn adapter_disconnected(&self);

    /// Report the error and hand it back so the caller can also return it.
    fn adapter_error(&self, error: WalletError) -> WalletError;
}

struct Attachment {
    adapter: SharedAdapter,
    listeners: Vec<(AdapterEventKind, ListenerId)>,
}

/// Owns the four session listeners of at most one adapter at a time.
#[derive(Default)]
pub struct EventBridge {
    attached: Mutex<Option<Attachment>>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the session listeners on `adapter`, first detaching any
    /// adapter that still holds them.
    pub fn attach(&self, adapter: &SharedAdapter, sink: Weak<dyn SessionSink>) {
        self.detach();

        let listeners = AdapterEventKind::SESSION
            .iter()
            .map(|kind| {
                let handler = bridge_handler(Arc::downgrade(adapter), sink.clone());
                (*kind, adapter.on(*kind, handler))
            })
            .collect();

        log::debug!("Attached session listeners to {}", adapter.name());
        *self.attached.lock() = Some(Attachment {
            adapter: Arc::clone(adapter),
            listeners,
        });
    }

    /// Remove exactly the listeners registered by the last `attach`.
    pub fn detach(&self) {
        let attachment = self.attached.lock().take();
        if let Some(attachment) = attachment {
            for (kind, id) in attachment.listeners {
                attachment.adapter.off(kind, id);
            }
            log::debug!(
                "Detached session listeners from {}",
                attachment.adapter.name()
            );
        }
    }

    pub fn attached_to(&self) -> Option<String> {
        self.attached
            .lock()
            .as_ref()
            .map(|attachment| attachment.adapter.name().to_string())
    }

    pub fn is_attached(&self) -> bool {
        self.attached.lock().is_some()
    }
}

fn bridge_handler(
    adapter: Weak<dyn WalletAdapter>,
    sink: Weak<dyn SessionSink>,
) -> Arc<dyn Fn(&AdapterEvent) + Send + Sync> {
    Arc::new(move |event| {
        let Some(sink) = sink.upgrade() else {
            return;
        };
        match event {
            AdapterEvent::AccountChange(_) => {
                if let Some(adapter) = adapter.upgrade() {
                    sink.account_changed(adapter.public_account());
                }
            }
            AdapterEvent::NetworkChange(_) => {
                if let Some(adapter) = adapter.upgrade() {
                    sink.network_changed(adapter.network());
                }
            }
            AdapterEvent::Disconnect => sink.adapter_disconnected(),
            AdapterEvent::Error(error) => {
                sink.adapter_error(error.clone());
            }
            AdapterEvent::ReadyStateChange(_) => {}
        }
    })
}
