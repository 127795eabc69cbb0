//! The single wallet session: selection, connect/disconnect orchestration and
//! the authoritative account/network state.

mod auto_connect;
pub mod lifecycle;
mod transactions;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::adapter::{AccountKeys, NetworkInfo, ReadyState, SharedAdapter};
use crate::bridge::{EventBridge, SessionSink};
use crate::config::{ErrorHandler, SessionConfig, UrlOpener};
use crate::errors::{WalletError, WalletResult};
use crate::ready_state::{ReadyStateTracker, WalletEntry, WalletList};
use crate::registry::AdapterRegistry;
use crate::storage::SelectionStore;

pub use lifecycle::{Lifecycle, LifecycleToken};

/// Read-only view of the session published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub selected_name: Option<String>,
    /// Name of the active adapter.
    pub wallet: Option<String>,
    pub account: Option<AccountKeys>,
    pub network: Option<NetworkInfo>,
    pub connected: bool,
    pub connecting: bool,
    pub disconnecting: bool,
}

#[derive(Default)]
struct SessionData {
    selected_name: Option<String>,
    active_adapter: Option<SharedAdapter>,
    account: Option<AccountKeys>,
    network: Option<NetworkInfo>,
}

pub(crate) struct SessionInner {
    registry: RwLock<AdapterRegistry>,
    tracker: ReadyStateTracker,
    bridge: EventBridge,
    selection: SelectionStore,
    token: LifecycleToken,
    data: Mutex<SessionData>,
    on_error: Option<ErrorHandler>,
    url_opener: Option<UrlOpener>,
    auto_connect: bool,
    auto_connect_pending: AtomicBool,
    runtime: RwLock<Option<Handle>>,
    publisher: watch::Sender<SessionSnapshot>,
    self_ref: Weak<SessionInner>,
}

/// Handle to one wallet session. Clones share the same session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<SessionInner>,
}

impl WalletSession {
    /// Build a session from `config`, restore the persisted selection and
    /// start tracking adapter readiness.
    ///
    /// With auto-connect enabled the restored selection is connected on the
    /// current tokio runtime as soon as its adapter is connectable.
    pub fn init(config: SessionConfig) -> Self {
        let SessionConfig {
            wallets,
            on_error,
            options,
            storage,
            url_opener,
            runtime,
        } = config;

        let registry = AdapterRegistry::new(wallets);
        let selection = SelectionStore::new(options.storage_key.clone(), storage);
        let selected_name = selection.load();
        let (publisher, _) = watch::channel(SessionSnapshot::default());

        let inner = Arc::new_cyclic(|self_ref| SessionInner {
            registry: RwLock::new(registry),
            tracker: ReadyStateTracker::new(),
            bridge: EventBridge::new(),
            selection,
            token: LifecycleToken::new(),
            data: Mutex::new(SessionData {
                selected_name,
                ..SessionData::default()
            }),
            on_error,
            url_opener,
            auto_connect: options.auto_connect,
            auto_connect_pending: AtomicBool::new(false),
            runtime: RwLock::new(runtime.or_else(|| Handle::try_current().ok())),
            publisher,
            self_ref: self_ref.clone(),
        });

        let weak = Arc::downgrade(&inner);
        inner.tracker.set_listener(Arc::new(move |_name: &str, _state: ReadyState| {
            if let Some(inner) = weak.upgrade() {
                inner.changed();
            }
        }));
        inner.tracker.track(inner.registry.read().adapters());

        log::info!(
            "Wallet session initialized with adapters {:?} (auto-connect: {}, restored selection: {:?})",
            inner.registry.read().names(),
            inner.auto_connect,
            inner.data.lock().selected_name
        );
        inner.changed();

        Self { inner }
    }

    /// Connect the selected wallet. A call while a lifecycle operation is in
    /// flight, or while already connected, returns `Ok(())` without effect.
    pub async fn connect(&self) -> WalletResult<()> {
        self.inner.connect().await
    }

    /// Disconnect the active wallet. The session always ends idle, whether or
    /// not the adapter call succeeds.
    pub async fn disconnect(&self) -> WalletResult<()> {
        self.inner.disconnect().await
    }

    /// Change the selected wallet name. Does not connect or disconnect.
    pub fn select(&self, name: Option<&str>) {
        self.inner.select(name);
    }

    /// Replace the adapter list and re-track readiness.
    ///
    /// An active adapter missing from the new list is released through the
    /// same teardown as an adapter-initiated disconnect. The adapter itself is
    /// not asked to disconnect.
    pub fn set_wallets(&self, wallets: Vec<SharedAdapter>) {
        let registry = AdapterRegistry::new(wallets);
        self.inner.tracker.track(registry.adapters());
        let active = self.inner.data.lock().active_adapter.clone();
        let dropped = active.filter(|adapter| !registry.contains(adapter));
        *self.inner.registry.write() = registry;

        match dropped {
            Some(adapter) => {
                log::info!(
                    "Active wallet {} was removed from the adapter list",
                    adapter.name()
                );
                self.inner.teardown();
            }
            None => self.inner.changed(),
        }
    }

    pub fn wallets(&self) -> WalletList {
        self.inner.tracker.wallets()
    }

    pub fn wallet(&self, name: &str) -> Option<Arc<WalletEntry>> {
        self.inner.tracker.find(name)
    }

    pub fn ready_state_of(&self, name: &str) -> Option<ReadyState> {
        self.inner.tracker.ready_state_of(name)
    }

    pub fn subscribe_wallets(&self) -> watch::Receiver<WalletList> {
        self.inner.tracker.subscribe()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.publisher.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot()
    }

    pub fn selected_name(&self) -> Option<String> {
        self.inner.data.lock().selected_name.clone()
    }

    pub fn active_adapter(&self) -> Option<SharedAdapter> {
        self.inner.data.lock().active_adapter.clone()
    }

    pub fn account(&self) -> Option<AccountKeys> {
        self.inner.data.lock().account.clone()
    }

    pub fn network(&self) -> Option<NetworkInfo> {
        self.inner.data.lock().network.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.token.current()
    }

    pub fn connected(&self) -> bool {
        self.lifecycle() == Lifecycle::Connected
    }

    pub fn connecting(&self) -> bool {
        self.lifecycle() == Lifecycle::Connecting
    }

    pub fn disconnecting(&self) -> bool {
        self.lifecycle() == Lifecycle::Disconnecting
    }

    pub fn auto_connect_enabled(&self) -> bool {
        self.inner.auto_connect
    }

    pub fn storage_key(&self) -> &str {
        self.inner.selection.key()
    }

    pub fn selection_store(&self) -> &SelectionStore {
        &self.inner.selection
    }

    /// Name of the adapter currently holding session listeners.
    pub fn listening_to(&self) -> Option<String> {
        self.inner.bridge.attached_to()
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl SessionInner {
    async fn connect(&self) -> WalletResult<()> {
        if let Err(state) = self.token.try_begin_connect() {
            log::debug!("Ignoring connect while session is {}", state);
            return Ok(());
        }

        let adapter = match self.prepare_connect() {
            Ok(adapter) => adapter,
            Err(err) => return Err(self.fail_connect(err)),
        };
        self.changed();

        log::debug!("Connecting to wallet {}", adapter.name());
        match adapter.connect().await {
            Ok(()) => self.finish_connect(&adapter),
            Err(err) => Err(self.fail_connect(err)),
        }
    }

    /// Resolve the selection, populate the session eagerly and check readiness.
    fn prepare_connect(&self) -> WalletResult<SharedAdapter> {
        let selected = self.data.lock().selected_name.clone();
        let entry = selected
            .as_deref()
            .and_then(|name| self.tracker.find(name))
            .ok_or(WalletError::WalletNotSelected)?;
        let adapter = Arc::clone(&entry.adapter);

        {
            let mut data = self.data.lock();
            data.active_adapter = Some(Arc::clone(&adapter));
            data.account = adapter.public_account();
            data.network = adapter.network();
        }

        if !entry.ready_state.is_connectable() {
            self.selection.clear();
            if let (Some(url), Some(opener)) = (adapter.url(), &self.url_opener) {
                log::info!("Opening install page for {}: {}", adapter.name(), url);
                opener(url);
            }
            return Err(WalletError::WalletNotReady(adapter.name().to_string()));
        }

        Ok(adapter)
    }

    fn finish_connect(&self, adapter: &SharedAdapter) -> WalletResult<()> {
        let still_active = self
            .data
            .lock()
            .active_adapter
            .as_ref()
            .is_some_and(|active| Arc::ptr_eq(active, adapter));
        if !still_active {
            self.token.settle(Some(Lifecycle::Connecting));
            self.changed();
            return Err(self.report(WalletError::WalletConnectionError(format!(
                "{} disconnected before the connection completed",
                adapter.name()
            ))));
        }

        self.bridge.attach(adapter, self.sink());

        let connected = adapter.connected();
        {
            let mut data = self.data.lock();
            data.account = adapter.public_account();
            data.network = adapter.network();
            self.token.finish_connect(connected);
        }
        self.changed();

        if connected {
            log::info!("Connected to wallet {}", adapter.name());
        } else {
            log::warn!(
                "Wallet {} resolved connect but reports no connection",
                adapter.name()
            );
        }
        Ok(())
    }

    fn fail_connect(&self, err: WalletError) -> WalletError {
        log::warn!("Wallet connect failed: {}", err);
        self.reset_session(Some(Lifecycle::Connecting));
        self.changed();
        self.report(err)
    }

    async fn disconnect(&self) -> WalletResult<()> {
        let state = self.token.current();
        if state.is_transient() {
            log::debug!("Ignoring disconnect while session is {}", state);
            return Ok(());
        }

        let adapter = self.data.lock().active_adapter.clone();
        let Some(adapter) = adapter else {
            self.teardown();
            return Ok(());
        };

        if let Err(state) = self.token.try_begin_disconnect() {
            log::debug!("Ignoring disconnect while session is {}", state);
            return Ok(());
        }
        self.changed();

        log::debug!("Disconnecting from wallet {}", adapter.name());
        let outcome = adapter.disconnect().await;
        if outcome.is_err() {
            self.selection.clear();
        }

        self.reset_session(Some(Lifecycle::Disconnecting));
        self.changed();

        match outcome {
            Ok(()) => {
                log::info!("Disconnected from wallet {}", adapter.name());
                Ok(())
            }
            Err(err) => Err(self.report(err)),
        }
    }

    fn select(&self, name: Option<&str>) {
        match name {
            Some(name) => self.selection.save(name),
            None => self.selection.clear(),
        }
        self.data.lock().selected_name = name.map(str::to_string);
        log::debug!("Selected wallet {:?}", name);
        self.changed();
    }

    /// Shared end of every disconnect path, caller- or adapter-initiated.
    fn teardown(&self) {
        self.reset_session(None);
        self.changed();
    }

    fn reset_session(&self, owned: Option<Lifecycle>) {
        self.selection.clear();
        self.bridge.detach();
        let mut data = self.data.lock();
        *data = SessionData::default();
        self.token.settle(owned);
    }

    fn report(&self, error: WalletError) -> WalletError {
        if let Some(handler) = &self.on_error {
            handler(&error);
        }
        error
    }

    fn snapshot(&self) -> SessionSnapshot {
        let data = self.data.lock();
        let lifecycle = self.token.current();
        SessionSnapshot {
            selected_name: data.selected_name.clone(),
            wallet: data
                .active_adapter
                .as_ref()
                .map(|adapter| adapter.name().to_string()),
            account: data.account.clone(),
            network: data.network.clone(),
            connected: lifecycle == Lifecycle::Connected,
            connecting: lifecycle == Lifecycle::Connecting,
            disconnecting: lifecycle == Lifecycle::Disconnecting,
        }
    }

    /// Publish the new state and re-run auto-connect reconciliation.
    fn changed(&self) {
        self.publisher.send_replace(self.snapshot());
        self.reconcile_auto_connect();
    }

    fn sink(&self) -> Weak<dyn SessionSink> {
        self.self_ref.clone()
    }
}

impl SessionSink for SessionInner {
    fn account_changed(&self, account: Option<AccountKeys>) {
        {
            let mut data = self.data.lock();
            if data.active_adapter.is_none() {
                return;
            }
            data.account = account;
        }
        self.changed();
    }

    fn network_changed(&self, network: Option<NetworkInfo>) {
        {
            let mut data = self.data.lock();
            if data.active_adapter.is_none() {
                return;
            }
            data.network = network;
        }
        self.changed();
    }

    fn adapter_disconnected(&self) {
        log::info!("Wallet adapter reported disconnect");
        self.teardown();
    }

    fn adapter_error(&self, error: WalletError) -> WalletError {
        log::warn!("Wallet adapter error: {}", error);
        self.report(error)
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.tracker.unsubscribe_all();
        self.bridge.detach();
    }
}
