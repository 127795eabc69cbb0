//! Scriptable in-memory adapter for exercising a session without a real
//! wallet provider.
//!
//! ```ignore
//! use wallet_session::testing::MockAdapter;
//!
//! let petra = MockAdapter::arc("Petra", ReadyState::Installed);
//! petra.fail_connect_with(WalletError::WalletConnectionError("rejected".into()));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

use crate::adapter::{
    AccountKeys, AdapterEvent, AdapterEventKind, EventEmitter, EventHandler, ListenerId,
    NetworkInfo, ReadyState, SharedAdapter, SignMessagePayload, SignMessageResponse,
    TransactionOptions, TransactionPayload, TransactionResponse, WalletAdapter,
};
use crate::errors::{WalletError, WalletResult};

#[derive(Debug)]
struct MockState {
    ready_state: ReadyState,
    connected: bool,
    account: Option<AccountKeys>,
    network: Option<NetworkInfo>,
    connect_error: Option<WalletError>,
    disconnect_error: Option<WalletError>,
    signing_error: Option<WalletError>,
    connect_sets_connected: bool,
    connect_gate: Option<Arc<Notify>>,
}

/// Adapter whose readiness, connection outcome and events are driven by the
/// test. Account and network become visible once connected.
#[derive(Debug)]
pub struct MockAdapter {
    name: String,
    url: Option<String>,
    state: Mutex<MockState>,
    events: EventEmitter,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>, ready_state: ReadyState) -> Self {
        let name = name.into();
        let address = format!("0x{}", name.to_ascii_lowercase());
        Self {
            url: Some(format!("https://{}.example/install", name.to_ascii_lowercase())),
            state: Mutex::new(MockState {
                ready_state,
                connected: false,
                account: Some(AccountKeys::new(address).with_public_key("0xed25519")),
                network: Some(NetworkInfo::new("mainnet")),
                connect_error: None,
                disconnect_error: None,
                signing_error: None,
                connect_sets_connected: true,
                connect_gate: None,
            }),
            events: EventEmitter::new(),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            name,
        }
    }

    pub fn arc(name: impl Into<String>, ready_state: ReadyState) -> Arc<Self> {
        Arc::new(Self::new(name, ready_state))
    }

    pub fn shared(self) -> SharedAdapter {
        Arc::new(self)
    }

    pub fn without_url(mut self) -> Self {
        self.url = None;
        self
    }

    pub fn with_account(self, account: Option<AccountKeys>) -> Self {
        self.state.lock().account = account;
        self
    }

    /// Account the adapter reports once connected.
    pub fn configured_account(&self) -> Option<AccountKeys> {
        self.state.lock().account.clone()
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.lock().ready_state = ready_state;
        self.events.emit(&AdapterEvent::ReadyStateChange(ready_state));
    }

    pub fn set_account(&self, account: Option<AccountKeys>) {
        self.state.lock().account = account.clone();
        self.events.emit(&AdapterEvent::AccountChange(account));
    }

    pub fn set_network(&self, network: Option<NetworkInfo>) {
        self.state.lock().network = network.clone();
        self.events.emit(&AdapterEvent::NetworkChange(network));
    }

    /// Simulate the provider dropping the connection on its own.
    pub fn emit_disconnect(&self) {
        self.state.lock().connected = false;
        self.events.emit(&AdapterEvent::Disconnect);
    }

    pub fn emit_error(&self, error: WalletError) {
        self.events.emit(&AdapterEvent::Error(error));
    }

    pub fn fail_connect_with(&self, error: WalletError) {
        self.state.lock().connect_error = Some(error);
    }

    pub fn fail_disconnect_with(&self, error: WalletError) {
        self.state.lock().disconnect_error = Some(error);
    }

    pub fn fail_signing_with(&self, error: WalletError) {
        self.state.lock().signing_error = Some(error);
    }

    /// Whether a successful `connect` marks the adapter connected.
    pub fn set_connect_connected(&self, connected: bool) {
        self.state.lock().connect_sets_connected = connected;
    }

    /// Make `connect` wait until the returned gate is notified.
    pub fn hold_connect(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().connect_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self, kind: AdapterEventKind) -> usize {
        self.events.listener_count(kind)
    }

    pub fn total_listeners(&self) -> usize {
        self.events.total_listeners()
    }

    fn begin_signing(&self) -> WalletResult<()> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        if !state.connected {
            return Err(WalletError::WalletNotConnected);
        }
        match &state.signing_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WalletAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state
    }

    fn connected(&self) -> bool {
        self.state.lock().connected
    }

    fn public_account(&self) -> Option<AccountKeys> {
        let state = self.state.lock();
        if state.connected {
            state.account.clone()
        } else {
            None
        }
    }

    fn network(&self) -> Option<NetworkInfo> {
        self.state.lock().network.clone()
    }

    async fn connect(&self) -> WalletResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.lock().connect_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if let Some(error) = state.connect_error.clone() {
            return Err(error);
        }
        state.connected = state.connect_sets_connected;
        Ok(())
    }

    async fn disconnect(&self) -> WalletResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.connected = false;
        match state.disconnect_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        _options: Option<&TransactionOptions>,
    ) -> WalletResult<TransactionResponse> {
        self.begin_signing()?;
        Ok(json!({ "signed": true, "payload": payload }))
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        _options: Option<&TransactionOptions>,
    ) -> WalletResult<TransactionResponse> {
        self.begin_signing()?;
        Ok(json!({ "hash": format!("0x{:064x}", self.sign_calls()), "payload": payload }))
    }

    async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> WalletResult<SignMessageResponse> {
        self.begin_signing()?;
        let account = self.public_account();
        let full_message = format!(
            "APTOS\nmessage: {}\nnonce: {}",
            payload.message, payload.nonce
        );
        Ok(SignMessageResponse {
            message: payload.message.clone(),
            nonce: payload.nonce.clone(),
            full_message,
            prefix: "APTOS".to_string(),
            signature: format!("sig:{}:{}", self.name, payload.nonce),
            address: account
                .filter(|_| payload.address)
                .map(|account| account.address),
            application: None,
            chain_id: None,
        })
    }

    fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId {
        self.events.on(kind, handler)
    }

    fn off(&self, kind: AdapterEventKind, id: ListenerId) {
        self.events.off(kind, id);
    }
}
