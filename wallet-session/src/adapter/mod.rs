//! Capability interface every wallet provider implements.
//!
//! The session never talks to a browser extension or mobile bridge directly;
//! it only drives values of `dyn WalletAdapter`.

pub mod events;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::WalletResult;

pub use events::{AdapterEvent, AdapterEventKind, EventEmitter, EventHandler, ListenerId};

/// Opaque transaction payload; its shape belongs to the adapter and chain.
pub type TransactionPayload = serde_json::Value;
/// Opaque adapter-specific transaction options.
pub type TransactionOptions = serde_json::Value;
/// Provider response to a sign or submit call, returned unmodified.
pub type TransactionResponse = serde_json::Value;

/// Adapter-reported installability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadyState {
    NotDetected,
    Unsupported,
    Loadable,
    Installed,
}

impl ReadyState {
    /// Connect is only attempted from these states.
    pub fn is_connectable(self) -> bool {
        matches!(self, ReadyState::Installed | ReadyState::Loadable)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ReadyState::NotDetected => "NotDetected",
            ReadyState::Unsupported => "Unsupported",
            ReadyState::Loadable => "Loadable",
            ReadyState::Installed => "Installed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeys {
    pub address: String,
    pub public_key: Option<String>,
    pub min_keys_required: Option<u32>,
}

impl AccountKeys {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            public_key: None,
            min_keys_required: None,
        }
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: Option<String>,
    pub url: Option<String>,
}

impl NetworkInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain_id: None,
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessagePayload {
    pub message: String,
    pub nonce: String,
    #[serde(default)]
    pub address: bool,
    #[serde(default)]
    pub application: bool,
    #[serde(default)]
    pub chain_id: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageResponse {
    pub message: String,
    pub nonce: String,
    pub full_message: String,
    pub prefix: String,
    pub signature: String,
    pub address: Option<String>,
    pub application: Option<String>,
    pub chain_id: Option<u64>,
}

/// A wallet provider as seen by the session.
///
/// State accessors are synchronous snapshots of what the adapter currently
/// reports; `connect`/`disconnect` and the signing calls suspend until the
/// provider answers.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Install or landing page for the provider.
    fn url(&self) -> Option<&str>;

    fn ready_state(&self) -> ReadyState;

    fn connected(&self) -> bool;

    fn public_account(&self) -> Option<AccountKeys>;

    fn network(&self) -> Option<NetworkInfo>;

    async fn connect(&self) -> WalletResult<()>;

    async fn disconnect(&self) -> WalletResult<()>;

    async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&TransactionOptions>,
    ) -> WalletResult<TransactionResponse>;

    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&TransactionOptions>,
    ) -> WalletResult<TransactionResponse>;

    async fn sign_message(&self, payload: &SignMessagePayload)
        -> WalletResult<SignMessageResponse>;

    fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId;

    fn off(&self, kind: AdapterEventKind, id: ListenerId);
}

pub type SharedAdapter = Arc<dyn WalletAdapter>;

impl fmt::Debug for dyn WalletAdapter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WalletAdapter")
            .field("name", &self.name())
            .field("ready_state", &self.ready_state())
            .field("connected", &self.connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectable_states() {
        assert!(ReadyState::Installed.is_connectable());
        assert!(ReadyState::Loadable.is_connectable());
        assert!(!ReadyState::NotDetected.is_connectable());
        assert!(!ReadyState::Unsupported.is_connectable());
    }

    #[test]
    fn sign_message_payload_defaults() {
        let payload: SignMessagePayload =
            serde_json::from_str(r#"{"message":"hello","nonce":"1"}"#).unwrap();
        assert!(!payload.address);
        assert_eq!(payload.message, "hello");
    }
}
