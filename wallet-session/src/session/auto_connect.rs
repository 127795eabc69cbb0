use std::sync::atomic::Ordering;

use tokio::runtime::Handle;

use super::{Lifecycle, SessionInner};

impl SessionInner {
    /// Whether the current state calls for an automatic connect.
    pub(super) fn should_auto_connect(&self) -> bool {
        if !self.auto_connect {
            return false;
        }
        if matches!(
            self.token.current(),
            Lifecycle::Connecting | Lifecycle::Connected | Lifecycle::Disconnecting
        ) {
            return false;
        }

        let selected = {
            let data = self.data.lock();
            // An adapter that resolved connect without connecting stays active
            // until the caller disconnects; retrying it would spin.
            if data.active_adapter.is_some() {
                return false;
            }
            data.selected_name.clone()
        };
        let Some(name) = selected else {
            return false;
        };
        self.tracker
            .ready_state_of(&name)
            .is_some_and(|state| state.is_connectable())
    }

    /// The handle captured at `init`, else the runtime of the current caller,
    /// which is then kept for later attempts.
    fn runtime_handle(&self) -> Option<Handle> {
        if let Some(handle) = self.runtime.read().clone() {
            return Some(handle);
        }
        let handle = Handle::try_current().ok()?;
        *self.runtime.write() = Some(handle.clone());
        Some(handle)
    }

    /// Level-triggered: runs after every state change and spawns at most one
    /// pending attempt at a time. Failures reach the error handler inside
    /// `connect` and are otherwise dropped here.
    pub(super) fn reconcile_auto_connect(&self) {
        if !self.should_auto_connect() {
            return;
        }
        let Some(inner) = self.self_ref.upgrade() else {
            return;
        };
        let Some(runtime) = self.runtime_handle() else {
            log::warn!("No tokio runtime configured, auto-connect skipped");
            return;
        };
        if self.auto_connect_pending.swap(true, Ordering::AcqRel) {
            return;
        }

        runtime.spawn(async move {
            if inner.should_auto_connect() {
                log::debug!("Auto-connecting selected wallet");
                if let Err(err) = inner.connect().await {
                    log::warn!("Auto-connect failed: {}", err);
                }
            }
            inner.auto_connect_pending.store(false, Ordering::Release);
            inner.reconcile_auto_connect();
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::adapter::{ReadyState, SharedAdapter};
    use crate::config::SessionConfig;
    use crate::session::WalletSession;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::testing::MockAdapter;

    fn stored(name: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .set_item("walletName", &serde_json::to_string(name).unwrap())
            .unwrap();
        store
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn disabled_auto_connect_never_connects() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        let session = WalletSession::init(
            SessionConfig::new(vec![petra.clone() as SharedAdapter]).with_storage(stored("Petra")),
        );
        settle().await;

        assert_eq!(session.selected_name().as_deref(), Some("Petra"));
        assert_eq!(petra.connect_calls(), 0);
        assert!(!session.connected());
    }

    #[tokio::test]
    async fn restored_selection_connects_once_installed() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        let session = WalletSession::init(
            SessionConfig::new(vec![petra.clone() as SharedAdapter])
                .with_storage(stored("Petra"))
                .with_auto_connect(true),
        );

        let mut updates = session.subscribe();
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.connected))
            .await
            .expect("auto-connect timed out")
            .unwrap();
        settle().await;

        assert_eq!(petra.connect_calls(), 1);
    }

    #[tokio::test]
    async fn unconnected_adapter_is_not_retried() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        petra.set_connect_connected(false);
        let session = WalletSession::init(
            SessionConfig::new(vec![petra.clone() as SharedAdapter])
                .with_storage(stored("Petra"))
                .with_auto_connect(true),
        );
        settle().await;

        assert_eq!(petra.connect_calls(), 1);
        assert!(!session.connected());
        assert!(session.active_adapter().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn readiness_reported_from_foreign_thread_connects() {
        let petra = MockAdapter::arc("Petra", ReadyState::NotDetected);
        let session = WalletSession::init(
            SessionConfig::new(vec![petra.clone() as SharedAdapter])
                .with_storage(stored("Petra"))
                .with_auto_connect(true),
        );
        let mut updates = session.subscribe();

        let reporter = Arc::clone(&petra);
        std::thread::spawn(move || reporter.set_ready_state(ReadyState::Installed))
            .join()
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.connected))
            .await
            .expect("auto-connect timed out")
            .unwrap();
        assert_eq!(petra.connect_calls(), 1);
    }

    #[test]
    fn session_built_outside_runtime_uses_configured_handle() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        let session = WalletSession::init(
            SessionConfig::new(vec![petra.clone() as SharedAdapter])
                .with_storage(stored("Petra"))
                .with_auto_connect(true)
                .with_runtime(runtime.handle().clone()),
        );

        let mut updates = session.subscribe();
        runtime.block_on(async {
            tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.connected))
                .await
                .expect("auto-connect timed out")
                .unwrap();
        });
        assert_eq!(petra.connect_calls(), 1);
    }

    #[tokio::test]
    async fn unsupported_wallet_is_left_alone() {
        let petra = MockAdapter::arc("Petra", ReadyState::Unsupported);
        let session = WalletSession::init(
            SessionConfig::new(vec![petra.clone() as SharedAdapter])
                .with_storage(stored("Petra"))
                .with_auto_connect(true),
        );
        settle().await;

        assert_eq!(petra.connect_calls(), 0);
        assert_eq!(session.selected_name().as_deref(), Some("Petra"));
    }
}
