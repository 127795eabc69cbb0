use crate::adapter::{
    SharedAdapter, SignMessagePayload, SignMessageResponse, TransactionOptions,
    TransactionPayload, TransactionResponse,
};
use crate::errors::{WalletError, WalletResult};

use super::{Lifecycle, WalletSession};

impl WalletSession {
    /// Sign and submit through the active adapter, returning its response
    /// unmodified.
    pub async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&TransactionOptions>,
    ) -> WalletResult<TransactionResponse> {
        let adapter = self.connected_adapter()?;
        adapter
            .sign_and_submit_transaction(payload, options)
            .await
            .map_err(|err| self.inner.report(err))
    }

    pub async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&TransactionOptions>,
    ) -> WalletResult<TransactionResponse> {
        let adapter = self.connected_adapter()?;
        adapter
            .sign_transaction(payload, options)
            .await
            .map_err(|err| self.inner.report(err))
    }

    pub async fn sign_message(
        &self,
        payload: &SignMessagePayload,
    ) -> WalletResult<SignMessageResponse> {
        let adapter = self.connected_adapter()?;
        adapter
            .sign_message(payload)
            .await
            .map_err(|err| self.inner.report(err))
    }

    fn connected_adapter(&self) -> WalletResult<SharedAdapter> {
        let (adapter, lifecycle) = {
            let data = self.inner.data.lock();
            (data.active_adapter.clone(), self.inner.token.current())
        };

        let Some(adapter) = adapter else {
            return Err(self.inner.report(WalletError::WalletNotSelected));
        };
        if lifecycle != Lifecycle::Connected {
            return Err(self.inner.report(WalletError::WalletNotConnected));
        }
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::adapter::{ReadyState, SharedAdapter, SignMessagePayload};
    use crate::config::SessionConfig;
    use crate::errors::WalletError;
    use crate::session::WalletSession;
    use crate::testing::MockAdapter;

    fn session_with(adapter: &Arc<MockAdapter>) -> (WalletSession, Arc<Mutex<Vec<WalletError>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let session = WalletSession::init(
            SessionConfig::new(vec![adapter.clone() as SharedAdapter])
                .with_error_handler(Arc::new(move |err: &WalletError| sink.lock().push(err.clone()))),
        );
        (session, errors)
    }

    #[tokio::test]
    async fn requires_selected_adapter() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        let (session, errors) = session_with(&petra);

        let err = session
            .sign_and_submit_transaction(&json!({"function": "0x1::coin::transfer"}), None)
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::WalletNotSelected);
        assert_eq!(*errors.lock(), vec![WalletError::WalletNotSelected]);
    }

    #[tokio::test]
    async fn disconnected_session_has_no_adapter() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        let (session, _errors) = session_with(&petra);
        session.select(Some("Petra"));
        session.connect().await.unwrap();
        session.disconnect().await.unwrap();

        let err = session.sign_transaction(&json!({}), None).await.unwrap_err();
        assert_eq!(err, WalletError::WalletNotSelected);
        assert_eq!(petra.sign_calls(), 0);
    }

    #[tokio::test]
    async fn active_but_unconnected_adapter_is_rejected() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        petra.set_connect_connected(false);
        let (session, errors) = session_with(&petra);
        session.select(Some("Petra"));
        session.connect().await.unwrap();

        assert!(session.active_adapter().is_some());
        let err = session.sign_transaction(&json!({}), None).await.unwrap_err();
        assert_eq!(err, WalletError::WalletNotConnected);
        assert_eq!(*errors.lock(), vec![WalletError::WalletNotConnected]);
    }

    #[tokio::test]
    async fn delegates_and_reports_adapter_errors() {
        let petra = MockAdapter::arc("Petra", ReadyState::Installed);
        let (session, errors) = session_with(&petra);
        session.select(Some("Petra"));
        session.connect().await.unwrap();

        let payload = json!({"function": "0x1::coin::transfer", "arguments": ["0xb0b", 10]});
        let response = session
            .sign_and_submit_transaction(&payload, None)
            .await
            .unwrap();
        assert_eq!(response["payload"], payload);
        assert_eq!(petra.sign_calls(), 1);

        let message = SignMessagePayload {
            message: "hello".into(),
            nonce: "42".into(),
            address: true,
            application: false,
            chain_id: false,
        };
        let signed = session.sign_message(&message).await.unwrap();
        assert_eq!(signed.message, "hello");

        petra.fail_signing_with(WalletError::WalletSignTransactionError("rejected".into()));
        let err = session.sign_transaction(&payload, None).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::WalletSignTransactionError("rejected".into())
        );
        assert_eq!(errors.lock().len(), 1);
    }
}
