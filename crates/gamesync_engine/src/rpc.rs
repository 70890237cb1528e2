//! RPC-backed remote client.
//!
//! The remote store exposes three named procedures. Calls are JSON
//! [`RpcRequest`] envelopes; answers are [`RpcResponse`] envelopes. The
//! byte-level transport is abstracted so any HTTP or WebSocket client can
//! carry them.

use crate::error::{SyncError, SyncResult};
use crate::remote::{PushOutcome, RemoteSyncClient, Session};
use async_trait::async_trait;
use gamesync_protocol::{
    GameData, LoadGameProgressParams, RemoteSave, RpcRequest, RpcResponse,
    SaveGameProgressParams, SavePartialProgressParams,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Byte transport for RPC envelopes.
///
/// Implement this trait to plug in the actual network client.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Sends one encoded request and returns the encoded response.
    async fn call(&self, body: Vec<u8>) -> Result<Vec<u8>, String>;

    /// Checks if the transport can currently reach the server.
    fn is_healthy(&self) -> bool;
}

/// Remote client speaking the save store's RPC protocol.
pub struct RpcRemoteClient<T: RpcTransport> {
    transport: T,
    last_error: RwLock<Option<String>>,
}

impl<T: RpcTransport> RpcRemoteClient<T> {
    /// Creates a client over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&self, request: RpcRequest) -> SyncResult<RpcResponse> {
        if !self.transport.is_healthy() {
            return Err(SyncError::NotConnected);
        }

        let procedure = request.procedure.name();
        let body = request.encode()?;
        debug!(procedure, bytes = body.len(), "sending rpc");

        let response_body = self.transport.call(body).await.map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            SyncError::transport_retryable(e)
        })?;
        *self.last_error.write() = None;

        let response = RpcResponse::decode(&response_body)?;
        if !response.success {
            let message = response
                .error
                .unwrap_or_else(|| format!("{procedure} failed without a message"));
            return Err(SyncError::Rejected(message));
        }
        Ok(response)
    }

    async fn push(&self, request: RpcRequest) -> SyncResult<PushOutcome> {
        let response = self.send(request).await?;
        let data = response
            .data
            .ok_or_else(|| SyncError::Rejected("save response carried no version".into()))?;
        Ok(PushOutcome {
            new_version: data.version,
        })
    }
}

#[async_trait]
impl<T: RpcTransport> RemoteSyncClient for RpcRemoteClient<T> {
    async fn push_full(
        &self,
        session: &Session,
        game_data: &GameData,
        version: u64,
    ) -> SyncResult<PushOutcome> {
        let request = RpcRequest::save_game_progress(&SaveGameProgressParams {
            user_id: session.user_id,
            game_data: game_data.clone(),
            version,
        })?
        .with_access_token(session.access_token.clone());
        self.push(request).await
    }

    async fn push_partial(
        &self,
        session: &Session,
        key: &str,
        data: &Value,
        version: u64,
    ) -> SyncResult<PushOutcome> {
        let request = RpcRequest::save_partial_progress(&SavePartialProgressParams {
            user_id: session.user_id,
            data_key: key.to_string(),
            data: data.clone(),
            version,
        })?
        .with_access_token(session.access_token.clone());
        self.push(request).await
    }

    async fn pull(&self, session: &Session) -> SyncResult<Option<RemoteSave>> {
        let request = RpcRequest::load_game_progress(&LoadGameProgressParams {
            user_id: session.user_id,
        })?
        .with_access_token(session.access_token.clone());
        Ok(self.send(request).await?.into_remote_save())
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles one encoded request and returns the encoded response.
    fn handle_rpc(&self, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for Arc<S> {
    fn handle_rpc(&self, body: &[u8]) -> Result<Vec<u8>, String> {
        (**self).handle_rpc(body)
    }
}

/// A transport that routes requests directly to an in-process server.
///
/// Useful for testing without a network. It can be switched unhealthy to
/// simulate an unreachable server.
pub struct LoopbackTransport<S: LoopbackServer> {
    server: S,
    healthy: AtomicBool,
}

impl<S: LoopbackServer> LoopbackTransport<S> {
    /// Creates a transport connected to `server`.
    pub fn new(server: S) -> Self {
        Self {
            server,
            healthy: AtomicBool::new(true),
        }
    }

    /// Marks the server reachable or unreachable.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: LoopbackServer> RpcTransport for LoopbackTransport<S> {
    async fn call(&self, body: Vec<u8>) -> Result<Vec<u8>, String> {
        if !self.is_healthy() {
            return Err("loopback server unreachable".to_string());
        }
        self.server.handle_rpc(&body)
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamesync_protocol::{Procedure, RpcData, UserId};
    use serde_json::json;

    struct ScriptedServer {
        response: RwLock<RpcResponse>,
        last_request: RwLock<Option<RpcRequest>>,
    }

    impl ScriptedServer {
        fn new(response: RpcResponse) -> Self {
            Self {
                response: RwLock::new(response),
                last_request: RwLock::new(None),
            }
        }
    }

    impl LoopbackServer for ScriptedServer {
        fn handle_rpc(&self, body: &[u8]) -> Result<Vec<u8>, String> {
            let request = RpcRequest::decode(body).map_err(|e| e.to_string())?;
            *self.last_request.write() = Some(request);
            self.response.read().encode().map_err(|e| e.to_string())
        }
    }

    fn client(response: RpcResponse) -> (Arc<ScriptedServer>, RpcRemoteClient<LoopbackTransport<Arc<ScriptedServer>>>) {
        let server = Arc::new(ScriptedServer::new(response));
        let client = RpcRemoteClient::new(LoopbackTransport::new(Arc::clone(&server)));
        (server, client)
    }

    fn session() -> Session {
        Session::new(UserId::generate()).with_access_token("token-1")
    }

    #[tokio::test]
    async fn push_partial_sends_envelope() {
        let (server, client) = client(RpcResponse::success(RpcData {
            version: 8,
            ..RpcData::default()
        }));
        let session = session();

        let outcome = client
            .push_partial(&session, "inventory", &json!(["stim"]), 7)
            .await
            .unwrap();
        assert_eq!(outcome.new_version, 8);

        let request = server.last_request.read().clone().unwrap();
        assert_eq!(request.procedure, Procedure::SavePartialProgress);
        assert_eq!(request.access_token.as_deref(), Some("token-1"));
        let params: SavePartialProgressParams = request.params().unwrap();
        assert_eq!(params.user_id, session.user_id);
        assert_eq!(params.data_key, "inventory");
        assert_eq!(params.version, 7);
    }

    #[tokio::test]
    async fn unsuccessful_response_is_rejected() {
        let (_server, client) = client(RpcResponse::error("not authorized"));
        let err = client
            .push_full(&session(), &GameData::new(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Rejected(ref m) if m == "not authorized"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn pull_without_save() {
        let (_server, client) = client(RpcResponse::empty());
        assert_eq!(client.pull(&session()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unhealthy_transport_not_connected() {
        let (_server, client) = client(RpcResponse::empty());
        client.transport().set_healthy(false);
        let err = client.pull(&session()).await.unwrap_err();
        assert!(matches!(err, SyncError::NotConnected));
    }

    #[tokio::test]
    async fn garbage_response_is_protocol_error() {
        struct Garbage;
        impl LoopbackServer for Garbage {
            fn handle_rpc(&self, _body: &[u8]) -> Result<Vec<u8>, String> {
                Ok(b"not json".to_vec())
            }
        }

        let client = RpcRemoteClient::new(LoopbackTransport::new(Garbage));
        let err = client.pull(&session()).await.unwrap_err();
        assert!(matches!(err, SyncError::Protocol(_)));
        assert!(client.last_error().is_none());
    }
}
