//! Main save store server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::RequestHandler;
use crate::store::SaveStore;
use gamesync_protocol::{RpcRequest, RpcResponse, UserId};
use std::sync::Arc;
use tracing::warn;

/// The save store server.
///
/// This server handles the three save procedures and keeps one versioned
/// save record per user. Failures are answered with an unsuccessful
/// [`RpcResponse`] rather than a transport error.
///
/// # Example
///
/// ```
/// use gamesync_protocol::{LoadGameProgressParams, RpcRequest, RpcResponse, UserId};
/// use gamesync_server::{RpcServer, ServerConfig};
///
/// let server = RpcServer::new(ServerConfig::default());
/// let request = RpcRequest::load_game_progress(&LoadGameProgressParams {
///     user_id: UserId::generate(),
/// })
/// .unwrap();
///
/// let body = server.handle_rpc(&request.encode().unwrap()).unwrap();
/// let response = RpcResponse::decode(&body).unwrap();
/// assert!(response.success);
/// assert!(response.data.is_none());
/// ```
pub struct RpcServer {
    config: ServerConfig,
    handler: RequestHandler,
    store: Arc<SaveStore>,
}

impl RpcServer {
    /// Creates a server with an empty store.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(SaveStore::new()))
    }

    /// Creates a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<SaveStore>) -> Self {
        let handler = RequestHandler::new(&config, Arc::clone(&store));
        Self {
            config,
            handler,
            store,
        }
    }

    /// Handles a decoded request. Errors become unsuccessful responses.
    pub fn handle_request(&self, request: &RpcRequest) -> RpcResponse {
        match self.handler.handle(request) {
            Ok(response) => response,
            Err(err) => {
                warn!(procedure = request.procedure.name(), error = %err, "rpc failed");
                RpcResponse::error(err.to_string())
            }
        }
    }

    /// Handles an encoded request and returns the encoded response.
    ///
    /// Only a failure to encode the response is returned as `Err`.
    pub fn handle_rpc(&self, body: &[u8]) -> Result<Vec<u8>, String> {
        let response = match self.decode(body) {
            Ok(request) => self.handle_request(&request),
            Err(err) => {
                warn!(bytes = body.len(), error = %err, "rejected rpc body");
                RpcResponse::error(err.to_string())
            }
        };
        response.encode().map_err(|e| e.to_string())
    }

    fn decode(&self, body: &[u8]) -> ServerResult<RpcRequest> {
        if body.len() > self.config.max_payload_bytes {
            return Err(ServerError::PayloadTooLarge {
                size: body.len(),
                limit: self.config.max_payload_bytes,
            });
        }
        Ok(RpcRequest::decode(body)?)
    }

    /// Issues an access token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication is not enabled.
    pub fn issue_token(&self, user_id: &UserId) -> ServerResult<String> {
        self.handler
            .validator()
            .ok_or_else(|| ServerError::Internal("authentication is not enabled".into()))?
            .create_token(user_id)
    }

    /// Returns the server-side version of `user_id`'s save.
    pub fn version(&self, user_id: &UserId) -> u64 {
        self.store.version(user_id)
    }

    /// Returns the underlying save store.
    pub fn store(&self) -> &Arc<SaveStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamesync_protocol::{LoadGameProgressParams, SavePartialProgressParams};
    use serde_json::json;

    fn partial_body(user: UserId, token: Option<String>) -> Vec<u8> {
        RpcRequest::save_partial_progress(&SavePartialProgressParams {
            user_id: user,
            data_key: "inventory".into(),
            data: json!(["monowire"]),
            version: 3,
        })
        .unwrap()
        .with_access_token(token)
        .encode()
        .unwrap()
    }

    #[test]
    fn server_lifecycle() {
        let server = RpcServer::new(ServerConfig::default());
        let user = UserId::generate();
        assert_eq!(server.version(&user), 0);

        let body = server.handle_rpc(&partial_body(user, None)).unwrap();
        let response = RpcResponse::decode(&body).unwrap();
        assert!(response.success);
        assert_eq!(server.version(&user), 1);
        assert_eq!(server.store().len(), 1);
    }

    #[test]
    fn garbage_body_answers_error() {
        let server = RpcServer::new(ServerConfig::default());
        let body = server.handle_rpc(b"{not json").unwrap();
        let response = RpcResponse::decode(&body).unwrap();
        assert!(!response.success);
        assert!(response.error.unwrap().contains("protocol"));
    }

    #[test]
    fn oversized_body_rejected() {
        let server = RpcServer::new(ServerConfig::new().with_max_payload_bytes(16));
        let user = UserId::generate();
        let body = server.handle_rpc(&partial_body(user, None)).unwrap();
        let response = RpcResponse::decode(&body).unwrap();
        assert!(!response.success);
        assert!(response.error.unwrap().contains("too large"));
        assert_eq!(server.version(&user), 0);
    }

    #[test]
    fn issued_token_accepted() {
        let server = RpcServer::new(ServerConfig::new().with_auth(b"server-secret".to_vec()));
        let user = UserId::generate();

        let denied = server.handle_rpc(&partial_body(user, None)).unwrap();
        assert!(!RpcResponse::decode(&denied).unwrap().success);

        let token = server.issue_token(&user).unwrap();
        let accepted = server.handle_rpc(&partial_body(user, Some(token))).unwrap();
        assert!(RpcResponse::decode(&accepted).unwrap().success);
    }

    #[test]
    fn issue_token_without_auth_fails() {
        let server = RpcServer::new(ServerConfig::default());
        assert!(server.issue_token(&UserId::generate()).is_err());
    }

    #[test]
    fn shared_store() {
        let store = Arc::new(SaveStore::new());
        let server = RpcServer::with_store(ServerConfig::default(), Arc::clone(&store));
        let user = UserId::generate();
        server.handle_rpc(&partial_body(user, None)).unwrap();

        let load = RpcRequest::load_game_progress(&LoadGameProgressParams { user_id: user }).unwrap();
        let response = server.handle_request(&load);
        assert_eq!(response.into_remote_save().unwrap().version, 1);
        assert_eq!(store.version(&user), 1);
    }
}
