//! Request handlers for the save procedures.

use crate::auth::TokenValidator;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::{SaveRecord, SaveStore};
use gamesync_protocol::{
    LoadGameProgressParams, Procedure, RpcData, RpcRequest, RpcResponse, SaveGameProgressParams,
    SavePartialProgressParams, UserId,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Handler for RPC requests.
pub struct RequestHandler {
    store: Arc<SaveStore>,
    validator: Option<TokenValidator>,
}

impl RequestHandler {
    /// Creates a handler over `store`, checking tokens if `config` enables auth.
    pub fn new(config: &ServerConfig, store: Arc<SaveStore>) -> Self {
        Self {
            store,
            validator: config.auth.clone().map(TokenValidator::new),
        }
    }

    /// Returns the token validator, if auth is enabled.
    pub fn validator(&self) -> Option<&TokenValidator> {
        self.validator.as_ref()
    }

    /// Dispatches `request` to its procedure.
    pub fn handle(&self, request: &RpcRequest) -> ServerResult<RpcResponse> {
        match request.procedure {
            Procedure::SaveGameProgress => self.handle_save(request),
            Procedure::SavePartialProgress => self.handle_save_partial(request),
            Procedure::LoadGameProgress => self.handle_load(request),
        }
    }

    /// Handles `save_game_progress`.
    pub fn handle_save(&self, request: &RpcRequest) -> ServerResult<RpcResponse> {
        let params: SaveGameProgressParams = request.params()?;
        self.authorize(request, &params.user_id)?;

        let record = self.store.save_full(params.user_id, params.game_data)?;
        info!(
            user_id = %params.user_id,
            client_version = params.version,
            version = record.version,
            "accepted full save"
        );
        Ok(saved(&record))
    }

    /// Handles `save_partial_progress`.
    pub fn handle_save_partial(&self, request: &RpcRequest) -> ServerResult<RpcResponse> {
        let params: SavePartialProgressParams = request.params()?;
        self.authorize(request, &params.user_id)?;

        let record = self
            .store
            .save_partial(params.user_id, &params.data_key, params.data)?;
        info!(
            user_id = %params.user_id,
            key = %params.data_key,
            client_version = params.version,
            version = record.version,
            "accepted partial save"
        );
        Ok(saved(&record))
    }

    /// Handles `load_game_progress`.
    pub fn handle_load(&self, request: &RpcRequest) -> ServerResult<RpcResponse> {
        let params: LoadGameProgressParams = request.params()?;
        self.authorize(request, &params.user_id)?;

        let Some(record) = self.store.load(&params.user_id) else {
            debug!(user_id = %params.user_id, "no save to load");
            return Ok(RpcResponse::empty());
        };
        debug!(user_id = %params.user_id, version = record.version, "loaded save");
        Ok(RpcResponse::success(RpcData {
            version: record.version,
            game_data: Some(record.game_data),
            last_synced_at: Some(record.last_synced_at),
        }))
    }

    fn authorize(&self, request: &RpcRequest, user: &UserId) -> ServerResult<()> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        let token = request
            .access_token
            .as_deref()
            .ok_or_else(|| ServerError::NotAuthorized("missing access token".into()))?;
        validator.validate_token(token, user)
    }
}

fn saved(record: &SaveRecord) -> RpcResponse {
    RpcResponse::success(RpcData {
        version: record.version,
        game_data: None,
        last_synced_at: Some(record.last_synced_at),
    })
}
