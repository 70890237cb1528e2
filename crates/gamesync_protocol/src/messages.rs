//! RPC messages for the remote save store.

use crate::error::{ProtocolError, ProtocolResult};
use crate::snapshot::{GameData, RemoteSave};
use crate::user::UserId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The remote procedures the save store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    /// Replace the whole save.
    SaveGameProgress,
    /// Replace one section of the save.
    SavePartialProgress,
    /// Fetch the latest save.
    LoadGameProgress,
}

impl Procedure {
    /// Returns the procedure's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::SaveGameProgress => "save_game_progress",
            Procedure::SavePartialProgress => "save_partial_progress",
            Procedure::LoadGameProgress => "load_game_progress",
        }
    }
}

/// Parameters of `save_game_progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGameProgressParams {
    /// Owner of the save.
    pub user_id: UserId,
    /// Every section.
    pub game_data: GameData,
    /// Client's version at push time.
    pub version: u64,
}

/// Parameters of `save_partial_progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePartialProgressParams {
    /// Owner of the save.
    pub user_id: UserId,
    /// Section key.
    pub data_key: String,
    /// Section data.
    pub data: Value,
    /// Client's version at push time.
    pub version: u64,
}

/// Parameters of `load_game_progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadGameProgressParams {
    /// Owner of the save.
    pub user_id: UserId,
}

/// An RPC call envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Which procedure to run.
    pub procedure: Procedure,
    /// Bearer token of the calling session, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Procedure-specific parameters.
    pub params: Value,
}

impl RpcRequest {
    /// Creates a `save_game_progress` call.
    pub fn save_game_progress(params: &SaveGameProgressParams) -> ProtocolResult<Self> {
        Self::new(Procedure::SaveGameProgress, params)
    }

    /// Creates a `save_partial_progress` call.
    pub fn save_partial_progress(params: &SavePartialProgressParams) -> ProtocolResult<Self> {
        Self::new(Procedure::SavePartialProgress, params)
    }

    /// Creates a `load_game_progress` call.
    pub fn load_game_progress(params: &LoadGameProgressParams) -> ProtocolResult<Self> {
        Self::new(Procedure::LoadGameProgress, params)
    }

    fn new<P: Serialize>(procedure: Procedure, params: &P) -> ProtocolResult<Self> {
        Ok(Self {
            procedure,
            access_token: None,
            params: serde_json::to_value(params)?,
        })
    }

    /// Attaches a bearer token.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Decodes the parameters as `P`.
    pub fn params<P: DeserializeOwned>(&self) -> ProtocolResult<P> {
        serde_json::from_value(self.params.clone()).map_err(|e| ProtocolError::InvalidParams {
            procedure: self.procedure.name(),
            message: e.to_string(),
        })
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Payload of a successful RPC response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcData {
    /// Server-assigned version after the call.
    pub version: u64,
    /// Section data, returned by `load_game_progress`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_data: Option<GameData>,
    /// When the server last accepted a write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// An RPC response envelope: `{success, data, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Result data, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RpcData>,
    /// Error message if the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    /// Creates a successful response carrying `data`.
    pub fn success(data: RpcData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates a successful response with no data (no save exists yet).
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Creates a failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Returns the remote save carried by a `load_game_progress` response.
    pub fn into_remote_save(self) -> Option<RemoteSave> {
        self.data.map(|data| RemoteSave {
            game_data: data.game_data.unwrap_or_default(),
            version: data.version,
            last_synced_at: data.last_synced_at,
        })
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
