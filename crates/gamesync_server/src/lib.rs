//! # GameSync Server
//!
//! Reference save store server for GameSync.
//!
//! This crate provides:
//! - The three save procedures (`save_game_progress`,
//!   `save_partial_progress`, `load_game_progress`) over JSON RPC envelopes
//! - A versioned per-user save store
//! - Authentication (HMAC-SHA256 user tokens)
//!
//! # Versioning
//!
//! The server is authoritative for versions. Every accepted save is
//! stamped with the previous version plus one and the server time; the
//! version a client sends is only logged.
//!
//! # Authentication
//!
//! Authentication is optional but recommended for production:
//!
//! ```rust
//! use gamesync_protocol::UserId;
//! use gamesync_server::{RpcServer, ServerConfig};
//!
//! let secret = b"my-secure-secret-32-bytes-long!".to_vec();
//! let server = RpcServer::new(ServerConfig::default().with_auth(secret));
//!
//! // Hand tokens to signed-in users; clients send them with every call
//! let token = server.issue_token(&UserId::generate()).unwrap();
//! assert_eq!(token.len(), 112);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod server;
mod store;

pub use auth::{AuthConfig, TokenValidator};
pub use config::{ServerConfig, DEFAULT_MAX_PAYLOAD_BYTES};
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use server::RpcServer;
pub use store::{SaveRecord, SaveStore};
