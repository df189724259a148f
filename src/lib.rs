//! Backchat - chat-history portal core library
//!
//! This library provides the core of the internal chat portal: the
//! cursor-based chat-history pagination engine and the visibility
//! reconciliation protocol that keeps the client's caches consistent
//! under optimistic edits and asynchronous server confirmation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: Persistent chat store and the pagination query engine
//! - `pagination`: Validated page parameters, cache keys, and page types
//! - `cursor`: Opaque cursor codec
//! - `client`: List cache, override store, reconciliation session, probes
//! - `server`: axum HTTP layer over the query engine
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use backchat::client::{ChatListSession, LocalBackend};
//! use backchat::pagination::PageParams;
//! use backchat::storage::SqliteStorage;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Arc::new(SqliteStorage::new()?);
//!     let backend = Arc::new(LocalBackend::new(storage, "alice"));
//!     let session = ChatListSession::new("alice", backend);
//!
//!     let page = session.load_page(&PageParams::first(10)).await?;
//!     println!("{} chats, more: {}", page.chats.len(), page.has_more);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod cursor;
pub mod error;
pub mod pagination;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use client::{ChatBackend, ChatListSession, ListCache, OverrideStore};
pub use config::Config;
pub use error::{BackchatError, Result};
pub use pagination::{ChatPage, PageParams, PaginationKey};
pub use storage::{Chat, SqliteStorage, Visibility};
