//! # Catalog API
//!
//! HTTP and WebSocket surface over the document catalog.
//!
//! ```text
//! ┌─────────────────────┐
//! │   REST Endpoints    │ <- /documents, /health
//! ├─────────────────────┤
//! │   WebSocket Stream  │ <- /ws
//! ├─────────────────────┤
//! │     Broadcaster     │ <- fan-out of snapshot updates
//! ├─────────────────────┤
//! │    WatchContext     │ <- change + snapshot watchers
//! └─────────────────────┘
//! ```
//!
//! Every route except `/health` requires a credential, either as
//! `Authorization: Bearer <token>` or as `?token=<token>`.
//!
//! Subscribers on `/ws` receive `{"type": "UPDATE", "data": [...]}` whenever
//! the persisted snapshot is rewritten.

pub mod auth;
pub mod broadcaster;
pub mod context;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;

pub use auth::{Authenticated, Authenticator, AuthError, Principal, StaticTokenAuthenticator};
pub use broadcaster::{Broadcaster, DeliveryFailure, DeliveryReport, SubscriberChannel, SubscriberId};
pub use context::WatchContext;
pub use error::ApiError;
pub use server::{AppState, CatalogServer};
pub use types::*;
