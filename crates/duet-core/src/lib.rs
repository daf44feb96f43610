//! duet-core - Core library for Duet
//!
//! This crate contains the client-side sync layer for Duet: the identity
//! and message models, the durable snapshot store, the remote-store
//! gateway, and the session orchestration shared by all front ends.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod models;
pub mod service;
pub mod snapshot;
pub mod state;
pub mod util;

pub use error::{Error, Result};
pub use models::{ContactRef, Message, UserIdentity};
pub use service::{OpOutcome, SyncService};
