//! # subtrack-store
//!
//! Local persistence for the SubTrack client, backed by SQLite.
//!
//! The store is a synchronous key to string cache: each slot holds one
//! serialized subscription set (guest or per user) or the remembered user id.
//! It also keeps the outbox of records whose remote write is still pending.

pub mod database;
pub mod migrations;
pub mod models;
pub mod outbox;
pub mod slots;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
