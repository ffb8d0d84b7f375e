//! # subtrack-shared
//!
//! Types and pure logic shared by every SubTrack crate: the subscription
//! record and its remote envelope, the record encryption boundary, monthly
//! cost arithmetic and the static product catalog used for suggestions.

pub mod catalog;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod summary;
pub mod types;

pub use error::{CryptoError, SharedError};
pub use types::{Envelope, Frequency, NewSubscription, RemoteDocument, Subscription};
