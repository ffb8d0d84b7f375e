/// Application name
pub const APP_NAME: &str = "SubTrack";

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Symmetric key size in bytes (for XChaCha20-Poly1305)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Key derivation context for per-user record keys (BLAKE3)
pub const KDF_CONTEXT_RECORD_KEY: &str = "subtrack-record-key-v1";

/// Cache slot holding the guest subscription set
pub const GUEST_CACHE_KEY: &str = "subscriptions";

/// Prefix of the per-user cache slot (`subscriptions_{uid}`)
pub const USER_CACHE_KEY_PREFIX: &str = "subscriptions_";

/// Cache slot remembering the last confirmed user id for optimistic resume
pub const LAST_UID_KEY: &str = "last_uid";

/// Months per year, used to normalise yearly prices
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Default window for confirming a reset, in milliseconds
pub const RESET_CONFIRM_WINDOW_MS: u64 = 3_000;

/// Cache slot key for an authenticated user.
pub fn user_cache_key(uid: &str) -> String {
    format!("{USER_CACHE_KEY_PREFIX}{uid}")
}
