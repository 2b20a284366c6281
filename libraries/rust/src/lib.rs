//! Stock price checker: quotes, per-IP likes and relative likes.

#[cfg(feature = "store")]
/// Persisted like records and the find-or-create logic around them
pub mod store;

#[cfg(feature = "quote")]
/// External price quote client
pub mod quote;

#[cfg(all(feature = "store", feature = "quote"))]
/// Quote and comparison orchestration
pub mod prices;

/// Tracing subscriber setup
pub mod logger;
