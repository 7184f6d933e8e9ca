//! Cache Module
//!
//! Version-scoped, typed caching on top of a key-value store.

mod key;
mod versioned;


// Re-export public types
pub use key::VersionedKey;
pub use versioned::VersionedCache;
