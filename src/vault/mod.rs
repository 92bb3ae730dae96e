//! Vault module: encrypted secret storage.
//!
//! This module provides:
//! - `SecretSet`, the decrypted key/value mapping (`secret`)
//! - Atomic, durable file persistence (`storage`)
//! - High-level `VaultStore` for loading and saving a vault (`store`)
//! - Vault location and scope resolution (`resolver`)

pub mod resolver;
pub mod secret;
pub mod storage;
pub mod store;

// Re-export the most commonly used items.
pub use resolver::{ResolvedVault, Resolver, VaultScope};
pub use secret::{validate_key, SecretSet};
pub use store::VaultStore;
