//! Encryption-key adapter
//!
//! The pool SDK derives its note encryption/scanning key from a blob of
//! high-entropy bytes, usually a wallet signature. Payment links feed it
//! the link secret instead, so the secret alone controls the funds.

use crate::LinkSecret;

/// Key derivation routine supplied by the pool SDK
pub trait KeyDeriver {
    /// Opaque encryption/scanning key
    type EncryptionKey: Send + Sync;

    /// Deterministically derive a key from `entropy`
    fn derive_encryption_key(&self, entropy: &[u8]) -> Self::EncryptionKey;
}

/// Derive the pool key for `secret`.
///
/// Never cached: every call derives afresh, so switching secrets cannot reuse
/// a previous secret's key.
pub fn encryption_key_for<D>(deriver: &D, secret: &LinkSecret) -> D::EncryptionKey
where
    D: KeyDeriver + ?Sized,
{
    deriver.derive_encryption_key(secret.as_bytes())
}
