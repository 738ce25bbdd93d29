//! Bearer secrets for payment links
//!
//! A [`LinkSecret`] is the only credential controlling funds deposited for a
//! link: whoever holds its base58 string can re-derive the pool scanning key
//! and withdraw. It is never tied to a wallet account.

use std::str::FromStr;

use blake2b_simd::Params as Blake2bParams;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// Length of a payment link secret in bytes
pub const SECRET_LEN: usize = 32;

/// Length of the random material behind a link id
pub const LINK_ID_LEN: usize = 16;

/// Blake2b personalization for secret fingerprints
const FINGERPRINT_PERSONALIZATION: &[u8; 16] = b"plinks_SecretFpr";

/// A 256-bit payment link secret
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct LinkSecret {
    inner: [u8; SECRET_LEN],
}

impl LinkSecret {
    /// Create a secret from raw bytes
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self { inner: bytes }
    }

    /// Create a new random secret from the given CSPRNG
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        rng.fill_bytes(&mut bytes);
        let secret = Self { inner: bytes };
        bytes.zeroize();
        secret
    }

    /// Create a new random secret from the operating system RNG
    pub fn generate() -> Self {
        Self::random(&mut OsRng)
    }

    /// Get the raw secret bytes
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.inner
    }

    /// Encode as base58 for sharing
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.inner).into_string()
    }

    /// Decode a base58 secret.
    ///
    /// Surrounding whitespace is ignored so pasted values decode cleanly.
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(Error::InvalidSecret("empty secret".to_string()));
        }

        let mut decoded = bs58::decode(encoded).into_vec()?;
        if decoded.len() != SECRET_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(Error::InvalidSecret(format!(
                "Expected {} bytes, got {}",
                SECRET_LEN, len
            )));
        }

        let mut bytes = [0u8; SECRET_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        let secret = Self::from_bytes(bytes);
        bytes.zeroize();
        Ok(secret)
    }

    /// Short one-way identifier for correlating log lines.
    ///
    /// Reveals nothing usable about the secret itself.
    pub fn fingerprint(&self) -> String {
        let hash = Blake2bParams::new()
            .hash_length(8)
            .personal(FINGERPRINT_PERSONALIZATION)
            .hash(&self.inner);
        hex::encode(hash.as_bytes())
    }
}

impl FromStr for LinkSecret {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl std::fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSecret")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Generate a link id (base58 of 16 random bytes) from the given RNG.
///
/// Only used for display and tracking; it carries no authority over funds.
pub fn generate_link_id_with<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; LINK_ID_LEN];
    rng.fill_bytes(&mut bytes);
    bs58::encode(bytes).into_string()
}

/// Generate a link id from the operating system RNG
pub fn generate_link_id() -> String {
    generate_link_id_with(&mut OsRng)
}
