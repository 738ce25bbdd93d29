//! Contract of the external shielded-pool SDK.
//!
//! Proof generation, note scanning and fee computation all live behind
//! [`PrivacyPool`]. This crate only sequences calls into it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::encryption::KeyDeriver;
use crate::storage::ScanStorage;
use crate::PoolError;

/// Wallet callback that signs a serialized transaction built by the SDK.
///
/// Implementations may wait on user approval for an unbounded time.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign `transaction` and return the signed bytes
    async fn sign_transaction(&self, transaction: Vec<u8>) -> Result<Vec<u8>, PoolError>;
}

/// Runtime configuration keys exposed by the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    /// Minimum withdrawal fee in SOL
    WithdrawRentFee,
    /// Proportional withdrawal fee rate
    WithdrawFeeRate,
}

impl ConfigKey {
    /// Get the SDK's name for this key
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::WithdrawRentFee => "withdraw_rent_fee",
            ConfigKey::WithdrawFeeRate => "withdraw_fee_rate",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spendable pool note visible to a scanning key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Note value in lamports
    pub lamports: u64,
    /// Note commitment as reported by the SDK
    pub commitment: String,
}

/// Aggregate balance of a set of notes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub lamports: u64,
}

/// Arguments for a shielded deposit
pub struct DepositRequest<'a, K> {
    /// Key the deposited note is encrypted to
    pub encryption_key: &'a K,
    /// Amount to shield
    pub amount_lamports: u64,
    /// Base path of the proving key material
    pub key_base_path: &'a str,
    /// Paying wallet address
    pub payer: &'a str,
    /// Wallet signing callback
    pub signer: &'a dyn TransactionSigner,
    /// Client-side scan cache
    pub storage: &'a dyn ScanStorage,
}

/// Arguments for a shielded withdrawal
pub struct WithdrawRequest<'a, K> {
    pub encryption_key: &'a K,
    pub amount_lamports: u64,
    pub key_base_path: &'a str,
    /// Wallet address acting as fee payer of record
    pub owner: &'a str,
    /// Destination address for the unshielded funds
    pub recipient: &'a str,
    pub storage: &'a dyn ScanStorage,
}

/// Arguments for a note scan
pub struct ScanRequest<'a, K> {
    pub encryption_key: &'a K,
    pub owner: &'a str,
    pub storage: &'a dyn ScanStorage,
}

/// Result of a deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Transaction signature
    pub tx: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_lamports: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_lamports: Option<u64>,
}

/// Result of a withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// Transaction signature
    pub tx: String,
    pub recipient: String,
    /// Amount received by the recipient, after fees
    pub amount_lamports: u64,
    pub fee_lamports: u64,
}

/// The shielded-pool SDK
#[async_trait]
pub trait PrivacyPool: KeyDeriver + Send + Sync {
    /// Shield `amount_lamports` from the payer into a note for the request's key
    async fn deposit(
        &self,
        request: DepositRequest<'_, Self::EncryptionKey>,
    ) -> Result<DepositReceipt, PoolError>;

    /// Unshield `amount_lamports` of notes owned by the request's key
    async fn withdraw(
        &self,
        request: WithdrawRequest<'_, Self::EncryptionKey>,
    ) -> Result<WithdrawReceipt, PoolError>;

    /// Enumerate the notes reachable by the request's key
    async fn get_utxos(
        &self,
        request: ScanRequest<'_, Self::EncryptionKey>,
    ) -> Result<Vec<Utxo>, PoolError>;

    /// Read a numeric runtime configuration value
    async fn get_config(&self, key: ConfigKey) -> Result<f64, PoolError>;

    /// Sum the value of a note set
    fn balance_from_utxos(&self, utxos: &[Utxo]) -> Balance {
        Balance {
            lamports: utxos
                .iter()
                .fold(0u64, |acc, utxo| acc.saturating_add(utxo.lamports)),
        }
    }
}
