//! In-memory stand-in for the shielded-pool SDK.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use plinks_core::{
    ConfigKey, DepositReceipt, DepositRequest, FlowConfig, KeyDeriver, LinkSecret, PoolError,
    PrivacyPool, ScanRequest, Session, TransactionSigner, Utxo, WithdrawReceipt,
    WithdrawRequest,
};

pub const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
pub const ORIGIN: &str = "https://app.example.com";

/// Cache entry the mock SDK writes while scanning. Its name matches the purge
/// markers, so flows clear it before every scan.
pub const FETCH_OFFSET_KEY: &str = "privacy_cash_fetch_offset";

pub type MockKey = [u8; 32];

pub fn session() -> Session {
    Session::new().connect_wallet(WALLET)
}

pub fn flow_config() -> FlowConfig {
    FlowConfig::default()
}

pub fn secret(byte: u8) -> LinkSecret {
    LinkSecret::from_bytes([byte; 32])
}

fn key_for(entropy: &[u8]) -> MockKey {
    let hash = blake2b_simd::Params::new()
        .hash_length(32)
        .personal(b"plinks_MockKey__")
        .hash(entropy);
    let mut key = [0u8; 32];
    key.copy_from_slice(hash.as_bytes());
    key
}

#[derive(Default)]
pub struct MockPool {
    notes: Mutex<HashMap<MockKey, Vec<Utxo>>>,
    config: Mutex<HashMap<ConfigKey, f64>>,
    deposit_error: Mutex<Option<PoolError>>,
    withdraw_error: Mutex<Option<PoolError>>,
    scan_delay: Mutex<Option<Duration>>,
    withdraw_fee: AtomicUsize,
    derivations: AtomicUsize,
    deposits: AtomicUsize,
    withdrawals: AtomicUsize,
    scans: AtomicUsize,
    tx_counter: AtomicUsize,
    contaminated: AtomicBool,
}

impl MockPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Credit a note to `secret` without going through a deposit
    pub fn fund(&self, secret: &LinkSecret, lamports: u64) {
        let key = key_for(secret.as_bytes());
        let mut notes = self.notes.lock();
        let entry = notes.entry(key).or_default();
        entry.push(Utxo {
            lamports,
            commitment: format!("funded-{}", entry.len()),
        });
    }

    pub fn set_config(&self, key: ConfigKey, value: f64) {
        self.config.lock().insert(key, value);
    }

    pub fn fail_deposits(&self, error: PoolError) {
        *self.deposit_error.lock() = Some(error);
    }

    pub fn fail_withdrawals(&self, error: PoolError) {
        *self.withdraw_error.lock() = Some(error);
    }

    pub fn delay_scans(&self, delay: Duration) {
        *self.scan_delay.lock() = Some(delay);
    }

    /// Fee the mock charges on withdrawal
    pub fn charge_withdraw_fee(&self, lamports: usize) {
        self.withdraw_fee.store(lamports, Ordering::SeqCst);
    }

    pub fn derivations(&self) -> usize {
        self.derivations.load(Ordering::SeqCst)
    }

    pub fn deposits(&self) -> usize {
        self.deposits.load(Ordering::SeqCst)
    }

    pub fn withdrawals(&self) -> usize {
        self.withdrawals.load(Ordering::SeqCst)
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Whether a scan ever resumed from another key's cached offset
    pub fn contaminated(&self) -> bool {
        self.contaminated.load(Ordering::SeqCst)
    }

    fn next_tx(&self) -> String {
        format!("sig{}", self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl KeyDeriver for MockPool {
    type EncryptionKey = MockKey;

    fn derive_encryption_key(&self, entropy: &[u8]) -> MockKey {
        self.derivations.fetch_add(1, Ordering::SeqCst);
        key_for(entropy)
    }
}

#[async_trait]
impl PrivacyPool for MockPool {
    async fn deposit(
        &self,
        request: DepositRequest<'_, MockKey>,
    ) -> Result<DepositReceipt, PoolError> {
        self.deposits.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.deposit_error.lock().clone() {
            return Err(error);
        }

        request
            .signer
            .sign_transaction(request.amount_lamports.to_le_bytes().to_vec())
            .await?;

        let tx = self.next_tx();
        self.notes
            .lock()
            .entry(*request.encryption_key)
            .or_default()
            .push(Utxo {
                lamports: request.amount_lamports,
                commitment: tx.clone(),
            });

        Ok(DepositReceipt {
            tx,
            recipient: None,
            amount_lamports: Some(request.amount_lamports),
            fee_lamports: None,
        })
    }

    async fn withdraw(
        &self,
        request: WithdrawRequest<'_, MockKey>,
    ) -> Result<WithdrawReceipt, PoolError> {
        self.withdrawals.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.withdraw_error.lock().clone() {
            return Err(error);
        }

        let mut notes = self.notes.lock();
        let available: u64 = notes
            .get(request.encryption_key)
            .map(|utxos| utxos.iter().map(|u| u.lamports).sum())
            .unwrap_or(0);
        if available < request.amount_lamports {
            return Err(PoolError::with_status(400, "Bad Request: insufficient notes"));
        }
        notes.remove(request.encryption_key);

        let fee = self.withdraw_fee.load(Ordering::SeqCst) as u64;
        Ok(WithdrawReceipt {
            tx: self.next_tx(),
            recipient: request.recipient.to_string(),
            amount_lamports: request.amount_lamports.saturating_sub(fee),
            fee_lamports: fee,
        })
    }

    async fn get_utxos(&self, request: ScanRequest<'_, MockKey>) -> Result<Vec<Utxo>, PoolError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let delay = *self.scan_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let own = hex::encode(request.encryption_key);
        let cached = request.storage.get(FETCH_OFFSET_KEY);
        if cached.as_deref().is_some_and(|cached| cached != own) {
            self.contaminated.store(true, Ordering::SeqCst);
            return Ok(Vec::new());
        }
        request
            .storage
            .set(FETCH_OFFSET_KEY, &own)
            .map_err(|e| PoolError::new(e.to_string()))?;

        Ok(self
            .notes
            .lock()
            .get(request.encryption_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_config(&self, key: ConfigKey) -> Result<f64, PoolError> {
        self.config
            .lock()
            .get(&key)
            .copied()
            .ok_or_else(|| PoolError::new(format!("config {} unavailable", key)))
    }
}

/// Wallet that approves everything
#[derive(Default)]
pub struct MockSigner {
    signed: AtomicUsize,
}

impl MockSigner {
    pub fn signed(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSigner for MockSigner {
    async fn sign_transaction(&self, transaction: Vec<u8>) -> Result<Vec<u8>, PoolError> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(transaction)
    }
}
