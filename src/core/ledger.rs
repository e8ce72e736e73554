//! Credit ledger for synthesis billing.
//!
//! Each billing principal owns one balance row. Debits are applied
//! unconditionally once synthesis has produced a result, so a balance can
//! go negative when concurrent generations race past the same up-front
//! check; admission control happens before synthesis, not here.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use xxhash_rust::xxh3::xxh3_128;

/// Errors that can occur during ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The principal has no credit allocation.
    #[error("no credit allocation for principal {0}")]
    NotFound(String),

    /// I/O error occurred during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// A principal's credit balance.
///
/// `credits_available` is signed: overdraft is representable and reported,
/// never silently clamped. `credits_used` counts usage in the current
/// allocation period while `total_credits_used` is lifetime usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreditBalance {
    pub credits_available: i64,
    pub credits_used: u64,
    pub total_credits_used: u64,
}

/// Interface for credit balance persistence.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Retrieves a principal's balance. Fails with [`LedgerError::NotFound`]
    /// when the principal has no allocation.
    async fn balance(&self, principal_id: &str) -> Result<CreditBalance>;

    /// Deducts credits after a completed generation and returns the updated
    /// balance. The deduction is applied even if it takes the balance
    /// negative.
    async fn debit(&self, principal_id: &str, amount: u64) -> Result<CreditBalance>;

    /// Grants credits, creating the allocation if the principal has none.
    async fn credit(&self, principal_id: &str, amount: u64) -> Result<CreditBalance>;

    /// Credits currently available to the principal. A principal with no
    /// allocation has zero credits rather than an error.
    async fn available_credits(&self, principal_id: &str) -> Result<i64> {
        match self.balance(principal_id).await {
            Ok(balance) => Ok(balance.credits_available),
            Err(LedgerError::NotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

fn apply_debit(balance: &mut CreditBalance, principal_id: &str, amount: u64) {
    balance.credits_available -= amount as i64;
    balance.credits_used += amount;
    balance.total_credits_used += amount;
    if balance.credits_available < 0 {
        warn!(
            principal = %principal_id,
            available = balance.credits_available,
            "credit balance went negative"
        );
    }
}

fn apply_credit(balance: &mut CreditBalance, amount: u64) {
    balance.credits_available += amount as i64;
}

/// Memory-based ledger store.
#[derive(Default)]
pub struct MemoryLedgerStore {
    balances: RwLock<HashMap<String, CreditBalance>>,
}

impl MemoryLedgerStore {
    /// Creates an empty memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn balance(&self, principal_id: &str) -> Result<CreditBalance> {
        self.balances
            .read()
            .get(principal_id)
            .copied()
            .ok_or_else(|| LedgerError::NotFound(principal_id.to_string()))
    }

    async fn debit(&self, principal_id: &str, amount: u64) -> Result<CreditBalance> {
        let mut balances = self.balances.write();
        let balance = balances
            .get_mut(principal_id)
            .ok_or_else(|| LedgerError::NotFound(principal_id.to_string()))?;
        apply_debit(balance, principal_id, amount);
        Ok(*balance)
    }

    async fn credit(&self, principal_id: &str, amount: u64) -> Result<CreditBalance> {
        let mut balances = self.balances.write();
        let balance = balances
            .entry(principal_id.to_string())
            .or_insert(CreditBalance {
                credits_available: 0,
                credits_used: 0,
                total_credits_used: 0,
            });
        apply_credit(balance, amount);
        Ok(*balance)
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem-based ledger store with one JSON file per principal.
pub struct FilesystemLedgerStore {
    base_path: PathBuf,
}

impl FilesystemLedgerStore {
    /// Creates a filesystem ledger rooted at `base_path`.
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn balance_path(&self, principal_id: &str) -> PathBuf {
        let hash = format!("{:032x}", xxh3_128(principal_id.as_bytes()));
        self.base_path.join(format!("{hash}.json"))
    }

    async fn read_balance(&self, principal_id: &str) -> Result<Option<CreditBalance>> {
        match fs::read(self.balance_path(principal_id)).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_balance(&self, principal_id: &str, balance: &CreditBalance) -> Result<()> {
        let path = self.balance_path(principal_id);
        let data = serde_json::to_vec(balance)?;

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for FilesystemLedgerStore {
    async fn balance(&self, principal_id: &str) -> Result<CreditBalance> {
        self.read_balance(principal_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(principal_id.to_string()))
    }

    async fn debit(&self, principal_id: &str, amount: u64) -> Result<CreditBalance> {
        let mut balance = self.balance(principal_id).await?;
        apply_debit(&mut balance, principal_id, amount);
        self.write_balance(principal_id, &balance).await?;
        Ok(balance)
    }

    async fn credit(&self, principal_id: &str, amount: u64) -> Result<CreditBalance> {
        let mut balance = self
            .read_balance(principal_id)
            .await?
            .unwrap_or(CreditBalance {
                credits_available: 0,
                credits_used: 0,
                total_credits_used: 0,
            });
        apply_credit(&mut balance, amount);
        self.write_balance(principal_id, &balance).await?;
        Ok(balance)
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
