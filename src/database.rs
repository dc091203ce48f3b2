// AmberDB Engine Context
//
// Owns the shared engine components and hands out transactions.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use log::{error, info, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::catalog::{MetadataManager, TABLE_CATALOG};
use crate::common::config::DatabaseConfig;
use crate::common::types::TxnId;
use crate::query::executor::result::{ExecutionResult, QueryError};
use crate::query::planner::Planner;
use crate::record::RecordError;
use crate::storage::buffer::BufferPoolManager;
use crate::storage::disk::{DiskManager, DiskManagerError};
use crate::transaction::concurrency::LockTable;
use crate::transaction::wal::{LogManager, LogManagerError};
use crate::transaction::{Transaction, TransactionError, TransactionState};

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Recovery met an undecodable log; no new transaction may start
    #[error("Database is poisoned by a corrupt log and refuses new transactions")]
    Poisoned,

    #[error("Recovery refused while {0} transaction(s) are still active")]
    TransactionsActive(usize),

    #[error("Disk manager error: {0}")]
    DiskManagerError(#[from] DiskManagerError),

    #[error("Log manager error: {0}")]
    LogManagerError(#[from] LogManagerError),

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("Query error: {0}")]
    QueryError(#[from] QueryError),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// The engine: one data directory, one log, one buffer pool, one lock table.
///
/// Opening a directory that already existed runs recovery before anything
/// else, so the caller sees only committed data.
pub struct Database {
    config: DatabaseConfig,
    disk_manager: Arc<DiskManager>,
    log_manager: Arc<LogManager>,
    buffer_pool: Arc<BufferPoolManager>,
    lock_table: Arc<LockTable>,
    metadata: Arc<MetadataManager>,
    next_txn_id: AtomicU32,
    poisoned: AtomicBool,
    /// Handles given out by `new_tx`; entries are pruned once finished or dropped
    live: Mutex<Vec<Weak<Transaction>>>,
}

impl Database {
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let disk_manager = Arc::new(DiskManager::new(&config.data_dir, config.block_size)?);
        let log_manager = Arc::new(LogManager::new(disk_manager.clone(), config.log_file.clone())?);
        let buffer_pool = Arc::new(BufferPoolManager::new(
            config.buffer_pool_size,
            disk_manager.clone(),
            log_manager.clone(),
            config.pin_timeout,
        ));
        let lock_table = Arc::new(LockTable::new(config.lock_timeout));
        let mut next_txn_id: TxnId = 1;

        let mut begin = || -> Result<Arc<Transaction>> {
            let txn_id = next_txn_id;
            next_txn_id += 1;
            let tx = Transaction::new(
                txn_id,
                disk_manager.clone(),
                log_manager.clone(),
                buffer_pool.clone(),
                lock_table.clone(),
            )?;
            Ok(Arc::new(tx))
        };

        if disk_manager.is_new() {
            info!("Creating new database in {:?}", config.data_dir);
        } else {
            info!("Recovering existing database in {:?}", config.data_dir);
            let tx = begin()?;
            tx.recover()?;
            tx.commit()?;
        }

        let tx = begin()?;
        let metadata = (|| -> Result<MetadataManager> {
            let catalog_is_new = tx.size(&format!("{}.tbl", TABLE_CATALOG))? == 0;
            Ok(MetadataManager::new(catalog_is_new, &tx)?)
        })();
        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!("Rollback of catalog setup failed: {}", rollback_err);
                }
                return Err(e);
            }
        };
        tx.commit()?;

        Ok(Self {
            config,
            disk_manager,
            log_manager,
            buffer_pool,
            lock_table,
            metadata: Arc::new(metadata),
            next_txn_id: AtomicU32::new(next_txn_id),
            poisoned: AtomicBool::new(false),
            live: Mutex::new(Vec::new()),
        })
    }

    /// Start a new transaction. Waits while a recovery is running.
    pub fn new_tx(&self) -> Result<Arc<Transaction>> {
        let mut live = self.live.lock();
        prune_finished(&mut live);
        let tx = self.begin()?;
        live.push(Arc::downgrade(&tx));
        Ok(tx)
    }

    /// Number of transactions from `new_tx` that are still active
    pub fn active_transactions(&self) -> usize {
        let mut live = self.live.lock();
        prune_finished(&mut live);
        live.len()
    }

    /// Undo every unfinished transaction in the log.
    ///
    /// Refused with `TransactionsActive` while a transaction handed out by
    /// `new_tx` is still active; a dropped handle counts as crashed. No new
    /// transaction starts until recovery finishes. A corrupt log poisons the
    /// database.
    pub fn recover(&self) -> Result<()> {
        let mut live = self.live.lock();
        prune_finished(&mut live);
        if !live.is_empty() {
            return Err(DatabaseError::TransactionsActive(live.len()));
        }
        let tx = self.begin()?;
        if let Err(e) = tx.recover() {
            if e.is_corruption() {
                error!("Recovery found a corrupt log: {}", e);
                self.poisoned.store(true, Ordering::SeqCst);
            }
            return Err(e.into());
        }
        tx.commit()?;
        Ok(())
    }

    fn begin(&self) -> Result<Arc<Transaction>> {
        if self.is_poisoned() {
            return Err(DatabaseError::Poisoned);
        }
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        let tx = Transaction::new(
            txn_id,
            self.disk_manager.clone(),
            self.log_manager.clone(),
            self.buffer_pool.clone(),
            self.lock_table.clone(),
        )?;
        Ok(Arc::new(tx))
    }

    /// Run `f` in a fresh transaction. Commits on success; on any error the
    /// transaction is rolled back and the error returned.
    pub fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Arc<Transaction>) -> Result<T>,
    {
        let tx = self.new_tx()?;
        let outcome = f(&tx).and_then(|value| {
            tx.commit()?;
            Ok(value)
        });
        if outcome.is_err() {
            if let Err(rollback_err) = tx.rollback() {
                warn!("Rollback of transaction {} failed: {}", tx.txn_id(), rollback_err);
            }
        }
        outcome
    }

    /// Run one SQL statement in its own transaction
    pub fn execute(&self, sql: &str) -> Result<ExecutionResult> {
        let planner = self.planner();
        self.run(|tx| Ok(planner.execute(sql, tx)?))
    }

    pub fn planner(&self) -> Planner {
        Planner::new(self.metadata.clone())
    }

    pub fn metadata(&self) -> Arc<MetadataManager> {
        self.metadata.clone()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn buffer_pool(&self) -> Arc<BufferPoolManager> {
        self.buffer_pool.clone()
    }

    pub fn log_manager(&self) -> Arc<LogManager> {
        self.log_manager.clone()
    }

    pub fn disk_manager(&self) -> Arc<DiskManager> {
        self.disk_manager.clone()
    }

    pub fn lock_table(&self) -> Arc<LockTable> {
        self.lock_table.clone()
    }
}

fn prune_finished(live: &mut Vec<Weak<Transaction>>) {
    live.retain(|tx| {
        tx.upgrade()
            .is_some_and(|tx| tx.state() == TransactionState::Active)
    });
}
