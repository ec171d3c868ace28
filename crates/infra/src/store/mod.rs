//! Transactional in-memory store.
//!
//! Each tenant owns one [`TenantBook`] behind its own mutex. A transition runs
//! inside [`InMemoryStore::transact`]: every write is staged on the
//! [`Transaction`] and reaches the book only when the closure returns `Ok`.
//! Holding the tenant lock for the whole closure makes state checks and the
//! writes that depend on them one atomic step; tenants never contend.

mod stream;
mod transaction;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use comptoir_accounting::AccountingEntry;
use comptoir_cash::{CashMovement, SessionId};
use comptoir_core::{AggregateId, PointOfSaleId, TenantId, WarehouseId};
use comptoir_inventory::{StockKey, StockMovement, StockPosition};
use comptoir_reconciliation::CountId;

pub use stream::{StoredEvent, UncommittedEvent};
pub use transaction::{StockRules, Transaction, WriteSet};

/// Everything one tenant has committed.
#[derive(Debug, Default)]
pub struct TenantBook {
    streams: HashMap<AggregateId, Vec<StoredEvent>>,
    positions: BTreeMap<StockKey, StockPosition>,
    movements: Vec<StockMovement>,
    entries: Vec<AccountingEntry>,
    postings: u64,
    cash_movements: Vec<CashMovement>,
    /// At most one open session per point of sale.
    open_sessions: HashMap<PointOfSaleId, SessionId>,
    /// At most one started count per warehouse.
    active_counts: HashMap<WarehouseId, CountId>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tenants: RwLock<HashMap<TenantId, Arc<Mutex<TenantBook>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, tenant_id: TenantId) -> Arc<Mutex<TenantBook>> {
        if let Some(book) = self
            .tenants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tenant_id)
        {
            return Arc::clone(book);
        }
        let mut tenants = self.tenants.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(tenants.entry(tenant_id).or_default())
    }

    /// Lock a tenant's book.
    ///
    /// A transition that panicked only ever held staged writes, so a poisoned
    /// lock still guards a consistent book and is taken over.
    fn lock(book: &Mutex<TenantBook>, tenant_id: TenantId) -> MutexGuard<'_, TenantBook> {
        book.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(%tenant_id, "recovering tenant book after a panicked transition");
            book.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Run `f` as one atomic unit for `tenant_id`.
    ///
    /// Staged writes are committed when `f` returns `Ok` and discarded otherwise.
    pub fn transact<T, E, F>(&self, tenant_id: TenantId, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    {
        let book = self.book(tenant_id);
        let mut guard = Self::lock(&book, tenant_id);
        let mut tx = Transaction::begin(tenant_id, &mut guard);
        let out = f(&mut tx)?;
        tx.commit();
        Ok(out)
    }

    /// Run a read-only `f` against the tenant's committed state.
    pub fn read<T, E, F>(&self, tenant_id: TenantId, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        let book = self.book(tenant_id);
        let mut guard = Self::lock(&book, tenant_id);
        let tx = Transaction::begin(tenant_id, &mut guard);
        f(&tx)
    }
}
