use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use comptoir_accounting::{AccountingEntry, Posting, validate_balanced};
use comptoir_cash::{CashMovement, CashMovementRequest, SessionId};
use comptoir_core::{
    Aggregate, AggregateId, DocumentKind, DomainError, DomainResult, ExpectedVersion, PointOfSaleId,
    ProductId, TenantId, WarehouseId,
};
use comptoir_inventory::{
    MovementReason, MovementRequest, NegativeStockPolicy, PositionMismatch, StockKey, StockMovement,
    StockPosition,
};
use comptoir_reconciliation::CountId;

use super::TenantBook;
use super::stream::{self, StoredEvent, UncommittedEvent};
use crate::error::{EngineError, EngineResult, StoreError};

/// Ledger rules a movement is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockRules {
    pub negative_stock: NegativeStockPolicy,
    /// Reject non-count movements in a warehouse with a count in progress.
    pub freeze_counted_warehouses: bool,
}

/// Number of records a transaction has staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSet {
    pub events: usize,
    pub movements: usize,
    pub entries: usize,
    pub cash_movements: usize,
}

/// Staged writes over one tenant's book.
///
/// Reads see committed state overlaid with what this transaction staged, so a
/// transition touching the same stock key twice observes its own first write.
pub struct Transaction<'a> {
    tenant_id: TenantId,
    book: &'a mut TenantBook,
    now: DateTime<Utc>,
    streams: HashMap<AggregateId, Vec<StoredEvent>>,
    positions: BTreeMap<StockKey, StockPosition>,
    movements: Vec<StockMovement>,
    entries: Vec<AccountingEntry>,
    postings: u64,
    cash_movements: Vec<CashMovement>,
    sessions: HashMap<PointOfSaleId, Option<SessionId>>,
    counts: HashMap<WarehouseId, Option<CountId>>,
    reconciled: BTreeSet<u64>,
}

impl<'a> Transaction<'a> {
    pub(super) fn begin(tenant_id: TenantId, book: &'a mut TenantBook) -> Self {
        Self {
            tenant_id,
            book,
            now: Utc::now(),
            streams: HashMap::new(),
            positions: BTreeMap::new(),
            movements: Vec::new(),
            entries: Vec::new(),
            postings: 0,
            cash_movements: Vec::new(),
            sessions: HashMap::new(),
            counts: HashMap::new(),
            reconciled: BTreeSet::new(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Timestamp shared by every record of this transaction.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn writes(&self) -> WriteSet {
        WriteSet {
            events: self.streams.values().map(Vec::len).sum(),
            movements: self.movements.len(),
            entries: self.entries.len(),
            cash_movements: self.cash_movements.len(),
        }
    }

    // -- document streams ---------------------------------------------------

    pub fn stream(&self, aggregate_id: AggregateId) -> Vec<StoredEvent> {
        let committed = self.book.streams.get(&aggregate_id).map(Vec::as_slice).unwrap_or_default();
        let staged = self.streams.get(&aggregate_id).map(Vec::as_slice).unwrap_or_default();
        committed.iter().chain(staged).cloned().collect()
    }

    /// Committed events of one document, checked against its kind.
    pub fn history(&self, kind: DocumentKind, aggregate_id: AggregateId) -> EngineResult<Vec<StoredEvent>> {
        let history = self.stream(aggregate_id);
        stream::validate_loaded_stream(self.tenant_id, aggregate_id, kind.aggregate_type(), &history)?;
        Ok(history)
    }

    /// Rehydrate a document from its stream.
    ///
    /// Returns the aggregate and the stream version it was rebuilt at.
    pub fn load<A>(&self, kind: DocumentKind, aggregate_id: AggregateId, empty: A) -> EngineResult<(A, u64)>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.history(kind, aggregate_id)?;
        let mut aggregate = empty;
        stream::apply_history(&mut aggregate, &history)?;
        Ok((aggregate, stream::stream_version(&history)))
    }

    pub fn append<E>(
        &mut self,
        kind: DocumentKind,
        aggregate_id: AggregateId,
        expected: ExpectedVersion,
        events: &[E],
    ) -> EngineResult<Vec<StoredEvent>>
    where
        E: comptoir_events::Event + Serialize,
    {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let current = stream::stream_version(&self.stream(aggregate_id));
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!("expected {expected:?}, found {current}")).into());
        }

        let uncommitted = events
            .iter()
            .map(|e| {
                UncommittedEvent::from_typed(
                    self.tenant_id,
                    aggregate_id,
                    kind.aggregate_type(),
                    Uuid::now_v7(),
                    e,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = stream::sequence(current, uncommitted);
        self.streams
            .entry(aggregate_id)
            .or_default()
            .extend(committed.iter().cloned());
        Ok(committed)
    }

    /// Load, decide, append and apply in one step.
    ///
    /// The state check in `handle` and the append at the loaded version both
    /// happen under the tenant lock, so a stale caller fails in `handle`.
    pub fn execute<A>(
        &mut self,
        kind: DocumentKind,
        aggregate_id: AggregateId,
        empty: A,
        command: &A::Command,
    ) -> EngineResult<A>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: comptoir_events::Event + Serialize + DeserializeOwned,
    {
        let (mut aggregate, version) = self.load(kind, aggregate_id, empty)?;
        let decided = aggregate.handle(command)?;
        self.append(kind, aggregate_id, ExpectedVersion::Exact(version), &decided)?;
        for event in &decided {
            aggregate.apply(event);
        }
        Ok(aggregate)
    }

    // -- ledger store -------------------------------------------------------

    pub fn stock_key(&self, product_id: ProductId, warehouse_id: WarehouseId) -> StockKey {
        StockKey::new(self.tenant_id, product_id, warehouse_id)
    }

    pub fn position(&self, key: StockKey) -> StockPosition {
        self.positions
            .get(&key)
            .or_else(|| self.book.positions.get(&key))
            .cloned()
            .unwrap_or_else(|| StockPosition::empty(key))
    }

    fn all_positions(&self) -> BTreeMap<StockKey, StockPosition> {
        let mut merged = self.book.positions.clone();
        merged.extend(self.positions.iter().map(|(k, p)| (*k, p.clone())));
        merged
    }

    /// Positions of a warehouse in key order.
    pub fn warehouse_positions(&self, warehouse_id: WarehouseId) -> Vec<StockPosition> {
        self.all_positions()
            .into_values()
            .filter(|p| p.key().warehouse_id == warehouse_id)
            .collect()
    }

    pub fn movements(&self) -> impl Iterator<Item = &StockMovement> {
        self.book.movements.iter().chain(self.movements.iter())
    }

    pub fn movements_for(&self, key: StockKey) -> Vec<StockMovement> {
        self.movements().filter(|m| m.key() == key).cloned().collect()
    }

    /// Every key whose materialised position differs from its log.
    pub fn verify_positions(&self) -> Vec<PositionMismatch> {
        let positions = self.all_positions();
        comptoir_inventory::verify(positions.values(), self.movements())
    }

    fn next_movement_id(&self) -> u64 {
        (self.book.movements.len() + self.movements.len()) as u64 + 1
    }

    /// Plan, record and fold one stock movement.
    pub fn apply_movement(&mut self, request: MovementRequest, rules: StockRules) -> DomainResult<StockMovement> {
        if rules.freeze_counted_warehouses
            && request.reason != MovementReason::CountAdjustment
            && self.active_count(request.warehouse_id).is_some()
        {
            return Err(DomainError::WarehouseLocked(request.warehouse_id));
        }

        let key = self.stock_key(request.product_id, request.warehouse_id);
        let mut position = self.position(key);
        let unit_cost_at_time = position.plan(&request, rules.negative_stock)?;

        let movement = StockMovement {
            id: self.next_movement_id(),
            tenant_id: self.tenant_id,
            product_id: request.product_id,
            warehouse_id: request.warehouse_id,
            direction: request.direction,
            quantity: request.quantity,
            unit_cost_at_time,
            reason: request.reason,
            document: request.document,
            occurred_at: self.now,
        };
        position.apply(&movement);
        if position.is_negative() {
            tracing::warn!(
                tenant_id = %self.tenant_id,
                product_id = %key.product_id,
                warehouse_id = %key.warehouse_id,
                quantity = position.quantity(),
                "stock position went negative under allow policy"
            );
        }
        self.positions.insert(key, position);
        self.movements.push(movement.clone());
        Ok(movement)
    }

    // -- general ledger -----------------------------------------------------

    pub fn entries(&self) -> impl Iterator<Item = &AccountingEntry> {
        self.book.entries.iter().chain(self.entries.iter())
    }

    /// Persist a balanced posting as one set of entries sharing a posting id.
    pub fn post(&mut self, posting: Posting, date: NaiveDate) -> DomainResult<Vec<AccountingEntry>> {
        if posting.is_empty() {
            return Ok(vec![]);
        }
        if let Err(err) = validate_balanced(&posting.lines) {
            tracing::error!(
                tenant_id = %self.tenant_id,
                source = %posting.source,
                error = %err,
                "refusing to persist unbalanced posting"
            );
            return Err(err);
        }

        self.postings += 1;
        let posting_id = self.book.postings + self.postings;
        let first_id = (self.book.entries.len() + self.entries.len()) as u64 + 1;

        let entries: Vec<AccountingEntry> = posting
            .lines
            .into_iter()
            .zip(first_id..)
            .map(|(line, id)| AccountingEntry {
                id,
                posting_id,
                tenant_id: self.tenant_id,
                account: line.account,
                debit: line.debit,
                credit: line.credit,
                date,
                source: posting.source,
                description: posting.description.clone(),
                rapproche: false,
                posted_at: self.now,
            })
            .collect();
        self.entries.extend(entries.iter().cloned());
        Ok(entries)
    }

    /// Flag committed entries as bank-reconciled. Returns how many changed.
    pub fn mark_reconciled(&mut self, entry_ids: &[u64]) -> DomainResult<usize> {
        let mut changed = 0;
        for id in entry_ids {
            let entry = self
                .book
                .entries
                .iter()
                .find(|e| e.id == *id)
                .ok_or_else(|| DomainError::not_found(format!("accounting entry {id}")))?;
            if !entry.rapproche && self.reconciled.insert(*id) {
                changed += 1;
            }
        }
        Ok(changed)
    }

    // -- cash register ------------------------------------------------------

    pub fn open_session(&self, point_of_sale: PointOfSaleId) -> Option<SessionId> {
        match self.sessions.get(&point_of_sale) {
            Some(staged) => *staged,
            None => self.book.open_sessions.get(&point_of_sale).copied(),
        }
    }

    pub fn set_open_session(&mut self, point_of_sale: PointOfSaleId, session: Option<SessionId>) {
        self.sessions.insert(point_of_sale, session);
    }

    /// Record a movement in the open session of `point_of_sale`.
    pub fn record_cash(
        &mut self,
        point_of_sale: PointOfSaleId,
        request: CashMovementRequest,
    ) -> DomainResult<CashMovement> {
        request.validate()?;
        let session_id = self
            .open_session(point_of_sale)
            .ok_or_else(|| DomainError::CashSessionRequired(point_of_sale.to_string()))?;

        let movement = CashMovement {
            id: (self.book.cash_movements.len() + self.cash_movements.len()) as u64 + 1,
            tenant_id: self.tenant_id,
            session_id,
            point_of_sale,
            direction: request.direction,
            category: request.category,
            amount: request.amount,
            document: request.document,
            description: request.description,
            occurred_at: self.now,
        };
        self.cash_movements.push(movement.clone());
        Ok(movement)
    }

    pub fn session_movements(&self, session_id: SessionId) -> Vec<CashMovement> {
        self.book
            .cash_movements
            .iter()
            .chain(self.cash_movements.iter())
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect()
    }

    // -- count locks --------------------------------------------------------

    pub fn active_count(&self, warehouse_id: WarehouseId) -> Option<CountId> {
        match self.counts.get(&warehouse_id) {
            Some(staged) => *staged,
            None => self.book.active_counts.get(&warehouse_id).copied(),
        }
    }

    pub fn set_active_count(&mut self, warehouse_id: WarehouseId, count: Option<CountId>) {
        self.counts.insert(warehouse_id, count);
    }

    pub(super) fn commit(self) {
        let book = self.book;
        for (id, events) in self.streams {
            book.streams.entry(id).or_default().extend(events);
        }
        book.positions.extend(self.positions);
        book.movements.extend(self.movements);
        book.entries.extend(self.entries);
        book.postings += self.postings;
        for entry in book.entries.iter_mut().filter(|e| self.reconciled.contains(&e.id)) {
            entry.rapproche = true;
        }
        book.cash_movements.extend(self.cash_movements);
        for (pos, session) in self.sessions {
            match session {
                Some(id) => book.open_sessions.insert(pos, id),
                None => book.open_sessions.remove(&pos),
            };
        }
        for (warehouse, count) in self.counts {
            match count {
                Some(id) => book.active_counts.insert(warehouse, id),
                None => book.active_counts.remove(&warehouse),
            };
        }
    }
}
