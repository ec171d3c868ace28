use rust_decimal::Decimal;

use comptoir_accounting::{AccountingEntry, BusinessEvent, ExpenseCategory, PostingGenerator};
use comptoir_auth::Permission;
use comptoir_cash::{
    CashCategory, CashDirection, CashMovement, CashMovementRequest, CashSession, SessionCommand, SessionId,
    SessionSummary, SessionTotals,
};
use comptoir_core::{
    Aggregate, AggregateId, DocumentKind, DocumentRef, DomainError, ExpectedVersion, PointOfSaleId, round_money,
};

use super::Engine;
use crate::context::RequestContext;
use crate::error::EngineResult;
use crate::store::Transaction;

/// An expense paid out of a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseRecord {
    pub document: DocumentRef,
    pub cash_movement: CashMovement,
    pub entries: Vec<AccountingEntry>,
}

fn load_session(tx: &Transaction<'_>, session_id: SessionId) -> EngineResult<(CashSession, u64)> {
    tx.load(
        DocumentKind::CashSession,
        session_id.aggregate_id(),
        CashSession::empty(session_id),
    )
}

impl Engine {
    /// Open a register session; one open session per point of sale.
    pub fn open_cash_session(
        &self,
        ctx: &RequestContext,
        point_of_sale: PointOfSaleId,
        opening_balance: Decimal,
    ) -> EngineResult<CashSession> {
        let session_id = SessionId::generate();
        self.transition("cash.session.open", ctx, &Permission::CASH_OPERATE, |tx, _| {
            if let Some(open) = tx.open_session(point_of_sale) {
                return Err(DomainError::conflict(format!(
                    "point of sale {point_of_sale} already has open session {open}"
                ))
                .into());
            }
            let command = SessionCommand::Open {
                tenant_id: ctx.tenant_id,
                session_id,
                point_of_sale,
                opening_balance,
                opened_by: ctx.user_id(),
                occurred_at: tx.now(),
            };
            let session = tx.execute(
                DocumentKind::CashSession,
                session_id.aggregate_id(),
                CashSession::empty(session_id),
                &command,
            )?;
            tx.set_open_session(point_of_sale, Some(session_id));
            tracing::info!(tenant_id = %ctx.tenant_id, %session_id, %point_of_sale, %opening_balance, "cash session opened");
            Ok(session)
        })
    }

    pub fn record_cash_movement(
        &self,
        ctx: &RequestContext,
        point_of_sale: PointOfSaleId,
        request: CashMovementRequest,
    ) -> EngineResult<CashMovement> {
        self.transition("cash.record_movement", ctx, &Permission::CASH_OPERATE, |tx, _| {
            let movement = tx.record_cash(point_of_sale, request)?;
            tracing::info!(
                tenant_id = %ctx.tenant_id,
                session_id = %movement.session_id,
                %point_of_sale,
                amount = %movement.signed_amount(),
                "cash movement recorded"
            );
            Ok(movement)
        })
    }

    /// Pay an expense from the register and post it against its expense account.
    pub fn record_expense(
        &self,
        ctx: &RequestContext,
        point_of_sale: PointOfSaleId,
        category: ExpenseCategory,
        amount: Decimal,
        description: impl Into<String>,
    ) -> EngineResult<ExpenseRecord> {
        let document = DocumentRef::new(DocumentKind::Expense, AggregateId::new());
        let description = description.into();
        self.transition("cash.record_expense", ctx, &Permission::CASH_OPERATE, |tx, config| {
            let amount = round_money(amount, config.money_scale);
            let request = CashMovementRequest::new(CashDirection::Out, CashCategory::Expense, amount, description)
                .for_document(document);
            let cash_movement = tx.record_cash(point_of_sale, request)?;

            let posting = PostingGenerator::new(&config.chart, config.money_scale)
                .generate(document, &BusinessEvent::Expense { category, amount })?;
            let entries = tx.post(posting, tx.now().date_naive())?;

            tracing::info!(
                tenant_id = %ctx.tenant_id,
                %document,
                ?category,
                %amount,
                entries = entries.len(),
                "expense recorded"
            );
            Ok(ExpenseRecord {
                document,
                cash_movement,
                entries,
            })
        })
    }

    /// Close the session against the counted cash and free its point of sale.
    pub fn close_cash_session(
        &self,
        ctx: &RequestContext,
        session_id: SessionId,
        counted_balance: Decimal,
    ) -> EngineResult<SessionSummary> {
        self.transition("cash.session.close", ctx, &Permission::CASH_OPERATE, |tx, _| {
            let (mut session, version) = load_session(tx, session_id)?;
            let totals = SessionTotals::from_movements(&tx.session_movements(session_id));
            let decided = session.handle(&SessionCommand::Close {
                tenant_id: ctx.tenant_id,
                counted_balance,
                totals,
                closed_by: ctx.user_id(),
                occurred_at: tx.now(),
            })?;
            tx.append(
                DocumentKind::CashSession,
                session_id.aggregate_id(),
                ExpectedVersion::Exact(version),
                &decided,
            )?;
            for event in &decided {
                session.apply(event);
            }
            if let Some(point_of_sale) = session.point_of_sale() {
                tx.set_open_session(point_of_sale, None);
            }

            let summary = session.summary(totals);
            let difference = summary.difference.unwrap_or_default();
            if !difference.is_zero() {
                tracing::warn!(
                    tenant_id = %ctx.tenant_id,
                    %session_id,
                    expected = %summary.expected_balance,
                    counted = %counted_balance,
                    %difference,
                    "cash session closed with a difference"
                );
            }
            tracing::info!(tenant_id = %ctx.tenant_id, %session_id, movements = totals.movement_count, "cash session closed");
            Ok(summary)
        })
    }

    pub fn cash_session_summary(&self, ctx: &RequestContext, session_id: SessionId) -> EngineResult<SessionSummary> {
        self.query(ctx, &Permission::CASH_OPERATE, |tx, _| {
            let (session, _) = load_session(tx, session_id)?;
            if !session.is_created() {
                return Err(DomainError::not_found(format!("cash session {session_id}")).into());
            }
            let totals = SessionTotals::from_movements(&tx.session_movements(session_id));
            Ok(session.summary(totals))
        })
    }
}
