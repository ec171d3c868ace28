use comptoir_accounting::{AccountingEntry, TrialBalance};
use comptoir_auth::Permission;
use comptoir_core::DocumentRef;

use super::Engine;
use crate::context::RequestContext;
use crate::error::EngineResult;

impl Engine {
    /// Posted entries in posting order, optionally limited to one source document.
    pub fn accounting_entries(
        &self,
        ctx: &RequestContext,
        source: Option<DocumentRef>,
    ) -> EngineResult<Vec<AccountingEntry>> {
        self.query(ctx, &Permission::ACCOUNTING_READ, |tx, _| {
            Ok(tx
                .entries()
                .filter(|e| source.is_none_or(|s| e.source == s))
                .cloned()
                .collect())
        })
    }

    pub fn trial_balance(&self, ctx: &RequestContext) -> EngineResult<TrialBalance> {
        self.query(ctx, &Permission::ACCOUNTING_READ, |tx, _| {
            Ok(TrialBalance::from_entries(tx.entries()))
        })
    }

    /// Set the bank-reconciled flag on entries. Returns how many changed.
    pub fn mark_reconciled(&self, ctx: &RequestContext, entry_ids: &[u64]) -> EngineResult<usize> {
        self.transition("accounting.mark_reconciled", ctx, &Permission::ACCOUNTING_RECONCILE, |tx, _| {
            let changed = tx.mark_reconciled(entry_ids)?;
            tracing::info!(tenant_id = %ctx.tenant_id, requested = entry_ids.len(), changed, "entries reconciled");
            Ok(changed)
        })
    }
}
