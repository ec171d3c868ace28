//! Document workflow engine.
//!
//! Every operation authorizes the caller, then runs as one store transaction:
//! the document's events, stock movements, cash movements and accounting
//! entries of a transition commit together or not at all.
//!
//! ```text
//! authorize → transact { load → handle → ledger / cash / GL writes → append } → commit
//! ```

mod accounting;
mod cash;
mod counts;
mod ledger;
mod purchases;
mod sales;
mod transfers;

use std::sync::Arc;

use serde_json::Value as JsonValue;

use comptoir_auth::{Authorizer, Permission, RolePolicy};
use comptoir_core::{DocumentRef, DomainError, ProductId, TenantId};
use comptoir_events::EventEnvelope;
use comptoir_products::{Product, ProductCatalog};

use crate::config::{TenantConfig, TenantConfigSource};
use crate::context::RequestContext;
use crate::error::{EngineError, EngineResult};
use crate::store::{InMemoryStore, Transaction};

pub use cash::ExpenseRecord;
pub use purchases::PurchaseReceipt;
pub use sales::SaleCompletion;
pub use transfers::TransferExecution;

pub struct Engine {
    store: Arc<InMemoryStore>,
    catalog: Arc<dyn ProductCatalog>,
    config: Arc<dyn TenantConfigSource>,
    authorizer: Arc<dyn Authorizer>,
}

impl Engine {
    pub fn new(
        store: Arc<InMemoryStore>,
        catalog: Arc<dyn ProductCatalog>,
        config: Arc<dyn TenantConfigSource>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            authorizer,
        }
    }

    /// Fresh in-memory store guarded by [`RolePolicy::standard`].
    pub fn in_memory(catalog: Arc<dyn ProductCatalog>, config: Arc<dyn TenantConfigSource>) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            catalog,
            config,
            Arc::new(RolePolicy::standard()),
        )
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    fn product(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Product, DomainError> {
        self.catalog
            .product(tenant_id, product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))
    }

    /// Authorize, then run `f` as one transaction with the tenant's configuration.
    fn transition<T, F>(
        &self,
        operation: &'static str,
        ctx: &RequestContext,
        permission: &Permission,
        f: F,
    ) -> EngineResult<T>
    where
        F: FnOnce(&mut Transaction<'_>, &TenantConfig) -> EngineResult<T>,
    {
        ctx.authorize(self.authorizer.as_ref(), permission)?;
        let config = self.config.config(ctx.tenant_id);
        let result: EngineResult<T> = self.store.transact(ctx.tenant_id, |tx| {
            let out = f(tx, &config)?;
            let writes = tx.writes();
            tracing::debug!(
                tenant_id = %ctx.tenant_id,
                operation,
                events = writes.events,
                movements = writes.movements,
                entries = writes.entries,
                cash_movements = writes.cash_movements,
                "transition staged"
            );
            Ok(out)
        });
        if let Err(err) = &result {
            log_failure(operation, ctx, err);
        }
        result
    }

    /// Authorize, then run a read-only `f`.
    fn query<T, F>(&self, ctx: &RequestContext, permission: &Permission, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Transaction<'_>, &TenantConfig) -> EngineResult<T>,
    {
        ctx.authorize(self.authorizer.as_ref(), permission)?;
        let config = self.config.config(ctx.tenant_id);
        self.store.read(ctx.tenant_id, |tx| f(tx, &config))
    }

    /// Committed events of a document in sequence order.
    pub fn document_history(
        &self,
        ctx: &RequestContext,
        document: DocumentRef,
    ) -> EngineResult<Vec<EventEnvelope<JsonValue>>> {
        self.query(ctx, &Permission::LEDGER_READ, |tx, _| {
            Ok(tx
                .history(document.kind, document.id)?
                .iter()
                .map(|e| e.to_envelope())
                .collect())
        })
    }
}

fn log_failure(operation: &'static str, ctx: &RequestContext, err: &EngineError) {
    if err.is_internal() {
        tracing::error!(operation, tenant_id = %ctx.tenant_id, error = %err, "transition failed on an internal error");
    } else {
        tracing::debug!(operation, tenant_id = %ctx.tenant_id, error = %err, "transition rejected");
    }
}
