#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;

use comptoir_auth::{Principal, Role};
use comptoir_core::{DomainError, PointOfSaleId, ProductId, Settlement, TenantId, UserId, WarehouseId};
use comptoir_infra::{EngineError, Engine, InMemoryCatalog, RequestContext, StaticConfigSource, TenantConfig};
use comptoir_inventory::StockPosition;
use comptoir_products::Product;

pub struct Shop {
    pub engine: Arc<Engine>,
    pub catalog: Arc<InMemoryCatalog>,
    pub tenant_id: TenantId,
    pub admin: RequestContext,
    pub a: WarehouseId,
    pub b: WarehouseId,
    pub till: PointOfSaleId,
}

pub fn shop() -> Shop {
    shop_with(TenantConfig::default())
}

pub fn shop_with(config: TenantConfig) -> Shop {
    comptoir_observability::init_for_tests();
    let tenant_id = TenantId::new();
    let catalog = Arc::new(InMemoryCatalog::new());
    let engine = Engine::in_memory(catalog.clone(), Arc::new(StaticConfigSource::new(config)));
    Shop {
        engine: Arc::new(engine),
        catalog,
        tenant_id,
        admin: RequestContext::new(Principal::with_roles(UserId::new(), tenant_id, vec![Role::ADMIN])),
        a: WarehouseId::new(),
        b: WarehouseId::new(),
        till: PointOfSaleId::new(),
    }
}

impl Shop {
    pub fn product(&self, sku: &str, sale_price: Decimal) -> ProductId {
        let id = ProductId::new();
        self.catalog.register(self.tenant_id, Product::new(id, sku, sku, sale_price));
        id
    }

    pub fn as_role(&self, role: Role) -> RequestContext {
        RequestContext::new(Principal::with_roles(UserId::new(), self.tenant_id, vec![role]))
    }

    /// Receive `quantity` units at `unit_cost` through an on-account purchase.
    pub fn stock(&self, product_id: ProductId, warehouse_id: WarehouseId, quantity: i64, unit_cost: Decimal) {
        let purchase = self
            .engine
            .create_purchase(&self.admin, warehouse_id, Settlement::OnAccount, None)
            .unwrap();
        let id = purchase.id_typed();
        self.engine
            .add_purchase_item(&self.admin, id, product_id, quantity, unit_cost)
            .unwrap();
        self.engine.confirm_purchase(&self.admin, id).unwrap();
        self.engine.receive_purchase(&self.admin, id).unwrap();
    }

    pub fn position(&self, product_id: ProductId, warehouse_id: WarehouseId) -> StockPosition {
        self.engine
            .current_position(&self.admin, product_id, warehouse_id)
            .unwrap()
    }
}

pub fn domain(err: EngineError) -> DomainError {
    match err {
        EngineError::Domain(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}
