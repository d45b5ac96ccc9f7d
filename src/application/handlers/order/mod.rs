//! Order handlers.

mod create_order;
mod get_order;
mod update_order_status;

pub use create_order::{CreateOrderCommand, CreateOrderHandler};
pub use get_order::GetOrderHandler;
pub use update_order_status::{UpdateOrderStatusCommand, UpdateOrderStatusHandler};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::test_support::{seed_member, seed_tenant};
    use crate::application::Notifier;
    use crate::domain::foundation::{Money, ProductId, TenantId};
    use crate::domain::ledger::{LedgerError, OrderLineRequest, OrderStatus, Product};
    use crate::domain::tenancy::Role;

    async fn product(store: &InMemoryStore, tenant: TenantId, price: i64, active: bool) -> ProductId {
        let product = Product {
            id: ProductId::new(),
            tenant_id: tenant,
            name: "Day pass".into(),
            price: Money::from_cents(price),
            is_active: active,
        };
        let id = product.id;
        store.put_product(product).await;
        id
    }

    fn order_of(product_id: ProductId, quantity: u32) -> CreateOrderCommand {
        CreateOrderCommand {
            customer_id: None,
            items: vec![OrderLineRequest { product_id, quantity }],
            currency: None,
            notes: None,
        }
    }

    fn create_handler(store: &InMemoryStore, bus: &InMemoryEventBus) -> CreateOrderHandler {
        CreateOrderHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Notifier::new(Arc::new(bus.clone())),
        )
    }

    #[tokio::test]
    async fn order_lifecycle_and_visibility() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let staff = seed_member(&store, tenant, Role::Staff).await;
        let customer = seed_member(&store, tenant, Role::Customer).await;
        let other_customer = seed_member(&store, tenant, Role::Customer).await;
        let pass = product(&store, tenant, 2500, true).await;

        let order = create_handler(&store, &bus)
            .handle(&customer, order_of(pass, 2))
            .await
            .unwrap();
        assert_eq!(order.total, Money::from_cents(5000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.currency.as_str(), "MYR");

        let getter = GetOrderHandler::new(Arc::new(store.clone()));
        assert!(getter.handle(&customer, order.id).await.is_ok());
        assert!(getter.handle(&staff, order.id).await.is_ok());
        let err = getter.handle(&other_customer, order.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));

        let updater = UpdateOrderStatusHandler::new(
            Arc::new(store.clone()),
            Notifier::new(Arc::new(bus.clone())),
        );
        for status in [OrderStatus::Confirmed, OrderStatus::Completed, OrderStatus::Refunded] {
            let updated = updater
                .handle(&staff, UpdateOrderStatusCommand { order_id: order.id, status })
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }

        let err = updater
            .handle(
                &staff,
                UpdateOrderStatusCommand {
                    order_id: order.id,
                    status: OrderStatus::Cancelled,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        assert_eq!(bus.events_of_type("order.status_changed.v1").len(), 3);
    }

    #[tokio::test]
    async fn inactive_or_foreign_products_are_unavailable() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let other = seed_tenant(&store).await;
        let customer = seed_member(&store, tenant, Role::Customer).await;
        let retired = product(&store, tenant, 1000, false).await;
        let foreign = product(&store, other, 1000, true).await;

        for product_id in [retired, foreign] {
            let err = create_handler(&store, &bus)
                .handle(&customer, order_of(product_id, 1))
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::ProductUnavailable(id) if id == product_id));
        }
    }

    #[tokio::test]
    async fn customer_cannot_order_for_someone_else() {
        let store = InMemoryStore::new();
        let bus = InMemoryEventBus::new();
        let tenant = seed_tenant(&store).await;
        let customer = seed_member(&store, tenant, Role::Customer).await;
        let other = seed_member(&store, tenant, Role::Customer).await;
        let pass = product(&store, tenant, 1000, true).await;

        let mut cmd = order_of(pass, 1);
        cmd.customer_id = Some(other.user_id);
        let err = create_handler(&store, &bus).handle(&customer, cmd).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }
}
