use std::time::Duration;

use common::{Money, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Address, FulfillmentStatus, Order, OrderLine, PaymentStatus};
use shipment::{InMemoryShippingProvider, LabelRequest, ShipmentOrchestrator};
use store::{InMemoryOrderStore, InMemoryShipmentLogStore, OrderStore};

fn address(name: &str) -> Address {
    Address {
        name: name.to_string(),
        phone: "11999990000".to_string(),
        email: "ops@example.com".to_string(),
        document: "12345678900".to_string(),
        address: "Rua das Flores".to_string(),
        number: "42".to_string(),
        complement: None,
        district: "Centro".to_string(),
        city: "Sao Paulo".to_string(),
        state_abbr: "SP".to_string(),
        postal_code: "01001-000".to_string(),
    }
}

fn confirmed_order() -> Order {
    let mut order = Order::place(
        UserId::new(),
        Money::from_cents(9_980),
        Some(address("Ana Souza")),
        vec![OrderLine {
            product_id: ProductId::new(),
            name: "Linen Shirt".to_string(),
            unit_price: Money::from_cents(4_990),
            quantity: 2,
            size: None,
            color: None,
        }],
    );
    order.payment_status = PaymentStatus::Paid;
    order.fulfillment_status = FulfillmentStatus::Confirmed;
    order
}

fn bench_full_label_run(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("shipment/full_label_run", |b| {
        b.iter(|| {
            let provider = InMemoryShippingProvider::new();
            let orders = InMemoryOrderStore::new();
            let log = InMemoryShipmentLogStore::new();
            let orchestrator = ShipmentOrchestrator::new(
                provider,
                orders.clone(),
                log,
                Duration::from_secs(5),
            );
            rt.block_on(async {
                let order = confirmed_order();
                let order_id = order.id;
                orders.insert_order(&order).await.unwrap();
                orchestrator
                    .generate_label(LabelRequest {
                        order_id,
                        service_id: 2,
                        from: address("Warehouse"),
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_refused_unconfirmed_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let orders = InMemoryOrderStore::new();
    let orchestrator = ShipmentOrchestrator::new(
        InMemoryShippingProvider::new(),
        orders.clone(),
        InMemoryShipmentLogStore::new(),
        Duration::from_secs(5),
    );
    let mut order = confirmed_order();
    order.fulfillment_status = FulfillmentStatus::Placed;
    let order_id = order.id;
    rt.block_on(async { orders.insert_order(&order).await.unwrap() });

    c.bench_function("shipment/refused_unconfirmed_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = orchestrator
                    .generate_label(LabelRequest {
                        order_id,
                        service_id: 2,
                        from: address("Warehouse"),
                    })
                    .await;
                assert!(result.is_err());
            });
        });
    });
}

criterion_group!(benches, bench_full_label_run, bench_refused_unconfirmed_order);
criterion_main!(benches);
