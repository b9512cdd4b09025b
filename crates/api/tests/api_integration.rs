//! Integration tests for the API server.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use common::{Money, ProductId, UserId};
use domain::{Address, FulfillmentStatus, Order, OrderLine, PaymentStatus, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use reconciler::PaymentRecord;
use store::OrderStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, api::InMemoryBackends) {
    let (state, backends) = api::create_default_state(Duration::from_secs(5));
    let app = api::create_app(state, get_metrics_handle());
    (app, backends)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn product(stock: Option<u32>, price_cents: i64) -> Product {
    Product {
        id: ProductId::new(),
        name: "Linen Shirt".to_string(),
        active: true,
        stock,
        sizes: vec![],
        colors: vec![],
        price: Money::from_cents(price_cents),
        original_price: None,
        created_at: Utc::now(),
    }
}

fn shipping_address() -> Address {
    Address {
        name: "Ana Souza".to_string(),
        phone: "11999990000".to_string(),
        email: "ana@example.com".to_string(),
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

fn confirmed_order(subtotal_cents: i64) -> Order {
    let mut order = Order::place(
        UserId::new(),
        Money::from_cents(subtotal_cents),
        Some(shipping_address()),
        vec![OrderLine {
            product_id: ProductId::new(),
            name: "Linen Shirt".to_string(),
            unit_price: Money::from_cents(subtotal_cents),
            quantity: 1,
            size: None,
            color: None,
        }],
    );
    order.payment_status = PaymentStatus::Paid;
    order.fulfillment_status = FulfillmentStatus::Confirmed;
    order
}

fn add_item_request(user: UserId, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/cart/items")
        .header("content-type", "application/json")
        .header("x-user-id", user.to_string())
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn label_request_body() -> serde_json::Value {
    serde_json::json!({
        "service_id": 2,
        "from": {
            "name": "Warehouse",
            "phone": "11999990000",
            "email": "ops@example.com",
            "document": "12345678900",
            "address": "Rua das Flores",
            "number": "42",
            "district": "Centro",
            "city": "Sao Paulo",
            "state_abbr": "SP",
            "postal_code": "01001-000"
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_cart_requires_a_user() {
    let (app, _) = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cart/items")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({
                        "product_id": ProductId::new().to_string()
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(Request::builder().uri("/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_to_cart_merges_and_views_with_live_prices() {
    let (app, backends) = setup();
    let p = product(Some(10), 4_990);
    let product_id = p.id;
    backends.catalog.insert_product(p).await;
    let user = UserId::new();

    let response = app
        .clone()
        .oneshot(add_item_request(
            user,
            serde_json::json!({ "product_id": product_id.to_string(), "quantity": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let line = body_json(response).await;
    assert_eq!(line["quantity"], 2);
    let line_id = line["line_id"].as_str().unwrap().to_string();

    // A repeated add merges into the same line.
    let response = app
        .clone()
        .oneshot(add_item_request(
            user,
            serde_json::json!({ "product_id": product_id.to_string() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let merged = body_json(response).await;
    assert_eq!(merged["line_id"], line_id.as_str());
    assert_eq!(merged["quantity"], 3);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/cart")
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["lines"].as_array().unwrap().len(), 1);
    assert_eq!(view["lines"][0]["name"], "Linen Shirt");
    assert_eq!(view["item_count"], 3);
    assert_eq!(view["total"], 3 * 4_990);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let (app, backends) = setup();
    let p = product(Some(10), 1_000);
    let product_id = p.id;
    backends.catalog.insert_product(p).await;

    let response = app
        .oneshot(add_item_request(
            UserId::new(),
            serde_json::json!({ "product_id": product_id.to_string(), "quantity": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (app, _) = setup();

    let response = app
        .oneshot(add_item_request(
            UserId::new(),
            serde_json::json!({ "product_id": ProductId::new().to_string() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insufficient_stock_is_a_conflict() {
    let (app, backends) = setup();
    let p = product(Some(1), 1_000);
    let product_id = p.id;
    backends.catalog.insert_product(p).await;

    let response = app
        .oneshot(add_item_request(
            UserId::new(),
            serde_json::json!({ "product_id": product_id.to_string(), "quantity": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["available"], 1);
}

#[tokio::test]
async fn test_missing_selection_is_a_bad_request() {
    let (app, backends) = setup();
    let mut p = product(Some(5), 1_000);
    p.sizes = vec!["S".to_string(), "M".to_string()];
    let product_id = p.id;
    backends.catalog.insert_product(p).await;

    let response = app
        .oneshot(add_item_request(
            UserId::new(),
            serde_json::json!({ "product_id": product_id.to_string() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("size"));
}

#[tokio::test]
async fn test_update_and_remove_a_line() {
    let (app, backends) = setup();
    let p = product(Some(10), 1_000);
    let product_id = p.id;
    backends.catalog.insert_product(p).await;
    let user = UserId::new();

    let response = app
        .clone()
        .oneshot(add_item_request(
            user,
            serde_json::json!({ "product_id": product_id.to_string(), "quantity": 2 }),
        ))
        .await
        .unwrap();
    let line = body_json(response).await;
    let line_id = line["line_id"].as_str().unwrap().to_string();

    // Set the quantity in place.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/cart/items/{line_id}"))
                .header("content-type", "application/json")
                .header("x-user-id", user.to_string())
                .body(Body::from(r#"{"quantity": 5}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["quantity"], 5);

    // Zero removes the line.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/cart/items/{line_id}"))
                .header("content-type", "application/json")
                .header("x-user-id", user.to_string())
                .body(Body::from(r#"{"quantity": 0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Deleting it again stays a no-op 204.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/cart/items/{line_id}"))
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/cart")
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let view = body_json(response).await;
    assert_eq!(view["lines"].as_array().unwrap().len(), 0);
    assert_eq!(view["item_count"], 0);
}

#[tokio::test]
async fn test_clear_cart_is_idempotent() {
    let (app, backends) = setup();
    let p = product(Some(10), 1_000);
    let product_id = p.id;
    backends.catalog.insert_product(p).await;
    let user = UserId::new();

    app.clone()
        .oneshot(add_item_request(
            user,
            serde_json::json!({ "product_id": product_id.to_string() }),
        ))
        .await
        .unwrap();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cart")
                    .header("x-user-id", user.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/cart")
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let view = body_json(response).await;
    assert_eq!(view["lines"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_approved_notification_confirms_the_order() {
    let (app, backends) = setup();
    let order = Order::place(UserId::new(), Money::from_cents(10_000), None, Vec::new());
    let order_id = order.id;
    backends.orders.insert_order(&order).await.unwrap();
    backends.gateway.insert_payment(
        "12345",
        PaymentRecord {
            external_reference: Some(order_id.to_string()),
            status: Some("approved".to_string()),
        },
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payment-notifications?topic=payment&id=12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["status"], "applied");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let order_json = body_json(response).await;
    assert_eq!(order_json["payment_status"], "paid");
    assert_eq!(order_json["fulfillment_status"], "confirmed");
}

#[tokio::test]
async fn test_notification_aliases_type_and_data_id() {
    let (app, backends) = setup();
    let order = Order::place(UserId::new(), Money::from_cents(5_000), None, Vec::new());
    let order_id = order.id;
    backends.orders.insert_order(&order).await.unwrap();
    backends.gateway.insert_payment(
        "777",
        PaymentRecord {
            external_reference: Some(order_id.to_string()),
            status: Some("pending".to_string()),
        },
    );

    // The gateway also delivers as GET with `type` and `data.id`.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/payment-notifications?type=payment&data.id=777")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["status"], "applied");
}

#[tokio::test]
async fn test_notification_without_params_is_rejected() {
    let (app, _) = setup();

    for uri in [
        "/payment-notifications",
        "/payment-notifications?topic=payment",
        "/payment-notifications?id=1",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_unknown_topic_is_acknowledged() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payment-notifications?topic=chargebacks&id=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["status"], "unknown_topic");
}

#[tokio::test]
async fn test_label_run_ships_the_order() {
    let (app, backends) = setup();
    let order = confirmed_order(12_345);
    let order_id = order.id;
    backends.orders.insert_order(&order).await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/shipment-label"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&label_request_body()).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let label = body_json(response).await;
    assert_eq!(label["shipment_id"], "SHIP-0001");
    assert_eq!(label["tracking_code"], "TRACK-0001");
    assert!(label["label_url"].as_str().unwrap().ends_with(".pdf"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let order_json = body_json(response).await;
    assert_eq!(order_json["fulfillment_status"], "shipped");
    assert_eq!(order_json["tracking_code"], "TRACK-0001");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}/shipment-log"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let log = body_json(response).await;
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["step"], "CartAdd");
    assert_eq!(entries[4]["step"], "Track");
    assert!(entries.iter().all(|e| e["status"] == "completed"));
}

#[tokio::test]
async fn test_failed_label_step_is_a_bad_gateway() {
    let (app, backends) = setup();
    backends.provider.set_fail_on_generate(true);
    let order = confirmed_order(5_000);
    let order_id = order.id;
    backends.orders.insert_order(&order).await.unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/shipment-label"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&label_request_body()).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["detail"]["error"], "generation failed");

    // The order did not advance past confirmed.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let order_json = body_json(response).await;
    assert_eq!(order_json["fulfillment_status"], "confirmed");
    assert!(order_json["tracking_code"].is_null());
}

#[tokio::test]
async fn test_label_for_unready_order_is_a_conflict() {
    let (app, backends) = setup();
    let order = Order::place(
        UserId::new(),
        Money::from_cents(5_000),
        Some(shipping_address()),
        Vec::new(),
    );
    let order_id = order.id;
    backends.orders.insert_order(&order).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/shipment-label"))
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&label_request_body()).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let (app, _) = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{fake_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/orders/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
