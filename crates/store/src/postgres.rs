//! PostgreSQL store implementations.
//!
//! All queries are runtime `sqlx::query` with explicit binds. The
//! concurrency-sensitive writes are single conditional statements:
//! cart upserts ride the natural-key unique constraint (`NULLS NOT
//! DISTINCT`, so null size/color participate in the key), payment
//! transitions guard on `payment_status <> 'paid'`, and the stock
//! decrement guards on `stock >= n`.

use async_trait::async_trait;
use common::{LineId, Money, OrderId, ProductId, UserId, VariantId};
use domain::{
    Address, CartLine, FulfillmentStatus, LabelStep, Order, OrderLine, PaymentStatus, Product,
    ShipmentLogEntry, StepStatus, StockUnit, Variant,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::cart::CartStore;
use crate::catalog::CatalogStore;
use crate::order::{OrderStore, PaymentTransition};
use crate::shipment_log::ShipmentLogStore;
use crate::{Result, StoreError};

/// Applies the bundled migrations to the given database.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        active: row.try_get("active")?,
        stock: row.try_get::<Option<i32>, _>("stock")?.map(|s| s as u32),
        sizes: row.try_get("sizes")?,
        colors: row.try_get("colors")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        original_price: row
            .try_get::<Option<i64>, _>("original_price_cents")?
            .map(Money::from_cents),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_variant(row: PgRow) -> Result<Variant> {
    Ok(Variant {
        id: VariantId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        size: row.try_get("size")?,
        color: row.try_get("color")?,
        stock: row.try_get::<i32, _>("stock")? as u32,
    })
}

fn row_to_cart_line(row: PgRow) -> Result<CartLine> {
    Ok(CartLine {
        id: LineId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        size: row.try_get("size")?,
        color: row.try_get("color")?,
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        added_at: row.try_get("added_at")?,
    })
}

/// PostgreSQL-backed catalog store.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a new PostgreSQL catalog store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, active, stock, sizes, colors, price_cents, original_price_cents, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_product).transpose()
    }

    async fn variants_for_product(&self, product_id: ProductId) -> Result<Vec<Variant>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, size, color, stock
            FROM product_variants
            WHERE product_id = $1
            ORDER BY size, color
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_variant).collect()
    }

    async fn decrement_stock_if_sufficient(
        &self,
        unit: &StockUnit,
        quantity: u32,
    ) -> Result<bool> {
        let result = match unit {
            StockUnit::Product(id) => {
                sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                    .bind(id.as_uuid())
                    .bind(quantity as i32)
                    .execute(&self.pool)
                    .await?
            }
            StockUnit::Variant(id) => {
                sqlx::query(
                    "UPDATE product_variants SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
                )
                .bind(id.as_uuid())
                .bind(quantity as i32)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() == 1)
    }
}

/// PostgreSQL-backed cart store.
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    /// Creates a new PostgreSQL cart store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn find_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, product_id, size, color, quantity, added_at
            FROM cart_lines
            WHERE user_id = $1
              AND product_id = $2
              AND size IS NOT DISTINCT FROM $3
              AND color IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(size)
        .bind(color)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_cart_line).transpose()
    }

    async fn get_line(&self, user_id: UserId, line_id: LineId) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, product_id, size, color, quantity, added_at
            FROM cart_lines
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(line_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_cart_line).transpose()
    }

    async fn upsert_line(&self, line: CartLine) -> Result<CartLine> {
        // Racing adds for the same natural key collapse into one line
        // here; the constraint treats NULL size/color as key values.
        let row = sqlx::query(
            r#"
            INSERT INTO cart_lines (id, user_id, product_id, size, color, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, product_id, size, color)
            DO UPDATE SET quantity = cart_lines.quantity + EXCLUDED.quantity
            RETURNING id, user_id, product_id, size, color, quantity, added_at
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(line.user_id.as_uuid())
        .bind(line.product_id.as_uuid())
        .bind(&line.size)
        .bind(&line.color)
        .bind(line.quantity as i32)
        .bind(line.added_at)
        .fetch_one(&self.pool)
        .await?;

        row_to_cart_line(row)
    }

    async fn set_quantity(&self, user_id: UserId, line_id: LineId, quantity: u32) -> Result<bool> {
        let result =
            sqlx::query("UPDATE cart_lines SET quantity = $3 WHERE user_id = $1 AND id = $2")
                .bind(user_id.as_uuid())
                .bind(line_id.as_uuid())
                .bind(quantity as i32)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_line(&self, user_id: UserId, line_id: LineId) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND id = $2")
            .bind(user_id.as_uuid())
            .bind(line_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_user(&self, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, product_id, size, color, quantity, added_at
            FROM cart_lines
            WHERE user_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_cart_line).collect()
    }
}

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: PgRow, lines: Vec<OrderLine>) -> Result<Order> {
        let payment_raw: String = row.try_get("payment_status")?;
        let payment_status =
            PaymentStatus::parse(&payment_raw).ok_or_else(|| StoreError::Decode {
                column: "payment_status",
                value: payment_raw.clone(),
            })?;

        let fulfillment_raw: String = row.try_get("fulfillment_status")?;
        let fulfillment_status =
            FulfillmentStatus::parse(&fulfillment_raw).ok_or_else(|| StoreError::Decode {
                column: "fulfillment_status",
                value: fulfillment_raw.clone(),
            })?;

        let shipping_address: Option<Address> = row
            .try_get::<Option<serde_json::Value>, _>("shipping_address")?
            .map(serde_json::from_value)
            .transpose()?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            payment_status,
            fulfillment_status,
            tracking_code: row.try_get("tracking_code")?,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            shipping_address,
            lines,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, payment_status, fulfillment_status, tracking_code,
                   subtotal_cents, shipping_address, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let line_rows = sqlx::query(
            r#"
            SELECT product_id, name, unit_price_cents, quantity, size, color
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let lines = line_rows
            .into_iter()
            .map(|row| {
                Ok(OrderLine {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    name: row.try_get("name")?,
                    unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    size: row.try_get("size")?,
                    color: row.try_get("color")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::row_to_order(row, lines).map(Some)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let shipping_address = order
            .shipping_address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, payment_status, fulfillment_status, tracking_code,
                                subtotal_cents, shipping_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.payment_status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(&order.tracking_code)
        .bind(order.subtotal.cents())
        .bind(shipping_address)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, position, product_id, name, unit_price_cents,
                                         quantity, size, color)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(line.product_id.as_uuid())
            .bind(&line.name)
            .bind(line.unit_price.cents())
            .bind(line.quantity as i32)
            .bind(&line.size)
            .bind(&line.color)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn transition_payment(
        &self,
        id: OrderId,
        target: PaymentStatus,
    ) -> Result<PaymentTransition> {
        let result = if target.is_paid() {
            sqlx::query(
                r#"
                UPDATE orders
                SET payment_status = 'paid', fulfillment_status = 'confirmed'
                WHERE id = $1 AND payment_status <> 'paid'
                "#,
            )
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1 AND payment_status <> 'paid'")
                .bind(id.as_uuid())
                .bind(target.as_str())
                .execute(&self.pool)
                .await?
        };

        if result.rows_affected() == 1 {
            return Ok(PaymentTransition::Applied {
                confirmed: target.is_paid(),
            });
        }

        // The guarded update matched nothing: either the order is absent
        // or it is already paid. Paid is sticky, so this read is stable.
        let current: Option<String> =
            sqlx::query_scalar("SELECT payment_status FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(match current {
            None => PaymentTransition::NotFound,
            Some(_) if target.is_paid() => PaymentTransition::AlreadyPaid,
            Some(_) => PaymentTransition::Superseded,
        })
    }

    async fn update_fulfillment(
        &self,
        id: OrderId,
        status: FulfillmentStatus,
        tracking_code: Option<&str>,
    ) -> Result<bool> {
        let result = match tracking_code {
            Some(code) => {
                sqlx::query(
                    "UPDATE orders SET fulfillment_status = $2, tracking_code = $3 WHERE id = $1",
                )
                .bind(id.as_uuid())
                .bind(status.as_str())
                .bind(code)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE orders SET fulfillment_status = $2 WHERE id = $1")
                    .bind(id.as_uuid())
                    .bind(status.as_str())
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() == 1)
    }
}

/// PostgreSQL-backed shipment log store.
#[derive(Clone)]
pub struct PostgresShipmentLogStore {
    pool: PgPool,
}

impl PostgresShipmentLogStore {
    /// Creates a new PostgreSQL shipment log store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShipmentLogStore for PostgresShipmentLogStore {
    async fn append(&self, entry: &ShipmentLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shipment_log (order_id, step, status, shipment_id, detail, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.order_id.as_uuid())
        .bind(entry.step.as_str())
        .bind(entry.status.as_str())
        .bind(&entry.shipment_id)
        .bind(&entry.detail)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn entries_for_order(&self, order_id: OrderId) -> Result<Vec<ShipmentLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, step, status, shipment_id, detail, recorded_at
            FROM shipment_log
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let step_raw: String = row.try_get("step")?;
                let step = LabelStep::parse(&step_raw).ok_or_else(|| StoreError::Decode {
                    column: "step",
                    value: step_raw.clone(),
                })?;

                let status_raw: String = row.try_get("status")?;
                let status = StepStatus::parse(&status_raw).ok_or_else(|| StoreError::Decode {
                    column: "status",
                    value: status_raw.clone(),
                })?;

                Ok(ShipmentLogEntry {
                    order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
                    step,
                    status,
                    shipment_id: row.try_get("shipment_id")?,
                    detail: row.try_get("detail")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }
}
