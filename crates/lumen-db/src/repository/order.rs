//! # Order Repository
//!
//! Orders, their items, and the purchase queries built on top of them.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout                                                               │
//! │  └── create_with_items()   BEGIN; INSERT order; INSERT items; COMMIT   │
//! │  └── set_preference()      once the processor accepted the session     │
//! │                                                                         │
//! │  Webhook / back office                                                  │
//! │  └── update_status_if()    UPDATE ... WHERE id = ? AND status = ?      │
//! │                            0 rows → someone else moved it first        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::product::PRODUCT_COLUMNS;
use crate::error::{DbError, DbResult};
use lumen_core::{Order, OrderItem, OrderStatus, OrderWithItems, Product};

const ORDER_COLUMNS: &str = "id, user_id, payer_email, status, total_cents, currency, \
     external_reference, preference_id, payment_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, title_snapshot, unit_price_cents, \
     quantity, line_total_cents, created_at";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and all of its items atomically.
    ///
    /// Either the order exists with every item, or nothing was written.
    pub async fn create_with_items(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(
            id = %order.id,
            external_reference = %order.external_reference,
            items = items.len(),
            "Creating order"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, payer_email, status, total_cents, currency,
                external_reference, preference_id, payment_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.payer_email)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(&order.currency)
        .bind(&order.external_reference)
        .bind(&order.preference_id)
        .bind(&order.payment_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, title_snapshot, unit_price_cents,
                    quantity, line_total_cents, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.title_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Looks an order up by the reference the processor echoes back.
    pub async fn get_by_external_reference(&self, external_reference: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE external_reference = ?"
        ))
        .bind(external_reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY created_at, id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Order plus items, `None` when the order doesn't exist.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<OrderWithItems>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&order.id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// All orders for the back office, optionally filtered by status.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Order>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));

        if let Some(status) = status {
            qb.push("WHERE status = ").push_bind(status).push(" ");
        }

        qb.push("ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let orders = qb.build_query_as::<Order>().fetch_all(&self.pool).await?;
        Ok(orders)
    }

    /// Stores the processor's preference id on a freshly created order.
    pub async fn set_preference(&self, id: &str, preference_id: &str) -> DbResult<()> {
        debug!(id = %id, preference_id = %preference_id, "Storing preference id");

        let result = sqlx::query("UPDATE orders SET preference_id = ?, updated_at = ? WHERE id = ?")
            .bind(preference_id)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Moves an order to `next` only if it is still in `expected`.
    ///
    /// `payment_id`, when given, replaces the stored one; `None` keeps it.
    ///
    /// ## Returns
    /// * `Ok(true)` - the row was updated
    /// * `Ok(false)` - the order is gone or no longer in `expected`
    pub async fn update_status_if(
        &self,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        payment_id: Option<&str>,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %expected, to = %next, "Conditional status update");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?, payment_id = COALESCE(?, payment_id), updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(next)
        .bind(payment_id)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Distinct products from the user's paid orders.
    pub async fn purchased_products(&self, user_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT DISTINCT {PRODUCT_COLUMNS}
            FROM products p
            INNER JOIN order_items oi ON oi.product_id = p.id
            INNER JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ? AND o.status = ?
            ORDER BY p.title
            "#
        ))
        .bind(user_id)
        .bind(OrderStatus::Paid)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Whether the user has a paid order containing the product.
    pub async fn has_paid_purchase(&self, user_id: &str, product_id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM order_items oi
            INNER JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = ? AND oi.product_id = ? AND o.status = ?
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(OrderStatus::Paid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
