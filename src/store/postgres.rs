//! Postgres-backed order store.
//!
//! Schema lives in `migrations/0001_orders.sql`. `checkout_session_id` is
//! unique and `payment_reference` is indexed; both lookups are point reads.
//! The transition guard is encoded in the `UPDATE ... WHERE` clause so it
//! executes atomically inside Postgres, with no read-modify-write window.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::order::{NewOrder, Order, OrderStatus};
use crate::store::OrderStore;

const COLUMNS: &str = "id, customer_name, customer_email, amount, currency, \
                       checkout_session_id, payment_reference, status, created_at";

/// [`OrderStore`] implementation over a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and run pending migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Config(format!("migration failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, new: NewOrder) -> Result<Order> {
        let order = new.into_order();
        let sql = format!(
            "INSERT INTO orders ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, Order>(&sql)
            .bind(order.id)
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(order.amount)
            .bind(&order.currency)
            .bind(&order.checkout_session_id)
            .bind(&order.payment_reference)
            .bind(order.status)
            .bind(order.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>> {
        let sql = format!("SELECT {COLUMNS} FROM orders WHERE checkout_session_id = $1");
        let row = sqlx::query_as::<_, Order>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_payment_reference(&self, reference: &str) -> Result<Option<Order>> {
        let sql = format!("SELECT {COLUMNS} FROM orders WHERE payment_reference = $1");
        let row = sqlx::query_as::<_, Order>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn transition(
        &self,
        id: Uuid,
        next: OrderStatus,
        payment_reference: Option<&str>,
    ) -> Result<Order> {
        // Guard mirrors OrderStatus::accepts: pending rows take any status,
        // terminal rows only re-take their own (idempotent redelivery).
        let sql = format!(
            "UPDATE orders \
             SET status = $2, payment_reference = COALESCE(payment_reference, $3) \
             WHERE id = $1 AND (status = 'pending'::order_status OR status = $2) \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(next)
            .bind(payment_reference)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(order) => Ok(order),
            // Transition refused by the guard; report the row as it stands.
            None => {
                let sql = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
                sqlx::query_as::<_, Order>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| Error::not_found(id.to_string()))
            }
        }
    }
}
