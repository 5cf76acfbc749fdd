use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CartRepository, OrderRepository, RepositoryError, UserRepository};
use crate::domain::aggregates::{Cart, CartItem, Order, OrderStatus, ProfileData, UserProfile};
use crate::domain::value_objects::{OrderId, ShippingAddress};

/// Postgres-backed storage. Nested documents live in JSONB columns.
#[derive(Clone)]
pub struct PgRepository { db: PgPool }

impl PgRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String, user_id: String, user_email: String, items: Json<Vec<CartItem>>,
    total: Decimal, status: String, status_ar: String, date: NaiveDate, expected_delivery: NaiveDate,
    shipping_address: Json<ShippingAddress>, cancellation_reason: Option<String>,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;
    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| RepositoryError::Corrupt { id: r.order_id.clone(), reason };
        let order_id = OrderId::parse(r.order_id.clone()).map_err(|e| corrupt(e.to_string()))?;
        let status = r.status.parse::<OrderStatus>().map_err(|e| corrupt(e.to_string()))?;
        Ok(Order {
            order_id, user_id: r.user_id, user_email: r.user_email, items: r.items.0, total: r.total,
            status, status_ar: r.status_ar, date: r.date, expected_delivery: r.expected_delivery,
            shipping_address: r.shipping_address.0, cancellation_reason: r.cancellation_reason,
            created_at: r.created_at, updated_at: r.updated_at, events: vec![],
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow { user_id: String, items: Json<Vec<CartItem>>, updated_at: DateTime<Utc> }

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self { Cart::restore(Some(r.user_id), r.items.0, r.updated_at) }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: String, name: String, email: String, phone: Option<String>, image_url: Option<String>,
    is_active: bool, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(r: UserRow) -> Self {
        UserProfile {
            user_id: r.user_id, name: r.name, email: r.email, phone: r.phone, image_url: r.image_url,
            is_active: r.is_active, created_at: r.created_at, updated_at: r.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "order_id, user_id, user_email, items, total, status, status_ar, date, expected_delivery, shipping_address, cancellation_reason, created_at, updated_at";

#[async_trait]
impl OrderRepository for PgRepository {
    async fn create_order(&self, o: &Order) -> Result<OrderId, RepositoryError> {
        let result = sqlx::query("INSERT INTO orders (id, order_id, user_id, user_email, items, total, status, status_ar, date, expected_delivery, shipping_address, cancellation_reason, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)")
            .bind(Uuid::now_v7()).bind(o.order_id.as_str()).bind(&o.user_id).bind(&o.user_email).bind(Json(&o.items))
            .bind(o.total).bind(o.status.as_str()).bind(&o.status_ar).bind(o.date).bind(o.expected_delivery)
            .bind(Json(&o.shipping_address)).bind(&o.cancellation_reason).bind(o.created_at).bind(o.updated_at)
            .execute(&self.db).await;
        match result {
            Ok(_) => Ok(o.order_id.clone()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(RepositoryError::Duplicate(o.order_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_order_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
            .bind(order_id).fetch_optional(&self.db).await?;
        row.map(Order::try_from).transpose()
    }

    async fn get_user_orders(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"))
            .bind(user_id).fetch_all(&self.db).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn get_all_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"))
            .fetch_all(&self.db).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_order_status(&self, o: &Order) -> Result<bool, RepositoryError> {
        let done = sqlx::query("UPDATE orders SET status = $2, status_ar = $3, cancellation_reason = $4, updated_at = $5 WHERE order_id = $1")
            .bind(o.order_id.as_str()).bind(o.status.as_str()).bind(&o.status_ar).bind(&o.cancellation_reason).bind(o.updated_at)
            .execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl CartRepository for PgRepository {
    async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>("SELECT user_id, items, updated_at FROM carts WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.db).await?;
        Ok(row.map(Cart::from))
    }

    async fn save_cart(&self, user_id: &str, items: &[CartItem]) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO carts (user_id, items, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()")
            .bind(user_id).bind(Json(items)).execute(&self.db).await?;
        Ok(())
    }

    async fn clear_cart(&self, user_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET items = '[]'::jsonb, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id).execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id).fetch_optional(&self.db).await?;
        Ok(row.map(UserProfile::from))
    }

    async fn upsert_profile(&self, user_id: &str, d: ProfileData) -> Result<UserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>("INSERT INTO users (user_id, name, email, phone, image_url, is_active, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, TRUE, NOW(), NOW()) ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, phone = EXCLUDED.phone, image_url = EXCLUDED.image_url, is_active = TRUE, updated_at = NOW() RETURNING *")
            .bind(user_id).bind(&d.name).bind(&d.email).bind(&d.phone).bind(&d.image_url)
            .fetch_one(&self.db).await?;
        Ok(row.into())
    }

    async fn mark_deleted(&self, user_id: &str) -> Result<bool, RepositoryError> {
        let done = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }
}
