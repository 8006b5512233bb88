use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub phone_no: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub image: String,
    pub price: sqlx::types::Decimal,
}

/// Opaque reference into the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_info: Json<ShippingInfo>,
    pub order_items: Json<Vec<OrderItem>>,
    pub payment_info: Option<Json<PaymentInfo>>,
    pub tax_amount: sqlx::types::Decimal,
    pub shipping_amount: sqlx::types::Decimal,
    pub total_amount: sqlx::types::Decimal,
    pub order_status: OrderStatus,
    pub delivered_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        shipping_info: &ShippingInfo,
        order_items: &[OrderItem],
        payment_info: Option<&PaymentInfo>,
        tax_amount: sqlx::types::Decimal,
        shipping_amount: sqlx::types::Decimal,
        total_amount: sqlx::types::Decimal,
    ) -> anyhow::Result<Order> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, shipping_info, order_items, payment_info,
                                tax_amount, shipping_amount, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, shipping_info, order_items, payment_info,
                      tax_amount, shipping_amount, total_amount, order_status,
                      delivered_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(Json(shipping_info))
        .bind(Json(order_items))
        .bind(payment_info.map(Json))
        .bind(tax_amount)
        .bind(shipping_amount)
        .bind(total_amount)
        .fetch_one(db)
        .await?;
        Ok(order)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, shipping_info, order_items, payment_info,
                   tax_amount, shipping_amount, total_amount, order_status,
                   delivered_at, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(order)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, shipping_info, order_items, payment_info,
                   tax_amount, shipping_amount, total_amount, order_status,
                   delivered_at, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, shipping_info, order_items, payment_info,
                   tax_amount, shipping_amount, total_amount, order_status,
                   delivered_at, created_at
            FROM orders
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// `delivered_at` is stamped the first time the status becomes delivered.
    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: OrderStatus,
    ) -> anyhow::Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET order_status = $2,
                delivered_at = CASE
                    WHEN $2 = 'delivered'::order_status AND delivered_at IS NULL THEN now()
                    ELSE delivered_at
                END
            WHERE id = $1
            RETURNING id, user_id, shipping_info, order_items, payment_info,
                      tax_amount, shipping_amount, total_amount, order_status,
                      delivered_at, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(order)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM orders WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            r#""processing""#
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>(r#""delivered""#).unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn order_serializes_nested_json_transparently() {
        let order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            shipping_info: Json(ShippingInfo {
                address: "1 Main St".into(),
                city: "Springfield".into(),
                phone_no: "5551234".into(),
                postal_code: "12345".into(),
                state: "IL".into(),
                country: "US".into(),
            }),
            order_items: Json(vec![OrderItem {
                name: "Widget".into(),
                quantity: 2,
                image: "https://media.local/widget.jpg".into(),
                price: sqlx::types::Decimal::new(1999, 2),
            }]),
            payment_info: None,
            tax_amount: sqlx::types::Decimal::ZERO,
            shipping_amount: sqlx::types::Decimal::ZERO,
            total_amount: sqlx::types::Decimal::new(3998, 2),
            order_status: OrderStatus::Processing,
            delivered_at: None,
            created_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains(r#""address":"1 Main St""#));
        assert!(json.contains(r#""name":"Widget""#));
        assert!(json.contains(r#""order_status":"processing""#));
    }
}
