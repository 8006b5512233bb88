use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::orders::model::{Order, OrderItem, OrderStatus, PaymentInfo, ShippingInfo};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_info: Option<ShippingInfo>,
    pub order_items: Option<Vec<OrderItem>>,
    pub payment_info: Option<PaymentInfo>,
    #[serde(default)]
    pub tax_amount: sqlx::types::Decimal,
    #[serde(default)]
    pub shipping_amount: sqlx::types::Decimal,
    pub total_amount: Option<sqlx::types::Decimal>,
}

#[derive(Debug)]
pub struct ValidOrder {
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItem>,
    pub payment_info: Option<PaymentInfo>,
    pub tax_amount: sqlx::types::Decimal,
    pub shipping_amount: sqlx::types::Decimal,
    pub total_amount: sqlx::types::Decimal,
}

impl CreateOrderRequest {
    pub fn validate(self) -> Result<ValidOrder, ApiError> {
        let Some(shipping_info) = self.shipping_info else {
            return Err(ApiError::bad_request("Shipping info is required"));
        };
        let order_items = self.order_items.unwrap_or_default();
        if order_items.is_empty() {
            return Err(ApiError::bad_request("Order items are required"));
        }
        let Some(total_amount) = self.total_amount else {
            return Err(ApiError::bad_request("Total amount is required"));
        };
        Ok(ValidOrder {
            shipping_info,
            order_items,
            payment_info: self.payment_info,
            tax_amount: self.tax_amount,
            shipping_amount: self.shipping_amount,
            total_amount,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub order_status: Option<OrderStatus>,
}

// --- Response bodies ---

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Decimal;

    fn request() -> CreateOrderRequest {
        serde_json::from_str(
            r#"{
                "shipping_info": {
                    "address": "1 Main St", "city": "Springfield", "phone_no": "5551234",
                    "postal_code": "12345", "state": "IL", "country": "US"
                },
                "order_items": [
                    {"name": "Widget", "quantity": 2, "image": "w.jpg", "price": "19.99"}
                ],
                "total_amount": "39.98"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn accepts_a_complete_order() {
        let valid = request().validate().unwrap();
        assert_eq!(valid.order_items.len(), 1);
        assert_eq!(valid.total_amount, Decimal::new(3998, 2));
        assert_eq!(valid.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn rejects_missing_shipping_info() {
        let mut req = request();
        req.shipping_info = None;
        let err = req.validate().unwrap_err();
        assert_eq!(err.message, "Shipping info is required");
    }

    #[test]
    fn rejects_empty_items() {
        let mut req = request();
        req.order_items = Some(vec![]);
        let err = req.validate().unwrap_err();
        assert_eq!(err.message, "Order items are required");
    }

    #[test]
    fn rejects_missing_total() {
        let mut req = request();
        req.total_amount = None;
        let err = req.validate().unwrap_err();
        assert_eq!(err.message, "Total amount is required");
    }
}
