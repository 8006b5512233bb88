use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::{CurrentUser, RequireAdmin},
    error::ApiError,
    orders::{
        dto::{CreateOrderRequest, OrderListResponse, OrderResponse, UpdateOrderRequest},
        model::Order,
    },
    state::AppState,
    users::{dto::MessageResponse, model::Role},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order/create", post(create_order))
        .route("/order/:id", get(get_one_order))
        .route("/myorder", get(my_orders))
        .route("/admin/order", get(admin_all_orders))
        .route(
            "/admin/order/:id",
            put(admin_update_order).delete(admin_delete_order),
        )
}

#[instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let valid = payload.validate()?;

    let order = Order::create(
        &state.db,
        user.id,
        &valid.shipping_info,
        &valid.order_items,
        valid.payment_info.as_ref(),
        valid.tax_amount,
        valid.shipping_amount,
        valid.total_amount,
    )
    .await?;

    info!(order_id = %order.id, user_id = %user.id, "order created");
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

#[instrument(skip_all, fields(%id))]
pub async fn get_one_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("No order found"))?;

    // Readable by its owner or an admin only.
    if order.user_id != user.id && user.role != Role::Admin {
        return Err(ApiError::forbidden("You are not allowed for this resource"));
    }

    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

#[instrument(skip_all)]
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = Order::list_by_user(&state.db, user.id).await?;
    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

#[instrument(skip_all)]
pub async fn admin_all_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<OrderListResponse>, ApiError> {
    let orders = Order::list_all(&state.db).await?;
    Ok(Json(OrderListResponse {
        success: true,
        orders,
    }))
}

#[instrument(skip_all, fields(%id))]
pub async fn admin_update_order(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Some(status) = payload.order_status else {
        return Err(ApiError::bad_request("Order status is required"));
    };

    let order = Order::update_status(&state.db, id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("No order found"))?;

    info!(order_id = %order.id, status = ?order.order_status, "order updated by admin");
    Ok(Json(OrderResponse {
        success: true,
        order,
    }))
}

#[instrument(skip_all, fields(%id))]
pub async fn admin_delete_order(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !Order::delete(&state.db, id).await? {
        return Err(ApiError::not_found("No order found"));
    }

    info!(order_id = %id, "order deleted by admin");
    Ok(Json(MessageResponse {
        success: true,
        message: "Order deleted successfully".into(),
    }))
}
