use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::location::LocationRecord;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/assigned/:agent_id", get(list_assigned_orders))
        .route("/orders/:order_id", get(get_order))
        .route("/orders/:order_id/start", put(start_order))
        .route("/orders/:order_id/complete", put(complete_order))
        .route("/orders/:order_id/locations", get(list_order_locations))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn list_assigned_orders(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Json<Vec<Order>> {
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| entry.value().assigned_agent_id == agent_id)
        .map(|entry| entry.value().clone())
        .collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Json(orders)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;

    Ok(Json(order.value().clone()))
}

async fn start_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    transition_order(&state, &order_id, OrderStatus::InProgress)?;
    Ok(Json(MessageResponse {
        message: "Order started successfully".to_string(),
    }))
}

async fn complete_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    transition_order(&state, &order_id, OrderStatus::Completed)?;
    Ok(Json(MessageResponse {
        message: "Order completed successfully".to_string(),
    }))
}

async fn list_order_locations(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<LocationRecord>>, AppError> {
    if !state.orders.contains_key(&order_id) {
        return Err(AppError::NotFound(format!("order {} not found", order_id)));
    }

    let history = state
        .location_history
        .get(&order_id)
        .map(|entry| entry.value().clone())
        .unwrap_or_default();

    Ok(Json(history))
}

fn transition_order(state: &AppState, order_id: &str, next: OrderStatus) -> Result<(), AppError> {
    let transition = match next {
        OrderStatus::InProgress => "start",
        OrderStatus::Completed => "complete",
        OrderStatus::Pending => "reset",
    };

    let outcome = {
        let mut order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;
        order.transition(next, Utc::now())
    };

    match outcome {
        Ok(()) => {
            state
                .metrics
                .order_transitions_total
                .with_label_values(&[transition, "ok"])
                .inc();
            info!(order_id = %order_id, status = %next, "order status updated");
            Ok(())
        }
        Err((current, requested)) => {
            state
                .metrics
                .order_transitions_total
                .with_label_values(&[transition, "rejected"])
                .inc();
            warn!(order_id = %order_id, current = %current, requested = %requested, "order transition rejected");
            Err(AppError::Conflict(format!(
                "order {order_id} is {current}, cannot move to {requested}"
            )))
        }
    }
}
