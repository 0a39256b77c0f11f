//! Order handlers. Reads resolve `customer_id`/`executor_id` to last names.

use crate::error::AppError;
use crate::model::Order;
use crate::payload::{order_fields, Body};
use crate::response::{Ack, OrderView, UserRef};
use crate::state::AppState;
use crate::store::{require, UnitOfWork};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

async fn resolve_user(uow: &mut dyn UnitOfWork, id: Option<i32>) -> Result<UserRef, AppError> {
    let user = match id {
        Some(id) => uow.users().find_by_id(id).await?,
        None => None,
    };
    Ok(UserRef::from(user))
}

async fn view(uow: &mut dyn UnitOfWork, order: Order) -> Result<OrderView, AppError> {
    let customer = resolve_user(uow, order.fields.customer_id).await?;
    let executor = resolve_user(uow, order.fields.executor_id).await?;
    Ok(OrderView::new(order, customer, executor))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<OrderView>>, AppError> {
    let mut uow = state.store.begin().await?;
    let orders = uow.orders().find_all().await?;
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        out.push(view(&mut *uow, order).await?);
    }
    Ok(Json(out))
}

pub async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> Result<Ack, AppError> {
    let fields = order_fields(&Body::from_value(body)?)?;
    let mut uow = state.store.begin().await?;
    let order = uow.orders().insert(fields).await?;
    uow.commit().await?;
    tracing::info!(id = order.id, "order created");
    Ok(Ack::Created)
}

pub async fn read(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<OrderView>, AppError> {
    let mut uow = state.store.begin().await?;
    let order = require(uow.orders(), id).await?;
    Ok(Json(view(&mut *uow, order).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Ack, AppError> {
    let mut uow = state.store.begin().await?;
    let mut order = require(uow.orders(), id).await?;
    order.fields = order_fields(&Body::from_value(body)?)?;
    uow.orders().update(&order).await?;
    uow.commit().await?;
    tracing::info!(id, "order updated");
    Ok(Ack::Updated)
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Ack, AppError> {
    let mut uow = state.store.begin().await?;
    let order = require(uow.orders(), id).await?;
    uow.orders().delete(&order).await?;
    uow.commit().await?;
    tracing::info!(id, "order deleted");
    Ok(Ack::Deleted)
}
