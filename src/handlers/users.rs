//! User handlers: list, read, full-replace update, delete.

use crate::error::AppError;
use crate::payload::{Body, UserUpdate};
use crate::response::{Ack, UserView};
use crate::state::AppState;
use crate::store::require;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserView>>, AppError> {
    let mut uow = state.store.begin().await?;
    let users = uow.users().find_all().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn read(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<UserView>, AppError> {
    let mut uow = state.store.begin().await?;
    let user = require(uow.users(), id).await?;
    Ok(Json(UserView::from(user)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Ack, AppError> {
    let mut uow = state.store.begin().await?;
    let mut user = require(uow.users(), id).await?;
    let changes = UserUpdate::from_body(&Body::from_value(body)?)?;
    changes.apply(&mut user.fields);
    uow.users().update(&user).await?;
    uow.commit().await?;
    tracing::info!(id, "user updated");
    Ok(Ack::Updated)
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Ack, AppError> {
    let mut uow = state.store.begin().await?;
    let user = require(uow.users(), id).await?;
    uow.users().delete(&user).await?;
    uow.commit().await?;
    tracing::info!(id, "user deleted");
    Ok(Ack::Deleted)
}
