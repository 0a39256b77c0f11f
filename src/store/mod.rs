//! Data access: a store hands out units of work, each exposing one repository
//! per entity over the same transaction.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use crate::error::AppError;
use crate::model::{Entity, Offer, Order, User};
use async_trait::async_trait;

pub use postgres::PgStore;

/// Per-entity persistence. All calls run inside the owning unit of work.
#[async_trait]
pub trait Repository<E: Entity>: Send {
    /// All rows in id order.
    async fn find_all(&mut self) -> Result<Vec<E>, AppError>;

    async fn find_by_id(&mut self, id: i32) -> Result<Option<E>, AppError>;

    /// Insert with a store-assigned id and return the stored entity.
    async fn insert(&mut self, fields: E::Fields) -> Result<E, AppError>;

    /// Insert rows that already carry their ids.
    async fn insert_many(&mut self, entities: Vec<E>) -> Result<(), AppError>;

    /// Replace every field of the row with `entity.id()`.
    async fn update(&mut self, entity: &E) -> Result<(), AppError>;

    async fn delete(&mut self, entity: &E) -> Result<(), AppError>;
}

/// A transaction scope. Dropping it without `commit` rolls back.
#[async_trait]
pub trait UnitOfWork: Send {
    fn users(&mut self) -> &mut dyn Repository<User>;
    fn orders(&mut self) -> &mut dyn Repository<Order>;
    fn offers(&mut self) -> &mut dyn Repository<Offer>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;

    /// Cheap reachability check for the readiness endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Load by id or fail with `AppError::NotFound`.
pub async fn require<E: Entity>(repo: &mut dyn Repository<E>, id: i32) -> Result<E, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or(AppError::NotFound { entity: E::NAME, id })
}
