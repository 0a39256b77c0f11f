//! PostgreSQL store: one transaction per unit of work.

mod schema;
mod sql;

pub use schema::{ensure_database_exists, ensure_schema};

use crate::config::Config;
use crate::error::AppError;
use crate::model::{Entity, Offer, OfferFields, Order, OrderFields, User, UserFields};
use crate::store::{Repository, Store, UnitOfWork};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

pub type BoundQuery<'q, E> = QueryAs<'q, Postgres, E, PgArguments>;

/// Table mapping for an entity. `COLUMNS` excludes `id` and fixes bind order.
pub trait PgEntity: Entity + for<'r> FromRow<'r, PgRow> + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Statements run before deleting a row, each binding the row id as `$1`.
    const BEFORE_DELETE: &'static [&'static str] = &[];

    fn bind_fields<'q>(fields: &'q Self::Fields, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self>;
}

impl PgEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "age", "email", "role", "phone", "sex"];
    const BEFORE_DELETE: &'static [&'static str] = &[
        r#"UPDATE "orders" SET "customer_id" = NULL WHERE "customer_id" = $1"#,
        r#"UPDATE "orders" SET "executor_id" = NULL WHERE "executor_id" = $1"#,
    ];

    fn bind_fields<'q>(f: &'q UserFields, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query
            .bind(&f.first_name)
            .bind(&f.last_name)
            .bind(f.age)
            .bind(&f.email)
            .bind(&f.role)
            .bind(&f.phone)
            .bind(&f.sex)
    }
}

impl PgEntity for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "start_date",
        "end_date",
        "address",
        "price",
        "customer_id",
        "executor_id",
    ];

    fn bind_fields<'q>(f: &'q OrderFields, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query
            .bind(&f.name)
            .bind(&f.description)
            .bind(f.start_date)
            .bind(f.end_date)
            .bind(&f.address)
            .bind(f.price)
            .bind(f.customer_id)
            .bind(f.executor_id)
    }
}

impl PgEntity for Offer {
    const TABLE: &'static str = "offers";
    const COLUMNS: &'static [&'static str] = &["order_id", "executor_id"];

    fn bind_fields<'q>(f: &'q OfferFields, query: BoundQuery<'q, Self>) -> BoundQuery<'q, Self> {
        query.bind(f.order_id).bind(f.executor_id)
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Create the database if needed, open the pool and ensure tables exist.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        ensure_database_exists(&config.database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        ensure_schema(&pool).await?;
        Ok(PgStore { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn users(&mut self) -> &mut dyn Repository<User> {
        self
    }

    fn orders(&mut self) -> &mut dyn Repository<Order> {
        self
    }

    fn offers(&mut self) -> &mut dyn Repository<Offer> {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<E: PgEntity> Repository<E> for PgUnitOfWork {
    async fn find_all(&mut self) -> Result<Vec<E>, AppError> {
        let q = sql::select_all(E::TABLE, E::COLUMNS);
        tracing::debug!(sql = %q, "query (tx)");
        let rows = sqlx::query_as::<_, E>(&q).fetch_all(&mut *self.tx).await?;
        Ok(rows)
    }

    async fn find_by_id(&mut self, id: i32) -> Result<Option<E>, AppError> {
        let q = sql::select_by_id(E::TABLE, E::COLUMNS);
        tracing::debug!(sql = %q, id, "query (tx)");
        let row = sqlx::query_as::<_, E>(&q)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert(&mut self, fields: E::Fields) -> Result<E, AppError> {
        let q = sql::insert(E::TABLE, E::COLUMNS, false);
        tracing::debug!(sql = %q, "query (tx)");
        let row = E::bind_fields(&fields, sqlx::query_as::<_, E>(&q))
            .fetch_one(&mut *self.tx)
            .await
            .map_err(AppError::from_write)?;
        Ok(row)
    }

    async fn insert_many(&mut self, entities: Vec<E>) -> Result<(), AppError> {
        if entities.is_empty() {
            return Ok(());
        }
        let q = sql::insert(E::TABLE, E::COLUMNS, true);
        tracing::debug!(sql = %q, rows = entities.len(), "query (tx)");
        for entity in &entities {
            E::bind_fields(entity.fields(), sqlx::query_as::<_, E>(&q).bind(entity.id()))
                .fetch_one(&mut *self.tx)
                .await
                .map_err(AppError::from_write)?;
        }
        let sync = sql::sync_id_sequence(E::TABLE);
        sqlx::query(&sync).execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn update(&mut self, entity: &E) -> Result<(), AppError> {
        let q = sql::update(E::TABLE, E::COLUMNS);
        tracing::debug!(sql = %q, id = entity.id(), "query (tx)");
        E::bind_fields(entity.fields(), sqlx::query_as::<_, E>(&q))
            .bind(entity.id())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::from_write)?
            .ok_or(AppError::NotFound {
                entity: E::NAME,
                id: entity.id(),
            })?;
        Ok(())
    }

    async fn delete(&mut self, entity: &E) -> Result<(), AppError> {
        for stmt in E::BEFORE_DELETE {
            tracing::debug!(sql = %stmt, id = entity.id(), "query (tx)");
            sqlx::query(stmt)
                .bind(entity.id())
                .execute(&mut *self.tx)
                .await
                .map_err(AppError::from_write)?;
        }
        let q = sql::delete(E::TABLE);
        tracing::debug!(sql = %q, id = entity.id(), "query (tx)");
        let done = sqlx::query(&q)
            .bind(entity.id())
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::from_write)?;
        if done.rows_affected() == 0 {
            return Err(AppError::NotFound {
                entity: E::NAME,
                id: entity.id(),
            });
        }
        Ok(())
    }
}
