//! Table DDL for users, orders and offers, plus database bootstrap.
//! Statements are idempotent (`IF NOT EXISTS`) and run at startup; schema
//! evolution is managed outside this crate.

use crate::error::{AppError, ConfigError};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Order user references are plain integers: they may name users that do not
/// exist, and user deletion nulls them explicitly. Offers keep real foreign
/// keys and go with their order.
const TABLES_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "users" (
        "id" SERIAL PRIMARY KEY,
        "first_name" TEXT NOT NULL,
        "last_name" TEXT NOT NULL,
        "age" INTEGER CHECK ("age" < 120),
        "email" TEXT NOT NULL UNIQUE,
        "role" TEXT,
        "phone" TEXT UNIQUE,
        "sex" TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "orders" (
        "id" SERIAL PRIMARY KEY,
        "name" TEXT NOT NULL,
        "description" TEXT NOT NULL,
        "start_date" DATE,
        "end_date" DATE,
        "address" TEXT,
        "price" INTEGER,
        "customer_id" INTEGER,
        "executor_id" INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "offers" (
        "id" SERIAL PRIMARY KEY,
        "order_id" INTEGER REFERENCES "orders" ("id") ON DELETE CASCADE,
        "executor_id" INTEGER REFERENCES "users" ("id") ON DELETE SET NULL
    )
    "#,
    r#"ALTER TABLE "orders" DROP CONSTRAINT IF EXISTS "orders_customer_id_fkey""#,
    r#"ALTER TABLE "orders" DROP CONSTRAINT IF EXISTS "orders_executor_id_fkey""#,
];

/// Create the three tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in TABLES_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("schema ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url).map_err(|e| ConfigError::Invalid {
        var: "DATABASE_URL",
        reason: e.to_string(),
    })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url
        .get(scheme_end..)
        .and_then(|rest| rest.find('/'))
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| ConfigError::Invalid {
            var: "DATABASE_URL",
            reason: "no database path".into(),
        })?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
