//! Marketplace backend: users, orders and offers over REST, stored in PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod payload;
pub mod response;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, ConfigError, ConstraintKind};
pub use model::{Entity, Offer, Order, User};
pub use routes::{api_routes, app, common_routes};
pub use seed::{seed, Fixtures, SeedError, SeedReport};
pub use state::AppState;
pub use store::{PgStore, Repository, Store, UnitOfWork};
