//! One-time population of users, orders and offers from bundled fixtures.
//!
//! Fixture dates use the `MM/DD/YYYY` text format. All three lists are
//! converted before anything is written, then inserted users-first inside a
//! single unit of work: a bad date or a constraint violation leaves the store
//! untouched.

use crate::error::AppError;
use crate::model::{Offer, OfferFields, Order, OrderFields, User, UserFields};
use crate::payload::parse_date;
use crate::store::Store;
use serde::Deserialize;
use thiserror::Error;

const USERS_JSON: &str = include_str!("../fixtures/users.json");
const ORDERS_JSON: &str = include_str!("../fixtures/orders.json");
const OFFERS_JSON: &str = include_str!("../fixtures/offers.json");

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("fixture {name}: {source}")]
    Fixture {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    App(#[from] AppError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserFixture {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub role: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderFixture {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub address: Option<String>,
    pub price: Option<i32>,
    pub customer_id: Option<i32>,
    pub executor_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferFixture {
    pub id: i32,
    pub order_id: Option<i32>,
    pub executor_id: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub users: Vec<UserFixture>,
    pub orders: Vec<OrderFixture>,
    pub offers: Vec<OfferFixture>,
}

/// Row counts written by a successful seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub orders: usize,
    pub offers: usize,
}

fn parse_list<T: for<'de> Deserialize<'de>>(name: &'static str, json: &str) -> Result<Vec<T>, SeedError> {
    serde_json::from_str(json).map_err(|source| SeedError::Fixture { name, source })
}

impl Fixtures {
    /// The fixture set shipped in `fixtures/`.
    pub fn bundled() -> Result<Self, SeedError> {
        Self::from_json(USERS_JSON, ORDERS_JSON, OFFERS_JSON)
    }

    pub fn from_json(users: &str, orders: &str, offers: &str) -> Result<Self, SeedError> {
        Ok(Fixtures {
            users: parse_list("users", users)?,
            orders: parse_list("orders", orders)?,
            offers: parse_list("offers", offers)?,
        })
    }
}

impl From<UserFixture> for User {
    fn from(u: UserFixture) -> Self {
        User {
            id: u.id,
            fields: UserFields {
                first_name: u.first_name,
                last_name: u.last_name,
                age: u.age,
                email: u.email,
                role: u.role,
                phone: u.phone,
                sex: None,
            },
        }
    }
}

impl TryFrom<OrderFixture> for Order {
    type Error = AppError;

    fn try_from(o: OrderFixture) -> Result<Self, AppError> {
        Ok(Order {
            id: o.id,
            fields: OrderFields {
                name: o.name,
                description: o.description,
                start_date: Some(parse_date("start_date", &o.start_date)?),
                end_date: Some(parse_date("end_date", &o.end_date)?),
                address: o.address,
                price: o.price,
                customer_id: o.customer_id,
                executor_id: o.executor_id,
            },
        })
    }
}

impl From<OfferFixture> for Offer {
    fn from(o: OfferFixture) -> Self {
        Offer {
            id: o.id,
            fields: OfferFields {
                order_id: o.order_id,
                executor_id: o.executor_id,
            },
        }
    }
}

/// Insert every fixture row atomically.
pub async fn seed(store: &dyn Store, fixtures: Fixtures) -> Result<SeedReport, SeedError> {
    let users: Vec<User> = fixtures.users.into_iter().map(User::from).collect();
    let orders = fixtures
        .orders
        .into_iter()
        .map(Order::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let offers: Vec<Offer> = fixtures.offers.into_iter().map(Offer::from).collect();
    let report = SeedReport {
        users: users.len(),
        orders: orders.len(),
        offers: offers.len(),
    };

    let mut uow = store.begin().await?;
    uow.users().insert_many(users).await?;
    uow.orders().insert_many(orders).await?;
    uow.offers().insert_many(offers).await?;
    uow.commit().await?;

    tracing::info!(
        users = report.users,
        orders = report.orders,
        offers = report.offers,
        "fixtures seeded"
    );
    Ok(report)
}
