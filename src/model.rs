//! Entities persisted in the marketplace store.
//!
//! Each entity is an id plus a field group. The field group is what a caller
//! supplies when the store assigns the id (`Repository::insert`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ages at or above this value are rejected by the store.
pub const MAX_AGE_EXCLUSIVE: i32 = 120;

pub trait Entity: Clone + Send + Sync + 'static {
    type Fields: Clone + Send + Sync + 'static;

    /// Singular name used in errors and logs.
    const NAME: &'static str;

    fn id(&self) -> i32;
    fn fields(&self) -> &Self::Fields;
    fn from_parts(id: i32, fields: Self::Fields) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserFields {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: UserFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderFields {
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub price: Option<i32>,
    pub customer_id: Option<i32>,
    pub executor_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: OrderFields,
}

/// A user's bid to execute an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OfferFields {
    pub order_id: Option<i32>,
    pub executor_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Offer {
    pub id: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: OfferFields,
}

macro_rules! impl_entity {
    ($entity:ident, $fields:ident, $name:literal) => {
        impl Entity for $entity {
            type Fields = $fields;
            const NAME: &'static str = $name;

            fn id(&self) -> i32 {
                self.id
            }

            fn fields(&self) -> &$fields {
                &self.fields
            }

            fn from_parts(id: i32, fields: $fields) -> Self {
                $entity { id, fields }
            }
        }
    };
}

impl_entity!(User, UserFields, "user");
impl_entity!(Order, OrderFields, "order");
impl_entity!(Offer, OfferFields, "offer");
