//! Response bodies: plain-text acknowledgements and JSON read views.

use crate::model::{Order, User};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Plain-text acknowledgement returned by writes, always with 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Created,
    Updated,
    Deleted,
}

impl Ack {
    pub fn as_str(self) -> &'static str {
        match self {
            Ack::Created => "OK",
            Ack::Updated => "UPDATED",
            Ack::Deleted => "DELETED",
        }
    }
}

impl axum::response::IntoResponse for Ack {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, self.as_str()).into_response()
    }
}

/// User as returned by `/users` reads. `sex` is never exposed.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub role: Option<String>,
    pub phone: Option<String>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        let f = u.fields;
        UserView {
            id: u.id,
            first_name: f.first_name,
            last_name: f.last_name,
            age: f.age,
            email: f.email,
            role: f.role,
            phone: f.phone,
        }
    }
}

/// A user reference resolved for display: the user's last name, or `0` when
/// the reference is null or points at a missing user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    LastName(String),
    Missing,
}

impl From<Option<User>> for UserRef {
    fn from(user: Option<User>) -> Self {
        match user {
            Some(u) => UserRef::LastName(u.fields.last_name),
            None => UserRef::Missing,
        }
    }
}

impl Serialize for UserRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UserRef::LastName(name) => serializer.serialize_str(name),
            UserRef::Missing => serializer.serialize_i32(0),
        }
    }
}

/// Order as returned by `/orders` reads.
///
/// `customer_id` and `executor_id` carry the referenced users' last names,
/// not their ids. Clients depend on this shape.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub price: Option<i32>,
    pub customer_id: UserRef,
    pub executor_id: UserRef,
}

impl OrderView {
    pub fn new(order: Order, customer: UserRef, executor: UserRef) -> Self {
        let f = order.fields;
        OrderView {
            id: order.id,
            name: f.name,
            description: f.description,
            start_date: f.start_date,
            end_date: f.end_date,
            address: f.address,
            price: f.price,
            customer_id: customer,
            executor_id: executor,
        }
    }
}
