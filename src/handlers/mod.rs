//! HTTP handlers for users, orders, and operational endpoints.

pub mod common;
pub mod orders;
pub mod users;
