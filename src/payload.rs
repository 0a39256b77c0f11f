//! JSON request bodies: required keys, integer coercion and `MM/DD/YYYY` dates.

use crate::error::AppError;
use crate::model::{OrderFields, UserFields};
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Textual date format accepted on write (e.g. `02/28/2013`).
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub fn parse_date(field: &str, s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| AppError::InvalidField {
        field: field.to_string(),
        reason: format!("expected MM/DD/YYYY: {}", e),
    })
}

/// A decoded JSON object body. Every accessor requires the key to be present.
pub struct Body(Map<String, Value>);

impl Body {
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(m) => Ok(Body(m)),
            _ => Err(AppError::InvalidField {
                field: "body".into(),
                reason: "must be a JSON object".into(),
            }),
        }
    }

    fn get(&self, key: &str) -> Result<&Value, AppError> {
        self.0.get(key).ok_or_else(|| AppError::MissingField(key.to_string()))
    }

    pub fn text(&self, key: &str) -> Result<String, AppError> {
        self.opt_text(key)?.ok_or_else(|| invalid(key, "must not be null"))
    }

    pub fn opt_text(&self, key: &str) -> Result<Option<String>, AppError> {
        match self.get(key)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Number(n) => Ok(Some(n.to_string())),
            _ => Err(invalid(key, "expected a string")),
        }
    }

    /// Integer from a JSON number or an integer-valued string.
    pub fn int(&self, key: &str) -> Result<i32, AppError> {
        self.opt_int(key)?.ok_or_else(|| invalid(key, "must not be null"))
    }

    pub fn opt_int(&self, key: &str) -> Result<Option<i32>, AppError> {
        let n = match self.get(key)? {
            Value::Null => return Ok(None),
            Value::Number(n) => n.as_i64().ok_or_else(|| invalid(key, "expected an integer"))?,
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(key, "expected an integer"))?,
            _ => return Err(invalid(key, "expected an integer")),
        };
        i32::try_from(n).map(Some).map_err(|_| invalid(key, "out of range"))
    }

    pub fn date(&self, key: &str) -> Result<NaiveDate, AppError> {
        match self.get(key)? {
            Value::String(s) => parse_date(key, s),
            _ => Err(invalid(key, "expected a MM/DD/YYYY string")),
        }
    }
}

fn invalid(field: &str, reason: &str) -> AppError {
    AppError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Fields replaced by `PUT /users/{id}`. `sex` is not part of the payload and
/// keeps whatever the stored user already has.
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub email: String,
    pub role: Option<String>,
    pub phone: Option<String>,
}

impl UserUpdate {
    pub fn from_body(body: &Body) -> Result<Self, AppError> {
        Ok(UserUpdate {
            first_name: body.text("first_name")?,
            last_name: body.text("last_name")?,
            age: body.opt_int("age")?,
            email: body.text("email")?,
            role: body.opt_text("role")?,
            phone: body.opt_text("phone")?,
        })
    }

    pub fn apply(self, fields: &mut UserFields) {
        fields.first_name = self.first_name;
        fields.last_name = self.last_name;
        fields.age = self.age;
        fields.email = self.email;
        fields.role = self.role;
        fields.phone = self.phone;
    }
}

/// Order fields from a `POST /orders/` or `PUT /orders/{id}` body.
pub fn order_fields(body: &Body) -> Result<OrderFields, AppError> {
    Ok(OrderFields {
        name: body.text("name")?,
        description: body.text("description")?,
        start_date: Some(body.date("start_date")?),
        end_date: Some(body.date("end_date")?),
        address: body.opt_text("address")?,
        price: Some(body.int("price")?),
        customer_id: Some(body.int("customer_id")?),
        executor_id: Some(body.int("executor_id")?),
    })
}
