//! Users.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

use super::{Changes, FieldValue};
use crate::error::{Result, StoreError};
use crate::validation;

const FIELDS: &[&str] = &["name", "email", "password", "age", "created_at"];
const UPDATABLE: &[&str] = &["name", "email", "age", "created_at"];

/// A stored user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,
    pub age: i64,
    pub created_at: String,
}

/// A user about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    email: String,
    password: String,
    age: i64,
    created_at: String,
}

impl NewUser {
    /// Creates a user, validating every field.
    ///
    /// `password_hash` must already be hashed.
    pub fn new(name: &str, email: &str, password_hash: &str, age: i64) -> Result<Self> {
        let user = Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            age,
            created_at: validation::now(),
        };
        user.validate()?;
        Ok(user)
    }

    /// Creates a user from a JSON object whose `password` is already hashed.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;

        let user = Self {
            name: validation::text(body, "name")?.unwrap_or_default(),
            email: validation::text(body, "email")?.unwrap_or_default(),
            password: validation::text(body, "password")?.unwrap_or_default(),
            age: validation::integer(body, "age")
                .map_err(|_| age_error())?
                .unwrap_or_default(),
            created_at: validation::text(body, "created_at")?.unwrap_or_else(validation::now),
        };
        user.validate()?;
        Ok(user)
    }

    fn validate(&self) -> Result<()> {
        validation::name(&self.name, 2, 50)?;
        validation::email(&self.email)?;
        password_hash(&self.password)?;
        age(self.age)?;
        validation::timestamp(&self.created_at)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

/// Validated changes to a user. The password is never updatable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges(Changes);

impl UserChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, UPDATABLE)?;
        let mut changes = Changes::default();

        if let Some(name) = validation::text(body, "name")? {
            validation::name(&name, 2, 50)?;
            changes.set_text("name", name);
        }
        if let Some(email) = validation::text(body, "email")? {
            validation::email(&email)?;
            changes.set_text("email", email);
        }
        if let Some(value) = validation::integer(body, "age").map_err(|_| age_error())? {
            age(value)?;
            changes.set("age", FieldValue::Integer(value));
        }
        if let Some(created_at) = validation::text(body, "created_at")? {
            validation::timestamp(&created_at)?;
            changes.set_text("created_at", created_at);
        }

        if changes.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        Ok(Self(changes))
    }

    pub fn changes(&self) -> &Changes {
        &self.0
    }
}

fn age_error() -> StoreError {
    StoreError::validation("Age must be a positive number.")
}

fn age(value: i64) -> Result<()> {
    if value <= 0 {
        return Err(age_error());
    }
    Ok(())
}

fn password_hash(value: &str) -> Result<()> {
    if !quill_auth::is_password_hash(value) {
        return Err(StoreError::validation("Password must be a valid password hash."));
    }
    Ok(())
}
