//! Tags.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

use super::Changes;
use crate::error::{Result, StoreError};
use crate::validation;

const FIELDS: &[&str] = &["name"];

/// A stored tag.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A tag about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    name: String,
}

impl NewTag {
    pub fn new(name: &str) -> Result<Self> {
        validation::name(name, 2, 50)?;
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;
        Self::new(&validation::text(body, "name")?.unwrap_or_default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validated changes to a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagChanges(Changes);

impl TagChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;
        let mut changes = Changes::default();

        if let Some(name) = validation::text(body, "name")? {
            validation::name(&name, 2, 50)?;
            changes.set_text("name", name);
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_tag() {
        assert_eq!(NewTag::new("rust").unwrap().name(), "rust");
        assert!(NewTag::new("r").is_err());
        assert!(NewTag::from_json(&Map::new()).is_err());
    }

    #[test]
    fn test_changes() {
        let body = json!({"name": "writing"});
        let changes = TagChanges::from_json(body.as_object().unwrap()).unwrap();
        assert!(changes.changes().contains("name"));

        let body = json!({"colour": "red"});
        assert!(matches!(
            TagChanges::from_json(body.as_object().unwrap()),
            Err(StoreError::UnknownField(_))
        ));
    }
}
