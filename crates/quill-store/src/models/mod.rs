//! Validated entities.
//!
//! Each entity has a `New*` type built from client input, which validates
//! every field before anything touches the database, and a `*Changes`
//! type for partial updates that runs the same checks on each supplied
//! field.

mod prompt;
mod tag;
mod template;
mod user;

pub use prompt::{NewPrompt, Prompt, PromptChanges, PromptFilter, SortColumn, SortOrder};
pub use tag::{NewTag, Tag, TagChanges};
pub use template::{NewTemplate, PromptRef, Template, TemplateChanges};
pub use user::{NewUser, User, UserChanges};

/// A column value in a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

/// Validated column assignments for an `UPDATE`.
///
/// Column names only ever come from the models' own field lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Changes {
    pub(crate) fn set(&mut self, column: &'static str, value: FieldValue) {
        self.fields.retain(|(existing, _)| *existing != column);
        self.fields.push((column, value));
    }

    pub(crate) fn set_text(&mut self, column: &'static str, value: String) {
        self.set(column, FieldValue::Text(value));
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }
}
