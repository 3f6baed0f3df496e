//! Templates: ordered sequences of prompts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Changes;
use crate::error::{Result, StoreError};
use crate::validation;

const FIELDS: &[&str] = &["name", "description", "prompts", "created_at", "updated_at"];

/// A prompt's place in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRef {
    #[serde(rename = "promptId")]
    pub prompt_id: i64,
    pub order: i64,
}

/// A stored template with its prompt references sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub prompts: Vec<PromptRef>,
    pub created_at: String,
    pub updated_at: String,
}

/// A template about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    name: String,
    description: String,
    prompts: Vec<PromptRef>,
    created_at: String,
    updated_at: String,
}

impl NewTemplate {
    pub fn new(name: &str, description: &str, prompts: Vec<PromptRef>) -> Result<Self> {
        let now = validation::now();
        let template = Self {
            name: name.to_string(),
            description: description.to_string(),
            prompts: ordered(prompts)?,
            created_at: now.clone(),
            updated_at: now,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;

        let now = validation::now();
        let template = Self {
            name: validation::text(body, "name")?.unwrap_or_default(),
            description: validation::text(body, "description")?.unwrap_or_default(),
            prompts: prompt_refs(body)?.unwrap_or_default(),
            created_at: validation::text(body, "created_at")?.unwrap_or_else(|| now.clone()),
            updated_at: validation::text(body, "updated_at")?.unwrap_or(now),
        };
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<()> {
        validation::name(&self.name, 2, 100)?;
        validation::non_empty(&self.description, "Description cannot be empty.")?;
        validation::timestamp(&self.created_at)?;
        validation::timestamp(&self.updated_at)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Prompt references sorted by `order`.
    pub fn prompts(&self) -> &[PromptRef] {
        &self.prompts
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

/// Validated changes to a template.
///
/// `updated_at` is set to the current time unless supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateChanges {
    changes: Changes,
    prompts: Option<Vec<PromptRef>>,
}

impl TemplateChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;
        let mut changes = Changes::default();

        if let Some(name) = validation::text(body, "name")? {
            validation::name(&name, 2, 100)?;
            changes.set_text("name", name);
        }
        if let Some(description) = validation::text(body, "description")? {
            validation::non_empty(&description, "Description cannot be empty.")?;
            changes.set_text("description", description);
        }
        for column in ["created_at", "updated_at"] {
            if let Some(value) = validation::text(body, column)? {
                validation::timestamp(&value)?;
                changes.set_text(column, value);
            }
        }
        let prompts = prompt_refs(body)?;

        if changes.is_empty() && prompts.is_none() {
            return Err(StoreError::EmptyUpdate);
        }
        if !changes.contains("updated_at") {
            changes.set_text("updated_at", validation::now());
        }

        Ok(Self { changes, prompts })
    }

    pub fn changes(&self) -> &Changes {
        &self.changes
    }

    /// Replacement prompt sequence, if the update carried one.
    pub fn prompts(&self) -> Option<&[PromptRef]> {
        self.prompts.as_deref()
    }
}

fn prompt_refs(body: &Map<String, Value>) -> Result<Option<Vec<PromptRef>>> {
    match body.get("prompts") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let refs: Vec<PromptRef> = serde_json::from_value(value.clone()).map_err(|_| {
                StoreError::validation("Prompts must be a list of {promptId, order} objects.")
            })?;
            ordered(refs).map(Some)
        }
    }
}

/// Sorts references by `order`, rejecting repeated positions.
fn ordered(mut refs: Vec<PromptRef>) -> Result<Vec<PromptRef>> {
    refs.sort_by_key(|r| r.order);
    if refs.windows(2).any(|pair| pair[0].order == pair[1].order) {
        return Err(StoreError::validation("Prompt order values must be unique."));
    }
    if refs.iter().any(|r| r.prompt_id <= 0) {
        return Err(StoreError::validation("Prompt ids must be positive."));
    }
    Ok(refs)
}
