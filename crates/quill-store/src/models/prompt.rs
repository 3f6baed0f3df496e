//! Prompts and the list filter.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Changes, Tag};
use crate::error::{Result, StoreError};
use crate::validation;

const FIELDS: &[&str] = &["name", "content", "variables", "tags", "created_at", "updated_at"];
const VARIABLES_ERROR: &str = "Invalid JSON format for variables.";

/// A stored prompt with its tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub id: i64,
    pub name: String,
    pub content: String,
    /// Decoded JSON array of variable definitions.
    pub variables: Value,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

/// A prompt about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrompt {
    name: String,
    content: String,
    variables: String,
    tag_ids: Vec<i64>,
    created_at: String,
    updated_at: String,
}

impl NewPrompt {
    /// Creates a prompt without tags. `variables` is JSON array text.
    pub fn new(name: &str, content: &str, variables: &str) -> Result<Self> {
        let now = validation::now();
        let prompt = Self {
            name: name.to_string(),
            content: content.to_string(),
            variables: variables.to_string(),
            tag_ids: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        prompt.validate()?;
        Ok(prompt)
    }

    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;

        let now = validation::now();
        let prompt = Self {
            name: validation::text(body, "name")?.unwrap_or_default(),
            content: validation::text(body, "content")?.unwrap_or_default(),
            variables: validation::json_array(body, "variables", VARIABLES_ERROR)?
                .unwrap_or_else(|| "[]".to_string()),
            tag_ids: dedup(validation::id_list(body, "tags")?.unwrap_or_default()),
            created_at: validation::text(body, "created_at")?.unwrap_or_else(|| now.clone()),
            updated_at: validation::text(body, "updated_at")?.unwrap_or(now),
        };
        prompt.validate()?;
        Ok(prompt)
    }

    /// Attaches tags by id.
    #[must_use]
    pub fn with_tags(mut self, tag_ids: Vec<i64>) -> Self {
        self.tag_ids = dedup(tag_ids);
        self
    }

    fn validate(&self) -> Result<()> {
        validation::name(&self.name, 2, 100)?;
        validation::non_empty(&self.content, "Content cannot be empty.")?;
        variables(&self.variables)?;
        validation::timestamp(&self.created_at)?;
        validation::timestamp(&self.updated_at)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Variables as JSON text.
    pub fn variables(&self) -> &str {
        &self.variables
    }

    pub fn tag_ids(&self) -> &[i64] {
        &self.tag_ids
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

/// Validated changes to a prompt.
///
/// `updated_at` is set to the current time unless supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptChanges {
    changes: Changes,
    tag_ids: Option<Vec<i64>>,
}

impl PromptChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self> {
        validation::known_fields(body, FIELDS)?;
        let mut changes = Changes::default();

        if let Some(name) = validation::text(body, "name")? {
            validation::name(&name, 2, 100)?;
            changes.set_text("name", name);
        }
        if let Some(content) = validation::text(body, "content")? {
            validation::non_empty(&content, "Content cannot be empty.")?;
            changes.set_text("content", content);
        }
        if let Some(vars) = validation::json_array(body, "variables", VARIABLES_ERROR)? {
            changes.set_text("variables", vars);
        }
        for column in ["created_at", "updated_at"] {
            if let Some(value) = validation::text(body, column)? {
                validation::timestamp(&value)?;
                changes.set_text(column, value);
            }
        }
        let tag_ids = validation::id_list(body, "tags")?.map(dedup);

        if changes.is_empty() && tag_ids.is_none() {
            return Err(StoreError::EmptyUpdate);
        }
        if !changes.contains("updated_at") {
            changes.set_text("updated_at", validation::now());
        }

        Ok(Self { changes, tag_ids })
    }

    pub fn changes(&self) -> &Changes {
        &self.changes
    }

    /// Replacement tag set, if the update carried one.
    pub fn tag_ids(&self) -> Option<&[i64]> {
        self.tag_ids.as_deref()
    }
}

/// Column a prompt list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Id,
    Name,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortColumn {
    /// Accepts the column name in snake or camel case.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Search, tag filter, sort and page for listing prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFilter {
    /// Substring matched against name and content.
    pub search: String,
    /// Prompts carrying any of these tags. Empty means no tag filter.
    pub tag_ids: Vec<i64>,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    /// One-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for PromptFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            tag_ids: Vec::new(),
            sort_by: SortColumn::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

impl PromptFilter {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Reads `page`, `limit`, `search`, `tags`, `sortBy` and `sortOrder`.
    ///
    /// Page and limit are clamped into range; values that are not numbers,
    /// unknown sort columns and malformed tag ids are errors.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        let mut filter = Self::default();

        if let Some(page) = query.get("page") {
            filter.page = number(page, "page")?.max(1);
        }
        if let Some(limit) = query.get("limit") {
            filter.limit = number(limit, "limit")?.clamp(1, Self::MAX_LIMIT);
        }
        if let Some(search) = query.get("search") {
            filter.search = search.clone();
        }
        if let Some(tags) = query.get("tags") {
            filter.tag_ids = tags
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<i64>()
                        .ok()
                        .filter(|id| *id > 0)
                        .ok_or_else(|| StoreError::validation(format!("Invalid tag id '{s}'.")))
                })
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(sort_by) = query.get("sortBy") {
            filter.sort_by = SortColumn::parse(sort_by).ok_or_else(|| {
                StoreError::validation(format!("Invalid sort column '{sort_by}'."))
            })?;
        }
        if let Some(sort_order) = query.get("sortOrder") {
            filter.sort_order = SortOrder::parse(sort_order).ok_or_else(|| {
                StoreError::validation(format!("Invalid sort order '{sort_order}'."))
            })?;
        }

        Ok(filter)
    }

    /// Rows to skip for the current page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

fn number(value: &str, key: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| StoreError::validation(format!("'{key}' must be a positive integer.")))
}

fn variables(text: &str) -> Result<()> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(_)) => Ok(()),
        _ => Err(StoreError::validation(VARIABLES_ERROR)),
    }
}

fn dedup(mut ids: Vec<i64>) -> Vec<i64> {
    let mut seen = Vec::with_capacity(ids.len());
    ids.retain(|id| {
        let fresh = !seen.contains(id);
        seen.push(*id);
        fresh
    });
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_new_prompt_defaults() {
        let body = json!({"name": "Greeting", "content": "Hello {{name}}"});
        let prompt = NewPrompt::from_json(body.as_object().unwrap()).unwrap();

        assert_eq!(prompt.variables(), "[]");
        assert!(prompt.tag_ids().is_empty());
        assert_eq!(prompt.created_at(), prompt.updated_at());
    }

    #[test]
    fn test_new_prompt_validation() {
        assert!(NewPrompt::new("G", "content", "[]").is_err());
        assert!(NewPrompt::new("Greeting", "", "[]").is_err());
        assert!(NewPrompt::new("Greeting", "content", "{}").is_err());

        let body = json!({"name": "Greeting", "content": "x", "tags": [2, 1, 2]});
        let prompt = NewPrompt::from_json(body.as_object().unwrap()).unwrap();
        assert_eq!(prompt.tag_ids(), [2, 1]);

        let body = json!({"name": "Greeting", "content": "x", "created_at": "yesterday"});
        assert!(NewPrompt::from_json(body.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_changes_refresh_updated_at() {
        let body = json!({"name": "Renamed"});
        let changes = PromptChanges::from_json(body.as_object().unwrap()).unwrap();
        assert!(changes.changes().contains("updated_at"));
        assert_eq!(changes.tag_ids(), None);

        let body = json!({"tags": []});
        let changes = PromptChanges::from_json(body.as_object().unwrap()).unwrap();
        assert_eq!(changes.tag_ids(), Some(&[][..]));

        assert!(matches!(
            PromptChanges::from_json(&Map::new()),
            Err(StoreError::EmptyUpdate)
        ));
    }

    #[test]
    fn test_filter_defaults() {
        let filter = PromptFilter::from_query(&HashMap::new()).unwrap();
        assert_eq!(filter, PromptFilter::default());
        assert_eq!(filter.offset(), 0);
        assert_eq!(filter.sort_by.as_sql(), "updated_at");
        assert_eq!(filter.sort_order.as_sql(), "DESC");
    }

    #[test]
    fn test_filter_parsing() {
        let filter = PromptFilter::from_query(&query(&[
            ("page", "3"),
            ("limit", "500"),
            ("search", "hello"),
            ("tags", "1, 4,"),
            ("sortBy", "createdAt"),
            ("sortOrder", "ASC"),
        ]))
        .unwrap();

        assert_eq!(filter.page, 3);
        assert_eq!(filter.limit, PromptFilter::MAX_LIMIT);
        assert_eq!(filter.tag_ids, [1, 4]);
        assert_eq!(filter.sort_by, SortColumn::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Asc);
        assert_eq!(filter.offset(), 200);
    }

    #[test]
    fn test_filter_rejects_bad_input() {
        assert!(PromptFilter::from_query(&query(&[("sortBy", "password")])).is_err());
        assert!(PromptFilter::from_query(&query(&[("sortOrder", "sideways")])).is_err());
        assert!(PromptFilter::from_query(&query(&[("page", "two")])).is_err());
        assert!(PromptFilter::from_query(&query(&[("tags", "1,x")])).is_err());

        let filter = PromptFilter::from_query(&query(&[("page", "0"), ("limit", "0")])).unwrap();
        assert_eq!((filter.page, filter.limit), (1, 1));
    }
}
