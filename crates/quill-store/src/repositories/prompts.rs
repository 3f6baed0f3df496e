use std::collections::HashMap;

use sqlx::{FromRow, Row, SqliteConnection};
use tracing::debug;

use super::{missing_reference, placeholders, update_columns};
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewPrompt, Prompt, PromptChanges, PromptFilter, Tag};

#[derive(Debug, FromRow)]
struct PromptRow {
    id: i64,
    name: String,
    content: String,
    variables: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, FromRow)]
struct TagLink {
    prompt_id: i64,
    id: i64,
    name: String,
}

/// Prompts table access, including each prompt's tag links.
#[derive(Debug, Clone)]
pub struct PromptRepository {
    db: Database,
}

impl PromptRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a prompt with its tags and returns it as stored.
    pub async fn save(&self, prompt: &NewPrompt) -> Result<Prompt> {
        let mut tx = self.db.pool().begin().await?;

        let id = sqlx::query(
            "INSERT INTO prompts (name, content, variables, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(prompt.name())
        .bind(prompt.content())
        .bind(prompt.variables())
        .bind(prompt.created_at())
        .bind(prompt.updated_at())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        link_tags(&mut tx, id, prompt.tag_ids()).await?;
        let saved = fetch(&mut tx, id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

        tx.commit().await?;
        debug!(id, tags = prompt.tag_ids().len(), "prompt saved");
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Prompt>> {
        let mut conn = self.db.pool().acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Applies the changes, replacing the tag set if one was given.
    ///
    /// Returns false if no prompt has this id.
    pub async fn update_by_id(&self, id: i64, changes: &PromptChanges) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        if !update_columns(&mut tx, "prompts", id, changes.changes()).await? {
            return Ok(false);
        }
        if let Some(tag_ids) = changes.tag_ids() {
            sqlx::query("DELETE FROM prompt_tags WHERE prompt_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_tags(&mut tx, id, tag_ids).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Deleting a prompt drops its tag links and template slots.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One page of prompts matching the filter, with their tags.
    pub async fn find_all_with_filters(&self, filter: &PromptFilter) -> Result<Vec<Prompt>> {
        let order = filter.sort_order.as_sql();
        let sql = format!(
            "SELECT p.id, p.name, p.content, p.variables, p.created_at, p.updated_at{} \
             ORDER BY p.{} {order}, p.id {order} LIMIT ? OFFSET ?",
            filter_clause(filter),
            filter.sort_by.as_sql(),
        );

        let pattern = like_pattern(&filter.search);
        let mut query = sqlx::query_as::<_, PromptRow>(&sql)
            .bind(pattern.clone())
            .bind(pattern);
        for tag_id in &filter.tag_ids {
            query = query.bind(*tag_id);
        }

        let mut conn = self.db.pool().acquire().await?;
        let rows = query
            .bind(i64::from(filter.limit))
            .bind(filter.offset())
            .fetch_all(&mut *conn)
            .await?;

        with_tags(&mut conn, rows).await
    }

    /// Number of prompts matching the filter, ignoring the page.
    pub async fn count_all_with_filters(&self, filter: &PromptFilter) -> Result<i64> {
        let sql = format!("SELECT COUNT(*){}", filter_clause(filter));

        let pattern = like_pattern(&filter.search);
        let mut query = sqlx::query(&sql).bind(pattern.clone()).bind(pattern);
        for tag_id in &filter.tag_ids {
            query = query.bind(*tag_id);
        }

        let row = query.fetch_one(self.db.pool()).await?;
        Ok(row.get(0))
    }
}

/// `FROM ... WHERE ...` shared by the list and count queries.
///
/// Binds: the search pattern twice, then each tag id.
fn filter_clause(filter: &PromptFilter) -> String {
    let mut sql = String::from(
        " FROM prompts p \
         WHERE (p.name LIKE ? ESCAPE '\\' OR p.content LIKE ? ESCAPE '\\')",
    );

    if !filter.tag_ids.is_empty() {
        sql.push_str(" AND p.id IN (SELECT pt.prompt_id FROM prompt_tags pt WHERE pt.tag_id IN (");
        sql.push_str(&placeholders(filter.tag_ids.len()));
        sql.push_str("))");
    }
    sql
}

/// Wraps the search in `%` after escaping LIKE wildcards.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

async fn link_tags(conn: &mut SqliteConnection, prompt_id: i64, tag_ids: &[i64]) -> Result<()> {
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO prompt_tags (prompt_id, tag_id) VALUES (?, ?)")
            .bind(prompt_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| missing_reference(e, &format!("Tag {tag_id} does not exist.")))?;
    }
    Ok(())
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Option<Prompt>> {
    let row = sqlx::query_as::<_, PromptRow>(
        "SELECT id, name, content, variables, created_at, updated_at FROM prompts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(with_tags(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Loads the tags for `rows` in one query and builds the prompts.
async fn with_tags(conn: &mut SqliteConnection, rows: Vec<PromptRow>) -> Result<Vec<Prompt>> {
    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();

    if !rows.is_empty() {
        let sql = format!(
            "SELECT pt.prompt_id, t.id, t.name FROM prompt_tags pt \
             JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.prompt_id IN ({}) ORDER BY t.name, t.id",
            placeholders(rows.len())
        );
        let mut query = sqlx::query_as::<_, TagLink>(&sql);
        for row in &rows {
            query = query.bind(row.id);
        }
        for link in query.fetch_all(&mut *conn).await? {
            tags.entry(link.prompt_id).or_default().push(Tag {
                id: link.id,
                name: link.name,
            });
        }
    }

    rows.into_iter()
        .map(|row| {
            Ok(Prompt {
                variables: serde_json::from_str(&row.variables)?,
                tags: tags.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                content: row.content,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
        })
        .collect()
}
