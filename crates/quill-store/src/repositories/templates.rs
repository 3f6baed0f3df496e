use std::collections::HashMap;

use sqlx::{FromRow, SqliteConnection};
use tracing::debug;

use super::{missing_reference, placeholders, update_columns};
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewTemplate, PromptRef, Template, TemplateChanges};

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: i64,
    name: String,
    description: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, FromRow)]
struct Slot {
    template_id: i64,
    prompt_id: i64,
    position: i64,
}

/// Templates table access, including the ordered prompt slots.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    db: Database,
}

impl TemplateRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn save(&self, template: &NewTemplate) -> Result<Template> {
        let mut tx = self.db.pool().begin().await?;

        let id = sqlx::query(
            "INSERT INTO templates (name, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(template.name())
        .bind(template.description())
        .bind(template.created_at())
        .bind(template.updated_at())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        fill_slots(&mut tx, id, template.prompts()).await?;
        let saved = fetch(&mut tx, id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

        tx.commit().await?;
        debug!(id, prompts = template.prompts().len(), "template saved");
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Template>> {
        let mut conn = self.db.pool().acquire().await?;
        fetch(&mut conn, id).await
    }

    /// All templates, newest first.
    pub async fn list(&self) -> Result<Vec<Template>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows = sqlx::query_as::<_, TemplateRow>(
            "SELECT id, name, description, created_at, updated_at FROM templates \
             ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&mut *conn)
        .await?;

        with_slots(&mut conn, rows).await
    }

    /// Applies the changes, replacing the prompt sequence if one was given.
    pub async fn update_by_id(&self, id: i64, changes: &TemplateChanges) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        if !update_columns(&mut tx, "templates", id, changes.changes()).await? {
            return Ok(false);
        }
        if let Some(prompts) = changes.prompts() {
            sqlx::query("DELETE FROM template_prompts WHERE template_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            fill_slots(&mut tx, id, prompts).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn fill_slots(
    conn: &mut SqliteConnection,
    template_id: i64,
    prompts: &[PromptRef],
) -> Result<()> {
    for slot in prompts {
        sqlx::query(
            "INSERT INTO template_prompts (template_id, prompt_id, position) \
             VALUES (?, ?, ?)",
        )
            .bind(template_id)
            .bind(slot.prompt_id)
            .bind(slot.order)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                missing_reference(e, &format!("Prompt {} does not exist.", slot.prompt_id))
            })?;
    }
    Ok(())
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Option<Template>> {
    let row = sqlx::query_as::<_, TemplateRow>(
        "SELECT id, name, description, created_at, updated_at FROM templates WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(with_slots(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn with_slots(conn: &mut SqliteConnection, rows: Vec<TemplateRow>) -> Result<Vec<Template>> {
    let mut slots: HashMap<i64, Vec<PromptRef>> = HashMap::new();

    if !rows.is_empty() {
        let sql = format!(
            "SELECT template_id, prompt_id, position FROM template_prompts \
             WHERE template_id IN ({}) ORDER BY position",
            placeholders(rows.len())
        );
        let mut query = sqlx::query_as::<_, Slot>(&sql);
        for row in &rows {
            query = query.bind(row.id);
        }
        for slot in query.fetch_all(&mut *conn).await? {
            slots.entry(slot.template_id).or_default().push(PromptRef {
                prompt_id: slot.prompt_id,
                order: slot.position,
            });
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| Template {
            prompts: slots.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}
