use super::{unique_violation, update_columns};
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewTag, Tag, TagChanges};

const DUPLICATE_NAME: &str = "Tag name already exists.";

/// Tags table access.
#[derive(Debug, Clone)]
pub struct TagRepository {
    db: Database,
}

impl TagRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn save(&self, tag: &NewTag) -> Result<Tag> {
        let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
            .bind(tag.name())
            .execute(self.db.pool())
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_NAME))?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: tag.name().to_string(),
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(tag)
    }

    /// All tags, alphabetically.
    pub async fn list(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name, id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(tags)
    }

    pub async fn update_by_id(&self, id: i64, changes: &TagChanges) -> Result<bool> {
        let mut conn = self.db.pool().acquire().await?;
        update_columns(&mut conn, "tags", id, changes.changes())
            .await
            .map_err(|e| match e {
                StoreError::Database(db) => unique_violation(db, DUPLICATE_NAME),
                other => other,
            })
    }

    /// Deleting a tag detaches it from every prompt.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
