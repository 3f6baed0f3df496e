//! Repositories: one per entity, each holding a [`Database`](crate::Database)
//! handle.

mod prompts;
mod tags;
mod templates;
mod users;

pub use prompts::PromptRepository;
pub use tags::TagRepository;
pub use templates::TemplateRepository;
pub use users::UserRepository;

use sqlx::SqliteConnection;

use crate::error::{Result, StoreError};
use crate::models::{Changes, FieldValue};

/// Runs `UPDATE {table} SET ... WHERE id = ?` for the given changes.
///
/// Returns whether a row was updated. `table` is always a literal from this
/// module and column names come from the models' field lists.
pub(crate) async fn update_columns(
    conn: &mut SqliteConnection,
    table: &str,
    id: i64,
    changes: &Changes,
) -> Result<bool> {
    if changes.is_empty() {
        return Err(StoreError::EmptyUpdate);
    }

    let assignments: Vec<String> = changes
        .iter()
        .map(|(column, _)| format!("{column} = ?"))
        .collect();
    let sql = format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", "));

    let mut query = sqlx::query(&sql);
    for (_, value) in changes.iter() {
        query = match value {
            FieldValue::Text(text) => query.bind(text.clone()),
            FieldValue::Integer(n) => query.bind(*n),
        };
    }

    let result = query.bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Turns a unique-constraint violation into a client-facing message.
pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> StoreError {
    if err.as_database_error().is_some_and(|e| e.is_unique_violation()) {
        StoreError::validation(message)
    } else {
        StoreError::Database(err)
    }
}

/// Turns a foreign-key violation into a client-facing message.
pub(crate) fn missing_reference(err: sqlx::Error, message: &str) -> StoreError {
    if err.as_database_error().is_some_and(|e| e.is_foreign_key_violation()) {
        StoreError::validation(message)
    } else {
        StoreError::Database(err)
    }
}

/// `?, ?, ?` with one placeholder per item.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[tokio::test]
    async fn test_update_columns_rejects_empty() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let result = update_columns(&mut conn, "tags", 1, &Changes::default()).await;
        assert!(matches!(result, Err(StoreError::EmptyUpdate)));
    }
}
