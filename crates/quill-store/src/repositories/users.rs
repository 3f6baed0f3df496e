use tracing::debug;

use super::{unique_violation, update_columns};
use crate::db::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User, UserChanges};

const DUPLICATE_EMAIL: &str = "Email is already registered.";

/// Users table access.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a user and returns the new id.
    pub async fn save(&self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password, age, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.name())
        .bind(user.email())
        .bind(user.password())
        .bind(user.age())
        .bind(user.created_at())
        .execute(self.db.pool())
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))?;

        let id = result.last_insert_rowid();
        debug!(id, "user saved");
        Ok(id)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(users)
    }

    /// Applies the changes. Returns false if no user has this id.
    pub async fn update_by_id(&self, id: i64, changes: &UserChanges) -> Result<bool> {
        let mut conn = self.db.pool().acquire().await?;
        update_columns(&mut conn, "users", id, changes.changes())
            .await
            .map_err(|e| match e {
                StoreError::Database(db) => unique_violation(db, DUPLICATE_EMAIL),
                other => other,
            })
    }

    /// Returns false if no user has this id.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn repo() -> UserRepository {
        UserRepository::new(Database::in_memory().await.unwrap())
    }

    fn new_user(email: &str) -> NewUser {
        let hash = quill_auth::hash_password("password123").unwrap();
        NewUser::new("Ada", email, &hash, 36).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = repo().await;
        let id = repo.save(&new_user("ada@example.com")).await.unwrap();

        let by_id = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");
        assert_eq!(by_id.age, 36);

        let by_email = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert!(quill_auth::verify_password("password123", &by_email.password));

        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(repo.find_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = repo().await;
        repo.save(&new_user("ada@example.com")).await.unwrap();

        let err = repo.save(&new_user("ada@example.com")).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), DUPLICATE_EMAIL);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let id = repo.save(&new_user("ada@example.com")).await.unwrap();

        let body = json!({"name": "Ada L.", "age": 37});
        let changes = UserChanges::from_json(body.as_object().unwrap()).unwrap();
        assert!(repo.update_by_id(id, &changes).await.unwrap());
        assert!(!repo.update_by_id(id + 1, &changes).await.unwrap());

        let user = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!((user.name.as_str(), user.age), ("Ada L.", 37));

        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(repo.delete_by_id(id).await.unwrap());
        assert!(!repo.delete_by_id(id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_to_taken_email() {
        let repo = repo().await;
        repo.save(&new_user("ada@example.com")).await.unwrap();
        let id = repo.save(&new_user("grace@example.com")).await.unwrap();

        let body = json!({"email": "ada@example.com"});
        let changes = UserChanges::from_json(body.as_object().unwrap()).unwrap();
        let err = repo.update_by_id(id, &changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
