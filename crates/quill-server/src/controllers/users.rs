use quill_auth::{hash_password, validate_new_password};
use quill_router::{BoxFuture, Request, Response, Result, RouterError};
use quill_store::{NewUser, UserChanges, UserRepository};
use serde_json::{json, Value};

use super::{body_object, message, not_found, path_id, reject};

/// User accounts. Every action runs behind authentication.
#[derive(Debug, Clone)]
pub struct UserController {
    users: UserRepository,
}

impl UserController {
    pub const fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// `GET /me`: the user named by the token's `email` claim.
    pub fn me<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let email = req
                .principal()
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or_default();

            match self.users.find_by_email(email).await {
                Ok(Some(user)) => res.emit_json(
                    &json!({
                        "id": user.id,
                        "name": user.name,
                        "email": user.email,
                        "age": user.age,
                    }),
                    200,
                ),
                Ok(None) => not_found(res, "User not found"),
                Err(err) => reject(res, err, "Failed to fetch user: "),
            }
        })
    }

    /// `GET /`
    pub fn index<'a>(
        &'a self,
        _req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self.users.list().await {
                Ok(users) => res.emit_json(&json!({"total": users.len(), "users": users}), 200),
                Err(err) => reject(res, err, "Failed to fetch users: "),
            }
        })
    }

    /// `POST /` with the same password rules as registration.
    pub fn create<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut body = body_object(req);
            let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

            if let Err(err) = validate_new_password(password) {
                return res.emit_json(&json!({"error": err.to_string()}), 400);
            }
            let hash = hash_password(password).map_err(RouterError::handler)?;
            body.insert("password".to_string(), Value::String(hash));

            let saved = match NewUser::from_json(&body) {
                Ok(user) => self.users.save(&user).await,
                Err(err) => Err(err),
            };
            match saved {
                Ok(_) => message(res, "User created successfully", 201),
                Err(err) => reject(res, err, ""),
            }
        })
    }

    /// `PUT /{id}`: updates the authenticated user's own record.
    ///
    /// The target is the token's `userId` claim; the path id only has to be
    /// well-formed. A `password` field is ignored.
    pub fn update<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if path_id(req, res)?.is_none() {
                return Ok(());
            }
            let Some(user_id) = req.principal().get("userId").and_then(Value::as_i64) else {
                return res.emit_json(&json!({"error": "User ID is required"}), 400);
            };

            let mut body = body_object(req);
            body.remove("password");

            let updated = match UserChanges::from_json(&body) {
                Ok(changes) => self.users.update_by_id(user_id, &changes).await,
                Err(err) => Err(err),
            };
            match updated {
                Ok(true) => message(res, "User updated successfully", 200),
                Ok(false) => not_found(res, "User not found"),
                Err(err) => reject(res, err, ""),
            }
        })
    }

    /// `DELETE /{id}`: 204 with an empty body.
    pub fn destroy<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(id) = path_id(req, res)? else {
                return Ok(());
            };

            match self.users.delete_by_id(id).await {
                Ok(true) => {
                    res.emit_raw(Vec::new(), 204);
                    Ok(())
                }
                Ok(false) => not_found(res, "User not found"),
                Err(err) => reject(res, err, "Failed to delete user: "),
            }
        })
    }
}
