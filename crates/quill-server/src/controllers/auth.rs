use quill_auth::{hash_password, validate_new_password, verify_password, TokenService};
use quill_router::{BoxFuture, Request, Response, Result};
use quill_store::{NewUser, UserRepository};
use serde_json::{json, Value};
use tracing::{error, info};

use super::{body_object, message};

/// Registration, login and token refresh. Mounted before authentication.
#[derive(Debug, Clone)]
pub struct AuthController {
    users: UserRepository,
    tokens: TokenService,
}

impl AuthController {
    pub const fn new(users: UserRepository, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    /// `POST /register`
    pub fn register<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut body = body_object(req);
            let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

            if let Err(err) = validate_new_password(password) {
                return message(res, &err.to_string(), 400);
            }
            let hash = match hash_password(password) {
                Ok(hash) => hash,
                Err(err) => return registration_failed(res, &err.to_string()),
            };
            body.insert("password".to_string(), Value::String(hash));

            let saved = match NewUser::from_json(&body) {
                Ok(user) => self.users.save(&user).await,
                Err(err) => Err(err),
            };
            match saved {
                Ok(id) => {
                    info!(user_id = id, "user registered");
                    message(res, "User registered successfully", 201)
                }
                Err(err) if err.is_client_error() => message(res, &err.to_string(), 400),
                Err(err) => registration_failed(res, &err.to_string()),
            }
        })
    }

    /// `POST /login`
    pub fn login<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let body = req.body();
            let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
            let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

            let user = match self.users.find_by_email(email).await {
                Ok(user) => user,
                Err(err) => return login_failed(res, &err),
            };
            let Some(user) = user.filter(|u| verify_password(password, &u.password)) else {
                return message(res, "Invalid credentials", 401);
            };

            let issued = self
                .tokens
                .issue_access(user.id, &user.email)
                .and_then(|access| Ok((access, self.tokens.issue_refresh(user.id, &user.email)?)));
            match issued {
                Ok((access, refresh)) => res.emit_json(
                    &json!({
                        "message": "Login successful",
                        "accessToken": access,
                        "refreshToken": refresh,
                    }),
                    200,
                ),
                Err(err) => login_failed(res, &err),
            }
        })
    }

    /// `POST /refresh-token` with `{"token": <refresh token>}`.
    pub fn refresh<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let token = req.body().get("token").and_then(Value::as_str).unwrap_or_default();
            if token.is_empty() {
                return message(res, "Refresh token is required", 400);
            }

            let issued = self
                .tokens
                .verify_refresh(token)
                .and_then(|claims| self.tokens.issue_access(claims.user_id, &claims.email));
            match issued {
                Ok(access) => res.emit_json(&json!({"accessToken": access}), 200),
                Err(err) => res.emit_json(
                    &json!({
                        "message": "Invalid or expired refresh token",
                        "error": err.to_string(),
                    }),
                    401,
                ),
            }
        })
    }
}

fn registration_failed(res: &mut Response, reason: &str) -> Result<()> {
    error!(error = reason, "registration failed");
    res.emit_json(
        &json!({"message": "Error registering user", "error": reason}),
        500,
    )
}

fn login_failed(res: &mut Response, err: &dyn std::error::Error) -> Result<()> {
    error!(error = %err, "login failed");
    res.emit_json(
        &json!({"message": "Error logging in", "error": err.to_string()}),
        500,
    )
}
