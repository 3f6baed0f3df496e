//! Bearer-token authentication.

use quill_auth::TokenService;
use quill_router::{BoxFuture, Middleware, Next, Request, Response, Result};
use serde_json::json;
use tracing::debug;

/// Requires a valid access token in the `Authorization` header.
///
/// On success the token's claims become the request principal. Registered
/// after the public mounts, so only the mounts that follow it are guarded.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    tokens: TokenService,
}

impl AuthMiddleware {
    pub const fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl Middleware for AuthMiddleware {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let header = req.get_header("authorization").unwrap_or_default();
            if header.trim().is_empty() {
                return res.emit_json(
                    &json!({"message": "No token provided, authorization denied"}),
                    401,
                );
            }

            let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
            if token.is_empty() {
                return res.emit_json(
                    &json!({"message": "Token is missing, authorization denied"}),
                    401,
                );
            }

            match self.tokens.verify_access(token) {
                Ok(claims) => {
                    debug!(user_id = claims.user_id, "authenticated");
                    req.set_principal(claims.to_map());
                    next.run(req, res).await
                }
                Err(err) => res.emit_json(
                    &json!({"message": "Token is not valid", "error": err.to_string()}),
                    403,
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_router::{MiddlewareChain, Terminal};
    use std::sync::Arc;

    fn tokens() -> TokenService {
        TokenService::new("access", "refresh")
    }

    fn echo_principal<'a>() -> Terminal<'a> {
        Box::new(|req: &'a mut Request, res: &'a mut Response| {
            Box::pin(async move { res.emit_json(&json!({"principal": req.principal()}), 200) })
        })
    }

    async fn run(req: Request) -> Response {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(AuthMiddleware::new(tokens())));

        let mut req = req;
        let mut res = Response::new();
        chain.run(&mut req, &mut res, echo_principal()).await.unwrap();
        res
    }

    #[tokio::test]
    async fn test_missing_header() {
        let res = run(Request::get("/")).await;
        assert_eq!(res.status(), 401);
        assert_eq!(
            res.body_json().unwrap()["message"],
            "No token provided, authorization denied"
        );
    }

    #[tokio::test]
    async fn test_empty_token() {
        let res = run(Request::get("/").header("Authorization", "Bearer ")).await;
        assert_eq!(res.status(), 401);
        assert_eq!(
            res.body_json().unwrap()["message"],
            "Token is missing, authorization denied"
        );
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let refresh = tokens().issue_refresh(1, "a@b.io").unwrap();
        let res = run(Request::get("/").header("Authorization", format!("Bearer {refresh}"))).await;

        assert_eq!(res.status(), 403);
        let body = res.body_json().unwrap();
        assert_eq!(body["message"], "Token is not valid");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_valid_token_sets_principal() {
        let access = tokens().issue_access(7, "ada@example.com").unwrap();
        let req = Request::get("/").header("HTTP_AUTHORIZATION", format!("Bearer {access}"));
        let res = run(req).await;

        assert_eq!(res.status(), 200);
        let principal = &res.body_json().unwrap()["principal"];
        assert_eq!(principal["userId"], 7);
        assert_eq!(principal["email"], "ada@example.com");
    }
}
