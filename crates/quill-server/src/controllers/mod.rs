//! Request handlers, one controller per resource.
//!
//! Every action has the shape
//! `fn(&self, &mut Request, &mut Response) -> BoxFuture<'_, Result<()>>`
//! so it can be bound into the handler registry as a plain method.
//! Store failures are answered here with a 400; only errors no action
//! translates reach the application's 500.

mod auth;
mod prompts;
mod tags;
mod templates;
mod users;

pub use auth::AuthController;
pub use prompts::PromptController;
pub use tags::TagController;
pub use templates::TemplateController;
pub use users::UserController;

use quill_router::{Request, Response, Result};
use quill_store::StoreError;
use serde_json::{json, Map, Value};
use tracing::{debug, error};

/// The request body as a JSON object. Anything else reads as empty.
fn body_object(req: &Request) -> Map<String, Value> {
    req.body().as_object().cloned().unwrap_or_default()
}

/// Reads the `{id}` path parameter, answering 400 if it is not an integer.
fn path_id(req: &Request, res: &mut Response) -> Result<Option<i64>> {
    if let Some(id) = req.params().parse::<i64>("id") {
        return Ok(Some(id));
    }
    res.emit_json(&json!({"error": "Invalid id"}), 400)?;
    Ok(None)
}

/// Answers a store error with 400 `{"error": prefix + message}`.
///
/// Database failures are logged at `error`, input errors at `debug`.
fn reject(res: &mut Response, err: StoreError, prefix: &str) -> Result<()> {
    if err.is_client_error() {
        debug!(error = %err, "rejected input");
    } else {
        error!(error = %err, "store failure");
    }
    res.emit_json(&json!({"error": format!("{prefix}{err}")}), 400)
}

fn not_found(res: &mut Response, message: &str) -> Result<()> {
    res.emit_json(&json!({"error": message}), 404)
}

fn message(res: &mut Response, text: &str, status: u16) -> Result<()> {
    res.emit_json(&json!({"message": text}), status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_router::PathParams;

    fn with_id(id: &str) -> Request {
        let mut params = PathParams::new();
        params.insert("id", id);
        let mut req = Request::get("/");
        req.set_params(params);
        req
    }

    #[test]
    fn test_path_id() {
        let mut res = Response::new();
        assert_eq!(path_id(&with_id("42"), &mut res).unwrap(), Some(42));
        assert!(!res.is_sent());

        assert_eq!(path_id(&with_id("abc"), &mut res).unwrap(), None);
        assert_eq!(res.status(), 400);
        assert_eq!(res.body_json().unwrap(), json!({"error": "Invalid id"}));
    }

    #[test]
    fn test_reject_answers_every_store_error_with_400() {
        let mut res = Response::new();
        reject(&mut res, StoreError::EmptyUpdate, "Failed: ").unwrap();
        assert_eq!(
            res.body_json().unwrap(),
            json!({"error": "Failed: No data provided for update"})
        );

        let mut res = Response::new();
        let corrupt = serde_json::from_str::<Value>("{").unwrap_err();
        reject(&mut res, StoreError::Json(corrupt), "Failed to fetch tags: ").unwrap();
        assert_eq!(res.status(), 400);
        let body = res.body_json().unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Failed to fetch tags: "));
    }

    #[test]
    fn test_body_object() {
        let req = Request::post("/").json_body(json!(["not", "an", "object"]));
        assert!(body_object(&req).is_empty());

        let req = Request::post("/").json_body(json!({"name": "x"}));
        assert_eq!(body_object(&req)["name"], "x");
    }
}
