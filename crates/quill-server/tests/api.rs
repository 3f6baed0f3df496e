//! End-to-end tests through the wired application.

use quill_auth::TokenService;
use quill_router::{App, Request};
use quill_server::{build_app, AppState};
use quill_store::Database;
use serde_json::{json, Value};

async fn app() -> App {
    let db = Database::in_memory().await.unwrap();
    build_app(&AppState::new(db, TokenService::new("access", "refresh"))).unwrap()
}

async fn send(app: &App, req: Request) -> (u16, Value) {
    let res = app.handle(req).await;
    (res.status(), res.body_json().unwrap_or(Value::Null))
}

/// Registers and logs in a user, returning a bearer header value.
async fn login(app: &App, email: &str) -> String {
    let (status, _) = send(
        app,
        Request::post("/api/v1/auth/register").json_body(json!({
            "name": "Ada",
            "email": email,
            "password": "password123",
            "age": 36,
        })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, body) = send(
        app,
        Request::post("/api/v1/auth/login")
            .json_body(json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, 200);
    format!("Bearer {}", body["accessToken"].as_str().unwrap())
}

fn authed(req: Request, token: &str) -> Request {
    req.header("Authorization", token)
}

#[tokio::test]
async fn test_unknown_prefix() {
    let app = app().await;
    let (status, body) = send(&app, Request::get("/api/v2/prompts")).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"message": "Not Found"}));
}

#[tokio::test]
async fn test_preflight_skips_auth() {
    let app = app().await;
    let res = app.handle(Request::options("/api/v1/prompts")).await;

    assert_eq!(res.status(), 204);
    assert!(res.body().is_empty());
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
    assert_eq!(
        res.get_header("Access-Control-Allow-Methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
}

#[tokio::test]
async fn test_protected_mounts_require_token() {
    let app = app().await;

    for path in ["/api/v1/users/me", "/api/v1/prompts", "/api/v1/tags", "/api/v1/templates"] {
        let res = app.handle(Request::get(path)).await;
        assert_eq!(res.status(), 401, "{path}");
        assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
    }

    let (status, body) = send(
        &app,
        authed(Request::get("/api/v1/prompts"), "Bearer not-a-token"),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Token is not valid");
}

#[tokio::test]
async fn test_auth_mount_is_public() {
    let app = app().await;
    let (status, body) = send(&app, Request::post("/api/v1/auth/login").json_body(json!({}))).await;
    assert_eq!(status, 401);
    assert_eq!(body, json!({"message": "Invalid credentials"}));

    let (status, body) = send(&app, Request::post("/api/v1/auth/logout")).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"message": "Route not found"}));
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let app = app().await;
    login(&app, "ada@example.com").await;

    let (_, body) = send(
        &app,
        Request::post("/api/v1/auth/login")
            .json_body(json!({"email": "ada@example.com", "password": "password123"})),
    )
    .await;
    let refresh = body["refreshToken"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Request::post("/api/v1/auth/refresh-token").json_body(json!({"token": refresh})),
    )
    .await;
    assert_eq!(status, 200);
    let token = format!("Bearer {}", body["accessToken"].as_str().unwrap());

    let (status, _) = send(&app, authed(Request::get("/api/v1/users/me"), &token)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_users() {
    let app = app().await;
    let token = login(&app, "ada@example.com").await;

    let (status, me) = send(&app, authed(Request::get("/api/v1/users/me"), &token)).await;
    assert_eq!(status, 200);
    assert_eq!(me["email"], "ada@example.com");
    assert!(me.get("password").is_none());
    let id = me["id"].as_i64().unwrap();

    let (status, list) = send(&app, authed(Request::get("/api/v1/users"), &token)).await;
    assert_eq!(status, 200);
    assert_eq!(list["total"], 1);
    assert!(list["users"][0].get("password").is_none());

    let (status, body) = send(
        &app,
        authed(Request::put("/api/v1/users/abc"), &token).json_body(json!({"name": "Grace"})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Invalid id"}));

    let (status, body) = send(
        &app,
        authed(Request::put(format!("/api/v1/users/{id}")), &token)
            .json_body(json!({"name": "Ada Lovelace", "password": "ignored"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "User updated successfully");

    let (_, me) = send(&app, authed(Request::get("/api/v1/users/me"), &token)).await;
    assert_eq!(me["name"], "Ada Lovelace");

    let (status, body) = send(
        &app,
        authed(Request::post("/api/v1/users"), &token).json_body(json!({
            "name": "Grace",
            "email": "grace@example.com",
            "password": "bad pass",
            "age": 40,
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Password can only contain alphanumeric characters.");

    let res = app
        .handle(authed(Request::delete(format!("/api/v1/users/{id}")), &token))
        .await;
    assert_eq!(res.status(), 204);
    assert!(res.body().is_empty());

    let (status, body) = send(&app, authed(Request::get("/api/v1/users/me"), &token)).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "User not found"}));
}

#[tokio::test]
async fn test_prompts_with_tags() {
    let app = app().await;
    let token = login(&app, "ada@example.com").await;

    let mut tag_ids = Vec::new();
    for name in ["rust", "writing"] {
        let (status, body) = send(
            &app,
            authed(Request::post("/api/v1/tags"), &token).json_body(json!({"name": name})),
        )
        .await;
        assert_eq!(status, 201);
        tag_ids.push(body["tag"]["id"].as_i64().unwrap());
    }

    let (status, body) = send(
        &app,
        authed(Request::post("/api/v1/prompts"), &token).json_body(json!({
            "name": "Explain ownership",
            "content": "Explain {{topic}} to a beginner",
            "variables": ["topic"],
            "tags": [tag_ids[0]],
        })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["message"], "Prompt created successfully");
    assert_eq!(body["prompt"]["tags"][0]["name"], "rust");
    let rust_prompt = body["prompt"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        authed(Request::post("/api/v1/prompts"), &token).json_body(json!({
            "name": "Blog intro",
            "content": "Write an intro",
            "variables": "[]",
            "tags": [tag_ids[1]],
        })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, body) = send(
        &app,
        authed(Request::get("/api/v1/prompts"), &token)
            .query_param("tags", tag_ids[0].to_string())
            .query_param("search", "ownership"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["prompts"][0]["id"], rust_prompt);
    assert_eq!(body["prompts"][0]["variables"], json!(["topic"]));

    let (_, body) = send(
        &app,
        authed(Request::get("/api/v1/prompts"), &token)
            .query_param("sortBy", "name")
            .query_param("sortOrder", "asc")
            .query_param("limit", "1")
            .query_param("page", "2"),
    )
    .await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["prompts"].as_array().unwrap().len(), 1);
    assert_eq!(body["prompts"][0]["name"], "Explain ownership");

    let (status, body) = send(
        &app,
        authed(Request::put(format!("/api/v1/prompts/{rust_prompt}")), &token)
            .json_body(json!({"tags": tag_ids})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Prompt updated successfully");

    let (status, body) = send(
        &app,
        authed(Request::get(format!("/api/v1/prompts/{rust_prompt}/")), &token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["tags"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        authed(Request::delete(format!("/api/v1/prompts/{rust_prompt}")), &token),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = send(
        &app,
        authed(Request::get(format!("/api/v1/prompts/{rust_prompt}")), &token),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Prompt not found"}));
}

#[tokio::test]
async fn test_prompt_input_errors() {
    let app = app().await;
    let token = login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        authed(Request::get("/api/v1/prompts"), &token).query_param("sortBy", "password"),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Failed to fetch prompts: Invalid sort column 'password'."
    );

    let (status, body) = send(
        &app,
        authed(Request::post("/api/v1/prompts"), &token)
            .json_body(json!({"name": "Ok name", "content": "x", "variables": {"a": 1}})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Failed to create prompt: Invalid JSON format for variables."
    );

    let (status, body) = send(
        &app,
        authed(Request::put("/api/v1/prompts/1"), &token).json_body(json!({"colour": "red"})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "Failed to update prompt: Property 'colour' does not exist"
    );

    let (status, body) = send(&app, authed(Request::get("/api/v1/prompts/one"), &token)).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Invalid id"}));

    let (status, body) = send(
        &app,
        authed(Request::get("/api/v1/prompts/1/versions"), &token),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"message": "Route not found"}));
}

#[tokio::test]
async fn test_templates() {
    let app = app().await;
    let token = login(&app, "ada@example.com").await;

    let mut prompt_ids = Vec::new();
    for name in ["Intro", "Outro"] {
        let (_, body) = send(
            &app,
            authed(Request::post("/api/v1/prompts"), &token)
                .json_body(json!({"name": name, "content": "text"})),
        )
        .await;
        prompt_ids.push(body["prompt"]["id"].as_i64().unwrap());
    }

    let (status, body) = send(
        &app,
        authed(Request::post("/api/v1/templates"), &token).json_body(json!({
            "name": "Newsletter",
            "description": "Weekly newsletter",
            "prompts": [
                {"promptId": prompt_ids[1], "order": 2},
                {"promptId": prompt_ids[0], "order": 1},
            ],
        })),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["message"], "Template created successfully");
    let id = body["template"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        authed(Request::get(format!("/api/v1/templates/{id}")), &token),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["prompts"],
        json!([
            {"promptId": prompt_ids[0], "order": 1},
            {"promptId": prompt_ids[1], "order": 2},
        ])
    );

    let (status, body) = send(
        &app,
        authed(Request::put(format!("/api/v1/templates/{id}")), &token)
            .json_body(json!({"prompts": [{"promptId": 999, "order": 1}]})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Prompt 999 does not exist.");

    let (_, body) = send(&app, authed(Request::get("/api/v1/templates"), &token)).await;
    assert_eq!(body["total"], 1);

    let (status, _) = send(
        &app,
        authed(Request::delete(format!("/api/v1/templates/{id}")), &token),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = send(
        &app,
        authed(Request::delete(format!("/api/v1/templates/{id}")), &token),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Template not found"}));
}

#[tokio::test]
async fn test_tag_conflicts() {
    let app = app().await;
    let token = login(&app, "ada@example.com").await;

    for expected in [201, 400] {
        let (status, _) = send(
            &app,
            authed(Request::post("/api/v1/tags"), &token).json_body(json!({"name": "rust"})),
        )
        .await;
        assert_eq!(status, expected);
    }

    let (status, body) = send(
        &app,
        authed(Request::post("/api/v1/tags"), &token).json_body(json!({"name": "r"})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Name must be between 2 and 50 characters.");
}

#[tokio::test]
async fn test_store_failures_answer_400() {
    let db = Database::in_memory().await.unwrap();
    let tokens = TokenService::new("access", "refresh");
    let app = build_app(&AppState::new(db.clone(), tokens)).unwrap();
    let token = login(&app, "ada@example.com").await;

    for table in ["template_prompts", "prompt_tags", "prompts", "tags"] {
        sqlx::query(&format!("DROP TABLE {table}"))
            .execute(db.pool())
            .await
            .unwrap();
    }

    let cases = [
        (Request::get("/api/v1/prompts"), "Failed to fetch prompts: "),
        (Request::get("/api/v1/prompts/1"), "Failed to fetch prompt: "),
        (
            Request::post("/api/v1/prompts")
                .json_body(json!({"name": "Greeting", "content": "Hello {{name}}"})),
            "Failed to create prompt: ",
        ),
        (Request::delete("/api/v1/prompts/1"), "Failed to delete prompt: "),
        (Request::get("/api/v1/tags"), "Failed to fetch tags: "),
    ];

    for (req, prefix) in cases {
        let path = req.path().to_string();
        let (status, body) = send(&app, authed(req, &token)).await;
        assert_eq!(status, 400, "{path}");
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with(prefix), "{path}: {error}");
    }
}
