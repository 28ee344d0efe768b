// tests/api_tests.rs

use std::collections::HashMap;

use exam_backend::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn test_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

fn unique_name(prefix: &str) -> String {
    // Truncate UUID to keep usernames within the length limits.
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers and logs in a fresh user; returns (username, token).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String) {
    let username = unique_name("u");
    let password = "password123";

    let resp = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@test.local", username),
            "password": password
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    let login_resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    let token = login_resp["token"].as_str().expect("Token not found").to_string();
    (username, token)
}

/// Seeds an admin user directly in the database and logs in.
async fn admin_token(client: &reqwest::Client, address: &str, pool: &PgPool) -> String {
    let username = unique_name("adm");
    let password = "admin_password";
    let hashed = hash_password(password).expect("hash failed");

    sqlx::query("INSERT INTO users (username, email, password, role) VALUES ($1, $2, $3, 'admin')")
        .bind(&username)
        .bind(format!("{}@test.local", username))
        .bind(&hashed)
        .execute(pool)
        .await
        .expect("Failed to seed admin");

    let login_resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Admin login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse admin login json");

    login_resp["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn health_check_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@test.local", username),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short, email malformed
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");
    let body = serde_json::json!({
        "username": username,
        "email": format!("{}@test.local", username),
        "password": "password123"
    });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn submit_requires_auth() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/exams/1/submit", address))
        .json(&serde_json::json!({ "answers": {} }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn submit_to_missing_exam_creates_no_attempt() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;
    let (username, token) = register_and_login(&client, &address).await;

    let response = client
        .post(format!("{}/api/exams/999999999/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": { "1": "A" } }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let attempts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attempts a JOIN users u ON u.id = a.user_id WHERE u.username = $1",
    )
    .bind(&username)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(attempts, 0, "a failed submit must not record an attempt");
}

#[tokio::test]
async fn admin_routes_reject_students() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_and_login(&client, &address).await;

    let response = client
        .post(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "title": "Nope" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn test_exam_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let pool = test_pool().await;

    // 1. Admin authors a generated exam
    let admin = admin_token(&client, &address, &pool).await;

    let create_resp = client
        .post(format!("{}/api/admin/exams", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "title": unique_name("Math Exam"),
            "difficulty": "medium",
            "question_count": 3
        }))
        .send()
        .await
        .expect("Create exam failed");
    assert_eq!(create_resp.status().as_u16(), 201);

    let created: serde_json::Value = create_resp.json().await.unwrap();
    let exam_id = created["id"].as_i64().expect("exam id missing");
    assert_eq!(created["question_count"], 3);
    assert_eq!(created["difficulty"], "medium");

    // 2. Student fetches the exam; answers must be hidden
    let (_, token) = register_and_login(&client, &address).await;

    let exam_resp = client
        .get(format!("{}/api/exams/{}", address, exam_id))
        .send()
        .await
        .expect("Fetch exam failed");
    assert_eq!(exam_resp.status().as_u16(), 200);

    let exam: serde_json::Value = exam_resp.json().await.unwrap();
    let questions = exam["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        assert!(q.get("answer").is_none(), "answers must not be exposed");
        assert!(q["option_a"].is_string());
    }

    // 3. Pull the answer key straight from the database
    let key: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, answer FROM questions WHERE exam_id = $1")
            .bind(exam_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(key.len(), 3);

    // 4. Submit every answer correct, lowercased to exercise the
    //    case-insensitive match
    let mut answers = HashMap::new();
    for (id, letter) in &key {
        answers.insert(id.to_string(), letter.to_ascii_lowercase());
    }

    let submit_resp = client
        .post(format!("{}/api/exams/{}/submit", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(submit_resp.status().as_u16(), 201);

    let result: serde_json::Value = submit_resp.json().await.unwrap();
    assert_eq!(result["score"], 3);
    assert_eq!(result["total_questions"], 3);

    // 5. An empty resubmission is allowed and scores zero
    let resubmit_resp = client
        .post(format!("{}/api/exams/{}/submit", address, exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": {} }))
        .send()
        .await
        .expect("Resubmit failed");
    assert_eq!(resubmit_resp.status().as_u16(), 201);

    let result: serde_json::Value = resubmit_resp.json().await.unwrap();
    assert_eq!(result["score"], 0);

    // 6. History lists both attempts, newest first
    let history_resp = client
        .get(format!("{}/api/attempts", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("History failed");
    assert_eq!(history_resp.status().as_u16(), 200);

    let history: Vec<serde_json::Value> = history_resp.json().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["score"], 0, "newest attempt comes first");
    assert_eq!(history[1]["score"], 3);
    assert_eq!(history[0]["exam_id"], exam_id);
}
