use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use isa_panel::config::{Config, LlmConfig};

pub const ADMIN_EMAIL: &str = "admin@test.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn read(resp: reqwest::Response) -> (Value, StatusCode) {
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register the bootstrap user (first user = super admin).
    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "full_name": name }))
            .send()
            .await
            .expect("register request failed");
        Self::read(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        Self::read(resp).await
    }

    pub async fn matricula_login(
        &self,
        login_type: &str,
        matricula: &str,
        password: &str,
    ) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/matricula-login"))
            .json(&json!({ "loginType": login_type, "matricula": matricula, "password": password }))
            .send()
            .await
            .expect("matricula login request failed");
        Self::read(resp).await
    }

    /// Register the super admin, return its access token.
    pub async fn bootstrap(&self) -> String {
        let (body, status) = self.register(ADMIN_EMAIL, ADMIN_PASSWORD, "Admin").await;
        assert_eq!(status, StatusCode::OK, "bootstrap register failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Anonymous signup. Returns (body, status).
    pub async fn submit_request(&self, name: &str, email: &str, cpf: &str) -> (Value, StatusCode) {
        self.post_json(
            "/api/v1/account-requests",
            &json!({
                "full_name": name,
                "email": email,
                "cpf": cpf,
                "phone": "11987654321",
                "company_name": "Loja Teste",
                "segmento": "Varejo",
            }),
        )
        .await
    }

    /// Signup + approval + first matricula login. Returns (client token, matricula, user_id).
    pub async fn approved_client(
        &self,
        admin_token: &str,
        name: &str,
        email: &str,
        cpf: &str,
    ) -> (String, String, String) {
        let (req, status) = self.submit_request(name, email, cpf).await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {req}");
        let id = req["id"].as_str().unwrap();
        let matricula = req["matricula"].as_str().unwrap().to_string();

        let (body, status) = self
            .post_auth(&format!("/api/v1/account-requests/{id}/approve"), admin_token, &json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "approve failed: {body}");

        let (body, status) = self.matricula_login("client", &matricula, cpf).await;
        assert_eq!(status, StatusCode::OK, "client login failed: {body}");
        (
            body["access_token"].as_str().unwrap().to_string(),
            matricula,
            body["user_id"].as_str().unwrap().to_string(),
        )
    }

    /// Unauthenticated POST with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        Self::read(resp).await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        Self::read(resp).await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        Self::read(resp).await
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        Self::read(resp).await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        Self::read(resp).await
    }
}

fn database_url(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh database and no LLM key configured.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_llm(None).await
}

/// Spawn a test app whose chat client talks to `llm_base_url` (usually a wiremock server).
pub async fn spawn_app_with_llm(llm_base_url: Option<String>) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let db_name = format!("isa_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let llm = match llm_base_url {
        Some(url) => LlmConfig {
            api_key: Some("test-groq-key".to_string()),
            base_url: url,
            model: "llama-3.3-70b-versatile".to_string(),
        },
        None => LlmConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
        },
    };

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        encryption_key: "test-encryption-key-32-chars-ok!".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:0".to_string(),
        trusted_proxies: vec![],
        cors_origins: vec![],
        log_level: "warn".to_string(),
        smtp: None,
        llm,
        chat_rate_limit: 100,
        scheduler_interval_secs: 60,
    };

    let (app, _state) = isa_panel::build_app(pool.clone(), config).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
