mod common;

use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Bootstrap & email auth ──────────────────────────────────────

#[tokio::test]
async fn register_bootstrap_super_admin() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("admin@test.com", "password123", "Admin").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert_eq!(body["role"], "super_admin");

    let token = body["access_token"].as_str().unwrap();
    let (me, status) = app.get_auth("/api/v1/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_admin"], true);
    assert!(me["client"].is_null());

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_closed_after_bootstrap() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.register("other@test.com", "password123", "Other").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("disabled"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (_, status) = app.login(common::ADMIN_EMAIL, "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (body, status) = app.login(common::ADMIN_EMAIL, common::ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refresh_token"].is_string());

    common::cleanup(app).await;
}

#[tokio::test]
async fn api_requires_authentication() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/clients"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Account requests ────────────────────────────────────────────

#[tokio::test]
async fn signup_creates_pending_request_with_six_digit_matricula() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .submit_request("Maria Silva", "maria@test.com", "123.456.789-01")
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "pending");
    let matricula = body["matricula"].as_str().unwrap();
    assert_eq!(matricula.len(), 6);
    assert!(matricula.chars().all(|c| c.is_ascii_digit()));

    common::cleanup(app).await;
}

#[tokio::test]
async fn signup_rejects_duplicate_email_and_cpf() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .submit_request("Maria Silva", "maria@test.com", "12345678901")
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (body, status) = app
        .submit_request("Outra Maria", "MARIA@test.com", "99999999999")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("e-mail"));

    let (body, status) = app
        .submit_request("Outra Pessoa", "outra@test.com", "123.456.789-01")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("CPF"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn signup_validates_cpf_and_phone() {
    let app = common::spawn_app().await;

    let (_, status) = app.submit_request("Maria", "maria@test.com", "1234").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .post_json(
            "/api/v1/account-requests",
            &json!({
                "full_name": "Maria",
                "email": "maria@test.com",
                "cpf": "12345678901",
                "phone": "123",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn approve_creates_client_and_enables_matricula_login() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (req, _) = app
        .submit_request("Maria Silva", "maria@test.com", "12345678901")
        .await;
    let id = req["id"].as_str().unwrap();
    let matricula = req["matricula"].as_str().unwrap();

    let (list, status) = app.get_auth("/api/v1/account-requests", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pending_count"], 1);

    let (body, status) = app
        .post_auth(&format!("/api/v1/account-requests/{id}/approve"), &admin, &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["client"]["matricula"], matricula);
    assert_eq!(body["client"]["status"], "active");

    // Second approval is a conflict
    let (_, status) = app
        .post_auth(&format!("/api/v1/account-requests/{id}/approve"), &admin, &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Wrong password, then the CPF as initial password
    let (_, status) = app.matricula_login("client", matricula, "wrongpass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (body, status) = app.matricula_login("client", matricula, "12345678901").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "client");
    assert_eq!(body["email"], "maria@test.com");

    let token = body["access_token"].as_str().unwrap();
    let (me, _) = app.get_auth("/api/v1/auth/me", token).await;
    assert_eq!(me["client"]["matricula"], matricula);
    assert_eq!(me["is_admin"], false);

    let (logs, status) = app.get_auth("/api/v1/system-logs", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        logs.as_array()
            .unwrap()
            .iter()
            .any(|l| l["action"] == "Cliente Maria Silva aprovado")
    );

    common::cleanup(app).await;
}

#[tokio::test]
async fn reject_records_reason_visible_in_lookup() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (req, _) = app
        .submit_request("João Souza", "joao@test.com", "11122233344")
        .await;
    let id = req["id"].as_str().unwrap();
    let matricula = req["matricula"].as_str().unwrap();

    let (lookup, status) = app
        .get_auth(&format!("/api/v1/matricula/{matricula}"), "")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lookup["status"], "pending");

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/account-requests/{id}/reject"),
            &admin,
            &json!({ "reason": "Documentação incompleta" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "rejected");

    let resp = app
        .client
        .get(app.url(&format!("/api/v1/matricula/{matricula}?loginType=client")))
        .send()
        .await
        .unwrap();
    let lookup: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(lookup["status"], "rejected");
    assert_eq!(lookup["rejection_reason"], "Documentação incompleta");

    // Rejected matricula cannot sign in
    let (_, status) = app.matricula_login("client", matricula, "11122233344").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn matricula_lookup_unknown_and_malformed() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/matricula/000001"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "not_found");

    let resp = app
        .client
        .get(app.url("/api/v1/matricula/12ab"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

// ── Role gating ─────────────────────────────────────────────────

#[tokio::test]
async fn client_cannot_use_admin_endpoints() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (client, _, _) = app
        .approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;

    let (_, status) = app.get_auth("/api/v1/account-requests", &client).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, status) = app.get_auth("/api/v1/clients", &client).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, status) = app.get_auth("/api/v1/system-logs", &client).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, status) = app.get_auth("/api/v1/reports/overview", &client).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (profile, status) = app.get_auth("/api/v1/profile", &client).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "maria@test.com");

    common::cleanup(app).await;
}

#[tokio::test]
async fn deactivated_client_is_refused_at_login() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (req, _) = app
        .submit_request("Maria", "maria@test.com", "12345678901")
        .await;
    let id = req["id"].as_str().unwrap();
    let matricula = req["matricula"].as_str().unwrap();
    let (approved, _) = app
        .post_auth(&format!("/api/v1/account-requests/{id}/approve"), &admin, &json!({}))
        .await;
    let client_id = approved["client"]["id"].as_str().unwrap();

    let (body, status) = app
        .delete_auth(&format!("/api/v1/clients/{client_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_active"], false);

    let (body, status) = app.matricula_login("client", matricula, "12345678901").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Client inactive");

    common::cleanup(app).await;
}

// ── provision-user ──────────────────────────────────────────────

#[tokio::test]
async fn provision_user_is_idempotent() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (req, _) = app
        .submit_request("Maria", " maria@test.com ", "12345678901")
        .await;
    let id = req["id"].as_str().unwrap();
    let matricula = req["matricula"].as_str().unwrap();
    app.post_auth(&format!("/api/v1/account-requests/{id}/approve"), &admin, &json!({}))
        .await;

    for _ in 0..2 {
        let resp = app
            .client
            .post(app.url("/functions/v1/provision-user"))
            .json(&json!({ "loginType": "client", "matricula": matricula }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "ok": true, "email": "maria@test.com" }));
    }

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'maria@test.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(users, 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn provision_user_for_admin_matricula() {
    let app = common::spawn_app().await;
    let root = app.bootstrap().await;

    let (admin, status) = app
        .post_auth(
            "/api/v1/admins",
            &root,
            &json!({ "full_name": "Carlos Admin", "email": "carlos@test.com", "cpf": "55566677788" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{admin}");
    let matricula = admin["matricula"].as_str().unwrap();
    assert_eq!(matricula.len(), 7);

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "admin", "matricula": matricula }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["email"], "carlos@test.com");

    let (body, status) = app.matricula_login("admin", matricula, "55566677788").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "admin");

    common::cleanup(app).await;
}

#[tokio::test]
async fn provision_user_error_cases() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "manager", "matricula": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid loginType");

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "client", "matricula": "12345" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid matricula");

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "client", "matricula": "654321" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Client not found");

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": 5, "matricula": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid loginType");

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "matricula": "123456" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid loginType");

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "client", "matricula": 123456 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid matricula");

    let resp = app
        .client
        .post(app.url("/functions/v1/provision-user"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");

    common::cleanup(app).await;
}

#[tokio::test]
async fn provision_user_refuses_inactive_records() {
    let app = common::spawn_app().await;
    let root = app.bootstrap().await;

    let (req, _) = app
        .submit_request("Maria", "maria@test.com", "12345678901")
        .await;
    let id = req["id"].as_str().unwrap();
    let client_matricula = req["matricula"].as_str().unwrap();
    let (approved, _) = app
        .post_auth(&format!("/api/v1/account-requests/{id}/approve"), &root, &json!({}))
        .await;
    let client_id = approved["client"]["id"].as_str().unwrap();
    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{client_id}"), &root)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (admin, _) = app
        .post_auth(
            "/api/v1/admins",
            &root,
            &json!({ "full_name": "Carlos Admin", "email": "carlos@test.com", "cpf": "55566677788" }),
        )
        .await;
    let admin_id = admin["id"].as_str().unwrap();
    let admin_matricula = admin["matricula"].as_str().unwrap();
    let (_, status) = app
        .put_auth(&format!("/api/v1/admins/{admin_id}"), &root, &json!({ "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "client", "matricula": client_matricula }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Client inactive");

    let (body, status) = app
        .post_json(
            "/functions/v1/provision-user",
            &json!({ "loginType": "admin", "matricula": admin_matricula }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin inactive");

    common::cleanup(app).await;
}

#[tokio::test]
async fn deactivated_admin_loses_every_route_in() {
    let app = common::spawn_app().await;
    let root = app.bootstrap().await;

    let (admin, _) = app
        .post_auth(
            "/api/v1/admins",
            &root,
            &json!({ "full_name": "Carlos Admin", "email": "carlos@test.com", "cpf": "55566677788" }),
        )
        .await;
    let admin_id = admin["id"].as_str().unwrap();
    let matricula = admin["matricula"].as_str().unwrap();

    let (body, status) = app.matricula_login("admin", matricula, "55566677788").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["access_token"].as_str().unwrap().to_string();
    let (_, status) = app.get_auth("/api/v1/account-requests", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .put_auth(&format!("/api/v1/admins/{admin_id}"), &root, &json!({ "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Still-valid access token no longer authorizes anything
    let (body, status) = app.get_auth("/api/v1/account-requests", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account inactive");

    // Email/password sign-in with the CPF password is refused too
    let (body, status) = app.login("carlos@test.com", "55566677788").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account inactive");

    let (_, status) = app.matricula_login("admin", matricula, "55566677788").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Reactivation restores access
    app.put_auth(&format!("/api/v1/admins/{admin_id}"), &root, &json!({ "is_active": true }))
        .await;
    let (_, status) = app.login("carlos@test.com", "55566677788").await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn deactivated_client_token_and_email_login_are_refused() {
    let app = common::spawn_app().await;
    let root = app.bootstrap().await;
    let (token, matricula, _) = app
        .approved_client(&root, "Maria", "maria@test.com", "12345678901")
        .await;

    let (profile, _) = app.get_auth("/api/v1/profile", &token).await;
    let client_id = profile["id"].as_str().unwrap();
    app.delete_auth(&format!("/api/v1/clients/{client_id}"), &root)
        .await;

    let (_, status) = app.get_auth("/api/v1/profile", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, status) = app.login("maria@test.com", "12345678901").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (body, status) = app.matricula_login("client", &matricula, "12345678901").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Client inactive");

    common::cleanup(app).await;
}

#[tokio::test]
async fn function_preflight_allows_any_origin() {
    let app = common::spawn_app().await;

    for endpoint in ["isa-chat", "provision-user"] {
        let resp = app
            .client
            .request(
                reqwest::Method::OPTIONS,
                app.url(&format!("/functions/v1/{endpoint}")),
            )
            .header("origin", "https://example.org")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
        assert!(
            resp.headers()
                .get("access-control-allow-headers")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("apikey")
        );
        assert_eq!(resp.text().await.unwrap(), "ok");
    }

    common::cleanup(app).await;
}

// ── isa-chat ────────────────────────────────────────────────────

#[tokio::test]
async fn isa_chat_relays_llm_reply() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-groq-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Olá! Sou a ISA." } }]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let app = common::spawn_app_with_llm(Some(llm.uri())).await;

    let (body, status) = app
        .post_json(
            "/functions/v1/isa-chat",
            &json!({ "messages": [{ "role": "user", "content": "Oi" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "message": "Olá! Sou a ISA." }));

    let requests = llm.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][1]["content"], "Oi");
    assert_eq!(sent["max_tokens"], 1024);

    common::cleanup(app).await;
}

#[tokio::test]
async fn isa_chat_reports_upstream_status() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&llm)
        .await;

    let app = common::spawn_app_with_llm(Some(llm.uri())).await;

    let (body, status) = app
        .post_json(
            "/functions/v1/isa-chat",
            &json!({ "messages": [{ "role": "user", "content": "Oi" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Groq API error: 503");

    common::cleanup(app).await;
}

#[tokio::test]
async fn isa_chat_without_key_or_body() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .post_json(
            "/functions/v1/isa-chat",
            &json!({ "messages": [{ "role": "user", "content": "Oi" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GROQ_API_KEY is not configured");

    let (_, status) = app
        .post_json("/functions/v1/isa-chat", &json!({ "text": "Oi" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

// ── AI config ───────────────────────────────────────────────────

#[tokio::test]
async fn ai_config_is_created_with_defaults_on_first_read() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (client, _, user_id) = app
        .approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;

    let (body, status) = app.get_auth("/api/v1/ai-config", &client).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["ai_name"], "Assistente IA");
    assert_eq!(body["formality_level"], 5);
    assert_eq!(body["memory_status"]["percentage"], 0);

    let (_, status) = app
        .put_auth("/api/v1/ai-config", &client, &json!({ "formality_level": 11 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (body, status) = app
        .put_auth(
            "/api/v1/ai-config",
            &client,
            &json!({
                "ai_name": "Bia",
                "welcome_message": "Bem-vindo à Loja!",
                "tone": "formal",
                "formality_level": 8,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["ai_name"], "Bia");
    assert_eq!(body["tone"], "formal");

    let (body, status) = app
        .get_auth(&format!("/api/v1/ai-config/{user_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ai_name"], "Bia");

    let (body, status) = app
        .post_auth("/api/v1/ai-config/preview", &client, &json!({ "message": "Oi" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.contains("Bem-vindo à Loja!"));
    assert!(reply.contains("8/10"));

    common::cleanup(app).await;
}

// ── WhatsApp ────────────────────────────────────────────────────

#[tokio::test]
async fn whatsapp_instance_lifecycle() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (client, _, _) = app
        .approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;

    let (inst, status) = app
        .post_auth(
            "/api/v1/whatsapp/instances",
            &client,
            &json!({ "instance_name": "Loja", "phone_number": "(11) 98765-4321" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{inst}");
    assert_eq!(inst["status"], "disconnected");
    assert_eq!(inst["phone_number"], "11987654321");
    assert_eq!(inst["has_session"], false);
    assert!(inst.get("session_data_enc").is_none());
    let id = inst["id"].as_str().unwrap();

    let (_, status) = app
        .post_auth(
            "/api/v1/whatsapp/instances",
            &client,
            &json!({ "instance_name": "Segunda" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/whatsapp/instances/{id}/session"),
            &client,
            &json!({ "session_data": { "creds": "secret" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["has_session"], true);

    let (body, status) = app
        .get_auth(&format!("/api/v1/whatsapp/instances/{id}/session"), &client)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["session_data"], json!({ "creds": "secret" }));

    let (other, _, _) = app
        .approved_client(&admin, "João", "joao@test.com", "98765432100")
        .await;
    let (_, status) = app
        .get_auth(&format!("/api/v1/whatsapp/instances/{id}/session"), &other)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (body, _) = app
        .put_auth(
            &format!("/api/v1/whatsapp/instances/{id}"),
            &client,
            &json!({ "status": "connected", "is_ai_active": true }),
        )
        .await;
    assert_eq!(body["status"], "connected");
    assert!(body["last_connected_at"].is_string());

    let (report, status) = app.get_auth("/api/v1/reports/me", &client).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["instance_status"], "connected");
    assert_eq!(report["is_ai_active"], true);

    let (body, _) = app
        .delete_auth(&format!("/api/v1/whatsapp/instances/{id}/session"), &client)
        .await;
    assert_eq!(body["has_session"], false);
    let (_, status) = app
        .get_auth(&format!("/api/v1/whatsapp/instances/{id}/session"), &client)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn whatsapp_inbound_message_creates_contact_and_unread() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (client, _, _) = app
        .approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;

    let (inst, _) = app
        .post_auth("/api/v1/whatsapp/instances", &client, &json!({ "instance_name": "Loja" }))
        .await;
    let id = inst["id"].as_str().unwrap();

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/whatsapp/instances/{id}/inbound"),
            &client,
            &json!({ "phone_number": "5511912345678", "name": "Ana", "content": "Olá" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (contacts, _) = app
        .get_auth(&format!("/api/v1/whatsapp/instances/{id}/contacts"), &client)
        .await;
    let contact = &contacts.as_array().unwrap()[0];
    assert_eq!(contact["name"], "Ana");
    assert_eq!(contact["unread_count"], 1);
    let contact_id = contact["id"].as_str().unwrap();

    let (msg, status) = app
        .post_auth(
            &format!("/api/v1/whatsapp/instances/{id}/contacts/{contact_id}/messages"),
            &client,
            &json!({ "content": "Bom dia!" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(msg["is_from_me"], true);

    let (messages, _) = app
        .get_auth(
            &format!("/api/v1/whatsapp/instances/{id}/contacts/{contact_id}/messages"),
            &client,
        )
        .await;
    let contents: Vec<_> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, vec!["Olá", "Bom dia!"]);

    let (contact, _) = app
        .post_auth(
            &format!("/api/v1/whatsapp/instances/{id}/contacts/{contact_id}/read"),
            &client,
            &json!({}),
        )
        .await;
    assert_eq!(contact["unread_count"], 0);

    common::cleanup(app).await;
}

// ── Tickets ─────────────────────────────────────────────────────

#[tokio::test]
async fn tickets_are_private_to_their_owner() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (maria, _, _) = app
        .approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;
    let (joao, _, joao_id) = app
        .approved_client(&admin, "João", "joao@test.com", "98765432100")
        .await;

    let (thread, status) = app
        .post_auth(
            "/api/v1/tickets",
            &maria,
            &json!({ "subject": "IA não responde", "message": "Minha IA parou." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{thread}");
    assert_eq!(thread["ticket"]["status"], "open");
    let id = thread["ticket"]["id"].as_str().unwrap();

    let (_, status) = app.get_auth(&format!("/api/v1/tickets/{id}"), &joao).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (list, _) = app.get_auth("/api/v1/tickets", &joao).await;
    assert!(list.as_array().unwrap().is_empty());

    let (list, _) = app.get_auth("/api/v1/tickets", &admin).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Assignee must be an existing admin
    for assignee in [joao_id.clone(), uuid::Uuid::now_v7().to_string()] {
        let (body, status) = app
            .put_auth(
                &format!("/api/v1/tickets/{id}"),
                &admin,
                &json!({ "assigned_admin_id": assignee }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }

    // Admin closes; the thread gets a system note and further replies are refused
    let (thread, status) = app
        .put_auth(&format!("/api/v1/tickets/{id}"), &admin, &json!({ "status": "closed" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{thread}");
    let last = thread["messages"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["is_system_message"], true);
    assert!(last["content"].as_str().unwrap().starts_with("Status alterado para:"));

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/tickets/{id}/messages"),
            &maria,
            &json!({ "content": "Ainda com problema" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

// ── Announcements ───────────────────────────────────────────────

#[tokio::test]
async fn announcements_respect_targets_and_read_state() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let (maria, _, maria_id) = app
        .approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;
    let (joao, _, _) = app
        .approved_client(&admin, "João", "joao@test.com", "98765432100")
        .await;

    let (broadcast, status) = app
        .post_auth(
            "/api/v1/announcements",
            &admin,
            &json!({ "title": "Manutenção", "content": "Domingo às 2h" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{broadcast}");
    assert!(broadcast["sent_at"].is_string());

    let (_, status) = app
        .post_auth(
            "/api/v1/announcements",
            &admin,
            &json!({
                "title": "Só para Maria",
                "content": "Olá",
                "target_all": false,
                "target_users": [maria_id],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, status) = app
        .post_auth(
            "/api/v1/announcements",
            &admin,
            &json!({ "title": "Ninguém", "content": "x", "target_all": false }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (mine, _) = app.get_auth("/api/v1/announcements", &maria).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
    let (theirs, _) = app.get_auth("/api/v1/announcements", &joao).await;
    assert_eq!(theirs.as_array().unwrap().len(), 1);

    let broadcast_id = broadcast["id"].as_str().unwrap();
    let resp = app
        .client
        .post(app.url(&format!("/api/v1/announcements/{broadcast_id}/read")))
        .bearer_auth(&joao)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (theirs, _) = app.get_auth("/api/v1/announcements", &joao).await;
    assert_eq!(theirs[0]["read"], true);

    common::cleanup(app).await;
}

#[tokio::test]
async fn scheduled_announcement_waits_for_publication() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/announcements",
            &admin,
            &json!({
                "title": "Futuro",
                "content": "Em breve",
                "scheduled_at": "2099-01-01T00:00:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["sent_at"].is_null());

    let (mine, _) = app.get_auth("/api/v1/announcements", &admin).await;
    assert!(mine.as_array().unwrap().is_empty());

    common::cleanup(app).await;
}

// ── Reports ─────────────────────────────────────────────────────

#[tokio::test]
async fn overview_counts_clients_and_requests() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    app.approved_client(&admin, "Maria", "maria@test.com", "12345678901")
        .await;
    app.submit_request("João", "joao@test.com", "98765432100")
        .await;

    let (body, status) = app.get_auth("/api/v1/reports/overview", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_clients"], 1);
    assert_eq!(body["active_clients"], 1);
    assert_eq!(body["pending_requests"], 1);

    common::cleanup(app).await;
}
