use api_smoke::{fetch_swagger, ApiClient, ReportBody, SmokeError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn admin_login_posts_credentials_and_exposes_token(
) -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/admin/login"))
        .and(body_json(json!({ "username": "superadmin", "password": "admin123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri())?;
    let report = client.admin_login("superadmin", "admin123").await?;

    assert!(report.is_success());
    assert_eq!(report.token(), Some("jwt-abc"));
    Ok(())
}

#[tokio::test]
async fn error_status_is_reported_not_raised() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/employee/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri())?;
    let report = client.employee_login("stylist", "wrong").await?;

    assert_eq!(report.status, 401);
    assert!(!report.is_success());
    assert_eq!(report.body, ReportBody::Text("invalid credentials".into()));
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_sent_on_authenticated_calls() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/salon/7"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages/conversations"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri())?.with_token("jwt-abc");
    let appointments = client.appointments(Some(7)).await?;
    assert_eq!(appointments.body, ReportBody::Json(json!([{ "id": 1 }])));
    assert!(client.conversations().await?.is_success());
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() -> Result<(), Box<dyn std::error::Error>> {
    // Nothing listens on port 1
    let client = ApiClient::new("http://127.0.0.1:1")?;
    let err = client.salons().await.unwrap_err();
    assert!(matches!(err, SmokeError::Transport(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn swagger_is_summarized() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openapi": "3.0.0",
            "paths": {
                "/api/salons": { "get": {} },
                "/api/appointments": { "get": {}, "post": {} }
            }
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri())?;
    let summary = fetch_swagger(&client, "/api-docs").await?;
    assert_eq!(
        summary.operations,
        vec!["GET /api/appointments", "POST /api/appointments", "GET /api/salons"]
    );

    let missing = fetch_swagger(&client, "/swagger.json").await?;
    assert_eq!(missing.status, 404);
    assert!(missing.operations.is_empty());
    Ok(())
}
