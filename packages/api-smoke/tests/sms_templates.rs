use api_smoke::{submit_sms_templates, SmsGatewayConfig, SmsTemplate};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn template(name: &str) -> SmsTemplate {
    SmsTemplate {
        name: name.to_string(),
        body: format!("{name}: your appointment is confirmed"),
    }
}

#[tokio::test]
async fn rejected_template_does_not_stop_the_rest() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates"))
        .and(body_partial_json(json!({ "name": "broken" })))
        .respond_with(ResponseTemplate::new(422).set_body_string("body too long"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/templates"))
        .and(header("authorization", "Bearer sms-token"))
        .and(body_partial_json(json!({ "sender": "SALON" })))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let config = SmsGatewayConfig {
        api_url: format!("{}/templates", server.uri()),
        token: "sms-token".to_string(),
        sender: Some("SALON".to_string()),
    };
    let templates = vec![template("reminder"), template("broken"), template("cancelled")];

    let summary = submit_sms_templates(&config, &templates).await?;

    assert_eq!(summary.accepted, vec!["reminder", "cancelled"]);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].0, "broken");
    assert!(summary.rejected[0].1.contains("422"));
    assert!(!summary.all_accepted());
    Ok(())
}

#[test]
fn debug_output_masks_the_token() {
    let config = SmsGatewayConfig {
        api_url: "https://sms.example.test/templates".to_string(),
        token: "super-secret".to_string(),
        sender: None,
    };
    assert!(!format!("{config:?}").contains("super-secret"));
}
