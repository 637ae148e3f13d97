//! Thin REST client for the salon API's auth, salon, appointment and
//! messaging endpoints.

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::SmokeError;
use crate::DEFAULT_API_URL;

/// Response payload, pretty-printable either way.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportBody {
    Json(Value),
    Text(String),
}

impl fmt::Display for ReportBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportBody::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{value}"),
            },
            ReportBody::Text(text) => f.write_str(text),
        }
    }
}

/// Outcome of one smoke request.
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeReport {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub body: ReportBody,
}

impl SmokeReport {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `token` field of a JSON body (login responses).
    pub fn token(&self) -> Option<&str> {
        match &self.body {
            ReportBody::Json(value) => value.get("token").and_then(Value::as_str),
            ReportBody::Text(_) => None,
        }
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.is_success() { "✅" } else { "❌" };
        writeln!(f, "{mark} {} {} -> {}", self.method, self.path, self.status)?;
        write!(f, "{}", self.body)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SmokeError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SmokeError::config(format!(
                "API URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let inner = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner,
            base_url,
            token: None,
        })
    }

    /// `SALON_API_URL`, falling back to `http://localhost:3000`.
    pub fn from_env() -> Result<Self, SmokeError> {
        let base_url = env::var("SALON_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    /// Send `Authorization: Bearer <token>` on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn admin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SmokeReport, SmokeError> {
        let body = json!({ "username": username, "password": password });
        self.post_json("/api/auth/admin/login", &body).await
    }

    pub async fn employee_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SmokeReport, SmokeError> {
        let body = json!({ "username": username, "password": password });
        self.post_json("/api/auth/employee/login", &body).await
    }

    pub async fn salons(&self) -> Result<SmokeReport, SmokeError> {
        self.get("/api/salons").await
    }

    /// Appointments of one salon, or of every salon the caller may see.
    pub async fn appointments(&self, salon_id: Option<i64>) -> Result<SmokeReport, SmokeError> {
        match salon_id {
            Some(id) => self.get(&format!("/api/appointments/salon/{id}")).await,
            None => self.get("/api/appointments").await,
        }
    }

    pub async fn conversations(&self) -> Result<SmokeReport, SmokeError> {
        self.get("/api/messages/conversations").await
    }

    pub async fn get(&self, path: &str) -> Result<SmokeReport, SmokeError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<SmokeReport, SmokeError> {
        self.send(Method::POST, path, Some(body)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.inner.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<SmokeReport, SmokeError> {
        let mut builder = self.request(method.clone(), path);
        if let Some(b) = body {
            builder = builder.json(b);
        }

        debug!(smoke = "request", method = %method, path);
        let response = builder.send().await.map_err(|e| {
            warn!(smoke = "transport_failed", method = %method, path, error = %e);
            SmokeError::Transport(e)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => ReportBody::Json(value),
            Err(_) => ReportBody::Text(text),
        };

        info!(smoke = "response", method = %method, path, status);
        Ok(SmokeReport {
            method: method.to_string(),
            path: path.to_string(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_base_url_without_scheme() {
        assert!(matches!(
            ApiClient::new("localhost:3000"),
            Err(SmokeError::Config { .. })
        ));
    }

    #[test]
    fn trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn token_is_read_from_json_bodies_only() {
        let report = SmokeReport {
            method: "POST".into(),
            path: "/api/auth/admin/login".into(),
            status: 200,
            body: ReportBody::Json(json!({ "token": "abc", "admin": { "id": 1 } })),
        };
        assert_eq!(report.token(), Some("abc"));

        let text = SmokeReport {
            body: ReportBody::Text("token".into()),
            ..report
        };
        assert_eq!(text.token(), None);
    }

    #[test]
    fn display_marks_failures() {
        let report = SmokeReport {
            method: "GET".into(),
            path: "/api/salons".into(),
            status: 401,
            body: ReportBody::Text("unauthorized".into()),
        };
        let rendered = report.to_string();
        assert!(rendered.starts_with("❌ GET /api/salons -> 401"));
        assert!(rendered.ends_with("unauthorized"));
    }
}
