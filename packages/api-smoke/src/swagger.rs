//! Swagger/OpenAPI document summary: the `METHOD path` list of operations.

use serde_json::Value;

use crate::client::{ApiClient, ReportBody};
use crate::error::SmokeError;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwaggerSummary {
    pub status: u16,
    /// Sorted `METHOD path` entries; empty when the fetch did not succeed.
    pub operations: Vec<String>,
}

/// Every operation under `paths`, as `"GET /api/salons"`, sorted by path then method.
pub fn summarize_operations(doc: &Value) -> Result<Vec<String>, SmokeError> {
    let paths = doc
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| SmokeError::decode("document has no 'paths' object"))?;

    let mut ops: Vec<(String, String)> = paths
        .iter()
        .filter_map(|(path, item)| item.as_object().map(|methods| (path, methods)))
        .flat_map(|(path, methods)| {
            methods
                .keys()
                .filter(|m| HTTP_METHODS.contains(&m.as_str()))
                .map(move |m| (path.clone(), m.to_ascii_uppercase()))
        })
        .collect();
    ops.sort();

    Ok(ops
        .into_iter()
        .map(|(path, method)| format!("{method} {path}"))
        .collect())
}

/// Fetch the document at `path` and summarize it.
///
/// A non-2xx status is returned in the summary with no operations.
pub async fn fetch_swagger(client: &ApiClient, path: &str) -> Result<SwaggerSummary, SmokeError> {
    let report = client.get(path).await?;
    if !report.is_success() {
        return Ok(SwaggerSummary {
            status: report.status,
            operations: Vec::new(),
        });
    }

    match &report.body {
        ReportBody::Json(doc) => Ok(SwaggerSummary {
            status: report.status,
            operations: summarize_operations(doc)?,
        }),
        ReportBody::Text(_) => Err(SmokeError::decode(format!("{path} did not return JSON"))),
    }
}
