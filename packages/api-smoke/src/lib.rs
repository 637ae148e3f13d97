//! Manual smoke checks against the salon HTTP API and the SMS provider.
//!
//! Every call is a single request. The status and body are reported back to
//! the caller; only transport failures are errors.

pub mod client;
pub mod error;
pub mod sms;
pub mod swagger;

pub use client::{ApiClient, ReportBody, SmokeReport};
pub use error::SmokeError;
pub use sms::{submit_sms_templates, SmsGatewayConfig, SmsTemplate, TemplateSummary};
pub use swagger::{fetch_swagger, summarize_operations, SwaggerSummary};

/// Default base URL of the salon API when `SALON_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
