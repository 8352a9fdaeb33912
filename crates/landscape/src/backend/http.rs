//! Blocking HTTP backend for a Landscape server.
//!
//! Logs in once at construction and sends the bearer token on every call.
//! Status codes are classified here and nowhere else.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{ApiResponse, CallContext, Credentials, LEGACY_API_VERSION, LegacyAction, Params};

/// HTTP backend for the Landscape API.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use landscape::backend::http::HttpBackend;
/// use landscape::backend::Backend;
/// use landscape::{CallContext, Credentials};
///
/// let creds = Credentials::AccessKey {
///     access_key: "AK".into(),
///     secret_key: "SK".into(),
/// };
/// let backend = HttpBackend::connect("https://landscape.example.com/api/v2", &creds, Duration::from_secs(30))
///     .unwrap();
/// let script = backend.get_script(&CallContext::background(), 42).unwrap();
/// println!("{script:?}");
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL without a trailing slash.
    api_base: String,
    /// Bearer token obtained at login.
    token: String,
    /// Per-request timeout.
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpBackend {
    /// Validate the URL, build the agent and log in.
    pub fn connect(api_url: &str, credentials: &Credentials, timeout: Duration) -> Result<Self> {
        let api_base = normalize_api_url(api_url)?;
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(config);

        let (path, body) = match credentials {
            Credentials::EmailPassword {
                email,
                password,
                account,
            } => {
                let mut body = json!({ "email": email, "password": password });
                if let Some(account) = account {
                    body["account"] = json!(account);
                }
                ("login", body)
            }
            Credentials::AccessKey {
                access_key,
                secret_key,
            } => (
                "login/access-key",
                json!({ "access_key": access_key, "secret_key": secret_key }),
            ),
        };

        let url = format!("{api_base}/{path}");
        log::debug!("logging in to {api_base} with {}", credentials.kind());
        let mut response = agent.post(&url).send_json(&body)?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;

        if !(200..300).contains(&status) {
            let detail = error_message(&text).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(Error::Authentication(detail));
        }

        let login: LoginResponse = serde_json::from_str(&text)?;
        Ok(Self {
            agent,
            api_base,
            token: login.token,
            timeout,
        })
    }

    /// Get the API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn script_url(&self, id: i64) -> String {
        format!("{}/scripts/{}", self.api_base, id)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn get_json(&self, ctx: &CallContext, url: &str, query: &[(&str, &str)]) -> Result<ApiResponse<Value>> {
        let operation = format!("GET {url}");
        ctx.check(&operation)?;
        log::debug!("{operation}");

        let mut response = self
            .agent
            .get(url)
            .header("Authorization", &self.bearer())
            .header("Accept", "application/json")
            .query_pairs(query.iter().copied())
            .config()
            .timeout_global(Some(request_timeout(self.timeout, ctx.remaining())))
            .build()
            .call()?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        parse_json(classify(status, text))
    }
}

impl Backend for HttpBackend {
    fn get_script(&self, ctx: &CallContext, id: i64) -> Result<ApiResponse<Value>> {
        self.get_json(ctx, &self.script_url(id), &[])
    }

    fn invoke_legacy_action(
        &self,
        ctx: &CallContext,
        action: LegacyAction,
        params: &Params,
    ) -> Result<ApiResponse<Value>> {
        let mut query = vec![("action", action.name()), ("version", LEGACY_API_VERSION)];
        query.extend(params.iter());
        let url = format!("{}/", self.api_base);
        self.get_json(ctx, &url, &query)
    }

    fn get_script_attachment(
        &self,
        ctx: &CallContext,
        script_id: i64,
        attachment_id: i64,
    ) -> Result<ApiResponse<String>> {
        let url = format!("{}/script-attachments/{}", self.script_url(script_id), attachment_id);
        let operation = format!("GET {url}");
        ctx.check(&operation)?;
        log::debug!("{operation}");

        let mut response = self
            .agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .config()
            .timeout_global(Some(request_timeout(self.timeout, ctx.remaining())))
            .build()
            .call()?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        Ok(classify(status, text))
    }

    fn archive_script(&self, ctx: &CallContext, id: i64) -> Result<ApiResponse<Value>> {
        let url = format!("{}:archive", self.script_url(id));
        let operation = format!("POST {url}");
        ctx.check(&operation)?;
        log::debug!("{operation}");

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .header("Accept", "application/json")
            .config()
            .timeout_global(Some(request_timeout(self.timeout, ctx.remaining())))
            .build()
            .send_empty()?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        parse_json(classify(status, text))
    }
}

/// Per-request timeout: the configured one, cut short by the deadline.
fn request_timeout(configured: Duration, remaining: Option<Duration>) -> Duration {
    remaining.map_or(configured, |left| left.min(configured))
}

/// Check the scheme and strip trailing slashes.
fn normalize_api_url(api_url: &str) -> Result<String> {
    let trimmed = api_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl {
            url: api_url.to_string(),
            reason: "URL is empty".to_string(),
        });
    }
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(Error::InvalidUrl {
            url: api_url.to_string(),
            reason: "expected an http:// or https:// URL".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Map a status code and raw body onto the documented response arms.
fn classify(status: u16, body: String) -> ApiResponse<String> {
    match status {
        200..=299 => ApiResponse::Ok(body),
        400 => ApiResponse::BadRequest {
            message: error_message(&body),
        },
        404 => ApiResponse::NotFound {
            message: error_message(&body),
        },
        _ => ApiResponse::Unexpected { status, body },
    }
}

fn parse_json(response: ApiResponse<String>) -> Result<ApiResponse<Value>> {
    match response {
        ApiResponse::Ok(text) if text.trim().is_empty() => Ok(ApiResponse::Ok(Value::Null)),
        ApiResponse::Ok(text) => Ok(ApiResponse::Ok(serde_json::from_str(&text)?)),
        other => Ok(other.map(|_| Value::Null)),
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_api_url() {
        assert_eq!(
            normalize_api_url("https://landscape.example.com/api/v2/").unwrap(),
            "https://landscape.example.com/api/v2"
        );
        assert!(matches!(
            normalize_api_url("   "),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            normalize_api_url("landscape.example.com"),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_request_timeout_never_exceeds_configured() {
        let configured = Duration::from_secs(30);
        assert_eq!(request_timeout(configured, None), configured);
        assert_eq!(request_timeout(configured, Some(Duration::from_secs(120))), configured);
        assert_eq!(
            request_timeout(configured, Some(Duration::from_secs(4))),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn test_classify_statuses() {
        assert_eq!(classify(200, "ok".into()), ApiResponse::Ok("ok".to_string()));
        assert_eq!(classify(204, String::new()), ApiResponse::Ok(String::new()));
        assert_eq!(
            classify(400, r#"{"message": "title is required"}"#.into()),
            ApiResponse::BadRequest {
                message: Some("title is required".into())
            }
        );
        assert_eq!(
            classify(404, "not json".into()),
            ApiResponse::NotFound { message: None }
        );
        assert_eq!(
            classify(500, "boom".into()),
            ApiResponse::Unexpected {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[test]
    fn test_parse_json_bodies() {
        let parsed = parse_json(ApiResponse::Ok(r#"{"id": 3}"#.into())).unwrap();
        assert_eq!(parsed, ApiResponse::Ok(json!({"id": 3})));

        let empty = parse_json(ApiResponse::Ok("  ".into())).unwrap();
        assert_eq!(empty, ApiResponse::Ok(Value::Null));

        let broken = parse_json(ApiResponse::Ok("{".into()));
        assert!(matches!(broken, Err(Error::InvalidResponse(_))));

        let missing = parse_json(ApiResponse::NotFound { message: None }).unwrap();
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_error_message_ignores_empty() {
        assert_eq!(error_message(r#"{"message": ""}"#), None);
        assert_eq!(error_message(r#"{"error": "x"}"#), None);
        assert_eq!(error_message(r#"{"message": "nope"}"#), Some("nope".into()));
    }

    #[test]
    fn test_connect_rejects_bad_url_before_network() {
        let creds = Credentials::AccessKey {
            access_key: "a".into(),
            secret_key: "b".into(),
        };
        let result = HttpBackend::connect("ftp://nowhere", &creds, Duration::from_secs(1));
        assert!(matches!(result, Err(Error::InvalidUrl { .. })));
    }
}
