//! `http` step: make an HTTP request.
//!
//! Params: `url` (required), `method` (default GET), `headers`, `body`,
//! `timeout` (seconds, default 30), `fail_on_status` (default true).
//! Output: `{status, headers, body}`; a JSON response body is parsed.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{require_params, resolve_params};
use crate::error::Result;
use crate::steps::{ExecutionContext, Step, StepHandler};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct HttpParams {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default = "default_true")]
    fail_on_status: bool,
}

struct HttpStep {
    params: Value,
}

#[async_trait]
impl StepHandler for HttpStep {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let params: HttpParams = resolve_params(&self.params, &input, ctx)?;

        let method = Method::from_bytes(params.method.to_uppercase().as_bytes())
            .with_context(|| format!("Invalid HTTP method '{}'", params.method))?;
        let client = Client::builder()
            .user_agent(concat!("stepwise/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(params.timeout))
            .build()?;

        let mut request = client.request(method.clone(), &params.url);
        for (name, value) in &params.headers {
            request = request.header(name, value);
        }
        request = match params.body {
            Some(Value::String(text)) => request.body(text),
            Some(body) => request.json(&body),
            None => request,
        };

        debug!(method = %method, url = %params.url, "Sending HTTP request");
        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, params.url))?;

        let status = response.status();
        let headers: Map<String, Value> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
            })
            .collect();
        let is_json = headers
            .get("content-type")
            .and_then(Value::as_str)
            .is_some_and(|ct| ct.contains("json"));
        let text = response.text().await?;

        if params.fail_on_status && !status.is_success() {
            bail!("HTTP {} from {} {}", status, method, params.url);
        }

        let body = if is_json {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };

        Ok(json!({
            "status": status.as_u16(),
            "headers": headers,
            "body": body,
        }))
    }
}

pub(crate) fn build(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "http", params, &["url"])?;
    Ok(Step::new(
        name,
        HttpStep {
            params: params.clone(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn get_parses_json_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/status");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"healthy": true}"#);
            })
            .await;

        let step = build("health", &json!({"url": server.url("/status")})).unwrap();
        let result = step.execute(Value::Null, &ExecutionContext::new()).await;

        mock.assert_async().await;
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["status"], json!(200));
        assert_eq!(data["body"], json!({"healthy": true}));
    }

    #[tokio::test]
    async fn post_sends_interpolated_json_body_and_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/deploy")
                    .header("x-token", "abc")
                    .json_body(json!({"version": "1.2.0"}));
                then.status(201).body("created");
            })
            .await;

        let step = build(
            "deploy",
            &json!({
                "url": server.url("/deploy"),
                "method": "post",
                "headers": {"x-token": "abc"},
                "body": {"version": "${input.version}"}
            }),
        )
        .unwrap();
        let result = step
            .execute(json!({"version": "1.2.0"}), &ExecutionContext::new())
            .await;

        mock.assert_async().await;
        let data = result.data.unwrap();
        assert_eq!(data["status"], json!(201));
        assert_eq!(data["body"], json!("created"));
    }

    #[tokio::test]
    async fn error_status_fails_step() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("Not Found");
            })
            .await;

        let step = build("fetch", &json!({"url": server.url("/missing")})).unwrap();
        let result = step.execute(Value::Null, &ExecutionContext::new()).await;

        assert!(!result.success);
        assert!(result.error.unwrap().message.contains("404"));
    }

    #[tokio::test]
    async fn error_status_allowed_when_not_failing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(410);
            })
            .await;

        let step = build(
            "fetch",
            &json!({"url": server.url("/gone"), "fail_on_status": false}),
        )
        .unwrap();
        let result = step.execute(Value::Null, &ExecutionContext::new()).await;

        assert!(result.success);
        assert_eq!(result.data.unwrap()["status"], json!(410));
    }

    #[test]
    fn requires_url() {
        let err = build("fetch", &json!({"method": "GET"})).unwrap_err();
        assert!(err.to_string().contains("url"));
    }
}
