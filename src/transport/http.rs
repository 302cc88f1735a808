//! HTTP transport over ureq
//!
//! ureq is blocking, so each request runs on the tokio blocking pool.

use crate::config::schema::ClientConfig;
use crate::error::{RestifyError, RestifyResult};
use crate::response::Response;
use crate::transport::{Method, Transport};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

/// JSON-over-HTTP transport
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    user_agent: String,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    fn send_blocking(
        agent: &ureq::Agent,
        user_agent: &str,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        match method {
            Method::Get => agent
                .get(url)
                .header("accept", "application/json")
                .header("user-agent", user_agent)
                .call(),
            Method::Delete => agent
                .delete(url)
                .header("accept", "application/json")
                .header("user-agent", user_agent)
                .call(),
            Method::Post => agent
                .post(url)
                .header("accept", "application/json")
                .header("content-type", "application/json")
                .header("user-agent", user_agent)
                .send(body.unwrap_or_default()),
            Method::Put => agent
                .put(url)
                .header("accept", "application/json")
                .header("content-type", "application/json")
                .header("user-agent", user_agent)
                .send(body.unwrap_or_default()),
        }
    }

    fn envelope(
        &self,
        method: Method,
        url: &str,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> RestifyResult<Response> {
        let status = response.status().as_u16();

        let mut headers = Map::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), Value::String(value.to_string()));
            }
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RestifyError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Response::new(parse_body(&body))
            .with_field("status", json!(status))
            .with_field("headers", Value::Object(headers))
            .with_field("request", json!({"method": method.as_str(), "url": url}))
            .with_field("config", json!({"timeout_secs": self.timeout_secs})))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> RestifyResult<Response> {
        let body = match payload {
            Some(value) if method.has_body() => Some(serde_json::to_string(value)?),
            _ => None,
        };

        debug!("{} {}", method, url);

        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let target = url.to_string();
        let result = tokio::task::spawn_blocking(move || {
            Self::send_blocking(&agent, &user_agent, method, &target, body)
        })
        .await
        .map_err(|e| RestifyError::Internal(format!("transport task failed: {}", e)))?;

        match result {
            Ok(response) => self.envelope(method, url, response),
            Err(ureq::Error::StatusCode(status)) => Err(RestifyError::Http {
                status,
                url: url.to_string(),
            }),
            Err(e) => Err(RestifyError::Connection {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// JSON bodies parse as JSON, empty bodies as `null`, anything else as a string
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
