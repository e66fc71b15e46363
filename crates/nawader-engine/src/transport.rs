use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response as HttpResponse};
use serde_json::Value;

use crate::config::GatewayConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// The single seam between the gateway and the hosted model.
pub trait ModelTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a credential is available at all.
    fn is_configured(&self) -> bool;

    /// Cheap reachability check for `model`, issued once per session.
    fn probe(&self, model: &str) -> Result<()>;

    fn generate_content(&self, model: &str, payload: &Value) -> Result<Value>;
}

pub struct GeminiTransport {
    api_base: String,
    api_key: Option<String>,
    request_timeout: Option<Duration>,
    http: HttpClient,
}

impl GeminiTransport {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            http: HttpClient::new(),
        }
    }

    fn model_path(model: &str) -> String {
        let trimmed = model.trim();
        if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        }
    }

    fn model_endpoint(&self, model: &str) -> String {
        format!("{}/{}", self.api_base, Self::model_path(model))
    }

    fn generate_endpoint(&self, model: &str) -> String {
        format!("{}:generateContent", self.model_endpoint(model))
    }

    fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!("{}", GatewayConfig::missing_credentials_message()),
        }
    }

    fn probe_request(&self, model: &str) -> Result<RequestBuilder> {
        let api_key = self.api_key()?;
        Ok(self.with_timeout(
            self.http
                .get(self.model_endpoint(model))
                .header(API_KEY_HEADER, api_key),
        ))
    }

    fn generate_request(&self, model: &str, payload: &Value) -> Result<RequestBuilder> {
        let api_key = self.api_key()?;
        Ok(self.with_timeout(
            self.http
                .post(self.generate_endpoint(model))
                .header(API_KEY_HEADER, api_key)
                .json(payload),
        ))
    }

    fn with_timeout(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

impl ModelTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn probe(&self, model: &str) -> Result<()> {
        let endpoint = self.model_endpoint(model);
        let response = self
            .probe_request(model)?
            .send()
            .with_context(|| format!("Gemini probe failed ({endpoint})"))?;
        response_json_or_error("Gemini", response)?;
        Ok(())
    }

    fn generate_content(&self, model: &str, payload: &Value) -> Result<Value> {
        let endpoint = self.generate_endpoint(model);
        let response = self
            .generate_request(model, payload)?
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        response_json_or_error("Gemini", response)
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
