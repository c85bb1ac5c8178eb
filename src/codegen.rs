//! Code generation through the Gemini `generateContent` API.
//!
//! One POST per call, no retries, no streaming:
//!
//! ```text
//! POST {endpoint}/models/{model}:generateContent?key={key}
//! {"contents":[{"role":"user","parts":[{"text":"..."}]}],
//!  "generationConfig":{"temperature":0.2}}
//! ```
//!
//! Only the first part of the first candidate is used. A reply without
//! candidates or parts yields an empty string rather than an error.
//!
//! # Error mapping
//!
//! - transport failure → [`IngestError::Network`]
//! - HTTP 401 / 403 → [`IngestError::Auth`]
//! - any other non-2xx → [`IngestError::Network`]
//! - 2xx with an unexpected body → [`IngestError::Decode`]

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::IngestError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Client for the generative-language endpoint.
pub struct CodeGenClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
}

impl CodeGenClient {
    pub fn new(config: &CodegenConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send `prompt` and return the first generated text (possibly empty).
    pub async fn generate(&self, prompt: &str, api_key: &str) -> Result<String, IngestError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        // The key travels as a query parameter; keep it out of error text.
        let url = self.request_url();
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                IngestError::Network(format!("POST {} failed: {}", url, e.without_url()))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            IngestError::Network(format!(
                "reading reply from {} failed: {}",
                url,
                e.without_url()
            ))
        })?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(IngestError::Auth(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }
        if !status.is_success() {
            return Err(IngestError::Network(format!(
                "{} returned {}: {}",
                url, status, text
            )));
        }

        let generated = parse_generate_response(&text)?;
        debug!(model = %self.model, chars = generated.len(), "generated code");
        Ok(generated)
    }
}

/// Pull the first candidate's first part text out of a reply body.
fn parse_generate_response(body: &str) -> Result<String, IngestError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| IngestError::Decode(format!("unexpected generateContent reply: {}", e)))?;

    Ok(response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "generationConfig": {"temperature": 0.2}
            })
        );
    }

    #[test]
    fn first_candidate_first_part() {
        let body = r#"{"candidates":[
            {"content":{"parts":[{"text":"class Solution {}"},{"text":"ignored"}]}},
            {"content":{"parts":[{"text":"second"}]}}
        ]}"#;
        assert_eq!(parse_generate_response(body).unwrap(), "class Solution {}");
    }

    #[test]
    fn empty_candidates_is_empty_string() {
        assert_eq!(parse_generate_response(r#"{"candidates":[]}"#).unwrap(), "");
        assert_eq!(parse_generate_response("{}").unwrap(), "");
        assert_eq!(
            parse_generate_response(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap(),
            ""
        );
    }

    #[test]
    fn malformed_reply_is_decode_error() {
        let err = parse_generate_response("<html>oops</html>").unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));

        let err = parse_generate_response(r#"{"candidates":"nope"}"#).unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
    }

    #[test]
    fn url_uses_model_and_trims_slash() {
        let config = CodegenConfig {
            endpoint: "http://localhost:9/v1/".to_string(),
            ..CodegenConfig::default()
        };
        let client = CodeGenClient::new(&config).unwrap();
        assert_eq!(
            client.request_url(),
            "http://localhost:9/v1/models/gemini-2.5-flash:generateContent"
        );
    }
}
