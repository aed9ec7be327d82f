// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for Seatbot.
//!
//! Implements [`ProviderAdapter`] over the `generateContent` REST endpoint.
//! API key resolution order: config, then `GEMINI_API_KEY`, then error.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use seatbot_config::model::GeminiConfig;
use seatbot_core::{
    AdapterType, GenerationRequest, HealthStatus, PluginAdapter, ProviderAdapter, SeatbotError,
    TurnRole,
};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, SafetySetting};

/// Gemini provider implementing [`ProviderAdapter`].
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self, SeatbotError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = %config.model, "Gemini provider initialized");
        Ok(Self { client })
    }
}

/// Maps the provider-neutral request onto the Gemini wire format.
pub fn to_wire_request(request: &GenerationRequest) -> GenerateContentRequest {
    let contents = request
        .turns
        .iter()
        .map(|turn| {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "model",
            };
            Content::text(Some(role), turn.text.clone())
        })
        .collect();

    let system_instruction = if request.system_prompt.is_empty() {
        None
    } else {
        Some(Content::text(None, request.system_prompt.clone()))
    };

    GenerateContentRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            max_output_tokens: request.max_tokens,
        },
        safety_settings: SafetySetting::block_only_high(),
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SeatbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SeatbotError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, SeatbotError> {
        let wire = to_wire_request(&request);
        debug!(
            model = %self.client.model(),
            turns = wire.contents.len(),
            max_tokens = request.max_tokens,
            "sending generateContent request"
        );
        let response = self.client.generate_content(&wire).await?;
        response
            .first_text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| SeatbotError::Provider {
                message: response.empty_reason(),
                source: None,
            })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, SeatbotError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GEMINI_API_KEY").map_err(|_| {
        SeatbotError::Config(
            "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbot_core::ConversationTurn;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::new(&GeminiConfig {
            api_key: Some("k".into()),
            base_url: base_url.to_string(),
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn resolve_api_key_prefers_config() {
        assert_eq!(resolve_api_key(&Some("abc".into())).unwrap(), "abc");
    }

    #[test]
    fn wire_request_maps_roles() {
        let request = GenerationRequest::new(
            "sys".into(),
            vec![
                ConversationTurn::user("hola"),
                ConversationTurn::assistant("buenas"),
                ConversationTurn::user("precio?"),
            ],
            600,
        );
        let wire = to_wire_request(&request);
        let roles: Vec<_> = wire
            .contents
            .iter()
            .map(|c| c.role.clone().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(wire.generation_config.max_output_tokens, 600);
        assert!((wire.generation_config.top_p - 0.92).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn generate_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "sys"}]},
                "generationConfig": {"maxOutputTokens": 42}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "  Hola!\n"}]}}]
            })))
            .mount(&server)
            .await;

        let request = GenerationRequest::new("sys".into(), vec![ConversationTurn::user("hi")], 42);
        let text = provider(&server.uri()).generate(request).await.unwrap();
        assert_eq!(text, "Hola!");
    }

    #[tokio::test]
    async fn empty_candidate_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let request = GenerationRequest::new(String::new(), vec![ConversationTurn::user("x")], 10);
        let err = provider(&server.uri()).generate(request).await.unwrap_err();
        assert!(matches!(err, SeatbotError::Provider { .. }));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let p = provider("http://localhost:1");
        assert_eq!(p.name(), "gemini");
        assert_eq!(p.adapter_type(), AdapterType::Provider);
    }
}
