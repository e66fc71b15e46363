use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::GenerationOptions;
use crate::content::{extract_text, generation_config, inline_image_part, text_or_fallback};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::transport::error_chain_text;

pub const ANALYSIS_FALLBACK_TEXT: &str = "تعذر تحليل الصورة.";
pub const DEFAULT_ANALYSIS_PROMPT: &str = "حلل هذه الصورة بالتفصيل.";

/// One image plus the instruction to apply to it. No session is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub instruction: String,
    pub options: GenerationOptions,
}

impl Gateway {
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<String, GatewayError> {
        self.ensure_credentials()?;
        if request.image.is_empty() {
            return Err(GatewayError::RequestFailed(
                "image payload is empty".to_string(),
            ));
        }
        let model = self.resolve_model("vision")?;
        let thinking_budget = self.reasoning_budget(&model, request.options);

        let mut payload = Map::new();
        payload.insert(
            "contents".to_string(),
            Value::Array(vec![json!({
                "role": "user",
                "parts": [
                    inline_image_part(&request.image, &request.mime_type),
                    { "text": request.instruction },
                ],
            })]),
        );
        if let Some(config) = generation_config(thinking_budget) {
            payload.insert("generationConfig".to_string(), config);
        }

        debug!(
            model = %model.name,
            bytes = request.image.len(),
            mime_type = %request.mime_type,
            thinking_budget = ?thinking_budget,
            "sending image analysis"
        );
        self.emit(
            "analysis_started",
            json!({
                "model": model.name,
                "bytes": request.image.len(),
                "mime_type": request.mime_type,
                "thinking_budget": thinking_budget,
            }),
        );

        let response = self
            .transport
            .generate_content(&model.name, &Value::Object(payload))
            .map_err(|err| {
                let detail = error_chain_text(&err, 512);
                warn!(model = %model.name, "image analysis failed: {detail}");
                self.emit("analysis_failed", json!({ "error": detail }));
                GatewayError::RequestFailed(detail)
            })?;

        let (analysis, fallback) =
            text_or_fallback(extract_text(&response), ANALYSIS_FALLBACK_TEXT);
        self.emit(
            "analysis_completed",
            json!({
                "chars": analysis.chars().count(),
                "fallback": fallback,
            }),
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AnalysisRequest, ANALYSIS_FALLBACK_TEXT, DEFAULT_ANALYSIS_PROMPT};
    use crate::config::{GatewayConfig, GenerationOptions};
    use crate::error::GatewayError;
    use crate::gateway::Gateway;
    use crate::test_support::ScriptedTransport;

    fn request(extended_reasoning: bool) -> AnalysisRequest {
        AnalysisRequest {
            image: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".to_string(),
            instruction: DEFAULT_ANALYSIS_PROMPT.to_string(),
            options: GenerationOptions::with_extended_reasoning(extended_reasoning),
        }
    }

    #[test]
    fn analyze_sends_image_then_instruction_in_one_content() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text("قطة على الأريكة");
        let gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());

        assert_eq!(gateway.analyze(&request(false))?, "قطة على الأريكة");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let (_, payload) = &requests[0];
        let contents = payload["contents"].as_array().cloned().unwrap_or_default();
        assert_eq!(contents.len(), 1);
        let parts = &contents[0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/png"));
        assert_eq!(parts[0]["inlineData"]["data"], json!("iVBORw=="));
        assert_eq!(parts[1]["text"], json!(DEFAULT_ANALYSIS_PROMPT));
        assert!(payload.get("systemInstruction").is_none());
        assert!(payload.get("generationConfig").is_none());
        Ok(())
    }

    #[test]
    fn analyze_threads_thinking_budget() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text("تحليل");
        let mut gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());
        gateway.set_thinking_budget(1024);

        gateway.analyze(&request(true))?;
        let (_, payload) = &transport.requests()[0];
        assert_eq!(
            payload["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            json!(1024)
        );
        Ok(())
    }

    #[test]
    fn analyze_empty_response_uses_fallback() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_response(json!({ "candidates": [{ "content": { "parts": [] } }] }));
        let gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());
        assert_eq!(gateway.analyze(&request(false))?, ANALYSIS_FALLBACK_TEXT);
        Ok(())
    }

    #[test]
    fn analyze_errors_are_request_failed() {
        let transport = ScriptedTransport::new();
        transport.push_error("400 invalid image");
        let gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());
        assert_eq!(
            gateway.analyze(&request(false)).err(),
            Some(GatewayError::RequestFailed("400 invalid image".to_string()))
        );
    }

    #[test]
    fn analyze_rejects_empty_image_without_calling() {
        let transport = ScriptedTransport::new();
        let gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());
        let mut empty = request(false);
        empty.image.clear();
        assert!(matches!(
            gateway.analyze(&empty),
            Err(GatewayError::RequestFailed(_))
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn analyze_without_credentials_is_provider_unavailable() {
        let transport = ScriptedTransport::unconfigured();
        let gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());
        assert!(matches!(
            gateway.analyze(&request(false)),
            Err(GatewayError::ProviderUnavailable(_))
        ));
        assert_eq!(transport.call_count(), 0);
    }
}
