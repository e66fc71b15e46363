use nawader_contracts::models::ModelSpec;
use nawader_contracts::transcript::Role;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::GenerationOptions;
use crate::content::{
    extract_text, generation_config, system_instruction, text_content, text_or_fallback,
};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::transport::error_chain_text;

pub const CHAT_FALLBACK_TEXT: &str = "عذراً، لم أتمكن من توليد استجابة.";

/// Conversation bound to one behavior instruction and one model.
///
/// The history holds the contents exchanged so far in wire form. It only grows,
/// and only after a call succeeds, so a failed turn leaves no trace in it.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    model: ModelSpec,
    system_instruction: String,
    history: Vec<Value>,
}

impl ChatSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn history(&self) -> &[Value] {
        self.history.as_slice()
    }

    fn request_payload(&self, user: &Value, thinking_budget: Option<u32>) -> Value {
        let mut contents = self.history.clone();
        contents.push(user.clone());

        let mut payload = Map::new();
        payload.insert("contents".to_string(), Value::Array(contents));
        if let Some(instruction) = system_instruction(&self.system_instruction) {
            payload.insert("systemInstruction".to_string(), instruction);
        }
        if let Some(config) = generation_config(thinking_budget) {
            payload.insert("generationConfig".to_string(), config);
        }
        Value::Object(payload)
    }
}

impl Gateway {
    pub fn create_session(&self, behavior_instruction: &str) -> Result<ChatSession, GatewayError> {
        self.ensure_credentials()?;
        let model = self.resolve_model("text")?;
        self.transport.probe(&model.name).map_err(|err| {
            let detail = error_chain_text(&err, 512);
            warn!(model = %model.name, "model endpoint unreachable: {detail}");
            GatewayError::ProviderUnavailable(detail)
        })?;

        let session = ChatSession {
            id: uuid::Uuid::new_v4().to_string(),
            model,
            system_instruction: behavior_instruction.to_string(),
            history: Vec::new(),
        };
        info!(session_id = %session.id, model = %session.model.name, "chat session created");
        self.emit(
            "session_started",
            json!({
                "session_id": session.id,
                "model": session.model.name,
                "provider": self.provider(),
            }),
        );
        Ok(session)
    }

    pub fn send_turn(
        &self,
        session: &mut ChatSession,
        text: &str,
        options: GenerationOptions,
    ) -> Result<String, GatewayError> {
        let thinking_budget = self.reasoning_budget(&session.model, options);
        let user = text_content(Role::User, text);
        let payload = session.request_payload(&user, thinking_budget);

        debug!(
            session_id = %session.id,
            history = session.history.len(),
            thinking_budget = ?thinking_budget,
            "sending chat turn"
        );
        self.emit(
            "turn_sent",
            json!({
                "session_id": session.id,
                "model": session.model.name,
                "chars": text.chars().count(),
                "thinking_budget": thinking_budget,
            }),
        );

        let response = match self.transport.generate_content(&session.model.name, &payload) {
            Ok(response) => response,
            Err(err) => {
                let detail = error_chain_text(&err, 512);
                warn!(session_id = %session.id, "chat turn failed: {detail}");
                self.emit(
                    "turn_failed",
                    json!({ "session_id": session.id, "error": detail }),
                );
                return Err(GatewayError::RequestFailed(detail));
            }
        };

        let (reply, fallback) = text_or_fallback(extract_text(&response), CHAT_FALLBACK_TEXT);
        if fallback {
            debug!(session_id = %session.id, "empty chat response; using fallback text");
        }
        session.history.push(user);
        session.history.push(text_content(Role::Model, &reply));

        self.emit(
            "turn_completed",
            json!({
                "session_id": session.id,
                "chars": reply.chars().count(),
                "fallback": fallback,
                "usage_metadata": response.get("usageMetadata").cloned().unwrap_or(Value::Null),
            }),
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};

    use super::CHAT_FALLBACK_TEXT;
    use crate::config::{GatewayConfig, GenerationOptions};
    use crate::error::GatewayError;
    use crate::gateway::Gateway;
    use crate::test_support::ScriptedTransport;
    use nawader_contracts::events::EventWriter;

    fn gateway(transport: &ScriptedTransport) -> Gateway {
        Gateway::with_transport(transport.boxed(), &GatewayConfig::default())
    }

    #[test]
    fn create_session_probes_the_selected_model() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        let session = gateway(&transport).create_session("كن مفيداً")?;
        assert_eq!(session.model().name, "gemini-3-pro-preview");
        assert_eq!(session.system_instruction(), "كن مفيداً");
        assert!(session.history().is_empty());
        assert_eq!(transport.probes(), vec!["gemini-3-pro-preview".to_string()]);
        Ok(())
    }

    #[test]
    fn create_session_without_credentials_fails() {
        let transport = ScriptedTransport::unconfigured();
        let err = gateway(&transport).create_session("x").err();
        assert!(matches!(err, Some(GatewayError::ProviderUnavailable(_))));
        assert!(transport.probes().is_empty());
    }

    #[test]
    fn create_session_with_unreachable_endpoint_fails() {
        let transport = ScriptedTransport::new();
        transport.fail_probe("connection refused");
        let err = gateway(&transport).create_session("x").err();
        assert_eq!(
            err,
            Some(GatewayError::ProviderUnavailable(
                "connection refused".to_string()
            ))
        );
    }

    #[test]
    fn send_turn_carries_instruction_and_history() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text("أهلاً").push_text("بخير");
        let gateway = gateway(&transport);
        let mut session = gateway.create_session("تعليمات")?;

        assert_eq!(
            gateway.send_turn(&mut session, "مرحبا", GenerationOptions::default())?,
            "أهلاً"
        );
        assert_eq!(
            gateway.send_turn(&mut session, "كيف حالك؟", GenerationOptions::default())?,
            "بخير"
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let (model, second) = &requests[1];
        assert_eq!(model, "gemini-3-pro-preview");
        assert_eq!(
            second["systemInstruction"],
            json!({ "parts": [{ "text": "تعليمات" }] })
        );
        let roles = second["contents"]
            .as_array()
            .map(|contents| {
                contents
                    .iter()
                    .map(|content| content["role"].as_str().unwrap_or("").to_string())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(second["contents"][2]["parts"][0]["text"], json!("كيف حالك؟"));
        assert!(second.get("generationConfig").is_none());
        assert_eq!(session.history().len(), 4);
        Ok(())
    }

    #[test]
    fn extended_reasoning_adds_thinking_budget() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text("deep");
        let gateway = gateway(&transport);
        let mut session = gateway.create_session("x")?;

        gateway.send_turn(
            &mut session,
            "لماذا؟",
            GenerationOptions::with_extended_reasoning(true),
        )?;

        let (_, payload) = &transport.requests()[0];
        assert_eq!(
            payload["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            json!(32768)
        );
        Ok(())
    }

    #[test]
    fn empty_response_maps_to_fallback() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_response(json!({ "candidates": [] }));
        let gateway = gateway(&transport);
        let mut session = gateway.create_session("x")?;

        let reply = gateway.send_turn(&mut session, "مرحبا", GenerationOptions::default())?;
        assert_eq!(reply, CHAT_FALLBACK_TEXT);
        assert_eq!(session.history()[1]["parts"][0]["text"], json!(CHAT_FALLBACK_TEXT));
        Ok(())
    }

    #[test]
    fn failed_turn_leaves_history_untouched() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_error("503 overloaded");
        let gateway = gateway(&transport);
        let mut session = gateway.create_session("x")?;

        let err = gateway
            .send_turn(&mut session, "مرحبا", GenerationOptions::default())
            .err();
        assert_eq!(
            err,
            Some(GatewayError::RequestFailed("503 overloaded".to_string()))
        );
        assert!(session.history().is_empty());
        assert_eq!(transport.call_count(), 1);
        Ok(())
    }

    #[test]
    fn turns_are_traced_to_events_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let transport = ScriptedTransport::new();
        transport.push_text("ok").push_error("boom");
        let gateway = gateway(&transport).with_events(EventWriter::new(&events_path));
        let mut session = gateway.create_session("x")?;

        gateway.send_turn(&mut session, "a", GenerationOptions::default())?;
        let _ = gateway.send_turn(&mut session, "b", GenerationOptions::default());

        let raw = fs::read_to_string(&events_path)?;
        let types: Vec<String> = raw
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter_map(|row| row.get("type").and_then(Value::as_str).map(str::to_string))
            .collect();
        assert_eq!(
            types,
            vec![
                "session_started",
                "turn_sent",
                "turn_completed",
                "turn_sent",
                "turn_failed"
            ]
        );
        Ok(())
    }

    #[test]
    fn traced_session_id_is_the_chat_session_id() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let transport = ScriptedTransport::new();
        transport.push_text("ok");
        let gateway = gateway(&transport).with_events(EventWriter::new(&events_path));
        let mut session = gateway.create_session("x")?;
        gateway.send_turn(&mut session, "a", GenerationOptions::default())?;

        let rows: Vec<Value> = fs::read_to_string(&events_path)?
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["type"], json!("session_started"));
        for row in &rows {
            assert_eq!(row["session_id"], json!(session.id()));
            assert!(row.get("chat_id").is_none());
        }
        Ok(())
    }
}
