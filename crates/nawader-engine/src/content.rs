use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use nawader_contracts::transcript::Role;
use serde_json::{json, Map, Value};

pub(crate) fn text_content(role: Role, text: &str) -> Value {
    json!({
        "role": role.as_str(),
        "parts": [{ "text": text }],
    })
}

pub(crate) fn inline_image_part(bytes: &[u8], mime_type: &str) -> Value {
    json!({
        "inlineData": {
            "mimeType": mime_type,
            "data": BASE64.encode(bytes),
        }
    })
}

pub(crate) fn system_instruction(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(json!({ "parts": [{ "text": text }] }))
}

pub(crate) fn generation_config(thinking_budget: Option<u32>) -> Option<Value> {
    let budget = thinking_budget?;
    let mut config = Map::new();
    config.insert(
        "thinkingConfig".to_string(),
        json!({ "thinkingBudget": budget }),
    );
    Some(Value::Object(config))
}

/// Visible text of the first candidate. Thought summaries are skipped.
pub(crate) fn extract_text(response: &Value) -> String {
    let parts = response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    parts
        .iter()
        .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<&str>>()
        .concat()
}

/// Only an empty reply is replaced; whitespace is returned as the model sent it.
pub(crate) fn text_or_fallback(text: String, fallback: &str) -> (String, bool) {
    if text.is_empty() {
        return (fallback.to_string(), true);
    }
    (text, false)
}
