use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Wire name used by `generateContent` contents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub extended_reasoning: bool,
    pub created_at: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            extended_reasoning: false,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    pub fn with_extended_reasoning(mut self, extended_reasoning: bool) -> Self {
        self.extended_reasoning = extended_reasoning;
        self
    }
}

/// Append-only, display-ordered list of turns.
///
/// Turns cannot be edited or removed once pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn seeded(turn: Turn) -> Self {
        Self { turns: vec![turn] }
    }

    pub fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        self.turns.as_slice()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{Role, Transcript, Turn};

    #[test]
    fn push_preserves_insertion_order() {
        let mut transcript = Transcript::seeded(Turn::model("welcome"));
        transcript.push(Turn::user("first"));
        transcript.push(Turn::model("reply"));

        let contents = transcript
            .turns()
            .iter()
            .map(|turn| turn.content.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(contents, vec!["welcome", "first", "reply"]);
        assert_eq!(transcript.last().map(|turn| turn.role), Some(Role::Model));
    }

    #[test]
    fn turns_get_distinct_ids() {
        let a = Turn::user("same");
        let b = Turn::user("same");
        assert_ne!(a.id, b.id);
        assert!(!a.extended_reasoning);
    }

    #[test]
    fn turn_serializes_lowercase_role() -> anyhow::Result<()> {
        let turn = Turn::model("hi").with_extended_reasoning(true);
        let value: Value = serde_json::to_value(&turn)?;
        assert_eq!(value["role"], json!("model"));
        assert_eq!(value["extended_reasoning"], json!(true));
        Ok(())
    }
}
