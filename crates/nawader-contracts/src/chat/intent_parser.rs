use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, ANALYZE_COMMAND, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, REASONING_COMMAND,
    VIEW_COMMAND,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            command_args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.command_args.insert(key.to_string(), value);
        self
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_reasoning_mode(arg: &str) -> Option<&'static str> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "" | "toggle" => Some("toggle"),
        "on" | "true" | "1" | "yes" => Some("on"),
        "off" | "false" | "0" | "no" => Some("off"),
        _ => None,
    }
}

fn parse_view_name(arg: &str) -> Option<&'static str> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "chat" => Some("chat"),
        "image" | "analyze" | "analysis" | "image_analysis" => Some("image_analysis"),
        _ => None,
    }
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

/// First word is the image path, everything after it is the instruction.
fn parse_analyze_args(arg: &str) -> (String, Option<String>) {
    let parts = parse_path_args(arg);
    let Some((path, rest)) = parts.split_first() else {
        return (String::new(), None);
    };
    let instruction = rest.join(" ");
    let instruction = if instruction.trim().is_empty() {
        None
    } else {
        Some(instruction.trim().to_string())
    };
    (path.clone(), instruction)
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = if remainder.is_empty() {
                ""
            } else {
                remainder.trim()
            };

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                return Intent::new(action, text)
                    .with_arg("prompt", Value::String(arg.to_string()));
            }

            if command == REASONING_COMMAND.command {
                return match parse_reasoning_mode(arg) {
                    Some(mode) => Intent::new(REASONING_COMMAND.action, text)
                        .with_arg("mode", Value::String(mode.to_string())),
                    None => Intent::new("invalid", text)
                        .with_arg("command", Value::String(command))
                        .with_arg("arg", Value::String(arg.to_string())),
                };
            }

            if command == VIEW_COMMAND.command {
                return match parse_view_name(arg) {
                    Some(view) => Intent::new(VIEW_COMMAND.action, text)
                        .with_arg("view", Value::String(view.to_string())),
                    None => Intent::new("invalid", text)
                        .with_arg("command", Value::String(command))
                        .with_arg("arg", Value::String(arg.to_string())),
                };
            }

            if command == ANALYZE_COMMAND.command {
                let (path, instruction) = parse_analyze_args(arg);
                return Intent::new(ANALYZE_COMMAND.action, text)
                    .with_arg("path", Value::String(path))
                    .with_arg(
                        "instruction",
                        instruction.map(Value::String).unwrap_or(Value::Null),
                    );
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            return Intent::new("unknown", text)
                .with_arg("command", Value::String(command))
                .with_arg("arg", Value::String(arg.to_string()));
        }
    }

    let mut intent = Intent::new("send", text);
    intent.prompt = Some(text.to_string());
    intent
}
