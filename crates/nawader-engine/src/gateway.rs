use nawader_contracts::events::{EventPayload, EventWriter};
use nawader_contracts::models::{ModelSelector, ModelSpec};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{GatewayConfig, GenerationOptions};
use crate::error::GatewayError;
use crate::transport::{GeminiTransport, ModelTransport};

/// Owns the transport and the call-shaping policy shared by chat and analysis.
///
/// Sessions are not stored here; callers own them and lend them in per call.
pub struct Gateway {
    pub(crate) transport: Box<dyn ModelTransport>,
    model_selector: ModelSelector,
    requested_model: Option<String>,
    thinking_budget: u32,
    events: Option<EventWriter>,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self::with_transport(Box::new(GeminiTransport::new(config)), config)
    }

    pub fn with_transport(transport: Box<dyn ModelTransport>, config: &GatewayConfig) -> Self {
        Self {
            transport,
            model_selector: ModelSelector::new(None),
            requested_model: config.model.clone(),
            thinking_budget: config.thinking_budget,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn provider(&self) -> &str {
        self.transport.name()
    }

    pub fn thinking_budget(&self) -> u32 {
        self.thinking_budget
    }

    pub fn set_thinking_budget(&mut self, budget: u32) {
        self.thinking_budget = budget;
    }

    pub fn requested_model(&self) -> Option<&str> {
        self.requested_model.as_deref()
    }

    pub(crate) fn ensure_credentials(&self) -> Result<(), GatewayError> {
        if self.transport.is_configured() {
            return Ok(());
        }
        Err(GatewayError::ProviderUnavailable(
            GatewayConfig::missing_credentials_message(),
        ))
    }

    pub(crate) fn resolve_model(&self, capability: &str) -> Result<ModelSpec, GatewayError> {
        let selection = self
            .model_selector
            .select(self.requested_model.as_deref(), capability)
            .map_err(GatewayError::ProviderUnavailable)?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            if selection.requested.is_some() {
                warn!(model = %selection.model.name, "{reason}");
            } else {
                debug!(model = %selection.model.name, "{reason}");
            }
        }
        Ok(selection.model)
    }

    /// Thinking budget for the next call, or `None` when it should not be requested.
    pub(crate) fn reasoning_budget(
        &self,
        model: &ModelSpec,
        options: GenerationOptions,
    ) -> Option<u32> {
        if !options.extended_reasoning {
            return None;
        }
        let budget = model.clamp_thinking_budget(self.thinking_budget);
        if budget.is_none() {
            warn!(
                model = %model.name,
                "model has no reasoning support; sending without thinking config"
            );
        }
        budget
    }

    pub fn emit(&self, event_type: &str, payload: Value) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        let payload: EventPayload = payload.as_object().cloned().unwrap_or_default();
        if let Err(err) = events.emit(event_type, payload) {
            warn!(event = event_type, "failed to write diagnostic event: {err:#}");
        }
    }
}
