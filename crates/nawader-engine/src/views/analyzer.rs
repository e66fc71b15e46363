use tracing::{debug, error};

use super::state::{IgnoreReason, SubmitOutcome, ViewEvent, ViewState};
use crate::analysis::{AnalysisRequest, DEFAULT_ANALYSIS_PROMPT};
use crate::config::GenerationOptions;
use crate::error::GatewayError;
use crate::gateway::Gateway;

pub const ANALYSIS_ERROR_TEXT: &str = "فشل تحليل الصورة. يرجى التحقق من الملف والمحاولة مرة أخرى.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Upload-and-analyze workflow. Every run is a fresh stateless request.
#[derive(Debug)]
pub struct AnalyzerView {
    selected: Option<SelectedImage>,
    instruction: String,
    analysis: String,
    state: ViewState,
    extended_reasoning: bool,
}

impl Default for AnalyzerView {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerView {
    pub fn new() -> Self {
        Self {
            selected: None,
            instruction: DEFAULT_ANALYSIS_PROMPT.to_string(),
            analysis: String::new(),
            state: ViewState::Idle,
            extended_reasoning: false,
        }
    }

    pub fn select_image(&mut self, bytes: Vec<u8>, mime_type: impl Into<String>) {
        self.selected = Some(SelectedImage {
            bytes,
            mime_type: mime_type.into(),
        });
        self.analysis.clear();
    }

    pub fn selected_image(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
    }

    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn extended_reasoning(&self) -> bool {
        self.extended_reasoning
    }

    pub fn set_extended_reasoning(&mut self, enabled: bool) {
        self.extended_reasoning = enabled;
    }

    /// Mirrors the analyze button: disabled without an image or while a run is in flight.
    pub fn can_analyze(&self) -> Result<(), IgnoreReason> {
        if self.selected.is_none() {
            return Err(IgnoreReason::NoImage);
        }
        if self.state.is_busy() {
            return Err(IgnoreReason::Busy);
        }
        Ok(())
    }

    pub fn begin_analysis(&mut self) -> Result<AnalysisRequest, IgnoreReason> {
        self.can_analyze()?;
        let Some(image) = self.selected.as_ref() else {
            return Err(IgnoreReason::NoImage);
        };
        let next = self
            .state
            .on(ViewEvent::Submitted)
            .ok_or(IgnoreReason::Busy)?;
        let request = AnalysisRequest {
            image: image.bytes.clone(),
            mime_type: image.mime_type.clone(),
            instruction: self.instruction.clone(),
            options: GenerationOptions::with_extended_reasoning(self.extended_reasoning),
        };
        self.state = next;
        self.analysis.clear();
        Ok(request)
    }

    /// Stores the run's result. A completion with no run in flight is ignored.
    pub fn complete(&mut self, result: Result<String, GatewayError>) -> SubmitOutcome {
        let event = if result.is_ok() {
            ViewEvent::Succeeded
        } else {
            ViewEvent::Failed
        };
        let Some(next) = self.state.on(event) else {
            debug!(state = ?self.state, "analysis completion ignored");
            return SubmitOutcome::Ignored(IgnoreReason::NotAwaiting);
        };
        self.state = next;

        match result {
            Ok(analysis) => {
                self.analysis = analysis;
                SubmitOutcome::Completed
            }
            Err(err) => {
                error!("analysis error: {err}");
                self.analysis = ANALYSIS_ERROR_TEXT.to_string();
                SubmitOutcome::Failed
            }
        }
    }

    pub fn analyze(&mut self, gateway: &Gateway) -> SubmitOutcome {
        let request = match self.begin_analysis() {
            Ok(request) => request,
            Err(reason) => {
                debug!(?reason, "analysis ignored");
                return SubmitOutcome::Ignored(reason);
            }
        };
        let result = gateway.analyze(&request);
        self.complete(result)
    }
}
