use nawader_contracts::transcript::{Transcript, Turn};
use tracing::{debug, error};

use super::state::{IgnoreReason, SubmitOutcome, ViewEvent, ViewState};
use crate::config::GenerationOptions;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::session::ChatSession;

pub const WELCOME_TEXT: &str = "مرحباً! أنا مساعدك الذكي \"نوادر\". كيف يمكنني مساعدتك اليوم؟";
pub const CHAT_ERROR_TEXT: &str = "عذراً، واجهت خطأ أثناء المعالجة. يرجى المحاولة مرة أخرى.";
pub const BEHAVIOR_INSTRUCTION: &str = concat!(
    "أنت مساعد ذكي ومحترف للغاية يدعى \"نوادر AI\". ",
    "تقدم معلومات دقيقة ومفيدة ومختصرة باللغة العربية. ",
    "إذا قام المستخدم بتفعيل 'وضع التفكير'، قدم منطقاً عميقاً واستنتاجاً خطوة بخطوة."
);

/// A user turn that has been recorded and is waiting for its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub text: String,
    pub options: GenerationOptions,
}

#[derive(Debug)]
pub struct ChatView {
    transcript: Transcript,
    session: Option<ChatSession>,
    state: ViewState,
    extended_reasoning: bool,
    last_error: Option<GatewayError>,
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::seeded(Turn::model(WELCOME_TEXT)),
            session: None,
            state: ViewState::Idle,
            extended_reasoning: false,
            last_error: None,
        }
    }

    /// Creates the backing session. A view holds at most one; mounting twice is a no-op.
    pub fn mount(&mut self, gateway: &Gateway) -> Result<(), GatewayError> {
        if self.session.is_some() {
            return Ok(());
        }
        match gateway.create_session(BEHAVIOR_INSTRUCTION) {
            Ok(session) => {
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                error!("chat session init failed: {err}");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn unmount(&mut self) -> Option<ChatSession> {
        self.session.take()
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    pub fn extended_reasoning(&self) -> bool {
        self.extended_reasoning
    }

    pub fn set_extended_reasoning(&mut self, enabled: bool) {
        self.extended_reasoning = enabled;
    }

    pub fn can_submit(&self, input: &str) -> Result<(), IgnoreReason> {
        if input.trim().is_empty() {
            return Err(IgnoreReason::BlankInput);
        }
        if self.state.is_busy() {
            return Err(IgnoreReason::Busy);
        }
        if self.session.is_none() {
            return Err(IgnoreReason::NoSession);
        }
        Ok(())
    }

    /// Records the user turn and marks the view busy.
    pub fn begin_submit(&mut self, input: &str) -> Result<PendingTurn, IgnoreReason> {
        self.can_submit(input)?;
        let next = self
            .state
            .on(ViewEvent::Submitted)
            .ok_or(IgnoreReason::Busy)?;
        self.state = next;
        self.transcript.push(Turn::user(input));
        Ok(PendingTurn {
            text: input.to_string(),
            options: GenerationOptions::with_extended_reasoning(self.extended_reasoning),
        })
    }

    /// Appends exactly one model turn for `pending` and clears the busy flag.
    /// A completion with no call in flight is ignored.
    pub fn complete(
        &mut self,
        pending: &PendingTurn,
        result: Result<String, GatewayError>,
    ) -> SubmitOutcome {
        let event = if result.is_ok() {
            ViewEvent::Succeeded
        } else {
            ViewEvent::Failed
        };
        let Some(next) = self.state.on(event) else {
            debug!(state = ?self.state, "chat completion ignored");
            return SubmitOutcome::Ignored(IgnoreReason::NotAwaiting);
        };
        self.state = next;

        match result {
            Ok(reply) => {
                self.last_error = None;
                self.transcript.push(
                    Turn::model(reply).with_extended_reasoning(pending.options.extended_reasoning),
                );
                SubmitOutcome::Completed
            }
            Err(err) => {
                error!("chat error: {err}");
                self.last_error = Some(err);
                self.transcript.push(Turn::model(CHAT_ERROR_TEXT));
                SubmitOutcome::Failed
            }
        }
    }

    pub fn submit(&mut self, gateway: &Gateway, input: &str) -> SubmitOutcome {
        let pending = match self.begin_submit(input) {
            Ok(pending) => pending,
            Err(reason) => {
                debug!(?reason, "chat submission ignored");
                return SubmitOutcome::Ignored(reason);
            }
        };
        let result = match self.session.as_mut() {
            Some(session) => gateway.send_turn(session, &pending.text, pending.options),
            None => Err(GatewayError::ProviderUnavailable(
                "chat session is not mounted".to_string(),
            )),
        };
        self.complete(&pending, result)
    }
}
