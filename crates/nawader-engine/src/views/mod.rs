mod analyzer;
mod chat;
mod state;

pub use analyzer::{AnalyzerView, SelectedImage, ANALYSIS_ERROR_TEXT};
pub use chat::{ChatView, PendingTurn, BEHAVIOR_INSTRUCTION, CHAT_ERROR_TEXT, WELCOME_TEXT};
pub use state::{IgnoreReason, SubmitOutcome, ViewEvent, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Chat,
    ImageAnalysis,
}

/// Top-level front-end state: which view is showing and the shared reasoning toggle.
#[derive(Debug, Default)]
pub struct AppShell {
    active: ActiveView,
    extended_reasoning: bool,
    pub chat: ChatView,
    pub analyzer: AnalyzerView,
}

impl AppShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_view(&self) -> ActiveView {
        self.active
    }

    /// Both views stay alive across switches; the chat keeps its session and transcript.
    pub fn set_active_view(&mut self, view: ActiveView) {
        self.active = view;
    }

    pub fn extended_reasoning(&self) -> bool {
        self.extended_reasoning
    }

    pub fn set_extended_reasoning(&mut self, enabled: bool) {
        self.extended_reasoning = enabled;
        self.chat.set_extended_reasoning(enabled);
        self.analyzer.set_extended_reasoning(enabled);
    }

    pub fn toggle_extended_reasoning(&mut self) -> bool {
        self.set_extended_reasoning(!self.extended_reasoning);
        self.extended_reasoning
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveView, AppShell, SubmitOutcome};
    use crate::config::GatewayConfig;
    use crate::gateway::Gateway;
    use crate::test_support::ScriptedTransport;

    #[test]
    fn shell_starts_on_chat_with_reasoning_off() {
        let shell = AppShell::new();
        assert_eq!(shell.active_view(), ActiveView::Chat);
        assert!(!shell.extended_reasoning());
        assert_eq!(shell.chat.transcript().len(), 1);
    }

    #[test]
    fn toggle_reaches_both_views() {
        let mut shell = AppShell::new();
        assert!(shell.toggle_extended_reasoning());
        assert!(shell.chat.extended_reasoning());
        assert!(shell.analyzer.extended_reasoning());

        assert!(!shell.toggle_extended_reasoning());
        assert!(!shell.chat.extended_reasoning());
        assert!(!shell.analyzer.extended_reasoning());
    }

    #[test]
    fn toggle_does_not_touch_transcript() {
        let mut shell = AppShell::new();
        let before = shell.chat.transcript().clone();
        shell.toggle_extended_reasoning();
        assert_eq!(shell.chat.transcript(), &before);
    }

    #[test]
    fn switching_views_keeps_chat_session_and_transcript() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text("أهلاً");
        let gateway = Gateway::with_transport(transport.boxed(), &GatewayConfig::default());
        let mut shell = AppShell::new();
        shell.chat.mount(&gateway)?;
        assert_eq!(shell.chat.submit(&gateway, "مرحبا"), SubmitOutcome::Completed);
        let session_id = shell.chat.session().map(|session| session.id().to_string());

        shell.set_active_view(ActiveView::ImageAnalysis);
        shell.set_active_view(ActiveView::Chat);
        shell.chat.mount(&gateway)?;

        assert_eq!(shell.chat.transcript().len(), 3);
        assert_eq!(
            shell.chat.session().map(|session| session.id().to_string()),
            session_id
        );
        assert_eq!(transport.probes().len(), 1);
        Ok(())
    }
}
