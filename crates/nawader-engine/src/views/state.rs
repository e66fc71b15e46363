#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    AwaitingResponse,
    IdleWithError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Submitted,
    Succeeded,
    Failed,
}

impl ViewState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ViewState::AwaitingResponse)
    }

    /// Next state, or `None` when the event is not valid here.
    pub fn on(self, event: ViewEvent) -> Option<ViewState> {
        match (self, event) {
            (ViewState::Idle | ViewState::IdleWithError, ViewEvent::Submitted) => {
                Some(ViewState::AwaitingResponse)
            }
            (ViewState::AwaitingResponse, ViewEvent::Succeeded) => Some(ViewState::Idle),
            (ViewState::AwaitingResponse, ViewEvent::Failed) => Some(ViewState::IdleWithError),
            _ => None,
        }
    }
}

/// Why a submission or completion was dropped without touching the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BlankInput,
    Busy,
    NoSession,
    NoImage,
    /// A reply arrived while no call was in flight.
    NotAwaiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::{ViewEvent, ViewState};

    #[test]
    fn happy_path_returns_to_idle() {
        let busy = ViewState::Idle.on(ViewEvent::Submitted).unwrap();
        assert!(busy.is_busy());
        assert_eq!(busy.on(ViewEvent::Succeeded), Some(ViewState::Idle));
    }

    #[test]
    fn failure_lands_in_idle_with_error_and_can_resubmit() {
        let failed = ViewState::AwaitingResponse.on(ViewEvent::Failed).unwrap();
        assert_eq!(failed, ViewState::IdleWithError);
        assert!(!failed.is_busy());
        assert_eq!(
            failed.on(ViewEvent::Submitted),
            Some(ViewState::AwaitingResponse)
        );
    }

    #[test]
    fn submit_while_busy_is_rejected() {
        assert_eq!(ViewState::AwaitingResponse.on(ViewEvent::Submitted), None);
    }

    #[test]
    fn completions_without_a_call_are_rejected() {
        assert_eq!(ViewState::Idle.on(ViewEvent::Succeeded), None);
        assert_eq!(ViewState::IdleWithError.on(ViewEvent::Failed), None);
    }
}
