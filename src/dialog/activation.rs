//! Content activation state machine
//!
//! Frame content may arrive before the toolkit has finished opening the
//! dialog. Activation must happen once the dialog is open and the content is
//! in place, whichever comes last, and never after closing has begun.

/// Activation progress of a dialog's frame content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivationState {
    #[default]
    Idle,
    /// Content arrived before the open callback
    ContentPending,
    Activated,
    /// Closing started; nothing activates any more
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationInput {
    ContentUpdated { open: bool },
    Opened,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEffect {
    None,
    Activate,
}

/// Single transition function of the machine
pub fn transition(state: ActivationState, input: ActivationInput) -> (ActivationState, ActivationEffect) {
    use ActivationEffect as E;
    use ActivationInput as I;
    use ActivationState as S;

    match (state, input) {
        (S::Suspended, _) => (S::Suspended, E::None),
        (_, I::Closing) => (S::Suspended, E::None),

        (_, I::ContentUpdated { open: false }) => (S::ContentPending, E::None),
        // New content replaces the old and has to be activated again
        (_, I::ContentUpdated { open: true }) => (S::Activated, E::Activate),

        (S::ContentPending, I::Opened) => (S::Activated, E::Activate),
        (state, I::Opened) => (state, E::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(inputs: &[ActivationInput]) -> (ActivationState, usize) {
        inputs.iter().fold((ActivationState::Idle, 0), |(state, count), input| {
            let (next, effect) = transition(state, *input);
            let count = count + usize::from(effect == ActivationEffect::Activate);
            (next, count)
        })
    }

    #[test]
    fn test_update_before_open_activates_once() {
        let (state, count) = run(&[
            ActivationInput::ContentUpdated { open: false },
            ActivationInput::Opened,
            ActivationInput::Opened,
        ]);
        assert_eq!(state, ActivationState::Activated);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_without_content_waits() {
        let (state, count) = run(&[ActivationInput::Opened]);
        assert_eq!(state, ActivationState::Idle);
        assert_eq!(count, 0);

        let (state, count) = run(&[
            ActivationInput::Opened,
            ActivationInput::ContentUpdated { open: true },
        ]);
        assert_eq!(state, ActivationState::Activated);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_closing_suspends_everything() {
        let (state, count) = run(&[
            ActivationInput::ContentUpdated { open: false },
            ActivationInput::Closing,
            ActivationInput::Opened,
            ActivationInput::ContentUpdated { open: true },
        ]);
        assert_eq!(state, ActivationState::Suspended);
        assert_eq!(count, 0);
    }
}
