use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Terminal side effects a screen asks the root loop to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Bell,
    Copy(String),
}

impl Effect {
    pub(crate) fn sequence(&self) -> String {
        match self {
            Self::Bell => "\x07".to_string(),
            Self::Copy(text) => osc52_sequence(text),
        }
    }
}

/// OSC 52 "set clipboard" escape carrying `text`.
pub(crate) fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Queue of effects owned by one screen.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pending: Vec<Effect>,
}

impl Effects {
    pub(crate) fn push(&mut self, effect: Effect) {
        self.pending.push(effect);
    }

    pub(crate) fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.pending)
    }

    #[cfg(test)]
    pub(crate) fn peek(&self) -> &[Effect] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::{Effect, Effects, osc52_sequence};

    #[test]
    fn osc52_wraps_base64_payload() {
        assert_eq!(osc52_sequence("hello"), "\x1b]52;c;aGVsbG8=\x07");
        assert_eq!(osc52_sequence(""), "\x1b]52;c;\x07");
    }

    #[test]
    fn bell_is_a_single_bel_byte() {
        assert_eq!(Effect::Bell.sequence(), "\x07");
    }

    #[test]
    fn take_drains_in_order() {
        let mut effects = Effects::default();
        effects.push(Effect::Bell);
        effects.push(Effect::Copy("x".to_string()));

        assert_eq!(
            effects.take(),
            vec![Effect::Bell, Effect::Copy("x".to_string())]
        );
        assert!(effects.take().is_empty());
    }
}
