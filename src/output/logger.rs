//! Synthesizer that writes utterances to the log instead of a speaker

use tracing::info;

use super::{SynthesisBackend, Utterance};
use crate::error::SynthesisError;

/// Logs each utterance at `info`. Used by the daemon when no audio device
/// is wired up.
#[derive(Debug, Default)]
pub struct LogSynthesizer {
    speaking: bool,
}

impl LogSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SynthesisBackend for LogSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), SynthesisError> {
        if utterance.text.trim().is_empty() {
            return Err(SynthesisError::Failed("empty utterance".into()));
        }
        info!(lang = %utterance.lang, rate = utterance.rate, "🔊 {}", utterance.text);
        self.speaking = true;
        Ok(())
    }

    fn cancel(&mut self) {
        self.speaking = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::output::Prosody;

    #[test]
    fn test_empty_utterance_fails() {
        let mut synth = LogSynthesizer::new();
        let u = Utterance::new("  ", Language::En, Prosody::default());
        assert!(synth.speak(&u).is_err());
        let u = Utterance::new("ok", Language::En, Prosody::default());
        assert!(synth.speak(&u).is_ok());
        assert!(synth.speaking);
        synth.cancel();
        assert!(!synth.speaking);
    }
}
