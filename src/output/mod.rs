//! Speech output controller
//!
//! At most one utterance is ever in flight: every `speak` cancels whatever
//! the synthesizer is doing first. There is no queue, so a burst of calls
//! leaves only the last text audible. Failures are logged and dropped.

mod logger;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SynthesisError;
use crate::language::Language;

pub use logger::LogSynthesizer;

/// Prosody applied to every utterance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
        }
    }
}

/// A single request to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// `ll-CC` language tag
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: Language, prosody: Prosody) -> Self {
        Self {
            text: text.into(),
            lang: language.tag().to_string(),
            rate: prosody.rate,
            pitch: prosody.pitch,
            volume: prosody.volume,
        }
    }
}

/// A platform speech-synthesis capability
pub trait SynthesisBackend: Send {
    fn is_available(&self) -> bool;

    /// Begin speaking. Returns once the utterance is handed off.
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SynthesisError>;

    /// Cancel anything speaking or queued
    fn cancel(&mut self);
}

/// Owns a synthesis backend and enforces cancel-then-speak
pub struct SpeechOutput {
    backend: Box<dyn SynthesisBackend>,
    supported: bool,
    prosody: Prosody,
    language: Language,
    last: Option<Utterance>,
}

impl SpeechOutput {
    pub fn new(backend: Box<dyn SynthesisBackend>, language: Language, prosody: Prosody) -> Self {
        let supported = backend.is_available();
        if !supported {
            warn!("speech synthesis not supported, audio feedback disabled");
        }
        Self {
            backend,
            supported,
            prosody,
            language,
            last: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Language used when `speak` is called without one
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Last utterance handed to the backend
    pub fn last_utterance(&self) -> Option<&Utterance> {
        self.last.as_ref()
    }

    /// Replace whatever is being spoken with `text`
    pub fn speak(&mut self, text: &str, language: Option<Language>) {
        if !self.supported {
            debug!(%text, "speech synthesis unavailable, dropping utterance");
            return;
        }

        self.backend.cancel();

        let utterance = Utterance::new(text, language.unwrap_or(self.language), self.prosody);
        match self.backend.speak(&utterance) {
            Ok(()) => {
                debug!(lang = %utterance.lang, %text, "speaking");
                self.last = Some(utterance);
            }
            Err(e) => {
                warn!(?e, "speech synthesis failed");
            }
        }
    }

    /// Cancel the in-flight utterance. Safe to call repeatedly.
    pub fn stop_speaking(&mut self) {
        if self.supported {
            self.backend.cancel();
        }
    }
}

impl Drop for SpeechOutput {
    fn drop(&mut self) {
        self.stop_speaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSynthesizer, SynthCall};

    fn output() -> (SpeechOutput, RecordingSynthesizer) {
        let synth = RecordingSynthesizer::new();
        let out = SpeechOutput::new(Box::new(synth.clone()), Language::En, Prosody::default());
        (out, synth)
    }

    #[test]
    fn test_speak_cancels_first() {
        let (mut out, synth) = output();
        out.speak("A", None);
        out.speak("B", None);

        let calls = synth.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], SynthCall::Cancel);
        assert!(matches!(&calls[1], SynthCall::Speak(u) if u.text == "A"));
        assert_eq!(calls[2], SynthCall::Cancel);
        assert!(matches!(&calls[3], SynthCall::Speak(u) if u.text == "B"));
        assert_eq!(synth.audible().as_deref(), Some("B"));
    }

    #[test]
    fn test_default_prosody_and_language() {
        let (mut out, _synth) = output();
        out.speak("hello", None);
        let u = out.last_utterance().unwrap();
        assert_eq!(u.lang, "en-US");
        assert_eq!((u.rate, u.pitch, u.volume), (0.9, 1.0, 0.8));

        out.set_language(Language::Hi);
        out.speak("नमस्ते", None);
        assert_eq!(out.last_utterance().unwrap().lang, "hi-IN");

        out.speak("hola", Some(Language::Es));
        assert_eq!(out.last_utterance().unwrap().lang, "es-ES");
    }

    #[test]
    fn test_synthesis_failure_is_absorbed() {
        let (mut out, synth) = output();
        synth.fail_next();
        out.speak("lost", None);
        assert!(out.last_utterance().is_none());
        out.speak("heard", None);
        assert_eq!(synth.audible().as_deref(), Some("heard"));
    }

    #[test]
    fn test_unsupported_is_silent() {
        let synth = RecordingSynthesizer::unavailable();
        let mut out = SpeechOutput::new(Box::new(synth.clone()), Language::En, Prosody::default());
        assert!(!out.is_supported());
        out.speak("nobody hears this", None);
        out.stop_speaking();
        assert!(synth.calls().is_empty());
    }

    #[test]
    fn test_stop_speaking_idempotent() {
        let (mut out, synth) = output();
        out.stop_speaking();
        out.stop_speaking();
        assert_eq!(synth.calls(), vec![SynthCall::Cancel, SynthCall::Cancel]);
        assert!(synth.audible().is_none());
    }
}
