//! Engine phase and the published voice state

use serde::{Deserialize, Serialize};

use crate::error::CaptureErrorKind;
use crate::language::Language;

/// Phase of the listening state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for `start_listening`
    #[default]
    Idle,
    /// A capture session is live
    Listening,
    /// Capture ended, transcript being classified and dispatched
    Processing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Listening => write!(f, "Listening"),
            Phase::Processing => write!(f, "Processing"),
        }
    }
}

/// Snapshot of the engine as seen by UI consumers. Only the engine writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    pub is_listening: bool,
    pub is_processing: bool,
    /// Capture capability detected; fixed for the engine's lifetime
    pub is_supported: bool,
    /// Interim while listening, final once `is_listening` drops
    pub transcript: String,
    /// Last capture error, cleared when a new session starts
    pub error: Option<CaptureErrorKind>,
    pub language: Language,
}

impl VoiceState {
    pub(crate) fn new(is_supported: bool, language: Language) -> Self {
        Self {
            is_supported,
            language,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.is_listening, self.is_processing) {
            (true, _) => Phase::Listening,
            (false, true) => Phase::Processing,
            (false, false) => Phase::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_flags() {
        let mut state = VoiceState::new(true, Language::En);
        assert_eq!(state.phase(), Phase::Idle);
        state.is_listening = true;
        assert_eq!(state.phase(), Phase::Listening);
        state.is_listening = false;
        state.is_processing = true;
        assert_eq!(state.phase(), Phase::Processing);
    }

    #[test]
    fn test_state_serialization() {
        let mut state = VoiceState::new(true, Language::Hi);
        state.error = Some(CaptureErrorKind::NoSpeech);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["error"], "no-speech");
        assert_eq!(json["language"], "hi");
        assert_eq!(json["is_listening"], false);
    }
}
