//! Error types for the voice core
//!
//! Capture-session failures are not errors in the Rust sense: they are
//! recorded as [`CaptureErrorKind`] in the engine state. The enums here
//! cover the few places where a caller gets a `Result` back.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to direct callers of the engine and capture adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("a capture session is already active")]
    AlreadyListening,

    #[error("speech capture is not supported on this platform")]
    NotSupported,

    #[error("capture backend refused to start: {0}")]
    Capture(CaptureErrorKind),

    #[error("voice engine has shut down")]
    EngineClosed,
}

/// Errors reported by a synthesis backend. Always absorbed by
/// [`crate::output::SpeechOutput`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("synthesis failed: {0}")]
    Failed(String),
}

/// Errors building a command grammar
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("rule {action} in '{language}' has no trigger phrases")]
    EmptyRule { language: String, action: String },

    #[error("failed to compile pattern for {action}: {source}")]
    Pattern {
        action: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse grammar file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME is not set")]
    NoHome,

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unsupported language code: {0}")]
    UnknownLanguage(String),
}

/// Reason code for a failed capture session, surfaced verbatim from the
/// platform recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CaptureErrorKind {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    BadGrammar,
    LanguageNotSupported,
    /// Any code the platform reports that we don't model
    Other(String),
}

impl CaptureErrorKind {
    /// Parse a platform reason code such as `not-allowed`
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "bad-grammar" => Self::BadGrammar,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }

    /// The platform reason code
    pub fn code(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::BadGrammar => "bad-grammar",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(code) => code,
        }
    }

    /// Whether the user denied (or the platform blocked) microphone access
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::NotAllowed | Self::ServiceNotAllowed)
    }
}

impl fmt::Display for CaptureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for CaptureErrorKind {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<CaptureErrorKind> for String {
    fn from(kind: CaptureErrorKind) -> Self {
        kind.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_codes_are_verbatim() {
        for code in ["no-speech", "audio-capture", "network", "not-allowed"] {
            assert_eq!(CaptureErrorKind::from_code(code).code(), code);
        }
        let other = CaptureErrorKind::from_code("mic-on-fire");
        assert_eq!(other, CaptureErrorKind::Other("mic-on-fire".into()));
        assert_eq!(other.to_string(), "mic-on-fire");
    }

    #[test]
    fn test_capture_error_serializes_as_code() {
        let json = serde_json::to_string(&CaptureErrorKind::NotAllowed).unwrap();
        assert_eq!(json, r#""not-allowed""#);
        let kind: CaptureErrorKind = serde_json::from_str(r#""no-speech""#).unwrap();
        assert_eq!(kind, CaptureErrorKind::NoSpeech);
    }

    #[test]
    fn test_permission_denied() {
        assert!(CaptureErrorKind::NotAllowed.is_permission_denied());
        assert!(!CaptureErrorKind::Network.is_permission_denied());
    }
}
