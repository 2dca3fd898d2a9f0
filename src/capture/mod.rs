//! Speech capture adapter
//!
//! Wraps a platform speech-recognition capability behind
//! [`RecognitionBackend`]. Backends never return transcripts directly:
//! they push [`CaptureEvent`]s through the [`CaptureSink`] handed to them
//! at session start, and the engine folds those events into its state.

mod text;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::EngineInput;
use crate::error::{CaptureErrorKind, VoiceError};
use crate::language::Language;

pub use text::{TextFeed, TextRecognizer};

/// Identifies one capture session. Events carry the id of the session that
/// produced them so late events from a superseded session can be dropped.
pub type SessionId = u64;

/// One candidate transcription of a result
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub confidence: f32,
}

/// A recognition result; interim until `is_final` is set
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub alternatives: Vec<RecognitionAlternative>,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self::single(transcript, false)
    }

    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self::single(transcript, true)
    }

    fn single(transcript: impl Into<String>, is_final: bool) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: transcript.into(),
                confidence: 1.0,
            }],
            is_final,
        }
    }
}

/// Concatenate alternative 0 of every result received so far
pub fn joined_transcript(results: &[RecognitionResult]) -> String {
    results
        .iter()
        .filter_map(|r| r.alternatives.first())
        .map(|a| a.transcript.as_str())
        .collect()
}

/// Events a backend reports during a session
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Audio capture actually began
    Started,
    /// All results of the session so far, interim and final
    Result(Vec<RecognitionResult>),
    /// Session ended normally
    Ended,
    /// Session failed; terminal
    Error(CaptureErrorKind),
}

impl CaptureEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Error(_))
    }
}

/// Recognizer settings applied before each session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub language_tag: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl CaptureSettings {
    /// Single-utterance capture with interim results
    pub fn for_language(language: Language) -> Self {
        Self {
            language_tag: language.tag().to_string(),
            continuous: false,
            interim_results: true,
        }
    }
}

/// Where a backend delivers the events of one session
#[derive(Debug, Clone)]
pub struct CaptureSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<EngineInput>,
}

impl CaptureSink {
    pub(crate) fn new(session: SessionId, tx: mpsc::UnboundedSender<EngineInput>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver an event. Returns false once the engine has shut down.
    pub fn emit(&self, event: CaptureEvent) -> bool {
        self.tx
            .send(EngineInput::Capture {
                session: self.session,
                event,
            })
            .is_ok()
    }
}

/// A platform speech-recognition capability
pub trait RecognitionBackend: Send {
    /// Whether the capability exists at all. Must not have side effects.
    fn is_available(&self) -> bool;

    /// Apply settings for subsequent sessions
    fn configure(&mut self, settings: &CaptureSettings);

    /// Begin a session. Events for it must go through `sink`.
    fn start(&mut self, sink: CaptureSink) -> Result<(), CaptureErrorKind>;

    /// Request a graceful end of the current session
    fn stop(&mut self);

    /// Drop the current session without waiting for results
    fn abort(&mut self);
}

/// Owns a recognition backend and tracks which session is live
pub struct SpeechCapture {
    backend: Box<dyn RecognitionBackend>,
    supported: bool,
    settings: CaptureSettings,
    active: Option<SessionId>,
    next_session: SessionId,
}

impl SpeechCapture {
    /// Check the backend once and configure it for `language`
    pub fn new(mut backend: Box<dyn RecognitionBackend>, language: Language) -> Self {
        let supported = backend.is_available();
        let settings = CaptureSettings::for_language(language);
        if supported {
            backend.configure(&settings);
        } else {
            warn!("speech capture not supported, voice input disabled");
        }

        Self {
            backend,
            supported,
            settings,
            active: None,
            next_session: 1,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Reconfigure for a new language. Any live session is aborted.
    pub fn configure(&mut self, language: Language) {
        if self.active.take().is_some() {
            self.backend.abort();
        }
        self.settings = CaptureSettings::for_language(language);
        if self.supported {
            debug!(tag = %self.settings.language_tag, "configuring speech capture");
            self.backend.configure(&self.settings);
        }
    }

    /// Start a session whose events are delivered to `tx`
    pub fn start(&mut self, tx: mpsc::UnboundedSender<EngineInput>) -> Result<SessionId, VoiceError> {
        if !self.supported {
            return Err(VoiceError::NotSupported);
        }
        if self.active.is_some() {
            return Err(VoiceError::AlreadyListening);
        }

        let session = self.next_session;
        self.next_session += 1;

        self.backend
            .start(CaptureSink::new(session, tx))
            .map_err(VoiceError::Capture)?;

        info!(session, tag = %self.settings.language_tag, "capture session started");
        self.active = Some(session);
        Ok(session)
    }

    /// Ask the backend to end the live session. Returns the session that was
    /// stopped, or `None` if nothing was listening.
    pub fn stop(&mut self) -> Option<SessionId> {
        let session = self.active.take()?;
        debug!(session, "stopping capture session");
        self.backend.stop();
        Some(session)
    }

    /// Abort the live session, if any
    pub fn abort(&mut self) {
        if let Some(session) = self.active.take() {
            debug!(session, "aborting capture session");
            self.backend.abort();
        }
    }

    /// Mark a session finished after its terminal event
    pub fn finish(&mut self, session: SessionId) {
        if self.active == Some(session) {
            self.active = None;
        }
    }

    pub fn is_current(&self, session: SessionId) -> bool {
        self.active == Some(session)
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }
}

impl Drop for SpeechCapture {
    fn drop(&mut self) {
        self.abort();
    }
}
