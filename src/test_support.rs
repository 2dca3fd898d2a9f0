//! Scriptable capture and synthesis backends for unit tests

use std::sync::{Arc, Mutex, MutexGuard};

use crate::capture::{CaptureEvent, CaptureSettings, CaptureSink, RecognitionBackend, SessionId};
use crate::error::{CaptureErrorKind, SynthesisError};
use crate::output::{SynthesisBackend, Utterance};

#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerCall {
    Configure(String),
    Start(SessionId),
    Stop,
    Abort,
}

#[derive(Default)]
struct RecognizerState {
    calls: Vec<RecognizerCall>,
    sink: Option<CaptureSink>,
    refuse: Option<CaptureErrorKind>,
}

/// Test-side view of a [`ScriptedRecognizer`]
#[derive(Clone, Default)]
pub struct MicHandle {
    inner: Arc<Mutex<RecognizerState>>,
}

impl MicHandle {
    fn lock(&self) -> MutexGuard<'_, RecognizerState> {
        self.inner.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<RecognizerCall> {
        self.lock().calls.clone()
    }

    pub fn refuse_next_start(&self, kind: CaptureErrorKind) {
        self.lock().refuse = Some(kind);
    }

    /// Sink of the most recently started session
    pub fn sink(&self) -> CaptureSink {
        self.lock().sink.clone().expect("no session started")
    }

    pub fn emit(&self, event: CaptureEvent) {
        self.sink().emit(event);
    }
}

/// Recognizer that records calls and lets the test play events
pub struct ScriptedRecognizer {
    available: bool,
    mic: MicHandle,
}

impl ScriptedRecognizer {
    pub fn new() -> (Self, MicHandle) {
        let mic = MicHandle::default();
        (
            Self {
                available: true,
                mic: mic.clone(),
            },
            mic,
        )
    }

    pub fn unavailable() -> (Self, MicHandle) {
        let (mut recognizer, mic) = Self::new();
        recognizer.available = false;
        (recognizer, mic)
    }
}

impl RecognitionBackend for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn configure(&mut self, settings: &CaptureSettings) {
        self.mic
            .lock()
            .calls
            .push(RecognizerCall::Configure(settings.language_tag.clone()));
    }

    fn start(&mut self, sink: CaptureSink) -> Result<(), CaptureErrorKind> {
        let mut state = self.mic.lock();
        if let Some(kind) = state.refuse.take() {
            return Err(kind);
        }
        state.calls.push(RecognizerCall::Start(sink.session()));
        state.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.mic.lock().calls.push(RecognizerCall::Stop);
    }

    fn abort(&mut self) {
        self.mic.lock().calls.push(RecognizerCall::Abort);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthCall {
    Cancel,
    Speak(Utterance),
}

#[derive(Default)]
struct SynthState {
    calls: Vec<SynthCall>,
    fail_next: bool,
}

/// Synthesizer that records every cancel and speak
#[derive(Clone)]
pub struct RecordingSynthesizer {
    available: bool,
    inner: Arc<Mutex<SynthState>>,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self {
            available: true,
            inner: Arc::default(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<SynthCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn fail_next(&self) {
        self.inner.lock().unwrap().fail_next = true;
    }

    /// Text still playing: the last spoken utterance not followed by a cancel
    pub fn audible(&self) -> Option<String> {
        match self.calls().last() {
            Some(SynthCall::Speak(u)) => Some(u.text.clone()),
            _ => None,
        }
    }

    /// Every text handed to the synthesizer, in order
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SynthCall::Speak(u) => Some(u.text),
                SynthCall::Cancel => None,
            })
            .collect()
    }
}

impl SynthesisBackend for RecordingSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), SynthesisError> {
        let mut state = self.inner.lock().unwrap();
        if std::mem::take(&mut state.fail_next) {
            return Err(SynthesisError::Failed("scripted failure".into()));
        }
        state.calls.push(SynthCall::Speak(utterance.clone()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.inner.lock().unwrap().calls.push(SynthCall::Cancel);
    }
}
