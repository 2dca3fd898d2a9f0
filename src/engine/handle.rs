//! Requests into the engine and the handle UI consumers hold

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::capture::{CaptureEvent, SessionId};
use crate::dispatch::CommandDispatcher;
use crate::error::VoiceError;
use crate::events::VoiceEvent;
use crate::grammar::{CommandGrammar, CommandRule};
use crate::language::Language;

use super::state::VoiceState;

/// Everything the engine loop consumes
#[derive(Debug)]
pub enum EngineInput {
    /// Event from the capture backend for a given session
    Capture {
        session: SessionId,
        event: CaptureEvent,
    },
    /// Request from a UI consumer or a dispatcher
    Request(EngineRequest),
}

/// Operations a consumer can ask the engine to perform
pub enum EngineRequest {
    StartListening,
    StopListening,
    Speak {
        text: String,
        language: Option<Language>,
    },
    StopSpeaking,
    SetLanguage(Language),
    /// Replace the active screen's dispatcher
    Mount(Box<dyn CommandDispatcher>),
    Shutdown,
}

impl std::fmt::Debug for EngineRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartListening => write!(f, "StartListening"),
            Self::StopListening => write!(f, "StopListening"),
            Self::Speak { text, language } => f
                .debug_struct("Speak")
                .field("text", text)
                .field("language", language)
                .finish(),
            Self::StopSpeaking => write!(f, "StopSpeaking"),
            Self::SetLanguage(language) => f.debug_tuple("SetLanguage").field(language).finish(),
            Self::Mount(dispatcher) => f.debug_tuple("Mount").field(&dispatcher.name()).finish(),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Cloneable handle for talking to a running engine
#[derive(Clone)]
pub struct VoiceHandle {
    tx: mpsc::UnboundedSender<EngineInput>,
    state: watch::Receiver<VoiceState>,
    events: broadcast::Sender<VoiceEvent>,
    grammar: Arc<CommandGrammar>,
}

impl VoiceHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<EngineInput>,
        state: watch::Receiver<VoiceState>,
        events: broadcast::Sender<VoiceEvent>,
        grammar: Arc<CommandGrammar>,
    ) -> Self {
        Self {
            tx,
            state,
            events,
            grammar,
        }
    }

    fn send(&self, request: EngineRequest) -> Result<(), VoiceError> {
        self.tx
            .send(EngineInput::Request(request))
            .map_err(|_| VoiceError::EngineClosed)
    }

    pub fn start_listening(&self) -> Result<(), VoiceError> {
        self.send(EngineRequest::StartListening)
    }

    pub fn stop_listening(&self) -> Result<(), VoiceError> {
        self.send(EngineRequest::StopListening)
    }

    /// Speak in the active language
    pub fn speak(&self, text: impl Into<String>) -> Result<(), VoiceError> {
        self.send(EngineRequest::Speak {
            text: text.into(),
            language: None,
        })
    }

    pub fn speak_in(&self, text: impl Into<String>, language: Language) -> Result<(), VoiceError> {
        self.send(EngineRequest::Speak {
            text: text.into(),
            language: Some(language),
        })
    }

    pub fn stop_speaking(&self) -> Result<(), VoiceError> {
        self.send(EngineRequest::StopSpeaking)
    }

    pub fn set_language(&self, language: Language) -> Result<(), VoiceError> {
        self.send(EngineRequest::SetLanguage(language))
    }

    pub fn mount(&self, dispatcher: Box<dyn CommandDispatcher>) -> Result<(), VoiceError> {
        self.send(EngineRequest::Mount(dispatcher))
    }

    pub fn shutdown(&self) -> Result<(), VoiceError> {
        self.send(EngineRequest::Shutdown)
    }

    /// Current state snapshot
    pub fn state(&self) -> VoiceState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every state change
    pub fn watch_state(&self) -> watch::Receiver<VoiceState> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.events.subscribe()
    }

    pub fn grammar(&self) -> &CommandGrammar {
        &self.grammar
    }

    /// Commands available in a language, in match order
    pub fn commands(&self, language: Language) -> &[CommandRule] {
        self.grammar.commands(language)
    }
}
