//! Core voice engine
//!
//! Owns the capture adapter, the speech output and the mounted dispatcher,
//! and drives the `Idle -> Listening -> Processing -> Idle` cycle. Every
//! state change goes through [`VoiceEngine::handle`]; dispatchers that want
//! to call back into the engine queue requests instead of re-entering.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::capture::{joined_transcript, CaptureEvent, RecognitionBackend, SessionId, SpeechCapture};
use crate::config::Config;
use crate::dispatch::{Command, CommandDispatcher, DispatchContext, Intent};
use crate::error::{CaptureErrorKind, VoiceError};
use crate::events::VoiceEvent;
use crate::grammar::CommandGrammar;
use crate::language::Language;
use crate::output::{Prosody, SpeechOutput, SynthesisBackend};

use super::handle::{EngineInput, EngineRequest, VoiceHandle};
use super::state::{Phase, VoiceState};

/// Tunables for a [`VoiceEngine`]
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub language: Language,
    pub prosody: Prosody,
    /// Delay before a mounted screen's guide text is spoken
    pub guide_delay: Duration,
    /// Cancel in-flight speech when a capture session starts
    pub interrupt_speech_on_listen: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            prosody: Prosody::default(),
            guide_delay: Duration::from_millis(1000),
            interrupt_speech_on_listen: true,
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            language: config.language,
            prosody: config.prosody,
            guide_delay: Duration::from_millis(config.guide_delay_ms),
            interrupt_speech_on_listen: config.interrupt_speech_on_listen,
        }
    }
}

struct PendingGuide {
    text: String,
    due: Instant,
}

/// The voice interaction engine
pub struct VoiceEngine {
    phase: Phase,
    state: VoiceState,
    language: Language,
    /// Language the live session was started in
    session_language: Language,
    session: Option<SessionId>,
    listening_since: Option<Instant>,
    grammar: Arc<CommandGrammar>,
    capture: SpeechCapture,
    output: SpeechOutput,
    dispatcher: Option<Box<dyn CommandDispatcher>>,
    pending_guide: Option<PendingGuide>,
    options: EngineOptions,
    input_tx: mpsc::UnboundedSender<EngineInput>,
    input_rx: mpsc::UnboundedReceiver<EngineInput>,
    state_tx: watch::Sender<VoiceState>,
    event_tx: broadcast::Sender<VoiceEvent>,
    shutdown: bool,
}

impl VoiceEngine {
    /// Create an engine owning the given backends
    pub fn new(
        grammar: Arc<CommandGrammar>,
        recognizer: Box<dyn RecognitionBackend>,
        synthesizer: Box<dyn SynthesisBackend>,
        options: EngineOptions,
    ) -> (Self, VoiceHandle) {
        let language = options.language;
        let capture = SpeechCapture::new(recognizer, language);
        let output = SpeechOutput::new(synthesizer, language, options.prosody);
        let state = VoiceState::new(capture.is_supported(), language);

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (event_tx, _) = broadcast::channel(64);

        let handle = VoiceHandle::new(
            input_tx.clone(),
            state_rx,
            event_tx.clone(),
            Arc::clone(&grammar),
        );

        let engine = Self {
            phase: Phase::Idle,
            state,
            language,
            session_language: language,
            session: None,
            listening_since: None,
            grammar,
            capture,
            output,
            dispatcher: None,
            pending_guide: None,
            options,
            input_tx,
            input_rx,
            state_tx,
            event_tx,
            shutdown: false,
        };

        (engine, handle)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &VoiceState {
        &self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Run the engine until a shutdown request arrives
    pub async fn run(mut self) {
        info!(
            language = %self.language,
            capture = self.state.is_supported,
            synthesis = self.output.is_supported(),
            "voice engine started"
        );

        while !self.shutdown {
            let guide_due = self.pending_guide.as_ref().map(|g| g.due);

            tokio::select! {
                input = self.input_rx.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                _ = sleep_until_due(guide_due) => {
                    self.speak_pending_guide();
                }
            }
        }

        self.teardown();
        info!("voice engine stopped");
    }

    /// Process everything already queued without waiting. Returns the number
    /// of inputs handled.
    pub fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(input) = self.input_rx.try_recv() {
            self.handle(input);
            handled += 1;
        }
        handled
    }

    /// Single entry point for every state transition
    pub fn handle(&mut self, input: EngineInput) {
        match input {
            EngineInput::Capture { session, event } => self.handle_capture(session, event),
            EngineInput::Request(request) => self.handle_request(request),
        }
    }

    fn handle_request(&mut self, request: EngineRequest) {
        debug!(?request, phase = %self.phase, "engine request");
        match request {
            EngineRequest::StartListening => {
                let _ = self.start_listening();
            }
            EngineRequest::StopListening => self.stop_listening(),
            EngineRequest::Speak { text, language } => self.speak(&text, language),
            EngineRequest::StopSpeaking => self.stop_speaking(),
            EngineRequest::SetLanguage(language) => self.set_language(language),
            EngineRequest::Mount(dispatcher) => self.mount(dispatcher),
            EngineRequest::Shutdown => self.shutdown = true,
        }
    }

    /// Begin a capture session. Rejected unless the engine is idle; a
    /// rejected call leaves the state untouched.
    pub fn start_listening(&mut self) -> Result<SessionId, VoiceError> {
        if self.phase != Phase::Idle {
            warn!(phase = %self.phase, "start rejected, engine busy");
            return Err(VoiceError::AlreadyListening);
        }
        if !self.capture.is_supported() {
            debug!("start ignored, speech capture unsupported");
            return Err(VoiceError::NotSupported);
        }

        self.pending_guide = None;
        if self.options.interrupt_speech_on_listen {
            self.output.stop_speaking();
        }

        let session = match self.capture.start(self.input_tx.clone()) {
            Ok(session) => session,
            Err(VoiceError::Capture(kind)) => {
                warn!(error = %kind, "capture backend refused to start");
                self.state.error = Some(kind.clone());
                self.publish();
                return Err(VoiceError::Capture(kind));
            }
            Err(e) => return Err(e),
        };

        self.state.transcript.clear();
        self.state.error = None;
        self.state.is_listening = true;
        self.session = Some(session);
        self.session_language = self.language;
        self.transition_to(Phase::Listening);
        self.emit(VoiceEvent::ListeningStarted {
            session,
            language: self.language,
        });

        Ok(session)
    }

    /// End the live session now and classify whatever was heard so far
    pub fn stop_listening(&mut self) {
        if self.phase != Phase::Listening {
            debug!(phase = %self.phase, "stop ignored, not listening");
            return;
        }
        if let Some(session) = self.capture.stop() {
            debug!(session, "stopping with partial transcript");
        }
        self.finish_session();
    }

    /// Speak through the output controller, superseding any pending guide
    pub fn speak(&mut self, text: &str, language: Option<Language>) {
        self.pending_guide = None;
        self.output.speak(text, language);
    }

    pub fn stop_speaking(&mut self) {
        self.pending_guide = None;
        self.output.stop_speaking();
    }

    /// Switch language. A live session is stopped first and classified in
    /// the language it was started in.
    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }

        if self.phase == Phase::Listening {
            info!(from = %self.language, to = %language, "language changed mid-session, stopping capture");
            self.stop_listening();
        }

        self.capture.configure(language);
        self.output.set_language(language);
        self.language = language;
        self.state = VoiceState::new(self.capture.is_supported(), language);
        self.publish();
        self.emit(VoiceEvent::LanguageChanged { language });

        // guide text is language dependent, speak it again for the new language
        self.schedule_guide();
    }

    /// Replace the active dispatcher and schedule its guide text. A screen
    /// mounted while a session is live gets no guide.
    pub fn mount(&mut self, dispatcher: Box<dyn CommandDispatcher>) {
        let screen = dispatcher.name().to_string();
        if let Some(old) = self.dispatcher.replace(dispatcher) {
            debug!(screen = old.name(), "dispatcher replaced");
        }
        info!(%screen, phase = %self.phase, "screen mounted");
        if self.phase == Phase::Idle {
            self.schedule_guide();
        } else {
            self.pending_guide = None;
        }
        self.emit(VoiceEvent::ScreenMounted { screen });
    }

    fn schedule_guide(&mut self) {
        self.pending_guide = self
            .dispatcher
            .as_ref()
            .and_then(|d| d.guide(self.language))
            .map(|text| PendingGuide {
                text,
                due: Instant::now() + self.options.guide_delay,
            });
    }

    /// Speak the pending guide if its delay has elapsed
    pub fn speak_pending_guide(&mut self) {
        let due = match &self.pending_guide {
            Some(guide) => guide.due <= Instant::now(),
            None => false,
        };
        if !due {
            return;
        }
        if let Some(guide) = self.pending_guide.take() {
            debug!(text = %guide.text, "speaking screen guide");
            self.output.speak(&guide.text, None);
        }
    }

    fn handle_capture(&mut self, session: SessionId, event: CaptureEvent) {
        if !self.capture.is_current(session) {
            debug!(session, ?event, "dropping event from inactive session");
            return;
        }

        if event.is_terminal() {
            self.capture.finish(session);
        }

        match event {
            CaptureEvent::Started => {
                debug!(session, "capture audio started");
            }
            CaptureEvent::Result(results) => {
                let transcript = joined_transcript(&results);
                if transcript != self.state.transcript {
                    self.state.transcript = transcript.clone();
                    self.publish();
                    self.emit(VoiceEvent::TranscriptUpdated { session, transcript });
                }
            }
            CaptureEvent::Ended => self.finish_session(),
            CaptureEvent::Error(error) => self.fail_session(session, error),
        }
    }

    /// Listening -> Processing -> Idle, dispatching the classified transcript
    fn finish_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let duration_ms = self
            .listening_since
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        self.state.is_listening = false;
        self.state.is_processing = true;
        self.transition_to(Phase::Processing);
        self.emit(VoiceEvent::ListeningStopped { session, duration_ms });

        let transcript = self.state.transcript.clone();
        if transcript.trim().is_empty() {
            debug!(session, "session produced no transcript");
        } else {
            let action = self.grammar.match_in(&transcript, self.session_language);
            let command = Command::new(Intent::from(action), transcript.clone());

            match action {
                Some(action) => {
                    info!(%action, %transcript, "voice command recognized");
                    self.emit(VoiceEvent::CommandRecognized { action, transcript });
                }
                None => {
                    info!(%transcript, "voice command not recognized");
                    self.emit(VoiceEvent::CommandUnrecognized { transcript });
                }
            }

            self.dispatch(&command);
        }

        self.state.is_processing = false;
        self.transition_to(Phase::Idle);
    }

    /// Listening -> Idle with the error recorded; nothing is classified
    fn fail_session(&mut self, session: SessionId, error: CaptureErrorKind) {
        self.session = None;

        if error.is_permission_denied() {
            warn!(session, %error, "microphone access denied");
        } else {
            info!(session, %error, "capture session failed");
        }

        self.state.is_listening = false;
        self.state.is_processing = false;
        self.state.error = Some(error.clone());
        self.transition_to(Phase::Idle);
        self.emit(VoiceEvent::CaptureFailed { session, error });
    }

    fn dispatch(&mut self, command: &Command) {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            debug!(intent = %command.intent, "no dispatcher mounted, command dropped");
            return;
        };

        let mut ctx = DispatchContext::new(&mut self.output, &self.input_tx, self.language);
        dispatcher.on_command(command, &mut ctx);
        if ctx.spoke() {
            self.pending_guide = None;
        }
    }

    /// Perform a phase transition and publish the new state
    fn transition_to(&mut self, new_phase: Phase) {
        let old_phase = self.phase;
        if old_phase != new_phase {
            debug!(from = %old_phase, to = %new_phase, "phase transition");
        }

        self.phase = new_phase;
        self.listening_since = match new_phase {
            Phase::Listening => Some(Instant::now()),
            _ => None,
        };

        debug_assert!(!(self.state.is_listening && self.state.is_processing));
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn emit(&self, event: VoiceEvent) {
        debug!(%event, "emitting voice event");
        let _ = self.event_tx.send(event);
    }

    fn teardown(&mut self) {
        self.pending_guide = None;
        self.capture.abort();
        self.output.stop_speaking();
        self.dispatcher = None;
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}
