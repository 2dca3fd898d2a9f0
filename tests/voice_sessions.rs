//! End-to-end voice sessions against a running engine

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use savings_voice::capture::{CaptureEvent, CaptureSettings, CaptureSink, RecognitionBackend, RecognitionResult};
use savings_voice::dispatch::{Command, DispatchContext, FnDispatcher, Intent};
use savings_voice::engine::{EngineOptions, Phase, VoiceEngine, VoiceHandle};
use savings_voice::error::{CaptureErrorKind, SynthesisError};
use savings_voice::events::VoiceEvent;
use savings_voice::grammar::{Action, CommandGrammar};
use savings_voice::language::Language;
use savings_voice::output::{SynthesisBackend, Utterance};

/// Recognizer whose live sink is shared with the test
#[derive(Clone, Default)]
struct MicStub {
    sink: Arc<Mutex<Option<CaptureSink>>>,
    configured: Arc<Mutex<Vec<String>>>,
}

impl MicStub {
    fn emit(&self, event: CaptureEvent) {
        let sink = self.sink.lock().unwrap().clone().expect("no live session");
        sink.emit(event);
    }

    fn hear(&self, text: &str, is_final: bool) {
        let result = if is_final {
            RecognitionResult::final_text(text)
        } else {
            RecognitionResult::interim(text)
        };
        self.emit(CaptureEvent::Result(vec![result]));
    }
}

impl RecognitionBackend for MicStub {
    fn is_available(&self) -> bool {
        true
    }

    fn configure(&mut self, settings: &CaptureSettings) {
        self.configured.lock().unwrap().push(settings.language_tag.clone());
    }

    fn start(&mut self, sink: CaptureSink) -> Result<(), CaptureErrorKind> {
        sink.emit(CaptureEvent::Started);
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {}

    fn abort(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
enum Speech {
    Cancel,
    Say(String),
}

#[derive(Clone, Default)]
struct SpeakerStub {
    log: Arc<Mutex<Vec<Speech>>>,
}

impl SpeakerStub {
    fn log(&self) -> Vec<Speech> {
        self.log.lock().unwrap().clone()
    }
}

impl SynthesisBackend for SpeakerStub {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), SynthesisError> {
        self.log.lock().unwrap().push(Speech::Say(utterance.text.clone()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.log.lock().unwrap().push(Speech::Cancel);
    }
}

struct Session {
    handle: VoiceHandle,
    events: broadcast::Receiver<VoiceEvent>,
    mic: MicStub,
    speaker: SpeakerStub,
    received: Arc<Mutex<Vec<Command>>>,
    task: JoinHandle<()>,
}

impl Session {
    fn start(language: Language) -> Self {
        let mic = MicStub::default();
        let speaker = SpeakerStub::default();
        let grammar = Arc::new(CommandGrammar::builtin().unwrap());
        let options = EngineOptions {
            language,
            ..EngineOptions::default()
        };

        let (engine, handle) =
            VoiceEngine::new(grammar, Box::new(mic.clone()), Box::new(speaker.clone()), options);

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        handle
            .mount(Box::new(FnDispatcher::new(
                "recorder",
                move |cmd: &Command, _ctx: &mut DispatchContext<'_>| {
                    sink.lock().unwrap().push(cmd.clone());
                },
            )))
            .unwrap();

        let events = handle.subscribe();
        let task = tokio::spawn(engine.run());

        Self {
            handle,
            events,
            mic,
            speaker,
            received,
            task,
        }
    }

    /// Wait for the first event matching `pred`, skipping others
    async fn wait_for(&mut self, pred: impl Fn(&VoiceEvent) -> bool) -> VoiceEvent {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = self.events.recv().await.unwrap();
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    async fn listen(&mut self) {
        self.handle.start_listening().unwrap();
        self.wait_for(|e| matches!(e, VoiceEvent::ListeningStarted { .. }))
            .await;
    }

    async fn settle(&mut self) {
        self.wait_for(|e| {
            matches!(
                e,
                VoiceEvent::CommandRecognized { .. }
                    | VoiceEvent::CommandUnrecognized { .. }
                    | VoiceEvent::CaptureFailed { .. }
            )
        })
        .await;
        self.settle_idle().await;
    }

    async fn settle_idle(&self) {
        let mut state = self.handle.watch_state();
        state.wait_for(|s| s.phase() == Phase::Idle).await.unwrap();
    }

    fn received(&self) -> Vec<Command> {
        self.received.lock().unwrap().clone()
    }

    async fn finish(self) {
        self.handle.shutdown().unwrap();
        self.task.await.unwrap();
    }
}

#[tokio::test]
async fn test_english_command_reaches_dispatcher() {
    let mut s = Session::start(Language::En);
    s.listen().await;

    s.mic.hear("add", false);
    s.mic.hear("add money", true);
    s.mic.emit(CaptureEvent::Ended);
    s.settle().await;

    assert_eq!(
        s.received(),
        vec![Command::new(Intent::Action(Action::AddMoney), "add money")]
    );
    let state = s.handle.state();
    assert_eq!(state.transcript, "add money");
    assert!(!state.is_listening);
    s.finish().await;
}

#[tokio::test]
async fn test_hindi_help_phrase() {
    let mut s = Session::start(Language::Hi);
    assert_eq!(s.mic.configured.lock().unwrap().last().map(String::as_str), Some("hi-IN"));
    s.listen().await;

    s.mic.hear("दिखाओ मदद", true);
    s.mic.emit(CaptureEvent::Ended);
    s.settle().await;

    assert_eq!(s.received()[0].intent, Intent::Action(Action::ShowHelp));
    s.finish().await;
}

#[tokio::test]
async fn test_unmatched_transcript_is_unrecognized() {
    let mut s = Session::start(Language::En);
    s.listen().await;

    s.mic.hear("purple elephant", true);
    s.mic.emit(CaptureEvent::Ended);
    let event = s
        .wait_for(|e| matches!(e, VoiceEvent::CommandUnrecognized { .. }))
        .await;
    assert_eq!(
        event,
        VoiceEvent::CommandUnrecognized {
            transcript: "purple elephant".into()
        }
    );
    s.settle_idle().await;

    assert_eq!(
        s.received(),
        vec![Command::new(Intent::Unrecognized, "purple elephant")]
    );
    s.finish().await;
}

#[tokio::test]
async fn test_manual_stop_classifies_partial_transcript() {
    let mut s = Session::start(Language::En);
    s.listen().await;

    s.mic.hear("check bal", false);
    s.wait_for(|e| matches!(e, VoiceEvent::TranscriptUpdated { .. }))
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    s.handle.stop_listening().unwrap();
    let stopped = s
        .wait_for(|e| matches!(e, VoiceEvent::ListeningStopped { .. }))
        .await;
    match stopped {
        VoiceEvent::ListeningStopped { duration_ms, .. } => assert!(duration_ms >= 200),
        other => panic!("unexpected event {other}"),
    }
    s.settle().await;

    // no rule contains "check bal" literally
    assert_eq!(s.received(), vec![Command::new(Intent::Unrecognized, "check bal")]);
    s.finish().await;
}

#[tokio::test]
async fn test_permission_error_skips_classification() {
    let mut s = Session::start(Language::En);
    s.listen().await;

    s.mic.hear("add money", false);
    s.mic.emit(CaptureEvent::Error(CaptureErrorKind::from_code("not-allowed")));
    s.settle().await;

    let state = s.handle.state();
    assert_eq!(state.error, Some(CaptureErrorKind::NotAllowed));
    assert!(!state.is_listening);
    assert!(s.received().is_empty());
    s.finish().await;
}

#[tokio::test]
async fn test_speak_cancels_previous_utterance() {
    let s = Session::start(Language::En);

    s.handle.speak("first").unwrap();
    s.handle.speak("second").unwrap();
    s.handle.stop_speaking().unwrap();
    s.handle.speak("third").unwrap();

    let speaker = s.speaker.clone();
    s.finish().await;

    let log = speaker.log();
    let before_teardown = &log[..6];
    assert_eq!(
        before_teardown,
        &[
            Speech::Cancel,
            Speech::Say("first".into()),
            Speech::Cancel,
            Speech::Say("second".into()),
            Speech::Cancel,
            Speech::Cancel,
        ]
    );
    assert!(log.contains(&Speech::Say("third".into())));
}

#[tokio::test]
async fn test_language_switch_reconfigures_capture() {
    let mut s = Session::start(Language::En);

    s.handle.set_language(Language::Es).unwrap();
    let event = s
        .wait_for(|e| matches!(e, VoiceEvent::LanguageChanged { .. }))
        .await;
    assert_eq!(event, VoiceEvent::LanguageChanged { language: Language::Es });
    assert_eq!(s.handle.state().language, Language::Es);
    assert_eq!(
        s.mic.configured.lock().unwrap().last().map(String::as_str),
        Some("es-ES")
    );

    s.listen().await;
    s.mic.hear("ver recompensas", true);
    s.mic.emit(CaptureEvent::Ended);
    s.settle().await;
    assert_eq!(
        s.received(),
        vec![Command::new(Intent::Action(Action::ViewRewards), "ver recompensas")]
    );
    s.finish().await;
}
