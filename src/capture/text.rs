//! Text-fed recognizer
//!
//! Stands in for a microphone: each line handed to [`TextFeed::say`] is
//! played into the live session as growing interim results, then a final
//! result and the end of the session. The daemon wires stdin to it.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::{CaptureEvent, CaptureSettings, CaptureSink, RecognitionBackend, RecognitionResult};
use crate::error::CaptureErrorKind;

#[derive(Default)]
struct FeedState {
    sink: Option<CaptureSink>,
    language_tag: String,
}

/// Handle used to speak text into a [`TextRecognizer`]
#[derive(Clone, Default)]
pub struct TextFeed {
    inner: Arc<Mutex<FeedState>>,
}

impl TextFeed {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a session is waiting for speech
    pub fn is_listening(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// Language tag of the current configuration
    pub fn language_tag(&self) -> String {
        self.lock().language_tag.clone()
    }

    /// Feed an utterance into the live session and end it. Returns false if
    /// no session was listening.
    pub fn say(&self, text: &str) -> bool {
        let Some(sink) = self.lock().sink.take() else {
            return false;
        };

        let words: Vec<&str> = text.split_whitespace().collect();
        let mut heard = String::new();
        for word in words.iter().take(words.len().saturating_sub(1)) {
            if !heard.is_empty() {
                heard.push(' ');
            }
            heard.push_str(word);
            sink.emit(CaptureEvent::Result(vec![RecognitionResult::interim(heard.clone())]));
        }

        debug!(session = sink.session(), %text, "final text result");
        sink.emit(CaptureEvent::Result(vec![RecognitionResult::final_text(text.trim())]));
        sink.emit(CaptureEvent::Ended)
    }

    /// Fail the live session with a platform error code
    pub fn fail(&self, code: &str) -> bool {
        match self.lock().sink.take() {
            Some(sink) => sink.emit(CaptureEvent::Error(CaptureErrorKind::from_code(code))),
            None => false,
        }
    }
}

/// Recognition backend driven by a [`TextFeed`]
pub struct TextRecognizer {
    feed: TextFeed,
}

impl TextRecognizer {
    pub fn new() -> (Self, TextFeed) {
        let feed = TextFeed::default();
        (Self { feed: feed.clone() }, feed)
    }
}

impl RecognitionBackend for TextRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn configure(&mut self, settings: &CaptureSettings) {
        self.feed.lock().language_tag = settings.language_tag.clone();
    }

    fn start(&mut self, sink: CaptureSink) -> Result<(), CaptureErrorKind> {
        sink.emit(CaptureEvent::Started);
        self.feed.lock().sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.feed.lock().sink.take() {
            sink.emit(CaptureEvent::Ended);
        }
    }

    fn abort(&mut self) {
        if let Some(sink) = self.feed.lock().sink.take() {
            sink.emit(CaptureEvent::Error(CaptureErrorKind::Aborted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::joined_transcript;
    use crate::engine::EngineInput;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<EngineInput>) -> Vec<CaptureEvent> {
        let mut events = Vec::new();
        while let Ok(EngineInput::Capture { event, .. }) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_say_without_session() {
        let (_recognizer, feed) = TextRecognizer::new();
        assert!(!feed.is_listening());
        assert!(!feed.say("add money"));
    }

    #[test]
    fn test_say_streams_growing_results() {
        let (mut recognizer, feed) = TextRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        recognizer.start(CaptureSink::new(7, tx)).unwrap();
        assert!(feed.is_listening());

        assert!(feed.say("check my balance"));
        assert!(!feed.is_listening());

        let events = drain(&mut rx);
        let transcripts: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                CaptureEvent::Result(r) => Some(joined_transcript(r)),
                _ => None,
            })
            .collect();
        assert_eq!(events.first(), Some(&CaptureEvent::Started));
        assert_eq!(events.last(), Some(&CaptureEvent::Ended));
        assert_eq!(transcripts, vec!["check", "check my", "check my balance"]);
    }

    #[test]
    fn test_fail_reports_code() {
        let (mut recognizer, feed) = TextRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        recognizer.start(CaptureSink::new(1, tx)).unwrap();

        assert!(feed.fail("not-allowed"));
        assert_eq!(
            drain(&mut rx).last(),
            Some(&CaptureEvent::Error(CaptureErrorKind::NotAllowed))
        );
    }

    #[test]
    fn test_configure_records_tag() {
        let (mut recognizer, feed) = TextRecognizer::new();
        recognizer.configure(&CaptureSettings::for_language(crate::language::Language::Mr));
        assert_eq!(feed.language_tag(), "mr-IN");
    }
}
