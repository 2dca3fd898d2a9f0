//! Events emitted by the voice engine
//!
//! Published on a broadcast channel for UI consumers and IPC subscribers.
//! Engine state itself is published separately through a watch channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::capture::SessionId;
use crate::error::CaptureErrorKind;
use crate::grammar::Action;
use crate::language::Language;

/// Events emitted by the engine during transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceEvent {
    /// Capture session began
    ListeningStarted {
        session: SessionId,
        language: Language,
    },

    /// Interim or final transcript changed
    TranscriptUpdated {
        session: SessionId,
        transcript: String,
    },

    /// Capture ended (normally or by `stop`), classification follows
    ListeningStopped {
        session: SessionId,
        /// How long the session was listening
        duration_ms: u64,
    },

    /// The transcript matched a grammar rule
    CommandRecognized { action: Action, transcript: String },

    /// The transcript matched nothing
    CommandUnrecognized { transcript: String },

    /// Capture failed; no classification was attempted
    CaptureFailed {
        session: SessionId,
        error: CaptureErrorKind,
    },

    /// Active language switched and capture was reconfigured
    LanguageChanged { language: Language },

    /// A screen's dispatcher replaced the previous one
    ScreenMounted { screen: String },
}

impl std::fmt::Display for VoiceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceEvent::ListeningStarted { session, language } => {
                write!(f, "LISTENING_STARTED (#{session}, {language})")
            }
            VoiceEvent::TranscriptUpdated { transcript, .. } => {
                write!(f, "TRANSCRIPT_UPDATED \"{transcript}\"")
            }
            VoiceEvent::ListeningStopped { session, duration_ms } => {
                write!(f, "LISTENING_STOPPED (#{session}, {duration_ms}ms)")
            }
            VoiceEvent::CommandRecognized { action, transcript } => {
                write!(f, "COMMAND_RECOGNIZED {action} \"{transcript}\"")
            }
            VoiceEvent::CommandUnrecognized { transcript } => {
                write!(f, "COMMAND_UNRECOGNIZED \"{transcript}\"")
            }
            VoiceEvent::CaptureFailed { session, error } => {
                write!(f, "CAPTURE_FAILED (#{session}, {error})")
            }
            VoiceEvent::LanguageChanged { language } => write!(f, "LANGUAGE_CHANGED ({language})"),
            VoiceEvent::ScreenMounted { screen } => write!(f, "SCREEN_MOUNTED ({screen})"),
        }
    }
}

/// Log every event until the channel closes. A lagging receiver skips
/// ahead and keeps going. Returns the number of events logged.
pub async fn log_events(mut events: broadcast::Receiver<VoiceEvent>) -> u64 {
    let mut logged = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                info!(%event, "voice event");
                logged += 1;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("event channel closed");
                break;
            }
        }
    }
    logged
}

/// Wait for the next `ListeningStarted`, skipping other events and lag.
/// Subscribe before requesting the start so the event cannot be missed.
pub async fn listening_started(
    events: &mut broadcast::Receiver<VoiceEvent>,
    within: Duration,
) -> Option<SessionId> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(VoiceEvent::ListeningStarted { session, .. }) => return Some(session),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    };
    tokio::time::timeout(within, wait).await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(n: usize) -> VoiceEvent {
        VoiceEvent::TranscriptUpdated {
            session: 1,
            transcript: format!("word {n}"),
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = VoiceEvent::CommandRecognized {
            action: Action::AddMoney,
            transcript: "add money".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("command_recognized"));
        assert!(json.contains("ADD_MONEY"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"capture_failed","session":3,"error":"not-allowed"}"#;
        let event: VoiceEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            VoiceEvent::CaptureFailed {
                session: 3,
                error: CaptureErrorKind::NotAllowed
            }
        );
    }

    #[test]
    fn test_display() {
        let event = VoiceEvent::ListeningStopped { session: 2, duration_ms: 1500 };
        assert_eq!(event.to_string(), "LISTENING_STOPPED (#2, 1500ms)");
    }

    #[tokio::test]
    async fn test_logger_survives_lag() {
        let (tx, rx) = broadcast::channel(4);
        // one interim result per word of a long line
        for n in 0..150 {
            tx.send(transcript(n)).unwrap();
        }
        drop(tx);

        // only the newest four survive the overflow, but all of them are logged
        assert_eq!(log_events(rx).await, 4);
    }

    #[tokio::test]
    async fn test_logger_keeps_running_after_lag() {
        let (tx, rx) = broadcast::channel(2);
        for n in 0..10 {
            tx.send(transcript(n)).unwrap();
        }
        let logger = tokio::spawn(log_events(rx));
        tokio::task::yield_now().await;

        tx.send(VoiceEvent::LanguageChanged { language: Language::Hi }).unwrap();
        drop(tx);
        assert_eq!(logger.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_listening_started_skips_stale_events() {
        let (tx, mut rx) = broadcast::channel(2);
        for n in 0..5 {
            tx.send(transcript(n)).unwrap();
        }
        tx.send(VoiceEvent::ListeningStarted { session: 7, language: Language::En })
            .unwrap();

        let session = listening_started(&mut rx, Duration::from_secs(1)).await;
        assert_eq!(session, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listening_started_times_out() {
        let (tx, mut rx) = broadcast::channel::<VoiceEvent>(4);
        tx.send(VoiceEvent::ScreenMounted { screen: "dashboard".into() }).unwrap();

        assert_eq!(listening_started(&mut rx, Duration::from_secs(1)).await, None);
        drop(tx);
    }
}
