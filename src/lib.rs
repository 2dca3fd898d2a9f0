//! savings-voice: voice command core for the savings dashboard
//!
//! A [`VoiceEngine`] owns a speech capture adapter, a speech output
//! controller and the dispatcher of whichever screen is mounted. Capture
//! sessions run `Idle -> Listening -> Processing -> Idle`; on the way back
//! to idle the final transcript is classified by the [`CommandGrammar`] and
//! handed to the dispatcher as a [`Command`].
//!
//! UI consumers hold a [`VoiceHandle`]: requests go in through it, state
//! comes back on a watch channel and [`VoiceEvent`]s on a broadcast channel.

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod grammar;
pub mod ipc;
pub mod language;
pub mod lifecycle;
pub mod output;

#[cfg(test)]
pub(crate) mod test_support;

pub use capture::{CaptureEvent, RecognitionBackend, RecognitionResult, SpeechCapture};
pub use config::Config;
pub use dispatch::{Command, CommandDispatcher, DispatchContext, FnDispatcher, Intent};
pub use engine::{EngineOptions, Phase, VoiceEngine, VoiceHandle, VoiceState};
pub use error::{CaptureErrorKind, VoiceError};
pub use events::VoiceEvent;
pub use grammar::{Action, CommandGrammar};
pub use language::Language;
pub use output::{Prosody, SpeechOutput, SynthesisBackend, Utterance};
