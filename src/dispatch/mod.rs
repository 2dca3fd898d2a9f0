//! Command dispatch contract between the engine and UI screens
//!
//! Each screen mounts a [`CommandDispatcher`]. After every capture session
//! that produced a transcript the engine calls it exactly once, with either
//! the matched action or [`Intent::Unrecognized`] and the raw transcript.
//! Dispatchers must not block; anything that touches the engine again goes
//! through [`DispatchContext`], which queues instead of re-entering.

mod screens;

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{EngineInput, EngineRequest};
use crate::grammar::Action;
use crate::language::Language;
use crate::output::SpeechOutput;

pub use screens::{
    screen_for, AccountSnapshot, DashboardScreen, LoginScreen, Navigator, PaymentMethod,
    PaymentScreen,
    RewardsScreen, Route, SavingsShoppingScreen, SettingsScreen, TransactionsScreen, UiEffect,
};

/// Classification outcome handed to dispatchers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Action(Action),
    /// No grammar rule matched the transcript
    Unrecognized,
}

impl Intent {
    pub const UNRECOGNIZED_TAG: &'static str = "UNRECOGNIZED";

    /// Action tag, or `UNRECOGNIZED`
    pub fn tag(&self) -> &'static str {
        match self {
            Intent::Action(action) => action.tag(),
            Intent::Unrecognized => Self::UNRECOGNIZED_TAG,
        }
    }

    pub fn action(&self) -> Option<Action> {
        match self {
            Intent::Action(action) => Some(*action),
            Intent::Unrecognized => None,
        }
    }
}

impl From<Option<Action>> for Intent {
    fn from(action: Option<Action>) -> Self {
        action.map_or(Intent::Unrecognized, Intent::Action)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A classified voice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub intent: Intent,
    /// Transcript exactly as captured
    pub transcript: String,
}

impl Command {
    pub fn new(intent: Intent, transcript: impl Into<String>) -> Self {
        Self {
            intent,
            transcript: transcript.into(),
        }
    }
}

/// What a dispatcher may do while handling a command
pub struct DispatchContext<'a> {
    output: &'a mut SpeechOutput,
    requests: &'a mpsc::UnboundedSender<EngineInput>,
    language: Language,
    spoke: bool,
}

impl<'a> DispatchContext<'a> {
    pub(crate) fn new(
        output: &'a mut SpeechOutput,
        requests: &'a mpsc::UnboundedSender<EngineInput>,
        language: Language,
    ) -> Self {
        Self {
            output,
            requests,
            language,
            spoke: false,
        }
    }

    /// Active interface language
    pub fn language(&self) -> Language {
        self.language
    }

    /// Speak in the active language, replacing any current speech
    pub fn speak(&mut self, text: &str) {
        self.spoke = true;
        self.output.speak(text, None);
    }

    /// Speak in an explicit language
    pub fn speak_in(&mut self, text: &str, language: Language) {
        self.spoke = true;
        self.output.speak(text, Some(language));
    }

    pub fn stop_speaking(&mut self) {
        self.output.stop_speaking();
    }

    /// Default fallback for intents a screen doesn't handle
    pub fn not_understood(&mut self, transcript: &str) {
        self.speak(&format!("Sorry, I didn't understand: {transcript}"));
    }

    /// Queue a request for the engine. It runs after the current dispatch
    /// returns.
    pub fn request(&mut self, request: EngineRequest) {
        debug!(?request, "dispatcher queued request");
        let _ = self.requests.send(EngineInput::Request(request));
    }

    pub(crate) fn spoke(&self) -> bool {
        self.spoke
    }
}

/// Implemented by every screen that reacts to voice commands
pub trait CommandDispatcher: Send {
    /// Screen name, for logs and events
    fn name(&self) -> &str;

    /// Text spoken once, shortly after the screen is mounted
    fn guide(&self, _language: Language) -> Option<String> {
        None
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>);
}

/// Dispatcher backed by a closure
pub struct FnDispatcher<F> {
    name: String,
    guide: Option<String>,
    handler: F,
}

impl<F> FnDispatcher<F>
where
    F: FnMut(&Command, &mut DispatchContext<'_>) + Send,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            guide: None,
            handler,
        }
    }

    pub fn with_guide(mut self, guide: impl Into<String>) -> Self {
        self.guide = Some(guide.into());
        self
    }
}

impl<F> CommandDispatcher for FnDispatcher<F>
where
    F: FnMut(&Command, &mut DispatchContext<'_>) + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn guide(&self, _language: Language) -> Option<String> {
        self.guide.clone()
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        (self.handler)(command, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_tags() {
        assert_eq!(Intent::Action(Action::AddMoney).tag(), "ADD_MONEY");
        assert_eq!(Intent::Unrecognized.tag(), "UNRECOGNIZED");
        assert_eq!(Intent::from(None), Intent::Unrecognized);
        assert_eq!(Intent::from(Some(Action::Logout)).action(), Some(Action::Logout));
    }

    #[test]
    fn test_command_serialization() {
        let cmd = Command::new(Intent::Unrecognized, "purple elephant");
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("UNRECOGNIZED"));
        assert!(json.contains("purple elephant"));

        let cmd = Command::new(Intent::Action(Action::ShowHelp), "help");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["intent"]["ACTION"], "SHOW_HELP");
    }
}
