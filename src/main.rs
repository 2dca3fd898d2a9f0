//! savings-voice-daemon: runs the voice engine outside a browser
//!
//! Speech capture is replaced by stdin: each plain line is treated as a
//! spoken transcript, and lines starting with `:` control the engine.
//! Speech output goes to the log. The dashboard screen is mounted at start
//! and navigation effects mount the matching screen; submitted payments
//! update the account the screens read. Clients can drive the same engine
//! over the IPC socket.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use savings_voice::capture::{TextFeed, TextRecognizer};
use savings_voice::config::Config;
use savings_voice::dispatch::{AccountSnapshot, Navigator, Route, UiEffect};
use savings_voice::engine::{EngineOptions, VoiceEngine, VoiceHandle};
use savings_voice::events::{listening_started, log_events};
use savings_voice::grammar::CommandGrammar;
use savings_voice::ipc::Server;
use savings_voice::language::Language;
use savings_voice::lifecycle::ShutdownSignal;
use savings_voice::output::LogSynthesizer;

const DEMO_ACCOUNT: AccountSnapshot = AccountSnapshot {
    total_savings: 12_450,
    reward_points: 320,
    interest_earned: 1250,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "savings-voice-daemon starting");

    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, language = %config.language, "configuration loaded");

    let grammar = match &config.grammar_path {
        Some(path) => CommandGrammar::load_with_file(path)?,
        None => CommandGrammar::builtin().context("failed to build command grammar")?,
    };
    let grammar = Arc::new(grammar);

    let mut shutdown = ShutdownSignal::new()?;

    let (recognizer, feed) = TextRecognizer::new();
    let (engine, handle) = VoiceEngine::new(
        grammar,
        Box::new(recognizer),
        Box::new(LogSynthesizer::new()),
        EngineOptions::from(&config),
    );

    let (effects_tx, effects_rx) = mpsc::unbounded_channel();
    let navigator = Navigator::new(DEMO_ACCOUNT, effects_tx);
    handle.mount(navigator.screen(Route::Dashboard))?;

    let server = Server::new(&config.socket_path, handle.clone())?;

    let events = handle.subscribe();
    let engine_task = tokio::spawn(engine.run());

    info!("daemon initialized, type a command or :help");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                warn!(?e, "IPC server error");
            }
        }

        _ = apply_effects(effects_rx, navigator, handle.clone()) => {
            info!("effect handler exited");
        }

        logged = log_events(events) => {
            info!(logged, "event logger exited");
        }

        result = read_console(handle.clone(), feed) => {
            if let Err(e) = result {
                warn!(?e, "console reader error");
            }
            info!("console closed");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");

    let _ = handle.shutdown();
    if let Err(e) = engine_task.await {
        warn!(?e, "engine task failed");
    }
    server.shutdown().await;

    info!("savings-voice-daemon stopped");

    Ok(())
}

/// Apply screen effects: mount whatever screen the navigator picks
async fn apply_effects(
    mut effects: mpsc::UnboundedReceiver<UiEffect>,
    mut navigator: Navigator,
    handle: VoiceHandle,
) {
    while let Some(effect) = effects.recv().await {
        info!(?effect, "ui effect");
        let Some(screen) = navigator.apply(&effect) else {
            continue;
        };
        if handle.mount(screen).is_err() {
            break;
        }
    }
}

/// Read stdin lines until EOF or `:quit`
async fn read_console(handle: VoiceHandle, feed: TextFeed) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            ":quit" | ":q" => break,
            ":listen" => handle.start_listening()?,
            ":stop" => handle.stop_listening()?,
            ":hush" => handle.stop_speaking()?,
            ":speak" => handle.speak(arg)?,
            ":fail" => {
                if !feed.fail(if arg.is_empty() { "no-speech" } else { arg }) {
                    warn!("not listening");
                }
            }
            ":lang" => match Language::from_code(arg) {
                Some(language) => handle.set_language(language)?,
                None => warn!(code = arg, "unsupported language"),
            },
            ":status" => info!(state = ?handle.state(), "voice state"),
            ":help" => {
                let language = handle.state().language;
                let languages: Vec<String> = handle
                    .grammar()
                    .languages()
                    .map(|l| format!("{l} ({})", l.native_name()))
                    .collect();
                info!(?languages, "languages");
                for rule in handle.commands(language) {
                    info!(action = %rule.action, phrases = ?rule.phrases, "{}", rule.description);
                }
                info!("controls: :listen :stop :hush :speak <text> :lang <code> :fail <code> :status :quit");
            }
            _ if command.starts_with(':') => warn!(command, "unknown control"),
            _ => say(&handle, &feed, line).await?,
        }
    }

    Ok(())
}

/// Speak a line into the recognizer, opening a session first if needed
async fn say(handle: &VoiceHandle, feed: &TextFeed, text: &str) -> Result<()> {
    if !feed.is_listening() {
        let mut events = handle.subscribe();
        handle.start_listening()?;

        if listening_started(&mut events, Duration::from_secs(1)).await.is_none() {
            warn!("capture session did not start");
            return Ok(());
        }
    }

    feed.say(text);
    Ok(())
}
