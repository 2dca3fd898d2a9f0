//! Unix domain socket server for IPC
//!
//! Provides request-response access to a [`VoiceHandle`] and pushes voice
//! events to subscribed clients.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::engine::VoiceHandle;
use crate::error::VoiceError;
use crate::events::VoiceEvent;
use crate::language::Language;

use super::protocol::{read_frame, write_frame, DaemonStatus, Notification, Request, Response};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    handle: VoiceHandle,
    start_time: Instant,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind the socket, replacing a stale one
    pub fn new(socket_path: &Path, handle: VoiceHandle) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            handle,
            start_time: Instant::now(),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let handle = self.handle.clone();
                    let start_time = self.start_time;
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = handle_client(stream, handle, start_time) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Serve a single client. Requests are read on a separate task so pushed
/// notifications never interrupt a partially read frame.
async fn handle_client(stream: UnixStream, handle: VoiceHandle, start_time: Instant) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let (request_tx, mut request_rx) = mpsc::channel(8);
    let reader_task = tokio::spawn(read_requests(reader, request_tx));

    let mut events: Option<broadcast::Receiver<VoiceEvent>> = None;

    let result = loop {
        tokio::select! {
            request = request_rx.recv() => {
                let Some(request) = request else {
                    debug!("client disconnected");
                    break Ok(());
                };

                let response = match request {
                    Ok(request) => {
                        debug!(?request, "received request");
                        let subscribe = matches!(request, Request::Subscribe);
                        let response = process_request(request, &handle, start_time);
                        if subscribe && events.is_none() {
                            events = Some(handle.subscribe());
                            debug!("client subscribed to notifications");
                        }
                        response
                    }
                    Err(message) => Response::error("bad_request", message),
                };

                if let Err(e) = write_frame(&mut writer, &response).await {
                    break Err(e);
                }
            }
            event = next_event(&mut events) => match event {
                Ok(event) => {
                    let notification = Notification::VoiceEvent { event };
                    if let Err(e) = write_frame(&mut writer, &notification).await {
                        break Err(e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("event channel closed");
                    events = None;
                }
            }
        }
    };

    reader_task.abort();
    result
}

async fn read_requests(
    mut reader: OwnedReadHalf,
    tx: mpsc::Sender<Result<Request, String>>,
) -> Result<()> {
    while let Some(body) = read_frame(&mut reader).await? {
        let request = serde_json::from_slice::<Request>(&body).map_err(|e| {
            warn!(%e, "failed to parse request");
            e.to_string()
        });
        if tx.send(request).await.is_err() {
            break;
        }
    }
    Ok(())
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<VoiceEvent>>,
) -> Result<VoiceEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn parse_language(code: &str) -> Result<Language, Response> {
    Language::from_code(code)
        .ok_or_else(|| Response::error("unknown_language", format!("unsupported language code: {code}")))
}

fn accepted(result: Result<(), VoiceError>) -> Response {
    match result {
        Ok(()) => Response::Accepted,
        Err(e) => Response::error("engine_closed", e.to_string()),
    }
}

/// Process a request and return a response
fn process_request(request: Request, handle: &VoiceHandle, start_time: Instant) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::GetStatus => Response::Status(DaemonStatus::new(
            handle.state(),
            start_time.elapsed().as_secs(),
        )),

        Request::StartListening => accepted(handle.start_listening()),

        Request::StopListening => accepted(handle.stop_listening()),

        Request::Speak { text, language } => match language.as_deref().map(parse_language) {
            None => accepted(handle.speak(text)),
            Some(Ok(language)) => accepted(handle.speak_in(text, language)),
            Some(Err(response)) => response,
        },

        Request::StopSpeaking => accepted(handle.stop_speaking()),

        Request::SetLanguage { language } => match parse_language(&language) {
            Ok(language) => {
                info!(%language, "language change requested via IPC");
                accepted(handle.set_language(language))
            }
            Err(response) => response,
        },

        Request::ListCommands { language } => {
            let language = match language.as_deref().map(parse_language) {
                None => handle.state().language,
                Some(Ok(language)) => language,
                Some(Err(response)) => return response,
            };
            Response::Commands {
                language,
                commands: handle.commands(language).to_vec(),
            }
        }

        Request::Subscribe => Response::Subscribed,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::capture::CaptureEvent;
    use crate::capture::RecognitionResult;
    use crate::engine::{EngineOptions, VoiceEngine};
    use crate::grammar::{Action, CommandGrammar};
    use crate::test_support::{RecordingSynthesizer, ScriptedRecognizer};

    async fn call(stream: &mut UnixStream, request: &Request) -> Response {
        write_frame(stream, request).await.unwrap();
        let body = read_frame(stream).await.unwrap().unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_requests_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("voice.sock");

        let grammar = Arc::new(CommandGrammar::builtin().unwrap());
        let (recognizer, mic) = ScriptedRecognizer::new();
        let (engine, handle) = VoiceEngine::new(
            grammar,
            Box::new(recognizer),
            Box::new(RecordingSynthesizer::new()),
            EngineOptions::default(),
        );
        let engine_task = tokio::spawn(engine.run());

        let server = Arc::new(Server::new(&socket_path, handle.clone()).unwrap());
        let server_task = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.run().await }
        });

        let mut stream = UnixStream::connect(&socket_path).await.unwrap();
        assert_eq!(call(&mut stream, &Request::Ping).await, Response::Pong);

        let resp = call(
            &mut stream,
            &Request::ListCommands {
                language: Some("hi-IN".into()),
            },
        )
        .await;
        match resp {
            Response::Commands { language, commands } => {
                assert_eq!(language, Language::Hi);
                assert_eq!(commands.len(), 13);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let resp = call(
            &mut stream,
            &Request::SetLanguage {
                language: "fr".into(),
            },
        )
        .await;
        assert!(matches!(resp, Response::Error { ref code, .. } if code == "unknown_language"));

        assert_eq!(call(&mut stream, &Request::Subscribe).await, Response::Subscribed);
        assert_eq!(call(&mut stream, &Request::StartListening).await, Response::Accepted);

        // ListeningStarted arrives as a push notification
        let body = read_frame(&mut stream).await.unwrap().unwrap();
        let note: Notification = serde_json::from_slice(&body).unwrap();
        assert!(matches!(
            note,
            Notification::VoiceEvent {
                event: VoiceEvent::ListeningStarted { .. }
            }
        ));

        mic.emit(CaptureEvent::Result(vec![RecognitionResult::final_text("show rewards")]));
        mic.emit(CaptureEvent::Ended);

        let mut recognized = None;
        while recognized.is_none() {
            let body = read_frame(&mut stream).await.unwrap().unwrap();
            let Notification::VoiceEvent { event } =
                serde_json::from_slice::<Notification>(&body).unwrap();
            if let VoiceEvent::CommandRecognized { action, .. } = event {
                recognized = Some(action);
            }
        }
        assert_eq!(recognized, Some(Action::ShowRewards));

        handle.shutdown().unwrap();
        engine_task.await.unwrap();
        server.shutdown().await;
        server_task.abort();
        assert!(!socket_path.exists());
    }
}
