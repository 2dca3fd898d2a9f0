//! IPC module for daemon-client communication

mod protocol;
mod server;

pub use protocol::{read_frame, write_frame, DaemonStatus, Notification, Request, Response, MAX_FRAME_LEN};
pub use server::Server;
