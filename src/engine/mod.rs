//! Voice engine: state machine, published state and the consumer handle

mod handle;
mod machine;
mod state;

pub use handle::{EngineInput, EngineRequest, VoiceHandle};
pub use machine::{EngineOptions, VoiceEngine};
pub use state::{Phase, VoiceState};
