//! Core utilities shared by the engine crates:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Configuration

mod config;
mod error;
mod frame_clock;
mod logging;

pub use config::{EngineConfig, LoggingSettings, RendererSettings, ShaderSettings, WindowSettings};
pub use error::{Error, Result};
pub use frame_clock::{FrameClock, MAX_FRAME_TIME};
pub use logging::{DEFAULT_LOG_FILTER, init_logging};
