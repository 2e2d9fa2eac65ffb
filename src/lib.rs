// Re-export from sub-crates
pub use murmur_audio::{CaptureHandle, Clip, Recorder, RecorderError};
pub use murmur_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, DEFAULT_LOG_LEVEL, IndicatorState,
    SessionState,
};
pub use murmur_transcribe::{GroqClient, GroqConfig, TranscribeError, Transcriber};

// App-specific modules
pub mod cue;
pub mod event;
pub mod hotkey;
pub mod icon;
pub mod notify;
pub mod session;
pub mod spinner;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
