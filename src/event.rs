//! Application events for the tao event loop.

use murmur_core::IndicatorState;

/// Events posted onto the tao event loop by the session and spinner
/// threads. Everything with main-thread affinity (tray icon, clipboard,
/// key injection) is handled by the loop on receipt.
#[derive(Debug, Clone)]
pub enum MurmurEvent {
    /// The tray indicator should change state
    SetIcon(IndicatorState),
    /// Place the transcript on the clipboard
    SetClipboard(String),
    /// Send the platform paste chord
    PasteChord,
}
