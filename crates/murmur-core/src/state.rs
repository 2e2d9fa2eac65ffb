//! Session and indicator state types.

/// Lifecycle state of the recording/transcription session.
///
/// A session walks Idle -> Recording -> Processing -> Idle. At most one
/// session is active at any time; a toggle arriving mid-cycle is a state
/// transition, never a second session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture or transcription in flight
    Idle,
    /// Microphone stream open, chunks accumulating
    Recording,
    /// Clip finalized, transcription outstanding
    Processing,
}

/// Visual mode shown in the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Default icon
    Idle,
    /// Recording in progress
    Recording,
    /// Busy animation, carrying the current frame index
    Busy(u8),
}
