//! Audible cue on recording start.
//!
//! Fire-and-forget: the sound plays on a throwaway thread and failures are
//! ignored. Each platform uses whatever short system sound is at hand.

/// Plays a short start cue without blocking the caller.
pub fn play_start_cue() {
    std::thread::spawn(play_blocking);
}

#[cfg(target_os = "macos")]
fn play_blocking() {
    let _ = std::process::Command::new("afplay")
        .arg("/System/Library/Sounds/Tink.aiff")
        .status();
}

#[cfg(target_os = "windows")]
fn play_blocking() {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x08000000;

    let _ = std::process::Command::new("powershell")
        .args(["-c", "[console]::beep(440, 150)"])
        .creation_flags(CREATE_NO_WINDOW)
        .status();
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn play_blocking() {
    let _ = std::process::Command::new("paplay")
        .arg("/usr/share/sounds/freedesktop/stereo/audio-volume-change.oga")
        .status();
}
