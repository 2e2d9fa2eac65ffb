//! Global hotkey registration.

use global_hotkey::GlobalHotKeyManager;
use global_hotkey::hotkey::HotKey;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HotkeyError {
    /// The OS rejected the chord (invalid or already bound elsewhere)
    #[error("failed to register hotkey {chord}: {source}")]
    Register {
        chord: String,
        source: global_hotkey::Error,
    },
}

/// A hotkey event belongs to the session only when its id matches the
/// configured chord; after a rebind the old chord's events no longer pass.
pub fn matches_chord(event_id: u32, hotkey: HotKey) -> bool {
    event_id == hotkey.id()
}

/// Owns the OS-level registration for the toggle chord.
///
/// Rebinding never leaves two chords live at once: the old chord is
/// unregistered before the new one is registered, and restored if the new
/// registration fails.
pub struct HotkeyBinding {
    manager: GlobalHotKeyManager,
    current: HotKey,
}

impl HotkeyBinding {
    /// Registers `hotkey` with the OS.
    pub fn register(manager: GlobalHotKeyManager, hotkey: HotKey) -> Result<Self, HotkeyError> {
        manager
            .register(hotkey)
            .map_err(|source| HotkeyError::Register {
                chord: format!("{hotkey:?}"),
                source,
            })?;
        info!(hotkey = ?hotkey, "Global hotkey registered");
        Ok(Self {
            manager,
            current: hotkey,
        })
    }

    /// The chord currently live.
    pub fn current(&self) -> HotKey {
        self.current
    }

    /// Replaces the live chord with `hotkey`. The previous chord stays
    /// active if the new registration fails.
    pub fn rebind(&mut self, hotkey: HotKey) -> Result<(), HotkeyError> {
        if hotkey == self.current {
            return Ok(());
        }
        if let Err(e) = self.manager.unregister(self.current) {
            warn!("Failed to unregister previous hotkey: {e}");
        }
        match self.manager.register(hotkey) {
            Ok(()) => {
                info!(hotkey = ?hotkey, "Global hotkey updated");
                self.current = hotkey;
                Ok(())
            }
            Err(source) => {
                if let Err(e) = self.manager.register(self.current) {
                    warn!("Failed to restore previous hotkey: {e}");
                }
                Err(HotkeyError::Register {
                    chord: format!("{hotkey:?}"),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use global_hotkey::hotkey::{Code, Modifiers};

    use super::*;

    #[test]
    fn chord_filter_follows_the_active_hotkey() {
        let old = HotKey::new(Some(Modifiers::CONTROL), Code::Space);
        let new = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyM);

        let mut active = old;
        assert!(matches_chord(old.id(), active));
        assert!(!matches_chord(new.id(), active));

        active = new;
        assert!(matches_chord(new.id(), active));
        assert!(!matches_chord(old.id(), active));
    }
}
