//! The recording/transcription session state machine.
//!
//! One controller owns the whole toggle lifecycle: Idle -> Recording ->
//! Processing -> Idle. Collaborators are injected as traits so the machine
//! can be driven by stubs in tests and by the real device, network, and tray
//! implementations in the binary. Every failure is absorbed here; nothing
//! may crash the thread that listens for hotkeys.

use std::sync::Arc;

use murmur_audio::Clip;
use murmur_core::{IndicatorState, SessionState};
use tracing::{error, info, warn};

use crate::spinner::Spinner;

/// Microphone capture collaborator.
pub trait Microphone {
    /// Opens the input stream and begins accumulating chunks.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Stops the stream, drains in-flight chunks, and returns the finalized
    /// clip, or `None` when nothing was captured.
    fn stop(&mut self) -> anyhow::Result<Option<Clip>>;
}

/// Remote transcription collaborator. Blocking from the controller's view;
/// the spinner keeps the tray alive while a call is outstanding.
pub trait Transcribe {
    fn transcribe(&self, clip: Clip) -> anyhow::Result<String>;
}

/// Tray indicator collaborator. Implementations must be callable from any
/// thread; the spinner drives this from its own loop.
pub trait Indicator: Send + Sync {
    fn set(&self, state: IndicatorState);
}

/// Clipboard/paste collaborator. Both calls are fire-and-forget.
pub trait TextOutput {
    fn set_clipboard_text(&self, text: &str);
    fn send_paste_chord(&self);
}

/// Start-cue collaborator.
pub trait Chime {
    fn play_start_cue(&self);
}

/// The toggle state machine. At most one session is active at any time; a
/// toggle arriving mid-cycle is a transition, never a second session.
pub struct SessionController<M, T, O, C> {
    state: SessionState,
    mic: M,
    transcriber: T,
    indicator: Arc<dyn Indicator>,
    output: O,
    chime: C,
}

impl<M, T, O, C> SessionController<M, T, O, C>
where
    M: Microphone,
    T: Transcribe,
    O: TextOutput,
    C: Chime,
{
    pub fn new(mic: M, transcriber: T, indicator: Arc<dyn Indicator>, output: O, chime: C) -> Self {
        Self {
            state: SessionState::Idle,
            mic,
            transcriber,
            indicator,
            output,
            chime,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handles one toggle event. From Idle this starts a recording; from
    /// Recording it runs the rest of the cycle to completion before
    /// returning, so the caller never observes Processing between calls.
    pub fn toggle(&mut self) {
        match self.state {
            SessionState::Idle => self.start_recording(),
            SessionState::Recording => self.finish_and_transcribe(),
            // Not reachable from the hotkey thread (the controller blocks
            // through Processing); guards against stray events regardless.
            SessionState::Processing => warn!("toggle ignored while processing"),
        }
    }

    fn start_recording(&mut self) {
        self.chime.play_start_cue();
        self.indicator.set(IndicatorState::Recording);
        match self.mic.start() {
            Ok(()) => self.state = SessionState::Recording,
            Err(e) => {
                error!("Failed to start recording: {e:?}");
                self.indicator.set(IndicatorState::Idle);
            }
        }
    }

    fn finish_and_transcribe(&mut self) {
        self.state = SessionState::Processing;

        let clip = match self.mic.stop() {
            Ok(clip) => clip,
            Err(e) => {
                error!("Failed to finish recording: {e:?}");
                None
            }
        };

        match clip {
            Some(clip) => {
                let spinner = Spinner::start(self.indicator.clone());
                let result = self.transcriber.transcribe(clip);
                // Stopped on every path so the tray never sticks on busy.
                spinner.stop();

                match result {
                    Ok(text) if !text.trim().is_empty() => {
                        info!(chars = text.len(), "Transcript ready");
                        self.output.set_clipboard_text(&text);
                        self.output.send_paste_chord();
                    }
                    Ok(_) => info!("No transcript received."),
                    Err(e) => warn!("Transcription failed: {e:?}"),
                }
            }
            None => info!("No audio to process."),
        }

        self.indicator.set(IndicatorState::Idle);
        self.state = SessionState::Idle;
    }

    #[cfg(test)]
    fn force_state(&mut self, state: SessionState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread::sleep;
    use std::time::Duration;

    use super::*;

    fn test_clip() -> Clip {
        Clip::from_mono_samples(&[0.25; 512]).unwrap()
    }

    #[derive(Clone, Default)]
    struct StubMic {
        next_clip: Arc<Mutex<Option<Clip>>>,
        fail_start: bool,
        starts: Arc<Mutex<usize>>,
    }

    impl Microphone for StubMic {
        fn start(&mut self) -> anyhow::Result<()> {
            *self.starts.lock().unwrap() += 1;
            if self.fail_start {
                anyhow::bail!("no input device available");
            }
            Ok(())
        }

        fn stop(&mut self) -> anyhow::Result<Option<Clip>> {
            Ok(self.next_clip.lock().unwrap().take())
        }
    }

    #[derive(Clone)]
    enum Script {
        Text(&'static str),
        Fail,
    }

    #[derive(Clone)]
    struct StubTranscriber {
        script: Script,
        calls: Arc<Mutex<usize>>,
    }

    impl StubTranscriber {
        fn returning(text: &'static str) -> Self {
            Self {
                script: Script::Text(text),
                calls: Arc::default(),
            }
        }

        fn failing() -> Self {
            Self {
                script: Script::Fail,
                calls: Arc::default(),
            }
        }
    }

    impl Transcribe for StubTranscriber {
        fn transcribe(&self, _clip: Clip) -> anyhow::Result<String> {
            *self.calls.lock().unwrap() += 1;
            match self.script {
                Script::Text(text) => Ok(text.to_owned()),
                Script::Fail => anyhow::bail!("transcription backend unreachable"),
            }
        }
    }

    #[derive(Default)]
    struct StateLog(Mutex<Vec<IndicatorState>>);

    impl Indicator for StateLog {
        fn set(&self, state: IndicatorState) {
            self.0.lock().unwrap().push(state);
        }
    }

    #[derive(Clone, Default)]
    struct StubOutput {
        clipboard: Arc<Mutex<Vec<String>>>,
        chords: Arc<Mutex<usize>>,
    }

    impl TextOutput for StubOutput {
        fn set_clipboard_text(&self, text: &str) {
            self.clipboard.lock().unwrap().push(text.to_owned());
        }

        fn send_paste_chord(&self) {
            *self.chords.lock().unwrap() += 1;
        }
    }

    #[derive(Clone, Default)]
    struct StubChime {
        cues: Arc<Mutex<usize>>,
    }

    impl Chime for StubChime {
        fn play_start_cue(&self) {
            *self.cues.lock().unwrap() += 1;
        }
    }

    struct Harness {
        mic: StubMic,
        transcriber: StubTranscriber,
        indicator: Arc<StateLog>,
        output: StubOutput,
        chime: StubChime,
        controller: SessionController<StubMic, StubTranscriber, StubOutput, StubChime>,
    }

    fn harness(mic: StubMic, transcriber: StubTranscriber) -> Harness {
        let indicator = Arc::new(StateLog::default());
        let output = StubOutput::default();
        let chime = StubChime::default();
        let controller = SessionController::new(
            mic.clone(),
            transcriber.clone(),
            indicator.clone(),
            output.clone(),
            chime.clone(),
        );
        Harness {
            mic,
            transcriber,
            indicator,
            output,
            chime,
            controller,
        }
    }

    #[test]
    fn toggle_walks_the_full_session_cycle() {
        let mic = StubMic::default();
        *mic.next_clip.lock().unwrap() = Some(test_clip());
        let mut h = harness(mic, StubTranscriber::returning("hello there"));

        assert_eq!(h.controller.state(), SessionState::Idle);
        h.controller.toggle();
        assert_eq!(h.controller.state(), SessionState::Recording);
        h.controller.toggle();
        assert_eq!(h.controller.state(), SessionState::Idle);

        assert_eq!(*h.mic.starts.lock().unwrap(), 1);
        assert_eq!(*h.transcriber.calls.lock().unwrap(), 1);
        assert_eq!(*h.chime.cues.lock().unwrap(), 1);

        let states = h.indicator.0.lock().unwrap();
        assert_eq!(states.first(), Some(&IndicatorState::Recording));
        assert_eq!(states.last(), Some(&IndicatorState::Idle));
        assert!(states.iter().any(|s| matches!(s, IndicatorState::Busy(_))));
    }

    #[test]
    fn empty_capture_skips_transcription() {
        let mut h = harness(StubMic::default(), StubTranscriber::returning("never seen"));

        h.controller.toggle();
        h.controller.toggle();

        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(*h.transcriber.calls.lock().unwrap(), 0);
        assert!(h.output.clipboard.lock().unwrap().is_empty());

        let states = h.indicator.0.lock().unwrap();
        assert!(states.iter().all(|s| !matches!(s, IndicatorState::Busy(_))));
        assert_eq!(states.last(), Some(&IndicatorState::Idle));
    }

    #[test]
    fn non_empty_transcript_is_pasted_exactly_once() {
        let mic = StubMic::default();
        *mic.next_clip.lock().unwrap() = Some(test_clip());
        let mut h = harness(mic, StubTranscriber::returning("the quick brown fox"));

        h.controller.toggle();
        h.controller.toggle();

        assert_eq!(
            *h.output.clipboard.lock().unwrap(),
            vec!["the quick brown fox".to_owned()]
        );
        assert_eq!(*h.output.chords.lock().unwrap(), 1);
    }

    #[test]
    fn empty_transcript_is_not_pasted() {
        let mic = StubMic::default();
        *mic.next_clip.lock().unwrap() = Some(test_clip());
        let mut h = harness(mic, StubTranscriber::returning("  "));

        h.controller.toggle();
        h.controller.toggle();

        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(*h.transcriber.calls.lock().unwrap(), 1);
        assert!(h.output.clipboard.lock().unwrap().is_empty());
        assert_eq!(*h.output.chords.lock().unwrap(), 0);
    }

    #[test]
    fn failed_transcription_is_absorbed() {
        let mic = StubMic::default();
        *mic.next_clip.lock().unwrap() = Some(test_clip());
        let mut h = harness(mic, StubTranscriber::failing());

        h.controller.toggle();
        h.controller.toggle();

        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(*h.transcriber.calls.lock().unwrap(), 1);
        assert!(h.output.clipboard.lock().unwrap().is_empty());
        assert_eq!(*h.output.chords.lock().unwrap(), 0);

        let states = h.indicator.0.lock().unwrap();
        assert_eq!(states.last(), Some(&IndicatorState::Idle));
    }

    #[test]
    fn device_failure_falls_back_to_idle() {
        let mic = StubMic {
            fail_start: true,
            ..StubMic::default()
        };
        let mut h = harness(mic, StubTranscriber::returning("unused"));

        h.controller.toggle();
        assert_eq!(h.controller.state(), SessionState::Idle);
        {
            let states = h.indicator.0.lock().unwrap();
            assert_eq!(states.last(), Some(&IndicatorState::Idle));
        }

        // The listener keeps working: a later toggle starts a new attempt.
        h.controller.toggle();
        assert_eq!(*h.mic.starts.lock().unwrap(), 2);
    }

    #[test]
    fn toggle_is_ignored_while_processing() {
        let mut h = harness(StubMic::default(), StubTranscriber::returning("unused"));

        h.controller.force_state(SessionState::Processing);
        h.controller.toggle();

        assert_eq!(h.controller.state(), SessionState::Processing);
        assert_eq!(*h.mic.starts.lock().unwrap(), 0);
        assert_eq!(*h.transcriber.calls.lock().unwrap(), 0);
    }

    #[test]
    fn spinner_is_stopped_after_the_cycle() {
        let mic = StubMic::default();
        *mic.next_clip.lock().unwrap() = Some(test_clip());
        let mut h = harness(mic, StubTranscriber::failing());

        h.controller.toggle();
        h.controller.toggle();

        // The spinner thread is joined before toggle returns, so no frame
        // can arrive afterwards.
        let frames = h.indicator.0.lock().unwrap().len();
        sleep(Duration::from_millis(350));
        assert_eq!(h.indicator.0.lock().unwrap().len(), frames);
    }
}
