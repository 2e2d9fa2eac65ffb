use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use arboard::Clipboard;
use enigo::Enigo;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use murmur::event::MurmurEvent;
use murmur::hotkey::{self, HotkeyBinding};
use murmur::notify::NotificationLayer;
use murmur::session::{Chime, Indicator, Microphone, SessionController, TextOutput, Transcribe};
use murmur::{
    CaptureHandle, Clip, Config, ConfigManager, DEFAULT_LOG_LEVEL, GroqClient, GroqConfig,
    IndicatorState, Recorder, SessionState, Transcriber, VERSION, cue, icon,
};
use parking_lot::{Mutex, RwLock};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tray_icon::menu::{AboutMetadataBuilder, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIconBuilder, TrayIconEvent};

fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MURMUR_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .finish()
        .with(NotificationLayer::new())
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = Arc::new(RwLock::new(config_manager.load()?));
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config.read())?;

    // Set up hotkey
    let hotkey_manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
    let mut hotkey_binding = HotkeyBinding::register(hotkey_manager, config.read().hotkey())
        .context("Failed to register hotkey")?;

    // Set up keyboard and clipboard interaction
    let mut enigo = Enigo::new(&enigo::Settings::default())
        .map_err(|e| anyhow!("failed to initialize key injection: {e}"))?;
    let mut clipboard = Clipboard::new()?;

    // Create the tray menu
    let tray_menu = Menu::new();
    let icon_quit = MenuItem::new("Quit", true, None);
    let icon_reload = MenuItem::new("Reload settings", true, None);
    let icon_copy_config = MenuItem::new("Copy config path", true, None);
    tray_menu.append_items(&[
        // the name of the app
        &MenuItem::new("Murmur", false, None),
        &PredefinedMenuItem::separator(),
        &PredefinedMenuItem::about(
            None,
            Some(
                AboutMetadataBuilder::new()
                    .version(Some(VERSION.to_owned()))
                    .build(),
            ),
        ),
        &icon_reload,
        &icon_copy_config,
        &PredefinedMenuItem::separator(),
        &icon_quit,
    ])?;

    // Set up the event loop
    let mut icon_tray = None;

    let menu_channel = MenuEvent::receiver();
    let tray_channel = TrayIconEvent::receiver();

    let event_loop: EventLoop<MurmurEvent> = EventLoopBuilder::with_user_event().build();
    let event_sender = event_loop.create_proxy();

    // Session worker: owns the microphone and blocks through each
    // transcription while the spinner repaints through the proxy.
    spawn_session_thread(config.clone(), event_sender)?;

    let mut pending_restore: Option<String> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::NewEvents(StartCause::Init) = event {
            // We create the icon once the event loop is actually running
            // to prevent issues like https://github.com/tauri-apps/tray-icon/issues/90

            icon_tray.replace(
                TrayIconBuilder::new()
                    .with_menu(Box::new(tray_menu.clone()))
                    .with_tooltip("murmur - hotkey dictation")
                    .with_icon(icon::icon_for(IndicatorState::Idle))
                    .build()
                    .unwrap(),
            );

            // We have to request a redraw here to have the icon actually show up.
            // Tao only exposes a redraw method on the Window so we use core-foundation directly.
            #[cfg(target_os = "macos")]
            unsafe {
                use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};

                let rl = CFRunLoopGetMain();
                CFRunLoopWakeUp(rl);
            }

            info!("Murmur ready, listening for {:?}", config.read().hotkey());
        }

        if let Ok(event) = menu_channel.try_recv() {
            if event.id == icon_quit.id() {
                icon_tray.take();
                *control_flow = ControlFlow::Exit;
            } else if event.id == icon_copy_config.id() {
                if let Err(e) =
                    clipboard.set_text(config_manager.config_path().to_string_lossy().into_owned())
                {
                    error!("Failed to copy config path to clipboard: {}", e);
                }
            } else if event.id == icon_reload.id() {
                reload_settings(&config_manager, &config, &mut hotkey_binding);
            }
        }

        #[expect(clippy::redundant_pattern_matching)]
        if let Ok(_) = tray_channel.try_recv() {
            // Handle tray icon events
        }

        // Handle user provided events
        if let Event::UserEvent(event) = event {
            match event {
                MurmurEvent::SetIcon(state) => {
                    icon_tray
                        .as_ref()
                        .map(|i| i.set_icon(Some(icon::icon_for(state))));
                }
                MurmurEvent::SetClipboard(text) => {
                    let config = config.read();
                    let restore = config.auto_paste() && config.restore_clipboard();
                    pending_restore = if restore {
                        match clipboard.get_text() {
                            Ok(previous) => Some(previous),
                            Err(e) => {
                                warn!("Failed to get clipboard text: {}", e);
                                None
                            }
                        }
                    } else {
                        None
                    };

                    if let Err(e) = clipboard.set_text(&text) {
                        warn!("Failed to set clipboard text: {}", e);
                    }
                }
                MurmurEvent::PasteChord => {
                    if config.read().auto_paste() {
                        if let Err(e) = paste(&mut enigo) {
                            warn!("Failed to paste transcription: {}", e);
                        }
                        if let Some(previous) = pending_restore.take() {
                            // Restore the previous clipboard contents
                            if let Err(e) = clipboard.set_text(&previous) {
                                warn!("Failed to restore clipboard text: {}", e);
                            }
                        }
                    }
                }
            };
        }
    });
}

/// Sends indicator changes onto the event loop. Shared with the spinner
/// thread, so the proxy sits behind a mutex.
struct ProxyIndicator(Mutex<EventLoopProxy<MurmurEvent>>);

impl ProxyIndicator {
    fn new(proxy: EventLoopProxy<MurmurEvent>) -> Self {
        Self(Mutex::new(proxy))
    }
}

impl Indicator for ProxyIndicator {
    fn set(&self, state: IndicatorState) {
        self.0.lock().send_event(MurmurEvent::SetIcon(state)).ok();
    }
}

/// Hands the paste side effect to the event loop thread.
struct ProxyOutput(EventLoopProxy<MurmurEvent>);

impl TextOutput for ProxyOutput {
    fn set_clipboard_text(&self, text: &str) {
        self.0
            .send_event(MurmurEvent::SetClipboard(text.to_owned()))
            .ok();
    }

    fn send_paste_chord(&self) {
        self.0.send_event(MurmurEvent::PasteChord).ok();
    }
}

/// Microphone backed by the default cpal input device.
struct LiveMicrophone {
    recorder: Recorder,
    active: Option<CaptureHandle>,
}

impl Microphone for LiveMicrophone {
    fn start(&mut self) -> Result<()> {
        if self.active.is_some() {
            anyhow::bail!("capture already active");
        }
        self.active = Some(self.recorder.start()?);
        Ok(())
    }

    fn stop(&mut self) -> Result<Option<Clip>> {
        match self.active.take() {
            Some(handle) => Ok(handle.finish()?),
            None => Ok(None),
        }
    }
}

/// Blocks the session thread on the async Groq client. The client is
/// rebuilt per call so a settings reload takes effect on the next cycle.
struct RemoteTranscriber {
    runtime: tokio::runtime::Runtime,
    config: Arc<RwLock<Config>>,
}

impl Transcribe for RemoteTranscriber {
    fn transcribe(&self, clip: Clip) -> Result<String> {
        let (client_config, language) = {
            let config = self.config.read();
            (
                GroqConfig {
                    api_key: config.groq_key().map(str::to_owned),
                    model: config.model().map(str::to_owned),
                },
                config.language().map(str::to_owned),
            )
        };
        let client = GroqClient::new(client_config);

        let before = Instant::now();
        let text = self
            .runtime
            .block_on(client.transcribe(clip.data(), language.as_deref()))?;
        info!(
            backend = client.name(),
            duration = ?before.elapsed(),
            "transcription completed"
        );
        Ok(text)
    }
}

struct SystemChime;

impl Chime for SystemChime {
    fn play_start_cue(&self) {
        cue::play_start_cue();
    }
}

fn spawn_session_thread(
    config: Arc<RwLock<Config>>,
    event_sender: EventLoopProxy<MurmurEvent>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let indicator: Arc<dyn Indicator> = Arc::new(ProxyIndicator::new(event_sender.clone()));
    let transcriber = RemoteTranscriber {
        runtime,
        config: config.clone(),
    };
    let output = ProxyOutput(event_sender);

    std::thread::Builder::new()
        .name("session".into())
        .spawn(move || {
            // The cpal stream handle is not Send, so the microphone lives on
            // the thread that owns the session.
            let mic = LiveMicrophone {
                recorder: Recorder::new(),
                active: None,
            };
            let mut controller =
                SessionController::new(mic, transcriber, indicator, output, SystemChime);

            let hotkey_channel = GlobalHotKeyEvent::receiver();
            while let Ok(event) = hotkey_channel.recv() {
                if !hotkey::matches_chord(event.id(), config.read().hotkey())
                    || event.state() != HotKeyState::Pressed
                {
                    continue;
                }
                controller.toggle();
                if controller.state() == SessionState::Idle {
                    // Toggles that queued while the cycle was completing are
                    // stale; drop them rather than replaying them.
                    while hotkey_channel.try_recv().is_ok() {}
                }
            }
        })
        .context("Failed to spawn session thread")?;

    Ok(())
}

fn reload_settings(
    config_manager: &ConfigManager,
    config: &Arc<RwLock<Config>>,
    hotkey_binding: &mut HotkeyBinding,
) {
    let mut loaded = match config_manager.load() {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to reload settings: {e:?}");
            return;
        }
    };

    if let Err(e) = hotkey_binding.rebind(loaded.hotkey()) {
        // The previous chord stays live; keep the stored config pointing at
        // it so the session thread filters on what is actually registered.
        error!("Failed to update hotkey: {e}");
        loaded.set_hotkey(hotkey_binding.current());
    }

    *config.write() = loaded;
    info!("Settings reloaded");
}

fn paste(enigo: &mut Enigo) -> Result<()> {
    use enigo::Direction::{Click, Press, Release};
    use enigo::{Key, Keyboard};

    #[cfg(target_os = "macos")]
    let paste_modifier = Key::Meta;
    #[cfg(not(target_os = "macos"))]
    let paste_modifier = Key::Control;

    const SLEEP_TIME: Duration = Duration::from_millis(10);
    enigo.key(paste_modifier, Press)?;
    sleep(SLEEP_TIME);
    enigo.key(Key::Unicode('v'), Click)?;
    sleep(SLEEP_TIME);
    enigo.key(paste_modifier, Release)?;

    Ok(())
}
