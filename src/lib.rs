// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

//! A prize wheel widget: labeled slices, an eased spin to a random slice,
//! exact landing under a fixed pointer, and a persisted one-spin gate that
//! a "Spin again" landing re-opens.
//!
//! ```no_run
//! use prize_wheel::{MemoryStore, PrizeWheel, WheelConfig};
//!
//! let config = WheelConfig::builder().build();
//! let wheel = PrizeWheel::new(config, MemoryStore::new(), rand::rng())?;
//! wheel.show()?;
//! # Ok::<(), prize_wheel::WheelError>(())
//! ```

pub mod config;
pub mod error;
pub mod panel;
pub mod random;
pub mod render;
pub mod spin;
pub mod store;
pub mod wheel;

// External crate imports
use bon::Builder;
use pixels::{Pixels, SurfaceTexture};
use tracing::{error, info, warn};

// Standard library imports
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

pub use config::{Color, Settings, WheelStyle, WindowConfig, DEFAULT_SLICES};
pub use error::{Result, WheelError};
pub use panel::Panel;
pub use random::{spin_rng, SpinRandom};
pub use render::{Canvas, Layout, RenderSurface, Scene, SceneSurface};
pub use spin::{SpinEngine, SpinOutcome, SpinPlan, SpinRejected, SpinStep, SpinTuning};
pub use store::{FileStore, KeyValueStore, LockGate, MemoryStore, DEFAULT_LOCK_KEY};
pub use wheel::{Slice, Wheel, POINTER_ANGLE, SPIN_AGAIN_LABEL};

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

#[derive(Debug, Clone, Builder)]
pub struct WheelConfig {
    #[builder(default = DEFAULT_SLICES.iter().map(|s| s.to_string()).collect())]
    pub slices: Vec<String>,
    #[builder(default = DEFAULT_LOCK_KEY.to_string())]
    pub storage_key: String,
    #[builder(default)]
    pub tuning: SpinTuning,
    #[builder(default)]
    pub style: WheelStyle,
    #[builder(default)]
    pub window: WindowConfig,
    /// Label font; common system fonts are tried when unset.
    pub font_path: Option<PathBuf>,
}

impl WheelConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        WheelConfig::builder()
            .slices(settings.wheel.slices.clone())
            .storage_key(settings.wheel.storage_key.clone())
            .tuning(SpinTuning::from(&settings.spin))
            .style(settings.style.clone())
            .window(settings.window.clone())
            .maybe_font_path(settings.wheel.font_path.clone())
            .build()
    }
}

/// Main widget - owns the spin engine and hosts it in a window.
pub struct PrizeWheel<S, R> {
    config: WheelConfig,
    engine: SpinEngine<S, R>,
}

impl<S: KeyValueStore, R: SpinRandom> PrizeWheel<S, R> {
    /// Fails with [`WheelError::Configuration`] when no slices are given, the
    /// spin ranges are unusable or the window cannot be paced.
    pub fn new(config: WheelConfig, store: S, rng: R) -> Result<Self> {
        config.window.validate()?;
        let wheel = Wheel::from_labels(config.slices.iter().cloned())?;
        let gate = LockGate::new(store, config.storage_key.clone());
        let engine = SpinEngine::new(wheel, config.tuning.clone(), gate, rng)?;
        Ok(Self { config, engine })
    }

    pub fn engine(&self) -> &SpinEngine<S, R> {
        &self.engine
    }

    /// Clear the persisted lock before showing the wheel.
    pub fn unlock(&mut self) {
        self.engine.unlock();
    }

    /// Open the window and run until it is closed.
    pub fn show(self) -> Result<()> {
        let PrizeWheel { config, engine } = self;
        let font = match render::load_font(config.font_path.as_deref()) {
            Ok(font) => font,
            Err(e) => {
                warn!("{}; labels will not be drawn", e);
                None
            }
        };

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(
                config.window.width as f64,
                config.window.height as f64,
            ))
            .with_min_inner_size(LogicalSize::new(320.0, 480.0))
            .with_resizable(true)
            .build(&event_loop)?;
        let window = Arc::new(window);

        let window_clone = window.clone();
        let size = window.inner_size();
        let mut layout = Layout::new(
            size.width as usize,
            size.height as usize,
            window.scale_factor(),
        );
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let frame_duration = Duration::from_secs_f64(1.0 / config.window.max_framerate);
        let mut last_frame = Instant::now();
        let mut cursor: Option<(f64, f64)> = None;
        let mut app = AppState::new(engine);

        info!(
            slices = app.engine.wheel().len(),
            locked = app.engine.is_locked(),
            "wheel ready"
        );

        event_loop.run(move |event, window_target| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app.cancel();
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    let resized = pixels
                        .resize_buffer(new_size.width, new_size.height)
                        .and_then(|_| pixels.resize_surface(new_size.width, new_size.height));
                    if let Err(e) = resized {
                        error!("{}", WheelError::from(e));
                        app.cancel();
                        window_target.exit();
                        return;
                    }
                    layout = Layout::new(
                        new_size.width as usize,
                        new_size.height as usize,
                        window_clone.scale_factor(),
                    );
                    window_clone.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    layout = Layout::new(layout.width, layout.height, scale_factor);
                    window_clone.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = Some((position.x, position.y));
                }
                WindowEvent::CursorLeft { .. } => cursor = None,
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    let on_trigger = cursor
                        .is_some_and(|(x, y)| layout.hits_button(x, y) || layout.hits_wheel(x, y));
                    if on_trigger && app.request_spin(Instant::now()) {
                        window_clone.request_redraw();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let activate = matches!(
                        event.logical_key,
                        Key::Named(NamedKey::Enter) | Key::Named(NamedKey::Space)
                    );
                    if activate
                        && event.state == ElementState::Pressed
                        && !event.repeat
                        && app.request_spin(Instant::now())
                    {
                        window_clone.request_redraw();
                    }
                }
                WindowEvent::RedrawRequested => {
                    app.update(Instant::now());

                    let scene = app.scene(layout, &config.style);
                    let mut canvas = Canvas::new(pixels.frame_mut(), layout.width, layout.height);
                    scene.render(&mut canvas, font.as_ref());
                    if let Err(e) = pixels.render() {
                        error!("{}", WheelError::from(e));
                        app.cancel();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if app.is_animating() {
                    if last_frame.elapsed() >= frame_duration {
                        window_clone.request_redraw();
                        last_frame = Instant::now();
                    }
                    window_target.set_control_flow(ControlFlow::WaitUntil(last_frame + frame_duration));
                } else {
                    window_target.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })?;

        Ok(())
    }
}

// ============================================================================
// APPLICATION STATE (INTERNAL)
// ============================================================================

/// Engine plus the bits of UI state the window loop needs between frames.
struct AppState<S, R> {
    engine: SpinEngine<S, R>,
    panel: Panel,
    spin_started: Option<Instant>,
}

impl<S: KeyValueStore, R: SpinRandom> AppState<S, R> {
    fn new(engine: SpinEngine<S, R>) -> Self {
        let panel = Panel::new(engine.is_locked());
        Self {
            engine,
            panel,
            spin_started: None,
        }
    }

    fn is_animating(&self) -> bool {
        self.spin_started.is_some()
    }

    /// Returns whether anything visible changed.
    fn request_spin(&mut self, now: Instant) -> bool {
        match self.engine.start_spin() {
            Ok(_) => {
                self.panel.spinning();
                self.spin_started = Some(now);
                true
            }
            Err(reason) => {
                self.panel.rejected(reason);
                reason == SpinRejected::Locked
            }
        }
    }

    fn update(&mut self, now: Instant) -> Option<SpinOutcome> {
        let started = self.spin_started?;
        let elapsed_ms = now.saturating_duration_since(started).as_secs_f64() * 1000.0;
        match self.engine.advance(elapsed_ms) {
            SpinStep::Continue => None,
            SpinStep::Done(outcome) => {
                self.spin_started = None;
                self.panel.landed(&outcome, self.engine.is_locked());
                Some(outcome)
            }
            SpinStep::Idle => {
                self.spin_started = None;
                None
            }
        }
    }

    /// Stop a spin in flight without landing it.
    fn cancel(&mut self) {
        if self.spin_started.take().is_some() {
            self.engine.cancel();
            self.panel.refresh(self.engine.is_locked());
        }
    }

    fn scene(&self, layout: Layout, style: &WheelStyle) -> Scene {
        let mut surface = SceneSurface::new(layout, style);
        surface.clear_and_draw_slices(self.engine.wheel().slices(), self.engine.rotation(), layout.size);
        surface.highlight_center_cap();
        surface.draw_pointer();
        surface.draw_panel(&self.panel);
        surface.into_scene()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;
    use crate::spin::tests::Scripted;

    fn app(targets: &[usize]) -> AppState<MemoryStore, Scripted> {
        let wheel = PrizeWheel::new(
            WheelConfig::builder().build(),
            MemoryStore::new(),
            Scripted::new(targets, 5),
        )
        .unwrap();
        AppState::new(wheel.engine)
    }

    #[test]
    fn builder_defaults_match_demo_wheel() {
        let config = WheelConfig::builder().build();
        assert_eq!(config.slices.len(), 6);
        assert_eq!(config.slices[4], "Spin again");
        assert_eq!(config.storage_key, DEFAULT_LOCK_KEY);
        assert_eq!(config.tuning, SpinTuning::default());
        assert!(config.font_path.is_none());
    }

    #[test]
    fn no_slices_is_a_configuration_error() {
        let config = WheelConfig::builder().slices(Vec::new()).build();
        let err = PrizeWheel::new(config, MemoryStore::new(), spin_rng(Some(1)))
            .err()
            .unwrap();
        assert!(matches!(err, WheelError::Configuration(_)));
    }

    #[test]
    fn zero_framerate_is_a_configuration_error() {
        let config = WheelConfig::builder()
            .window(WindowConfig {
                max_framerate: 0.0,
                ..WindowConfig::default()
            })
            .build();
        let result = PrizeWheel::new(config, MemoryStore::new(), spin_rng(Some(1)));
        assert!(matches!(result, Err(WheelError::Configuration(_))));

        let config = WheelConfig::builder()
            .window(WindowConfig {
                width: 0,
                ..WindowConfig::default()
            })
            .build();
        assert!(PrizeWheel::new(config, MemoryStore::new(), spin_rng(Some(1))).is_err());
    }

    #[test]
    fn settings_feed_the_builder() {
        let mut settings = Settings::default();
        settings.wheel.slices = vec!["A".into(), "B".into()];
        settings.spin.max_turns = 5;
        let config = WheelConfig::from_settings(&settings);
        assert_eq!(config.slices, vec!["A", "B"]);
        assert_eq!(config.tuning.turns, 5..=5);
    }

    #[test]
    fn frames_drive_a_spin_to_its_landing() {
        let mut app = app(&[0]);
        let start = Instant::now();
        assert!(app.request_spin(start));
        assert!(app.is_animating());
        assert!(!app.panel.button_enabled);

        let mut outcome = None;
        for frame in 1..=300u64 {
            if let Some(o) = app.update(start + Duration::from_millis(frame * 16)) {
                outcome = Some(o);
                break;
            }
        }
        let outcome = outcome.expect("spin should land within five seconds");
        assert_eq!(outcome.label, "10% OFF");
        assert!(!app.is_animating());
        assert_eq!(app.panel.result.as_deref(), Some("10% OFF 🎉"));
        assert_eq!(app.panel.button_label, "SPIN (locked)");

        // Locked now: the request is refused but the message needs a redraw.
        assert!(app.request_spin(start));
        assert_eq!(app.panel.result.as_deref(), Some(panel::ALREADY_PLAYED));
        assert!(!app.is_animating());
    }

    #[test]
    fn second_request_while_spinning_changes_nothing() {
        let mut app = app(&[2, 3]);
        let start = Instant::now();
        app.request_spin(start);
        app.update(start + Duration::from_millis(400));
        let rotation = app.engine.rotation();
        assert!(!app.request_spin(start + Duration::from_millis(450)));
        assert_eq!(app.engine.rotation(), rotation);
        assert_eq!(app.spin_started, Some(start));
    }

    #[test]
    fn cancel_mid_spin_returns_to_idle() {
        let mut app = app(&[1, 1]);
        let start = Instant::now();
        app.request_spin(start);
        app.update(start + Duration::from_millis(1000));
        let rotation = wheel::normalize_angle(app.engine.rotation());
        app.cancel();
        assert!(!app.is_animating());
        assert!(app.panel.button_enabled);
        assert_eq!(app.engine.rotation(), rotation);
        assert_eq!(app.update(start + Duration::from_secs(10)), None);
        assert!(!app.engine.is_locked());
    }

    #[test]
    fn scene_draws_wheel_cap_pointer_and_panel() {
        let app = app(&[4]);
        let style = WheelStyle::default();
        let scene = app.scene(Layout::new(520, 680, 1.0), &style);
        let commands = scene.commands();
        assert!(commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Pointer { .. })));
        assert!(commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "SPIN")));
        assert!(commands.iter().any(
            |c| matches!(c, DrawCommand::Text { text, .. } if text == "One spin per visit (demo).")
        ));
    }
}
