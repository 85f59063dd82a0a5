//! The frame orchestrator
//!
//! A [`Window`] owns the camera, the scene, the input snapshot and the frame
//! timer, and drives one tick per [`Window::update`] call:
//!
//! 1. Pump platform events into the [`EventSnapshot`]; a quit closes the window
//! 2. Measure `dt` since the previous tick
//! 3. Run the caller's callback (for [`Window::update_with`])
//! 4. Advance animations and emitters by `dt`
//! 5. Plan the frame (lights truncated to shader maxima) and submit it
//!
//! Once closed, `update` returns `false` immediately and does nothing else.
//! Frame-time failures are logged and the loop continues.

use std::time::Duration;

use lumen_core::{
    AudioMixer, DirectionalLight, DirectionalLightKey, Emitter, EmitterKey, Material, Object2D, Object3D,
    ObjectKey, PlaybackId, PointLight, PointLightKey, Scene, ShaderError, SkyBox, Sound, SpotLight, SpotLightKey,
    SpriteKey, Text, TextKey,
};
use lumen_input::{EventFlag, EventSnapshot};
use lumen_math::Vec4;
use lumen_render::{Camera, FramePlan, FrameStats, RenderError};

use crate::config::AppConfig;
use crate::platform::{DesktopPlatform, HeadlessPlatform, Platform, PlatformError};
use crate::timer::FrameTimer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// Constructed, no tick yet
    Created,
    Running,
    /// A quit was observed or `close` was called
    Closed,
}

/// Failure to construct a window
#[derive(Debug)]
pub enum WindowError {
    Platform(PlatformError),
    /// The built-in lit shader failed to build
    DefaultMaterial(ShaderError),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::Platform(e) => write!(f, "{}", e),
            WindowError::DefaultMaterial(e) => write!(f, "Default material failed to build: {}", e),
        }
    }
}

impl std::error::Error for WindowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WindowError::Platform(e) => Some(e),
            WindowError::DefaultMaterial(e) => Some(e),
        }
    }
}

impl From<PlatformError> for WindowError {
    fn from(e: PlatformError) -> Self {
        WindowError::Platform(e)
    }
}

impl From<ShaderError> for WindowError {
    fn from(e: ShaderError) -> Self {
        WindowError::DefaultMaterial(e)
    }
}

/// What a per-frame callback may touch
pub struct Frame<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut Camera,
    pub events: &'a EventSnapshot,
    /// Seconds since the previous tick
    pub dt: f32,
    /// Time since the window was created
    pub elapsed: Duration,
}

pub struct Window<P: Platform = DesktopPlatform> {
    platform: P,
    pub camera: Camera,
    pub scene: Scene,
    /// Color the frame is cleared to before anything is drawn
    pub clear_color: Vec4,
    events: EventSnapshot,
    timer: FrameTimer,
    default_material: Material,
    state: WindowState,
    cursor_locked: bool,
    fullscreen: bool,
    last_stats: FrameStats,
    warned_lights: bool,
    stats_interval: u32,
}

impl Window<DesktopPlatform> {
    /// Open a desktop window
    pub fn new(
        title: &str,
        camera: Camera,
        width: u32,
        height: u32,
        fullscreen: bool,
        clear_color: Vec4,
    ) -> Result<Self, WindowError> {
        let mut config = AppConfig::default();
        config.window.title = title.to_string();
        config.window.width = width;
        config.window.height = height;
        config.window.fullscreen = fullscreen;
        let platform = DesktopPlatform::new(&config.window, &config.audio)?;
        let mut window = Self::with_platform(platform, camera, clear_color)?;
        window.fullscreen = fullscreen;
        Ok(window)
    }

    /// Open a desktop window described by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, WindowError> {
        let platform = DesktopPlatform::new(&config.window, &config.audio)?;
        let camera = config.camera.to_camera(config.window.width, config.window.height);
        let mut window = Self::with_platform(platform, camera, config.window.clear_color())?;
        window.fullscreen = config.window.fullscreen;
        window.stats_interval = config.debug.stats_interval;
        Ok(window)
    }
}

impl Window<HeadlessPlatform> {
    /// A window with no OS surface; frames are recorded in memory
    pub fn headless(width: u32, height: u32, camera: Camera) -> Result<Self, WindowError> {
        Self::with_platform(HeadlessPlatform::new(width, height), camera, Vec4::new(0.0, 0.0, 0.0, 1.0))
    }
}

impl<P: Platform> Window<P> {
    /// Wrap an existing platform
    ///
    /// The camera's viewport is set to the platform's drawable size.
    pub fn with_platform(platform: P, mut camera: Camera, clear_color: Vec4) -> Result<Self, WindowError> {
        let default_material = Material::default_lit()?;
        let (width, height) = platform.size();
        if width > 0 && height > 0 {
            camera.resize(width, height);
        }
        Ok(Self {
            platform,
            camera,
            scene: Scene::new(),
            clear_color,
            events: EventSnapshot::new(),
            timer: FrameTimer::new(),
            default_material,
            state: WindowState::Created,
            cursor_locked: false,
            fullscreen: false,
            last_stats: FrameStats::default(),
            warned_lights: false,
            stats_interval: 0,
        })
    }

    /// Run one tick. Returns `false` once the window is closed.
    pub fn update(&mut self) -> bool {
        self.update_with(|_| {})
    }

    /// Run one tick, calling `callback` after input is polled and before the
    /// scene is advanced and drawn
    pub fn update_with<F>(&mut self, callback: F) -> bool
    where
        F: FnOnce(Frame<'_>),
    {
        if self.state == WindowState::Closed {
            return false;
        }
        self.state = WindowState::Running;

        self.events.begin_frame();
        self.platform.pump_events(&mut self.events);
        if self.events.quit_requested() {
            self.close();
            return false;
        }
        if let Some((width, height)) = self.events.resized() {
            self.camera.resize(width, height);
            if let Some(backend) = self.platform.backend() {
                backend.resize(width, height);
            }
        }

        let dt = self.timer.tick();
        callback(Frame {
            scene: &mut self.scene,
            camera: &mut self.camera,
            events: &self.events,
            dt,
            elapsed: self.timer.elapsed(),
        });

        self.scene.update(dt);
        self.render();
        true
    }

    fn render(&mut self) {
        let time = self.timer.elapsed().as_secs_f32();
        let plan = FramePlan::build(&self.scene, &self.camera, &self.default_material, time, self.clear_color);
        self.last_stats = plan.stats;

        if plan.stats.dropped_lights > 0 && !self.warned_lights {
            log::warn!(
                "{} lights exceed the shader limits and are ignored; the first ones added are used",
                plan.stats.dropped_lights
            );
            self.warned_lights = true;
        }
        if self.stats_interval > 0 && self.timer.frame() % u64::from(self.stats_interval) == 0 {
            log::debug!("Frame {}: {:?}", self.timer.frame(), plan.stats);
        }

        // Nothing to draw into while minimized
        if self.events.is_pressed(EventFlag::WindowMinimize) {
            return;
        }
        let Some(backend) = self.platform.backend() else {
            return;
        };
        match backend.submit(&plan) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => log::warn!("Surface lost, frame dropped"),
            Err(e) => log::error!("Frame failed: {}", e),
        }
    }

    /// Close the window; later `update` calls do nothing
    pub fn close(&mut self) {
        if self.state == WindowState::Closed {
            return;
        }
        self.platform.mixer().stop_all();
        if self.cursor_locked {
            self.platform.set_cursor_locked(false);
            self.cursor_locked = false;
        }
        self.state = WindowState::Closed;
        log::info!("Window closed after {} frames", self.timer.frame());
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != WindowState::Closed
    }

    /// Input as of the latest tick
    pub fn events(&self) -> &EventSnapshot {
        &self.events
    }

    /// Seconds between the last two ticks
    pub fn dt(&self) -> f32 {
        self.timer.dt()
    }

    /// Nanoseconds since the window was created, as of the latest tick
    pub fn time_ns(&self) -> u128 {
        self.timer.time_ns()
    }

    /// Statistics for the latest planned frame
    pub fn frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn default_material(&self) -> &Material {
        &self.default_material
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Switch relative mouse mode. Returns whether the cursor is now locked.
    pub fn lock_mouse(&mut self, locked: bool) -> bool {
        self.cursor_locked = self.platform.set_cursor_locked(locked);
        self.cursor_locked
    }

    pub fn mouse_locked(&self) -> bool {
        self.cursor_locked
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        if fullscreen != self.fullscreen {
            self.platform.set_fullscreen(fullscreen);
            self.fullscreen = fullscreen;
        }
    }

    pub fn set_skybox(&mut self, skybox: Option<SkyBox>) {
        self.scene.skybox = skybox;
    }

    /// Start playing `sound`, fire and forget
    pub fn play_sound(&mut self, sound: &Sound) -> PlaybackId {
        self.platform.mixer().play(sound)
    }

    pub fn stop_sound(&mut self, playback: PlaybackId) {
        self.platform.mixer().stop(playback);
    }

    pub fn add_object_list(&mut self, objects: impl IntoIterator<Item = Object3D>) -> Vec<ObjectKey> {
        self.scene.objects.extend(objects)
    }

    pub fn add_object2d_list(&mut self, sprites: impl IntoIterator<Item = Object2D>) -> Vec<SpriteKey> {
        self.scene.sprites.extend(sprites)
    }

    /// Lights beyond the shader maximum are kept but not drawn
    pub fn add_point_light_list(&mut self, lights: impl IntoIterator<Item = PointLight>) -> Vec<PointLightKey> {
        self.scene.point_lights.extend(lights)
    }

    pub fn add_directional_light_list(
        &mut self,
        lights: impl IntoIterator<Item = DirectionalLight>,
    ) -> Vec<DirectionalLightKey> {
        self.scene.directional_lights.extend(lights)
    }

    pub fn add_spot_light_list(&mut self, lights: impl IntoIterator<Item = SpotLight>) -> Vec<SpotLightKey> {
        self.scene.spot_lights.extend(lights)
    }

    pub fn add_text_list(&mut self, texts: impl IntoIterator<Item = Text>) -> Vec<TextKey> {
        self.scene.texts.extend(texts)
    }

    pub fn add_emitter_list(&mut self, emitters: impl IntoIterator<Item = Emitter>) -> Vec<EmitterKey> {
        self.scene.emitters.extend(emitters)
    }

    pub fn remove_object(&mut self, key: ObjectKey) -> Option<Object3D> {
        self.scene.objects.remove(key)
    }

    pub fn remove_object2d(&mut self, key: SpriteKey) -> Option<Object2D> {
        self.scene.sprites.remove(key)
    }

    pub fn remove_point_light(&mut self, key: PointLightKey) -> Option<PointLight> {
        self.scene.point_lights.remove(key)
    }

    pub fn remove_directional_light(&mut self, key: DirectionalLightKey) -> Option<DirectionalLight> {
        self.scene.directional_lights.remove(key)
    }

    pub fn remove_spot_light(&mut self, key: SpotLightKey) -> Option<SpotLight> {
        self.scene.spot_lights.remove(key)
    }

    pub fn remove_text(&mut self, key: TextKey) -> Option<Text> {
        self.scene.texts.remove(key)
    }

    pub fn remove_emitter(&mut self, key: EmitterKey) -> Option<Emitter> {
        self.scene.emitters.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_input::InputEvent;

    fn window() -> Window<HeadlessPlatform> {
        Window::headless(640, 480, Camera::default()).unwrap()
    }

    #[test]
    fn test_camera_takes_platform_size() {
        let window = window();
        assert_eq!((window.camera.view_width, window.camera.view_height), (640, 480));
        assert_eq!(window.state(), WindowState::Created);
    }

    #[test]
    fn test_update_runs_until_quit() {
        let mut window = window();
        assert!(window.update());
        assert_eq!(window.state(), WindowState::Running);

        window.platform_mut().push_event(InputEvent::Quit);
        assert!(!window.update());
        assert_eq!(window.state(), WindowState::Closed);
        assert!(!window.update());
        assert_eq!(window.platform().recorder().frame_count(), 1);
    }

    #[test]
    fn test_close_request_closes() {
        let mut window = window();
        window.platform_mut().push_event(InputEvent::CloseRequested);
        assert!(!window.update());
        assert!(!window.is_open());
    }

    #[test]
    fn test_callback_sees_frame_input() {
        let mut window = window();
        window.platform_mut().push_event(InputEvent::Key { flag: EventFlag::KeyW, pressed: true });
        let mut seen = false;
        window.update_with(|frame| seen = frame.events.is_pressed(EventFlag::KeyW));
        assert!(seen);
    }

    #[test]
    fn test_callback_skipped_after_close() {
        let mut window = window();
        window.close();
        let mut called = false;
        assert!(!window.update_with(|_| called = true));
        assert!(!called);
    }

    #[test]
    fn test_resize_reaches_camera_and_backend() {
        let mut window = window();
        window.platform_mut().push_event(InputEvent::Resized { width: 800, height: 200 });
        window.update();
        assert_eq!((window.camera.view_width, window.camera.view_height), (800, 200));
        assert_eq!(window.platform().size(), (800, 200));
        let viewport = window.platform().recorder().last_frame().unwrap().viewport;
        assert_eq!(viewport[0], 800.0);
    }

    #[test]
    fn test_minimized_skips_submit() {
        let mut window = window();
        window.platform_mut().push_event(InputEvent::Minimized(true));
        window.update();
        assert_eq!(window.platform().recorder().frame_count(), 0);
        window.platform_mut().push_event(InputEvent::Minimized(false));
        window.update();
        assert_eq!(window.platform().recorder().frame_count(), 1);
    }

    #[test]
    fn test_lock_mouse_and_fullscreen() {
        let mut window = window();
        assert!(window.lock_mouse(true));
        assert!(window.mouse_locked());
        window.set_fullscreen(true);
        assert!(window.fullscreen());
        assert!(window.platform().is_fullscreen());
        window.close();
        assert!(!window.mouse_locked());
    }
}
