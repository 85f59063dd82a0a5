//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`LUMEN_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use lumen_input::CameraController;
use lumen_math::{Vec3, Vec4};
use lumen_render::Camera;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`LUMEN_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // LUMEN_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("LUMEN_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
    /// Color the frame is cleared to [r, g, b, a]
    pub clear_color: [f32; 4],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            clear_color: [0.02, 0.02, 0.08, 1.0],
        }
    }
}

impl WindowConfig {
    pub fn clear_color(&self) -> Vec4 {
        let [r, g, b, a] = self.clear_color;
        Vec4::new(r, g, b, a)
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position [x, y, z]
    pub start_position: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Far clip distance
    pub focal_length: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 1.0, -5.0],
            fov: 60.0,
            focal_length: 1000.0,
        }
    }
}

impl CameraConfig {
    /// Build a camera for a `width` x `height` viewport
    pub fn to_camera(&self, width: u32, height: u32) -> Camera {
        let [x, y, z] = self.start_position;
        Camera::new(
            Vec3::new(x, y, z),
            lumen_math::Quat::IDENTITY,
            width,
            height,
            self.focal_length,
            self.fov.to_radians(),
        )
    }
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Movement speed (units per second)
    pub move_speed: f32,
    /// Radians of turn per pixel of mouse motion
    pub mouse_sensitivity: f32,
    /// Input smoothing half-life in seconds (lower = more responsive)
    pub smoothing_half_life: f32,
    pub smoothing_enabled: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            mouse_sensitivity: 0.002,
            smoothing_half_life: 0.05,
            smoothing_enabled: false,
        }
    }
}

impl InputConfig {
    pub fn to_controller(&self) -> CameraController {
        let mut controller = CameraController::new()
            .with_move_speed(self.move_speed)
            .with_mouse_sensitivity(self.mouse_sensitivity)
            .with_smoothing(self.smoothing_enabled);
        controller.smoothing_half_life = self.smoothing_half_life;
        controller
    }
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Open an output device; when false every sound is silent
    pub enabled: bool,
    /// Master volume, 0.0 - 1.0
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 1.0,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Log frame statistics every this many frames; 0 disables
    pub stats_interval: u32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 0,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert!(config.window.vsync);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("focal_length"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = toml::from_str("[window]\nwidth = 640\n").unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.window.title, "Lumen");
    }

    #[test]
    fn test_camera_from_config() {
        let config = CameraConfig {
            start_position: [1.0, 2.0, 3.0],
            fov: 90.0,
            focal_length: 50.0,
        };
        let camera = config.to_camera(800, 400);
        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
        assert!((camera.fov - std::f32::consts::FRAC_PI_2).abs() < EPSILON, "Expected pi/2, got {}", camera.fov);
        assert!((camera.aspect_ratio() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_controller_from_config() {
        let config = InputConfig {
            move_speed: 7.0,
            smoothing_half_life: 0.2,
            ..Default::default()
        };
        let controller = config.to_controller();
        assert_eq!(controller.move_speed, 7.0);
        assert_eq!(controller.smoothing_half_life, 0.2);
    }
}
