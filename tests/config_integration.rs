//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use std::path::PathBuf;

use lumen::config::AppConfig;
use serial_test::serial;

fn temp_config_dir(name: &str, default_toml: &str, user_toml: Option<&str>) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lumen_config_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("default.toml"), default_toml).unwrap();
    match user_toml {
        Some(user) => std::fs::write(dir.join("user.toml"), user).unwrap(),
        None => {
            let _ = std::fs::remove_file(dir.join("user.toml"));
        }
    }
    dir
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("LUMEN_WINDOW__TITLE", "Test From Env");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("LUMEN_WINDOW__TITLE");
    assert_eq!(config.window.title, "Test From Env");
}

#[test]
#[serial]
fn test_default_file_loads() {
    std::env::remove_var("LUMEN_WINDOW__TITLE");
    let config = AppConfig::load().unwrap();
    assert!(config.window.width > 0);
    assert!(config.camera.focal_length > 0.0);
}

#[test]
#[serial]
fn test_user_file_overrides_default() {
    let dir = temp_config_dir(
        "user",
        "[window]\ntitle = \"Default\"\nwidth = 800\n",
        Some("[window]\ntitle = \"User\"\n"),
    );
    let config = AppConfig::load_from(&dir).unwrap();
    assert_eq!(config.window.title, "User");
    assert_eq!(config.window.width, 800);
}

#[test]
#[serial]
fn test_env_beats_user_file() {
    let dir = temp_config_dir("env", "[camera]\nfov = 50.0\n", Some("[camera]\nfov = 70.0\n"));
    std::env::set_var("LUMEN_CAMERA__FOV", "90.0");
    let config = AppConfig::load_from(&dir);
    std::env::remove_var("LUMEN_CAMERA__FOV");
    assert_eq!(config.unwrap().camera.fov, 90.0);
}

#[test]
#[serial]
fn test_missing_directory_gives_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.window.width, 1280);
    assert_eq!(config.input.move_speed, 3.0);
}

#[test]
#[serial]
fn test_bad_value_is_error() {
    let dir = temp_config_dir("bad", "[window]\nwidth = \"wide\"\n", None);
    let error = AppConfig::load_from(&dir).unwrap_err();
    assert!(error.to_string().starts_with("Configuration error"), "Expected a config error, got {}", error);
}
