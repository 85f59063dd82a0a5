//! Rendering errors

use std::fmt;

#[derive(Debug)]
pub enum RenderError {
    /// No GPU adapter can present to the window
    NoAdapter,
    /// The window surface could not be created
    Surface(String),
    /// The adapter refused to create a device
    Device(String),
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// Other surface error
    Other(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoAdapter => write!(f, "No compatible GPU adapter found"),
            RenderError::Surface(msg) => write!(f, "Failed to create surface: {}", msg),
            RenderError::Device(msg) => write!(f, "Failed to create device: {}", msg),
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        assert_eq!(format!("{}", RenderError::SurfaceLost), "Surface lost");
        assert_eq!(format!("{}", RenderError::OutOfMemory), "Out of memory");
        assert_eq!(format!("{}", RenderError::Other("test".to_string())), "Render error: test");
        assert!(RenderError::Device("no".into()).to_string().contains("device"));
    }
}
