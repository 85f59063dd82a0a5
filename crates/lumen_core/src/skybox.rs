//! Environment background drawn behind everything else

use std::sync::Arc;

use lumen_math::Vec4;

use crate::texture::CubeMap;

/// A cube map centered on the camera
///
/// Only the camera's rotation affects it, so it always appears infinitely
/// far away.
#[derive(Clone, Debug)]
pub struct SkyBox {
    pub cubemap: Arc<CubeMap>,
    /// Multiplied with every face
    pub tint: Vec4,
}

impl SkyBox {
    pub fn new(cubemap: Arc<CubeMap>) -> Self {
        Self {
            cubemap,
            tint: Vec4::rgba(1.0, 1.0, 1.0, 1.0),
        }
    }
}
