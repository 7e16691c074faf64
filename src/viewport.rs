//! Viewport: render backend, camera and render-target sizing

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::renderer::{ContextFactory, RenderBackend, RenderStats};
use crate::scene::{Camera, Scene};

/// Container size in CSS/logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scale to device pixels, never collapsing a non-empty size to zero
    pub fn to_physical(self, pixel_ratio: f32) -> SurfaceSize {
        let scale = |v: u32| ((v as f32 * pixel_ratio).round() as u32).max(1);
        SurfaceSize::new(scale(self.width), scale(self.height))
    }
}

impl std::fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Owns the drawing context and keeps camera and render target in step
pub struct ViewportController {
    backend: Box<dyn RenderBackend>,
    camera: Camera,
    size: SurfaceSize,
    pixel_ratio: f32,
}

impl ViewportController {
    /// Create camera and render target for a container of `size`
    pub fn init(
        config: &EngineConfig,
        size: SurfaceSize,
        factory: &dyn ContextFactory,
    ) -> EngineResult<Self> {
        if size.is_empty() {
            return Err(EngineError::InvalidSurfaceSize {
                width: size.width,
                height: size.height,
            });
        }

        let physical = size.to_physical(config.pixel_ratio);
        let backend = factory.create_context(physical)?;
        log::info!(
            "[ViewportController::init] {} backend ready at {} (container {}, pixel ratio {})",
            backend.name(),
            physical,
            size,
            config.pixel_ratio
        );

        Ok(Self {
            backend,
            camera: Camera::new(&config.camera, size.width, size.height),
            size,
            pixel_ratio: config.pixel_ratio,
        })
    }

    /// Apply a new container size. Returns false, keeping the last size, when either
    /// dimension is zero.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        if size.is_empty() {
            log::debug!("[ViewportController::resize] Ignoring empty size {}", size);
            return false;
        }
        if size == self.size {
            return true;
        }

        self.size = size;
        self.camera.resize(size.width, size.height);
        self.backend.resize(size.to_physical(self.pixel_ratio));
        log::debug!(
            "[ViewportController::resize] Resized to {} (render target {})",
            size,
            self.backend.surface_size()
        );
        true
    }

    pub fn render(&mut self, scene: &Scene) -> EngineResult<RenderStats> {
        self.backend.render(scene, &self.camera)
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Render-target size in device pixels
    pub fn render_size(&self) -> SurfaceSize {
        self.backend.surface_size()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessFactory;

    #[test]
    fn test_physical_size_rounds_and_never_collapses() {
        assert_eq!(SurfaceSize::new(100, 50).to_physical(1.5), SurfaceSize::new(150, 75));
        assert_eq!(SurfaceSize::new(1, 1).to_physical(0.1), SurfaceSize::new(1, 1));
    }

    #[test]
    fn test_init_rejects_empty_container() {
        let factory = HeadlessFactory::default();
        let result = ViewportController::init(&EngineConfig::default(), SurfaceSize::new(0, 120), &factory);
        assert!(matches!(result, Err(EngineError::InvalidSurfaceSize { width: 0, height: 120 })));
    }

    #[test]
    fn test_resize_keeps_last_valid_size() {
        let factory = HeadlessFactory::default();
        let mut viewport =
            ViewportController::init(&EngineConfig::default(), SurfaceSize::new(800, 200), &factory).unwrap();

        assert!(viewport.resize(SurfaceSize::new(1024, 256)));
        assert_eq!(viewport.render_size(), SurfaceSize::new(1024, 256));
        assert_eq!(viewport.camera().aspect_ratio, 4.0);

        assert!(!viewport.resize(SurfaceSize::new(0, 256)));
        assert!(!viewport.resize(SurfaceSize::new(1024, 0)));
        assert_eq!(viewport.size(), SurfaceSize::new(1024, 256));
        assert_eq!(viewport.render_size(), SurfaceSize::new(1024, 256));
    }

    #[test]
    fn test_pixel_ratio_scales_render_target() {
        let factory = HeadlessFactory::default();
        let config = EngineConfig {
            pixel_ratio: 2.0,
            ..EngineConfig::default()
        };
        let mut viewport = ViewportController::init(&config, SurfaceSize::new(400, 100), &factory).unwrap();
        assert_eq!(viewport.render_size(), SurfaceSize::new(800, 200));
        viewport.resize(SurfaceSize::new(500, 100));
        assert_eq!(viewport.render_size(), SurfaceSize::new(1000, 200));
    }
}
