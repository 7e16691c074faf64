//! Offscreen backend without a GPU
//!
//! Performs the same batching and lazy residency bookkeeping as the wgpu backend
//! but never touches a device. Used by tests and `--headless` runs.

use rustc_hash::FxHashSet;

use super::{collect_batches, ContextFactory, RenderBackend, RenderStats, ResidentResources};
use crate::error::{graphics_unavailable, EngineResult};
use crate::scene::{Camera, GeometryId, Scene, TextureId};
use crate::viewport::SurfaceSize;

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    size: SurfaceSize,
    geometries: FxHashSet<GeometryId>,
    textures: FxHashSet<TextureId>,
    frames_rendered: u64,
    last_stats: RenderStats,
}

impl HeadlessBackend {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn resize(&mut self, size: SurfaceSize) {
        if !size.is_empty() {
            self.size = size;
        }
    }

    fn surface_size(&self) -> SurfaceSize {
        self.size
    }

    fn render(&mut self, scene: &Scene, _camera: &Camera) -> EngineResult<RenderStats> {
        let frame = collect_batches(scene);
        for batch in &frame.batches {
            self.geometries.insert(batch.key.geometry);
            if let Some(texture) = batch.key.texture {
                self.textures.insert(texture);
            }
        }

        self.frames_rendered += 1;
        self.last_stats = RenderStats {
            draw_calls: frame.batches.len() as u32,
            instances: frame.instances.len() as u32,
            skipped: false,
        };
        Ok(self.last_stats)
    }

    fn release_geometry(&mut self, id: GeometryId) -> bool {
        self.geometries.remove(&id)
    }

    fn release_texture(&mut self, id: TextureId) -> bool {
        self.textures.remove(&id)
    }

    fn resident(&self) -> ResidentResources {
        ResidentResources {
            geometries: self.geometries.len(),
            textures: self.textures.len(),
        }
    }
}

/// Hands out headless contexts; can simulate a host without 3D support
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    unavailable: Option<String>,
}

impl HeadlessFactory {
    /// Factory whose every context request fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
        }
    }
}

impl ContextFactory for HeadlessFactory {
    fn create_context(&self, size: SurfaceSize) -> EngineResult<Box<dyn RenderBackend>> {
        if let Some(reason) = &self.unavailable {
            return Err(graphics_unavailable(reason.clone()));
        }
        Ok(Box::new(HeadlessBackend::new(size)))
    }
}
