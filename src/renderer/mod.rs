//! Render backends
//!
//! The engine talks to the drawing surface only through `RenderBackend`. Backends
//! mirror scene geometries/textures lazily on first draw and drop them again when
//! the resource ledger releases the ids.

pub mod batch;
pub mod gpu_state;
pub mod headless;

pub use batch::{collect_batches, BatchKey, DrawBatch, FrameBatches, InstanceRaw};
pub use gpu_state::WgpuBackend;
pub use headless::{HeadlessBackend, HeadlessFactory};

use bytemuck::{Pod, Zeroable};

use crate::error::EngineResult;
use crate::scene::{Camera, Fog, GeometryId, Scene, TextureId};
use crate::viewport::SurfaceSize;

/// Outcome of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub instances: u32,
    /// The frame was dropped (surface outdated or lost)
    pub skipped: bool,
}

/// GPU-resident copies currently held by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResidentResources {
    pub geometries: usize,
    pub textures: usize,
}

/// The 3D drawing context
pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Resize the render target (device pixels)
    fn resize(&mut self, size: SurfaceSize);

    fn surface_size(&self) -> SurfaceSize;

    /// Draw the current scene state once
    fn render(&mut self, scene: &Scene, camera: &Camera) -> EngineResult<RenderStats>;

    /// Drop the GPU copy of a geometry. Returns false when nothing was resident.
    fn release_geometry(&mut self, id: GeometryId) -> bool;

    /// Drop the GPU copy of a texture. Returns false when nothing was resident.
    fn release_texture(&mut self, id: TextureId) -> bool;

    fn resident(&self) -> ResidentResources;
}

/// Host-provided source of drawing contexts
pub trait ContextFactory {
    /// Create a context whose render target is `size` device pixels
    fn create_context(&self, size: SurfaceSize) -> EngineResult<Box<dyn RenderBackend>>;
}

/// Camera uniform buffer for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
    pub right: [f32; 4],
    pub up: [f32; 4],
    pub position: [f32; 4],
    pub fog_color: [f32; 4],
    /// near, far, enabled, unused
    pub fog_params: [f32; 4],
}

/// Build camera uniform buffer for GPU
pub fn build_camera_uniform(camera: &Camera, fog: Option<&Fog>) -> CameraUniform {
    let (right, up) = camera.billboard_axes();
    let (fog_color, fog_params) = match fog {
        Some(fog) => (fog.color.extend(1.0).to_array(), [fog.near, fog.far, 1.0, 0.0]),
        None => ([0.0; 4], [0.0, 1.0, 0.0, 0.0]),
    };
    CameraUniform {
        view_projection: camera.view_projection().to_cols_array_2d(),
        right: right.extend(0.0).to_array(),
        up: up.extend(0.0).to_array(),
        position: camera.position.extend(1.0).to_array(),
        fog_color,
        fog_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    #[test]
    fn test_camera_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>() % 16, 0);
    }

    #[test]
    fn test_fog_disabled_without_overlay() {
        let camera = Camera::new(&CameraConfig::default(), 800, 200);
        let uniform = build_camera_uniform(&camera, None);
        assert_eq!(uniform.fog_params[2], 0.0);

        let fog = Fog::linear(0x777777, 1.0, 10.0);
        let uniform = build_camera_uniform(&camera, Some(&fog));
        assert_eq!(uniform.fog_params, [1.0, 10.0, 1.0, 0.0]);
        assert_eq!(uniform.position, [0.0, 1.0, 10.0, 1.0]);
    }
}
