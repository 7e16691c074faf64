//! Resource ledger for the active effect set
//!
//! Everything an effect allocates is registered here and released in one
//! ordered pass: timers first, then scene objects, then the resources they
//! referenced. Releases check the tables first, so disposing twice is harmless.

use crate::renderer::RenderBackend;
use crate::scene::{GeometryId, LightId, MaterialId, ObjectId, Scene, TextureId};
use crate::time::{TimerId, TimerQueue};

/// What one `dispose_all` pass released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposalReport {
    pub timers_cancelled: usize,
    pub objects_removed: usize,
    pub geometries_released: usize,
    pub textures_released: usize,
    /// GPU-resident copies dropped by the backend
    pub gpu_geometries_released: usize,
    pub gpu_textures_released: usize,
    pub materials_released: usize,
    pub lights_removed: usize,
    pub fog_cleared: bool,
    /// Registrations that were already gone
    pub already_released: usize,
}

impl DisposalReport {
    pub fn total(&self) -> usize {
        self.timers_cancelled
            + self.objects_removed
            + self.geometries_released
            + self.textures_released
            + self.materials_released
            + self.lights_removed
            + usize::from(self.fog_cleared)
    }
}

#[derive(Debug, Default)]
pub struct ResourceLedger {
    timers: Vec<TimerId>,
    objects: Vec<ObjectId>,
    geometries: Vec<GeometryId>,
    materials: Vec<MaterialId>,
    textures: Vec<TextureId>,
    lights: Vec<LightId>,
    fog: bool,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_timer(&mut self, id: TimerId) {
        self.timers.push(id);
    }

    pub fn register_object(&mut self, id: ObjectId) {
        self.objects.push(id);
    }

    pub fn register_geometry(&mut self, id: GeometryId) {
        self.geometries.push(id);
    }

    pub fn register_material(&mut self, id: MaterialId) {
        self.materials.push(id);
    }

    pub fn register_texture(&mut self, id: TextureId) {
        self.textures.push(id);
    }

    pub fn register_light(&mut self, id: LightId) {
        self.lights.push(id);
    }

    pub fn register_fog(&mut self) {
        self.fog = true;
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.timers.len()
            + self.objects.len()
            + self.geometries.len()
            + self.materials.len()
            + self.textures.len()
            + self.lights.len()
            + usize::from(self.fog)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Release every registration. Timers are cancelled before any scene object
    /// is touched.
    pub fn dispose_all<T: Clone>(
        &mut self,
        scene: &mut Scene,
        backend: &mut dyn RenderBackend,
        timers: &mut TimerQueue<T>,
    ) -> DisposalReport {
        let mut report = DisposalReport::default();

        for id in self.timers.drain(..) {
            if timers.cancel(id) {
                report.timers_cancelled += 1;
            } else {
                report.already_released += 1;
            }
        }

        for id in self.objects.drain(..) {
            if scene.remove_object(id).is_some() {
                report.objects_removed += 1;
            } else {
                report.already_released += 1;
            }
        }

        for id in self.geometries.drain(..) {
            if backend.release_geometry(id) {
                report.gpu_geometries_released += 1;
            }
            if scene.remove_geometry(id).is_some() {
                report.geometries_released += 1;
            } else {
                report.already_released += 1;
            }
        }

        for id in self.textures.drain(..) {
            if backend.release_texture(id) {
                report.gpu_textures_released += 1;
            }
            if scene.remove_texture(id).is_some() {
                report.textures_released += 1;
            } else {
                report.already_released += 1;
            }
        }

        for id in self.materials.drain(..) {
            if scene.remove_material(id).is_some() {
                report.materials_released += 1;
            } else {
                report.already_released += 1;
            }
        }

        for id in self.lights.drain(..) {
            if scene.remove_light(id).is_some() {
                report.lights_removed += 1;
            } else {
                report.already_released += 1;
            }
        }

        if std::mem::take(&mut self.fog) {
            report.fog_cleared = scene.clear_fog().is_some();
        }

        if report.already_released > 0 {
            log::debug!(
                "[ResourceLedger::dispose_all] {} registrations were already released",
                report.already_released
            );
        }
        log::debug!("[ResourceLedger::dispose_all] {:?}", report);
        report
    }
}
