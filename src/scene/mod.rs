//! In-memory scene graph
//!
//! The scene owns the CPU-side description of everything drawn: objects, the
//! geometries/materials/textures they reference, lights and the optional fog
//! overlay. Render backends mirror geometries and textures into GPU memory lazily
//! and drop their copies when the ledger releases them.

pub mod camera;
pub mod geometry;
pub mod texture;

pub use camera::Camera;
pub use geometry::{EffectVertex, Geometry, Topology};
pub use texture::TextureData;

use glam::Vec3;
use rustc_hash::FxHashMap;

macro_rules! scene_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(u64);

            impl $name {
                pub fn raw(self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

scene_id!(ObjectId, GeometryId, MaterialId, TextureId, LightId);

/// Convert a 0xRRGGBB sRGB colour into linear RGB
pub fn rgb(hex: u32) -> Vec3 {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xFF) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(16), channel(8), channel(0))
}

/// How a material combines with what is already on the render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Blending {
    Normal,
    Additive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Linear RGB
    pub color: Vec3,
    pub opacity: f32,
    pub blending: Blending,
    pub texture: Option<TextureId>,
    /// Modulated by the scene's light level
    pub lit: bool,
    /// Affected by the fog overlay
    pub fog: bool,
}

impl Material {
    /// Unlit, fogged, normally blended material
    pub fn basic(hex: u32, opacity: f32) -> Self {
        Self {
            color: rgb(hex),
            opacity,
            blending: Blending::Normal,
            texture: None,
            lit: false,
            fog: true,
        }
    }

    pub fn additive(mut self) -> Self {
        self.blending = Blending::Additive;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn lit(mut self) -> Self {
        self.lit = true;
        self
    }

    pub fn unfogged(mut self) -> Self {
        self.fog = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    /// Rotation about the facing axis, radians
    pub rotation: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            scale: Vec3::ONE,
            rotation: 0.0,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// One drawable instance
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Transform,
    /// Always faces the camera
    pub billboard: bool,
    /// Multiplied with the material opacity
    pub opacity: f32,
    pub visible: bool,
}

impl SceneObject {
    pub fn new(geometry: GeometryId, material: MaterialId, transform: Transform) -> Self {
        Self {
            geometry,
            material,
            transform,
            billboard: false,
            opacity: 1.0,
            visible: true,
        }
    }

    pub fn billboard(mut self) -> Self {
        self.billboard = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional { position: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn ambient(hex: u32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color: rgb(hex),
            intensity,
        }
    }

    pub fn directional(hex: u32, intensity: f32, position: Vec3) -> Self {
        Self {
            kind: LightKind::Directional { position },
            color: rgb(hex),
            intensity,
        }
    }
}

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn linear(hex: u32, near: f32, far: f32) -> Self {
        Self {
            color: rgb(hex),
            near,
            far,
        }
    }
}

/// Table sizes, used for leak checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneCounts {
    pub objects: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
    pub lights: usize,
}

#[derive(Default)]
pub struct Scene {
    next_id: u64,
    objects: FxHashMap<ObjectId, SceneObject>,
    geometries: FxHashMap<GeometryId, Geometry>,
    materials: FxHashMap<MaterialId, Material>,
    textures: FxHashMap<TextureId, TextureData>,
    lights: FxHashMap<LightId, Light>,
    fog: Option<Fog>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let id = GeometryId(self.allocate());
        self.geometries.insert(id, geometry);
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.allocate());
        self.materials.insert(id, material);
        id
    }

    pub fn add_texture(&mut self, texture: TextureData) -> TextureId {
        let id = TextureId(self.allocate());
        self.textures.insert(id, texture);
        id
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.allocate());
        self.objects.insert(id, object);
        id
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId(self.allocate());
        self.lights.insert(id, light);
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.remove(&id)
    }

    pub fn remove_geometry(&mut self, id: GeometryId) -> Option<Geometry> {
        self.geometries.remove(&id)
    }

    pub fn remove_material(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.remove(&id)
    }

    pub fn remove_texture(&mut self, id: TextureId) -> Option<TextureData> {
        self.textures.remove(&id)
    }

    pub fn remove_light(&mut self, id: LightId) -> Option<Light> {
        self.lights.remove(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, object)| (*id, object))
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id)
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(&id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.values()
    }

    pub fn fog(&self) -> Option<&Fog> {
        self.fog.as_ref()
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = Some(fog);
    }

    pub fn clear_fog(&mut self) -> Option<Fog> {
        self.fog.take()
    }

    /// Combined light reaching lit materials, clamped per channel to 1.0
    pub fn light_level(&self) -> Vec3 {
        self.lights
            .values()
            .fold(Vec3::ZERO, |acc, light| acc + light.color * light.intensity)
            .min(Vec3::ONE)
    }

    pub fn counts(&self) -> SceneCounts {
        SceneCounts {
            objects: self.objects.len(),
            geometries: self.geometries.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
            lights: self.lights.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_endpoints() {
        assert_eq!(rgb(0x000000), Vec3::ZERO);
        let white = rgb(0xFFFFFF);
        assert!((white - Vec3::ONE).abs().max_element() < 1e-5);
        let red = rgb(0xFF0000);
        assert!(red.x > 0.99 && red.y == 0.0 && red.z == 0.0);
    }

    #[test]
    fn test_add_and_remove_object() {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::Quad { width: 1.0, height: 1.0 });
        let material = scene.add_material(Material::basic(0xFFFFFF, 1.0));
        let object = scene.add_object(SceneObject::new(geometry, material, Transform::at(Vec3::ZERO)));

        assert!(scene.contains_object(object));
        assert!(scene.remove_object(object).is_some());
        assert!(scene.remove_object(object).is_none());
        assert_eq!(scene.counts().objects, 0);
        assert_eq!(scene.counts().geometries, 1);
    }

    #[test]
    fn test_ids_are_unique_across_tables() {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::Quad { width: 1.0, height: 1.0 });
        let material = scene.add_material(Material::basic(0xFFFFFF, 1.0));
        assert_ne!(geometry.raw(), material.raw());
    }

    #[test]
    fn test_light_level_clamped() {
        let mut scene = Scene::new();
        assert_eq!(scene.light_level(), Vec3::ZERO);
        scene.add_light(Light::ambient(0xFFFFFF, 0.2));
        assert!((scene.light_level().x - 0.2).abs() < 1e-5);
        scene.add_light(Light::directional(0xFFFFFF, 1.8, Vec3::new(5.0, 7.0, 2.0)));
        assert_eq!(scene.light_level(), Vec3::ONE);
    }
}
