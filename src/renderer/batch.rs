//! Scene → instanced draw batches
//!
//! Objects sharing geometry, texture, blending and topology collapse into one
//! instanced draw. Normal-blended batches come before additive ones.

use std::collections::BTreeMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::scene::{Blending, GeometryId, Scene, TextureId, Topology};

/// Per-instance data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// World position, w unused
    pub offset: [f32; 4],
    /// Local scale, w unused
    pub scale: [f32; 4],
    /// Linear RGB + final alpha
    pub color: [f32; 4],
    /// rotation, billboard flag, fog flag, unused
    pub params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub blending: Blending,
    pub topology: Topology,
    pub texture: Option<TextureId>,
    pub geometry: GeometryId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub key: BatchKey,
    /// Range into `FrameBatches::instances`
    pub instances: Range<u32>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameBatches {
    pub batches: Vec<DrawBatch>,
    pub instances: Vec<InstanceRaw>,
}

/// Group every visible object of `scene` into draw batches
pub fn collect_batches(scene: &Scene) -> FrameBatches {
    let light_level = scene.light_level();
    let mut groups: BTreeMap<BatchKey, Vec<InstanceRaw>> = BTreeMap::new();

    for (_, object) in scene.objects() {
        if !object.visible {
            continue;
        }
        let (Some(material), Some(geometry)) =
            (scene.material(object.material), scene.geometry(object.geometry))
        else {
            continue;
        };

        let alpha = material.opacity * object.opacity;
        if alpha <= 0.0 {
            continue;
        }
        let color = if material.lit {
            material.color * light_level
        } else {
            material.color
        };

        let key = BatchKey {
            blending: material.blending,
            topology: geometry.topology(),
            texture: material.texture,
            geometry: object.geometry,
        };
        let transform = &object.transform;
        groups.entry(key).or_default().push(InstanceRaw {
            offset: transform.position.extend(0.0).to_array(),
            scale: transform.scale.extend(0.0).to_array(),
            color: color.extend(alpha).to_array(),
            params: [
                transform.rotation,
                flag(object.billboard),
                flag(material.fog),
                0.0,
            ],
        });
    }

    let mut frame = FrameBatches::default();
    for (key, instances) in groups {
        let start = frame.instances.len() as u32;
        frame.instances.extend(instances);
        frame.batches.push(DrawBatch {
            key,
            instances: start..frame.instances.len() as u32,
        });
    }
    frame
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use crate::scene::{Geometry, Light, Material, SceneObject, Transform};

    #[test]
    fn test_objects_sharing_resources_share_a_batch() {
        let mut scene = Scene::new();
        let streak = scene.add_geometry(Geometry::streak(1.0));
        let material = scene.add_material(Material::basic(0x88AED7, 0.6));
        for i in 0..10 {
            scene.add_object(SceneObject::new(streak, material, Transform::at(Vec3::splat(i as f32))));
        }

        let frame = collect_batches(&scene);
        assert_eq!(frame.batches.len(), 1);
        assert_eq!(frame.batches[0].instances, 0..10);
        assert_eq!(frame.batches[0].key.topology, Topology::Lines);
    }

    #[test]
    fn test_additive_batches_follow_normal() {
        let mut scene = Scene::new();
        let quad = scene.add_geometry(Geometry::point(0.1));
        let glow = scene.add_material(Material::basic(0xFFFFFF, 0.3).additive());
        let plain = scene.add_material(Material::basic(0xFFFFFF, 1.0));
        scene.add_object(SceneObject::new(quad, glow, Transform::at(Vec3::ZERO)));
        scene.add_object(SceneObject::new(quad, plain, Transform::at(Vec3::ZERO)));

        let frame = collect_batches(&scene);
        let order: Vec<_> = frame.batches.iter().map(|b| b.key.blending).collect();
        assert_eq!(order, vec![Blending::Normal, Blending::Additive]);
    }

    #[test]
    fn test_invisible_and_transparent_objects_skipped() {
        let mut scene = Scene::new();
        let quad = scene.add_geometry(Geometry::point(0.1));
        let material = scene.add_material(Material::basic(0xFFFFFF, 1.0));
        let hidden = scene.add_object(SceneObject::new(quad, material, Transform::at(Vec3::ZERO)));
        let faded = scene.add_object(SceneObject::new(quad, material, Transform::at(Vec3::ZERO)));
        scene.object_mut(hidden).unwrap().visible = false;
        scene.object_mut(faded).unwrap().opacity = 0.0;

        assert!(collect_batches(&scene).batches.is_empty());
    }

    #[test]
    fn test_lit_material_follows_light_level() {
        let mut scene = Scene::new();
        scene.add_light(Light::ambient(0xFFFFFF, 0.5));
        let quad = scene.add_geometry(Geometry::point(1.0));
        let material = scene.add_material(Material::basic(0xFFFFFF, 1.0).lit());
        scene.add_object(SceneObject::new(quad, material, Transform::at(Vec3::ZERO)));

        let frame = collect_batches(&scene);
        let color = frame.instances[0].color;
        assert!((color[0] - 0.5).abs() < 1e-4);
        assert_eq!(color[3], 1.0);
    }
}
