//! The set of entities a window draws and simulates
//!
//! Each entity kind lives in its own [`EntityList`], keyed by a generational
//! key so removing one entity never invalidates the keys of others. Lists
//! remember insertion order; the renderer relies on it when more lights are
//! registered than the shaders can take, since the earliest ones win.

use slotmap::{new_key_type, Key, SlotMap};

use lumen_math::Vec3;

use crate::emitter::Emitter;
use crate::light::{DirectionalLight, PointLight, SpotLight};
use crate::object2d::Object2D;
use crate::object3d::Object3D;
use crate::skybox::SkyBox;
use crate::text::Text;

new_key_type! {
    /// Key of an [`Object3D`] in a scene
    pub struct ObjectKey;
    /// Key of an [`Object2D`] in a scene
    pub struct SpriteKey;
    pub struct PointLightKey;
    pub struct DirectionalLightKey;
    pub struct SpotLightKey;
    pub struct TextKey;
    pub struct EmitterKey;
}

/// Entities of one kind, in the order they were added
#[derive(Clone, Debug)]
pub struct EntityList<K: Key, T> {
    items: SlotMap<K, T>,
    order: Vec<K>,
}

impl<K: Key, T> Default for EntityList<K, T> {
    fn default() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<K: Key, T> EntityList<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: T) -> K {
        let key = self.items.insert(item);
        self.order.push(key);
        key
    }

    /// Append every item, returning their keys in the same order
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) -> Vec<K> {
        items.into_iter().map(|item| self.insert(item)).collect()
    }

    pub fn remove(&mut self, key: K) -> Option<T> {
        let item = self.items.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(item)
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.items.get_mut(key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }

    /// Keys and items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.order.iter().filter_map(|k| self.items.get(*k).map(|item| (*k, item)))
    }

    /// Items in insertion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, item)| item)
    }

    /// Mutable access to every item, in no particular order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }
}

/// Everything in the world, plus the ambient term shared by all lit shaders
#[derive(Clone, Debug)]
pub struct Scene {
    pub objects: EntityList<ObjectKey, Object3D>,
    pub sprites: EntityList<SpriteKey, Object2D>,
    pub point_lights: EntityList<PointLightKey, PointLight>,
    pub directional_lights: EntityList<DirectionalLightKey, DirectionalLight>,
    pub spot_lights: EntityList<SpotLightKey, SpotLight>,
    pub texts: EntityList<TextKey, Text>,
    pub emitters: EntityList<EmitterKey, Emitter>,
    pub skybox: Option<SkyBox>,
    pub ambient: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            objects: EntityList::new(),
            sprites: EntityList::new(),
            point_lights: EntityList::new(),
            directional_lights: EntityList::new(),
            spot_lights: EntityList::new(),
            texts: EntityList::new(),
            emitters: EntityList::new(),
            skybox: None,
            ambient: Vec3::splat(0.1),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance animations and particles by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        for object in self.objects.values_mut() {
            object.update(dt);
        }
        for emitter in self.emitters.values_mut() {
            emitter.update(dt);
        }
    }

    /// Total number of entities across every list
    pub fn entity_count(&self) -> usize {
        self.objects.len()
            + self.sprites.len()
            + self.point_lights.len()
            + self.directional_lights.len()
            + self.spot_lights.len()
            + self.texts.len()
            + self.emitters.len()
    }

    /// Remove every entity and the skybox
    pub fn clear(&mut self) {
        self.objects.clear();
        self.sprites.clear();
        self.point_lights.clear();
        self.directional_lights.clear();
        self.spot_lights.clear();
        self.texts.clear();
        self.emitters.clear();
        self.skybox = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::EmitterConfig;
    use crate::mesh::Mesh;
    use crate::transform::Transform;

    #[test]
    fn test_insertion_order_survives_removal() {
        let mut lights: EntityList<PointLightKey, PointLight> = EntityList::new();
        let keys = lights.extend((0..4).map(|i| PointLight::new(Vec3::new(i as f32, 0.0, 0.0), 5.0, Vec3::ONE, 1.0)));
        lights.remove(keys[1]);
        lights.insert(PointLight::new(Vec3::new(9.0, 0.0, 0.0), 5.0, Vec3::ONE, 1.0));

        let xs: Vec<f32> = lights.values().map(|l| l.position.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 3.0, 9.0]);
    }

    #[test]
    fn test_stale_key_after_remove() {
        let mut list: EntityList<TextKey, u32> = EntityList::new();
        let a = list.insert(1);
        assert_eq!(list.remove(a), Some(1));
        assert!(!list.contains(a));
        assert!(list.remove(a).is_none());
        // A reused slot gets a new generation
        let b = list.insert(2);
        assert!(list.get(a).is_none());
        assert_eq!(list.get(b), Some(&2));
    }

    #[test]
    fn test_update_advances_emitters() {
        let mut scene = Scene::new();
        let mut emitter = Emitter::with_seed(Transform::identity(), EmitterConfig::default(), 3);
        emitter.start();
        let key = scene.emitters.insert(emitter);
        scene.update(0.5);
        assert!(scene.emitters.get(key).unwrap().live_count() > 0);
    }

    #[test]
    fn test_entity_count_and_clear() {
        let mut scene = Scene::new();
        scene.objects.insert(Object3D::from_mesh(Mesh::cube(1.0), Transform::identity()));
        scene.point_lights.insert(PointLight::default());
        assert_eq!(scene.entity_count(), 2);
        scene.clear();
        assert_eq!(scene.entity_count(), 0);
    }
}
