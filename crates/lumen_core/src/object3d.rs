//! 3D objects: a shared model placed in the world
//!
//! An [`Object3D`] owns its transform, an optional material override,
//! per-object uniform values, its colliders and an animation cursor. The
//! model itself is shared and never modified; per-object variation goes
//! through the transform and uniforms.

use std::collections::HashMap;
use std::sync::Arc;

use lumen_math::{Mat4, Vec3};
use lumen_physics::{Aabb, Collision, Obb};

use crate::animation::AnimationState;
use crate::collider::{Collider, WorldShape};
use crate::material::{Material, UniformError, UniformValue};
use crate::mesh::Mesh;
use crate::model::Model;
use crate::transform::Transform;

/// A model instance in the scene
#[derive(Clone, Debug)]
pub struct Object3D {
    pub transform: Transform,
    /// Overrides the default lit material when set
    pub material: Option<Material>,
    /// Starts with one box around the model's bounds
    pub colliders: Vec<Collider>,
    pub visible: bool,
    model: Arc<Model>,
    uniforms: HashMap<String, UniformValue>,
    animation: Option<AnimationState>,
    pose: Vec<Mat4>,
}

impl Object3D {
    pub fn new(model: Arc<Model>, transform: Transform) -> Self {
        let pose = model.skeleton().map(|s| s.rest_pose()).unwrap_or_default();
        Self {
            transform,
            material: None,
            colliders: vec![Collider::bounding_box(&model)],
            visible: true,
            model,
            uniforms: HashMap::new(),
            animation: None,
            pose,
        }
    }

    /// An object around a single mesh
    pub fn from_mesh(mesh: Mesh, transform: Transform) -> Self {
        Self::new(Arc::new(Model::from_mesh(mesh)), transform)
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Set a uniform for this object only
    ///
    /// With a material override the value is checked right away. Without
    /// one it is checked against the default material when drawn, and a bad
    /// value skips the draw.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), UniformError> {
        let value = value.into();
        if let Some(material) = &self.material {
            material.check_uniform(name, &value)?;
        }
        self.uniforms.insert(name.to_string(), value);
        Ok(())
    }

    pub fn uniforms(&self) -> &HashMap<String, UniformValue> {
        &self.uniforms
    }

    pub fn clear_uniforms(&mut self) {
        self.uniforms.clear();
    }

    /// Start a clip by name from its beginning
    ///
    /// Returns false, and leaves the current clip running, if the model has
    /// no skeleton or no clip with that name.
    pub fn play_animation(&mut self, name: &str, looping: bool) -> bool {
        if self.model.skeleton().is_none() || self.model.animation(name).is_none() {
            log::warn!("Model '{}' has no animation '{}'", self.model.name(), name);
            return false;
        }
        self.animation = Some(AnimationState::new(name, looping));
        self.refresh_pose();
        true
    }

    /// Stop animating and return to the rest pose
    pub fn stop_animation(&mut self) {
        self.animation = None;
        self.refresh_pose();
    }

    pub fn animation(&self) -> Option<&AnimationState> {
        self.animation.as_ref()
    }

    pub fn animation_mut(&mut self) -> Option<&mut AnimationState> {
        self.animation.as_mut()
    }

    /// Advance the running clip by `dt` seconds and recompute the pose
    pub fn update(&mut self, dt: f32) {
        let Some(state) = self.animation.as_mut() else {
            return;
        };
        let duration = self.model.animation(&state.clip).map_or(0.0, |c| c.duration());
        state.advance(dt, duration);
        self.refresh_pose();
    }

    fn refresh_pose(&mut self) {
        let Some(skeleton) = self.model.skeleton() else {
            return;
        };
        self.pose = match &self.animation {
            Some(state) => skeleton.pose(self.model.animation(&state.clip), state.time),
            None => skeleton.rest_pose(),
        };
    }

    /// Skinning matrices for the current frame; empty for unskinned models
    pub fn pose(&self) -> &[Mat4] {
        &self.pose
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// World-space box around the model's bind-pose bounds
    pub fn world_bounds(&self) -> Aabb {
        let obb = Obb::from_aabb(&self.model.bounds(), self.model_matrix());
        Aabb::from_points(&obb.corners()).unwrap_or(Aabb::new(obb.center, obb.center))
    }

    /// Colliders placed in the world
    ///
    /// An object without colliders is tested by its oriented bounding box.
    pub fn collision_shapes(&self) -> Vec<WorldShape> {
        if self.colliders.is_empty() {
            return vec![WorldShape::Box(Obb::from_aabb(&self.model.bounds(), self.model_matrix()))];
        }
        self.colliders.iter().map(|c| c.world_shape(&self.transform)).collect()
    }

    /// First overlap between this object's shapes and `other`'s
    ///
    /// The normal points from `other` toward this object.
    pub fn get_collision(&self, other: &Object3D) -> Collision {
        let theirs = other.collision_shapes();
        self.collision_shapes()
            .iter()
            .find_map(|mine| theirs.iter().find_map(|shape| mine.intersect(shape)))
            .into()
    }

    pub fn check_collision(&self, other: &Object3D) -> bool {
        self.get_collision(other).hit
    }

    pub fn check_collision_point(&self, point: Vec3) -> bool {
        self.collision_shapes().iter().any(|shape| shape.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, Interpolation, Joint, JointTrack, Keyframes, Skeleton};
    use lumen_math::{mat4, Quat};

    const EPSILON: f32 = 0.0001;

    fn cube_at(position: Vec3) -> Object3D {
        Object3D::from_mesh(Mesh::cube(1.0), Transform::from_position(position))
    }

    fn swinging_model() -> Arc<Model> {
        let joints = vec![Joint {
            name: "root".into(),
            parent: None,
            rest: Transform::identity(),
            inverse_bind: mat4::IDENTITY,
        }];
        let quarter = Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2);
        let clip = AnimationClip::new(
            "swing",
            [(
                0,
                JointTrack {
                    rotations: Keyframes::new(vec![0.0, 1.0], vec![Quat::IDENTITY, quarter], Interpolation::Linear),
                    ..Default::default()
                },
            )],
        );
        let skeleton = Skeleton::new(joints, mat4::IDENTITY);
        Arc::new(Model::new("rig", vec![Mesh::cube(1.0)], Some(skeleton), vec![clip]))
    }

    #[test]
    fn test_default_box_collider() {
        let a = cube_at(Vec3::ZERO);
        assert_eq!(a.colliders.len(), 1);
        assert!(a.check_collision_point(Vec3::new(0.4, 0.4, 0.4)));
        assert!(!a.check_collision_point(Vec3::new(0.6, 0.0, 0.0)));
    }

    #[test]
    fn test_object_vs_object() {
        let a = cube_at(Vec3::ZERO);
        let b = cube_at(Vec3::new(0.8, 0.0, 0.0));
        let c = cube_at(Vec3::new(2.0, 0.0, 0.0));

        let hit = a.get_collision(&b);
        assert!(hit.hit);
        assert!((hit.normal - (-Vec3::X)).length() < EPSILON, "Expected -X, got {:?}", hit.normal);
        assert!(!a.check_collision(&c));
    }

    #[test]
    fn test_object_without_colliders_uses_bounds() {
        let mut a = cube_at(Vec3::ZERO);
        a.colliders.clear();
        let b = cube_at(Vec3::new(0.8, 0.0, 0.0));

        assert!(a.check_collision(&b), "Expected the bounding box to overlap");
        assert!(b.check_collision(&a));
        assert!(a.check_collision_point(Vec3::new(0.4, 0.0, 0.0)));
        assert!(!a.check_collision_point(Vec3::new(0.6, 0.0, 0.0)));
        assert!(!a.check_collision(&cube_at(Vec3::new(2.0, 0.0, 0.0))));
    }

    #[test]
    fn test_collision_tracks_transform() {
        let a = cube_at(Vec3::ZERO);
        let mut b = cube_at(Vec3::new(5.0, 0.0, 0.0));
        assert!(!a.check_collision(&b));
        b.transform.position = Vec3::new(0.5, 0.0, 0.0);
        assert!(a.check_collision(&b));
    }

    #[test]
    fn test_world_bounds_rotated() {
        let mut a = cube_at(Vec3::new(1.0, 0.0, 0.0));
        a.transform.rotate_yaw(std::f32::consts::FRAC_PI_4);
        let bounds = a.world_bounds();
        let half_diagonal = 0.5 * std::f32::consts::SQRT_2;
        assert!((bounds.max.x - (1.0 + half_diagonal)).abs() < EPSILON, "got {:?}", bounds);
    }

    #[test]
    fn test_uniform_checked_against_override() {
        let mut a = cube_at(Vec3::ZERO).with_material(Material::default_lit().unwrap());
        assert!(a.set_uniform("shininess", 4.0f32).is_ok());
        assert!(a.set_uniform("shininess", 4i32).is_err());
        assert!(a.set_uniform("glow", 1.0f32).is_err());
        assert_eq!(a.uniforms().len(), 1);
    }

    #[test]
    fn test_uniform_deferred_without_override() {
        let mut a = cube_at(Vec3::ZERO);
        assert!(a.set_uniform("glow", 1.0f32).is_ok());
        assert_eq!(a.uniforms().get("glow"), Some(&UniformValue::Float(1.0)));
    }

    #[test]
    fn test_play_unknown_animation() {
        let mut a = cube_at(Vec3::ZERO);
        assert!(!a.play_animation("walk", true));
        assert!(a.animation().is_none());

        let mut rigged = Object3D::new(swinging_model(), Transform::identity());
        assert!(!rigged.play_animation("walk", true));
    }

    #[test]
    fn test_animation_advances_pose() {
        let mut a = Object3D::new(swinging_model(), Transform::identity());
        assert_eq!(a.pose().len(), 1);
        assert!(a.play_animation("swing", false));

        a.update(0.5);
        let p = mat4::transform_point(a.pose()[0], Vec3::X);
        let expected = Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4).rotate_vector(Vec3::X);
        assert!((p - expected).length() < EPSILON, "Expected {:?}, got {:?}", expected, p);

        a.update(1.0);
        assert!(a.animation().unwrap().is_finished());

        a.stop_animation();
        let p = mat4::transform_point(a.pose()[0], Vec3::X);
        assert!((p - Vec3::X).length() < EPSILON);
    }
}
