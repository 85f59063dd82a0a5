//! Particle emitters
//!
//! An [`Emitter`] owns a fixed pool of particle slots allocated up front.
//! Each slot cycles dead -> alive -> dead:
//!
//! - A spawn is due every `1 / spawn_rate` seconds while emitting. It takes
//!   the first dead slot; if every slot is alive the spawn is dropped.
//! - An alive particle ages by `dt` each update and dies once its age
//!   reaches its lifetime. Dying resets the age to zero.
//!
//! [`Emitter::stop`] only stops new spawns. Particles already alive keep
//! moving and fade out normally.

use std::sync::Arc;

use lumen_math::{Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::texture::Texture;
use crate::transform::Transform;

/// Emission parameters
///
/// Ranges are sampled uniformly per particle; a range with `min == max` is
/// a constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Pool size; never more particles than this are alive
    pub max_particles: usize,
    /// Particles per second while emitting
    pub spawn_rate: f32,
    /// Particles spawned at once by [`Emitter::start`]
    pub burst_count: usize,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Maximum deviation from the emitter's forward axis, in radians
    pub spread: f32,
    /// Fraction of velocity lost per second
    pub velocity_decay: f32,
    /// Constant acceleration in world units per second squared
    pub gravity: Vec3,
    pub start_color_min: Vec4,
    pub start_color_max: Vec4,
    pub end_color: Vec4,
    pub start_size_min: Vec2,
    pub start_size_max: Vec2,
    pub end_size: Vec2,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_particles: 100,
            spawn_rate: 20.0,
            burst_count: 0,
            lifetime_min: 1.0,
            lifetime_max: 2.0,
            speed_min: 1.0,
            speed_max: 2.0,
            spread: 0.3,
            velocity_decay: 0.0,
            gravity: Vec3::ZERO,
            start_color_min: Vec4::rgba(1.0, 1.0, 1.0, 1.0),
            start_color_max: Vec4::rgba(1.0, 1.0, 1.0, 1.0),
            end_color: Vec4::rgba(1.0, 1.0, 1.0, 0.0),
            start_size_min: Vec2::new(0.1, 0.1),
            start_size_max: Vec2::new(0.1, 0.1),
            end_size: Vec2::new(0.1, 0.1),
        }
    }
}

/// One particle slot
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    /// World-space position
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds since spawn; zero while dead
    pub age: f32,
    pub lifetime: f32,
    pub color: Vec4,
    pub size: Vec2,
    pub alive: bool,
    start_color: Vec4,
    start_size: Vec2,
}

impl Particle {
    /// Age as a fraction of lifetime
    pub fn progress(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// A source of billboard particles
#[derive(Clone, Debug)]
pub struct Emitter {
    /// Spawn position, and the rotation whose forward axis particles leave along
    pub transform: Transform,
    pub config: EmitterConfig,
    /// Billboard texture; white when unset
    pub texture: Option<Arc<Texture>>,
    particles: Vec<Particle>,
    emitting: bool,
    spawn_accumulator: f32,
    rng: StdRng,
}

/// Uniform sample from a range given in either order
fn sample(rng: &mut StdRng, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

impl Emitter {
    /// A stopped emitter with an entropy-seeded generator
    pub fn new(transform: Transform, config: EmitterConfig) -> Self {
        Self::with_rng(transform, config, StdRng::from_entropy())
    }

    /// A stopped emitter with a fixed seed, for reproducible effects
    pub fn with_seed(transform: Transform, config: EmitterConfig, seed: u64) -> Self {
        Self::with_rng(transform, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(transform: Transform, config: EmitterConfig, rng: StdRng) -> Self {
        let particles = vec![Particle::default(); config.max_particles];
        Self {
            transform,
            config,
            texture: None,
            particles,
            emitting: false,
            spawn_accumulator: 0.0,
            rng,
        }
    }

    /// Begin spawning and fire the configured burst
    pub fn start(&mut self) {
        self.emitting = true;
        self.burst(self.config.burst_count);
    }

    /// Stop spawning; live particles carry on
    pub fn stop(&mut self) {
        self.emitting = false;
        self.spawn_accumulator = 0.0;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Spawn up to `count` particles now, dropping any that don't fit
    ///
    /// Returns how many were spawned.
    pub fn burst(&mut self, count: usize) -> usize {
        (0..count).take_while(|_| self.spawn()).count()
    }

    /// Age, move and recolor live particles, then spawn what is due
    pub fn update(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }

        let drag = (1.0 - self.config.velocity_decay.clamp(0.0, 1.0)).powf(dt);
        let gravity = self.config.gravity;
        let end_color = self.config.end_color;
        let end_size = self.config.end_size;

        for p in self.particles.iter_mut().filter(|p| p.alive) {
            p.age += dt;
            if p.age >= p.lifetime {
                p.alive = false;
                p.age = 0.0;
                continue;
            }
            p.velocity = (p.velocity + gravity * dt) * drag;
            p.position += p.velocity * dt;
            let t = p.progress();
            p.color = p.start_color.lerp(end_color, t);
            p.size = p.start_size.lerp(end_size, t);
        }

        if self.emitting && self.config.spawn_rate > 0.0 {
            self.spawn_accumulator += dt * self.config.spawn_rate;
            let due = self.spawn_accumulator.floor();
            self.spawn_accumulator -= due;
            for _ in 0..due as usize {
                // Full pool: the rest are dropped, not queued
                if !self.spawn() {
                    break;
                }
            }
        }
    }

    /// Bring the first dead slot to life; false if the pool is full
    fn spawn(&mut self) -> bool {
        let Some(index) = self.particles.iter().position(|p| !p.alive) else {
            return false;
        };

        let c = &self.config;
        let rng = &mut self.rng;

        let mut direction = self.transform.rotation;
        direction.rotate(Vec3::Z, sample(rng, 0.0, std::f32::consts::TAU));
        direction.rotate(Vec3::Y, sample(rng, -c.spread, c.spread));
        direction.rotate(Vec3::X, sample(rng, -c.spread, c.spread));
        let speed = sample(rng, c.speed_min, c.speed_max);

        let color = Vec4::new(
            sample(rng, c.start_color_min.x, c.start_color_max.x),
            sample(rng, c.start_color_min.y, c.start_color_max.y),
            sample(rng, c.start_color_min.z, c.start_color_max.z),
            sample(rng, c.start_color_min.w, c.start_color_max.w),
        );
        let size = Vec2::new(
            sample(rng, c.start_size_min.x, c.start_size_max.x),
            sample(rng, c.start_size_min.y, c.start_size_max.y),
        );
        let lifetime = sample(rng, c.lifetime_min, c.lifetime_max).max(f32::EPSILON);

        self.particles[index] = Particle {
            position: self.transform.position,
            velocity: direction.forward() * speed,
            age: 0.0,
            lifetime,
            color,
            size,
            alive: true,
            start_color: color,
            start_size: size,
        };
        true
    }

    /// Every slot, dead or alive
    pub fn slots(&self) -> &[Particle] {
        &self.particles
    }

    /// Live particles
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.alive)
    }

    pub fn live_count(&self) -> usize {
        self.particles().count()
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn emitter(config: EmitterConfig) -> Emitter {
        Emitter::with_seed(Transform::identity(), config, 7)
    }

    #[test]
    fn test_stopped_emitter_spawns_nothing() {
        let mut e = emitter(EmitterConfig::default());
        e.update(1.0);
        assert_eq!(e.live_count(), 0);
    }

    #[test]
    fn test_spawn_rate_accumulates() {
        let mut e = emitter(EmitterConfig {
            spawn_rate: 10.0,
            lifetime_min: 100.0,
            lifetime_max: 100.0,
            ..Default::default()
        });
        e.start();
        // 0.25 s at 10/s: two due, half a spawn carried over
        e.update(0.25);
        assert_eq!(e.live_count(), 2);
        e.update(0.05);
        assert_eq!(e.live_count(), 3);
    }

    #[test]
    fn test_pool_never_overflows() {
        let mut e = emitter(EmitterConfig {
            max_particles: 8,
            spawn_rate: 1000.0,
            burst_count: 50,
            lifetime_min: 100.0,
            lifetime_max: 100.0,
            ..Default::default()
        });
        e.start();
        assert_eq!(e.live_count(), 8);
        for _ in 0..20 {
            e.update(0.1);
            assert!(e.live_count() <= 8);
        }
        assert_eq!(e.capacity(), 8);
    }

    #[test]
    fn test_burst_reports_dropped() {
        let mut e = emitter(EmitterConfig {
            max_particles: 3,
            ..Default::default()
        });
        assert_eq!(e.burst(5), 3);
        assert_eq!(e.burst(1), 0);
    }

    #[test]
    fn test_age_increases_then_resets() {
        let mut e = emitter(EmitterConfig {
            max_particles: 1,
            spawn_rate: 0.0,
            lifetime_min: 1.0,
            lifetime_max: 1.0,
            ..Default::default()
        });
        e.burst(1);
        let mut last = 0.0;
        for _ in 0..4 {
            e.update(0.2);
            let age = e.slots()[0].age;
            assert!(age > last, "age went from {} to {}", last, age);
            last = age;
        }
        e.update(0.5);
        assert!(!e.slots()[0].alive);
        assert_eq!(e.slots()[0].age, 0.0);
    }

    #[test]
    fn test_stop_lets_particles_live() {
        let mut e = emitter(EmitterConfig {
            spawn_rate: 10.0,
            lifetime_min: 1.0,
            lifetime_max: 1.0,
            ..Default::default()
        });
        e.start();
        e.update(0.5);
        let live = e.live_count();
        assert!(live > 0);

        e.stop();
        e.update(0.1);
        assert_eq!(e.live_count(), live);
        e.update(2.0);
        assert_eq!(e.live_count(), 0);
    }

    #[test]
    fn test_zero_spread_follows_forward() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
        transform.rotate_yaw(std::f32::consts::FRAC_PI_2);
        let mut e = Emitter::with_seed(
            transform,
            EmitterConfig {
                spread: 0.0,
                speed_min: 2.0,
                speed_max: 2.0,
                ..Default::default()
            },
            1,
        );
        e.burst(1);
        let p = e.particles().next().unwrap();
        assert!((p.velocity - Vec3::new(2.0, 0.0, 0.0)).length() < EPSILON, "got {:?}", p.velocity);
        assert_eq!(p.position, Vec3::new(0.0, 1.0, 0.0));

        e.update(0.5);
        let p = e.particles().next().unwrap();
        assert!((p.position - Vec3::new(1.0, 1.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_color_and_size_interpolate() {
        let mut e = emitter(EmitterConfig {
            lifetime_min: 2.0,
            lifetime_max: 2.0,
            start_color_min: Vec4::rgba(1.0, 0.0, 0.0, 1.0),
            start_color_max: Vec4::rgba(1.0, 0.0, 0.0, 1.0),
            end_color: Vec4::rgba(0.0, 0.0, 1.0, 0.0),
            start_size_min: Vec2::new(2.0, 2.0),
            start_size_max: Vec2::new(2.0, 2.0),
            end_size: Vec2::new(0.0, 0.0),
            ..Default::default()
        });
        e.burst(1);
        e.update(1.0);
        let p = e.particles().next().unwrap();
        assert!((p.color - Vec4::rgba(0.5, 0.0, 0.5, 0.5)).length() < EPSILON, "got {:?}", p.color);
        assert!((p.size.x - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_velocity_decay() {
        let mut e = emitter(EmitterConfig {
            spread: 0.0,
            speed_min: 4.0,
            speed_max: 4.0,
            velocity_decay: 0.5,
            lifetime_min: 10.0,
            lifetime_max: 10.0,
            ..Default::default()
        });
        e.burst(1);
        e.update(1.0);
        let speed = e.particles().next().unwrap().velocity.length();
        assert!((speed - 2.0).abs() < EPSILON, "Expected 2, got {}", speed);
    }
}
