//! Frame loop scenarios run against the headless platform

use std::sync::Arc;

use lumen::{HeadlessPlatform, Window, WindowState};
use lumen_core::{
    AudioMixer, CubeMap, Emitter, EmitterConfig, Font, Mesh, Object2D, Object3D, PointLight, SkyBox, Sound, Sprite, Text,
    Texture, Transform, Transform2D, MAX_POINT_LIGHTS,
};
use lumen_input::{EventFlag, InputEvent};
use lumen_math::{Vec2, Vec3};
use lumen_render::{Camera, DrawPass, RenderError};

fn window() -> Window<HeadlessPlatform> {
    Window::headless(800, 600, Camera::default()).unwrap()
}

fn cube_at(z: f32) -> Object3D {
    Object3D::from_mesh(Mesh::cube(1.0), Transform::from_position(Vec3::new(0.0, 0.0, z)))
}

fn sprite(depth: f32) -> Object2D {
    let sprite = Sprite::new(Arc::new(Texture::white()));
    Object2D::new(sprite, Transform2D::from_position(Vec2::new(100.0, 100.0)), depth)
}

#[test]
fn test_extra_point_lights_are_truncated() {
    let mut window = window();
    let lights: Vec<_> = (0..MAX_POINT_LIGHTS + 1)
        .map(|i| PointLight::new(Vec3::new(i as f32, 2.0, 0.0), 10.0, Vec3::ONE, 1.0))
        .collect();
    window.add_point_light_list(lights);
    window.add_object_list([cube_at(5.0)]);

    assert!(window.update());

    let frame = window.platform().recorder().last_frame().unwrap();
    assert_eq!(frame.light_counts[0], MAX_POINT_LIGHTS as u32);
    assert_eq!(frame.stats.dropped_lights, 1);
    assert_eq!(frame.stats.mesh_draws, 1);
    assert_eq!(window.scene.point_lights.len(), MAX_POINT_LIGHTS + 1);
}

#[test]
fn test_update_after_quit_is_inert() {
    let mut window = window();
    window.add_object_list([cube_at(5.0)]);
    assert!(window.update());

    window.platform_mut().push_event(InputEvent::Quit);
    assert!(!window.update());
    assert_eq!(window.state(), WindowState::Closed);

    let frames = window.platform().recorder().frame_count();
    let time = window.time_ns();
    assert!(!window.update());
    assert!(!window.update());
    assert_eq!(window.platform().recorder().frame_count(), frames);
    assert_eq!(window.time_ns(), time);
}

#[test]
fn test_object_without_material_uses_default() {
    let mut window = window();
    window.add_object_list([cube_at(5.0)]);
    window.update();

    let stats = window.frame_stats();
    assert_eq!(stats.mesh_draws, 1, "Expected one draw, got {:?}", stats);
    assert_eq!(stats.skipped_draws, 0);
    assert!(window.scene.objects.values().next().unwrap().material.is_none());
}

#[test]
fn test_bad_uniform_skips_only_that_object() {
    let mut window = window();
    let mut broken = cube_at(5.0);
    broken.set_uniform("no_such_uniform", 1.0f32).unwrap();
    window.add_object_list([broken, cube_at(6.0)]);

    assert!(window.update());
    let stats = window.frame_stats();
    assert_eq!(stats.mesh_draws, 1, "Expected one surviving draw, got {:?}", stats);
    assert_eq!(stats.skipped_draws, 1);
    assert!(window.is_open());
}

#[test]
fn test_draw_order_across_passes() {
    let mut window = window();
    window.add_text_list([Text::new("hi", Arc::new(Font::blocks(4, 6)), Transform2D::default())]);
    window.add_object2d_list([sprite(1.0)]);
    let mut emitter = Emitter::with_seed(
        Transform::from_position(Vec3::new(0.0, 0.0, 5.0)),
        EmitterConfig {
            burst_count: 8,
            spawn_rate: 0.0,
            lifetime_min: 10.0,
            lifetime_max: 10.0,
            ..Default::default()
        },
        7,
    );
    emitter.start();
    window.add_emitter_list([emitter]);
    window.add_object_list([cube_at(5.0)]);
    window.set_skybox(Some(SkyBox::new(Arc::new(CubeMap::solid([0, 0, 255, 255])))));

    window.update();

    let frame = window.platform().recorder().last_frame().unwrap();
    assert_eq!(
        frame.passes,
        vec![DrawPass::Sky, DrawPass::Opaque, DrawPass::Particles, DrawPass::Sprites, DrawPass::Text]
    );
    assert_eq!(frame.stats.particles, 8);
}

#[test]
fn test_particle_pool_never_exceeds_capacity() {
    let mut window = window();
    let mut emitter = Emitter::with_seed(
        Transform::from_position(Vec3::new(0.0, 0.0, 5.0)),
        EmitterConfig {
            max_particles: 12,
            burst_count: 40,
            spawn_rate: 10_000.0,
            lifetime_min: 10.0,
            lifetime_max: 10.0,
            ..Default::default()
        },
        3,
    );
    emitter.start();
    window.add_emitter_list([emitter]);

    for _ in 0..5 {
        window.update();
        let emitter = window.scene.emitters.values().next().unwrap();
        assert!(emitter.live_count() <= 12, "Expected at most 12, got {}", emitter.live_count());
    }
    assert_eq!(window.frame_stats().particles, 12);
}

#[test]
fn test_sprites_drawn_back_to_front() {
    let mut window = window();
    let near = Sprite::new(Arc::new(Texture::solid([255, 0, 0, 255])));
    let far = Sprite::new(Arc::new(Texture::solid([0, 255, 0, 255])));
    window.add_object2d_list([
        Object2D::new(near, Transform2D::default(), 5.0),
        Object2D::new(far, Transform2D::default(), -5.0),
    ]);
    window.update();

    let frame = window.platform().recorder().last_frame().unwrap();
    assert_eq!(frame.passes, vec![DrawPass::Sprites, DrawPass::Sprites]);
    assert_eq!(frame.stats.sprites, 2);
}

#[test]
fn test_failed_submit_does_not_stop_the_loop() {
    let mut window = window();
    window.add_object_list([cube_at(5.0)]);
    window.platform_mut().recorder_mut().fail_next_submit(|| RenderError::SurfaceLost);
    assert!(window.update());
    window.platform_mut().recorder_mut().fail_next_submit(|| RenderError::OutOfMemory);
    assert!(window.update());
    assert!(window.update());
    assert_eq!(window.platform().recorder().frame_count(), 1);
    assert!(window.is_open());
}

#[test]
fn test_released_key_lasts_one_frame() {
    let mut window = window();
    window.platform_mut().push_event(InputEvent::Key { flag: EventFlag::KeySpace, pressed: true });
    window.update();
    assert!(window.events().is_pressed(EventFlag::KeySpace));

    window.update();
    assert!(window.events().is_pressed(EventFlag::KeySpace), "Held keys stay pressed");

    window.platform_mut().push_event(InputEvent::Key { flag: EventFlag::KeySpace, pressed: false });
    window.update();
    assert!(window.events().check_flag(EventFlag::KeySpace));
    window.update();
    assert!(!window.events().check_flag(EventFlag::KeySpace));
}

#[test]
fn test_mouse_motion_is_per_frame() {
    let mut window = window();
    window.platform_mut().push_event(InputEvent::MouseMotion { dx: 3.0, dy: -2.0 });
    window.platform_mut().push_event(InputEvent::MouseMotion { dx: 1.0, dy: 0.0 });
    window.update();
    assert_eq!((window.events().mouse.rel_x, window.events().mouse.rel_y), (4.0, -2.0));
    window.update();
    assert_eq!((window.events().mouse.rel_x, window.events().mouse.rel_y), (0.0, 0.0));
}

#[test]
fn test_sounds_go_to_the_mixer() {
    let mut window = window();
    let beep = Sound::from_samples(vec![0.0; 64], 1, 8000);
    let music = Sound::from_samples(vec![0.0; 64], 2, 8000).with_looping(true);

    window.play_sound(&beep);
    let playback = window.play_sound(&music);
    assert_eq!(window.platform().silent_mixer().history(), &[beep.id(), music.id()]);

    window.stop_sound(playback);
    window.close();
    assert_eq!(window.platform().silent_mixer().active(), 0);
}
