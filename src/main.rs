//! Lumen demo scene
//!
//! Controls:
//! - Click: capture the cursor, Escape: release it (again to quit)
//! - WASD / Space / Shift: fly
//! - F: toggle fullscreen, G: toggle mouse smoothing, E: particle burst

use std::sync::Arc;

use lumen::config::AppConfig;
use lumen::Window;
use lumen_core::{
    CubeMap, DirectionalLight, Emitter, EmitterConfig, Font, Mesh, Object2D, Object3D, PointLight, SkyBox, Sprite,
    SpotLight, Text, Texture, Transform, Transform2D,
};
use lumen_input::{EventFlag, EventState};
use lumen_math::{Quat, Vec2, Vec3, Vec4};

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.debug.log_level)).init();
    log::info!("Starting Lumen");

    let mut window = match Window::from_config(&config) {
        Ok(window) => window,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let spinner = build_scene(&mut window);
    let mut controller = config.input.to_controller();

    loop {
        let locked = window.mouse_locked();
        let running = window.update_with(|frame| {
            controller.update(&mut frame.camera.transform, frame.events, frame.dt, locked);
            if let Some(cube) = frame.scene.objects.get_mut(spinner) {
                cube.transform.rotate_yaw(frame.dt);
            }
        });
        if !running {
            break;
        }

        let events = window.events();
        let released = |flag| events.get_flag(flag) == EventState::Released;
        let escape = released(EventFlag::KeyEscape);
        let fullscreen = released(EventFlag::KeyF);
        let smoothing = released(EventFlag::KeyG);
        let burst = released(EventFlag::KeyE);
        let clicked = events.check_flag(EventFlag::MouseButtonDown);

        if escape {
            if locked {
                window.lock_mouse(false);
            } else {
                window.close();
            }
        } else if clicked && !locked {
            window.lock_mouse(true);
        }
        if fullscreen {
            let on = !window.fullscreen();
            window.set_fullscreen(on);
        }
        if smoothing {
            let on = controller.toggle_smoothing();
            log::info!("Mouse smoothing {}", if on { "on" } else { "off" });
        }
        if burst {
            for emitter in window.scene.emitters.values_mut() {
                emitter.burst(32);
            }
        }
    }

    log::info!("Exiting");
}

/// Populate the demo scene; returns the key of the spinning cube
fn build_scene<P: lumen::Platform>(window: &mut Window<P>) -> lumen_core::ObjectKey {
    let floor = Object3D::from_mesh(
        Mesh::cube(1.0),
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)).with_scale(Vec3::new(20.0, 0.1, 20.0)),
    );
    let mut ball = Object3D::from_mesh(Mesh::sphere(0.75, 24, 16), Transform::from_position(Vec3::new(2.5, 0.75, 2.0)));
    if let Err(e) = ball.set_uniform("color", Vec4::new(0.9, 0.3, 0.2, 1.0)) {
        log::warn!("{}", e);
    }
    let cube = Object3D::from_mesh(Mesh::cube(1.0), Transform::from_position(Vec3::new(-1.5, 0.5, 3.0)));

    let keys = window.add_object_list([cube, floor, ball]);

    window.add_point_light_list([
        PointLight::new(Vec3::new(0.0, 3.0, 0.0), 12.0, Vec3::new(1.0, 0.9, 0.8), 1.5),
        PointLight::new(Vec3::new(-4.0, 2.0, 4.0), 8.0, Vec3::new(0.3, 0.5, 1.0), 1.0),
    ]);
    window.add_directional_light_list([DirectionalLight::new(
        Quat::from_unit(Vec3::new(-0.3, -1.0, 0.4)),
        Vec3::new(0.4, 0.4, 0.35),
    )]);
    let spot_position = Vec3::new(3.0, 4.0, -1.0);
    window.add_spot_light_list([SpotLight::new(
        spot_position,
        Quat::from_unit(Vec3::new(2.5, 0.0, 2.0) - spot_position),
        Vec3::new(1.0, 1.0, 0.6),
    )]);

    let mut sparks = Emitter::new(
        Transform::from_position_rotation(Vec3::new(0.0, 0.0, 5.0), Quat::from_unit(Vec3::Y)),
        EmitterConfig {
            max_particles: 256,
            spawn_rate: 40.0,
            gravity: Vec3::new(0.0, -3.0, 0.0),
            ..Default::default()
        },
    );
    sparks.start();
    window.add_emitter_list([sparks]);

    let badge = Sprite::new(Arc::new(Texture::solid([255, 200, 40, 200])));
    let mut badge_transform = Transform2D::from_position(Vec2::new(40.0, 40.0));
    badge_transform.scale = Vec2::new(32.0, 32.0);
    window.add_object2d_list([Object2D::new(badge, badge_transform, 0.0)]);

    let font = Arc::new(Font::blocks(8, 12));
    window.add_text_list([Text::new(
        "LUMEN",
        font,
        Transform2D::from_position(Vec2::new(70.0, 30.0)),
    )]);

    window.set_skybox(Some(SkyBox::new(Arc::new(CubeMap::solid([40, 60, 110, 255])))));

    keys[0]
}
