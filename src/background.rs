//! Ambient decoration behind the scenes: snow, fairy lights, drifting ornaments,
//! hearts, the sleigh and a sparkle trail that follows the cursor. None of it
//! looks at which scene is active.

use std::f32::consts::{PI, TAU};

use bevy::{prelude::*, render::view::RenderLayers, window::PrimaryWindow};
use rand::Rng;

use crate::{MainCamera, OVERLAY_LAYER, WINDOW_HEIGHT, WINDOW_WIDTH};

const SNOWFLAKES: usize = 100;
const FAIRY_LIGHTS: usize = 8;
const HEARTS: usize = 12;
const FOOTER_PINES: usize = 8;

const SLEIGH_DELAY: f32 = 5.0;
const SLEIGH_CROSSING: f32 = 15.0;
const SPARKLE_LIFE: f32 = 1.0;

const LIGHT_COLORS: [Color; 4] = [
    Color::srgb(0.94, 0.27, 0.27),
    Color::srgb(0.98, 0.8, 0.08),
    Color::srgb(0.38, 0.65, 0.98),
    Color::srgb(0.29, 0.87, 0.5),
];

const SPARKLE_COLORS: [Color; 4] = [
    Color::srgb(1.0, 0.84, 0.0),
    Color::srgb(1.0, 0.41, 0.71),
    Color::WHITE,
    Color::srgb(1.0, 0.0, 0.0),
];

pub struct BackgroundPlugin;

impl Plugin for BackgroundPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_background).add_systems(
            Update,
            (
                animate_snow,
                place_footer,
                animate_lights,
                animate_ornaments,
                animate_hearts,
                animate_sleigh,
                spawn_sparkles,
                animate_sparkles,
            ),
        );
    }
}

#[derive(Component)]
struct Snowflake {
    radius: f32,
    speed: f32,
    phase: f32,
}

impl Snowflake {
    /// Position after `dt` seconds. Speeds are in pixels per 60 Hz frame.
    fn fall(&self, pos: Vec2, dt: f32) -> Vec2 {
        let frames = dt * 60.0;
        Vec2::new(
            pos.x + self.phase.sin() * 0.4 * frames,
            pos.y - self.speed * frames,
        )
    }

    fn below(&self, y: f32, half_height: f32) -> bool {
        y + self.radius < -half_height
    }
}

#[derive(Component)]
struct FairyLight(usize);

/// One of the faint trees spread along the bottom edge.
#[derive(Component)]
struct FooterPine(usize);

/// Ornament rising slowly from below the screen to above it.
#[derive(Component)]
struct Ornament {
    from_x: f32,
    to_x: f32,
    duration: f32,
    delay: f32,
}

#[derive(Component)]
struct Heart {
    period: f32,
    delay: f32,
}

#[derive(Component)]
struct SleighPart {
    offset: Vec2,
}

#[derive(Component)]
struct Sparkle {
    origin: Vec2,
    drift: Vec2,
    age: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SleighPose {
    /// Fraction of the window width, from the left edge.
    x: f32,
    /// Fraction of the window height, from the top edge.
    y: f32,
    alpha: f32,
}

/// Where the sleigh is `elapsed` seconds after startup, if it is out at all.
fn sleigh_pose(elapsed: f32) -> Option<SleighPose> {
    if elapsed < SLEIGH_DELAY {
        return None;
    }
    let p = ((elapsed - SLEIGH_DELAY) % SLEIGH_CROSSING) / SLEIGH_CROSSING;
    let alpha = if p < 1.0 / 3.0 {
        p * 3.0
    } else if p > 2.0 / 3.0 {
        (1.0 - p) * 3.0
    } else {
        1.0
    };
    Some(SleighPose {
        x: -0.2 + 1.4 * p,
        y: 0.15 - 0.05 * (1.0 - (2.0 * p - 1.0).abs()),
        alpha,
    })
}

/// Centre of footer tree `i`, as a fraction of the window width from the left edge.
fn footer_slot(i: usize) -> f32 {
    (i as f32 + 0.5) / FOOTER_PINES as f32
}

/// The primary window's size. A minimised window reports zero, which would leave
/// nothing to scatter the decoration over, so the design size stands in.
fn usable_size(size: Option<Vec2>) -> Vec2 {
    size.filter(|s| s.x > 0.0 && s.y > 0.0)
        .unwrap_or(Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT))
}

fn window_size(windows: &Query<&Window, With<PrimaryWindow>>) -> Vec2 {
    usable_size(windows.get_single().map(|w| w.size()).ok())
}

fn setup_background(
    mut cmd: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let size = window_size(&windows);
    let half = size / 2.0;
    let mut rng = rand::rng();

    for _ in 0..SNOWFLAKES {
        let radius = rng.random_range(1.0..5.0);
        let alpha = rng.random_range(0.2..0.8);
        cmd.spawn((
            Mesh2d(meshes.add(Circle::new(radius))),
            MeshMaterial2d(mats.add(ColorMaterial::from(Color::srgba(1.0, 1.0, 1.0, alpha)))),
            Transform::from_xyz(
                rng.random_range(-half.x..half.x),
                rng.random_range(-half.y..half.y),
                -5.0,
            ),
            Snowflake {
                radius,
                speed: rng.random_range(0.3..1.0),
                phase: rng.random_range(0.0..SNOWFLAKES as f32),
            },
        ));
    }

    // Pine corners
    let pine = meshes.add(RegularPolygon::new(70.0, 3));
    let pine_mat = mats.add(ColorMaterial::from(Color::srgba(0.08, 0.33, 0.16, 0.6)));
    for (x, tilt) in [(-half.x + 70.0, -0.2), (half.x - 70.0, 0.2)] {
        cmd.spawn((
            Mesh2d(pine.clone()),
            MeshMaterial2d(pine_mat.clone()),
            Transform::from_xyz(x, half.y - 60.0, -8.0).with_rotation(Quat::from_rotation_z(tilt)),
        ));
    }

    let footer = meshes.add(RegularPolygon::new(48.0, 3));
    let footer_mat = mats.add(ColorMaterial::from(Color::srgba(0.13, 0.55, 0.25, 0.15)));
    for i in 0..FOOTER_PINES {
        cmd.spawn((
            Mesh2d(footer.clone()),
            MeshMaterial2d(footer_mat.clone()),
            Transform::from_xyz((footer_slot(i) - 0.5) * size.x, -half.y + 30.0, -2.0),
            FooterPine(i),
        ));
    }

    let bulb = meshes.add(Circle::new(6.0));
    for i in 0..FAIRY_LIGHTS {
        let x = (i as f32 - (FAIRY_LIGHTS as f32 - 1.0) / 2.0) * 28.0;
        cmd.spawn((
            Mesh2d(bulb.clone()),
            MeshMaterial2d(mats.add(ColorMaterial::from(LIGHT_COLORS[i % LIGHT_COLORS.len()]))),
            Transform::from_xyz(x, half.y - 24.0, -4.0),
            FairyLight(i),
        ));
    }

    let shapes = [3, 4, 5, 6, 8, 5, 4, 6];
    for (i, sides) in shapes.into_iter().enumerate() {
        let hue = i as f32 / shapes.len() as f32 * 360.0;
        cmd.spawn((
            Mesh2d(meshes.add(RegularPolygon::new(28.0, sides))),
            MeshMaterial2d(mats.add(ColorMaterial::from(Color::hsla(hue, 0.7, 0.6, 0.2)))),
            Transform::from_xyz(0.0, -size.y, -10.0),
            Ornament {
                from_x: rng.random_range(0.1..0.9),
                to_x: rng.random_range(0.1..0.9),
                duration: rng.random_range(20.0..35.0),
                delay: i as f32 * 4.0,
            },
        ));
    }

    let heart = meshes.add(RegularPolygon::new(26.0, 4));
    for i in 0..HEARTS {
        cmd.spawn((
            Mesh2d(heart.clone()),
            MeshMaterial2d(mats.add(ColorMaterial::from(Color::srgba(0.93, 0.28, 0.6, 0.05)))),
            Transform::from_xyz(
                (rng.random_range(0.0..0.95) - 0.5) * size.x,
                (0.5 - rng.random_range(0.0..0.95)) * size.y,
                -9.0,
            ),
            Heart {
                period: rng.random_range(5.0..10.0),
                delay: i as f32,
            },
        ));
    }

    let sleigh = [
        (Vec2::new(0.0, 0.0), Vec2::new(70.0, 26.0), Color::srgb(0.8, 0.1, 0.1)),
        (Vec2::new(0.0, -16.0), Vec2::new(84.0, 4.0), Color::srgb(1.0, 0.84, 0.0)),
        (Vec2::new(-8.0, 22.0), Vec2::new(22.0, 22.0), Color::srgb(0.95, 0.2, 0.2)),
        (Vec2::new(70.0, 4.0), Vec2::new(34.0, 16.0), Color::srgb(0.55, 0.33, 0.16)),
        (Vec2::new(112.0, 4.0), Vec2::new(34.0, 16.0), Color::srgb(0.55, 0.33, 0.16)),
        (Vec2::new(154.0, 4.0), Vec2::new(34.0, 16.0), Color::srgb(0.55, 0.33, 0.16)),
    ];
    for (offset, part, color) in sleigh {
        cmd.spawn((
            Sprite {
                color: color.with_alpha(0.0),
                custom_size: Some(part),
                ..default()
            },
            Transform::from_xyz(-size.x, 0.0, -3.0),
            SleighPart { offset },
        ));
    }
}

fn animate_snow(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut flakes: Query<(&mut Transform, &Snowflake)>,
) {
    let half = window_size(&windows) / 2.0;
    let dt = time.delta_secs();
    let mut rng = rand::rng();

    for (mut t, flake) in flakes.iter_mut() {
        let pos = flake.fall(t.translation.truncate(), dt);
        if flake.below(pos.y, half.y) {
            t.translation.x = rng.random_range(-half.x..half.x);
            t.translation.y = half.y + 10.0;
        } else {
            t.translation.x = pos.x;
            t.translation.y = pos.y;
        }
    }
}

fn place_footer(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pines: Query<(&mut Transform, &FooterPine)>,
) {
    let size = window_size(&windows);
    for (mut t, pine) in pines.iter_mut() {
        t.translation.x = (footer_slot(pine.0) - 0.5) * size.x;
        t.translation.y = -size.y / 2.0 + 30.0;
    }
}

fn animate_lights(
    time: Res<Time>,
    lights: Query<(&FairyLight, &MeshMaterial2d<ColorMaterial>)>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    let t = time.elapsed_secs();
    for (light, mat) in lights.iter() {
        let Some(mat) = mats.get_mut(&mat.0) else {
            continue;
        };
        let phase = (t - light.0 as f32 * 0.2) / 1.5;
        let glow = 0.5 - 0.5 * (phase * TAU).cos();
        mat.color.set_alpha(0.4 + 0.6 * glow);
    }
}

fn animate_ornaments(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut ornaments: Query<(&mut Transform, &Ornament)>,
) {
    let size = window_size(&windows);
    let t = time.elapsed_secs();

    for (mut tf, o) in ornaments.iter_mut() {
        if t < o.delay {
            continue;
        }
        let p = ((t - o.delay) % o.duration) / o.duration;
        let x = o.from_x + (o.to_x - o.from_x) * p;
        tf.translation.x = (x - 0.5) * size.x;
        tf.translation.y = (-0.6 + 1.3 * p) * size.y;
        tf.rotation = Quat::from_rotation_z(p * TAU);
    }
}

fn animate_hearts(
    time: Res<Time>,
    mut hearts: Query<(&mut Transform, &Heart, &MeshMaterial2d<ColorMaterial>)>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    let t = time.elapsed_secs();
    for (mut tf, heart, mat) in hearts.iter_mut() {
        if t < heart.delay {
            continue;
        }
        let wave = 0.5 - 0.5 * (((t - heart.delay) / heart.period) * TAU).cos();
        tf.scale = Vec3::splat(1.0 + 0.3 * wave);
        tf.rotation = Quat::from_rotation_z(PI / 4.0 + (t * 0.8).sin() * 0.17);
        if let Some(mat) = mats.get_mut(&mat.0) {
            mat.color.set_alpha(0.05 + 0.15 * wave);
        }
    }
}

fn animate_sleigh(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut parts: Query<(&mut Transform, &mut Sprite, &SleighPart)>,
) {
    let Some(pose) = sleigh_pose(time.elapsed_secs()) else {
        return;
    };
    let size = window_size(&windows);
    let anchor = Vec2::new((pose.x - 0.5) * size.x, (0.5 - pose.y) * size.y);

    for (mut t, mut sprite, part) in parts.iter_mut() {
        t.translation.x = anchor.x + part.offset.x;
        t.translation.y = anchor.y + part.offset.y;
        sprite.color.set_alpha(pose.alpha);
    }
}

fn spawn_sparkles(
    mut cmd: Commands,
    mut moves: EventReader<CursorMoved>,
    cam: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) {
    let Ok((camera, cam_t)) = cam.get_single() else {
        moves.clear();
        return;
    };
    let mut rng = rand::rng();

    for event in moves.read() {
        let Ok(world) = camera.viewport_to_world_2d(cam_t, event.position) else {
            continue;
        };
        cmd.spawn((
            Sprite {
                color: SPARKLE_COLORS[rng.random_range(0..SPARKLE_COLORS.len())],
                custom_size: Some(Vec2::splat(8.0)),
                ..default()
            },
            Transform::from_xyz(world.x, world.y, 40.0)
                .with_rotation(Quat::from_rotation_z(PI / 4.0)),
            RenderLayers::layer(OVERLAY_LAYER),
            Sparkle {
                origin: world,
                drift: Vec2::new(
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                ),
                age: 0.0,
            },
        ));
    }
}

fn animate_sparkles(
    mut cmd: Commands,
    time: Res<Time>,
    mut sparkles: Query<(Entity, &mut Transform, &mut Sprite, &mut Sparkle)>,
) {
    for (entity, mut t, mut sprite, mut s) in sparkles.iter_mut() {
        s.age += time.delta_secs();
        if s.age >= SPARKLE_LIFE {
            cmd.entity(entity).despawn();
            continue;
        }
        let p = s.age / SPARKLE_LIFE;
        let eased = 1.0 - (1.0 - p) * (1.0 - p);
        let pos = s.origin + s.drift * eased;
        t.translation.x = pos.x;
        t.translation.y = pos.y;
        t.scale = Vec3::splat(1.0 - eased);
        sprite.color.set_alpha(1.0 - eased);
    }
}

#[cfg(test)]
mod tests {
    use bevy::window::WindowResolution;

    use super::*;

    fn minimised_window_app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.world_mut().spawn((
            Window {
                resolution: WindowResolution::new(0.0, 0.0),
                ..default()
            },
            PrimaryWindow,
        ));
        app
    }

    #[test]
    fn flakes_fall_and_drift_per_frame() {
        let flake = Snowflake { radius: 2.0, speed: 0.5, phase: PI / 2.0 };
        let next = flake.fall(Vec2::new(10.0, 100.0), 1.0 / 60.0);
        assert!((next.y - 99.5).abs() < 1e-4);
        assert!((next.x - 10.4).abs() < 1e-4);

        let still = Snowflake { radius: 2.0, speed: 1.0, phase: 0.0 };
        assert_eq!(still.fall(Vec2::ZERO, 1.0).x, 0.0);
        assert!((still.fall(Vec2::ZERO, 1.0).y + 60.0).abs() < 1e-4);
    }

    #[test]
    fn flakes_recycle_only_once_fully_off_screen() {
        let flake = Snowflake { radius: 3.0, speed: 1.0, phase: 0.0 };
        assert!(!flake.below(-360.0, 360.0));
        assert!(!flake.below(-362.0, 360.0));
        assert!(flake.below(-364.0, 360.0));
    }

    #[test]
    fn sleigh_waits_then_crosses_repeatedly() {
        assert_eq!(sleigh_pose(0.0), None);
        assert_eq!(sleigh_pose(4.9), None);

        let start = sleigh_pose(SLEIGH_DELAY).unwrap();
        assert!((start.x + 0.2).abs() < 1e-5);
        assert!((start.y - 0.15).abs() < 1e-5);
        assert_eq!(start.alpha, 0.0);

        let middle = sleigh_pose(SLEIGH_DELAY + SLEIGH_CROSSING / 2.0).unwrap();
        assert!((middle.x - 0.5).abs() < 1e-5);
        assert!((middle.y - 0.10).abs() < 1e-5);
        assert_eq!(middle.alpha, 1.0);

        let late = sleigh_pose(SLEIGH_DELAY + SLEIGH_CROSSING * 0.9).unwrap();
        assert!(late.alpha < 0.5 && late.x > 1.0);

        let again = sleigh_pose(SLEIGH_DELAY + SLEIGH_CROSSING * 1.5).unwrap();
        assert!((again.x - middle.x).abs() < 1e-4);
    }

    #[test]
    fn zero_sized_window_falls_back_to_the_design_size() {
        let design = Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT);
        assert_eq!(usable_size(None), design);
        assert_eq!(usable_size(Some(Vec2::ZERO)), design);
        assert_eq!(usable_size(Some(Vec2::new(800.0, 0.0))), design);
        assert_eq!(usable_size(Some(Vec2::new(800.0, 600.0))), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn snow_keeps_falling_in_a_minimised_window() {
        let mut app = minimised_window_app();
        let low = app
            .world_mut()
            .spawn((
                Transform::from_xyz(0.0, -100.0, -5.0),
                Snowflake { radius: 2.0, speed: 1.0, phase: 0.0 },
            ))
            .id();
        let gone = app
            .world_mut()
            .spawn((
                Transform::from_xyz(0.0, -1000.0, -5.0),
                Snowflake { radius: 2.0, speed: 1.0, phase: 0.0 },
            ))
            .id();
        app.add_systems(Update, animate_snow);
        app.update();

        let low = app.world().get::<Transform>(low).unwrap().translation;
        assert_eq!(low.y, -100.0);

        let recycled = app.world().get::<Transform>(gone).unwrap().translation;
        assert!(recycled.x.is_finite() && recycled.x.abs() <= WINDOW_WIDTH / 2.0);
        assert_eq!(recycled.y, WINDOW_HEIGHT / 2.0 + 10.0);
    }

    #[test]
    fn footer_trees_spread_evenly_across_the_bottom() {
        let slots: Vec<f32> = (0..FOOTER_PINES).map(footer_slot).collect();
        assert_eq!(slots.len(), 8);
        assert!((slots[0] - 0.0625).abs() < 1e-6);
        assert!((slots[7] - 0.9375).abs() < 1e-6);
        assert!(slots.windows(2).all(|w| (w[1] - w[0] - 0.125).abs() < 1e-6));

        let mut app = minimised_window_app();
        let pine = app
            .world_mut()
            .spawn((Transform::default(), FooterPine(0)))
            .id();
        app.add_systems(Update, place_footer);
        app.update();

        let t = app.world().get::<Transform>(pine).unwrap().translation;
        assert!((t.x - (0.0625 - 0.5) * WINDOW_WIDTH).abs() < 1e-3);
        assert!((t.y - (-WINDOW_HEIGHT / 2.0 + 30.0)).abs() < 1e-3);
    }
}
