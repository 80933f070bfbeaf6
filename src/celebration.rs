//! Confetti. A celebration fires volleys from both sides of the screen every
//! quarter second for five seconds, each volley thinner than the last.

use std::time::Duration;

use bevy::{prelude::*, render::view::RenderLayers, window::PrimaryWindow};
use rand::Rng;

use crate::audio::AudioCommand;
use crate::orchestrator::{AudioPlayer as _, CelebrationEffect};
use crate::{OVERLAY_LAYER, WINDOW_HEIGHT, WINDOW_WIDTH};

pub const BURST_DURATION: Duration = Duration::from_secs(5);
pub const VOLLEY_INTERVAL: Duration = Duration::from_millis(250);
const VOLLEY_SIZE: f32 = 50.0;

// Tuned in 60 Hz frames, then scaled to seconds.
const START_VELOCITY: f32 = 30.0;
const DECAY_PER_FRAME: f32 = 0.9;
const GRAVITY: f32 = 3.0 * 60.0;
const CONFETTI_LIFE: f32 = 1.0;

const CONFETTI_COLORS: [Color; 4] = [
    Color::srgb(1.0, 0.0, 0.0),
    Color::srgb(1.0, 0.84, 0.0),
    Color::WHITE,
    Color::srgb(1.0, 0.41, 0.71),
];

#[derive(Event, Clone, Copy, Debug)]
pub struct CelebrateEvent;

impl CelebrationEffect for EventWriter<'_, CelebrateEvent> {
    fn trigger(&mut self) {
        self.send(CelebrateEvent);
    }
}

pub struct CelebrationPlugin;

impl Plugin for CelebrationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CelebrateEvent>()
            .init_resource::<Bursts>()
            .add_systems(
                Update,
                (start_bursts, run_bursts, animate_confetti).chain(),
            );
    }
}

/// One running celebration.
#[derive(Debug)]
struct Burst {
    elapsed: Duration,
    next_volley: Duration,
}

impl Burst {
    fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
            next_volley: VOLLEY_INTERVAL,
        }
    }

    /// Advances the burst and returns the particle count of every volley that came due.
    fn tick(&mut self, dt: Duration) -> Vec<u32> {
        self.elapsed += dt;
        let mut volleys = Vec::new();
        while self.next_volley <= self.elapsed && self.next_volley < BURST_DURATION {
            let left = (BURST_DURATION - self.next_volley).as_secs_f32();
            let count = VOLLEY_SIZE * left / BURST_DURATION.as_secs_f32();
            volleys.push(count as u32);
            self.next_volley += VOLLEY_INTERVAL;
        }
        volleys
    }

    fn finished(&self) -> bool {
        self.elapsed >= BURST_DURATION
    }
}

#[derive(Resource, Default)]
struct Bursts(Vec<Burst>);

#[derive(Component)]
struct Confetti {
    vel: Vec2,
    spin: f32,
    age: f32,
}

fn start_bursts(
    mut events: EventReader<CelebrateEvent>,
    mut bursts: ResMut<Bursts>,
    mut audio: EventWriter<AudioCommand>,
) {
    for _ in events.read() {
        bursts.0.push(Burst::new());
        audio.play_sparkle();
        debug!("Celebration started ({} running)", bursts.0.len());
    }
}

fn run_bursts(
    mut cmd: Commands,
    time: Res<Time>,
    mut bursts: ResMut<Bursts>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if bursts.0.is_empty() {
        return;
    }

    let size = windows
        .get_single()
        .map(|w| w.size())
        .unwrap_or(Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT));
    let mut rng = rand::rng();

    for burst in bursts.0.iter_mut() {
        for count in burst.tick(time.delta()) {
            for side in [0.1..0.3, 0.7..0.9] {
                let origin = Vec2::new(
                    (rng.random_range(side) - 0.5) * size.x,
                    (0.5 - (rng.random::<f32>() - 0.2)) * size.y,
                );
                spawn_volley(&mut cmd, &mut rng, origin, count);
            }
        }
    }
    bursts.0.retain(|b| !b.finished());
}

fn spawn_volley(cmd: &mut Commands, rng: &mut impl Rng, origin: Vec2, count: u32) {
    for _ in 0..count {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = (START_VELOCITY * 0.5 + rng.random::<f32>() * START_VELOCITY) * 60.0;
        let color = CONFETTI_COLORS[rng.random_range(0..CONFETTI_COLORS.len())];
        let side = rng.random_range(6.0..11.0);
        cmd.spawn((
            Sprite {
                color,
                custom_size: Some(Vec2::new(side, side * 0.6)),
                ..default()
            },
            Transform::from_xyz(origin.x, origin.y, 50.0)
                .with_rotation(Quat::from_rotation_z(angle)),
            RenderLayers::layer(OVERLAY_LAYER),
            Confetti {
                vel: Vec2::from_angle(angle) * speed,
                spin: rng.random_range(-8.0..8.0),
                age: 0.0,
            },
        ));
    }
}

fn animate_confetti(
    mut cmd: Commands,
    time: Res<Time>,
    mut confetti: Query<(Entity, &mut Transform, &mut Sprite, &mut Confetti)>,
) {
    let dt = time.delta_secs();
    let decay = DECAY_PER_FRAME.powf(dt * 60.0);

    for (entity, mut t, mut sprite, mut c) in confetti.iter_mut() {
        c.age += dt;
        if c.age >= CONFETTI_LIFE {
            cmd.entity(entity).despawn();
            continue;
        }
        c.vel *= decay;
        t.translation.x += c.vel.x * dt;
        t.translation.y += (c.vel.y - GRAVITY) * dt;
        t.rotate_z(c.spin * dt);
        sprite.color.set_alpha(1.0 - c.age / CONFETTI_LIFE);
    }
}
