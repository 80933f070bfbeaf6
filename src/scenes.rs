//! Scene views. One UI tree per scene, rebuilt whenever the orchestrator moves
//! on; buttons carry the [`Input`] they stand for.

use std::f32::consts::PI;

use bevy::{ecs::system::EntityCommands, prelude::*};

use crate::audio::AudioCommand;
use crate::celebration::CelebrateEvent;
use crate::content::{
    CONTINUE_LABEL, FINAL_HEADING, FINAL_MESSAGE, LETTER, OPENING_SUBTITLE, OPENING_TITLE,
    QUIZ_QUESTION, REPLAY_LABEL, START_LABEL, UNWRAP_HEADING, UNWRAP_HINT,
};
use crate::orchestrator::{Input, Orchestrator, Scene};

// COLORS
const RED: Color = Color::srgb(0.86, 0.15, 0.15);
const DEEP_RED: Color = Color::srgb(0.6, 0.1, 0.1);
const GOLD: Color = Color::srgb(0.98, 0.8, 0.15);
const CREAM: Color = Color::srgb(1.0, 0.99, 0.96);
const INK: Color = Color::srgb(0.18, 0.04, 0.04);
const PINK: Color = Color::srgb(0.99, 0.86, 0.92);
const PANEL: Color = Color::srgba(0.0, 0.0, 0.0, 0.75);
const OPTION_IDLE: Color = Color::srgba(1.0, 1.0, 1.0, 0.05);
const OPTION_HOVER: Color = Color::srgba(1.0, 1.0, 1.0, 0.15);

const GIFT_SIZE: f32 = 220.0;
const GIFT_OPEN_TIME: f32 = 1.5;
const SHAKE_DISTANCE: f32 = 10.0;

pub struct ScenesPlugin;

impl Plugin for ScenesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShownScene>()
            .init_resource::<SceneClock>()
            .add_systems(Startup, spawn_mute_toggle)
            .add_systems(
                Update,
                (
                    press_controls,
                    run_timers,
                    rebuild_scene,
                    (
                        tint_buttons,
                        shake_quiz,
                        show_error,
                        fade_in_text,
                        bob_nodes,
                        glow_text,
                        unwrap_gift,
                        label_mute,
                    ),
                )
                    .chain(),
            );
    }
}

/// A pressable control and the input it sends.
#[derive(Component, Clone, Copy, Debug)]
pub struct Control(pub Input);

#[derive(Component)]
struct SceneView;

#[derive(Component)]
struct Tint {
    idle: Color,
    hover: Color,
}

#[derive(Component)]
struct QuizPanel;

#[derive(Component)]
struct ErrorLine;

#[derive(Component)]
struct FadeIn {
    delay: f32,
    duration: f32,
}

/// Hops `amplitude` px up and back down once per `period` seconds, starting
/// `delay` seconds in. With `swell` above zero the node also grows by that
/// fraction of `size` at the top of each hop.
#[derive(Component)]
struct Bob {
    size: f32,
    period: f32,
    delay: f32,
    amplitude: f32,
    swell: f32,
}

#[derive(Component)]
struct Glow {
    speed: f32,
}

#[derive(Component, Default)]
struct GiftBox {
    opened_at: Option<f32>,
}

#[derive(Component)]
struct MuteLabel;

#[derive(Resource, Default)]
struct ShownScene(Option<Scene>);

/// Seconds since the current scene view was built.
#[derive(Resource, Default)]
struct SceneClock(f32);

fn press_controls(
    controls: Query<(&Interaction, &Control), Changed<Interaction>>,
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut card: ResMut<Orchestrator>,
    mut audio: EventWriter<AudioCommand>,
    mut celebrate: EventWriter<CelebrateEvent>,
) {
    let mut inputs: Vec<Input> = controls
        .iter()
        .filter(|(interaction, _)| **interaction == Interaction::Pressed)
        .map(|(_, control)| control.0)
        .collect();

    if let Some(keyboard) = keyboard {
        if keyboard.just_pressed(KeyCode::KeyM) {
            inputs.push(Input::ToggleMute);
        }
        if keyboard.just_pressed(KeyCode::KeyR) {
            inputs.push(Input::Replay);
        }
    }

    for input in inputs {
        card.handle(input, &mut audio, &mut celebrate);
    }
}

fn run_timers(time: Res<Time>, mut card: ResMut<Orchestrator>, mut audio: EventWriter<AudioCommand>) {
    card.advance(time.delta(), &mut audio);
}

fn rebuild_scene(
    mut cmd: Commands,
    time: Res<Time>,
    card: Res<Orchestrator>,
    mut shown: ResMut<ShownScene>,
    mut clock: ResMut<SceneClock>,
    views: Query<Entity, With<SceneView>>,
) {
    clock.0 += time.delta_secs();
    if shown.0 == Some(card.scene()) {
        return;
    }

    for entity in views.iter() {
        cmd.entity(entity).despawn_recursive();
    }
    shown.0 = Some(card.scene());
    clock.0 = 0.0;

    let mut root = cmd.spawn((
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            row_gap: Val::Px(24.0),
            padding: UiRect::all(Val::Px(16.0)),
            ..default()
        },
        SceneView,
    ));
    match card.scene() {
        Scene::Opening => root.with_children(build_opening),
        Scene::Quiz => root.with_children(|p| build_quiz(p, &card)),
        Scene::Letter => root.with_children(build_letter),
        Scene::Unwrapping => root.with_children(build_unwrapping),
        Scene::Final => root.with_children(build_final),
    };
}

fn text<'a>(
    parent: &'a mut ChildBuilder<'_>,
    value: &str,
    size: f32,
    color: Color,
) -> EntityCommands<'a> {
    parent.spawn((
        Text::new(value),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
        TextLayout::new_with_justify(JustifyText::Center),
    ))
}

fn button(parent: &mut ChildBuilder, label: &str, input: Input, idle: Color, hover: Color) {
    parent
        .spawn((
            Button,
            Node {
                padding: UiRect::axes(Val::Px(40.0), Val::Px(16.0)),
                border: UiRect::all(Val::Px(2.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(idle),
            BorderColor(GOLD.with_alpha(0.5)),
            BorderRadius::MAX,
            Tint { idle, hover },
            Control(input),
        ))
        .with_children(|b| {
            text(b, label, 26.0, Color::WHITE);
        });
}

fn badge(parent: &mut ChildBuilder, color: Color, bob: Bob) {
    parent.spawn((
        Node {
            width: Val::Px(bob.size),
            height: Val::Px(bob.size),
            border: UiRect::all(Val::Px(4.0)),
            ..default()
        },
        BackgroundColor(color),
        BorderColor(GOLD.with_alpha(0.5)),
        BorderRadius::MAX,
        bob,
    ));
}

fn build_opening(p: &mut ChildBuilder) {
    badge(
        p,
        RED.with_alpha(0.3),
        Bob { size: 160.0, period: 4.0, delay: 0.0, amplitude: 15.0, swell: 0.0 },
    );
    text(p, OPENING_TITLE, 64.0, Color::WHITE);
    text(p, OPENING_SUBTITLE, 26.0, PINK);
    button(p, START_LABEL, Input::Start, RED, Color::srgb(0.94, 0.27, 0.35));
}

fn build_quiz(p: &mut ChildBuilder, card: &Orchestrator) {
    p.spawn((
        Node {
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Stretch,
            row_gap: Val::Px(14.0),
            padding: UiRect::all(Val::Px(40.0)),
            border: UiRect::all(Val::Px(2.0)),
            max_width: Val::Px(520.0),
            ..default()
        },
        BackgroundColor(PANEL),
        BorderColor(RED.with_alpha(0.4)),
        BorderRadius::all(Val::Px(48.0)),
        QuizPanel,
    ))
    .with_children(|panel| {
        text(panel, QUIZ_QUESTION, 28.0, Color::srgb(1.0, 0.98, 0.8));
        for option in card.options() {
            button(panel, option.label, Input::Choose(option.id), OPTION_IDLE, OPTION_HOVER);
        }
        text(panel, "", 22.0, GOLD).insert(ErrorLine);
    });
}

fn build_letter(p: &mut ChildBuilder) {
    p.spawn((
        Node {
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(20.0),
            padding: UiRect::all(Val::Px(48.0)),
            border: UiRect::bottom(Val::Px(14.0)),
            max_width: Val::Px(720.0),
            ..default()
        },
        BackgroundColor(CREAM),
        BorderColor(DEEP_RED),
        BorderRadius::all(Val::Px(16.0)),
    ))
    .with_children(|paper| {
        let lines = [
            (LETTER.greeting, 30.0, DEEP_RED, 0.5, 1.0),
            (LETTER.body, 22.0, INK, 1.2, 2.0),
            (LETTER.closing, 30.0, DEEP_RED, 2.5, 1.0),
        ];
        for (value, size, color, delay, duration) in lines {
            paper.spawn((
                Text::new(value),
                TextFont {
                    font_size: size,
                    ..default()
                },
                TextColor(color.with_alpha(0.0)),
                FadeIn { delay, duration },
            ));
        }
        button(paper, CONTINUE_LABEL, Input::Continue, DEEP_RED, RED);
    });
}

fn build_unwrapping(p: &mut ChildBuilder) {
    text(p, UNWRAP_HEADING, 48.0, Color::WHITE).insert(Glow { speed: PI });

    p.spawn((
        Button,
        Node {
            width: Val::Px(GIFT_SIZE),
            height: Val::Px(GIFT_SIZE),
            margin: UiRect::vertical(Val::Px(40.0)),
            ..default()
        },
        BackgroundColor(RED),
        BorderRadius::all(Val::Px(18.0)),
        GiftBox::default(),
        Control(Input::OpenGift),
    ))
    .with_children(|gift| {
        // Ribbon
        for (w, h) in [(18.0, 100.0), (100.0, 18.0)] {
            gift.spawn((
                Node {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(w),
                    height: Val::Percent(h),
                    left: Val::Percent((100.0 - w) / 2.0),
                    top: Val::Percent((100.0 - h) / 2.0),
                    ..default()
                },
                BackgroundColor(GOLD),
            ));
        }
    });

    text(p, UNWRAP_HINT, 40.0, GOLD);
}

fn build_final(p: &mut ChildBuilder) {
    p.spawn((
        Node {
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            row_gap: Val::Px(28.0),
            padding: UiRect::all(Val::Px(56.0)),
            border: UiRect::all(Val::Px(2.0)),
            max_width: Val::Px(720.0),
            ..default()
        },
        BackgroundColor(Color::srgba(0.3, 0.03, 0.03, 0.8)),
        BorderColor(GOLD.with_alpha(0.3)),
        BorderRadius::all(Val::Px(64.0)),
    ))
    .with_children(|panel| {
        text(panel, FINAL_HEADING, 56.0, Color::srgb(0.99, 0.88, 0.28));
        text(panel, FINAL_MESSAGE, 26.0, Color::WHITE);
        panel
            .spawn(Node {
                column_gap: Val::Px(36.0),
                padding: UiRect::vertical(Val::Px(20.0)),
                ..default()
            })
            .with_children(|row| {
                for i in 0..3 {
                    badge(
                        row,
                        RED,
                        Bob {
                            size: 48.0,
                            period: 1.5,
                            delay: i as f32 * 0.5,
                            amplitude: 15.0,
                            swell: 0.3,
                        },
                    );
                }
            });
        button(
            panel,
            REPLAY_LABEL,
            Input::Replay,
            Color::srgba(1.0, 1.0, 1.0, 0.05),
            Color::srgba(1.0, 1.0, 1.0, 0.1),
        );
    });
}

fn spawn_mute_toggle(mut cmd: Commands) {
    cmd.spawn((
        Button,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(20.0),
            right: Val::Px(20.0),
            padding: UiRect::axes(Val::Px(18.0), Val::Px(10.0)),
            border: UiRect::all(Val::Px(2.0)),
            ..default()
        },
        BackgroundColor(RED.with_alpha(0.2)),
        BorderColor(GOLD.with_alpha(0.3)),
        BorderRadius::MAX,
        GlobalZIndex(10),
        Tint {
            idle: RED.with_alpha(0.2),
            hover: RED.with_alpha(0.4),
        },
        Control(Input::ToggleMute),
    ))
    .with_children(|b| {
        b.spawn((
            Text::new("SOUND ON"),
            TextFont {
                font_size: 20.0,
                ..default()
            },
            TextColor(GOLD),
            MuteLabel,
        ));
    });
}

fn tint_buttons(mut buttons: Query<(&Interaction, &Tint, &mut BackgroundColor), Changed<Interaction>>) {
    for (interaction, tint, mut bg) in buttons.iter_mut() {
        bg.0 = match interaction {
            Interaction::Hovered | Interaction::Pressed => tint.hover,
            Interaction::None => tint.idle,
        };
    }
}

fn shake_quiz(time: Res<Time>, card: Res<Orchestrator>, mut panels: Query<&mut Node, With<QuizPanel>>) {
    for mut node in panels.iter_mut() {
        node.left = if card.is_shaking() {
            Val::Px((time.elapsed_secs() * 50.0).sin() * SHAKE_DISTANCE)
        } else {
            Val::Px(0.0)
        };
    }
}

fn show_error(card: Res<Orchestrator>, mut lines: Query<&mut Text, With<ErrorLine>>) {
    let wanted = card.error_text().unwrap_or_default();
    for mut line in lines.iter_mut() {
        if line.0 != wanted {
            line.0 = wanted.to_string();
        }
    }
}

fn fade_in_text(clock: Res<SceneClock>, mut texts: Query<(&mut TextColor, &FadeIn)>) {
    for (mut color, fade) in texts.iter_mut() {
        let a = ((clock.0 - fade.delay) / fade.duration).clamp(0.0, 1.0);
        color.0.set_alpha(a);
    }
}

/// Height of a hop `t` seconds in, from 0 on the ground to 1 at the top.
fn hop(t: f32, period: f32, delay: f32) -> f32 {
    if t < delay {
        return 0.0;
    }
    (PI * (t - delay) / period).sin().abs()
}

fn bob_nodes(clock: Res<SceneClock>, mut nodes: Query<(&mut Node, &Bob)>) {
    for (mut node, bob) in nodes.iter_mut() {
        let h = hop(clock.0, bob.period, bob.delay);
        node.top = Val::Px(-h * bob.amplitude);
        if bob.swell > 0.0 {
            let size = bob.size * (1.0 + bob.swell * h);
            node.width = Val::Px(size);
            node.height = Val::Px(size);
        }
    }
}

/// White to gold and back.
fn glow_text(time: Res<Time>, mut texts: Query<(&mut TextColor, &Glow)>) {
    for (mut color, glow) in texts.iter_mut() {
        let w = 0.5 + 0.5 * (time.elapsed_secs() * glow.speed).sin();
        color.0 = Color::srgb(1.0, 1.0 - 0.16 * w, 1.0 - w);
    }
}

fn unwrap_gift(
    time: Res<Time>,
    clock: Res<SceneClock>,
    card: Res<Orchestrator>,
    mut gifts: Query<(&mut Node, &mut GiftBox, &mut Visibility)>,
) {
    for (mut node, mut gift, mut vis) in gifts.iter_mut() {
        if card.gift_opened() && gift.opened_at.is_none() {
            gift.opened_at = Some(clock.0);
        }

        let scale = match gift.opened_at {
            None => {
                node.top = Val::Px(-hop(time.elapsed_secs(), 2.0, 0.0) * 30.0);
                1.0
            }
            Some(at) => {
                node.top = Val::Px(0.0);
                gift_scale(clock.0 - at)
            }
        };
        node.width = Val::Px(GIFT_SIZE * scale);
        node.height = Val::Px(GIFT_SIZE * scale);
        if scale <= 0.0 {
            *vis = Visibility::Hidden;
        }
    }
}

/// Gift size while it bursts open: swells to 1.8x, then collapses to nothing.
fn gift_scale(since_open: f32) -> f32 {
    let p = (since_open / GIFT_OPEN_TIME).clamp(0.0, 1.0);
    if p < 0.5 {
        1.0 + 0.8 * (p / 0.5)
    } else {
        1.8 * (1.0 - (p - 0.5) / 0.5)
    }
}

fn label_mute(card: Res<Orchestrator>, mut labels: Query<&mut Text, With<MuteLabel>>) {
    let label = if card.is_muted() { "SOUND OFF" } else { "SOUND ON" };
    for mut text in labels.iter_mut() {
        if text.0 != label {
            text.0 = label.to_string();
        }
    }
}
