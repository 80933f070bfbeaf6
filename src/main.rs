//! SNOWFALL CARD - an animated Christmas card
//! Opening, a little quiz, a letter, a gift to unwrap and the final surprise.

use bevy::{
    log::LogPlugin,
    prelude::*,
    render::{camera::ClearColorConfig, view::RenderLayers},
    window::WindowMode,
};

mod audio;
mod background;
mod celebration;
mod config;
mod content;
mod fonts;
mod orchestrator;
mod scenes;

use audio::CardAudioPlugin;
use background::BackgroundPlugin;
use celebration::CelebrationPlugin;
use config::{CardConfig, ConfigError};
use fonts::CardFontPlugin;
use orchestrator::Orchestrator;
use scenes::ScenesPlugin;

// SETTINGS
const WINDOW_WIDTH: f32 = 1280.0;
const WINDOW_HEIGHT: f32 = 720.0;
const BG_COLOR: Color = Color::srgb(0.1, 0.02, 0.02);

/// Render layer drawn above the UI (confetti, cursor sparkles).
const OVERLAY_LAYER: usize = 1;

#[derive(Component)]
struct MainCamera;

/// Configuration problems found before logging was up.
#[derive(Resource)]
struct ConfigProblems(Vec<ConfigError>);

fn main() {
    let (config, problems) = CardConfig::from_env();

    let card = Orchestrator::new(content::QUIZ_OPTIONS.to_vec())
        .expect("Built-in quiz options are invalid");

    let mode = if config.fullscreen {
        WindowMode::BorderlessFullscreen(MonitorSelection::Primary)
    } else {
        WindowMode::Windowed
    };

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Merry Christmas!".into(),
                    resolution: (WINDOW_WIDTH, WINDOW_HEIGHT).into(),
                    mode,
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                filter: config.log_filter.clone(),
                ..default()
            }),
    )
    .insert_resource(ClearColor(BG_COLOR))
    .insert_resource(ConfigProblems(problems))
    .insert_resource(config)
    .insert_resource(card)
    .add_plugins((
        CardAudioPlugin,
        CardFontPlugin,
        CelebrationPlugin,
        BackgroundPlugin,
        ScenesPlugin,
    ))
    .add_systems(Startup, (setup, report_config));

    app.run();
}

fn setup(mut cmd: Commands) {
    cmd.spawn((Camera2d, IsDefaultUiCamera, MainCamera));

    cmd.spawn((
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        RenderLayers::layer(OVERLAY_LAYER),
    ));
}

fn report_config(problems: Res<ConfigProblems>, config: Res<CardConfig>) {
    for problem in &problems.0 {
        warn!("Using the default instead: {problem}");
    }
    info!(
        "Card ready (fullscreen: {}, music: {}, font: {})",
        config.fullscreen, config.music, config.font
    );
}
