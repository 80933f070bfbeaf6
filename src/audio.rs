//! Music and sound effects. Everything here is best-effort: a missing file or
//! an absent audio device only ever produces a warning.

use bevy::{
    asset::LoadState,
    audio::{AudioSinkPlayback, PlaybackMode, Volume},
    prelude::*,
};

use crate::config::CardConfig;
use crate::orchestrator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sfx {
    Chime,
    Sparkle,
}

#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCommand {
    PlayMusic,
    Play(Sfx),
    SetMuted(bool),
}

impl orchestrator::AudioPlayer for EventWriter<'_, AudioCommand> {
    fn play_background_music(&mut self) {
        self.send(AudioCommand::PlayMusic);
    }

    fn play_chime(&mut self) {
        self.send(AudioCommand::Play(Sfx::Chime));
    }

    fn play_sparkle(&mut self) {
        self.send(AudioCommand::Play(Sfx::Sparkle));
    }

    fn set_muted(&mut self, muted: bool) {
        self.send(AudioCommand::SetMuted(muted));
    }
}

pub struct CardAudioPlugin;

impl Plugin for CardAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AudioCommand>()
            .add_systems(Startup, setup_audio)
            .add_systems(
                Update,
                (handle_audio_commands, fall_back_music).chain(),
            )
            .add_systems(Last, release_audio);
    }
}

#[derive(Resource)]
struct CardSounds {
    music: Handle<AudioSource>,
    music_fallback: String,
    fell_back: bool,
    chime: Handle<AudioSource>,
    sparkle: Handle<AudioSource>,
}

#[derive(Resource)]
struct Mixer {
    muted: bool,
    music_volume: f32,
    sfx_volume: f32,
}

impl Mixer {
    fn music(&self) -> f32 {
        if self.muted { 0.0 } else { self.music_volume }
    }

    fn sfx(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_volume }
    }
}

#[derive(Component)]
struct BgMusic;

#[derive(Component)]
struct Voice(Sfx);

fn setup_audio(mut cmd: Commands, asset_server: Res<AssetServer>, config: Res<CardConfig>) {
    cmd.insert_resource(CardSounds {
        music: asset_server.load(config.music.clone()),
        music_fallback: config.music_fallback.clone(),
        fell_back: false,
        chime: asset_server.load(config.chime.clone()),
        sparkle: asset_server.load(config.sparkle.clone()),
    });
    cmd.insert_resource(Mixer {
        muted: false,
        music_volume: config.music_volume,
        sfx_volume: config.sfx_volume,
    });
}

fn spawn_music(cmd: &mut Commands, sounds: &CardSounds, mixer: &Mixer) {
    cmd.spawn((
        AudioPlayer::new(sounds.music.clone()),
        PlaybackSettings {
            mode: PlaybackMode::Loop,
            volume: Volume::new(mixer.music()),
            ..default()
        },
        BgMusic,
    ));
}

fn spawn_voice(cmd: &mut Commands, sounds: &CardSounds, mixer: &Mixer, sfx: Sfx) {
    let source = match sfx {
        Sfx::Chime => sounds.chime.clone(),
        Sfx::Sparkle => sounds.sparkle.clone(),
    };
    cmd.spawn((
        AudioPlayer::new(source),
        PlaybackSettings {
            mode: PlaybackMode::Despawn,
            volume: Volume::new(mixer.sfx()),
            ..default()
        },
        Voice(sfx),
    ));
}

/// Players spawned by a frame's commands only exist once the frame's commands
/// apply, so new music and voices are spawned after every command is read and
/// take the mute state the frame ends with.
fn handle_audio_commands(
    mut cmd: Commands,
    mut events: EventReader<AudioCommand>,
    sounds: Option<Res<CardSounds>>,
    mixer: Option<ResMut<Mixer>>,
    music: Query<(Entity, Option<&AudioSink>), With<BgMusic>>,
    voices: Query<(Entity, &Voice)>,
    mut pending: Query<(&mut PlaybackSettings, Has<BgMusic>), Without<AudioSink>>,
    sinks: Query<(&AudioSink, Has<BgMusic>)>,
) {
    let (Some(sounds), Some(mut mixer)) = (sounds, mixer) else {
        return;
    };

    let mut start_music = false;
    let mut due: Vec<Sfx> = Vec::new();
    let mut stopped: Vec<Entity> = Vec::new();

    for event in events.read() {
        match *event {
            AudioCommand::PlayMusic => match music.iter().next() {
                None => start_music = true,
                Some((_, Some(sink))) if sink.is_paused() => sink.play(),
                Some(_) => {}
            },
            AudioCommand::Play(sfx) => {
                // Restart rather than overlap.
                for (entity, voice) in voices.iter() {
                    if voice.0 == sfx && !stopped.contains(&entity) {
                        cmd.entity(entity).despawn();
                        stopped.push(entity);
                    }
                }
                due.retain(|queued| *queued != sfx);
                due.push(sfx);
            }
            AudioCommand::SetMuted(muted) => {
                mixer.muted = muted;
                for (sink, is_music) in sinks.iter() {
                    sink.set_volume(if is_music { mixer.music() } else { mixer.sfx() });
                }
                // Players still waiting on their asset pick the volume up on start.
                for (mut settings, is_music) in pending.iter_mut() {
                    let volume = if is_music { mixer.music() } else { mixer.sfx() };
                    settings.volume = Volume::new(volume);
                }
            }
        }
    }

    if start_music {
        spawn_music(&mut cmd, &sounds, &mixer);
    }
    for sfx in due {
        spawn_voice(&mut cmd, &sounds, &mixer, sfx);
    }
}

fn music_failed(state: Option<LoadState>, fell_back: bool) -> bool {
    !fell_back && matches!(state, Some(LoadState::Failed(_)))
}

/// Points the card at the fallback track and restarts the music if it was on.
fn switch_to_fallback(
    cmd: &mut Commands,
    sounds: &mut CardSounds,
    fallback: Handle<AudioSource>,
    mixer: &Mixer,
    music: &Query<Entity, With<BgMusic>>,
) {
    sounds.fell_back = true;
    sounds.music = fallback;

    let mut was_playing = false;
    for entity in music.iter() {
        cmd.entity(entity).despawn();
        was_playing = true;
    }
    if was_playing {
        spawn_music(cmd, sounds, mixer);
    }
}

fn fall_back_music(
    mut cmd: Commands,
    asset_server: Res<AssetServer>,
    sounds: Option<ResMut<CardSounds>>,
    mixer: Option<Res<Mixer>>,
    music: Query<Entity, With<BgMusic>>,
) {
    let (Some(mut sounds), Some(mixer)) = (sounds, mixer) else {
        return;
    };
    if !music_failed(asset_server.get_load_state(&sounds.music), sounds.fell_back) {
        return;
    }

    warn!(
        "Main music failed to load, trying fallback {}",
        sounds.music_fallback
    );
    let fallback = asset_server.load(sounds.music_fallback.clone());
    switch_to_fallback(&mut cmd, &mut sounds, fallback, &mixer, &music);
}

fn release_audio(mut exits: EventReader<AppExit>, sinks: Query<&AudioSink>) {
    if exits.read().next().is_none() {
        return;
    }
    for sink in sinks.iter() {
        sink.stop();
    }
    info!("Audio released");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::asset::AssetLoadError;

    use super::*;
    use crate::orchestrator::AudioPlayer as _;

    #[test]
    fn mixer_silences_everything_when_muted() {
        let mut mixer = Mixer { muted: false, music_volume: 0.5, sfx_volume: 0.8 };
        assert_eq!(mixer.music(), 0.5);
        assert_eq!(mixer.sfx(), 0.8);
        mixer.muted = true;
        assert_eq!(mixer.music(), 0.0);
        assert_eq!(mixer.sfx(), 0.0);
    }

    #[test]
    fn event_writer_speaks_audio_commands() {
        let mut app = App::new();
        app.add_event::<AudioCommand>();
        app.add_systems(Update, |mut out: EventWriter<AudioCommand>| {
            out.play_background_music();
            out.play_chime();
            out.play_sparkle();
            out.set_muted(true);
        });
        app.update();

        let events = app.world().resource::<Events<AudioCommand>>();
        let sent: Vec<_> = events.iter_current_update_events().copied().collect();
        assert_eq!(
            sent,
            vec![
                AudioCommand::PlayMusic,
                AudioCommand::Play(Sfx::Chime),
                AudioCommand::Play(Sfx::Sparkle),
                AudioCommand::SetMuted(true),
            ]
        );
    }

    const BACKUP: Handle<AudioSource> = Handle::weak_from_u128(0x5eed_0001);

    fn audio_app(muted: bool) -> App {
        let mut app = App::new();
        app.add_event::<AudioCommand>()
            .insert_resource(CardSounds {
                music: Handle::default(),
                music_fallback: "sounds/backup.ogg".into(),
                fell_back: false,
                chime: Handle::default(),
                sparkle: Handle::default(),
            })
            .insert_resource(Mixer { muted, music_volume: 0.5, sfx_volume: 0.8 })
            .add_systems(Update, handle_audio_commands);
        app
    }

    fn send(app: &mut App, commands: &[AudioCommand]) {
        for command in commands {
            app.world_mut().send_event(*command);
        }
        app.update();
    }

    fn voices(app: &mut App, sfx: Sfx) -> Vec<(Entity, f32)> {
        let mut q = app.world_mut().query::<(Entity, &Voice, &PlaybackSettings)>();
        q.iter(app.world())
            .filter(|(_, voice, _)| voice.0 == sfx)
            .map(|(e, _, settings)| (e, *settings.volume))
            .collect()
    }

    fn tracks(app: &mut App) -> Vec<(PlaybackMode, f32)> {
        let mut q = app
            .world_mut()
            .query_filtered::<&PlaybackSettings, With<BgMusic>>();
        q.iter(app.world()).map(|s| (s.mode, *s.volume)).collect()
    }

    #[test]
    fn music_starts_once_and_loops() {
        let mut app = audio_app(false);
        send(&mut app, &[AudioCommand::PlayMusic, AudioCommand::PlayMusic]);
        send(&mut app, &[AudioCommand::PlayMusic]);

        let tracks = tracks(&mut app);
        assert_eq!(tracks.len(), 1);
        assert!(matches!(tracks[0].0, PlaybackMode::Loop));
        assert_eq!(tracks[0].1, 0.5);
    }

    #[test]
    fn replaying_a_sound_restarts_it() {
        let mut app = audio_app(false);
        send(&mut app, &[AudioCommand::Play(Sfx::Chime)]);
        let first = voices(&mut app, Sfx::Chime);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].1, 0.8);

        send(
            &mut app,
            &[
                AudioCommand::Play(Sfx::Chime),
                AudioCommand::Play(Sfx::Sparkle),
                AudioCommand::Play(Sfx::Chime),
            ],
        );
        let chimes = voices(&mut app, Sfx::Chime);
        assert_eq!(chimes.len(), 1);
        assert_ne!(chimes[0].0, first[0].0);
        assert_eq!(voices(&mut app, Sfx::Sparkle).len(), 1);
    }

    #[test]
    fn sounds_started_while_muted_are_silent() {
        let mut app = audio_app(true);
        send(&mut app, &[AudioCommand::PlayMusic, AudioCommand::Play(Sfx::Sparkle)]);
        assert_eq!(tracks(&mut app)[0].1, 0.0);
        assert_eq!(voices(&mut app, Sfx::Sparkle)[0].1, 0.0);

        // Muting in the same frame as a play still silences it.
        let mut app = audio_app(false);
        send(&mut app, &[AudioCommand::Play(Sfx::Chime), AudioCommand::SetMuted(true)]);
        assert_eq!(voices(&mut app, Sfx::Chime)[0].1, 0.0);
    }

    #[test]
    fn mute_reaches_players_that_have_not_started() {
        let mut app = audio_app(false);
        send(&mut app, &[AudioCommand::PlayMusic, AudioCommand::Play(Sfx::Chime)]);

        send(&mut app, &[AudioCommand::SetMuted(true)]);
        assert!(app.world().resource::<Mixer>().muted);
        assert_eq!(tracks(&mut app)[0].1, 0.0);
        assert_eq!(voices(&mut app, Sfx::Chime)[0].1, 0.0);

        send(&mut app, &[AudioCommand::SetMuted(false)]);
        assert_eq!(tracks(&mut app)[0].1, 0.5);
        assert_eq!(voices(&mut app, Sfx::Chime)[0].1, 0.8);
    }

    #[test]
    fn only_a_failed_load_triggers_the_fallback_once() {
        assert!(!music_failed(None, false));
        assert!(!music_failed(Some(LoadState::NotLoaded), false));
        assert!(!music_failed(Some(LoadState::Loading), false));
        assert!(!music_failed(Some(LoadState::Loaded), false));

        let failed = || Some(LoadState::Failed(Arc::new(AssetLoadError::AssetMetaReadError)));
        assert!(music_failed(failed(), false));
        assert!(!music_failed(failed(), true));
    }

    fn fallback_app() -> App {
        let mut app = audio_app(false);
        app.add_systems(
            PostUpdate,
            |mut cmd: Commands,
             mut sounds: ResMut<CardSounds>,
             mixer: Res<Mixer>,
             music: Query<Entity, With<BgMusic>>| {
                if !sounds.fell_back {
                    switch_to_fallback(&mut cmd, &mut sounds, BACKUP, &mixer, &music);
                }
            },
        );
        app
    }

    #[test]
    fn fallback_restarts_music_that_was_playing() {
        let mut app = fallback_app();
        send(&mut app, &[AudioCommand::PlayMusic]);
        send(&mut app, &[]);

        let sounds = app.world().resource::<CardSounds>();
        assert!(sounds.fell_back);
        assert_eq!(sounds.music, BACKUP);
        let mut q = app.world_mut().query_filtered::<&AudioPlayer, With<BgMusic>>();
        let players: Vec<_> = q.iter(app.world()).map(|p| p.0.clone()).collect();
        assert_eq!(players, vec![BACKUP]);
    }

    #[test]
    fn fallback_stays_quiet_when_music_was_off() {
        let mut app = fallback_app();
        send(&mut app, &[]);
        assert_eq!(app.world().resource::<CardSounds>().music, BACKUP);
        assert!(tracks(&mut app).is_empty());

        // Music asked for later uses the fallback track.
        send(&mut app, &[AudioCommand::PlayMusic]);
        let mut q = app.world_mut().query_filtered::<&AudioPlayer, With<BgMusic>>();
        let players: Vec<_> = q.iter(app.world()).map(|p| p.0.clone()).collect();
        assert_eq!(players, vec![BACKUP]);
    }
}
