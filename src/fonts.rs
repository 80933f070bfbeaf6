//! The card's typeface. All text is drawn with the font named by `CARD_FONT`;
//! if it cannot be loaded the card falls back to Bevy's bundled font.

use bevy::{asset::LoadState, prelude::*, ui::UiSystem};

use crate::config::CardConfig;

pub struct CardFontPlugin;

impl Plugin for CardFontPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_font).add_systems(
            PostUpdate,
            (fall_back_font, apply_font)
                .chain()
                .before(UiSystem::Prepare),
        );
    }
}

#[derive(Resource)]
struct CardFont {
    handle: Handle<Font>,
    fell_back: bool,
}

fn load_font(mut cmd: Commands, asset_server: Res<AssetServer>, config: Res<CardConfig>) {
    cmd.insert_resource(CardFont {
        handle: asset_server.load(config.font.clone()),
        fell_back: false,
    });
}

/// New text picks up the card font.
fn apply_font(font: Option<Res<CardFont>>, mut texts: Query<&mut TextFont, Added<TextFont>>) {
    let Some(font) = font else {
        return;
    };
    for mut text in texts.iter_mut() {
        text.font = font.handle.clone();
    }
}

fn fall_back_font(
    asset_server: Res<AssetServer>,
    font: Option<ResMut<CardFont>>,
    texts: Query<&mut TextFont>,
) {
    let Some(mut font) = font else {
        return;
    };
    if font.fell_back {
        return;
    }
    if !matches!(asset_server.get_load_state(&font.handle), Some(LoadState::Failed(_))) {
        return;
    }
    warn!("Card font failed to load, using the bundled font; accented letters may not render");
    use_bundled_font(&mut font, texts);
}

fn use_bundled_font(font: &mut CardFont, mut texts: Query<&mut TextFont>) {
    font.fell_back = true;
    font.handle = Handle::default();
    for mut text in texts.iter_mut() {
        text.font = Handle::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_FACE: Handle<Font> = Handle::weak_from_u128(0xf0_47);

    fn font_app() -> App {
        let mut app = App::new();
        app.insert_resource(CardFont { handle: CARD_FACE, fell_back: false })
            .add_systems(PostUpdate, apply_font);
        app
    }

    fn fonts(app: &mut App) -> Vec<Handle<Font>> {
        let world = app.world_mut();
        world
            .query::<&TextFont>()
            .iter(world)
            .map(|f| f.font.clone())
            .collect()
    }

    #[test]
    fn new_text_is_set_in_the_card_font() {
        let mut app = font_app();
        app.world_mut().spawn((Text::new("Tiếp tục nèo"), TextFont::default()));
        app.update();
        app.world_mut()
            .spawn((Text::new("Chạm để mở nhé!"), TextFont { font_size: 40.0, ..default() }));
        app.update();

        assert_eq!(fonts(&mut app), vec![CARD_FACE, CARD_FACE]);
    }

    #[test]
    fn failed_font_falls_back_everywhere() {
        let mut app = font_app();
        app.add_systems(
            Update,
            |mut font: ResMut<CardFont>, texts: Query<&mut TextFont>| {
                if !font.fell_back {
                    use_bundled_font(&mut font, texts);
                }
            },
        );
        app.world_mut().spawn((Text::new("Bấm vô đây"), TextFont::default()));
        app.update();
        // Frame one: Update swaps the resource, then PostUpdate applies the bundled font.
        assert!(app.world().resource::<CardFont>().fell_back);
        assert_eq!(fonts(&mut app), vec![Handle::<Font>::default()]);

        app.world_mut().spawn((Text::new("Xem lại"), TextFont::default()));
        app.update();
        assert_eq!(fonts(&mut app), vec![Handle::default(), Handle::default()]);
    }
}
