//! Runtime settings read from the environment (and `.env`, when present).

use bevy::prelude::*;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a volume between 0 and 1, got `{value}`")]
    Volume { key: &'static str, value: String },
    #[error("{key} must be true or false, got `{value}`")]
    Flag { key: &'static str, value: String },
}

#[derive(Resource, Clone, Debug, PartialEq)]
pub struct CardConfig {
    pub fullscreen: bool,
    pub music: String,
    pub music_fallback: String,
    pub chime: String,
    pub sparkle: String,
    pub font: String,
    pub music_volume: f32,
    pub sfx_volume: f32,
    pub log_filter: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            music: "sounds/music.ogg".into(),
            music_fallback: "sounds/music_fallback.ogg".into(),
            chime: "sounds/chime.ogg".into(),
            sparkle: "sounds/sparkle.ogg".into(),
            font: "fonts/card.ttf".into(),
            music_volume: 0.5,
            sfx_volume: 0.8,
            log_filter: "info,wgpu=error,naga=warn".into(),
        }
    }
}

impl CardConfig {
    /// Reads the settings. A value that does not parse keeps its default and is
    /// returned alongside, so the rest of the overrides still apply.
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<ConfigError>) {
        let mut cfg = Self::default();
        let mut problems = Vec::new();

        if let Some(value) = lookup("CARD_FULLSCREEN") {
            match parse_flag("CARD_FULLSCREEN", &value) {
                Ok(flag) => cfg.fullscreen = flag,
                Err(e) => problems.push(e),
            }
        }

        let volumes = [
            ("CARD_MUSIC_VOLUME", &mut cfg.music_volume),
            ("CARD_SFX_VOLUME", &mut cfg.sfx_volume),
        ];
        for (key, slot) in volumes {
            if let Some(value) = lookup(key) {
                match parse_volume(key, &value) {
                    Ok(v) => *slot = v,
                    Err(e) => problems.push(e),
                }
            }
        }

        let paths = [
            ("CARD_MUSIC", &mut cfg.music),
            ("CARD_MUSIC_FALLBACK", &mut cfg.music_fallback),
            ("CARD_CHIME", &mut cfg.chime),
            ("CARD_SPARKLE", &mut cfg.sparkle),
            ("CARD_FONT", &mut cfg.font),
            ("CARD_LOG", &mut cfg.log_filter),
        ];
        for (key, slot) in paths {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }

        (cfg, problems)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Flag { key, value: value.to_string() }),
    }
}

fn parse_volume(key: &'static str, value: &str) -> Result<f32, ConfigError> {
    match value.trim().parse::<f32>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(ConfigError::Volume { key, value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> (CardConfig, Vec<ConfigError>) {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CardConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(load(&[]), (CardConfig::default(), vec![]));
    }

    #[test]
    fn reads_overrides() {
        let (cfg, problems) = load(&[
            ("CARD_FULLSCREEN", "yes"),
            ("CARD_MUSIC", " tunes/last.ogg "),
            ("CARD_MUSIC_VOLUME", "0.25"),
            ("CARD_SFX_VOLUME", "1"),
            ("CARD_FONT", "fonts/BeVietnamPro-Medium.ttf"),
            ("CARD_LOG", "debug"),
        ]);
        assert!(problems.is_empty());
        assert!(cfg.fullscreen);
        assert_eq!(cfg.music, "tunes/last.ogg");
        assert_eq!(cfg.music_volume, 0.25);
        assert_eq!(cfg.sfx_volume, 1.0);
        assert_eq!(cfg.font, "fonts/BeVietnamPro-Medium.ttf");
        assert_eq!(cfg.log_filter, "debug");
        assert_eq!(cfg.chime, CardConfig::default().chime);
    }

    #[test]
    fn blank_paths_keep_defaults() {
        let (cfg, _) = load(&[("CARD_CHIME", "   "), ("CARD_FONT", "")]);
        assert_eq!(cfg.chime, "sounds/chime.ogg");
        assert_eq!(cfg.font, "fonts/card.ttf");
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let (cfg, problems) = load(&[("CARD_MUSIC_VOLUME", "1.5")]);
        assert_eq!(cfg.music_volume, 0.5);
        assert_eq!(
            problems,
            vec![ConfigError::Volume { key: "CARD_MUSIC_VOLUME", value: "1.5".into() }]
        );
        assert_eq!(load(&[("CARD_SFX_VOLUME", "loud")]).1.len(), 1);
    }

    #[test]
    fn rejects_unknown_flag() {
        let (cfg, problems) = load(&[("CARD_FULLSCREEN", "maybe")]);
        assert!(!cfg.fullscreen);
        assert_eq!(
            problems,
            vec![ConfigError::Flag { key: "CARD_FULLSCREEN", value: "maybe".into() }]
        );
    }

    #[test]
    fn bad_value_keeps_the_other_overrides() {
        let (cfg, problems) = load(&[
            ("CARD_FULLSCREEN", "maybe"),
            ("CARD_MUSIC", "tunes/mine.ogg"),
            ("CARD_CHIME", "tunes/ding.ogg"),
            ("CARD_SFX_VOLUME", "0.3"),
            ("CARD_LOG", "warn"),
        ]);
        assert_eq!(problems.len(), 1);
        assert!(!cfg.fullscreen);
        assert_eq!(cfg.music, "tunes/mine.ogg");
        assert_eq!(cfg.chime, "tunes/ding.ogg");
        assert_eq!(cfg.sfx_volume, 0.3);
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn every_bad_value_is_reported() {
        let (cfg, problems) = load(&[
            ("CARD_FULLSCREEN", "maybe"),
            ("CARD_MUSIC_VOLUME", "-1"),
            ("CARD_SFX_VOLUME", "loud"),
        ]);
        assert_eq!(cfg, CardConfig::default());
        let keys: Vec<&str> = problems
            .iter()
            .map(|p| match p {
                ConfigError::Flag { key, .. } | ConfigError::Volume { key, .. } => *key,
            })
            .collect();
        assert_eq!(keys, ["CARD_FULLSCREEN", "CARD_MUSIC_VOLUME", "CARD_SFX_VOLUME"]);
    }
}
