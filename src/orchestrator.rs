//! Scene orchestration: which scene is showing, the transient quiz/gift flags,
//! and the delayed transitions that let a celebration play out before the
//! scene changes.
//!
//! Everything routes through [`Orchestrator::handle`] (user input) and
//! [`Orchestrator::advance`] (time). Sound and confetti go out through the
//! [`AudioPlayer`] and [`CelebrationEffect`] capabilities so the rules can be
//! exercised without a window or an audio device.

use std::time::Duration;

use bevy::prelude::*;

use crate::content::{validate_options, ContentError, QuizOption, WRONG_ANSWER};

pub const SHAKE_WINDOW: Duration = Duration::from_millis(500);
pub const LETTER_DELAY: Duration = Duration::from_millis(1500);
pub const FINAL_DELAY: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scene {
    #[default]
    Opening,
    Quiz,
    Letter,
    Unwrapping,
    Final,
}

/// A tap on one of the card's controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Start,
    Choose(&'static str),
    Continue,
    OpenGift,
    Replay,
    ToggleMute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

/// Fire-and-forget audio. Implementations swallow their own failures.
pub trait AudioPlayer {
    fn play_background_music(&mut self);
    fn play_chime(&mut self);
    fn play_sparkle(&mut self);
    fn set_muted(&mut self, muted: bool);
}

pub trait CelebrationEffect {
    fn trigger(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    EndShake,
    Advance { from: Scene, to: Scene },
}

#[derive(Debug)]
struct Deferred {
    remaining: Duration,
    task: Task,
}

#[derive(Resource, Debug)]
pub struct Orchestrator {
    scene: Scene,
    shaking: bool,
    error_text: Option<&'static str>,
    muted: bool,
    gift_opened: bool,
    options: Vec<QuizOption>,
    pending: Vec<Deferred>,
}

impl Orchestrator {
    pub fn new(options: Vec<QuizOption>) -> Result<Self, ContentError> {
        validate_options(&options)?;
        Ok(Self {
            scene: Scene::Opening,
            shaking: false,
            error_text: None,
            muted: false,
            gift_opened: false,
            options,
            pending: Vec::new(),
        })
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    pub fn error_text(&self) -> Option<&'static str> {
        self.error_text
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn gift_opened(&self) -> bool {
        self.gift_opened
    }

    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    /// True while a delayed scene change is waiting to fire.
    pub fn is_advancing(&self) -> bool {
        self.pending
            .iter()
            .any(|d| matches!(d.task, Task::Advance { .. }))
    }

    pub fn handle(
        &mut self,
        input: Input,
        audio: &mut impl AudioPlayer,
        celebration: &mut impl CelebrationEffect,
    ) -> Outcome {
        match (self.scene, input) {
            (_, Input::ToggleMute) => {
                self.muted = !self.muted;
                audio.set_muted(self.muted);
                debug!("Muted: {}", self.muted);
            }
            (Scene::Opening, Input::Start) => {
                audio.play_background_music();
                audio.play_chime();
                self.enter(Scene::Quiz);
            }
            (Scene::Quiz, Input::Choose(id)) if !self.is_advancing() => {
                let Some(option) = self.options.iter().find(|o| o.id == id).copied() else {
                    debug!("Unknown quiz option `{}`", id);
                    return Outcome::Ignored;
                };
                if option.correct {
                    celebration.trigger();
                    self.error_text = None;
                    self.shaking = false;
                    self.pending.retain(|d| d.task != Task::EndShake);
                    self.schedule(
                        LETTER_DELAY,
                        Task::Advance { from: Scene::Quiz, to: Scene::Letter },
                    );
                } else {
                    self.error_text = Some(WRONG_ANSWER);
                    self.shaking = true;
                    // A second miss restarts the shake window.
                    self.pending.retain(|d| d.task != Task::EndShake);
                    self.schedule(SHAKE_WINDOW, Task::EndShake);
                    debug!("Wrong answer `{}`", option.label);
                }
            }
            (Scene::Letter, Input::Continue) => {
                audio.play_chime();
                self.enter(Scene::Unwrapping);
            }
            (Scene::Unwrapping, Input::OpenGift) if !self.gift_opened => {
                self.gift_opened = true;
                celebration.trigger();
                self.schedule(
                    FINAL_DELAY,
                    Task::Advance { from: Scene::Unwrapping, to: Scene::Final },
                );
            }
            (Scene::Final, Input::Replay) => {
                audio.play_chime();
                self.enter(Scene::Opening);
                info!("Card replayed");
            }
            (scene, input) => {
                debug!("Ignored {:?} in {:?}", input, scene);
                return Outcome::Ignored;
            }
        }
        Outcome::Applied
    }

    /// Moves the deferred tasks forward by `dt` and fires the ones that came due.
    pub fn advance(&mut self, dt: Duration, audio: &mut impl AudioPlayer) {
        if self.pending.is_empty() {
            return;
        }

        let mut due = Vec::new();
        self.pending.retain_mut(|d| {
            d.remaining = d.remaining.saturating_sub(dt);
            if d.remaining.is_zero() {
                due.push(d.task);
                false
            } else {
                true
            }
        });

        for task in due {
            match task {
                Task::EndShake => self.shaking = false,
                Task::Advance { from, to } if self.scene == from => {
                    audio.play_chime();
                    self.enter(to);
                }
                Task::Advance { from, to } => {
                    warn!("Dropped stale transition {:?} -> {:?}", from, to);
                }
            }
        }
    }

    fn schedule(&mut self, delay: Duration, task: Task) {
        self.pending.push(Deferred { remaining: delay, task });
    }

    fn enter(&mut self, to: Scene) {
        let from = self.scene;
        self.scene = to;

        if from == Scene::Quiz {
            self.error_text = None;
            self.shaking = false;
            self.pending.retain(|d| d.task != Task::EndShake);
        }
        if to == Scene::Opening {
            self.gift_opened = false;
            self.error_text = None;
            self.shaking = false;
            self.pending.clear();
        }

        info!("Scene {:?} -> {:?}", from, to);
    }
}
