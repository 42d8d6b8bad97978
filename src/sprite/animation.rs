use crate::sprite::SheetKey;
use anyhow::{anyhow, ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipKey {
    Idle,
    Run,
    RunLeft,
    RunRight,
    Kick,
    Punch,
}

impl ClipKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipKey::Idle => "idle",
            ClipKey::Run => "run",
            ClipKey::RunLeft => "run_left",
            ClipKey::RunRight => "run_right",
            ClipKey::Kick => "kick",
            ClipKey::Punch => "punch",
        }
    }
}

impl fmt::Display for ClipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many times a clip plays after its first pass
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Repeat {
    Forever,
    Times(u32),
}

/// Sprite engine convention : -1 loops forever, 0 plays once, n replays n times
impl From<i32> for Repeat {
    fn from(count: i32) -> Self {
        if count < 0 {
            Repeat::Forever
        } else {
            Repeat::Times(count as u32)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub sheet: SheetKey,
    pub index: u32,
}

impl FrameRef {
    pub fn new(sheet: SheetKey, index: u32) -> Self {
        FrameRef { sheet, index }
    }

    /// Inclusive run of frames `start..=end` from one sheet
    pub fn range(sheet: SheetKey, start: u32, end: u32) -> Vec<FrameRef> {
        (start..=end).map(|index| FrameRef::new(sheet, index)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub key: ClipKey,
    pub frames: Vec<FrameRef>,
    pub frame_rate: f32,
    pub repeat: Repeat,
}

impl AnimationClip {
    pub fn new(key: ClipKey, frames: Vec<FrameRef>, frame_rate: f32, repeat: Repeat) -> Self {
        AnimationClip {
            key,
            frames,
            frame_rate,
            repeat,
        }
    }

    pub fn frame_duration_ms(&self) -> f32 {
        1000.0 / self.frame_rate
    }
}

/// Clips are registered once at scene creation and never change afterwards
#[derive(Debug, Default)]
pub struct AnimationRegistry {
    clips: HashMap<ClipKey, AnimationClip>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        AnimationRegistry::default()
    }

    pub fn from_clips(clips: Vec<AnimationClip>) -> Result<Self> {
        let mut registry = AnimationRegistry::new();
        for clip in clips {
            registry.create(clip)?;
        }
        Ok(registry)
    }

    pub fn create(&mut self, clip: AnimationClip) -> Result<()> {
        ensure!(
            !self.clips.contains_key(&clip.key),
            "animation '{}' is already registered",
            clip.key
        );
        ensure!(!clip.frames.is_empty(), "animation '{}' has no frames", clip.key);
        ensure!(
            clip.frame_rate > 0.0,
            "animation '{}' needs a positive frame rate, got {}",
            clip.key,
            clip.frame_rate
        );
        self.clips.insert(clip.key, clip);
        Ok(())
    }

    pub fn get(&self, key: ClipKey) -> Option<&AnimationClip> {
        self.clips.get(&key)
    }

    pub fn contains(&self, key: ClipKey) -> bool {
        self.clips.contains_key(&key)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationEvent {
    /// A non looping clip played its last frame
    Complete(ClipKey),
}

/// The controller's view of the animation subsystem
pub trait AnimationSink {
    fn current_key(&self) -> ClipKey;
    /// False once a one shot clip has shown its last frame
    fn is_playing(&self) -> bool;
    fn play(&mut self, key: ClipKey);
}

/// Plays one clip at a time and queues completion events. Events are only
/// ever read by whoever calls `drain_events`, on the same thread, between
/// ticks.
#[derive(Debug)]
pub struct Animator {
    registry: Rc<AnimationRegistry>,
    current: ClipKey,
    frame: usize,
    elapsed_ms: f32,
    repeats_left: Repeat,
    playing: bool,
    events: VecDeque<AnimationEvent>,
}

impl Animator {
    pub fn new(registry: Rc<AnimationRegistry>, initial: ClipKey) -> Result<Self> {
        let repeat = registry
            .get(initial)
            .map(|clip| clip.repeat)
            .ok_or_else(|| anyhow!("cannot start on unknown animation '{}'", initial))?;
        Ok(Animator {
            registry,
            current: initial,
            frame: 0,
            elapsed_ms: 0.0,
            repeats_left: repeat,
            playing: true,
            events: VecDeque::new(),
        })
    }

    /// Start `key` from its first frame, even if it is already playing
    pub fn try_play(&mut self, key: ClipKey) -> Result<()> {
        let clip = self
            .registry
            .get(key)
            .ok_or_else(|| anyhow!("animation '{}' is not registered", key))?;
        self.repeats_left = clip.repeat;
        self.current = key;
        self.frame = 0;
        self.elapsed_ms = 0.0;
        self.playing = true;
        Ok(())
    }

    pub fn tick(&mut self, dt_ms: f32) {
        if !self.playing {
            return;
        }
        let registry = Rc::clone(&self.registry);
        let clip = match registry.get(self.current) {
            Some(clip) => clip,
            None => return,
        };

        self.elapsed_ms += dt_ms;
        let frame_ms = clip.frame_duration_ms();
        while self.elapsed_ms >= frame_ms {
            self.elapsed_ms -= frame_ms;
            if self.frame + 1 < clip.frames.len() {
                self.frame += 1;
                continue;
            }
            match self.repeats_left {
                Repeat::Forever => self.frame = 0,
                Repeat::Times(0) => {
                    // hold the last frame
                    self.playing = false;
                    self.elapsed_ms = 0.0;
                    self.events.push_back(AnimationEvent::Complete(clip.key));
                    break;
                }
                Repeat::Times(n) => {
                    self.repeats_left = Repeat::Times(n - 1);
                    self.frame = 0;
                }
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        self.events.drain(..).collect()
    }

    pub fn current_frame(&self) -> Option<FrameRef> {
        self.registry
            .get(self.current)
            .and_then(|clip| clip.frames.get(self.frame))
            .copied()
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl AnimationSink for Animator {
    fn current_key(&self) -> ClipKey {
        self.current
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self, key: ClipKey) {
        if let Err(err) = self.try_play(key) {
            error!("Animator: {:#}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::sprite::dude_clips;

    fn animator(initial: ClipKey) -> Animator {
        let registry = AnimationRegistry::from_clips(dude_clips(Variant::Brawler)).unwrap();
        Animator::new(Rc::new(registry), initial).unwrap()
    }

    #[test]
    fn repeat_follows_the_sprite_engine_convention() {
        assert_eq!(Repeat::from(-1), Repeat::Forever);
        assert_eq!(Repeat::from(0), Repeat::Times(0));
        assert_eq!(Repeat::from(2), Repeat::Times(2));
    }

    #[test]
    fn registering_a_clip_twice_fails() {
        let mut registry = AnimationRegistry::new();
        let idle = AnimationClip::new(
            ClipKey::Idle,
            vec![FrameRef::new(SheetKey::Dude, 0)],
            1.0,
            Repeat::Forever,
        );
        registry.create(idle.clone()).unwrap();
        assert!(registry.create(idle).is_err());
        assert!(registry.contains(ClipKey::Idle));
    }

    #[test]
    fn empty_or_frozen_clips_are_rejected() {
        let mut registry = AnimationRegistry::new();
        let empty = AnimationClip::new(ClipKey::Kick, Vec::new(), 10.0, Repeat::Times(0));
        assert!(registry.create(empty).is_err());
        let frozen = AnimationClip::new(
            ClipKey::Punch,
            FrameRef::range(SheetKey::DudePunch, 0, 3),
            0.0,
            Repeat::Times(0),
        );
        assert!(registry.create(frozen).is_err());
    }

    #[test]
    fn unknown_initial_clip_is_an_error() {
        let registry = AnimationRegistry::from_clips(dude_clips(Variant::Classic)).unwrap();
        assert!(Animator::new(Rc::new(registry), ClipKey::RunLeft).is_err());
    }

    #[test]
    fn looping_clip_wraps_around() {
        let mut animator = animator(ClipKey::RunRight);
        assert_eq!(animator.current_frame(), Some(FrameRef::new(SheetKey::DudeRun, 8)));
        animator.tick(100.0);
        assert_eq!(animator.frame_index(), 1);
        animator.tick(200.0);
        assert_eq!(animator.frame_index(), 0);
        assert!(animator.is_playing());
        assert!(animator.drain_events().is_empty());
    }

    #[test]
    fn one_shot_clip_completes_once_and_holds_last_frame() {
        let mut animator = animator(ClipKey::Idle);
        animator.play(ClipKey::Kick);
        // 16 frames at 10 fps
        animator.tick(1500.0);
        assert!(animator.drain_events().is_empty());
        animator.tick(100.0);
        assert_eq!(
            animator.drain_events(),
            vec![AnimationEvent::Complete(ClipKey::Kick)]
        );
        assert!(!animator.is_playing());
        assert_eq!(
            animator.current_frame(),
            Some(FrameRef::new(SheetKey::DudeKick, 15))
        );

        animator.tick(1000.0);
        assert!(animator.drain_events().is_empty());
        assert_eq!(animator.current_key(), ClipKey::Kick);
    }

    #[test]
    fn finished_clip_plays_again_from_the_start() {
        let mut animator = animator(ClipKey::Idle);
        animator.play(ClipKey::Kick);
        animator.tick(1600.0);
        assert_eq!(animator.drain_events().len(), 1);
        assert!(!AnimationSink::is_playing(&animator));

        animator.play(ClipKey::Kick);
        assert!(AnimationSink::is_playing(&animator));
        assert_eq!(animator.frame_index(), 0);
        animator.tick(1600.0);
        assert_eq!(
            animator.drain_events(),
            vec![AnimationEvent::Complete(ClipKey::Kick)]
        );
    }

    #[test]
    fn repeated_clip_plays_extra_passes() {
        let clip = AnimationClip::new(
            ClipKey::Punch,
            FrameRef::range(SheetKey::DudePunch, 0, 1),
            10.0,
            Repeat::Times(1),
        );
        let registry = AnimationRegistry::from_clips(vec![clip]).unwrap();
        let mut animator = Animator::new(Rc::new(registry), ClipKey::Punch).unwrap();
        animator.tick(300.0);
        assert!(animator.drain_events().is_empty());
        animator.tick(100.0);
        assert_eq!(
            animator.drain_events(),
            vec![AnimationEvent::Complete(ClipKey::Punch)]
        );
    }

    #[test]
    fn play_restarts_and_unknown_keys_are_ignored() {
        let mut animator = animator(ClipKey::Idle);
        animator.play(ClipKey::Kick);
        animator.tick(500.0);
        assert_eq!(animator.frame_index(), 5);
        animator.play(ClipKey::Kick);
        assert_eq!(animator.frame_index(), 0);

        animator.play(ClipKey::Run);
        assert_eq!(animator.current_key(), ClipKey::Kick);
    }
}
