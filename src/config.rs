use crate::browser;
use crate::engine::Point;
use anyhow::{ensure, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Which flavour of the demo is being played
/// ┌──────────┬─────────────────────────┬──────────────────────────────────┐
/// │ Variant  │ Clips                   │ Keys                             │
/// ├──────────┼─────────────────────────┼──────────────────────────────────┤
/// │ Classic  │ idle run kick           │ arrows move, Up jumps, Space     │
/// │          │                         │ kicks                            │
/// │ Brawler  │ idle run_left run_right │ arrows move, Up or Space jumps,  │
/// │          │ kick punch              │ Z kicks, X punches               │
/// └──────────┴─────────────────────────┴──────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Classic,
    Brawler,
}

/// Logical inputs the player controller understands
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Control {
    Left,
    Right,
    Up,
    Jump,
    Kick,
    Punch,
}

/// Maps each Control to the `KeyboardEvent.code` values that trigger it.
/// An empty list disables the control.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlScheme {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub up: Vec<String>,
    pub jump: Vec<String>,
    pub kick: Vec<String>,
    pub punch: Vec<String>,
}

fn codes(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

static CLASSIC_CONTROLS: Lazy<ControlScheme> = Lazy::new(|| ControlScheme {
    left: codes(&["ArrowLeft"]),
    right: codes(&["ArrowRight"]),
    up: codes(&["ArrowUp"]),
    jump: Vec::new(),
    kick: codes(&["Space"]),
    punch: Vec::new(),
});

static BRAWLER_CONTROLS: Lazy<ControlScheme> = Lazy::new(|| ControlScheme {
    left: codes(&["ArrowLeft"]),
    right: codes(&["ArrowRight"]),
    up: codes(&["ArrowUp"]),
    jump: codes(&["Space"]),
    kick: codes(&["KeyZ"]),
    punch: codes(&["KeyX"]),
});

impl ControlScheme {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Classic => CLASSIC_CONTROLS.clone(),
            Variant::Brawler => BRAWLER_CONTROLS.clone(),
        }
    }

    pub fn codes(&self, control: Control) -> &[String] {
        match control {
            Control::Left => &self.left,
            Control::Right => &self.right,
            Control::Up => &self.up,
            Control::Jump => &self.jump,
            Control::Kick => &self.kick,
            Control::Punch => &self.punch,
        }
    }
}

impl Default for ControlScheme {
    fn default() -> Self {
        ControlScheme::for_variant(Variant::Brawler)
    }
}

/// World + player tuning, optionally overridden by `game.json`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: u32,
    pub height: u32,
    pub background: String,
    // px/s^2, positive is down
    pub gravity: f32,
    pub run_speed: f32,
    // magnitude only, applied upward
    pub jump_speed: f32,
    pub bounce: f32,
    pub spawn: Point,
    pub variant: Variant,
    // None : use the variant's default keys
    pub controls: Option<ControlScheme>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let width = 600;
        let height = 300;
        GameConfig {
            width,
            height,
            background: "#333".to_string(),
            gravity: 500.0,
            run_speed: 160.0,
            jump_speed: 330.0,
            bounce: 0.2,
            spawn: Point {
                x: 100.0,
                y: height as f32 - 100.0,
            },
            variant: Variant::Brawler,
            controls: None,
        }
    }
}

impl GameConfig {
    pub const PATH: &'static str = "game.json";

    /// Fetch and validate a config file served next to the page
    pub async fn load(path: &str) -> Result<Self> {
        let config = browser::fetch_json::<GameConfig>(path)
            .await
            .with_context(|| format!("Failed to load game config from : {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// `load()` but never fails : a missing or broken file is logged and the
    /// built-in defaults are used instead
    pub async fn load_or_default(path: &str) -> Self {
        match Self::load(path).await {
            Ok(config) => config,
            Err(err) => {
                log!("Warning: using default config : {:#}", err);
                GameConfig::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "world size must be positive, got {}x{}",
            self.width,
            self.height
        );
        ensure!(self.gravity > 0.0, "gravity must be positive, got {}", self.gravity);
        ensure!(
            self.run_speed > 0.0,
            "run_speed must be positive, got {}",
            self.run_speed
        );
        ensure!(
            self.jump_speed > 0.0,
            "jump_speed must be positive, got {}",
            self.jump_speed
        );
        ensure!(
            (0.0..=1.0).contains(&self.bounce),
            "bounce must be within [0, 1], got {}",
            self.bounce
        );
        Ok(())
    }

    pub fn controls(&self) -> ControlScheme {
        self.controls
            .clone()
            .unwrap_or_else(|| ControlScheme::for_variant(self.variant))
    }
}
