use crate::config::{ControlScheme, GameConfig};
use crate::engine::input::{Controls, KeyState};
use crate::engine::physics::{ArcadeBody, ArcadeWorld};
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{self, Game, Image, Point, Rect, Renderer, Size};
use crate::sprite::animation::{AnimationRegistry, Animator, ClipKey};
use crate::sprite::dude::{Player, PlayerController};
use crate::sprite::{self, SheetKey, SpriteSheet, SpriteSheets, DUDE_FRAME_SIZE};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::try_join;
use std::rc::Rc;
use web_sys::HtmlImageElement;

/// TABLE
/// ┌───────────────────── Scene Lifecycle ───────────────────────────────────┐
/// │                                                                         │
/// │  1. initialize (once)                                                   │
/// │     ├─► load scenery + the four dude sheets in parallel                 │
/// │     ├─► register clips, spawn the dude, register the ground collider    │
/// │     └─► Platformer::Loading → Platformer::Loaded(Stage)                 │
/// │                                                                         │
/// │  2. update (every simulated frame)                                      │
/// │     └─► Player::update : finished clips → controller → physics → anim   │
/// │                                                                         │
/// │  3. draw (every animation frame)                                        │
/// │     └─► background → mountains → moon → dude                            │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum Platformer {
    /// Waiting on assets, holds the config the stage will be built from
    Loading(GameConfig),
    Loaded(Stage),
}

// thickness of the invisible floor along the bottom of the world
const GROUND_HEIGHT: f32 = 8.0;

impl Platformer {
    const MOUNTAINS_PATH: &'static str = "assets/layer4.png";
    const MOON_PATH: &'static str = "assets/moon.png";

    pub fn new(config: GameConfig) -> Self {
        Platformer::Loading(config)
    }

    async fn load(path: &'static str) -> Result<HtmlImageElement> {
        engine::load_image(path)
            .await
            .with_context(|| format!("Failed to load image resource from : {}", path))
    }
}

#[async_trait(?Send)]
impl Game for Platformer {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            Platformer::Loading(config) => {
                // everything loads in parallel, the slowest asset sets the pace
                let (mountains, moon, dude, dude_run, dude_kick, dude_punch) = try_join!(
                    Self::load(Self::MOUNTAINS_PATH),
                    Self::load(Self::MOON_PATH),
                    Self::load(SheetKey::Dude.path()),
                    Self::load(SheetKey::DudeRun.path()),
                    Self::load(SheetKey::DudeKick.path()),
                    Self::load(SheetKey::DudePunch.path()),
                )?;

                let frame_size = Size {
                    width: DUDE_FRAME_SIZE,
                    height: DUDE_FRAME_SIZE,
                };
                let mut sheets = SpriteSheets::default();
                for (key, image) in SheetKey::ALL
                    .into_iter()
                    .zip([dude, dude_run, dude_kick, dude_punch])
                {
                    sheets.insert(key, SpriteSheet::new(image, frame_size));
                }

                let stage = Stage::new(config.clone(), sheets, mountains, moon)?;
                log!(
                    "Stage ready : {}x{} {:?} variant",
                    config.width,
                    config.height,
                    config.variant
                );
                Ok(Box::new(Platformer::Loaded(stage)))
            }
            Platformer::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let Platformer::Loaded(stage) = self {
            stage.update(keystate);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let Platformer::Loaded(stage) = self {
            stage.draw(renderer);
        }
    }
}

pub struct Stage {
    config: GameConfig,
    controls: ControlScheme,
    world: ArcadeWorld,
    player: Player,
    sheets: SpriteSheets,
    scenery: Vec<Image>,
}

impl Stage {
    fn new(
        config: GameConfig,
        sheets: SpriteSheets,
        mountains: HtmlImageElement,
        moon: HtmlImageElement,
    ) -> Result<Self> {
        let world = build_world(&config);
        let player = spawn_player(&config)?;

        // draw order : back to front
        let scenery = vec![
            Image::new(mountains.clone(), Point { x: 200.0, y: 240.0 }),
            Image::new(mountains, Point { x: 350.0, y: 240.0 }),
            Image::new(moon, Point { x: 530.0, y: 50.0 }).with_scale(0.3),
        ];

        Ok(Stage {
            controls: config.controls(),
            config,
            world,
            player,
            sheets,
            scenery,
        })
    }

    fn update(&mut self, keystate: &KeyState) {
        let controls = Controls::new(keystate, &self.controls);
        self.player.update(&controls, &self.world);
    }

    fn draw(&self, renderer: &Renderer) {
        let screen = self.world.bounds();
        renderer.clear(&screen);
        renderer.fill_rect(&screen, &self.config.background);

        for image in &self.scenery {
            image.draw(renderer);
        }

        self.draw_player(renderer);
    }

    fn draw_player(&self, renderer: &Renderer) {
        let frame = match self.player.current_frame() {
            Some(frame) => frame,
            None => return,
        };
        let sheet = match self.sheets.get(frame.sheet) {
            Some(sheet) => sheet,
            None => {
                error!("Stage: no sprite sheet loaded for {:?}", frame.sheet);
                return;
            }
        };

        let body = self.player.body();
        let destination = Rect::centered(body.position, sheet.grid.frame_size);
        renderer.draw_sprite(
            &sheet.image,
            &sheet.grid.frame_rect(frame.index),
            &destination,
            self.player.flip_x(),
        );

        #[cfg(debug_assertions)]
        body.bounds().draw_debug(renderer);
    }
}

/// Gravity, world bounds and a floor collider along the bottom edge
pub fn build_world(config: &GameConfig) -> ArcadeWorld {
    let width = config.width as f32;
    let height = config.height as f32;
    let mut world = ArcadeWorld::new(
        config.gravity,
        Rect::new_from_x_y(0.0, 0.0, width, height),
    );
    world.add_static_collider(Rect::new_from_x_y(
        0.0,
        height - GROUND_HEIGHT,
        width,
        GROUND_HEIGHT,
    ));
    world
}

/// The dude at the spawn point, bouncing slightly and kept inside the world,
/// already playing `idle`
pub fn spawn_player(config: &GameConfig) -> Result<Player> {
    let registry = AnimationRegistry::from_clips(sprite::dude_clips(config.variant))
        .context("Failed to register dude animations")?;
    let animator = Animator::new(Rc::new(registry), ClipKey::Idle)?;
    let body = ArcadeBody::new(
        config.spawn,
        Size {
            width: DUDE_FRAME_SIZE,
            height: DUDE_FRAME_SIZE,
        },
    )
    .with_bounce(config.bounce)
    .with_world_bounds(true);

    Ok(Player::new(
        PlayerController::from_config(config),
        body,
        animator,
    ))
}
