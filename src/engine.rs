use crate::browser;
use anyhow::{anyhow, Result};
// web assembly is single threaded, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref casts the closure to a js Function, we built the closure
    // so we know its type
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

pub mod input;
pub mod physics;

use self::input::KeyState;

/// TABLE
/// ┌──────────────────── Frame Flow ───────────────────────────┐
/// │  requestAnimationFrame(perf)                              │
/// │    ├─► input::process_input   drain keydown/keyup events  │
/// │    ├─► while accumulated > FRAME_SIZE                     │
/// │    │     ├─► Game::update(&KeyState)                      │
/// │    │     └─► KeyState::end_frame  clear just-pressed keys │
/// │    └─► Game::draw(&Renderer)                              │
/// └───────────────────────────────────────────────────────────┘
#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);
}

// length of a simulation step in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// same step in seconds, for velocities expressed in px/s
pub const FRAME_SECONDS: f32 = FRAME_SIZE / 1000.0;
// after a hidden tab resumes, don't try to catch up on minutes of updates
const MAX_ACCUMULATED_DELTA: f32 = FRAME_SIZE * 10.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let mut keystate = KeyState::new();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut keyevent_receiver);

            game_loop.accumulated_delta = (game_loop.accumulated_delta
                + (perf - game_loop.last_frame) as f32)
                .min(MAX_ACCUMULATED_DELTA);
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&keystate);
                // edges are consumed by the first simulated step only
                keystate.end_frame();
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);

            if let Some(callback) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(callback) {
                    error!("GameLoop: stopping, {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis aligned rectangle, `position` is the top left corner
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn new_from_x_y(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect::new(Point { x, y }, Size { width, height })
    }

    /// Rect of `size` whose centre sits on `center`
    pub fn centered(center: Point, size: Size) -> Self {
        Rect::new_from_x_y(
            center.x - size.width * 0.5,
            center.y - size.height * 0.5,
            size.width,
            size.height,
        )
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.position.x + self.size.width * 0.5,
            y: self.position.y + self.size.height * 0.5,
        }
    }

    /// Strict overlap, rects that only share an edge don't intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x() < other.right()
            && self.right() > other.x()
            && self.y() < other.bottom()
            && self.bottom() > other.y()
    }
}

// ==================== Rendering ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn stroke_rect(&self, rect: &Rect, color: &str) {
        self.context.set_stroke_style_str(color);
        self.context.stroke_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    /// Draw the whole image stretched into `destination`
    pub fn draw_entire_image(&self, image: &HtmlImageElement, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                destination.x().into(),
                destination.y().into(),
                destination.size.width.into(),
                destination.size.height.into(),
            )
        {
            error!("Renderer: drawing image failed {:#?}", err);
        }
    }

    /// Draw the `frame` region of a sheet into `destination`, mirrored around
    /// the destination's vertical axis when `flip_x` is set
    pub fn draw_sprite(
        &self,
        image: &HtmlImageElement,
        frame: &Rect,
        destination: &Rect,
        flip_x: bool,
    ) {
        self.context.save();
        let result = if flip_x {
            self.context
                .translate(destination.right().into(), destination.y().into())
                .and_then(|_| self.context.scale(-1.0, 1.0))
                .and_then(|_| self.draw_frame(image, frame, 0.0, 0.0, destination.size))
        } else {
            self.draw_frame(
                image,
                frame,
                destination.x().into(),
                destination.y().into(),
                destination.size,
            )
        };
        self.context.restore();

        if let Err(err) = result {
            error!("Renderer: drawing sprite failed {:#?}", err);
        }
    }

    fn draw_frame(
        &self,
        image: &HtmlImageElement,
        frame: &Rect,
        dx: f64,
        dy: f64,
        size: Size,
    ) -> std::result::Result<(), JsValue> {
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x().into(),
                frame.y().into(),
                frame.size.width.into(),
                frame.size.height.into(),
                dx,
                dy,
                size.width.into(),
                size.height.into(),
            )
    }
}

#[cfg(debug_assertions)]
pub trait DebugDraw {
    fn draw_debug(&self, renderer: &Renderer);
}

#[cfg(debug_assertions)]
impl DebugDraw for Rect {
    fn draw_debug(&self, renderer: &Renderer) {
        renderer.stroke_rect(self, "#FF0000");
    }
}

/// A static scenery image, placed by its centre like the sprites are
pub struct Image {
    element: HtmlImageElement,
    position: Point,
    scale: f32,
}

impl Image {
    pub fn new(element: HtmlImageElement, position: Point) -> Self {
        Image {
            element,
            position,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn destination(&self) -> Rect {
        Rect::centered(
            self.position,
            Size {
                width: self.element.width() as f32 * self.scale,
                height: self.element.height() as f32 * self.scale,
            },
        )
    }

    pub fn draw(&self, renderer: &Renderer) {
        renderer.draw_entire_image(&self.element, &self.destination());
    }
}

/// Resolves once the browser has decoded `source`, or fails with the path
/// that could not be fetched
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::create_html_image_element()?;
    let (sender, receiver) = channel::<Result<()>>();
    // onload and onerror share one sender, whichever fires first takes it
    let sender = Rc::new(RefCell::new(Some(sender)));

    let on_load_sender = Rc::clone(&sender);
    let on_load = browser::closure_wrap(Box::new(move || {
        if let Some(sender) = on_load_sender.borrow_mut().take() {
            let _ = sender.send(Ok(()));
        }
    }) as Box<dyn FnMut()>);

    let path = source.to_string();
    let on_error = browser::closure_wrap(Box::new(move |err: JsValue| {
        if let Some(sender) = sender.borrow_mut().take() {
            let _ = sender.send(Err(anyhow!("image [{}] failed to load : {:#?}", path, err)));
        }
    }) as Box<dyn FnMut(JsValue)>);

    image.set_onload(Some(on_load.as_ref().unchecked_ref()));
    image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    image.set_src(source);
    on_load.forget();
    on_error.forget();

    receiver
        .await
        .map_err(|_| anyhow!("image [{}] was dropped before loading", source))??;
    Ok(image)
}
