// ==================== Imports ====================
use wasm_bindgen::prelude::*;

#[macro_use]
pub mod browser;
pub mod config;
pub mod engine;
pub mod game;
pub mod sprite;

use config::GameConfig;
use engine::GameLoop;
use game::Platformer;

// ==================== Main Functions ====================
/// Main entry for the Webassembly module
/// - installs the panic hook
/// - loads `game.json` (or falls back to defaults)
/// - sizes the canvas and starts the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task on the local (only) thread
    browser::spawn_local(async move {
        let config = GameConfig::load_or_default(GameConfig::PATH).await;
        if let Err(err) = browser::resize_canvas(config.width, config.height) {
            error!("Could not size the canvas : {:#}", err);
            return;
        }
        if let Err(err) = GameLoop::start(Platformer::new(config)).await {
            error!("Could not start game loop : {:#}", err);
        }
    });

    Ok(())
}
