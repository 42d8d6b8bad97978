//! Browser tests, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use dude_brawl::browser;
use dude_brawl::config::GameConfig;
use dude_brawl::engine;
use dude_brawl::engine::Size;
use dude_brawl::sprite::{SpriteSheet, DUDE_FRAME_SIZE};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn window_and_clock_are_available() {
    assert!(browser::window().is_ok());
    assert!(browser::document().is_ok());
    let first = browser::now().unwrap();
    let second = browser::now().unwrap();
    assert!(second >= first);
}

#[wasm_bindgen_test]
fn missing_canvas_is_an_error() {
    // the test page has no #canvas element
    assert!(browser::canvas().is_err());
    assert!(browser::context().is_err());
}

#[wasm_bindgen_test]
fn unloaded_image_makes_a_single_column_sheet() {
    let image = browser::create_html_image_element().unwrap();
    let sheet = SpriteSheet::new(
        image,
        Size {
            width: DUDE_FRAME_SIZE,
            height: DUDE_FRAME_SIZE,
        },
    );
    assert_eq!(sheet.grid.columns, 1);
}

#[wasm_bindgen_test]
async fn loading_a_missing_image_fails() {
    let result = engine::load_image("does/not/exist.png").await;
    assert!(result.is_err());
}

#[wasm_bindgen_test]
async fn missing_config_falls_back_to_defaults() {
    assert!(GameConfig::load("does/not/exist.json").await.is_err());
    let config = GameConfig::load_or_default("does/not/exist.json").await;
    assert_eq!(config, GameConfig::default());
}
