use crate::browser;
use crate::config::{Control, ControlScheme};
use anyhow::Result;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::collections::HashSet;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;

/// Raw keyboard traffic, keyed by `KeyboardEvent.code` ("ArrowLeft", "KeyZ")
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPress {
    KeyDown(String),
    KeyUp(String),
    /// The page lost focus, keyups for anything held will never arrive
    ReleaseAll,
}

// keys the page would otherwise scroll on
const SWALLOWED_CODES: [&str; 5] = ["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown", "Space"];

/// Hook window keydown/keyup/blur into a channel the game loop drains once
/// per animation frame. Callbacks run between frames, never during an update.
pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
    let (keydown_sender, keyevent_receiver) = unbounded();
    let keyup_sender = keydown_sender.clone();
    let blur_sender = keydown_sender.clone();

    let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        if SWALLOWED_CODES.contains(&event.code().as_str()) {
            event.prevent_default();
        }
        let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(event.code()));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let onkeyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(event.code()));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let onblur = browser::closure_wrap(Box::new(move || {
        let _ = blur_sender.unbounded_send(KeyPress::ReleaseAll);
    }) as Box<dyn FnMut()>);

    let window = browser::window()?;
    window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
    window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
    window.set_onblur(Some(onblur.as_ref().unchecked_ref()));
    // listeners live as long as the page
    onkeydown.forget();
    onkeyup.forget();
    onblur.forget();

    Ok(keyevent_receiver)
}

pub fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
    // Err : nothing queued right now, or the channel closed
    while let Ok(press) = keyevent_receiver.try_recv() {
        state.apply(press);
    }
}

/// Held keys plus the keys that went down since the last simulated step
#[derive(Debug, Default)]
pub struct KeyState {
    held: HashSet<String>,
    just_pressed: HashSet<String>,
}

impl KeyState {
    pub fn new() -> Self {
        KeyState::default()
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    pub fn is_just_pressed(&self, code: &str) -> bool {
        self.just_pressed.contains(code)
    }

    pub fn apply(&mut self, press: KeyPress) {
        match press {
            KeyPress::KeyDown(code) => self.set_pressed(code),
            KeyPress::KeyUp(code) => self.set_released(&code),
            KeyPress::ReleaseAll => self.held.clear(),
        }
    }

    /// Auto repeat keydowns arrive while the key is already held, those
    /// never count as a fresh press
    fn set_pressed(&mut self, code: String) {
        if !self.held.contains(&code) {
            self.just_pressed.insert(code.clone());
            self.held.insert(code);
        }
    }

    // a tap released before the next step still reports its press
    fn set_released(&mut self, code: &str) {
        self.held.remove(code);
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}

/// What the player controller reads each frame
pub trait InputSnapshot {
    fn is_held(&self, control: Control) -> bool;
    fn just_pressed(&self, control: Control) -> bool;
}

/// KeyState seen through a ControlScheme
pub struct Controls<'a> {
    keys: &'a KeyState,
    scheme: &'a ControlScheme,
}

impl<'a> Controls<'a> {
    pub fn new(keys: &'a KeyState, scheme: &'a ControlScheme) -> Self {
        Controls { keys, scheme }
    }
}

impl InputSnapshot for Controls<'_> {
    fn is_held(&self, control: Control) -> bool {
        self.scheme
            .codes(control)
            .iter()
            .any(|code| self.keys.is_pressed(code))
    }

    fn just_pressed(&self, control: Control) -> bool {
        self.scheme
            .codes(control)
            .iter()
            .any(|code| self.keys.is_just_pressed(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;

    fn down(code: &str) -> KeyPress {
        KeyPress::KeyDown(code.to_string())
    }

    fn up(code: &str) -> KeyPress {
        KeyPress::KeyUp(code.to_string())
    }

    #[test]
    fn press_is_edge_triggered_once() {
        let mut keys = KeyState::new();
        keys.apply(down("KeyZ"));
        assert!(keys.is_pressed("KeyZ"));
        assert!(keys.is_just_pressed("KeyZ"));

        keys.end_frame();
        // browser auto repeat
        keys.apply(down("KeyZ"));
        assert!(keys.is_pressed("KeyZ"));
        assert!(!keys.is_just_pressed("KeyZ"));
    }

    #[test]
    fn release_then_press_is_a_new_edge() {
        let mut keys = KeyState::new();
        keys.apply(down("Space"));
        keys.end_frame();
        keys.apply(up("Space"));
        assert!(!keys.is_pressed("Space"));
        keys.apply(down("Space"));
        assert!(keys.is_just_pressed("Space"));
    }

    #[test]
    fn quick_tap_survives_until_the_next_step() {
        let mut keys = KeyState::new();
        keys.apply(down("KeyX"));
        keys.apply(up("KeyX"));
        assert!(!keys.is_pressed("KeyX"));
        assert!(keys.is_just_pressed("KeyX"));
        keys.end_frame();
        assert!(!keys.is_just_pressed("KeyX"));
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let mut keys = KeyState::new();
        keys.apply(down("KeyZ"));
        keys.apply(down("ArrowRight"));
        keys.end_frame();

        // keyups went to another window
        keys.apply(KeyPress::ReleaseAll);
        assert!(!keys.is_pressed("ArrowRight"));
        assert!(!keys.is_pressed("KeyZ"));

        keys.apply(down("KeyZ"));
        assert!(keys.is_just_pressed("KeyZ"));
        let scheme = ControlScheme::for_variant(Variant::Brawler);
        let controls = Controls::new(&keys, &scheme);
        assert!(controls.just_pressed(Control::Kick));
        assert!(!controls.is_held(Control::Right));
    }

    #[test]
    fn process_input_drains_queued_events() {
        let (sender, mut receiver) = unbounded();
        sender.unbounded_send(down("ArrowLeft")).unwrap();
        sender.unbounded_send(down("ArrowUp")).unwrap();
        sender.unbounded_send(up("ArrowUp")).unwrap();

        let mut keys = KeyState::new();
        process_input(&mut keys, &mut receiver);
        assert!(keys.is_pressed("ArrowLeft"));
        assert!(!keys.is_pressed("ArrowUp"));
        assert!(keys.is_just_pressed("ArrowUp"));

        sender.unbounded_send(KeyPress::ReleaseAll).unwrap();
        drop(sender);
        process_input(&mut keys, &mut receiver);
        assert!(!keys.is_pressed("ArrowLeft"));
    }

    #[test]
    fn controls_map_codes_through_the_scheme() {
        let scheme = ControlScheme::for_variant(Variant::Classic);
        let mut keys = KeyState::new();
        keys.apply(down("Space"));
        keys.apply(down("ArrowRight"));

        let controls = Controls::new(&keys, &scheme);
        assert!(controls.just_pressed(Control::Kick));
        assert!(controls.is_held(Control::Right));
        assert!(!controls.is_held(Control::Left));
        // classic has no jump key, Space is the kick
        assert!(!controls.just_pressed(Control::Jump));
        assert!(!controls.just_pressed(Control::Punch));
    }
}
