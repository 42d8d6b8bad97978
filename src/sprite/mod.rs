// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Directory Structure Analogy                         │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ Code Directory    │          Photoshop Equivalent                        │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ sprite/           │ Character Asset Library                              │
// │ ├── mod.rs        │ Sprite sheets + clip table (Layer Comps)             │
// │ ├── animation.rs  │ Timeline playback                                    │
// │ ├── state.rs      │ Poses : Idle, Running, Kicking, Punching             │
// │ └── dude.rs       │ Character rig : controller + body + animator         │
// └───────────────────┴──────────────────────────────────────────────────────┘
pub mod animation;
pub mod dude;
pub mod state;

use crate::config::Variant;
use crate::engine::{Point, Rect, Size};
use animation::{AnimationClip, ClipKey, FrameRef, Repeat};
use std::collections::HashMap;
use web_sys::HtmlImageElement;

// every dude sheet is cut into 64x64 cells
pub const DUDE_FRAME_SIZE: f32 = 64.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SheetKey {
    Dude,
    DudeRun,
    DudeKick,
    DudePunch,
}

impl SheetKey {
    pub const ALL: [SheetKey; 4] = [
        SheetKey::Dude,
        SheetKey::DudeRun,
        SheetKey::DudeKick,
        SheetKey::DudePunch,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            SheetKey::Dude => "assets/dude/Sprite_Base.png",
            SheetKey::DudeRun => "assets/dude/Sheet_Run.png",
            SheetKey::DudeKick => "assets/dude/Sheet_Kick.png",
            SheetKey::DudePunch => "assets/dude/Sheet_Punch.png",
        }
    }
}

/// Uniform grid layout of a sheet, frames are numbered row by row
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SheetGrid {
    pub frame_size: Size,
    pub columns: u32,
}

impl SheetGrid {
    /// Grid for an image of `image_width` px cut into `frame_size` cells.
    /// A sheet narrower than one frame still has one column.
    pub fn new(image_width: u32, frame_size: Size) -> Self {
        let columns = (image_width as f32 / frame_size.width).floor() as u32;
        SheetGrid {
            frame_size,
            columns: columns.max(1),
        }
    }

    pub fn frame_rect(&self, index: u32) -> Rect {
        let column = index % self.columns;
        let row = index / self.columns;
        Rect::new(
            Point {
                x: column as f32 * self.frame_size.width,
                y: row as f32 * self.frame_size.height,
            },
            self.frame_size,
        )
    }
}

pub struct SpriteSheet {
    pub image: HtmlImageElement,
    pub grid: SheetGrid,
}

impl SpriteSheet {
    pub fn new(image: HtmlImageElement, frame_size: Size) -> Self {
        let grid = SheetGrid::new(image.width(), frame_size);
        SpriteSheet { image, grid }
    }
}

#[derive(Default)]
pub struct SpriteSheets {
    sheets: HashMap<SheetKey, SpriteSheet>,
}

impl SpriteSheets {
    pub fn insert(&mut self, key: SheetKey, sheet: SpriteSheet) {
        self.sheets.insert(key, sheet);
    }

    pub fn get(&self, key: SheetKey) -> Option<&SpriteSheet> {
        self.sheets.get(&key)
    }
}

/// Marker types for the dude's typestate, see state.rs
pub trait SpriteState {
    fn name() -> &'static str;
}

#[derive(Debug, Copy, Clone)]
pub struct Idle;
#[derive(Debug, Copy, Clone)]
pub struct Running;
#[derive(Debug, Copy, Clone)]
pub struct Kicking;
#[derive(Debug, Copy, Clone)]
pub struct Punching;

impl SpriteState for Idle {
    fn name() -> &'static str {
        "Idle"
    }
}

impl SpriteState for Running {
    fn name() -> &'static str {
        "Running"
    }
}

impl SpriteState for Kicking {
    fn name() -> &'static str {
        "Kicking"
    }
}

impl SpriteState for Punching {
    fn name() -> &'static str {
        "Punching"
    }
}

/// The dude's clip table
/// ┌───────────┬────────────┬──────────┬──────┬─────────┐
/// │ clip      │ sheet      │ frames   │ fps  │ repeat  │
/// ├───────────┼────────────┼──────────┼──────┼─────────┤
/// │ idle      │ dude       │ 0        │ 1    │ -1 loop │
/// │ run*      │ dude_run   │ 8..=10   │ 10   │ -1 loop │
/// │ kick      │ dude_kick  │ 0..=15   │ 10   │ 0 once  │
/// │ punch     │ dude_punch │ 0..=15   │ 10   │ 0 once  │
/// └───────────┴────────────┴──────────┴──────┴─────────┘
/// * classic has one `run` clip, brawler has `run_left` and `run_right`
pub fn dude_clips(variant: Variant) -> Vec<AnimationClip> {
    let run_frames = FrameRef::range(SheetKey::DudeRun, 8, 10);
    let mut clips = vec![AnimationClip::new(
        ClipKey::Idle,
        vec![FrameRef::new(SheetKey::Dude, 0)],
        1.0,
        Repeat::from(-1),
    )];

    match variant {
        Variant::Classic => {
            clips.push(AnimationClip::new(
                ClipKey::Run,
                run_frames,
                10.0,
                Repeat::from(-1),
            ));
        }
        Variant::Brawler => {
            clips.push(AnimationClip::new(
                ClipKey::RunLeft,
                run_frames.clone(),
                10.0,
                Repeat::from(-1),
            ));
            clips.push(AnimationClip::new(
                ClipKey::RunRight,
                run_frames,
                10.0,
                Repeat::from(-1),
            ));
        }
    }

    clips.push(AnimationClip::new(
        ClipKey::Kick,
        FrameRef::range(SheetKey::DudeKick, 0, 15),
        10.0,
        Repeat::from(0),
    ));
    clips.push(AnimationClip::new(
        ClipKey::Punch,
        FrameRef::range(SheetKey::DudePunch, 0, 15),
        10.0,
        Repeat::from(0),
    ));
    clips
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> Size {
        Size {
            width: DUDE_FRAME_SIZE,
            height: DUDE_FRAME_SIZE,
        }
    }

    #[test]
    fn grid_numbers_frames_row_by_row() {
        let grid = SheetGrid::new(256, cell());
        assert_eq!(grid.columns, 4);
        assert_eq!(grid.frame_rect(0).position, Point { x: 0.0, y: 0.0 });
        assert_eq!(grid.frame_rect(3).position, Point { x: 192.0, y: 0.0 });
        assert_eq!(grid.frame_rect(9).position, Point { x: 64.0, y: 128.0 });
        assert_eq!(grid.frame_rect(9).size, cell());
    }

    #[test]
    fn narrow_sheet_still_has_a_column() {
        let grid = SheetGrid::new(10, cell());
        assert_eq!(grid.columns, 1);
        assert_eq!(grid.frame_rect(2).position, Point { x: 0.0, y: 128.0 });
    }

    #[test]
    fn classic_clip_table() {
        let keys: Vec<ClipKey> = dude_clips(Variant::Classic)
            .iter()
            .map(|clip| clip.key)
            .collect();
        assert_eq!(
            keys,
            vec![ClipKey::Idle, ClipKey::Run, ClipKey::Kick, ClipKey::Punch]
        );
    }

    #[test]
    fn brawler_clip_table() {
        let clips = dude_clips(Variant::Brawler);
        let run_left = clips
            .iter()
            .find(|clip| clip.key == ClipKey::RunLeft)
            .unwrap();
        assert_eq!(run_left.frames.len(), 3);
        assert_eq!(run_left.frames[0], FrameRef::new(SheetKey::DudeRun, 8));
        assert_eq!(run_left.repeat, Repeat::Forever);

        let kick = clips.iter().find(|clip| clip.key == ClipKey::Kick).unwrap();
        assert_eq!(kick.frames.len(), 16);
        assert_eq!(kick.repeat, Repeat::Times(0));
        assert!(clips.iter().all(|clip| clip.key != ClipKey::Run));
    }
}
