/// All code relating to individual states lives here, and a transition can
/// only be reached through the methods below :
/// - PUBLIC  : DudeState and DudeContext
/// - PRIVATE : the fields, so no one can fake a Kicking without kicking
///
/// States know nothing about input or velocities, the controller in dude.rs
/// decides WHEN to transition, this file decides WHAT a transition means.
use crate::sprite::{Idle, Kicking, Punching, Running};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Sheets are drawn facing right, left means mirrored
    pub fn flip_x(&self) -> bool {
        matches!(self, Facing::Left)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DudeContext {
    pub facing: Facing,
}

#[derive(Debug, Copy, Clone)]
pub struct DudeState<S> {
    context: DudeContext,
    // phantom state, only there so the compiler can tell states apart
    _state: S,
}

impl<S> DudeState<S> {
    pub fn context(&self) -> &DudeContext {
        &self.context
    }
}

/// Only a dude on the move (or standing) can throw an attack
pub trait CanAttack {}
impl CanAttack for Idle {}
impl CanAttack for Running {}

impl<S: CanAttack> DudeState<S> {
    pub fn kick(self) -> DudeState<Kicking> {
        DudeState {
            context: self.context,
            _state: Kicking,
        }
    }

    pub fn punch(self) -> DudeState<Punching> {
        DudeState {
            context: self.context,
            _state: Punching,
        }
    }

    pub fn run(self, facing: Facing) -> DudeState<Running> {
        DudeState {
            context: self.context.face(facing),
            _state: Running,
        }
    }
}

impl DudeState<Idle> {
    pub fn new(facing: Facing) -> Self {
        DudeState {
            context: DudeContext { facing },
            _state: Idle,
        }
    }
}

impl DudeState<Running> {
    pub fn stop(self) -> DudeState<Idle> {
        DudeState {
            context: self.context,
            _state: Idle,
        }
    }
}

impl DudeState<Kicking> {
    pub fn finish(self) -> DudeState<Idle> {
        DudeState {
            context: self.context,
            _state: Idle,
        }
    }
}

impl DudeState<Punching> {
    pub fn finish(self) -> DudeState<Idle> {
        DudeState {
            context: self.context,
            _state: Idle,
        }
    }
}

impl DudeContext {
    fn face(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_sets_facing() {
        let running = DudeState::new(Facing::Right).run(Facing::Left);
        assert_eq!(running.context().facing, Facing::Left);
        assert!(running.context().facing.flip_x());

        let turned = running.run(Facing::Right);
        assert!(!turned.context().facing.flip_x());
    }

    #[test]
    fn attacks_keep_facing_through_to_idle() {
        let kicking = DudeState::new(Facing::Right).run(Facing::Left).kick();
        assert_eq!(kicking.context().facing, Facing::Left);
        let idle = kicking.finish();
        assert_eq!(idle.context().facing, Facing::Left);

        let punching = idle.punch();
        assert_eq!(punching.finish().context().facing, Facing::Left);
    }
}
