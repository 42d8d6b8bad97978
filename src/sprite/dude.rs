use crate::config::{Control, GameConfig, Variant};
use crate::engine::input::InputSnapshot;
use crate::engine::physics::{ArcadeBody, ArcadeWorld, PhysicsBody};
use crate::engine::{FRAME_SECONDS, FRAME_SIZE};
use crate::sprite::animation::{AnimationEvent, AnimationSink, Animator, ClipKey, FrameRef};
use crate::sprite::state::{DudeContext, DudeState, Facing};
use crate::sprite::{Idle, Kicking, Punching, Running, SpriteState};
use std::collections::VecDeque;

/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State       →  Event             →  To State      │
/// ├─────────────────────────────────────────────────────────┤
/// │  Idle | Running   →  Run(facing)       →  Running       │
/// │  Running          →  Stop              →  Idle          │
/// │  Idle | Running   →  Kick              →  Kicking       │
/// │  Idle | Running   →  Punch             →  Punching      │
/// │  Kicking          →  Finished(kick)    →  Idle          │
/// │  Punching         →  Finished(punch)   →  Idle          │
/// └─────────────────────────────────────────────────────────┘
/// Anything else leaves the state as it is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Run(Facing),
    Stop,
    Kick,
    Punch,
    Finished(ClipKey),
}

#[derive(Debug, Copy, Clone)]
pub enum DudeStateMachine {
    Idle(DudeState<Idle>),
    Running(DudeState<Running>),
    Kicking(DudeState<Kicking>),
    Punching(DudeState<Punching>),
}

impl From<DudeState<Idle>> for DudeStateMachine {
    fn from(state: DudeState<Idle>) -> Self {
        DudeStateMachine::Idle(state)
    }
}

impl From<DudeState<Running>> for DudeStateMachine {
    fn from(state: DudeState<Running>) -> Self {
        DudeStateMachine::Running(state)
    }
}

impl From<DudeState<Kicking>> for DudeStateMachine {
    fn from(state: DudeState<Kicking>) -> Self {
        DudeStateMachine::Kicking(state)
    }
}

impl From<DudeState<Punching>> for DudeStateMachine {
    fn from(state: DudeState<Punching>) -> Self {
        DudeStateMachine::Punching(state)
    }
}

impl DudeStateMachine {
    pub fn new() -> Self {
        DudeState::new(Facing::Right).into()
    }

    // consumes self : the old state can't be used once it has transitioned
    pub fn transition(self, event: Event) -> Self {
        use DudeStateMachine::*;
        match (self, event) {
            (Idle(state), Event::Run(facing)) => state.run(facing).into(),
            (Running(state), Event::Run(facing)) => state.run(facing).into(),
            (Running(state), Event::Stop) => state.stop().into(),
            (Idle(state), Event::Kick) => state.kick().into(),
            (Running(state), Event::Kick) => state.kick().into(),
            (Idle(state), Event::Punch) => state.punch().into(),
            (Running(state), Event::Punch) => state.punch().into(),
            (Kicking(state), Event::Finished(ClipKey::Kick)) => state.finish().into(),
            (Punching(state), Event::Finished(ClipKey::Punch)) => state.finish().into(),
            _ => self,
        }
    }

    pub fn context(&self) -> &DudeContext {
        use DudeStateMachine::*;
        match self {
            Idle(state) => state.context(),
            Running(state) => state.context(),
            Kicking(state) => state.context(),
            Punching(state) => state.context(),
        }
    }

    pub fn name(&self) -> &'static str {
        use DudeStateMachine::*;
        match self {
            Idle(_) => crate::sprite::Idle::name(),
            Running(_) => crate::sprite::Running::name(),
            Kicking(_) => crate::sprite::Kicking::name(),
            Punching(_) => crate::sprite::Punching::name(),
        }
    }

    /// Attacks hold the dude in place until their clip finishes
    pub fn is_blocking(&self) -> bool {
        matches!(self, DudeStateMachine::Kicking(_) | DudeStateMachine::Punching(_))
    }

    pub fn clip(&self, variant: Variant) -> ClipKey {
        use DudeStateMachine::*;
        match (self, variant) {
            (Idle(_), _) => ClipKey::Idle,
            (Running(_), Variant::Classic) => ClipKey::Run,
            (Running(state), Variant::Brawler) => match state.context().facing {
                Facing::Left => ClipKey::RunLeft,
                Facing::Right => ClipKey::RunRight,
            },
            (Kicking(_), _) => ClipKey::Kick,
            (Punching(_), _) => ClipKey::Punch,
        }
    }
}

impl Default for DudeStateMachine {
    fn default() -> Self {
        DudeStateMachine::new()
    }
}

/// Per frame projection of input onto velocity commands and a clip
/// ┌─────────────────────── update() ───────────────────────────┐
/// │ 0. drain queued clip-finished events (attack -> idle)      │
/// │ 1. jump    : Up held | Jump just pressed, and on ground    │
/// │ 2. attack in progress : vx = 0, nothing else changes       │
/// │ 3. attack just pressed : vx = 0, kick | punch              │
/// │ 4. Left held  : vx = -run, run left                        │
/// │ 5. Right held : vx = +run, run right                       │
/// │ 6. otherwise  : vx = 0, idle                               │
/// │ 7. play the state's clip unless it is current and running  │
/// └────────────────────────────────────────────────────────────┘
#[derive(Debug)]
pub struct PlayerController {
    state: DudeStateMachine,
    variant: Variant,
    run_speed: f32,
    jump_speed: f32,
    pending: VecDeque<AnimationEvent>,
}

impl PlayerController {
    pub fn new(variant: Variant, run_speed: f32, jump_speed: f32) -> Self {
        PlayerController {
            state: DudeStateMachine::new(),
            variant,
            run_speed,
            jump_speed,
            pending: VecDeque::new(),
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        PlayerController::new(config.variant, config.run_speed, config.jump_speed)
    }

    /// Queue a notification from the animation side, handled at the start of
    /// the next update
    pub fn notify(&mut self, event: AnimationEvent) {
        self.pending.push_back(event);
    }

    pub fn update(
        &mut self,
        input: &impl InputSnapshot,
        body: &mut impl PhysicsBody,
        animation: &mut impl AnimationSink,
    ) {
        while let Some(AnimationEvent::Complete(key)) = self.pending.pop_front() {
            self.state = self.state.transition(Event::Finished(key));
        }

        if self.wants_jump(input) && body.on_ground() {
            body.set_velocity_y(-self.jump_speed);
        }

        if self.state.is_blocking() {
            body.set_velocity_x(0.0);
        } else if let Some(attack) = Self::attack(input) {
            body.set_velocity_x(0.0);
            self.state = self.state.transition(attack);
        } else if input.is_held(Control::Left) {
            body.set_velocity_x(-self.run_speed);
            self.state = self.state.transition(Event::Run(Facing::Left));
        } else if input.is_held(Control::Right) {
            body.set_velocity_x(self.run_speed);
            self.state = self.state.transition(Event::Run(Facing::Right));
        } else {
            body.set_velocity_x(0.0);
            self.state = self.state.transition(Event::Stop);
        }

        // a finished one shot still reports its key, a new press of the same
        // attack has to restart it or no Complete ever arrives
        let clip = self.state.clip(self.variant);
        if animation.current_key() != clip || !animation.is_playing() {
            animation.play(clip);
        }
    }

    // both triggers are live : Up while held, Jump on its press edge
    fn wants_jump(&self, input: &impl InputSnapshot) -> bool {
        input.is_held(Control::Up) || input.just_pressed(Control::Jump)
    }

    // kick wins when both land on the same frame
    fn attack(input: &impl InputSnapshot) -> Option<Event> {
        if input.just_pressed(Control::Kick) {
            Some(Event::Kick)
        } else if input.just_pressed(Control::Punch) {
            Some(Event::Punch)
        } else {
            None
        }
    }

    pub fn state(&self) -> &DudeStateMachine {
        &self.state
    }

    pub fn facing(&self) -> Facing {
        self.state.context().facing
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }
}

/// The dude as the scene sees it : controller, body and animator stepped
/// together once per simulated frame
#[derive(Debug)]
pub struct Player {
    controller: PlayerController,
    body: ArcadeBody,
    animator: Animator,
}

impl Player {
    pub fn new(controller: PlayerController, body: ArcadeBody, animator: Animator) -> Self {
        Player {
            controller,
            body,
            animator,
        }
    }

    pub fn update(&mut self, input: &impl InputSnapshot, world: &ArcadeWorld) {
        for event in self.animator.drain_events() {
            self.controller.notify(event);
        }
        self.controller
            .update(input, &mut self.body, &mut self.animator);
        world.step(&mut self.body, FRAME_SECONDS);
        self.animator.tick(FRAME_SIZE);
    }

    pub fn body(&self) -> &ArcadeBody {
        &self.body
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    pub fn current_clip(&self) -> ClipKey {
        self.animator.current_key()
    }

    pub fn current_frame(&self) -> Option<FrameRef> {
        self.animator.current_frame()
    }

    pub fn flip_x(&self) -> bool {
        self.controller.facing().flip_x()
    }
}
