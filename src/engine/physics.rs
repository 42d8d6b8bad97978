use crate::engine::{Point, Rect, Size};

// rebounds slower than this (px/s) settle the body instead of bouncing
const REST_SPEED: f32 = 20.0;

/// The controller's view of a physics body : it may command velocity and ask
/// whether the body is standing on something
pub trait PhysicsBody {
    fn set_velocity_x(&mut self, x: f32);
    fn set_velocity_y(&mut self, y: f32);
    fn on_ground(&self) -> bool;
}

/// Axis aligned dynamic body, `position` is its centre (sprite origin 0.5)
#[derive(Debug, Clone)]
pub struct ArcadeBody {
    pub position: Point,
    pub velocity: Point,
    pub size: Size,
    bounce: f32,
    collide_world_bounds: bool,
    // resting on the world's bottom edge
    blocked_down: bool,
    // resting on a static collider
    touching_down: bool,
}

impl ArcadeBody {
    pub fn new(position: Point, size: Size) -> Self {
        ArcadeBody {
            position,
            velocity: Point::default(),
            size,
            bounce: 0.0,
            collide_world_bounds: false,
            blocked_down: false,
            touching_down: false,
        }
    }

    pub fn with_bounce(mut self, bounce: f32) -> Self {
        self.bounce = bounce.clamp(0.0, 1.0);
        self
    }

    pub fn with_world_bounds(mut self, collide: bool) -> Self {
        self.collide_world_bounds = collide;
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.position, self.size)
    }

    pub fn blocked_down(&self) -> bool {
        self.blocked_down
    }

    pub fn touching_down(&self) -> bool {
        self.touching_down
    }

    /// Vertical restitution after hitting a floor : reverse and damp, and come
    /// to rest once the rebound is negligible
    fn rebound(&mut self) {
        let rebound = -self.velocity.y * self.bounce;
        self.velocity.y = if rebound.abs() < REST_SPEED {
            0.0
        } else {
            rebound
        };
    }
}

impl PhysicsBody for ArcadeBody {
    fn set_velocity_x(&mut self, x: f32) {
        self.velocity.x = x;
    }

    fn set_velocity_y(&mut self, y: f32) {
        self.velocity.y = y;
    }

    fn on_ground(&self) -> bool {
        self.blocked_down || self.touching_down
    }
}

/// Gravity, world bounds and immovable colliders
/// ┌────────────── step(body, dt) ──────────────┐
/// │ 1. velocity.y += gravity * dt              │
/// │ 2. move on x, push out of colliders/bounds │
/// │ 3. move on y, push out of colliders/bounds │
/// │    landing -> ground flag + rebound        │
/// └────────────────────────────────────────────┘
#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    gravity: f32,
    bounds: Rect,
    colliders: Vec<Rect>,
}

impl ArcadeWorld {
    pub fn new(gravity: f32, bounds: Rect) -> Self {
        ArcadeWorld {
            gravity,
            bounds,
            colliders: Vec::new(),
        }
    }

    pub fn add_static_collider(&mut self, collider: Rect) {
        self.colliders.push(collider);
    }

    pub fn colliders(&self) -> &[Rect] {
        &self.colliders
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn step(&self, body: &mut ArcadeBody, dt: f32) {
        body.blocked_down = false;
        body.touching_down = false;
        body.velocity.y += self.gravity * dt;

        body.position.x += body.velocity.x * dt;
        self.resolve_x(body);

        body.position.y += body.velocity.y * dt;
        self.resolve_y(body);
    }

    fn resolve_x(&self, body: &mut ArcadeBody) {
        let half_width = body.size.width * 0.5;
        for collider in &self.colliders {
            if !body.bounds().intersects(collider) {
                continue;
            }
            if body.velocity.x > 0.0 {
                body.position.x = collider.x() - half_width;
            } else if body.velocity.x < 0.0 {
                body.position.x = collider.right() + half_width;
            }
            body.velocity.x = 0.0;
        }

        if body.collide_world_bounds {
            let min_x = self.bounds.x() + half_width;
            let max_x = self.bounds.right() - half_width;
            if body.position.x < min_x {
                body.position.x = min_x;
                body.velocity.x = 0.0;
            } else if body.position.x > max_x {
                body.position.x = max_x;
                body.velocity.x = 0.0;
            }
        }
    }

    fn resolve_y(&self, body: &mut ArcadeBody) {
        let half_height = body.size.height * 0.5;
        for collider in &self.colliders {
            if !body.bounds().intersects(collider) {
                continue;
            }
            if body.velocity.y > 0.0 {
                body.position.y = collider.y() - half_height;
                body.touching_down = true;
                body.rebound();
            } else if body.velocity.y < 0.0 {
                // head bump
                body.position.y = collider.bottom() + half_height;
                body.velocity.y = 0.0;
            }
        }

        if body.collide_world_bounds {
            let min_y = self.bounds.y() + half_height;
            let max_y = self.bounds.bottom() - half_height;
            if body.position.y > max_y {
                body.position.y = max_y;
                body.blocked_down = true;
                body.rebound();
            } else if body.position.y < min_y {
                body.position.y = min_y;
                body.velocity.y = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> ArcadeWorld {
        let mut world = ArcadeWorld::new(500.0, Rect::new_from_x_y(0.0, 0.0, 600.0, 300.0));
        world.add_static_collider(Rect::new_from_x_y(0.0, 284.0, 600.0, 16.0));
        world
    }

    fn dude(x: f32, y: f32) -> ArcadeBody {
        ArcadeBody::new(
            Point { x, y },
            Size {
                width: 64.0,
                height: 64.0,
            },
        )
        .with_bounce(0.2)
        .with_world_bounds(true)
    }

    fn settle(world: &ArcadeWorld, body: &mut ArcadeBody) {
        for _ in 0..240 {
            world.step(body, DT);
        }
    }

    #[test]
    fn gravity_pulls_a_falling_body() {
        let world = world();
        let mut body = dude(100.0, 100.0);
        world.step(&mut body, DT);
        assert_relative_eq!(body.velocity.y, 500.0 * DT);
        assert!(body.position.y > 100.0);
        assert!(!body.on_ground());
    }

    #[test]
    fn body_comes_to_rest_on_the_ground() {
        let world = world();
        let mut body = dude(100.0, 200.0);
        settle(&world, &mut body);
        assert!(body.on_ground());
        assert!(body.touching_down());
        assert_relative_eq!(body.bounds().bottom(), 284.0, epsilon = 0.5);
        assert_relative_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn resting_body_stays_grounded_every_step() {
        let world = world();
        let mut body = dude(100.0, 200.0);
        settle(&world, &mut body);
        for _ in 0..10 {
            world.step(&mut body, DT);
            assert!(body.on_ground());
        }
    }

    #[test]
    fn landing_bounces_before_settling() {
        let world = world();
        let mut body = dude(100.0, 200.0);
        settle(&world, &mut body);
        body.set_velocity_y(-330.0);

        let mut rebounded = false;
        let mut was_airborne = false;
        for _ in 0..240 {
            world.step(&mut body, DT);
            was_airborne |= !body.on_ground();
            if body.on_ground() && body.velocity.y < 0.0 {
                rebounded = true;
            }
        }
        assert!(was_airborne);
        assert!(rebounded);
        assert!(body.on_ground());
    }

    #[test]
    fn world_floor_counts_as_ground_without_colliders() {
        let world = ArcadeWorld::new(500.0, Rect::new_from_x_y(0.0, 0.0, 600.0, 300.0));
        let mut body = dude(100.0, 200.0);
        settle(&world, &mut body);
        assert!(body.blocked_down());
        assert!(!body.touching_down());
        assert!(body.on_ground());
        assert_relative_eq!(body.position.y, 268.0, epsilon = 0.5);
    }

    #[test]
    fn world_bounds_stop_horizontal_movement() {
        let world = world();
        let mut body = dude(34.0, 200.0);
        body.set_velocity_x(-160.0);
        world.step(&mut body, DT);
        assert_relative_eq!(body.position.x, 32.0);
        assert_relative_eq!(body.velocity.x, 0.0);

        let mut body = dude(566.0, 200.0);
        body.set_velocity_x(160.0);
        world.step(&mut body, DT);
        assert_relative_eq!(body.position.x, 568.0);
    }

    #[test]
    fn without_world_bounds_a_body_leaves_the_world() {
        let world = ArcadeWorld::new(500.0, Rect::new_from_x_y(0.0, 0.0, 600.0, 300.0));
        let mut body = ArcadeBody::new(
            Point { x: 100.0, y: 280.0 },
            Size {
                width: 64.0,
                height: 64.0,
            },
        );
        settle(&world, &mut body);
        assert!(!body.on_ground());
        assert!(body.position.y > 300.0);
    }
}
