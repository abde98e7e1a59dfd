//! Rigid-body world for circular pieces and static boundaries
//!
//! Bodies are kept sorted by handle so iteration order is stable. Handles
//! are never reused within a world, which lets the piece registry key on
//! them directly.

use glam::Vec2;
use serde::Serialize;

use super::collision::{CollisionResult, circle_circle, circle_rect};
use crate::catalog::TypeId;
use crate::consts::RESTING_SPEED;

/// Penetration allowed before positional correction kicks in (px)
const PENETRATION_SLOP: f32 = 0.5;
/// Fraction of the remaining penetration corrected per solver pass
const CORRECTION_PERCENT: f32 = 0.8;

/// World-native body handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BodyHandle(pub u32);

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned box given by half extents
    Rect { half_extents: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Static,
}

/// Description of a body to insert
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub shape: Shape,
    pub kind: BodyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub type_tag: Option<TypeId>,
    /// Placement ghost: static and collides with nothing
    pub preview: bool,
}

impl BodyDesc {
    /// A falling piece
    pub fn piece(position: Vec2, radius: f32, type_tag: TypeId) -> Self {
        Self {
            shape: Shape::Circle { radius },
            kind: BodyKind::Dynamic,
            position,
            velocity: Vec2::ZERO,
            type_tag: Some(type_tag),
            preview: false,
        }
    }

    /// A non-colliding placement ghost
    pub fn preview(position: Vec2, radius: f32, type_tag: TypeId) -> Self {
        Self {
            shape: Shape::Circle { radius },
            kind: BodyKind::Static,
            position,
            velocity: Vec2::ZERO,
            type_tag: Some(type_tag),
            preview: true,
        }
    }

    /// A fixed boundary box
    pub fn boundary(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            shape: Shape::Rect { half_extents },
            kind: BodyKind::Static,
            position: center,
            velocity: Vec2::ZERO,
            type_tag: None,
            preview: false,
        }
    }
}

/// A body owned by the world
#[derive(Debug, Clone)]
pub struct Body {
    pub handle: BodyHandle,
    pub shape: Shape,
    pub kind: BodyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub type_tag: Option<TypeId>,
    pub preview: bool,
    inv_mass: f32,
}

impl Body {
    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Circle { radius } => Some(radius),
            Shape::Rect { .. } => None,
        }
    }

    /// Simulated and collidable
    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic && !self.preview
    }

    fn half_width(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { half_extents } => half_extents.x,
        }
    }
}

/// Read-only view of a circular body
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub type_tag: Option<TypeId>,
    pub preview: bool,
}

/// Simulation parameters
#[derive(Debug, Clone, Copy)]
pub struct PhysicsParams {
    /// Downward acceleration (+y)
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub iterations: u32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            restitution: 0.3,
            friction: 0.1,
            linear_damping: 0.6,
            iterations: 6,
        }
    }
}

/// The physics world
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    params: PhysicsParams,
    bodies: Vec<Body>,
    next_handle: u32,
    /// Circle pairs found touching during the last step
    contacts: Vec<(BodyHandle, BodyHandle)>,
}

impl PhysicsWorld {
    pub fn new(params: PhysicsParams) -> Self {
        Self {
            params,
            bodies: Vec::new(),
            next_handle: 1,
            contacts: Vec::new(),
        }
    }

    /// Add floor, left wall and right wall around a `width` x `height` area.
    ///
    /// Walls reach half a screen above the top so pieces entering from
    /// above stay inside.
    pub fn add_boundaries(&mut self, width: f32, height: f32, thickness: f32) -> [BodyHandle; 3] {
        let half_t = thickness / 2.0;
        let floor = self.add_body(BodyDesc::boundary(
            Vec2::new(width / 2.0, height + half_t),
            Vec2::new(width / 2.0 + thickness, half_t),
        ));
        let left = self.add_body(BodyDesc::boundary(
            Vec2::new(-half_t, height / 2.0),
            Vec2::new(half_t, height),
        ));
        let right = self.add_body(BodyDesc::boundary(
            Vec2::new(width + half_t, height / 2.0),
            Vec2::new(half_t, height),
        ));
        [floor, left, right]
    }

    pub(crate) fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let inv_mass = match (desc.kind, desc.shape) {
            (BodyKind::Dynamic, Shape::Circle { radius }) if radius > 0.0 => {
                1.0 / (radius * radius)
            }
            _ => 0.0,
        };

        // Handles are monotonic, so pushing keeps the vec sorted
        self.bodies.push(Body {
            handle,
            shape: desc.shape,
            kind: desc.kind,
            pos: desc.position,
            vel: desc.velocity,
            type_tag: desc.type_tag,
            preview: desc.preview,
            inv_mass,
        });
        handle
    }

    /// Remove a body, returning it if it was present
    pub(crate) fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let idx = self.index_of(handle)?;
        Some(self.bodies.remove(idx))
    }

    /// Remove every dynamic and preview body, keeping boundaries
    pub(crate) fn clear_dynamic(&mut self) -> Vec<BodyHandle> {
        let mut removed = Vec::new();
        self.bodies.retain(|b| {
            let keep = b.kind == BodyKind::Static && !b.preview;
            if !keep {
                removed.push(b.handle);
            }
            keep
        });
        self.contacts.clear();
        removed
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index_of(handle).is_some()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    /// Number of dynamic (non-preview) bodies
    pub fn dynamic_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_dynamic()).count()
    }

    /// Add a velocity change to a dynamic body. Returns false if the handle
    /// is unknown or the body doesn't move.
    pub fn apply_impulse(&mut self, handle: BodyHandle, delta_v: Vec2) -> bool {
        match self.index_of(handle) {
            Some(i) if self.bodies[i].is_dynamic() => {
                self.bodies[i].vel += delta_v;
                true
            }
            _ => false,
        }
    }

    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) -> bool {
        match self.index_of(handle) {
            Some(i) => {
                self.bodies[i].pos = pos;
                true
            }
            None => false,
        }
    }

    /// Snapshot of every circular body, in handle order
    pub fn query_all(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .filter_map(|b| {
                b.radius().map(|radius| BodySnapshot {
                    handle: b.handle,
                    position: b.pos,
                    velocity: b.vel,
                    radius,
                    type_tag: b.type_tag,
                    preview: b.preview,
                })
            })
            .collect()
    }

    /// Circle pairs that touched during the last step
    pub fn contacts(&self) -> &[(BodyHandle, BodyHandle)] {
        &self.contacts
    }

    /// Advance all dynamic bodies by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        self.contacts.clear();

        let damping = (1.0 - self.params.linear_damping * dt).max(0.0);
        for body in self.bodies.iter_mut().filter(|b| b.is_dynamic()) {
            body.vel.y += self.params.gravity * dt;
            body.vel *= damping;
            body.pos += body.vel * dt;
        }

        for pass in 0..self.params.iterations {
            self.solve_contacts(pass == 0);
        }
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |b| b.handle).ok()
    }

    fn solve_contacts(&mut self, record: bool) {
        let params = self.params;
        let n = self.bodies.len();

        for j in 1..n {
            for i in 0..j {
                let (left, right) = self.bodies.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];

                if a.preview || b.preview || (a.inv_mass == 0.0 && b.inv_mass == 0.0) {
                    continue;
                }
                // Cheap horizontal reject before the narrowphase
                if (a.pos.x - b.pos.x).abs() > a.half_width() + b.half_width() {
                    continue;
                }

                let result = pair_collision(a, b);
                if !result.hit {
                    continue;
                }

                if record && a.radius().is_some() && b.radius().is_some() {
                    self.contacts.push((a.handle, b.handle));
                }
                resolve(a, b, &result, &params);
            }
        }
    }
}

/// Narrowphase between two bodies; the normal points from `a` to `b`
fn pair_collision(a: &Body, b: &Body) -> CollisionResult {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a.pos, ra, b.pos, rb)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_rect(b.pos, radius, a.pos, half_extents)
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            let mut result = circle_rect(a.pos, radius, b.pos, half_extents);
            result.normal = -result.normal;
            result
        }
        (Shape::Rect { .. }, Shape::Rect { .. }) => CollisionResult::miss(),
    }
}

/// Positional correction, normal impulse with restitution, Coulomb friction
fn resolve(a: &mut Body, b: &mut Body, hit: &CollisionResult, params: &PhysicsParams) {
    let inv_sum = a.inv_mass + b.inv_mass;
    if inv_sum == 0.0 {
        return;
    }
    let normal = hit.normal;

    let correction = (hit.penetration - PENETRATION_SLOP).max(0.0) / inv_sum * CORRECTION_PERCENT;
    a.pos -= normal * correction * a.inv_mass;
    b.pos += normal * correction * b.inv_mass;

    let rel = b.vel - a.vel;
    let vn = rel.dot(normal);
    if vn >= 0.0 {
        return;
    }

    let restitution = if -vn > RESTING_SPEED {
        params.restitution
    } else {
        0.0
    };
    let j = -(1.0 + restitution) * vn / inv_sum;
    a.vel -= normal * j * a.inv_mass;
    b.vel += normal * j * b.inv_mass;

    let tangent = rel - normal * vn;
    if tangent.length_squared() > 1e-8 {
        let t = tangent.normalize();
        let vt = rel.dot(t);
        let max_friction = params.friction * j;
        let jt = (-vt / inv_sum).clamp(-max_friction, max_friction);
        a.vel -= t * jt * a.inv_mass;
        b.vel += t * jt * b.inv_mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn boxed_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(PhysicsParams::default());
        world.add_boundaries(480.0, 800.0, 60.0);
        world
    }

    fn run(world: &mut PhysicsWorld, seconds: f32) {
        let steps = (seconds / SIM_DT) as u32;
        for _ in 0..steps {
            world.step(SIM_DT);
        }
    }

    #[test]
    fn test_piece_falls_and_rests_on_floor() {
        let mut world = boxed_world();
        let h = world.add_body(BodyDesc::piece(Vec2::new(240.0, 100.0), 20.0, 0));

        run(&mut world, 3.0);

        let body = world.get(h).unwrap();
        assert!((body.pos.y - 780.0).abs() < 2.0, "y = {}", body.pos.y);
        assert!(body.vel.length() < 5.0);
    }

    #[test]
    fn test_walls_hold_pieces_in() {
        let mut world = boxed_world();
        let h = world.add_body(BodyDesc::piece(Vec2::new(100.0, 700.0), 20.0, 0));
        world.apply_impulse(h, Vec2::new(-2000.0, 0.0));

        run(&mut world, 2.0);

        let body = world.get(h).unwrap();
        assert!(body.pos.x >= 19.0, "escaped: x = {}", body.pos.x);
        assert!(body.pos.x <= 461.0);
    }

    #[test]
    fn test_stacked_pieces_separate() {
        let mut world = boxed_world();
        let low = world.add_body(BodyDesc::piece(Vec2::new(240.0, 760.0), 20.0, 0));
        let high = world.add_body(BodyDesc::piece(Vec2::new(240.0, 700.0), 20.0, 1));

        run(&mut world, 3.0);

        let low = world.get(low).unwrap().pos;
        let high = world.get(high).unwrap().pos;
        assert!(high.y < low.y);
        assert!(low.distance(high) > 38.0, "overlap: {}", low.distance(high));
    }

    #[test]
    fn test_statics_never_move() {
        let mut world = boxed_world();
        let before: Vec<Vec2> = world.bodies().map(|b| b.pos).collect();
        world.add_body(BodyDesc::piece(Vec2::new(20.0, 780.0), 25.0, 0));

        run(&mut world, 1.0);

        for (b, p) in world.bodies().zip(before) {
            assert_eq!(b.pos, p);
        }
    }

    #[test]
    fn test_preview_neither_falls_nor_collides() {
        let mut world = boxed_world();
        let ghost = world.add_body(BodyDesc::preview(Vec2::new(240.0, 50.0), 20.0, 0));
        let piece = world.add_body(BodyDesc::piece(Vec2::new(240.0, 30.0), 20.0, 0));

        world.step(SIM_DT);

        assert_eq!(world.get(ghost).unwrap().pos, Vec2::new(240.0, 50.0));
        assert!(world.contacts().is_empty());
        assert!(world.get(piece).unwrap().vel.y > 0.0);
        assert_eq!(world.dynamic_count(), 1);
    }

    #[test]
    fn test_contacts_report_touching_circles() {
        let mut world = boxed_world();
        let a = world.add_body(BodyDesc::piece(Vec2::new(200.0, 400.0), 20.0, 0));
        let b = world.add_body(BodyDesc::piece(Vec2::new(230.0, 400.0), 20.0, 0));

        world.step(SIM_DT);

        assert_eq!(world.contacts(), &[(a, b)]);
    }

    #[test]
    fn test_handles_not_reused() {
        let mut world = boxed_world();
        let a = world.add_body(BodyDesc::piece(Vec2::ZERO, 10.0, 0));
        assert!(world.remove_body(a).is_some());
        let b = world.add_body(BodyDesc::piece(Vec2::ZERO, 10.0, 0));
        assert_ne!(a, b);
        assert!(!world.contains(a));
        assert!(world.remove_body(a).is_none());
    }

    #[test]
    fn test_clear_dynamic_keeps_boundaries() {
        let mut world = boxed_world();
        world.add_body(BodyDesc::piece(Vec2::new(100.0, 100.0), 10.0, 0));
        world.add_body(BodyDesc::preview(Vec2::new(100.0, 50.0), 10.0, 0));

        let removed = world.clear_dynamic();

        assert_eq!(removed.len(), 2);
        assert_eq!(world.bodies().count(), 3);
        assert!(world.query_all().is_empty());
    }

    #[test]
    fn test_impulse_ignored_for_statics() {
        let mut world = PhysicsWorld::new(PhysicsParams::default());
        let [floor, _, _] = world.add_boundaries(480.0, 800.0, 60.0);
        assert!(!world.apply_impulse(floor, Vec2::X));
        let h = world.add_body(BodyDesc::piece(Vec2::new(100.0, 100.0), 10.0, 0));
        assert!(world.apply_impulse(h, Vec2::new(5.0, 0.0)));
        assert_eq!(world.get(h).unwrap().vel, Vec2::new(5.0, 0.0));
    }
}
