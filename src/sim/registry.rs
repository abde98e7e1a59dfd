//! Piece registry and the board that keeps it in lockstep with the world
//!
//! The registry maps world-native handles to piece types. It never owns
//! bodies; `Board` is the only place that adds or removes pieces, so a
//! handle is registered exactly while its body is alive.

use std::collections::BTreeMap;

use glam::Vec2;

use super::physics::{BodyDesc, BodyHandle, BodySnapshot, PhysicsWorld};
use crate::catalog::TypeId;
use crate::error::EngineError;

/// Handle to type association for live pieces
#[derive(Debug, Clone, Default)]
pub struct PieceRegistry {
    types: BTreeMap<BodyHandle, TypeId>,
}

impl PieceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_of(&self, handle: BodyHandle) -> Result<TypeId, EngineError> {
        self.types
            .get(&handle)
            .copied()
            .ok_or(EngineError::UnknownHandle(handle))
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.types.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Live pieces in handle order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, TypeId)> + '_ {
        self.types.iter().map(|(h, t)| (*h, *t))
    }

    fn register(&mut self, handle: BodyHandle, type_id: TypeId) {
        self.types.insert(handle, type_id);
    }

    fn unregister(&mut self, handle: BodyHandle) -> Option<TypeId> {
        self.types.remove(&handle)
    }

    fn clear(&mut self) {
        self.types.clear();
    }
}

/// Physics world plus registry, mutated together
#[derive(Debug, Clone)]
pub struct Board {
    world: PhysicsWorld,
    registry: PieceRegistry,
}

impl Board {
    pub fn new(world: PhysicsWorld) -> Self {
        Self {
            world,
            registry: PieceRegistry::new(),
        }
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Mutable world access for stepping and impulses. Adding or removing
    /// pieces must go through `spawn` / `remove`.
    pub(crate) fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn registry(&self) -> &PieceRegistry {
        &self.registry
    }

    /// Spawn a dynamic piece and register it
    pub fn spawn(&mut self, type_id: TypeId, position: Vec2, radius: f32) -> BodyHandle {
        self.spawn_with(BodyDesc::piece(position, radius, type_id))
    }

    /// Spawn from a full description; previews are not registered
    pub fn spawn_with(&mut self, desc: BodyDesc) -> BodyHandle {
        let type_id = desc.type_tag;
        let preview = desc.preview;
        let handle = self.world.add_body(desc);
        if let (Some(type_id), false) = (type_id, preview) {
            self.registry.register(handle, type_id);
        }
        handle
    }

    /// Remove a registered piece from both the world and the registry
    pub fn remove(&mut self, handle: BodyHandle) -> Result<TypeId, EngineError> {
        let type_id = self.registry.type_of(handle)?;
        if self.world.remove_body(handle).is_none() {
            return Err(EngineError::UnknownHandle(handle));
        }
        self.registry.unregister(handle);
        Ok(type_id)
    }

    /// Remove a preview body (never registered)
    pub fn remove_preview(&mut self, handle: BodyHandle) -> bool {
        match self.world.get(handle) {
            Some(body) if body.preview => self.world.remove_body(handle).is_some(),
            _ => false,
        }
    }

    /// Remove every piece and preview, keeping boundaries
    pub fn clear(&mut self) -> usize {
        let removed = self.world.clear_dynamic();
        self.registry.clear();
        removed.len()
    }

    pub fn type_of(&self, handle: BodyHandle) -> Result<TypeId, EngineError> {
        self.registry.type_of(handle)
    }

    /// Number of live registered pieces
    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    /// Snapshot of registered pieces only
    pub fn pieces(&self) -> Vec<BodySnapshot> {
        self.world
            .query_all()
            .into_iter()
            .filter(|s| self.registry.contains(s.handle))
            .collect()
    }

    /// True when registry and world agree on the set of live pieces
    pub fn is_consistent(&self) -> bool {
        let registered_alive = self.registry.iter().all(|(h, t)| {
            self.world
                .get(h)
                .is_some_and(|b| b.type_tag == Some(t) && b.is_dynamic())
        });
        registered_alive && self.world.dynamic_count() == self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::PhysicsParams;

    fn board() -> Board {
        let mut world = PhysicsWorld::new(PhysicsParams::default());
        world.add_boundaries(480.0, 800.0, 60.0);
        Board::new(world)
    }

    #[test]
    fn test_spawn_registers_type() {
        let mut board = board();
        let h = board.spawn(4, Vec2::new(100.0, 100.0), 20.0);
        assert_eq!(board.type_of(h).unwrap(), 4);
        assert_eq!(board.live_count(), 1);
        assert!(board.is_consistent());
    }

    #[test]
    fn test_remove_is_atomic() {
        let mut board = board();
        let h = board.spawn(2, Vec2::new(100.0, 100.0), 20.0);

        assert_eq!(board.remove(h).unwrap(), 2);
        assert!(!board.world().contains(h));
        assert!(matches!(board.type_of(h), Err(EngineError::UnknownHandle(x)) if x == h));
        assert!(board.is_consistent());
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut board = board();
        let h = board.spawn(0, Vec2::new(100.0, 100.0), 20.0);
        board.remove(h).unwrap();
        assert!(matches!(board.remove(h), Err(EngineError::UnknownHandle(_))));
    }

    #[test]
    fn test_boundaries_are_not_pieces() {
        let mut board = board();
        let floor = BodyHandle(1);
        assert!(board.world().contains(floor));
        assert!(board.remove(floor).is_err());
        assert!(board.world().contains(floor));
    }

    #[test]
    fn test_preview_not_registered() {
        let mut board = board();
        let ghost = board.spawn_with(BodyDesc::preview(Vec2::new(100.0, 50.0), 15.0, 0));
        assert!(board.type_of(ghost).is_err());
        assert_eq!(board.live_count(), 0);
        assert!(board.is_consistent());
        assert!(board.remove_preview(ghost));
        assert!(!board.world().contains(ghost));
    }

    #[test]
    fn test_clear_keeps_lockstep() {
        let mut board = board();
        for i in 0..5 {
            board.spawn(i, Vec2::new(50.0 + i as f32 * 60.0, 100.0), 20.0);
        }
        assert_eq!(board.clear(), 5);
        assert_eq!(board.live_count(), 0);
        assert!(board.pieces().is_empty());
        assert!(board.is_consistent());
    }
}
