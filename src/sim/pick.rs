//! Pointer picking against the live pieces
//!
//! Obstruction uses a generous box above the candidate instead of exact
//! contacts: resting pieces sit a fraction of a pixel apart and jitter, so
//! contact tests would let buried pieces through.

use glam::Vec2;
use serde::Serialize;

use super::physics::{BodyHandle, BodySnapshot};
use crate::catalog::TypeId;

/// Outcome of a pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PickResult {
    /// Nothing pickable under the pointer
    Miss,
    /// Candidate has something resting on it; it was shaken instead
    Blocked,
    /// Dock has no room; nothing changed
    DockFull,
    /// Piece removed and its type added to the dock
    Collected(TypeId),
}

/// Nearest non-preview piece within the pick radius
pub fn find_candidate(pieces: &[BodySnapshot], at: Vec2, radius_sq: f32) -> Option<&BodySnapshot> {
    pieces
        .iter()
        .filter(|p| !p.preview)
        .map(|p| (p, p.position.distance_squared(at)))
        .filter(|(_, d)| *d < radius_sq)
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(p, _)| p)
}

/// The first piece resting on `candidate`, if any
///
/// A piece blocks when it is within `dx` horizontally and strictly above
/// (smaller y) by less than `dy`.
pub fn find_blocker(
    candidate: &BodySnapshot,
    pieces: &[BodySnapshot],
    dx: f32,
    dy: f32,
) -> Option<BodyHandle> {
    pieces
        .iter()
        .filter(|p| p.handle != candidate.handle && !p.preview)
        .find(|p| {
            let horizontal = (p.position.x - candidate.position.x).abs();
            let above = candidate.position.y - p.position.y;
            horizontal < dx && above > 0.0 && above < dy
        })
        .map(|p| p.handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(id: u32, x: f32, y: f32) -> BodySnapshot {
        BodySnapshot {
            handle: BodyHandle(id),
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: 25.0,
            type_tag: Some(0),
            preview: false,
        }
    }

    #[test]
    fn test_picks_nearest_within_radius() {
        let pieces = [piece(1, 100.0, 100.0), piece(2, 130.0, 100.0)];
        let hit = find_candidate(&pieces, Vec2::new(120.0, 100.0), 3600.0).unwrap();
        assert_eq!(hit.handle, BodyHandle(2));
    }

    #[test]
    fn test_miss_outside_radius() {
        let pieces = [piece(1, 100.0, 100.0)];
        assert!(find_candidate(&pieces, Vec2::new(100.0, 161.0), 3600.0).is_none());
        assert!(find_candidate(&[], Vec2::ZERO, 3600.0).is_none());
    }

    #[test]
    fn test_preview_is_not_pickable() {
        let mut ghost = piece(1, 100.0, 100.0);
        ghost.preview = true;
        assert!(find_candidate(&[ghost], Vec2::new(100.0, 100.0), 3600.0).is_none());
    }

    #[test]
    fn test_piece_directly_above_blocks() {
        let below = piece(1, 200.0, 700.0);
        let above = piece(2, 210.0, 650.0);
        let pieces = [below, above];
        assert_eq!(find_blocker(&below, &pieces, 40.0, 70.0), Some(BodyHandle(2)));
        assert_eq!(find_blocker(&above, &pieces, 40.0, 70.0), None);
    }

    #[test]
    fn test_side_neighbour_does_not_block() {
        // Resting beside at nearly the same height
        let a = piece(1, 200.0, 700.0);
        let b = piece(2, 250.0, 699.5);
        assert_eq!(find_blocker(&a, &[a, b], 40.0, 70.0), None);
    }

    #[test]
    fn test_far_above_does_not_block() {
        let a = piece(1, 200.0, 700.0);
        let b = piece(2, 200.0, 600.0);
        assert_eq!(find_blocker(&a, &[a, b], 40.0, 70.0), None);
    }

    #[test]
    fn test_same_height_does_not_block() {
        let a = piece(1, 200.0, 700.0);
        let b = piece(2, 220.0, 700.0);
        assert_eq!(find_blocker(&a, &[a, b], 40.0, 70.0), None);
        assert_eq!(find_blocker(&b, &[a, b], 40.0, 70.0), None);
    }
}
