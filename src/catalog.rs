//! Piece type catalogs
//!
//! Types are referenced by their index into a catalog. Levels use a
//! contiguous prefix of the dock catalog, so later entries unlock later.

use serde::Serialize;

use crate::settings::GameMode;

/// Index into a catalog
pub type TypeId = u8;

/// An immutable catalog entry. Color and emoji are for renderers only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PieceType {
    pub id: TypeId,
    pub label: &'static str,
    pub radius: f32,
    pub color: u32,
    pub emoji: &'static str,
    /// Points awarded when two of this type fuse (merge mode)
    pub score: u64,
}

const fn piece(
    id: TypeId,
    label: &'static str,
    radius: f32,
    color: u32,
    emoji: &'static str,
    score: u64,
) -> PieceType {
    PieceType {
        id,
        label,
        radius,
        color,
        emoji,
        score,
    }
}

/// Dock mode: similar sizes so every piece is easy to tap
pub const DOCK_CATALOG: [PieceType; 10] = [
    piece(0, "Apple", 28.0, 0xDC2626, "🍎", 0),
    piece(1, "Orange", 28.0, 0xF97316, "🍊", 0),
    piece(2, "Grape", 26.0, 0x9333EA, "🍇", 0),
    piece(3, "Lemon", 27.0, 0xFACC15, "🍋", 0),
    piece(4, "Kiwi", 26.0, 0x84CC16, "🥝", 0),
    piece(5, "Peach", 28.0, 0xF472B6, "🍑", 0),
    piece(6, "Cherry", 25.0, 0xB91C1C, "🍒", 0),
    piece(7, "Pear", 28.0, 0xA3E635, "🍐", 0),
    piece(8, "Banana", 29.0, 0xEAB308, "🍌", 0),
    piece(9, "Coconut", 30.0, 0xA8A29E, "🥥", 0),
];

/// Merge mode: each tier fuses into the next, larger one
pub const MERGE_CATALOG: [PieceType; 11] = [
    piece(0, "Grape", 15.0, 0x9333EA, "🍇", 2),
    piece(1, "Cherry", 22.0, 0xDC2626, "🍒", 4),
    piece(2, "Orange", 30.0, 0xF97316, "🍊", 8),
    piece(3, "Lemon", 38.0, 0xFACC15, "🍋", 16),
    piece(4, "Kiwi", 47.0, 0x84CC16, "🥝", 32),
    piece(5, "Tomato", 57.0, 0xEF4444, "🍅", 64),
    piece(6, "Peach", 68.0, 0xF472B6, "🍑", 128),
    piece(7, "Pineapple", 80.0, 0xEAB308, "🍍", 256),
    piece(8, "Coconut", 93.0, 0xA8A29E, "🥥", 512),
    piece(9, "Melon", 107.0, 0x22C55E, "🍈", 1024),
    piece(10, "Watermelon", 125.0, 0x15803D, "🍉", 2048),
];

/// Catalog used by a game mode
pub fn catalog_for(mode: GameMode) -> &'static [PieceType] {
    match mode {
        GameMode::Dock => &DOCK_CATALOG,
        GameMode::Merge => &MERGE_CATALOG,
    }
}

/// Look up a type, None if the id is outside the catalog
pub fn piece_type(mode: GameMode, id: TypeId) -> Option<&'static PieceType> {
    catalog_for(mode).get(id as usize)
}

/// Largest radius in a catalog (walls must be at least this thick)
pub fn max_radius(mode: GameMode) -> f32 {
    catalog_for(mode)
        .iter()
        .map(|t| t.radius)
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_indices() {
        for mode in [GameMode::Dock, GameMode::Merge] {
            for (i, t) in catalog_for(mode).iter().enumerate() {
                assert_eq!(t.id as usize, i);
            }
        }
    }

    #[test]
    fn test_merge_tiers_grow() {
        for pair in MERGE_CATALOG.windows(2) {
            assert!(pair[1].radius > pair[0].radius);
            assert_eq!(pair[1].score, pair[0].score * 2);
        }
    }

    #[test]
    fn test_unknown_type() {
        assert!(piece_type(GameMode::Dock, 200).is_none());
        assert_eq!(piece_type(GameMode::Merge, 10).unwrap().label, "Watermelon");
    }

    #[test]
    fn test_default_walls_cover_dock_pieces() {
        let settings = crate::Settings::default();
        assert!(settings.wall_thickness >= max_radius(GameMode::Dock));
    }
}
