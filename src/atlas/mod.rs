//! Sprite atlas metadata
//!
//! An atlas is a named set of rectangles over one shared texture. Atlases
//! are recovered either from a structured resource manifest
//! ([`manifest`]) or by scanning raw archive text ([`raw`]); both produce an
//! [`AtlasIndex`] keyed by texture identifier.
//!
//! Rectangles are kept exactly as declared. They may extend past the
//! physical texture; clamping happens when sprites are cut.

pub mod manifest;
pub mod raw;

use indexmap::IndexMap;
use serde::Serialize;

use crate::classify::{count_symbol_sprites, Classifier, Role};

/// Default number of symbol-named sprites an atlas must exceed to be taken
/// as the game-symbol atlas.
pub const DEFAULT_SYMBOL_THRESHOLD: usize = 5;

/// A named rectangle within a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpriteRect {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SpriteRect {
    /// Build a rectangle, rejecting negative origins and empty sizes.
    pub fn new(name: impl Into<String>, x: i64, y: i64, width: i64, height: i64) -> Option<Self> {
        if x < 0 || y < 0 || width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            name: name.into(),
            x: u32::try_from(x).ok()?,
            y: u32::try_from(y).ok()?,
            width: u32::try_from(width).ok()?,
            height: u32::try_from(height).ok()?,
        })
    }
}

/// Sprites defined over one texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Atlas {
    /// Texture identifier (content hash or GUID)
    pub texture_id: String,
    /// Sprites by name, in declaration order
    pub sprites: IndexMap<String, SpriteRect>,
}

impl Atlas {
    pub fn new(texture_id: impl Into<String>) -> Self {
        Self { texture_id: texture_id.into(), sprites: IndexMap::new() }
    }

    /// Add a sprite. The first definition of a name wins; returns `false`
    /// when the name was already present.
    pub fn insert(&mut self, rect: SpriteRect) -> bool {
        if self.sprites.contains_key(&rect.name) {
            return false;
        }
        self.sprites.insert(rect.name.clone(), rect);
        true
    }

    pub fn get(&self, name: &str) -> Option<&SpriteRect> {
        self.sprites.get(name)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }

    /// Number of sprites named like game symbols.
    pub fn symbol_count(&self) -> usize {
        count_symbol_sprites(self.names())
    }

    /// Copy of this atlas holding only sprites the classifier assigns `role`.
    pub fn with_role(&self, classifier: &Classifier, role: Role) -> Atlas {
        let sprites = self
            .sprites
            .iter()
            .filter(|(name, _)| classifier.classify(name).role() == Some(role))
            .map(|(name, rect)| (name.clone(), rect.clone()))
            .collect();
        Atlas { texture_id: self.texture_id.clone(), sprites }
    }
}

/// All atlases recovered from one source, keyed by texture identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AtlasIndex {
    atlases: IndexMap<String, Atlas>,
    /// Sprites found without any texture association
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    unbound: IndexMap<String, SpriteRect>,
    /// Texture of the game-symbol atlas, once selected
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol_atlas: Option<String>,
}

impl AtlasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atlas. Sprites of an atlas whose texture is already indexed are
    /// merged into it, first definition winning.
    pub fn add(&mut self, atlas: Atlas) {
        match self.atlases.get_mut(&atlas.texture_id) {
            Some(existing) => {
                for rect in atlas.sprites.into_values() {
                    existing.insert(rect);
                }
            }
            None => {
                self.atlases.insert(atlas.texture_id.clone(), atlas);
            }
        }
    }

    /// Record a sprite that no texture claims. First definition wins.
    pub fn add_unbound(&mut self, rect: SpriteRect) {
        if !self.unbound.contains_key(&rect.name) {
            self.unbound.insert(rect.name.clone(), rect);
        }
    }

    pub fn get(&self, texture_id: &str) -> Option<&Atlas> {
        self.atlases.get(texture_id)
    }

    /// Atlases in discovery order.
    pub fn atlases(&self) -> impl Iterator<Item = &Atlas> {
        self.atlases.values()
    }

    pub fn unbound(&self) -> impl Iterator<Item = &SpriteRect> {
        self.unbound.values()
    }

    pub fn len(&self) -> usize {
        self.atlases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }

    /// Total sprites across all atlases.
    pub fn sprite_count(&self) -> usize {
        self.atlases.values().map(Atlas::len).sum()
    }

    /// Record which texture holds the game-symbol atlas. Resolvers decide
    /// this per sprite list, before lists sharing a texture are merged.
    pub fn set_symbol_atlas(&mut self, texture_id: Option<String>) {
        self.symbol_atlas = texture_id.filter(|id| self.atlases.contains_key(id));
    }

    /// Texture of the selected game-symbol atlas.
    pub fn symbol_atlas(&self) -> Option<&str> {
        self.symbol_atlas.as_deref()
    }

    /// The selected game-symbol atlas itself.
    pub fn symbol_atlas_entry(&self) -> Option<&Atlas> {
        self.symbol_atlas.as_deref().and_then(|id| self.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(name: &str, x: i64) -> SpriteRect {
        SpriteRect::new(name, x, 0, 10, 10).unwrap()
    }

    #[test]
    fn test_rect_validation() {
        assert!(SpriteRect::new("a", 0, 0, 1, 1).is_some());
        assert!(SpriteRect::new("a", -1, 0, 1, 1).is_none());
        assert!(SpriteRect::new("a", 0, 0, 0, 1).is_none());
        assert!(SpriteRect::new("a", 0, 0, 1, -5).is_none());
        assert!(SpriteRect::new("a", 0, 0, i64::MAX, 1).is_none());
    }

    #[test]
    fn test_atlas_first_definition_wins() {
        let mut atlas = Atlas::new("abcd");
        assert!(atlas.insert(rect("s_bg", 1)));
        assert!(!atlas.insert(rect("s_bg", 2)));
        assert_eq!(atlas.get("s_bg").map(|r| r.x), Some(1));
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn test_index_merges_same_texture() {
        let mut index = AtlasIndex::new();
        let mut a = Atlas::new("t1");
        a.insert(rect("s_a", 1));
        let mut b = Atlas::new("t1");
        b.insert(rect("s_a", 9));
        b.insert(rect("s_b", 2));
        index.add(a);
        index.add(b);

        assert_eq!(index.len(), 1);
        let atlas = index.get("t1").unwrap();
        assert_eq!(atlas.get("s_a").map(|r| r.x), Some(1));
        assert_eq!(atlas.get("s_b").map(|r| r.x), Some(2));
        assert_eq!(index.sprite_count(), 2);
    }

    #[test]
    fn test_symbol_atlas_must_be_indexed() {
        let mut index = AtlasIndex::new();
        let mut symbols = Atlas::new("symbols");
        for name in ["s_A", "s_K", "s_Q", "s_J", "s_H1", "s_H2"] {
            symbols.insert(rect(name, 0));
        }
        index.add(symbols);

        index.set_symbol_atlas(Some("elsewhere".to_string()));
        assert_eq!(index.symbol_atlas(), None);
        index.set_symbol_atlas(Some("symbols".to_string()));
        assert_eq!(index.symbol_atlas(), Some("symbols"));
        assert_eq!(index.symbol_atlas_entry().map(Atlas::symbol_count), Some(6));
    }

    #[test]
    fn test_with_role_filters() {
        let mut atlas = Atlas::new("t");
        atlas.insert(rect("s_bg", 0));
        atlas.insert(rect("s_fire_00", 0));
        atlas.insert(rect("s_fire_01", 0));
        let fire = atlas.with_role(&Classifier::default(), Role::Fire);
        assert_eq!(fire.names().collect::<Vec<_>>(), vec!["s_fire_00", "s_fire_01"]);
    }
}
