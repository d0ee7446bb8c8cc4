//! Atlas recovery by scanning raw text
//!
//! Archives store the resource manifest as a JSON string inside a JSON
//! document, so every quote arrives escaped once or twice (`\"s_bg\"`,
//! `\\\"s_bg\\\"`). Rather than unescaping, the patterns here accept any
//! run of backslashes in front of a quote. Nothing is validated structurally:
//! a sprite is any `"s_name"` followed, inside the same object, by `x`, `y`,
//! `width` and `height` fields in that order.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use super::{Atlas, AtlasIndex, SpriteRect};
use crate::classify::count_symbol_sprites;

/// Quote preceded by any number of escaping backslashes.
const Q: &str = r#"\\*""#;

fn sprite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let field = |name: &str| format!(r"[^}}]*?{q}{name}{q}\s*:\s*([0-9]+)", q = Q, name = name);
        let pattern = format!(
            r"{q}(s_[A-Za-z0-9_]+){q}{x}{y}{w}{h}",
            q = Q,
            x = field("x"),
            y = field("y"),
            w = field("width"),
            h = field("height"),
        );
        Regex::new(&pattern).expect("valid sprite pattern")
    })
}

fn texture_list_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(
            r"{q}guid{q}\s*:\s*{q}([0-9A-Fa-f]{{8}}-?[0-9A-Fa-f]{{4}}-?[0-9A-Fa-f]{{4}}-?[0-9A-Fa-f]{{4}}-?[0-9A-Fa-f]{{12}}){q}\s*\}}[^}}]*?{q}spriteList{q}[^{{]*\{{",
            q = Q
        );
        Regex::new(&pattern).expect("valid texture pattern")
    })
}

fn sprite_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"{q}(s_[A-Za-z0-9_]+){q}\s*:", q = Q)).expect("valid key pattern")
    })
}

fn texture_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"res\\*/([0-9A-Fa-f]{32})\.png").expect("valid texture reference pattern")
    })
}

/// A texture and the sprite names its sprite list declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureMapping {
    pub texture_id: String,
    pub sprite_names: Vec<String>,
}

/// Everything recovered from one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawScan {
    /// Sprite rectangles by name, first occurrence kept
    pub sprites: IndexMap<String, SpriteRect>,
    /// Texture to sprite-name associations, in text order
    pub mappings: Vec<TextureMapping>,
}

/// Scan text for sprite rectangles and texture associations.
pub fn scan_raw(text: &str) -> RawScan {
    RawScan { sprites: scan_sprite_rects(text), mappings: scan_texture_mappings(text) }
}

/// Recover `(name, x, y, width, height)` tuples. Duplicate names keep the
/// first occurrence.
pub fn scan_sprite_rects(text: &str) -> IndexMap<String, SpriteRect> {
    let mut sprites = IndexMap::new();
    let mut duplicates = 0usize;
    for caps in sprite_pattern().captures_iter(text) {
        let name = &caps[1];
        if sprites.contains_key(name) {
            duplicates += 1;
            continue;
        }
        let number = |i: usize| caps[i].parse::<i64>().unwrap_or(-1);
        if let Some(rect) = SpriteRect::new(name, number(2), number(3), number(4), number(5)) {
            sprites.insert(name.to_string(), rect);
        }
    }
    if duplicates > 0 {
        log::debug!("ignored {} repeated sprite definitions", duplicates);
    }
    sprites
}

/// Recover texture identifiers together with the sprite names listed in the
/// `spriteList` that follows each `textureContent` reference.
pub fn scan_texture_mappings(text: &str) -> Vec<TextureMapping> {
    texture_list_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let texture_id = caps[1].to_string();
            let body_start = caps.get(0)?.end();
            let body = &text[body_start..matching_brace(text, body_start)];
            let mut seen = BTreeSet::new();
            let sprite_names: Vec<String> = sprite_key_pattern()
                .captures_iter(body)
                .map(|c| c[1].to_string())
                .filter(|name| seen.insert(name.clone()))
                .collect();
            Some(TextureMapping { texture_id, sprite_names })
        })
        .collect()
}

/// Texture identifiers referenced as `res/<32 hex>.png`, sorted and unique.
pub fn scan_texture_refs(text: &str) -> BTreeSet<String> {
    texture_ref_pattern().captures_iter(text).map(|caps| caps[1].to_string()).collect()
}

/// Byte offset of the `}` closing the object whose body starts at `start`,
/// or the end of the text if it never closes.
fn matching_brace(text: &str, start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' if depth == 0 => return start + offset,
            b'}' => depth -= 1,
            _ => {}
        }
    }
    text.len()
}

impl RawScan {
    /// Group sprites under the textures whose lists name them.
    ///
    /// Sprites listed by no texture end up as unbound entries of the index.
    /// A name listed by several textures is placed in each of them.
    pub fn into_index(self) -> AtlasIndex {
        let mut index = AtlasIndex::new();
        let mut bound = BTreeSet::new();

        for mapping in &self.mappings {
            let mut atlas = Atlas::new(mapping.texture_id.clone());
            for name in &mapping.sprite_names {
                if let Some(rect) = self.sprites.get(name) {
                    atlas.insert(rect.clone());
                    bound.insert(name.as_str());
                }
            }
            index.add(atlas);
        }

        for (name, rect) in &self.sprites {
            if !bound.contains(name.as_str()) {
                index.add_unbound(rect.clone());
            }
        }
        index
    }

    /// Texture of the first sprite list naming more than `threshold` symbol
    /// sprites. Lists are judged one at a time, in text order.
    pub fn symbol_atlas(&self, threshold: usize) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| count_symbol_sprites(m.sprite_names.iter().map(String::as_str)) > threshold)
            .map(|m| m.texture_id.as_str())
    }
}
