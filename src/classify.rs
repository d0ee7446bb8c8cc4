//! Sprite role classification by naming convention
//!
//! Game atlases name sprites after what they show (`s_bg`, `s_symbol03_win_00`,
//! `s_reels_frame_normal`). Roles are tested in a fixed priority order and the
//! first hit wins, so a name containing two keywords always gets the earlier
//! one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Semantic role of a sprite, inferred from a keyword in its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bg,
    Symbol,
    Frame,
    Logo,
    Title,
    Fire,
    Column,
    Pillar,
}

impl Role {
    /// Default priority order.
    pub const PRIORITY: [Role; 8] = [
        Role::Bg,
        Role::Symbol,
        Role::Frame,
        Role::Logo,
        Role::Title,
        Role::Fire,
        Role::Column,
        Role::Pillar,
    ];

    /// Keyword searched for in sprite names.
    pub fn keyword(self) -> &'static str {
        match self {
            Role::Bg => "bg",
            Role::Symbol => "symbol",
            Role::Frame => "frame",
            Role::Logo => "logo",
            Role::Title => "title",
            Role::Fire => "fire",
            Role::Column => "column",
            Role::Pillar => "pillar",
        }
    }

    /// Parse a keyword back into a role.
    pub fn from_keyword(keyword: &str) -> Option<Role> {
        let keyword = keyword.trim().to_ascii_lowercase();
        Role::PRIORITY.into_iter().find(|r| r.keyword() == keyword)
    }

    /// Whether a lowercased sprite name carries this role's keyword.
    fn matches(self, lowercase_name: &str) -> bool {
        lowercase_name.contains(self.keyword())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Result of classifying one sprite name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Role(Role),
    Unmatched,
}

impl Classification {
    pub fn role(self) -> Option<Role> {
        match self {
            Classification::Role(role) => Some(role),
            Classification::Unmatched => None,
        }
    }
}

/// Ordered role classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    order: Vec<Role>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { order: Role::PRIORITY.to_vec() }
    }
}

impl Classifier {
    /// Classifier testing roles in the given order. Duplicates are dropped,
    /// keeping the first position.
    pub fn with_order(order: impl IntoIterator<Item = Role>) -> Self {
        let mut deduped = Vec::new();
        for role in order {
            if !deduped.contains(&role) {
                deduped.push(role);
            }
        }
        Self { order: deduped }
    }

    /// Roles in priority order.
    pub fn order(&self) -> &[Role] {
        &self.order
    }

    /// Classify a sprite name. Case-insensitive; first matching role wins.
    pub fn classify(&self, sprite_name: &str) -> Classification {
        let lower = sprite_name.to_ascii_lowercase();
        self.order
            .iter()
            .copied()
            .find(|role| role.matches(&lower))
            .map(Classification::Role)
            .unwrap_or(Classification::Unmatched)
    }
}

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // s_H1 / s_l3 style paytable symbols, or s_A / s_K / s_Q / s_J card symbols
    PATTERN.get_or_init(|| Regex::new(r"(?i)^s_(?:[hl][0-9]|[akqj])").expect("valid regex"))
}

/// Whether a sprite name follows the game-symbol naming convention.
pub fn is_symbol_sprite(sprite_name: &str) -> bool {
    symbol_pattern().is_match(sprite_name)
}

/// Count how many names follow the game-symbol naming convention.
pub fn count_symbol_sprites<'a>(names: impl IntoIterator<Item = &'a str>) -> usize {
    names.into_iter().filter(|n| is_symbol_sprite(n)).count()
}
