//! Atlas recovery from a structured resource manifest
//!
//! The manifest lists resources; `GameObject` resources hold a tree of nodes
//! whose components may be `UIAtlas` components. Each atlas component names
//! its texture by GUID and lists its sprites with pixel rectangles:
//!
//! ```json
//! {"resources": [{"type": "GameObject", "data": {"root": [
//!   {"components": [{"componentType": "UIAtlas", "serializableData": {
//!     "textureContent": {"guid": "20d7ad009ff2a804684180e437657b33"},
//!     "spriteList": {"s_A": {"x": 0, "y": 0, "width": 64, "height": 64}}
//!   }}]}
//! ]}}]}
//! ```
//!
//! Resources, nodes and sprites that do not have the expected shape are
//! skipped with a warning; only an unparseable document is an error.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::{Atlas, AtlasIndex, SpriteRect};
use crate::classify::count_symbol_sprites;
use crate::error::{Result, SalvageError};

/// Resource type holding a node tree.
pub const GAME_OBJECT_RESOURCE: &str = "GameObject";
/// Component type marking a texture atlas.
pub const ATLAS_COMPONENT: &str = "UIAtlas";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
struct GameObjectData {
    #[serde(default)]
    root: Vec<Node>,
}

#[derive(Debug, Default, Deserialize)]
struct Node {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    children: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Component {
    #[serde(default)]
    component_type: String,
    #[serde(default)]
    serializable_data: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtlasData {
    #[serde(default)]
    sprite_list: IndexMap<String, Value>,
    #[serde(default)]
    texture_content: Option<TextureContent>,
}

#[derive(Debug, Default, Deserialize)]
struct TextureContent {
    #[serde(default)]
    guid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RectData {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Options for manifest resolution.
#[derive(Debug, Clone, Copy)]
pub struct ManifestOptions {
    /// Symbol-named sprites an atlas must exceed to be the symbol atlas
    pub symbol_threshold: usize,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self { symbol_threshold: super::DEFAULT_SYMBOL_THRESHOLD }
    }
}

/// Build an atlas index from manifest JSON text.
///
/// Every atlas component found is indexed in document order (depth-first
/// through node children). Components sharing a texture are merged in the
/// index, but the symbol atlas is decided per component: the first one whose
/// sprite list has more than `options.symbol_threshold` symbol names.
pub fn resolve_manifest(text: &str, origin: &Path, options: ManifestOptions) -> Result<AtlasIndex> {
    let manifest: Manifest = serde_json::from_str(text).map_err(|e| SalvageError::DocumentParse {
        document: origin.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut walk = Walk {
        index: AtlasIndex::new(),
        threshold: options.symbol_threshold,
        symbol_atlas: None,
    };
    for (position, resource) in manifest.resources.into_iter().enumerate() {
        if resource.kind != GAME_OBJECT_RESOURCE {
            continue;
        }
        let data: GameObjectData = match serde_json::from_value(resource.data) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("resource #{}: unreadable game object data: {}", position, e);
                continue;
            }
        };
        for node in &data.root {
            walk.collect_atlases(node);
        }
    }

    let mut index = walk.index;
    if let Some(texture) = &walk.symbol_atlas {
        log::info!("symbol atlas texture: {}", texture);
    }
    index.set_symbol_atlas(walk.symbol_atlas);
    Ok(index)
}

/// Load a manifest file and build its atlas index.
pub fn load_manifest(path: &Path, options: ManifestOptions) -> Result<AtlasIndex> {
    let text = crate::archive::read_lossy(path)?;
    resolve_manifest(&text, path, options)
}

/// State carried through the node tree.
struct Walk {
    index: AtlasIndex,
    threshold: usize,
    symbol_atlas: Option<String>,
}

impl Walk {
    fn collect_atlases(&mut self, node: &Node) {
        let label = node.name.as_deref().unwrap_or("<unnamed>");
        for component in &node.components {
            if component.component_type != ATLAS_COMPONENT {
                continue;
            }
            match atlas_from_component(&component.serializable_data, label) {
                Some((atlas, symbols)) => {
                    if self.symbol_atlas.is_none() && symbols > self.threshold {
                        log::debug!("node {}: {} symbol sprites", label, symbols);
                        self.symbol_atlas = Some(atlas.texture_id.clone());
                    }
                    self.index.add(atlas);
                }
                None => log::warn!("node {}: atlas component without texture reference", label),
            }
        }
        for child in &node.children {
            self.collect_atlases(child);
        }
    }
}

/// The component's atlas and the number of symbol names in its sprite list.
/// Names count whether or not their rectangle is usable.
fn atlas_from_component(data: &Value, label: &str) -> Option<(Atlas, usize)> {
    let data: AtlasData = match AtlasData::deserialize(data) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("node {}: unreadable atlas data: {}", label, e);
            return None;
        }
    };

    let texture_id = data.texture_content.and_then(|t| t.guid).filter(|g| !g.is_empty())?;
    let symbols = count_symbol_sprites(data.sprite_list.keys().map(String::as_str));
    let mut atlas = Atlas::new(texture_id);
    for (name, value) in data.sprite_list {
        match RectData::deserialize(&value).ok().and_then(|r| to_rect(&name, &r)) {
            Some(rect) => {
                atlas.insert(rect);
            }
            None => log::warn!("node {}: sprite {} has no usable rectangle", label, name),
        }
    }
    Some((atlas, symbols))
}

fn to_rect(name: &str, data: &RectData) -> Option<SpriteRect> {
    let coords = [data.x, data.y, data.width, data.height];
    if coords.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let [x, y, width, height] = coords.map(|c| c.round() as i64);
    SpriteRect::new(name, x, y, width, height)
}
