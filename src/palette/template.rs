use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

/// File suffix that marks a piece descriptor in the palette source directory.
pub const DESCRIPTOR_SUFFIX: &str = ".piece.json";

/// Palette tab a piece is listed under. Declaration order is tab order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Misc,
    Player,
    Collectables,
    Enemies,
    Terrain,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Misc,
        Category::Player,
        Category::Collectables,
        Category::Enemies,
        Category::Terrain,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Misc => "Misc",
            Category::Player => "Player",
            Category::Collectables => "Collectables",
            Category::Enemies => "Enemies",
            Category::Terrain => "Terrain",
        }
    }
}

/// An editable per-piece property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// On-disk form of a template (`<id>.piece.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceDescriptor {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    /// Sprite image, relative to the descriptor's directory.
    #[serde(default)]
    pub sprite: Option<PathBuf>,
    /// Fill colour used when there is no sprite (and as the fallback tint).
    #[serde(default = "default_color")]
    pub color: [u8; 4],
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

fn default_color() -> [u8; 4] {
    [160, 160, 160, 255]
}

/// An immutable, placeable piece prototype.
#[derive(Debug, Clone, PartialEq)]
pub struct PieceTemplate {
    /// Descriptor file stem; stable across reloads and used in saved levels.
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Resolved absolute or source-relative sprite path.
    pub sprite: Option<PathBuf>,
    pub color: [u8; 4],
    pub properties: BTreeMap<String, PropertyValue>,
}

impl PieceTemplate {
    /// Parse a descriptor file. The template id is the file name without the
    /// descriptor suffix.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("Read failed: {e}"))?;
        let descriptor: PieceDescriptor = serde_json::from_str(&data)
            .map_err(|e| format!("Invalid piece descriptor: {e}"))?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let id = file_name
            .strip_suffix(DESCRIPTOR_SUFFIX)
            .unwrap_or(&file_name)
            .to_string();
        let dir = path.parent().unwrap_or(Path::new("."));
        Ok(Self::from_descriptor(id, descriptor, dir))
    }

    pub fn from_descriptor(id: String, descriptor: PieceDescriptor, dir: &Path) -> Self {
        Self {
            id,
            name: descriptor.name,
            category: descriptor.category,
            sprite: descriptor.sprite.map(|s| dir.join(s)),
            color: descriptor.color,
            properties: descriptor.properties,
        }
    }
}
