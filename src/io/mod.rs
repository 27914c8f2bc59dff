use std::fs;
use std::path::Path;

use crate::scene::Scene;

/// Magic header bytes for the .lvl file format.
const MAGIC: &[u8; 4] = b"LVLC";
/// Current file format version.
const VERSION: u32 = 1;

/// File extension used by the save/open dialogs.
pub const LEVEL_EXTENSION: &str = "lvl";

/// Save a scene to a .lvl file.
pub fn save_scene(scene: &Scene, path: &Path) -> Result<(), String> {
    let payload = bincode::serialize(scene)
        .map_err(|e| format!("Serialization failed: {e}"))?;

    let mut data = Vec::with_capacity(MAGIC.len() + 4 + payload.len());
    data.extend_from_slice(MAGIC);
    data.extend_from_slice(&VERSION.to_le_bytes());
    data.extend_from_slice(&payload);

    fs::write(path, &data)
        .map_err(|e| format!("Write failed: {e}"))?;

    log::info!("Saved level to {}", path.display());
    Ok(())
}

/// Load a scene from a .lvl file. Pieces keep their template ids; the caller
/// resolves them against the current palette.
pub fn load_scene(path: &Path) -> Result<Scene, String> {
    let data = fs::read(path)
        .map_err(|e| format!("Read failed: {e}"))?;

    if data.len() < 8 {
        return Err("File too small".to_string());
    }

    if &data[0..4] != MAGIC {
        return Err("Not a level file (bad magic)".to_string());
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version > VERSION {
        return Err(format!("File version {version} is newer than supported ({VERSION})"));
    }

    let scene: Scene = bincode::deserialize(&data[8..])
        .map_err(|e| format!("Deserialization failed: {e}"))?;
    scene.validate()?;

    log::info!("Loaded level from {}", path.display());
    Ok(scene)
}
