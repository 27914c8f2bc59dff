use serde::{Serialize, Deserialize};

use crate::level::{DEFAULT_CELL_SIZE, DEFAULT_COLUMNS, DEFAULT_ROWS};

/// All user-configurable settings, persisted to JSON.
#[derive(Default, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub palette: PaletteSettings,
    pub grid: GridSettings,
    pub display: DisplaySettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PaletteSettings {
    /// Directory scanned for `*.piece.json` descriptors.
    pub source_dir: std::path::PathBuf,
    pub button_width: f32,
    pub button_height: f32,
    /// Edge length of generated preview thumbnails, in pixels.
    pub preview_size: u32,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            source_dir: std::path::PathBuf::from("assets/pieces"),
            button_width: 80.0,
            button_height: 90.0,
            preview_size: 64,
        }
    }
}

/// Dimensions used for "New Level Scene".
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GridSettings {
    pub columns: u32,
    pub rows: u32,
    pub cell_size: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    pub bg_color: [f32; 3],
    pub grid_color: [f32; 4],
    pub frame_color: [f32; 4],
    pub selected_color: [f32; 4],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            bg_color: [0.15, 0.15, 0.18],
            grid_color: [0.5, 0.5, 0.5, 1.0],
            frame_color: [0.5, 0.5, 0.5, 1.0],
            selected_color: [1.0, 0.92, 0.016, 1.0],
        }
    }
}

impl Settings {
    /// Load settings from config file. Falls back to defaults on error.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists()
            && let Ok(data) = std::fs::read_to_string(path)
        {
            match serde_json::from_str::<Settings>(&data) {
                Ok(settings) => return settings,
                Err(e) => log::warn!("Ignoring invalid settings at {}: {e}", path.display()),
            }
        }
        Self::default()
    }

    /// Save settings to config file.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &std::path::Path) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(self)
            && let Err(e) = std::fs::write(path, data)
        {
            log::warn!("Could not save settings: {e}");
        }
    }
}

fn config_path() -> std::path::PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    std::path::PathBuf::from(home).join(".config/level_creator/settings.json")
}

/// Convert a settings colour to egui.
pub fn color32(c: [f32; 4]) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(
        (c[0] * 255.0) as u8,
        (c[1] * 255.0) as u8,
        (c[2] * 255.0) as u8,
        (c[3] * 255.0) as u8,
    )
}
