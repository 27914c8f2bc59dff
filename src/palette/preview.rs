use image::{Rgba, RgbaImage};

use crate::error::EditError;
use super::template::PieceTemplate;

/// Produce a square-bounded thumbnail for a template: the sprite scaled to
/// fit `size`, or a flat swatch of the template colour when there is no
/// sprite. Returns `None` on any failure; the palette then shows text only.
pub fn generate_preview(template: &PieceTemplate, size: u32) -> Option<RgbaImage> {
    match try_generate_preview(template, size) {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("No preview for '{}': {e}", template.name);
            None
        }
    }
}

fn try_generate_preview(template: &PieceTemplate, size: u32) -> Result<RgbaImage, EditError> {
    if size == 0 {
        return Err(EditError::PreviewGenerationFailed("zero preview size".into()));
    }
    let Some(path) = &template.sprite else {
        return Ok(RgbaImage::from_pixel(size, size, Rgba(template.color)));
    };

    let img = image::open(path)
        .map_err(|e| EditError::PreviewGenerationFailed(format!("{}: {e}", path.display())))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(EditError::PreviewGenerationFailed("empty image".into()));
    }

    // Fit inside size x size, keeping aspect.
    let scale = size as f32 / w.max(h) as f32;
    let tw = ((w as f32 * scale).round() as u32).max(1);
    let th = ((h as f32 * scale).round() as u32).max(1);
    Ok(image::imageops::thumbnail(&img, tw, th))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::template::Category;

    fn template(sprite: Option<std::path::PathBuf>) -> PieceTemplate {
        PieceTemplate {
            id: "door".into(),
            name: "Door".into(),
            category: Category::Misc,
            sprite,
            color: [10, 20, 30, 255],
            properties: Default::default(),
        }
    }

    #[test]
    fn test_swatch_without_sprite() {
        let img = generate_preview(&template(None), 16).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(img.get_pixel(8, 8), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_sprite_thumbnail_keeps_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbaImage::from_pixel(128, 64, Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let img = generate_preview(&template(Some(path)), 32).unwrap();
        assert_eq!(img.dimensions(), (32, 16));
    }

    #[test]
    fn test_missing_sprite_gives_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(generate_preview(&template(Some(missing)), 32).is_none());
    }

    #[test]
    fn test_zero_size_gives_none() {
        assert!(generate_preview(&template(None), 0).is_none());
    }
}
