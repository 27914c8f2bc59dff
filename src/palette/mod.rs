//! Piece palette: discovers piece templates on disk, groups them by category
//! and keeps a preview thumbnail per template.

pub mod preview;
pub mod selection;
pub mod template;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::RgbaImage;

pub use selection::{SelectionBridge, SelectionObserver, SubscriptionId};
pub use template::{Category, PieceTemplate, PropertyValue};
use template::DESCRIPTOR_SUFFIX;

/// The loaded palette plus its selection notifier.
pub struct PaletteCatalog {
    source: PathBuf,
    preview_size: u32,
    templates: Vec<Rc<PieceTemplate>>,
    /// Descriptor files found by the last load, valid or not.
    discovered: usize,
    categorized: BTreeMap<Category, Vec<Rc<PieceTemplate>>>,
    /// Keyed by template id. `None` records a failed attempt so it is not
    /// retried every refresh.
    previews: HashMap<String, Option<Rc<RgbaImage>>>,
    bridge: SelectionBridge,
    /// Bumped whenever templates or previews change.
    generation: u64,
}

impl PaletteCatalog {
    pub fn new(source: PathBuf, preview_size: u32) -> Self {
        let mut catalog = Self {
            source,
            preview_size,
            templates: Vec::new(),
            discovered: 0,
            categorized: categorize(&[]),
            previews: HashMap::new(),
            bridge: SelectionBridge::new(),
            generation: 0,
        };
        catalog.reload();
        catalog
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Point the palette at another directory and reload.
    pub fn set_source(&mut self, source: PathBuf) {
        self.source = source;
        self.reload();
    }

    pub fn reload(&mut self) {
        let paths = descriptor_paths(&self.source);
        self.discovered = paths.len();
        self.templates = load_paths(paths);
        self.categorized = categorize(&self.templates);
        self.previews.clear();
        self.generation += 1;
        log::info!("Palette loaded {} pieces from {}", self.templates.len(), self.source.display());
        self.regenerate_previews();
    }

    /// Generate previews for templates that have not been attempted yet and
    /// drop previews of templates that are gone.
    pub fn regenerate_previews(&mut self) {
        let ids: std::collections::HashSet<&str> = self.templates.iter().map(|t| t.id.as_str()).collect();
        self.previews.retain(|id, _| ids.contains(id.as_str()));
        for template in &self.templates {
            if !self.previews.contains_key(&template.id) {
                let preview = preview::generate_preview(template, self.preview_size).map(Rc::new);
                self.previews.insert(template.id.clone(), preview);
            }
        }
        self.generation += 1;
    }

    /// Reload when the number of discoverable descriptors changed since the
    /// last load; regenerate previews when they no longer match the
    /// templates. Returns true if anything was refreshed.
    pub fn refresh_if_stale(&mut self) -> bool {
        if discoverable_count(&self.source) != self.discovered {
            self.reload();
            return true;
        }
        let previews_stale = self.previews.len() != self.templates.len()
            || self.templates.iter().any(|t| !self.previews.contains_key(&t.id));
        if previews_stale {
            self.regenerate_previews();
            return true;
        }
        false
    }

    pub fn templates(&self) -> &[Rc<PieceTemplate>] {
        &self.templates
    }

    pub fn in_category(&self, category: Category) -> &[Rc<PieceTemplate>] {
        self.categorized.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, id: &str) -> Option<&Rc<PieceTemplate>> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn preview(&self, id: &str) -> Option<&Rc<RgbaImage>> {
        self.previews.get(id).and_then(Option::as_ref)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bridge_mut(&mut self) -> &mut SelectionBridge {
        &mut self.bridge
    }

    /// Select the `index`th template of `category` and notify subscribers.
    pub fn select(&mut self, category: Category, index: usize) -> Option<Rc<PieceTemplate>> {
        let template = self.in_category(category).get(index)?.clone();
        log::debug!("Selected piece '{}'", template.name);
        let preview = self.previews.get(&template.id).and_then(Option::as_ref);
        self.bridge.publish(&template, preview);
        Some(template)
    }
}

/// Descriptor files in `source`, sorted by file name. A missing or unreadable
/// directory yields nothing.
fn descriptor_paths(source: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Palette source {} not readable: {e}", source.display());
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(DESCRIPTOR_SUFFIX))
        })
        .collect();
    paths.sort();
    paths
}

/// Number of descriptors currently in `source`.
pub fn discoverable_count(source: &Path) -> usize {
    descriptor_paths(source).len()
}

/// Scan `source` for piece descriptors. Invalid descriptors are skipped.
pub fn load(source: &Path) -> Vec<Rc<PieceTemplate>> {
    load_paths(descriptor_paths(source))
}

fn load_paths(paths: Vec<PathBuf>) -> Vec<Rc<PieceTemplate>> {
    paths
        .into_iter()
        .filter_map(|path| match PieceTemplate::from_file(&path) {
            Ok(t) => Some(Rc::new(t)),
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                None
            }
        })
        .collect()
}

/// Group templates by category. Every category gets an entry; discovery
/// order is kept within each.
pub fn categorize(templates: &[Rc<PieceTemplate>]) -> BTreeMap<Category, Vec<Rc<PieceTemplate>>> {
    let mut map: BTreeMap<Category, Vec<Rc<PieceTemplate>>> =
        Category::ALL.iter().map(|&c| (c, Vec::new())).collect();
    for template in templates {
        map.entry(template.category).or_default().push(template.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn write_piece(dir: &Path, id: &str, name: &str, category: &str) {
        let body = format!(r#"{{ "name": "{name}", "category": "{category}" }}"#);
        std::fs::write(dir.join(format!("{id}{DESCRIPTOR_SUFFIX}")), body).unwrap();
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nothing-here")).is_empty());
    }

    #[test]
    fn test_load_sorted_and_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write_piece(dir.path(), "b_wall", "Wall", "Terrain");
        write_piece(dir.path(), "a_hero", "Hero", "Player");
        std::fs::write(dir.path().join("broken.piece.json"), "nope").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let templates = load(dir.path());
        let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a_hero", "b_wall"]);
        assert_eq!(discoverable_count(dir.path()), 3);
    }

    #[test]
    fn test_invalid_descriptor_does_not_keep_catalog_stale() {
        let dir = tempfile::tempdir().unwrap();
        write_piece(dir.path(), "a", "A", "Misc");
        std::fs::write(dir.path().join("broken.piece.json"), "nope").unwrap();

        let mut catalog = PaletteCatalog::new(dir.path().to_path_buf(), 16);
        assert_eq!(catalog.templates().len(), 1);
        let generation = catalog.generation();
        for _ in 0..5 {
            assert!(!catalog.refresh_if_stale());
        }
        assert_eq!(catalog.generation(), generation);

        std::fs::remove_file(dir.path().join("broken.piece.json")).unwrap();
        assert!(catalog.refresh_if_stale());
        assert_eq!(catalog.templates().len(), 1);
    }

    #[test]
    fn test_categorize_keeps_order_and_all_categories() {
        let dir = tempfile::tempdir().unwrap();
        write_piece(dir.path(), "1", "Grass", "Terrain");
        write_piece(dir.path(), "2", "Coin", "Collectables");
        write_piece(dir.path(), "3", "Dirt", "Terrain");

        let map = categorize(&load(dir.path()));
        assert_eq!(map.len(), Category::ALL.len());
        let terrain: Vec<&str> = map[&Category::Terrain].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(terrain, vec!["Grass", "Dirt"]);
        assert!(map[&Category::Enemies].is_empty());
    }

    #[test]
    fn test_refresh_when_count_changes() {
        let dir = tempfile::tempdir().unwrap();
        write_piece(dir.path(), "a", "A", "Misc");
        let mut catalog = PaletteCatalog::new(dir.path().to_path_buf(), 16);
        assert_eq!(catalog.templates().len(), 1);
        assert!(catalog.preview("a").is_some());
        assert!(!catalog.refresh_if_stale());

        write_piece(dir.path(), "b", "B", "Enemies");
        assert!(catalog.refresh_if_stale());
        assert_eq!(catalog.templates().len(), 2);
        assert_eq!(catalog.in_category(Category::Enemies).len(), 1);
        assert!(catalog.preview("b").is_some());
    }

    #[test]
    fn test_failed_preview_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ghost.piece.json"),
            r#"{ "name": "Ghost", "sprite": "missing.png" }"#,
        )
        .unwrap();
        let mut catalog = PaletteCatalog::new(dir.path().to_path_buf(), 16);
        assert!(catalog.preview("ghost").is_none());
        assert!(!catalog.refresh_if_stale());
    }

    struct Last(Option<String>);

    impl SelectionObserver for Last {
        fn on_template_selected(&mut self, template: Rc<PieceTemplate>, _preview: Option<Rc<RgbaImage>>) {
            self.0 = Some(template.id.clone());
        }
    }

    #[test]
    fn test_select_notifies_bridge() {
        let dir = tempfile::tempdir().unwrap();
        write_piece(dir.path(), "goblin", "Goblin", "Enemies");
        let mut catalog = PaletteCatalog::new(dir.path().to_path_buf(), 16);
        let observer = Rc::new(RefCell::new(Last(None)));
        catalog.bridge_mut().subscribe(&observer);

        assert!(catalog.select(Category::Enemies, 5).is_none());
        assert!(observer.borrow().0.is_none());
        let picked = catalog.select(Category::Enemies, 0).unwrap();
        assert_eq!(picked.id, "goblin");
        assert_eq!(observer.borrow().0.as_deref(), Some("goblin"));
    }
}
