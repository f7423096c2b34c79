use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::{TextureId, Window};

const PLACEHOLDER_SIZE_PX: u32 = 16;
const PLACEHOLDER_CELL_PX: u32 = 8;
const PLACEHOLDER_COLOR_A: [u8; 4] = [74, 112, 56, 255];
const PLACEHOLDER_COLOR_B: [u8; 4] = [112, 83, 58, 255];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone)]
struct ImageEntry {
    key: String,
    size_hint: Option<(u32, u32)>,
    texture: Option<TextureId>,
}

/// Registered images and their uploaded textures.
///
/// Images load incrementally, one per `load_next_image` call, so a caller can
/// spread decoding over frames. Until an image is loaded `image` returns
/// `None`; map generation treats that as "not ready yet" and retries.
#[derive(Debug)]
pub struct ImageStore {
    image_dir: PathBuf,
    entries: Vec<ImageEntry>,
    index_by_key: HashMap<String, usize>,
}

impl ImageStore {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            entries: Vec::new(),
            index_by_key: HashMap::new(),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Registers `key` for loading. Registering an existing key only fills in
    /// a missing size hint.
    pub fn register(&mut self, key: &str, size_hint: Option<(u32, u32)>) {
        if let Some(&index) = self.index_by_key.get(key) {
            let entry = &mut self.entries[index];
            if entry.size_hint.is_none() {
                entry.size_hint = size_hint;
            }
            return;
        }
        self.index_by_key.insert(key.to_string(), self.entries.len());
        self.entries.push(ImageEntry {
            key: key.to_string(),
            size_hint,
            texture: None,
        });
    }

    /// Records a texture that was uploaded elsewhere under `key`.
    pub fn insert_loaded(&mut self, key: &str, texture: TextureId) {
        self.register(key, None);
        if let Some(&index) = self.index_by_key.get(key) {
            self.entries[index].texture = Some(texture);
        }
    }

    pub fn image(&self, key: &str) -> Option<TextureId> {
        let index = *self.index_by_key.get(key)?;
        self.entries[index].texture
    }

    pub fn has_loaded_all(&self) -> bool {
        self.entries.iter().all(|entry| entry.texture.is_some())
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.texture.is_none())
            .count()
    }

    /// Loads the next pending image. Returns `false` once nothing is pending.
    pub fn load_next_image(&mut self, window: &mut dyn Window) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.texture.is_none()) else {
            return false;
        };
        self.load_entry(window, index);
        true
    }

    pub fn load_all(&mut self, window: &mut dyn Window) {
        while self.load_next_image(window) {}
    }

    /// Loads `key` immediately, registering it first if needed.
    pub fn load_image(&mut self, window: &mut dyn Window, key: &str) -> Option<TextureId> {
        self.register(key, None);
        let index = *self.index_by_key.get(key)?;
        if self.entries[index].texture.is_none() {
            self.load_entry(window, index);
        }
        self.entries[index].texture
    }

    fn load_entry(&mut self, window: &mut dyn Window, index: usize) {
        let entry = &self.entries[index];
        let path = self.image_dir.join(&entry.key);
        let decoded = decode_rgba(&path)
            .map(|(width, height, rgba)| window.upload_texture(width, height, rgba));
        let texture = match decoded {
            Ok(Some(texture)) => {
                debug!(image = entry.key.as_str(), "image_loaded");
                texture
            }
            Ok(None) => {
                warn!(image = entry.key.as_str(), "image_upload_rejected_using_placeholder");
                upload_placeholder(window, entry.size_hint)
            }
            Err(error) => {
                warn!(
                    image = entry.key.as_str(),
                    error = %error,
                    "image_load_failed_using_placeholder"
                );
                upload_placeholder(window, entry.size_hint)
            }
        };
        self.entries[index].texture = Some(texture);
    }
}

fn decode_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), ImageError> {
    let reader = ImageReader::open(path).map_err(|source| ImageError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| ImageError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    Ok((rgba.width(), rgba.height(), rgba.into_raw()))
}

fn upload_placeholder(window: &mut dyn Window, size_hint: Option<(u32, u32)>) -> TextureId {
    let (width, height) = size_hint
        .filter(|(width, height)| *width > 0 && *height > 0)
        .unwrap_or((PLACEHOLDER_SIZE_PX, PLACEHOLDER_SIZE_PX));
    let rgba = placeholder_rgba(width, height);
    window
        .upload_texture(width, height, rgba)
        .unwrap_or_else(|| window.create_texture(width, height))
}

fn placeholder_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let checker = (x / PLACEHOLDER_CELL_PX + y / PLACEHOLDER_CELL_PX) % 2 == 0;
            rgba.extend_from_slice(if checker {
                &PLACEHOLDER_COLOR_A
            } else {
                &PLACEHOLDER_COLOR_B
            });
        }
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SoftwareWindow;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 4]) {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        image.save(dir.join(name)).expect("save png");
    }

    #[test]
    fn image_is_none_until_loaded() {
        let temp = TempDir::new().expect("temp dir");
        write_png(temp.path(), "tiles.png", 4, 2, [9, 8, 7, 255]);
        let mut window = SoftwareWindow::new(8, 8);
        let mut store = ImageStore::new(temp.path());
        store.register("tiles.png", None);

        assert_eq!(store.image("tiles.png"), None);
        assert!(!store.has_loaded_all());

        assert!(store.load_next_image(&mut window));
        let texture = store.image("tiles.png").expect("loaded");
        assert_eq!(window.texture_size(texture), Some((4, 2)));
        assert_eq!(window.texture_pixel(texture, 3, 1), Some([9, 8, 7, 255]));
        assert!(store.has_loaded_all());
        assert!(!store.load_next_image(&mut window));
    }

    #[test]
    fn load_next_image_loads_one_per_call() {
        let temp = TempDir::new().expect("temp dir");
        write_png(temp.path(), "a.png", 1, 1, [1, 1, 1, 255]);
        write_png(temp.path(), "b.png", 1, 1, [2, 2, 2, 255]);
        let mut window = SoftwareWindow::new(8, 8);
        let mut store = ImageStore::new(temp.path());
        store.register("a.png", None);
        store.register("b.png", None);

        store.load_next_image(&mut window);
        assert_eq!(store.pending_count(), 1);
        assert!(store.image("a.png").is_some());
        assert!(store.image("b.png").is_none());
        store.load_all(&mut window);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn missing_file_uses_placeholder_sized_from_hint() {
        let temp = TempDir::new().expect("temp dir");
        let mut window = SoftwareWindow::new(8, 8);
        let mut store = ImageStore::new(temp.path());
        store.register("missing.png", Some((32, 48)));
        store.load_all(&mut window);

        let texture = store.image("missing.png").expect("placeholder");
        assert_eq!(window.texture_size(texture), Some((32, 48)));
        assert_eq!(window.texture_pixel(texture, 0, 0), Some(PLACEHOLDER_COLOR_A));
        assert_eq!(window.texture_pixel(texture, 8, 0), Some(PLACEHOLDER_COLOR_B));
    }

    #[test]
    fn register_is_idempotent_and_fills_missing_hint() {
        let mut store = ImageStore::new("unused");
        store.register("a.png", None);
        store.register("a.png", Some((4, 4)));
        store.register("a.png", Some((8, 8)));
        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.entries[0].size_hint, Some((4, 4)));
    }

    #[test]
    fn insert_loaded_marks_key_ready() {
        let mut window = SoftwareWindow::new(8, 8);
        let texture = window.create_transparent_texture(2, 2);
        let mut store = ImageStore::new("unused");
        store.insert_loaded("sheet.png", texture);
        assert_eq!(store.image("sheet.png"), Some(texture));
        assert!(store.has_loaded_all());
    }
}
