use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::world::{
    AtlasLayout, Map, MapDef, MapDirection, MapError, MapId, TileAnimation, Tileset, TilesetId,
};

use super::files::{json_files, read_json, MapFile, TilesetFile};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error(transparent)]
    InvalidMap(#[from] MapError),
    #[error("map {map} uses unknown tileset {tileset}")]
    UnknownTileset { map: String, tileset: String },
    #[error("map {map} names unknown {direction} neighbour {neighbor}")]
    UnknownBorderingMap {
        map: String,
        direction: &'static str,
        neighbor: String,
    },
    #[error("duplicate map id {key}")]
    DuplicateMap { key: String },
    #[error("duplicate tileset name {name}")]
    DuplicateTileset { name: String },
}

/// Owns every tileset and map of a session and the bordering-map graph
/// between maps. Built once at startup and passed by reference.
#[derive(Debug, Default)]
pub struct MapRegistry {
    tilesets: Vec<Tileset>,
    tileset_ids: HashMap<String, TilesetId>,
    image_hints: HashMap<String, (u32, u32)>,
    maps: Vec<Map>,
    map_ids: HashMap<String, MapId>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `assets/tilesets/*.json` and `assets/maps/*.json` below
    /// `asset_root`, then links bordering maps by id.
    pub fn load_dir(asset_root: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for path in json_files(&asset_root.join("tilesets"))? {
            let file: TilesetFile = read_json(&path)?;
            let layout = AtlasLayout {
                tile_width: file.tile_width,
                tile_height: file.tile_height,
                columns: file.columns,
                tile_count: file.tile_count,
                margin: file.margin,
                spacing: file.spacing,
            };
            let animations = file
                .animations
                .iter()
                .map(|animation| TileAnimation {
                    tile: animation.tile,
                    frames: animation.frames.clone(),
                    frame_ticks: animation.frame_ticks,
                })
                .collect::<Vec<_>>();
            let image_size = match (file.image_width, file.image_height) {
                (Some(width), Some(height)) => (width, height),
                _ => layout.image_size(),
            };
            let tileset = Tileset::from_atlas(&file.name, &file.image, layout, &animations);
            registry.insert_tileset(tileset)?;
            registry.image_hints.insert(file.image, image_size);
        }

        let mut pending_borders = Vec::new();
        for path in json_files(&asset_root.join("maps"))? {
            let file: MapFile = read_json(&path)?;
            let Some(tileset) = registry.tileset_id(&file.tileset) else {
                return Err(RegistryError::UnknownTileset {
                    map: file.id,
                    tileset: file.tileset,
                });
            };
            let def = MapDef {
                key: file.id,
                name: file.name,
                width: file.width,
                height: file.height,
                layers: file.layers,
            };
            let id = registry.insert_map(def, tileset)?;
            pending_borders.push((id, file.borders));
        }

        for (id, borders) in pending_borders {
            let links = [
                (MapDirection::North, borders.north),
                (MapDirection::South, borders.south),
                (MapDirection::East, borders.east),
                (MapDirection::West, borders.west),
            ];
            for (direction, neighbor) in links {
                let Some(neighbor) = neighbor else {
                    continue;
                };
                let Some(neighbor_id) = registry.map_id(&neighbor) else {
                    return Err(RegistryError::UnknownBorderingMap {
                        map: registry.map_key(id).to_string(),
                        direction: direction.as_str(),
                        neighbor,
                    });
                };
                if let Some(map) = registry.map_mut(id) {
                    map.set_bordering_map(direction, Some(neighbor_id));
                }
            }
        }
        registry.warn_non_reciprocal_borders();

        info!(
            root = %asset_root.display(),
            tilesets = registry.tilesets.len(),
            maps = registry.maps.len(),
            "map_registry_loaded"
        );
        Ok(registry)
    }

    pub fn insert_tileset(&mut self, tileset: Tileset) -> Result<TilesetId, RegistryError> {
        if self.tileset_ids.contains_key(tileset.name()) {
            return Err(RegistryError::DuplicateTileset {
                name: tileset.name().to_string(),
            });
        }
        let id = TilesetId(self.tilesets.len() as u32);
        self.tileset_ids.insert(tileset.name().to_string(), id);
        self.tilesets.push(tileset);
        Ok(id)
    }

    pub fn insert_map(&mut self, def: MapDef, tileset: TilesetId) -> Result<MapId, RegistryError> {
        if self.map_ids.contains_key(&def.key) {
            return Err(RegistryError::DuplicateMap { key: def.key });
        }
        let Some(tileset_ref) = self.tileset(tileset) else {
            return Err(RegistryError::UnknownTileset {
                map: def.key,
                tileset: format!("#{}", tileset.0),
            });
        };
        let id = MapId(self.maps.len() as u32);
        let map = Map::new(id, def, tileset, tileset_ref)?;
        self.map_ids.insert(map.key().to_string(), id);
        self.maps.push(map);
        Ok(id)
    }

    /// Links `a` and `b` both ways: `b` lies in `direction` from `a`.
    pub fn link(&mut self, a: MapId, direction: MapDirection, b: MapId) {
        if let Some(map) = self.map_mut(a) {
            map.set_bordering_map(direction, Some(b));
        }
        if let Some(map) = self.map_mut(b) {
            map.set_bordering_map(direction.opposite(), Some(a));
        }
    }

    pub fn map_id(&self, key: &str) -> Option<MapId> {
        self.map_ids.get(key).copied()
    }

    pub fn tileset_id(&self, name: &str) -> Option<TilesetId> {
        self.tileset_ids.get(name).copied()
    }

    pub fn map(&self, id: MapId) -> Option<&Map> {
        self.maps.get(id.0 as usize)
    }

    pub fn map_mut(&mut self, id: MapId) -> Option<&mut Map> {
        self.maps.get_mut(id.0 as usize)
    }

    pub fn tileset(&self, id: TilesetId) -> Option<&Tileset> {
        self.tilesets.get(id.0 as usize)
    }

    /// A map together with its tileset, both mutable.
    pub fn map_and_tileset_mut(&mut self, id: MapId) -> Option<(&mut Map, &mut Tileset)> {
        let map = self.maps.get_mut(id.0 as usize)?;
        let tileset = self.tilesets.get_mut(map.tileset().0 as usize)?;
        Some((map, tileset))
    }

    pub fn maps(&self) -> &[Map] {
        &self.maps
    }

    /// Every tileset image with a size hint for placeholders.
    pub fn image_keys(&self) -> Vec<(String, Option<(u32, u32)>)> {
        self.tilesets
            .iter()
            .map(|tileset| {
                let hint = self
                    .image_hints
                    .get(tileset.image())
                    .copied()
                    .unwrap_or_else(|| tileset.layout().image_size());
                (tileset.image().to_string(), Some(hint))
            })
            .collect()
    }

    fn map_key(&self, id: MapId) -> &str {
        self.map(id).map(Map::key).unwrap_or("?")
    }

    fn warn_non_reciprocal_borders(&self) {
        for map in &self.maps {
            for direction in MapDirection::ALL {
                let Some(neighbor) = map.bordering_map(direction).and_then(|id| self.map(id))
                else {
                    continue;
                };
                if neighbor.bordering_map(direction.opposite()) != Some(map.id()) {
                    warn!(
                        map = map.key(),
                        neighbor = neighbor.key(),
                        direction = direction.as_str(),
                        "bordering_map_not_reciprocal"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TILESET: &str = r#"{
        "name": "outdoor",
        "image": "outdoor.png",
        "tile_width": 16,
        "tile_height": 16,
        "columns": 4,
        "tile_count": 8,
        "animations": [{ "tile": 3, "frames": [3, 4], "frame_ticks": 10 }]
    }"#;

    fn write(root: &Path, relative: &str, body: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, body).expect("write");
    }

    fn map_json(id: &str, width: u32, height: u32, borders: &str) -> String {
        let cells = vec!["1"; (width * height) as usize].join(",");
        format!(
            r#"{{ "id": "{id}", "name": "{id} name", "width": {width}, "height": {height},
                "tileset": "outdoor", "layers": [[{cells}], [{cells}]], "borders": {borders} }}"#
        )
    }

    #[test]
    fn loads_maps_and_links_borders_by_id() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "tilesets/outdoor.json", TILESET);
        write(
            temp.path(),
            "maps/a.json",
            &map_json("a", 20, 15, r#"{ "south": "b" }"#),
        );
        write(
            temp.path(),
            "maps/b.json",
            &map_json("b", 20, 10, r#"{ "north": "a" }"#),
        );

        let registry = MapRegistry::load_dir(temp.path()).expect("load");
        let a = registry.map_id("a").expect("a");
        let b = registry.map_id("b").expect("b");
        let map_a = registry.map(a).expect("map a");
        assert_eq!(map_a.bordering_map(MapDirection::South), Some(b));
        assert_eq!(map_a.bordering_map(MapDirection::East), None);
        assert_eq!(map_a.layer_count(), 2);
        assert_eq!(map_a.tile_width(), 16);
        assert_eq!(
            registry.map(b).expect("b").bordering_map(MapDirection::North),
            Some(a)
        );
        assert_eq!(
            registry.image_keys(),
            vec![("outdoor.png".to_string(), Some((64, 32)))]
        );
        assert!(registry
            .tileset(map_a.tileset())
            .expect("tileset")
            .tile(3)
            .expect("tile")
            .is_animated());
    }

    #[test]
    fn unknown_bordering_map_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "tilesets/outdoor.json", TILESET);
        write(
            temp.path(),
            "maps/a.json",
            &map_json("a", 2, 2, r#"{ "west": "nowhere" }"#),
        );
        let err = MapRegistry::load_dir(temp.path()).expect_err("err");
        assert!(matches!(
            err,
            RegistryError::UnknownBorderingMap { direction: "west", .. }
        ));
    }

    #[test]
    fn json_errors_carry_field_path() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "tilesets/outdoor.json", TILESET);
        write(
            temp.path(),
            "maps/a.json",
            r#"{ "id": "a", "name": "A", "width": "wide", "height": 1, "tileset": "outdoor", "layers": [] }"#,
        );
        let err = MapRegistry::load_dir(temp.path()).expect_err("err");
        match err {
            RegistryError::Json { source, .. } => assert_eq!(source.path().to_string(), "width"),
            other => panic!("expected json error, got {other}"),
        }
    }

    #[test]
    fn layer_size_mismatch_is_invalid_map() {
        let temp = TempDir::new().expect("temp dir");
        write(temp.path(), "tilesets/outdoor.json", TILESET);
        write(
            temp.path(),
            "maps/a.json",
            r#"{ "id": "a", "name": "A", "width": 2, "height": 2, "tileset": "outdoor", "layers": [[1, 1, 1]] }"#,
        );
        let err = MapRegistry::load_dir(temp.path()).expect_err("err");
        assert!(matches!(err, RegistryError::InvalidMap(MapError::Layer { .. })));
    }

    #[test]
    fn link_wires_both_directions() {
        let mut registry = MapRegistry::new();
        let layout = AtlasLayout {
            tile_width: 8,
            tile_height: 8,
            columns: 1,
            tile_count: 1,
            margin: 0,
            spacing: 0,
        };
        let tileset = registry
            .insert_tileset(Tileset::from_atlas("t", "t.png", layout, &[]))
            .expect("tileset");
        let def = |key: &str| MapDef {
            key: key.to_string(),
            name: key.to_string(),
            width: 1,
            height: 1,
            layers: vec![vec![1]],
        };
        let west = registry.insert_map(def("west"), tileset).expect("west");
        let east = registry.insert_map(def("east"), tileset).expect("east");
        registry.link(west, MapDirection::East, east);

        assert_eq!(
            registry.map(west).expect("west").bordering_map(MapDirection::East),
            Some(east)
        );
        assert_eq!(
            registry.map(east).expect("east").bordering_map(MapDirection::West),
            Some(west)
        );
        assert!(matches!(
            registry.insert_map(def("west"), tileset),
            Err(RegistryError::DuplicateMap { .. })
        ));
        let (map, tileset_ref) = registry.map_and_tileset_mut(east).expect("pair");
        assert_eq!(map.key(), "east");
        assert_eq!(tileset_ref.name(), "t");
    }

    #[test]
    fn missing_directories_load_empty() {
        let temp = TempDir::new().expect("temp dir");
        let registry = MapRegistry::load_dir(temp.path()).expect("load");
        assert!(registry.maps().is_empty());
    }
}
