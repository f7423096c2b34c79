use thiserror::Error;
use tracing::{debug, info};

use crate::app::{Rect, TextureId, Window};
use crate::content::ImageStore;

use super::{Grid, GridError, Tileset, TilesetId, WorldObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub u32);

/// Cardinal direction of a bordering map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapDirection {
    North,
    South,
    East,
    West,
}

impl MapDirection {
    pub const ALL: [MapDirection; 4] = [Self::North, Self::South, Self::East, Self::West];

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::South => 1,
            Self::East => 2,
            Self::West => 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map {key} has zero size ({width}x{height})")]
    ZeroSize { key: String, width: u32, height: u32 },
    #[error("map {key} has no layers")]
    NoLayers { key: String },
    #[error("map {key} layer {layer} is malformed: {source}")]
    Layer {
        key: String,
        layer: usize,
        #[source]
        source: GridError,
    },
}

/// Construction input for a [`Map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDef {
    pub key: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Row-major, 1-based tile indices; 0 is an empty cell.
    pub layers: Vec<Vec<u16>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnimatedCell {
    layer: usize,
    x: u32,
    y: u32,
    tile: usize,
}

/// Tile layers of one map, their cached textures and links to bordering maps.
///
/// Layer textures are built on first use and kept until the map is dropped.
/// Generation needs the tileset image; until it is loaded every generating
/// call returns "not ready" and is retried by the caller on a later frame.
#[derive(Debug)]
pub struct Map {
    id: MapId,
    key: String,
    name: String,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    tileset: TilesetId,
    layers: Vec<Grid<u16>>,
    layer_textures: Vec<TextureId>,
    animated_cells: Vec<AnimatedCell>,
    drawn_generation: u64,
    borders: [Option<MapId>; 4],
    occupant: Option<WorldObject>,
}

impl Map {
    pub fn new(
        id: MapId,
        def: MapDef,
        tileset_id: TilesetId,
        tileset: &Tileset,
    ) -> Result<Self, MapError> {
        let MapDef {
            key,
            name,
            width,
            height,
            layers,
        } = def;
        if width == 0 || height == 0 {
            return Err(MapError::ZeroSize { key, width, height });
        }
        if layers.is_empty() {
            return Err(MapError::NoLayers { key });
        }
        let mut grids = Vec::with_capacity(layers.len());
        for (layer, cells) in layers.into_iter().enumerate() {
            match Grid::from_cells(width, height, cells) {
                Ok(grid) => grids.push(grid),
                Err(source) => return Err(MapError::Layer { key, layer, source }),
            }
        }
        Ok(Self {
            id,
            key,
            name,
            width,
            height,
            tile_width: tileset.tile_width(),
            tile_height: tileset.tile_height(),
            tileset: tileset_id,
            layers: grids,
            layer_textures: Vec::new(),
            animated_cells: Vec::new(),
            drawn_generation: 0,
            borders: [None; 4],
            occupant: None,
        })
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn pixel_width(&self) -> i32 {
        (self.width * self.tile_width) as i32
    }

    pub fn pixel_height(&self) -> i32 {
        (self.height * self.tile_height) as i32
    }

    pub fn tileset(&self) -> TilesetId {
        self.tileset
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// 0-based tileset index at a cell, `None` for empty or out-of-range cells.
    pub fn tile_index_at(&self, layer: usize, x: u32, y: u32) -> Option<usize> {
        let raw = *self.layers.get(layer)?.get(x, y)?;
        raw.checked_sub(1).map(usize::from)
    }

    pub fn bordering_map(&self, direction: MapDirection) -> Option<MapId> {
        self.borders[direction.index()]
    }

    pub fn set_bordering_map(&mut self, direction: MapDirection, neighbor: Option<MapId>) {
        self.borders[direction.index()] = neighbor;
    }

    pub fn is_generated(&self) -> bool {
        !self.layer_textures.is_empty()
    }

    /// Cached texture of a layer without generating anything.
    pub fn layer_texture(&self, index: usize) -> Option<TextureId> {
        self.layer_textures.get(index).copied()
    }

    pub fn layer_textures(&self) -> &[TextureId] {
        &self.layer_textures
    }

    /// Returns the texture of layer `index`, generating all layers on first
    /// access. `None` means "not ready yet" or an out-of-range index.
    pub fn layer(
        &mut self,
        index: usize,
        window: &mut dyn Window,
        tileset: &mut Tileset,
        images: &ImageStore,
    ) -> Option<TextureId> {
        if !self.prepare(window, tileset, images) {
            return None;
        }
        self.layer_texture(index)
    }

    /// Generates the layer textures if needed and redraws animated cells that
    /// changed since the last call. Returns `false` while the tileset image is
    /// not loaded.
    pub fn prepare(
        &mut self,
        window: &mut dyn Window,
        tileset: &mut Tileset,
        images: &ImageStore,
    ) -> bool {
        if !self.generate(window, tileset, images) {
            return false;
        }
        if self.animated_cells.is_empty() || self.drawn_generation == tileset.generation() {
            return true;
        }
        if let Some(image) = images.image(tileset.image()) {
            self.refresh_animated_cells(window, tileset, image);
        }
        self.drawn_generation = tileset.generation();
        true
    }

    /// Draws every non-empty cell of every layer into its own transparent
    /// texture. A second call is a no-op.
    pub fn generate(
        &mut self,
        window: &mut dyn Window,
        tileset: &mut Tileset,
        images: &ImageStore,
    ) -> bool {
        if self.is_generated() {
            return true;
        }
        let Some(image) = images.image(tileset.image()) else {
            debug!(map = self.key.as_str(), "map_generation_deferred");
            return false;
        };

        let pixel_width = self.width * self.tile_width;
        let pixel_height = self.height * self.tile_height;
        let mut textures = Vec::with_capacity(self.layers.len());
        let mut animated_cells = Vec::new();
        let mut missing_tiles = 0usize;
        for (layer, grid) in self.layers.iter().enumerate() {
            let texture = window.create_transparent_texture(pixel_width, pixel_height);
            window.set_render_target(texture);
            for (x, y, raw) in grid.iter() {
                let Some(index) = raw.checked_sub(1).map(usize::from) else {
                    continue;
                };
                let Some(tile) = tileset.tile_mut(index) else {
                    missing_tiles += 1;
                    continue;
                };
                tile.set_destination_rect(self.cell_rect(x, y));
                tile.draw(window, image);
                if tile.is_animated() {
                    animated_cells.push(AnimatedCell {
                        layer,
                        x,
                        y,
                        tile: index,
                    });
                }
            }
            textures.push(texture);
        }
        window.reset_render_target();

        info!(
            map = self.key.as_str(),
            layers = textures.len(),
            animated_cells = animated_cells.len(),
            missing_tiles,
            "map_generated"
        );
        self.layer_textures = textures;
        self.animated_cells = animated_cells;
        self.drawn_generation = tileset.generation();
        true
    }

    /// Advances the shared tile animations once. Cells using a tile whose
    /// frame changed are redrawn by the next `prepare` of any map sharing the
    /// tileset.
    pub fn update(&self, tileset: &mut Tileset) -> bool {
        tileset.update()
    }

    pub fn has_animated_cells(&self) -> bool {
        !self.animated_cells.is_empty()
    }

    pub fn occupant(&self) -> Option<&WorldObject> {
        self.occupant.as_ref()
    }

    /// Places `object` at tile `(x, y)`, replacing any previous occupant.
    pub fn place_occupant(&mut self, mut object: WorldObject, x: i32, y: i32) {
        object.set_position(x * self.tile_width as i32, y * self.tile_height as i32);
        self.occupant = Some(object);
    }

    pub fn remove_occupant(&mut self) -> Option<WorldObject> {
        self.occupant.take()
    }

    /// Draws the map on its own, outside a world. The first call only
    /// generates. With an occupant a window of `view_tiles` centred on it is
    /// drawn and the occupant is slotted between the layers; otherwise the
    /// whole map fills the target.
    pub fn draw(
        &mut self,
        window: &mut dyn Window,
        tileset: &mut Tileset,
        images: &ImageStore,
        view_tiles: (u32, u32),
    ) {
        if !self.is_generated() {
            self.generate(window, tileset, images);
            return;
        }
        if !self.prepare(window, tileset, images) {
            return;
        }

        let Some(occupant) = &self.occupant else {
            for &texture in &self.layer_textures {
                window.draw_texture(texture, None, None);
            }
            return;
        };

        let (pos_x, pos_y) = occupant.position();
        let view_w = (view_tiles.0.max(1) * self.tile_width) as i32;
        let view_h = (view_tiles.1.max(1) * self.tile_height) as i32;
        let source = Rect::new(
            pos_x - (view_tiles.0 as i32 / 2) * self.tile_width as i32,
            pos_y - (view_tiles.1 as i32 / 2) * self.tile_height as i32,
            view_w,
            view_h,
        );
        let (target_w, target_h) = window.target_size();
        let sprite = occupant.sprite();
        let scale = |value: i32, target: u32, view: i32| value * target as i32 / view.max(1);
        let occupant_rect = Rect::new(
            scale(pos_x - source.x, target_w, view_w),
            scale(pos_y - source.y, target_h, view_h),
            scale(sprite.width(), target_w, view_w),
            scale(sprite.height(), target_h, view_h),
        );
        let slot = occupant_slot(occupant.layer(), self.layer_textures.len());
        for (index, &texture) in self.layer_textures.iter().enumerate() {
            window.draw_texture(texture, Some(source), None);
            if Some(index) == slot {
                sprite.draw_to(window, images, occupant_rect);
            }
        }
    }

    fn cell_rect(&self, x: u32, y: u32) -> Rect {
        Rect::new(
            (x * self.tile_width) as i32,
            (y * self.tile_height) as i32,
            self.tile_width as i32,
            self.tile_height as i32,
        )
    }

    fn refresh_animated_cells(
        &self,
        window: &mut dyn Window,
        tileset: &mut Tileset,
        image: TextureId,
    ) {
        let mut current_layer = None;
        for cell in &self.animated_cells {
            let Some(&texture) = self.layer_textures.get(cell.layer) else {
                continue;
            };
            if current_layer != Some(cell.layer) {
                window.set_render_target(texture);
                current_layer = Some(cell.layer);
            }
            let destination = self.cell_rect(cell.x, cell.y);
            window.clear_rect(destination);
            if let Some(tile) = tileset.tile_mut(cell.tile) {
                tile.set_destination_rect(destination);
                tile.draw(window, image);
            }
        }
        window.reset_render_target();
    }
}

/// Index of the layer after which an object on `layer` is drawn: the one
/// above it, or the top layer when the map has fewer layers.
pub fn occupant_slot(layer: i32, layer_count: usize) -> Option<usize> {
    if layer_count == 0 {
        return None;
    }
    let above = layer.saturating_add(1).max(0) as usize;
    Some(above.min(layer_count - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SoftwareWindow;
    use crate::world::{AtlasLayout, Sprite, TileAnimation};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    fn tileset(animations: &[TileAnimation]) -> Tileset {
        let layout = AtlasLayout {
            tile_width: 2,
            tile_height: 2,
            columns: 2,
            tile_count: 2,
            margin: 0,
            spacing: 0,
        };
        Tileset::from_atlas("test", "tiles.png", layout, animations)
    }

    /// 4x2 atlas: tile 0 red, tile 1 blue.
    fn loaded_images(window: &mut SoftwareWindow) -> ImageStore {
        let mut rgba = Vec::new();
        for _ in 0..2 {
            for x in 0..4 {
                rgba.extend_from_slice(if x < 2 { &RED } else { &BLUE });
            }
        }
        let texture = window.upload_texture(4, 2, rgba).expect("upload");
        let mut images = ImageStore::new("unused");
        images.insert_loaded("tiles.png", texture);
        images
    }

    fn map(tileset: &Tileset, layers: Vec<Vec<u16>>) -> Map {
        let def = MapDef {
            key: "town".to_string(),
            name: "Town".to_string(),
            width: 2,
            height: 2,
            layers,
        };
        Map::new(MapId(0), def, TilesetId(0), tileset).expect("map")
    }

    #[test]
    fn rejects_layer_with_wrong_cell_count() {
        let tileset = tileset(&[]);
        let def = MapDef {
            key: "bad".to_string(),
            name: "Bad".to_string(),
            width: 2,
            height: 2,
            layers: vec![vec![1, 1, 1, 1], vec![1, 1, 1]],
        };
        let err = Map::new(MapId(0), def, TilesetId(0), &tileset).expect_err("err");
        assert!(matches!(err, MapError::Layer { layer: 1, .. }));
    }

    #[test]
    fn generation_defers_until_image_loaded() {
        let mut tileset = tileset(&[]);
        let mut map = map(&tileset, vec![vec![1, 0, 0, 2]]);
        let mut window = SoftwareWindow::new(8, 8);
        let images = ImageStore::new("unused");

        assert!(!map.generate(&mut window, &mut tileset, &images));
        assert_eq!(map.layer(0, &mut window, &mut tileset, &images), None);
        assert!(!map.is_generated());
        assert_eq!(window.texture_count(), 0);
    }

    #[test]
    fn generate_is_idempotent() {
        let mut tileset = tileset(&[]);
        let mut map = map(&tileset, vec![vec![1, 0, 0, 2], vec![0, 0, 0, 0]]);
        let mut window = SoftwareWindow::new(8, 8);
        let images = loaded_images(&mut window);

        assert!(map.generate(&mut window, &mut tileset, &images));
        let first = map.layer_textures().to_vec();
        let count = window.texture_count();
        assert!(map.generate(&mut window, &mut tileset, &images));
        assert_eq!(map.layer_textures(), first.as_slice());
        assert_eq!(window.texture_count(), count);
        assert_eq!(window.texture_size(first[0]), Some((4, 4)));
    }

    #[test]
    fn empty_cells_stay_transparent() {
        let mut tileset = tileset(&[]);
        let mut map = map(&tileset, vec![vec![1, 0, 0, 2]]);
        let mut window = SoftwareWindow::new(8, 8);
        let images = loaded_images(&mut window);

        let layer = map
            .layer(0, &mut window, &mut tileset, &images)
            .expect("layer");
        assert_eq!(window.texture_pixel(layer, 0, 0), Some(RED));
        assert_eq!(window.texture_pixel(layer, 2, 0), Some(CLEAR));
        assert_eq!(window.texture_pixel(layer, 1, 3), Some(CLEAR));
        assert_eq!(window.texture_pixel(layer, 3, 3), Some(BLUE));
        assert_eq!(map.tile_index_at(0, 1, 0), None);
        assert_eq!(map.tile_index_at(0, 1, 1), Some(1));
    }

    #[test]
    fn animated_cells_are_redrawn_after_tileset_change() {
        let animations = [TileAnimation {
            tile: 0,
            frames: vec![0, 1],
            frame_ticks: 1,
        }];
        let mut tileset = tileset(&animations);
        let mut map = map(&tileset, vec![vec![1, 0, 0, 0]]);
        let mut window = SoftwareWindow::new(8, 8);
        let images = loaded_images(&mut window);

        assert!(map.prepare(&mut window, &mut tileset, &images));
        let layer = map.layer_texture(0).expect("layer");
        assert_eq!(window.texture_pixel(layer, 0, 0), Some(RED));

        map.update(&mut tileset);
        assert!(map.prepare(&mut window, &mut tileset, &images));
        assert_eq!(window.texture_pixel(layer, 0, 0), Some(BLUE));
        assert_eq!(window.texture_pixel(layer, 2, 2), Some(CLEAR));
    }

    #[test]
    fn borders_round_trip_by_direction() {
        let tileset = tileset(&[]);
        let mut map = map(&tileset, vec![vec![0; 4]]);
        map.set_bordering_map(MapDirection::South, Some(MapId(3)));
        assert_eq!(map.bordering_map(MapDirection::South), Some(MapId(3)));
        assert_eq!(map.bordering_map(MapDirection::North), None);
        assert_eq!(MapDirection::East.opposite(), MapDirection::West);
    }

    #[test]
    fn standalone_draw_generates_first_then_fills_target() {
        let mut tileset = tileset(&[]);
        let mut map = map(&tileset, vec![vec![1, 1, 2, 2]]);
        let mut window = SoftwareWindow::new(8, 8);
        let images = loaded_images(&mut window);

        map.draw(&mut window, &mut tileset, &images, (2, 2));
        assert!(map.is_generated());
        assert_ne!(window.screen_pixel(0, 0), Some(RED));

        map.draw(&mut window, &mut tileset, &images, (2, 2));
        assert_eq!(window.screen_pixel(0, 0), Some(RED));
        assert_eq!(window.screen_pixel(7, 7), Some(BLUE));
    }

    #[test]
    fn occupant_is_placed_in_tile_units() {
        let tileset = tileset(&[]);
        let mut map = map(&tileset, vec![vec![0; 4]]);
        let object = WorldObject::new(Sprite::new("player.png", Rect::new(0, 0, 2, 2)), 0);
        map.place_occupant(object, 1, 1);
        assert_eq!(map.occupant().map(WorldObject::position), Some((2, 2)));
        assert!(map.remove_occupant().is_some());
        assert!(map.occupant().is_none());
    }

    #[test]
    fn occupant_slot_is_layer_above_clamped_to_top() {
        assert_eq!(occupant_slot(0, 3), Some(1));
        assert_eq!(occupant_slot(1, 3), Some(2));
        assert_eq!(occupant_slot(4, 3), Some(2));
        assert_eq!(occupant_slot(-5, 3), Some(0));
        assert_eq!(occupant_slot(0, 0), None);
    }
}
