use crate::app::Rect;

use super::Tile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilesetId(pub u32);

/// Regular atlas grid inside a tileset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub tile_count: u32,
    pub margin: u32,
    pub spacing: u32,
}

impl AtlasLayout {
    pub fn source_rect(&self, index: u32) -> Rect {
        let columns = self.columns.max(1);
        let col = index % columns;
        let row = index / columns;
        let x = self.margin + col * (self.tile_width + self.spacing);
        let y = self.margin + row * (self.tile_height + self.spacing);
        Rect::new(
            x as i32,
            y as i32,
            self.tile_width as i32,
            self.tile_height as i32,
        )
    }

    /// Smallest image that holds every tile of the layout.
    pub fn image_size(&self) -> (u32, u32) {
        let columns = self.columns.max(1);
        let rows = self.tile_count.div_ceil(columns).max(1);
        let used_columns = columns.min(self.tile_count.max(1));
        let width =
            self.margin * 2 + used_columns * self.tile_width + (used_columns - 1) * self.spacing;
        let height = self.margin * 2 + rows * self.tile_height + (rows - 1) * self.spacing;
        (width, height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileAnimation {
    pub tile: u32,
    pub frames: Vec<u32>,
    pub frame_ticks: u32,
}

/// Ordered tile collection backed by one image. Owned by the map registry;
/// maps refer to it by [`TilesetId`].
#[derive(Debug, Clone)]
pub struct Tileset {
    name: String,
    image: String,
    layout: AtlasLayout,
    tiles: Vec<Tile>,
    generation: u64,
}

impl Tileset {
    pub fn from_atlas(
        name: impl Into<String>,
        image: impl Into<String>,
        layout: AtlasLayout,
        animations: &[TileAnimation],
    ) -> Self {
        let mut tiles: Vec<Tile> = (0..layout.tile_count)
            .map(|index| Tile::new(layout.source_rect(index)))
            .collect();
        for animation in animations {
            let Some(tile) = tiles.get_mut(animation.tile as usize) else {
                continue;
            };
            let frames = animation
                .frames
                .iter()
                .filter(|frame| **frame < layout.tile_count)
                .map(|frame| layout.source_rect(*frame))
                .collect::<Vec<_>>();
            if frames.len() > 1 {
                *tile = Tile::animated(frames, animation.frame_ticks);
            }
        }
        Self {
            name: name.into(),
            image: image.into(),
            layout,
            tiles,
            generation: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image key the tileset draws from.
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn tile_width(&self) -> u32 {
        self.layout.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.layout.tile_height
    }

    pub fn layout(&self) -> AtlasLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tile_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Bumped whenever an update changes a visible frame. Maps compare it
    /// with the value they last drew to know when animated cells are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances every tile once. Returns `true` if any visible frame changed.
    pub fn update(&mut self) -> bool {
        let mut changed = false;
        for tile in &mut self.tiles {
            changed |= tile.update();
        }
        if changed {
            self.generation = self.generation.wrapping_add(1);
        }
        changed
    }
}
