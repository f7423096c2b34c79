use std::time::Duration;

/// Tunables of the overworld: viewport, player placement and banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldConfig {
    /// Viewport width in tiles of the current map.
    pub view_tiles_wide: u32,
    pub view_tiles_high: u32,
    /// Vertical nudge of the player sprite so its feet sit on the tile.
    pub character_tile_offset_y: i32,
    pub banner_duration: Duration,
    pub banner_text_scale: i32,
    pub walk_step: Duration,
    pub walk_speed_px: u32,
    pub start_map: String,
    pub start_tile: (i32, i32),
    pub player_layer: i32,
    pub player_sheet: String,
    pub player_frame_size: (u32, u32),
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            view_tiles_wide: 15,
            view_tiles_high: 11,
            character_tile_offset_y: -4,
            banner_duration: Duration::from_secs(5),
            banner_text_scale: 1,
            walk_step: Duration::from_millis(16),
            walk_speed_px: 2,
            start_map: "pallet_town".to_string(),
            start_tile: (9, 7),
            player_layer: 0,
            player_sheet: "player.png".to_string(),
            player_frame_size: (16, 24),
        }
    }
}

impl WorldConfig {
    /// Scroll viewport in pixels for a map with the given tile size.
    pub fn draw_size(&self, tile_width: u32, tile_height: u32) -> (i32, i32) {
        (
            (self.view_tiles_wide.max(1) * tile_width) as i32,
            (self.view_tiles_high.max(1) * tile_height) as i32,
        )
    }
}
